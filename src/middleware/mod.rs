//! Server middleware
//!
//! Request logging and the panic boundary applied to every route.

pub mod logging;
pub mod panic;

pub use logging::log_request;
pub use panic::catch_panic;
