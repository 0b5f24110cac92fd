//! Per-client session state
//!
//! A session is either anonymous or logged in as a single admin user.

/// Authentication state of one client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    logged_in: bool,
    username: Option<String>,
}

impl Session {
    /// A session with no authenticated user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub(crate) fn authenticated(username: &str) -> Self {
        Self {
            logged_in: true,
            username: Some(username.to_string()),
        }
    }

    /// Returns whether the client has successfully logged in.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Returns the username of the client if set.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Drops the authenticated user, returning the session to anonymous.
    pub fn logout(&mut self) {
        self.logged_in = false;
        self.username = None;
    }
}
