//! Cookie-backed session registry
//!
//! Maps an opaque random session id, carried in an HttpOnly cookie, to the
//! client's `Session`. Entries live until logout or process exit.

use axum::http::{HeaderMap, HeaderValue, header};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::Session;
use crate::error::ShelfError;

pub const SESSION_COOKIE: &str = "pdf_shelf_session";

const SESSION_ID_BYTES: usize = 16;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an authenticated session and returns its new id.
    pub async fn insert(&self, session: Session) -> Result<String, ShelfError> {
        let sid = new_session_id()?;
        self.sessions.write().await.insert(sid.clone(), session);
        Ok(sid)
    }

    /// Session for the request's cookie; anonymous when absent or unknown.
    pub async fn current(&self, headers: &HeaderMap) -> Session {
        let Some(sid) = parse_cookie(headers, SESSION_COOKIE) else {
            return Session::anonymous();
        };
        self.sessions
            .read()
            .await
            .get(&sid)
            .cloned()
            .unwrap_or_default()
    }

    /// Drops the request's session, if any.
    pub async fn remove(&self, headers: &HeaderMap) {
        if let Some(sid) = parse_cookie(headers, SESSION_COOKIE) {
            if let Some(mut session) = self.sessions.write().await.remove(&sid) {
                session.logout();
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn new_session_id() -> Result<String, ShelfError> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| ShelfError::Unhandled(format!("session id generation failed: {e}")))?;

    let mut sid = String::with_capacity(SESSION_ID_BYTES * 2);
    for b in &bytes {
        let _ = write!(&mut sid, "{:02x}", b);
    }
    Ok(sid)
}

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

pub fn set_session_cookie(sid: &str) -> Result<HeaderValue, ShelfError> {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/",
        SESSION_COOKIE, sid
    ))
    .map_err(|e| ShelfError::Unhandled(format!("invalid session cookie: {e}")))
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "pdf_shelf_session=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Path=/",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialStore, authenticate};

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn cookie_lookup_finds_named_pair() {
        let headers = cookie_headers("theme=dark; pdf_shelf_session=abc123; other=1");
        assert_eq!(
            parse_cookie(&headers, SESSION_COOKIE).as_deref(),
            Some("abc123")
        );
        assert_eq!(parse_cookie(&headers, "missing"), None);
    }

    #[test]
    fn session_ids_are_random_hex() {
        let a = new_session_id().unwrap();
        let b = new_session_id().unwrap();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn login_then_logout_round_trip() {
        let registry = SessionRegistry::new();
        let store = CredentialStore::parse("admin:password");
        let session = authenticate(&store, "admin", "password").unwrap();

        let sid = registry.insert(session).await.unwrap();
        let headers = cookie_headers(&format!("{SESSION_COOKIE}={sid}"));
        assert!(registry.current(&headers).await.is_logged_in());

        registry.remove(&headers).await;
        assert!(!registry.current(&headers).await.is_logged_in());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn unknown_cookie_is_anonymous() {
        let registry = SessionRegistry::new();
        let headers = cookie_headers("pdf_shelf_session=forged");
        assert_eq!(registry.current(&headers).await, Session::anonymous());
    }
}
