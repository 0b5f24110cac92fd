//! Credential storage
//!
//! Holds the admin `username -> password` pairs parsed from configuration at
//! startup. The set is immutable for the lifetime of the process.

use log::{debug, warn};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    /// Parses `user1:pass1,user2:pass2`.
    ///
    /// Entries that do not split into exactly one user and one password are
    /// skipped. Surrounding whitespace is trimmed from both halves.
    pub fn parse(raw: &str) -> Self {
        let mut credentials = HashMap::new();

        for entry in raw.split(',') {
            let mut parts = entry.split(':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(user), Some(pass), None) => {
                    credentials.insert(user.trim().to_string(), pass.trim().to_string());
                }
                _ => debug!("Skipping malformed credential entry"),
            }
        }

        if credentials.is_empty() {
            warn!("No admin credentials configured; protected operations are unreachable");
        }

        Self { credentials }
    }

    /// Exact, case-sensitive comparison against the stored pair.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        matches!(self.credentials.get(username), Some(stored) if stored == password)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_pairs() {
        let store = CredentialStore::parse("admin1:pass1, admin2 : pass2");
        assert_eq!(store.len(), 2);
        assert!(store.matches("admin1", "pass1"));
        assert!(store.matches("admin2", "pass2"));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let store = CredentialStore::parse("nocolon,a:b:c,good:pw,");
        assert_eq!(store.len(), 1);
        assert!(store.matches("good", "pw"));
        assert!(!store.matches("a", "b:c"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let store = CredentialStore::parse("Admin:Secret");
        assert!(store.matches("Admin", "Secret"));
        assert!(!store.matches("admin", "Secret"));
        assert!(!store.matches("Admin", "secret"));
    }

    #[test]
    fn empty_input_yields_empty_store() {
        assert!(CredentialStore::parse("").is_empty());
    }
}
