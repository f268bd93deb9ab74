//! Directory authentication and user lookup.
//!
//! [`DirectoryService`] is the seam the HTTP layer talks to; [`LdapDirectory`]
//! is the production implementation backed by `ldap3`.

pub mod ldap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DirectoryError;

pub use ldap::LdapDirectory;

/// Longest username accepted before any directory traffic.
pub const MAX_USERNAME_LEN: usize = 256;

/// Result of a successful bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub username: String,
    /// The identity the bind succeeded with.
    pub dn: String,
}

/// Public view of a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub username: String,
    pub display_name: String,
    /// `"N/A"` when the entry has no mail attribute.
    pub email: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Authentication and lookup against a user directory.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Verify `password` for `username`.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, DirectoryError>;

    /// Fetch the entry for `username`, `None` when no entry matches.
    async fn lookup(&self, username: &str) -> Result<Option<DirectoryUser>, DirectoryError>;
}

/// Reject usernames that could never name a directory entry.
pub fn validate_username(username: &str) -> Result<(), DirectoryError> {
    if username.trim().is_empty() {
        return Err(DirectoryError::MalformedQuery("username is empty".into()));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(DirectoryError::MalformedQuery(format!(
            "username longer than {MAX_USERNAME_LEN} bytes"
        )));
    }
    if username.chars().any(char::is_control) {
        return Err(DirectoryError::MalformedQuery(
            "username contains control characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jdoe").is_ok());
        assert!(validate_username(r"CORP\jdoe").is_ok());
        assert!(validate_username("jdoe@corp.example.com").is_ok());
        assert!(matches!(
            validate_username("   "),
            Err(DirectoryError::MalformedQuery(_))
        ));
        assert!(matches!(
            validate_username("jd\0oe"),
            Err(DirectoryError::MalformedQuery(_))
        ));
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_directory_user_json() {
        let user = DirectoryUser {
            username: "jdoe".into(),
            display_name: "Jane Doe".into(),
            email: "N/A".into(),
            groups: vec![],
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["displayName"], "Jane Doe");
        assert_eq!(value["email"], "N/A");
        assert_eq!(value["groups"], serde_json::json!([]));
    }
}
