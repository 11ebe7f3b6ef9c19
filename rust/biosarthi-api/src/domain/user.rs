//! Caller identity and stored user records.

use serde::{Deserialize, Serialize};

use crate::kv::Fields;

/// Storage key of a user identity record.
pub fn user_key(email: &str) -> String {
    format!("user:{email}")
}

/// The authenticated caller of a request.
///
/// Produced by the identity middleware; a request without a session is a
/// guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }

    /// Whether this session belongs to `user_id`.
    pub fn owns(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Identity record as stored at `user:<email>`. Credential fields kept in the
/// same hash are never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
}

impl UserRecord {
    /// Decode the identity fields of a stored user hash.
    pub fn from_fields(fields: &Fields) -> Option<Self> {
        Some(Self {
            id: fields.get("id")?.clone(),
            email: fields.get("email")?.clone(),
        })
    }
}

/// Loose email shape check used when enumerating identity keys.
pub fn looks_like_email(candidate: &str) -> bool {
    match candidate.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !domain.contains('@')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("alice@example.com"));
        assert!(looks_like_email("ops@biosarthi.co.in"));
        assert!(!looks_like_email("chat:u1"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("alice@localhost"));
        assert!(!looks_like_email("a@b@c.com"));
    }

    #[test]
    fn test_user_record_requires_id_and_email() {
        let mut fields = Fields::new();
        fields.insert("id".to_string(), "u1".to_string());
        assert!(UserRecord::from_fields(&fields).is_none());

        fields.insert("email".to_string(), "alice@example.com".to_string());
        fields.insert("password".to_string(), "hash".to_string());
        assert_eq!(
            UserRecord::from_fields(&fields),
            Some(UserRecord {
                id: "u1".to_string(),
                email: "alice@example.com".to_string(),
            })
        );
    }

    #[test]
    fn test_session_ownership() {
        let session = Session::new("u1", "alice@example.com");
        assert!(session.owns("u1"));
        assert!(!session.owns("u2"));
    }
}
