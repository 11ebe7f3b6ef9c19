//! Operator allow-list.

use std::collections::BTreeSet;

use crate::domain::user::Session;

/// Email addresses allowed to see the operator dashboard.
///
/// Supplied from configuration when the admin layer is assembled. Matching is
/// case-insensitive and ignores surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorAllowList {
    emails: BTreeSet<String>,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl OperatorAllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|email| normalize(email.as_ref()))
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&normalize(email))
    }

    /// Whether the caller may use admin views. Guests never may.
    pub fn permits(&self, caller: Option<&Session>) -> bool {
        caller.is_some_and(|session| self.contains(&session.email))
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}
