//! Chat store error types.

use serde::Serialize;

use crate::kv::KvError;

/// Failure of a chat store operation.
///
/// Authorization failures are the only kind callers are expected to branch
/// on. Store failures are kept distinct so tests and monitoring can see
/// them; the HTTP boundary folds them into empty results with
/// [`SoftFail::soften`].
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Caller is absent or does not own the record.
    #[error("Unauthorized")]
    Unauthorized,
    /// Sharing was refused because the chat is missing or not owned.
    #[error("Something went wrong")]
    ShareFailed,
    /// The key-value store could not be reached.
    #[error("Store unavailable")]
    Store(#[from] KvError),
    /// The record could not be encoded for storage.
    #[error("Failed to encode chat record")]
    Encode(#[from] serde_json::Error),
}

impl ChatError {
    /// `{"error": "..."}` body for this failure.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Wire shape of an action failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Fold store outages into "nothing found" for read paths.
pub trait SoftFail<T> {
    /// Replace a [`ChatError::Store`] failure with `T::default()`, logging it.
    /// Every other outcome passes through unchanged.
    fn soften(self, operation: &'static str) -> Result<T, ChatError>;
}

impl<T: Default> SoftFail<T> for Result<T, ChatError> {
    fn soften(self, operation: &'static str) -> Result<T, ChatError> {
        match self {
            Err(ChatError::Store(e)) => {
                tracing::error!(operation, error = %e, "Store unavailable, returning empty result");
                Ok(T::default())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_bodies() {
        assert_eq!(ChatError::Unauthorized.body().error, "Unauthorized");
        assert_eq!(ChatError::ShareFailed.body().error, "Something went wrong");
        let store = ChatError::from(KvError::Unavailable("down".to_string()));
        assert_eq!(store.body().error, "Store unavailable");
    }

    #[test]
    fn test_soften_only_absorbs_store_failures() {
        let outage: Result<Vec<u8>, ChatError> =
            Err(KvError::Unavailable("down".to_string()).into());
        assert_eq!(outage.soften("test").unwrap(), Vec::<u8>::new());

        let missing: Result<Option<u8>, ChatError> =
            Err(KvError::Unavailable("down".to_string()).into());
        assert_eq!(missing.soften("test").unwrap(), None);

        let denied: Result<Vec<u8>, ChatError> = Err(ChatError::Unauthorized);
        assert!(denied.soften("test").unwrap_err().is_unauthorized());
    }
}
