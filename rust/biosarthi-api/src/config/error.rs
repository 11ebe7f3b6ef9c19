//! Configuration errors.
//!
//! Each message names the setting, the environment variable that sets it,
//! and what to change, so startup failures can be fixed from the log alone.

/// A configuration problem found at startup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigurationError {
    /// A setting has a value this service cannot use.
    #[error("{setting} = '{value}' is not usable: expected {expected} (set {env_var})")]
    InvalidValue {
        setting: &'static str,
        env_var: &'static str,
        value: String,
        expected: &'static str,
    },
    /// A setting this service cannot start without.
    #[error("{setting} is not set; it is needed for {needed_for} (set {env_var})")]
    Missing {
        setting: &'static str,
        env_var: &'static str,
        needed_for: &'static str,
    },
    /// Two settings contradict each other.
    #[error("{setting} conflicts with the rest of the configuration: {reason}")]
    Conflict {
        setting: &'static str,
        reason: String,
    },
    /// Redis was required but could not be reached.
    #[error(
        "Redis at {url} is unreachable ({error}); start Redis, correct REDIS_URL, \
        or set BIOSARTHI__REDIS__REQUIRED=false to run on the in-memory store"
    )]
    StoreUnreachable { url: String, error: String },
    #[error("{} configuration problems:{}", .0.len(), numbered(.0))]
    Multiple(Vec<ConfigurationError>),
}

fn numbered(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("\n  {}. {err}", i + 1))
        .collect()
}

impl ConfigurationError {
    /// Collapse a list of problems: `None` when empty, the problem itself
    /// when there is only one.
    #[must_use]
    pub fn collect(mut errors: Vec<ConfigurationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Number of problems (1 unless this is [`Self::Multiple`]).
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Multiple(errors) => errors.len(),
            _ => 1,
        }
    }
}

/// Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigurationError>;
