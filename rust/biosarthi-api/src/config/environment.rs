//! Environment dependency check.

/// Required keys that are unset or blank in the process environment, in the
/// order they were requested.
pub fn missing_env_keys(required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|key| {
            std::env::var(key.as_str())
                .map(|value| value.trim().is_empty())
                .unwrap_or(true)
        })
        .cloned()
        .collect()
}
