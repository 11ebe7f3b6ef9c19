//! Startup validation for [`AppConfig`].
//!
//! Every problem is collected so operators can fix them in one pass.

use super::AppConfig;
use super::error::{ConfigResult, ConfigurationError};
use crate::domain::user::looks_like_email;

/// Checks configuration before the server binds.
#[derive(Debug)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AppConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_auth(config) {
            errors.push(e);
        }
        if let Err(e) = Self::validate_redis(config) {
            errors.push(e);
        }
        if config.server.timeout_secs == 0 {
            errors.push(ConfigurationError::InvalidValue {
                setting: "server.timeout_secs",
                env_var: "BIOSARTHI__SERVER__TIMEOUT_SECS",
                value: "0".to_string(),
                expected: "a positive number of seconds",
            });
        }
        errors.extend(Self::validate_operators(&config.admin.operator_emails));

        match ConfigurationError::collect(errors) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Sessions are unverifiable without a signing secret.
    pub fn validate_auth(config: &AppConfig) -> ConfigResult<()> {
        match config.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(()),
            _ => Err(ConfigurationError::Missing {
                setting: "auth.jwt_secret",
                env_var: "JWT_SECRET",
                needed_for: "verifying session tokens issued by the sign-in service",
            }),
        }
    }

    pub fn validate_redis(config: &AppConfig) -> ConfigResult<()> {
        if config.redis.required && config.redis.url.is_none() {
            return Err(ConfigurationError::Conflict {
                setting: "redis.required",
                reason: "Redis is required but REDIS_URL is unset; set REDIS_URL or \
                    turn redis.required off to allow the in-memory store"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// One error per allow-list entry that is not an email address.
    pub fn validate_operators(emails: &[String]) -> Vec<ConfigurationError> {
        emails
            .iter()
            .filter(|email| !looks_like_email(email.trim()))
            .map(|email| ConfigurationError::InvalidValue {
                setting: "admin.operator_emails",
                env_var: "OPERATOR_EMAILS",
                value: email.clone(),
                expected: "a comma-separated list of email addresses",
            })
            .collect()
    }
}
