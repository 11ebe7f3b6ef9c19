//! Configuration management for the BioSarthi API.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. `config/biosarthi-api.{yaml,toml,json}` if present
//! 3. `BIOSARTHI__SECTION__KEY` environment variables
//! 4. Well-known variables: `REDIS_URL`, `JWT_SECRET`, `OPERATOR_EMAILS`,
//!    `REQUIRED_ENV_KEYS`
//!
//! A `.env` file is read first when present.

pub mod environment;
pub mod error;
pub mod validator;

pub use environment::missing_env_keys;
pub use error::{ConfigResult, ConfigurationError};
pub use validator::ConfigValidator;

use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Identity token settings.
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    /// Operator dashboard access.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Readiness checks.
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Split a comma-separated list, dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

impl AppConfig {
    /// Load and validate configuration.
    pub fn load() -> anyhow::Result<Self> {
        let config = Self::load_unchecked()?;

        ConfigValidator::validate(&config)
            .map_err(|e| anyhow::anyhow!("Configuration validation failed:\n\n{e}"))?;

        Ok(config)
    }

    /// Load configuration without validation.
    pub fn load_unchecked() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }

        let config = config::Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .add_source(config::File::with_name("config/biosarthi-api").required(false))
            .add_source(
                config::Environment::with_prefix("BIOSARTHI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config.apply_env_overrides();
        Ok(app_config)
    }

    /// Apply the well-known environment variables on top of layered config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("REDIS_URL") {
            self.redis.url = Some(url);
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Ok(emails) = std::env::var("OPERATOR_EMAILS") {
            self.admin.operator_emails = split_list(&emails);
        }
        if let Ok(keys) = std::env::var("REQUIRED_ENV_KEYS") {
            self.health.required_env_keys = split_list(&keys);
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Identity token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the sign-in service.
    pub jwt_secret: Option<String>,
    /// Lifetime of tokens minted by this service, in seconds.
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
}

fn default_jwt_expiry() -> u64 {
    86400 // 24 hours
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiry_secs: default_jwt_expiry(),
        }
    }
}

/// Redis configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL. Without one the in-memory store is used.
    pub url: Option<String>,
    /// Fail startup instead of falling back to the in-memory store.
    #[serde(default)]
    pub required: bool,
}

/// Operator dashboard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Emails allowed to use the admin views.
    #[serde(default)]
    pub operator_emails: Vec<String>,
}

/// Readiness check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Environment variables the surrounding application needs.
    #[serde(default = "default_required_env_keys")]
    pub required_env_keys: Vec<String>,
}

fn default_required_env_keys() -> Vec<String> {
    vec!["OPENAI_API_KEY".to_string()]
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            required_env_keys: default_required_env_keys(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
