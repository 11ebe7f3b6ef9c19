//! HTTP server setup and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::config::{AppConfig, ConfigurationError, missing_env_keys};
use crate::gateway;
use crate::kv::{InMemoryKv, KvStore, RedisKv};
use crate::logging::OpTimer;
use crate::{AppState, log_banner, log_init_step, log_init_warning, log_success};

/// BioSarthi API version (from Cargo.toml).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create the application with all routes and middleware.
///
/// `force_in_memory` skips Redis entirely, for local development.
pub async fn create_app(config: AppConfig, force_in_memory: bool) -> anyhow::Result<Router> {
    let overall_timer = OpTimer::new("server", "create_app");

    log_banner!(
        format!("🌱 BioSarthi API v{VERSION}"),
        format!("Listening on {}:{}", config.server.host, config.server.port)
    );

    // [1/3] Key-value store
    let step_timer = OpTimer::new("server", "store");
    let kv = init_store(&config, force_in_memory).await?;
    step_timer.finish();

    // [2/3] Services
    let step_timer = OpTimer::new("server", "services");
    let state = AppState::new(config, kv);
    let operators = state.admin.operators().len();
    log_init_step!(
        2,
        3,
        "Services",
        format!("💬 Chat store ready, {operators} operator(s) on the allow-list")
    );
    if operators == 0 {
        log_init_warning!("No operator emails configured. Admin views will be empty.");
    }
    let missing = missing_env_keys(&state.config.health.required_env_keys);
    if !missing.is_empty() {
        log_init_warning!("Missing environment keys: {}", missing.join(", "));
    }
    step_timer.finish();

    // [3/3] Router
    let step_timer = OpTimer::new("server", "router");
    let app = build_router(state);
    log_init_step!(3, 3, "Router", "🌐 Routes + middleware configured");
    step_timer.finish();

    overall_timer.finish();
    log_success!("BioSarthi API server created successfully");

    Ok(app)
}

/// Attach routes and middleware to a ready [`AppState`].
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::create_router())
        .merge(gateway::create_router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(state.config.server.timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            gateway::auth::identity_middleware,
        ))
        .with_state(state)
}

/// Connect to Redis, or fall back to the in-memory store.
async fn init_store(config: &AppConfig, force_in_memory: bool) -> anyhow::Result<Arc<dyn KvStore>> {
    if force_in_memory {
        log_init_step!(1, 3, "Store", "💾 In-memory (requested)");
        return Ok(Arc::new(InMemoryKv::new()));
    }

    let Some(url) = config.redis.url.as_deref() else {
        log_init_step!(1, 3, "Store", "💾 Not configured (in-memory fallback)");
        return Ok(Arc::new(InMemoryKv::new()));
    };

    match RedisKv::connect(url).await {
        Ok(store) => {
            log_init_step!(1, 3, "Store", format!("💾 Connected to {url}"));
            Ok(Arc::new(store))
        }
        Err(e) if config.redis.required => Err(ConfigurationError::StoreUnreachable {
            url: url.to_string(),
            error: e.to_string(),
        }
        .into()),
        Err(e) => {
            log_init_warning!("Failed to connect to Redis: {}. Using in-memory fallback.", e);
            log_init_step!(1, 3, "Store", "💾 In-memory fallback");
            Ok(Arc::new(InMemoryKv::new()))
        }
    }
}
