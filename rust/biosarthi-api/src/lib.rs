//! BioSarthi API - chat persistence and authorization for the BioSarthi
//! biogas assistant.
//!
//! The service stores assistant conversations per user, enforces ownership
//! on every read and write, lets owners publish a read-only share link, and
//! gives operators aggregate views over all users and chats.
//!
//! # Architecture
//!
//! - [`kv`]: key-value store trait with Redis and in-memory backends
//! - [`domain`]: chat, user and admin read-model types
//! - [`chats`]: the chat record store and sharing gate
//! - [`admin`]: operator allow-list and aggregation views
//! - [`gateway`]: bearer-token identity and HTTP endpoints
//! - [`api`]: health and readiness endpoints
//! - [`config`]: configuration loading, validation and the environment check
//!
//! # Example
//!
//! ```rust,ignore
//! use biosarthi_api::{config::AppConfig, server::create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let app = create_app(config, false).await?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod api;
pub mod chats;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod kv;
pub mod logging;
pub mod server;

use std::sync::Arc;

use crate::admin::{AdminService, OperatorAllowList};
use crate::chats::ChatStore;
use crate::config::AppConfig;
use crate::kv::KvStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Backing store, shared by every service.
    pub kv: Arc<dyn KvStore>,
    pub chats: ChatStore,
    pub admin: AdminService,
}

impl AppState {
    /// Wire the services over one store.
    pub fn new(config: AppConfig, kv: Arc<dyn KvStore>) -> Self {
        let operators = OperatorAllowList::new(&config.admin.operator_emails);

        Self {
            chats: ChatStore::new(Arc::clone(&kv)),
            admin: AdminService::new(Arc::clone(&kv), operators),
            config: Arc::new(config),
            kv,
        }
    }
}
