//! HTTP gateway: caller identity, chat endpoints and the operator dashboard.

pub mod admin;
pub mod auth;
pub mod chats;

use axum::Router;

use crate::AppState;

/// Create the gateway router with all chat and admin routes.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(chats::router())
        .merge(admin::router())
}
