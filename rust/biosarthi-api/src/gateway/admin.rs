//! Operator dashboard endpoints.
//!
//! Callers outside the allow-list get empty bodies, never an error.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::AppState;
use crate::chats::{ChatError, SoftFail};
use crate::domain::admin::{ChatSummary, ChatTableRow, ChatTranscript, UserAdminDisplay};
use crate::gateway::auth::Caller;

/// Admin routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/users", get(list_users))
        .route("/api/v1/admin/chats", get(list_chats))
        .route("/api/v1/admin/chat-table", get(chat_table))
        .route("/api/v1/admin/chats/{id}/transcript", get(transcript))
}

pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<UserAdminDisplay>>, ChatError> {
    let users = state
        .admin
        .list_all_users(caller.session())
        .await
        .soften("list_all_users")?;
    Ok(Json(users))
}

pub async fn list_chats(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<ChatSummary>>, ChatError> {
    let chats = state
        .admin
        .list_all_chats(caller.session())
        .await
        .soften("list_all_chats")?;
    Ok(Json(chats))
}

/// Chat activity table, newest first.
pub async fn chat_table(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<ChatTableRow>>, ChatError> {
    let rows = state
        .admin
        .build_chat_table(caller.session())
        .await
        .soften("build_chat_table")?;
    Ok(Json(rows))
}

pub async fn transcript(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Option<ChatTranscript>>, ChatError> {
    let transcript = state
        .admin
        .get_chat_transcript(caller.session(), &id)
        .await
        .soften("get_chat_transcript")?;
    Ok(Json(transcript))
}
