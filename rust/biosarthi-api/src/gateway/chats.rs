//! Chat endpoints.
//!
//! Reads fold store outages into empty/null bodies; mutations report them
//! as 503 so the caller knows nothing was written.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::AppState;
use crate::chats::{ChatError, IncomingMessage, Revalidation, SaveOutcome, SoftFail};
use crate::domain::chat::{Chat, chat_path};
use crate::gateway::auth::Caller;

/// Chat routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/chats",
            get(list_chats).post(save_chat).delete(clear_chats),
        )
        .route("/api/v1/chats/{id}", get(get_chat).delete(remove_chat))
        .route("/api/v1/chats/{id}/messages", put(persist_conversation))
        .route("/api/v1/chats/{id}/share", post(share_chat))
        .route("/api/v1/share/{id}", get(get_shared_chat))
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::ShareFailed => StatusCode::BAD_REQUEST,
            Self::Store(e) => {
                tracing::error!(error = %e, "Store unavailable during mutation");
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Encode(e) => {
                tracing::error!(error = %e, "Failed to encode chat record");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(self.body())).into_response()
    }
}

impl IntoResponse for SaveOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Saved(chat) => Json(chat).into_response(),
            Self::Skipped => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `?userId=` query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// `?path=` query.
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: Option<String>,
}

/// Body of a completed assistant turn.
#[derive(Debug, Deserialize)]
pub struct PersistRequest {
    pub messages: Vec<IncomingMessage>,
}

/// List the caller's chats, newest first.
pub async fn list_chats(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<Chat>>, ChatError> {
    let chats = state
        .chats
        .get_chats_for_user(caller.session(), query.user_id.as_deref())
        .await
        .soften("get_chats_for_user")?;
    Ok(Json(chats))
}

/// Fetch one chat. `userId` defaults to the caller's own id.
pub async fn get_chat(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Option<Chat>>, ChatError> {
    let user_id = query
        .user_id
        .or_else(|| caller.session().map(|session| session.user_id.clone()))
        .unwrap_or_default();

    let chat = state
        .chats
        .get_chat(caller.session(), &id, &user_id)
        .await
        .soften("get_chat")?;
    Ok(Json(chat))
}

/// Overwrite a full chat record.
pub async fn save_chat(
    State(state): State<AppState>,
    caller: Caller,
    Json(chat): Json<Chat>,
) -> Result<SaveOutcome, ChatError> {
    state.chats.save_chat(caller.session(), chat).await
}

/// Persist the conversation after an assistant reply completes.
pub async fn persist_conversation(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(req): Json<PersistRequest>,
) -> Result<SaveOutcome, ChatError> {
    state
        .chats
        .persist_conversation(caller.session(), &id, req.messages)
        .await
}

/// Delete one chat.
pub async fn remove_chat(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Revalidation>, ChatError> {
    let path = query.path.unwrap_or_else(|| chat_path(&id));
    let revalidation = state.chats.remove_chat(caller.session(), &id, &path).await?;
    Ok(Json(revalidation))
}

/// Delete all of the caller's chats.
pub async fn clear_chats(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Revalidation>, ChatError> {
    let revalidation = state.chats.clear_all_chats(caller.session()).await?;
    Ok(Json(revalidation))
}

/// Share a chat publicly.
pub async fn share_chat(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Chat>, ChatError> {
    let chat = state.chats.share_chat(caller.session(), &id).await?;
    Ok(Json(chat))
}

/// Anonymous read of a shared chat.
pub async fn get_shared_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Chat>>, ChatError> {
    let chat = state
        .chats
        .get_shared_chat(&id)
        .await
        .soften("get_shared_chat")?;
    Ok(Json(chat))
}
