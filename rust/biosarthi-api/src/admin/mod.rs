//! Admin aggregation layer.
//!
//! Read-only scans over every stored user and chat for the operator
//! dashboard. The [`OperatorAllowList`] is checked before any store read;
//! callers outside it get empty results rather than an error.

pub mod allow_list;

pub use allow_list::OperatorAllowList;

use std::sync::Arc;

use crate::chats::ChatError;
use crate::domain::admin::{ChatSummary, ChatTableRow, ChatTranscript, UserAdminDisplay};
use crate::domain::chat::{self, Chat, parse_created_at};
use crate::domain::user::{Session, UserRecord, looks_like_email, user_key};
use crate::kv::KvStore;
use crate::logging::OpTimer;

const CHAT_PATTERN: &str = "chat:*";
const USER_PATTERN: &str = "user:*";
const USER_INDEX_PREFIX: &str = "user:chat:";

/// Shown when a chat owner has no identity record.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Operator-only views over the whole store.
#[derive(Debug, Clone)]
pub struct AdminService {
    kv: Arc<dyn KvStore>,
    operators: Arc<OperatorAllowList>,
}

impl AdminService {
    pub fn new(kv: Arc<dyn KvStore>, operators: OperatorAllowList) -> Self {
        Self {
            kv,
            operators: Arc::new(operators),
        }
    }

    pub fn operators(&self) -> &OperatorAllowList {
        &self.operators
    }

    /// Identity keys in stable order, skipping chat indexes and anything
    /// that is not keyed by an email address.
    async fn user_keys(&self) -> Result<Vec<String>, ChatError> {
        let mut keys: Vec<String> = self
            .kv
            .keys(USER_PATTERN)
            .await?
            .into_iter()
            .filter(|key| !key.starts_with(USER_INDEX_PREFIX))
            .filter(|key| key.strip_prefix("user:").is_some_and(looks_like_email))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn chat_keys(&self) -> Result<Vec<String>, ChatError> {
        let mut keys = self.kv.keys(CHAT_PATTERN).await?;
        keys.sort();
        Ok(keys)
    }

    /// Every identity record with both an id and an email. Ungated.
    async fn scan_users(&self) -> Result<Vec<UserRecord>, ChatError> {
        let keys = self.user_keys().await?;
        let records = self.kv.hgetall_many(&keys).await?;
        Ok(records
            .into_iter()
            .flatten()
            .filter_map(|fields| UserRecord::from_fields(&fields))
            .collect())
    }

    /// Registered users as `{id, email}` pairs.
    pub async fn registered_users(
        &self,
        caller: Option<&Session>,
    ) -> Result<Vec<UserRecord>, ChatError> {
        if !self.operators.permits(caller) {
            return Ok(Vec::new());
        }
        self.scan_users().await
    }

    /// Registered users with a 1-based index in key order.
    pub async fn list_all_users(
        &self,
        caller: Option<&Session>,
    ) -> Result<Vec<UserAdminDisplay>, ChatError> {
        if !self.operators.permits(caller) {
            return Ok(Vec::new());
        }

        let timer = OpTimer::new("admin", "list_all_users");
        let result = self.scan_users().await.map(|users| {
            users
                .into_iter()
                .enumerate()
                .map(|(i, user)| UserAdminDisplay {
                    index: i + 1,
                    id: user.id,
                    email: user.email,
                })
                .collect::<Vec<_>>()
        });
        timer.finish_with_result(&result);
        result
    }

    /// Every stored chat with its full message list.
    pub async fn list_all_chats(
        &self,
        caller: Option<&Session>,
    ) -> Result<Vec<ChatSummary>, ChatError> {
        if !self.operators.permits(caller) {
            return Ok(Vec::new());
        }

        let timer = OpTimer::new("admin", "list_all_chats");
        let result = async {
            let keys = self.chat_keys().await?;
            let records = self.kv.hgetall_many(&keys).await?;
            let chats = records
                .into_iter()
                .flatten()
                .filter_map(|fields| Chat::from_fields(&fields).ok())
                .enumerate()
                .map(|(i, chat)| ChatSummary {
                    index: i + 1,
                    id: chat.id,
                    messages: chat.messages,
                })
                .collect::<Vec<_>>();
            Ok::<_, ChatError>(chats)
        }
        .await;
        timer.finish_with_result(&result);
        result
    }

    /// One row per chat with its owner's email, newest first.
    ///
    /// The owner is looked up directly at `user:<userId>` first, then by
    /// scanning registered users for a matching id.
    pub async fn build_chat_table(
        &self,
        caller: Option<&Session>,
    ) -> Result<Vec<ChatTableRow>, ChatError> {
        if !self.operators.permits(caller) {
            return Ok(Vec::new());
        }

        let timer = OpTimer::new("admin", "build_chat_table");
        let result = self.chat_table_rows().await;
        timer.finish_with_result(&result);
        result
    }

    async fn chat_table_rows(&self) -> Result<Vec<ChatTableRow>, ChatError> {
        let keys = self.chat_keys().await?;
        let records = self.kv.hgetall_many(&keys).await?;

        let entries: Vec<(String, String, Option<i64>)> = keys
            .iter()
            .zip(records)
            .filter_map(|(key, fields)| {
                let fields = fields?;
                let chat_id = fields
                    .get("id")
                    .cloned()
                    .or_else(|| key.strip_prefix("chat:").map(String::from))?;
                let user_id = fields.get("userId").cloned().unwrap_or_default();
                let created_at = fields.get("createdAt").and_then(|raw| parse_created_at(raw));
                Some((chat_id, user_id, created_at))
            })
            .collect();

        let owner_keys: Vec<String> = entries.iter().map(|(_, user_id, _)| user_key(user_id)).collect();
        let owners = self.kv.hgetall_many(&owner_keys).await?;

        let now = chrono::Utc::now().timestamp_millis();
        let mut fallback: Option<Vec<UserRecord>> = None;
        let mut rows = Vec::with_capacity(entries.len());

        for ((chat_id, user_id, created_at), owner) in entries.into_iter().zip(owners) {
            let mut email = owner
                .and_then(|fields| fields.get("email").cloned())
                .filter(|email| !email.is_empty());

            if email.is_none() {
                if fallback.is_none() {
                    fallback = Some(self.scan_users().await?);
                }
                email = fallback
                    .as_ref()
                    .and_then(|users| users.iter().find(|user| user.id == user_id))
                    .map(|user| user.email.clone());
            }

            rows.push(ChatTableRow {
                index: 0,
                chat_id,
                user_email: email.unwrap_or_else(|| UNKNOWN_USER.to_string()),
                created_at: created_at.unwrap_or(now),
            });
        }

        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for (i, row) in rows.iter_mut().enumerate() {
            row.index = i + 1;
        }

        Ok(rows)
    }

    /// User and assistant turns of one chat.
    pub async fn get_chat_transcript(
        &self,
        caller: Option<&Session>,
        chat_id: &str,
    ) -> Result<Option<ChatTranscript>, ChatError> {
        if !self.operators.permits(caller) {
            return Ok(None);
        }

        let Some(fields) = self.kv.hgetall(&chat::chat_key(chat_id)).await? else {
            return Ok(None);
        };

        match Chat::from_fields(&fields) {
            Ok(chat) => Ok(Some(ChatTranscript::from_messages(chat.id, &chat.messages))),
            Err(e) => {
                tracing::warn!(chat_id = %chat_id, error = %e, "Chat record could not be decoded");
                Ok(None)
            }
        }
    }
}
