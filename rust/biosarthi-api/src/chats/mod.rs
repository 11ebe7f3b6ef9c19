//! Chat record store.
//!
//! Durable, per-user-isolated storage of conversations. Every operation
//! takes the caller's session and re-derives ownership from the stored
//! record on each call; nothing about authorization is cached.
//!
//! Multi-key writes (record + index entry) go out as one [`Batch`]. Batches
//! are pipelined, not isolated: a reader racing the batch can briefly see a
//! record without its index entry or the reverse. That window is accepted.

pub mod error;

pub use error::{ChatError, ErrorBody, SoftFail};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::chat::{self, Chat, Message, MessageContent, Role};
use crate::domain::user::Session;
use crate::kv::{Batch, KvStore, RangeOrder};

/// Root path of the presenting layer.
pub const ROOT_PATH: &str = "/";

/// Paths whose cached renders went stale after a mutation, plus where the
/// presenting layer may navigate next. The store never navigates itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Revalidation {
    pub stale_paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Result of a save request.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The record and its index entry were written.
    Saved(Chat),
    /// The caller is a guest; guest conversations are not persisted.
    Skipped,
}

impl SaveOutcome {
    pub fn chat(&self) -> Option<&Chat> {
        match self {
            Self::Saved(chat) => Some(chat),
            Self::Skipped => None,
        }
    }
}

/// A message as handed over by the assistant runtime when a reply completes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub role: Role,
    pub content: MessageContent,
}

impl IncomingMessage {
    fn into_message(self) -> Message {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Message::new(id, self.role, self.content)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[allow(clippy::cast_precision_loss, reason = "epoch millis are exact in f64 until year 285616")]
fn index_score(created_at: i64) -> f64 {
    created_at as f64
}

/// Chat persistence and authorization.
#[derive(Debug, Clone)]
pub struct ChatStore {
    kv: Arc<dyn KvStore>,
}

impl ChatStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Load and decode a chat record. Undecodable records count as absent.
    async fn load(&self, id: &str) -> Result<Option<Chat>, ChatError> {
        let Some(fields) = self.kv.hgetall(&chat::chat_key(id)).await? else {
            return Ok(None);
        };

        match Chat::from_fields(&fields) {
            Ok(chat) => Ok(Some(chat)),
            Err(e) => {
                tracing::warn!(chat_id = %id, error = %e, "Skipping undecodable chat record");
                Ok(None)
            }
        }
    }

    /// Chats owned by `user_id`, newest first.
    ///
    /// An absent or empty `user_id` yields nothing without touching the
    /// store; any other user id must match the caller.
    pub async fn get_chats_for_user(
        &self,
        caller: Option<&Session>,
        user_id: Option<&str>,
    ) -> Result<Vec<Chat>, ChatError> {
        let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
            return Ok(Vec::new());
        };
        if !caller.is_some_and(|session| session.owns(user_id)) {
            return Err(ChatError::Unauthorized);
        }

        let keys = self
            .kv
            .zrange(&chat::user_index_key(user_id), RangeOrder::Descending)
            .await?;
        let records = self.kv.hgetall_many(&keys).await?;

        let chats = keys
            .iter()
            .zip(records)
            .filter_map(|(key, fields)| {
                let fields = fields?;
                match Chat::from_fields(&fields) {
                    Ok(chat) if chat.user_id == user_id => Some(chat),
                    Ok(chat) => {
                        tracing::warn!(key = %key, owner = %chat.user_id, user_id = %user_id, "Skipping indexed chat owned by another user");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Skipping undecodable chat record");
                        None
                    }
                }
            })
            .collect();

        Ok(chats)
    }

    /// A single chat, if it exists and is owned by `user_id`.
    pub async fn get_chat(
        &self,
        caller: Option<&Session>,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Chat>, ChatError> {
        if !caller.is_some_and(|session| session.owns(user_id)) {
            return Err(ChatError::Unauthorized);
        }

        // The stored owner is checked too, not just the session
        Ok(self.load(id).await?.filter(|chat| chat.user_id == user_id))
    }

    /// Delete one chat and its index entry.
    ///
    /// Ownership comes from the stored record's `userId` field, never from
    /// anything the client sent.
    pub async fn remove_chat(
        &self,
        caller: Option<&Session>,
        id: &str,
        path: &str,
    ) -> Result<Revalidation, ChatError> {
        let session = caller.ok_or(ChatError::Unauthorized)?;

        let key = chat::chat_key(id);
        let owner = self.kv.hget(&key, "userId").await?;
        if owner.as_deref() != Some(session.user_id.as_str()) {
            tracing::warn!(chat_id = %id, user_id = %session.user_id, "Refusing to remove chat not owned by caller");
            return Err(ChatError::Unauthorized);
        }

        let batch = Batch::new()
            .del(key.clone())
            .zrem(chat::user_index_key(&session.user_id), key);
        self.kv.exec(batch).await?;

        tracing::info!(chat_id = %id, user_id = %session.user_id, "Chat removed");
        Ok(Revalidation {
            stale_paths: vec![ROOT_PATH.to_string(), path.to_string()],
            redirect: None,
        })
    }

    /// Delete every chat owned by the caller.
    pub async fn clear_all_chats(&self, caller: Option<&Session>) -> Result<Revalidation, ChatError> {
        let session = caller.ok_or(ChatError::Unauthorized)?;

        let index_key = chat::user_index_key(&session.user_id);
        let keys = self.kv.zrange(&index_key, RangeOrder::Ascending).await?;
        if keys.is_empty() {
            return Ok(Revalidation {
                stale_paths: Vec::new(),
                redirect: Some(ROOT_PATH.to_string()),
            });
        }

        let count = keys.len();
        let batch = keys.into_iter().fold(Batch::new(), |batch, key| {
            batch.del(key.clone()).zrem(index_key.clone(), key)
        });
        self.kv.exec(batch).await?;

        tracing::info!(user_id = %session.user_id, count, "All chats cleared");
        Ok(Revalidation {
            stale_paths: vec![ROOT_PATH.to_string()],
            redirect: Some(ROOT_PATH.to_string()),
        })
    }

    /// Overwrite the full record and upsert its index entry.
    ///
    /// Guests are skipped silently. An existing record may only be
    /// overwritten by its stored owner; the `userId` in the payload is not
    /// trusted for that.
    ///
    /// The index is scored by `created_at`, so a conversation the user picks
    /// up again keeps its place in their history instead of jumping to the
    /// top.
    pub async fn save_chat(
        &self,
        caller: Option<&Session>,
        chat: Chat,
    ) -> Result<SaveOutcome, ChatError> {
        let Some(session) = caller else {
            tracing::debug!(chat_id = %chat.id, "Guest conversation, not persisted");
            return Ok(SaveOutcome::Skipped);
        };
        if !session.owns(&chat.user_id) {
            return Err(ChatError::Unauthorized);
        }

        let key = chat.key();
        let owner = self.kv.hget(&key, "userId").await?;
        if owner.as_deref().is_some_and(|owner| !session.owns(owner)) {
            tracing::warn!(chat_id = %chat.id, user_id = %session.user_id, "Refusing to overwrite chat owned by another user");
            return Err(ChatError::Unauthorized);
        }

        let batch = Batch::new()
            .hset_all(key.clone(), chat.to_fields()?)
            .zadd(chat::user_index_key(&chat.user_id), index_score(chat.created_at), key);
        self.kv.exec(batch).await?;

        tracing::debug!(chat_id = %chat.id, messages = chat.messages.len(), "Chat saved");
        Ok(SaveOutcome::Saved(chat))
    }

    /// Persist a conversation once the assistant has finished replying.
    ///
    /// The first persist creates the record; later ones replace the message
    /// list and keep the original creation time, title and share path.
    pub async fn persist_conversation(
        &self,
        caller: Option<&Session>,
        chat_id: &str,
        messages: Vec<IncomingMessage>,
    ) -> Result<SaveOutcome, ChatError> {
        let Some(session) = caller else {
            tracing::debug!(chat_id = %chat_id, "Guest conversation, not persisted");
            return Ok(SaveOutcome::Skipped);
        };

        let messages: Vec<Message> = messages.into_iter().map(IncomingMessage::into_message).collect();
        let mut chat = Chat::new(chat_id, session.user_id.clone(), messages, now_millis());

        // save_chat enforces the stored owner
        if let Some(existing) = self.load(chat_id).await?.filter(|c| session.owns(&c.user_id)) {
            chat.created_at = existing.created_at;
            chat.title = existing.title;
            chat.share_path = existing.share_path;
        }

        self.save_chat(caller, chat).await
    }

    /// A chat readable by anyone because it has been shared.
    pub async fn get_shared_chat(&self, id: &str) -> Result<Option<Chat>, ChatError> {
        Ok(self.load(id).await?.filter(|chat| chat.share_path.is_some()))
    }

    /// Make a chat publicly readable at its share path.
    ///
    /// There is no way back: shared chats stay shared.
    pub async fn share_chat(&self, caller: Option<&Session>, id: &str) -> Result<Chat, ChatError> {
        let session = caller.ok_or(ChatError::Unauthorized)?;

        let mut chat = match self.load(id).await? {
            Some(chat) if session.owns(&chat.user_id) => chat,
            _ => return Err(ChatError::ShareFailed),
        };
        chat.share_path = Some(chat::share_path(&chat.id));

        self.kv
            .exec(Batch::new().hset_all(chat.key(), chat.to_fields()?))
            .await?;

        tracing::info!(chat_id = %id, "Chat shared");
        Ok(chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKv;

    fn store() -> (ChatStore, InMemoryKv) {
        let kv = InMemoryKv::new();
        (ChatStore::new(Arc::new(kv.clone())), kv)
    }

    fn alice() -> Session {
        Session::new("u1", "alice@example.com")
    }

    fn bob() -> Session {
        Session::new("u2", "bob@example.com")
    }

    fn chat(id: &str, owner: &str, created_at: i64) -> Chat {
        Chat::new(
            id,
            owner,
            vec![
                Message::new(format!("{id}-m1"), Role::User, "How does a digester work?"),
                Message::new(format!("{id}-m2"), Role::Assistant, "Anaerobic bacteria..."),
            ],
            created_at,
        )
    }

    fn incoming(role: Role, text: &str) -> IncomingMessage {
        IncomingMessage {
            id: None,
            role,
            content: text.into(),
        }
    }

    #[tokio::test]
    async fn test_save_and_get_chat() {
        let (store, _) = store();
        let session = alice();

        let outcome = store.save_chat(Some(&session), chat("c1", "u1", 100)).await.unwrap();
        assert!(outcome.chat().is_some());

        let loaded = store.get_chat(Some(&session), "c1", "u1").await.unwrap().unwrap();
        assert_eq!(loaded.user_id, "u1");
        assert_eq!(loaded.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_message_count_grows_across_saves() {
        let (store, _) = store();
        let session = alice();
        let mut record = chat("c1", "u1", 100);
        store.save_chat(Some(&session), record.clone()).await.unwrap();

        let mut previous = 2;
        for turn in 0..3 {
            record
                .messages
                .push(Message::new(format!("extra-{turn}"), Role::User, "more?"));
            store.save_chat(Some(&session), record.clone()).await.unwrap();

            let loaded = store.get_chat(Some(&session), "c1", "u1").await.unwrap().unwrap();
            assert!(loaded.messages.len() > previous);
            previous = loaded.messages.len();
        }

        let listed = store.get_chats_for_user(Some(&session), Some("u1")).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_get_chat_requires_matching_session() {
        let (store, _) = store();
        store.save_chat(Some(&alice()), chat("c1", "u1", 100)).await.unwrap();

        let err = store.get_chat(Some(&bob()), "c1", "u1").await.unwrap_err();
        assert!(err.is_unauthorized());
        let err = store.get_chat(None, "c1", "u1").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_get_chat_checks_stored_owner() {
        let (store, _) = store();
        store.save_chat(Some(&alice()), chat("c1", "u1", 100)).await.unwrap();

        // Bob asks about his own user id but names Alice's chat
        let result = store.get_chat(Some(&bob()), "c1", "u2").await.unwrap();
        assert!(result.is_none());
        assert!(store.get_chat(Some(&alice()), "missing", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first_without_duplicates() {
        let (store, _) = store();
        let session = alice();
        store.save_chat(Some(&session), chat("old", "u1", 100)).await.unwrap();
        store.save_chat(Some(&session), chat("new", "u1", 300)).await.unwrap();
        store.save_chat(Some(&session), chat("mid", "u1", 200)).await.unwrap();
        // Re-saving must not duplicate or reorder
        store.save_chat(Some(&session), chat("old", "u1", 100)).await.unwrap();

        let chats = store.get_chats_for_user(Some(&session), Some("u1")).await.unwrap();
        let ids: Vec<&str> = chats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["new", "mid", "old"]);
        assert!(chats.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_list_without_user_id_is_empty() {
        let (store, kv) = store();
        // No lookup happens, so even an offline store is fine
        kv.set_offline(true);

        assert!(store.get_chats_for_user(None, None).await.unwrap().is_empty());
        assert!(store.get_chats_for_user(Some(&alice()), Some("")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_for_other_user_is_unauthorized() {
        let (store, _) = store();
        let err = store.get_chats_for_user(Some(&bob()), Some("u1")).await.unwrap_err();
        assert!(err.is_unauthorized());
        let err = store.get_chats_for_user(None, Some("u1")).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_remove_by_non_owner_changes_nothing() {
        let (store, kv) = store();
        store.save_chat(Some(&alice()), chat("c1", "u1", 100)).await.unwrap();

        let err = store.remove_chat(Some(&bob()), "c1", "/chat/c1").await.unwrap_err();
        assert!(err.is_unauthorized());
        let err = store.remove_chat(None, "c1", "/chat/c1").await.unwrap_err();
        assert!(err.is_unauthorized());

        assert!(store.get_chat(Some(&alice()), "c1", "u1").await.unwrap().is_some());
        assert_eq!(kv.score("user:chat:u1", "chat:c1"), Some(100.0));
    }

    #[tokio::test]
    async fn test_remove_missing_chat_is_unauthorized() {
        let (store, _) = store();
        let err = store.remove_chat(Some(&alice()), "ghost", "/chat/ghost").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_remove_by_owner_clears_record_and_index() {
        let (store, kv) = store();
        let session = alice();
        store.save_chat(Some(&session), chat("c1", "u1", 100)).await.unwrap();
        store.save_chat(Some(&session), chat("c2", "u1", 200)).await.unwrap();

        let revalidation = store.remove_chat(Some(&session), "c1", "/chat/c1").await.unwrap();
        assert_eq!(revalidation.stale_paths, ["/", "/chat/c1"]);
        assert!(revalidation.redirect.is_none());

        assert!(store.get_chat(Some(&session), "c1", "u1").await.unwrap().is_none());
        assert!(kv.score("user:chat:u1", "chat:c1").is_none());
        let remaining = store.get_chats_for_user(Some(&session), Some("u1")).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "c2");
    }

    #[tokio::test]
    async fn test_clear_all_chats() {
        let (store, kv) = store();
        let session = alice();
        store.save_chat(Some(&session), chat("c1", "u1", 100)).await.unwrap();
        store.save_chat(Some(&session), chat("c2", "u1", 200)).await.unwrap();
        store.save_chat(Some(&bob()), chat("c3", "u2", 300)).await.unwrap();

        let revalidation = store.clear_all_chats(Some(&session)).await.unwrap();
        assert_eq!(revalidation.stale_paths, ["/"]);
        assert_eq!(revalidation.redirect.as_deref(), Some("/"));

        assert!(store.get_chats_for_user(Some(&session), Some("u1")).await.unwrap().is_empty());
        assert_eq!(kv.keys("chat:*").await.unwrap(), ["chat:c3"]);
    }

    #[tokio::test]
    async fn test_clear_with_no_chats_only_redirects() {
        let (store, _) = store();
        let revalidation = store.clear_all_chats(Some(&alice())).await.unwrap();
        assert!(revalidation.stale_paths.is_empty());
        assert_eq!(revalidation.redirect.as_deref(), Some("/"));

        assert!(store.clear_all_chats(None).await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn test_guest_save_is_a_no_op() {
        let (store, kv) = store();

        let outcome = store.save_chat(None, chat("c1", "u1", 100)).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped);
        let outcome = store
            .persist_conversation(None, "c2", vec![incoming(Role::User, "hi")])
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped);

        assert!(kv.keys("chat:*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_for_another_user_is_rejected() {
        let (store, kv) = store();
        let err = store.save_chat(Some(&bob()), chat("c1", "u1", 100)).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(kv.keys("chat:*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_cannot_overwrite_another_users_chat() {
        let (store, kv) = store();
        store.save_chat(Some(&alice()), chat("c1", "u1", 100)).await.unwrap();

        // Payload names bob as owner but targets alice's record
        let mut forged = chat("c1", "u2", 200);
        forged.title = "taken".to_string();
        let err = store.save_chat(Some(&bob()), forged).await.unwrap_err();
        assert!(err.is_unauthorized());

        assert_eq!(kv.hget("chat:c1", "userId").await.unwrap().as_deref(), Some("u1"));
        assert_eq!(kv.hget("chat:c1", "title").await.unwrap(), Some(chat("c1", "u1", 100).title));
        assert!(kv.zrange("user:chat:u2", RangeOrder::Ascending).await.unwrap().is_empty());
        assert_eq!(kv.zrange("user:chat:u1", RangeOrder::Ascending).await.unwrap(), ["chat:c1"]);
    }

    #[tokio::test]
    async fn test_listing_skips_indexed_chats_owned_by_others() {
        let (store, kv) = store();
        store.save_chat(Some(&alice()), chat("c1", "u1", 100)).await.unwrap();
        store.save_chat(Some(&bob()), chat("c2", "u2", 200)).await.unwrap();

        // A stray index entry pointing at bob's record
        kv.exec(Batch::new().zadd("user:chat:u1", 300.0, "chat:c2")).await.unwrap();

        let chats = store.get_chats_for_user(Some(&alice()), Some("u1")).await.unwrap();
        let ids: Vec<&str> = chats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1"]);
    }

    #[tokio::test]
    async fn test_persist_conversation_creates_chat() {
        let (store, _) = store();
        let session = alice();

        store
            .persist_conversation(
                Some(&session),
                "c1",
                vec![
                    incoming(Role::User, "How to boost biogas production?"),
                    incoming(Role::Assistant, "Keep the digester warm and fed evenly."),
                ],
            )
            .await
            .unwrap();

        let chats = store.get_chats_for_user(Some(&session), Some("u1")).await.unwrap();
        let first = &chats[0];
        assert_eq!(first.id, "c1");
        assert_eq!(first.user_id, "u1");
        assert!(first.title.starts_with("How to boost biogas production?"));
        assert_eq!(first.path, "/chat/c1");
        let roles: Vec<Role> = first.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
        assert!(first.messages.iter().all(|m| !m.id.is_empty()));
        assert_ne!(first.messages[0].id, first.messages[1].id);
    }

    #[tokio::test]
    async fn test_persist_conversation_keeps_creation_metadata() {
        let (store, _) = store();
        let session = alice();
        let mut original = chat("c1", "u1", 100);
        original.share_path = Some("/share/c1".to_string());
        store.save_chat(Some(&session), original.clone()).await.unwrap();

        store
            .persist_conversation(
                Some(&session),
                "c1",
                vec![
                    incoming(Role::User, "A different opening"),
                    incoming(Role::Assistant, "reply"),
                    incoming(Role::User, "follow-up"),
                ],
            )
            .await
            .unwrap();

        let loaded = store.get_chat(Some(&session), "c1", "u1").await.unwrap().unwrap();
        assert_eq!(loaded.created_at, 100);
        assert_eq!(loaded.title, original.title);
        assert_eq!(loaded.share_path.as_deref(), Some("/share/c1"));
        assert_eq!(loaded.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_persist_conversation_cannot_take_over_chat() {
        let (store, _) = store();
        store.save_chat(Some(&alice()), chat("c1", "u1", 100)).await.unwrap();

        let err = store
            .persist_conversation(Some(&bob()), "c1", vec![incoming(Role::User, "mine now")])
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());

        let loaded = store.get_chat(Some(&alice()), "c1", "u1").await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_sharing() {
        let (store, _) = store();
        let session = alice();
        store.save_chat(Some(&session), chat("c1", "u1", 100)).await.unwrap();

        assert!(store.get_shared_chat("c1").await.unwrap().is_none());

        let first = store.share_chat(Some(&session), "c1").await.unwrap();
        let second = store.share_chat(Some(&session), "c1").await.unwrap();
        assert_eq!(first.share_path.as_deref(), Some("/share/c1"));
        assert_eq!(first.share_path, second.share_path);

        let shared = store.get_shared_chat("c1").await.unwrap().unwrap();
        assert_eq!(shared.messages.len(), 2);
        assert_eq!(shared.share_path.as_deref(), Some("/share/c1"));
    }

    #[tokio::test]
    async fn test_share_requires_owner() {
        let (store, _) = store();
        store.save_chat(Some(&alice()), chat("c1", "u1", 100)).await.unwrap();

        assert!(store.share_chat(None, "c1").await.unwrap_err().is_unauthorized());
        assert!(matches!(
            store.share_chat(Some(&bob()), "c1").await.unwrap_err(),
            ChatError::ShareFailed
        ));
        assert!(matches!(
            store.share_chat(Some(&alice()), "ghost").await.unwrap_err(),
            ChatError::ShareFailed
        ));
        assert!(store.get_shared_chat("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_outage_is_distinguishable_and_softened() {
        let (store, kv) = store();
        let session = alice();
        store.save_chat(Some(&session), chat("c1", "u1", 100)).await.unwrap();
        kv.set_offline(true);

        let err = store.get_chats_for_user(Some(&session), Some("u1")).await.unwrap_err();
        assert!(matches!(err, ChatError::Store(_)));

        let chats = store
            .get_chats_for_user(Some(&session), Some("u1"))
            .await
            .soften("get_chats_for_user")
            .unwrap();
        assert!(chats.is_empty());

        let chat = store.get_chat(Some(&session), "c1", "u1").await.soften("get_chat").unwrap();
        assert!(chat.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_records_are_skipped() {
        let (store, kv) = store();
        let session = alice();
        store.save_chat(Some(&session), chat("c1", "u1", 100)).await.unwrap();
        store.save_chat(Some(&session), chat("c2", "u1", 200)).await.unwrap();

        let mut broken = crate::kv::Fields::new();
        broken.insert("id".to_string(), "c2".to_string());
        broken.insert("userId".to_string(), "u1".to_string());
        broken.insert("createdAt".to_string(), "yesterday".to_string());
        kv.insert_hash("chat:c2", broken);

        let chats = store.get_chats_for_user(Some(&session), Some("u1")).await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, "c1");
    }
}
