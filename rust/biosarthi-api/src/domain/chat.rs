//! Chat conversation records and their hash encoding.

use serde::{Deserialize, Serialize};

use crate::kv::Fields;

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Storage key of a chat record.
pub fn chat_key(id: &str) -> String {
    format!("chat:{id}")
}

/// Storage key of a user's chat index.
pub fn user_index_key(user_id: &str) -> String {
    format!("user:chat:{user_id}")
}

/// Canonical reference path of a conversation.
pub fn chat_path(id: &str) -> String {
    format!("/chat/{id}")
}

/// Public path granted by sharing a conversation.
pub fn share_path(id: &str) -> String {
    format!("/share/{id}")
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    /// Whether the turn is part of the human-readable conversation.
    pub fn is_conversational(self) -> bool {
        matches!(self, Self::User | Self::Assistant)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        };
        f.write_str(name)
    }
}

/// Message body. Plain text for conversational turns; tool turns may carry
/// an arbitrary structured payload that the store never inspects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Structured(serde_json::Value),
}

impl MessageContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within the chat.
    pub id: String,
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
        }
    }
}

/// A persisted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub path: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_path: Option<String>,
}

/// Error decoding a stored hash into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Derive a title from the first text message.
pub fn derive_title(messages: &[Message]) -> String {
    messages
        .iter()
        .find_map(|message| message.content.as_text())
        .map(|text| text.chars().take(TITLE_MAX_CHARS).collect())
        .unwrap_or_default()
}

/// Parse a stored creation timestamp.
///
/// Current records store epoch milliseconds; older ones stored an RFC 3339
/// date string.
pub fn parse_created_at(raw: &str) -> Option<i64> {
    let raw = raw.trim().trim_matches('"');
    if let Ok(millis) = raw.parse::<i64>() {
        return Some(millis);
    }
    if let Ok(millis) = raw.parse::<f64>() {
        if millis.is_finite() {
            #[allow(clippy::cast_possible_truncation, reason = "epoch millis fit in i64")]
            let millis = millis as i64;
            return Some(millis);
        }
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|date| date.timestamp_millis())
}

impl Chat {
    /// Build a new chat owned by `user_id`, created at `created_at` millis.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        messages: Vec<Message>,
        created_at: i64,
    ) -> Self {
        let id = id.into();
        Self {
            title: derive_title(&messages),
            path: chat_path(&id),
            user_id: user_id.into(),
            created_at,
            messages,
            share_path: None,
            id,
        }
    }

    /// Storage key of this chat.
    pub fn key(&self) -> String {
        chat_key(&self.id)
    }

    /// Encode into hash fields. Strings are stored verbatim, the timestamp as
    /// decimal millis and the message list as JSON.
    pub fn to_fields(&self) -> Result<Fields, serde_json::Error> {
        let mut fields = Fields::new();
        fields.insert("id".to_string(), self.id.clone());
        fields.insert("userId".to_string(), self.user_id.clone());
        fields.insert("title".to_string(), self.title.clone());
        fields.insert("createdAt".to_string(), self.created_at.to_string());
        fields.insert("path".to_string(), self.path.clone());
        fields.insert("messages".to_string(), serde_json::to_string(&self.messages)?);
        if let Some(share_path) = &self.share_path {
            fields.insert("sharePath".to_string(), share_path.clone());
        }
        Ok(fields)
    }

    /// Decode from hash fields.
    pub fn from_fields(fields: &Fields) -> Result<Self, RecordError> {
        let required = |name: &'static str| {
            fields
                .get(name)
                .cloned()
                .ok_or(RecordError::MissingField(name))
        };

        let id = required("id")?;
        let user_id = required("userId")?;
        let created_at = parse_created_at(&required("createdAt")?).ok_or_else(|| {
            RecordError::InvalidField {
                field: "createdAt",
                reason: "not an epoch or RFC 3339 timestamp".to_string(),
            }
        })?;
        let messages = match fields.get("messages") {
            Some(raw) => serde_json::from_str(raw).map_err(|e| RecordError::InvalidField {
                field: "messages",
                reason: e.to_string(),
            })?,
            None => Vec::new(),
        };

        Ok(Self {
            title: fields.get("title").cloned().unwrap_or_default(),
            path: fields.get("path").cloned().unwrap_or_else(|| chat_path(&id)),
            share_path: fields.get("sharePath").filter(|p| !p.is_empty()).cloned(),
            id,
            user_id,
            created_at,
            messages,
        })
    }
}
