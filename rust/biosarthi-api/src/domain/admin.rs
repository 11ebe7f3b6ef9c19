//! Read models for the operator dashboard.

use serde::Serialize;

use super::chat::{Message, MessageContent, Role};

/// One row of the registered-users listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAdminDisplay {
    /// 1-based position in enumeration order.
    pub index: usize,
    pub id: String,
    pub email: String,
}

/// One entry of the all-chats listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSummary {
    pub index: usize,
    pub id: String,
    pub messages: Vec<Message>,
}

/// One row of the chat activity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTableRow {
    /// 1-based recency rank, newest first.
    pub index: usize,
    pub chat_id: String,
    pub user_email: String,
    pub created_at: i64,
}

/// A conversational turn as shown to operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptMessage {
    pub id: String,
    pub role: Role,
    pub content: MessageContent,
}

/// User and assistant turns of one chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTranscript {
    pub chat_id: String,
    pub messages: Vec<TranscriptMessage>,
}

impl ChatTranscript {
    /// Keep only user and assistant turns.
    pub fn from_messages(chat_id: impl Into<String>, messages: &[Message]) -> Self {
        Self {
            chat_id: chat_id.into(),
            messages: messages
                .iter()
                .filter(|message| message.role.is_conversational())
                .map(|message| TranscriptMessage {
                    id: message.id.clone(),
                    role: message.role,
                    content: message.content.clone(),
                })
                .collect(),
        }
    }
}
