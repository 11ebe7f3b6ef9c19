//! Core domain models.
//!
//! - [`chat`]: conversation records, messages and storage key layout
//! - [`user`]: caller sessions and stored identity records
//! - [`admin`]: operator dashboard read models

pub mod admin;
pub mod chat;
pub mod user;

pub use admin::{ChatSummary, ChatTableRow, ChatTranscript, TranscriptMessage, UserAdminDisplay};
pub use chat::{Chat, Message, MessageContent, RecordError, Role};
pub use user::{Session, UserRecord};
