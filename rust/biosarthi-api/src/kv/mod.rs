//! Key-value store abstraction.
//!
//! Chat records, per-user chat indexes and identity records all live in a
//! networked key-value store with Redis semantics: flat string hashes, sorted
//! sets, prefix key enumeration and pipelined command batches.
//!
//! Two backends implement [`KvStore`]:
//!
//! - [`RedisKv`]: the production backend over a Redis `ConnectionManager`
//! - [`InMemoryKv`]: a process-local fallback used when Redis is not
//!   configured, and throughout the test suite

pub mod memory;
pub mod redis;

pub use self::memory::InMemoryKv;
pub use self::redis::RedisKv;

use std::collections::HashMap;

use async_trait::async_trait;

/// Field/value pairs of a stored hash.
pub type Fields = HashMap<String, String>;

/// Result alias for store calls.
pub type KvResult<T> = Result<T, KvError>;

/// Any failure talking to the store.
///
/// Callers never see transport details beyond the message; the chat layer
/// treats every variant as "store unavailable".
#[derive(Debug, Clone, thiserror::Error)]
pub enum KvError {
    /// The store could not be reached or rejected the command.
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),
}

impl From<::redis::RedisError> for KvError {
    fn from(err: ::redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Iteration order for sorted-set ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOrder {
    /// Lowest score first.
    Ascending,
    /// Highest score first.
    Descending,
}

/// A single write queued in a [`Batch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set every given field on a hash (`HSET key f1 v1 f2 v2 ...`).
    HashSetAll { key: String, fields: Fields },
    /// Delete a key of any type.
    Delete { key: String },
    /// Add or re-score a sorted-set member.
    SortedAdd {
        key: String,
        score: f64,
        member: String,
    },
    /// Remove a sorted-set member.
    SortedRemove { key: String, member: String },
}

/// A group of writes submitted to the store in one round trip.
///
/// Batches are pipelined, not transactional: the store applies the commands
/// in order but a concurrent reader may observe a state where only some of
/// them have landed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a full hash overwrite of the given fields.
    #[must_use]
    pub fn hset_all(mut self, key: impl Into<String>, fields: Fields) -> Self {
        self.commands.push(Command::HashSetAll {
            key: key.into(),
            fields,
        });
        self
    }

    /// Queue a key deletion.
    #[must_use]
    pub fn del(mut self, key: impl Into<String>) -> Self {
        self.commands.push(Command::Delete { key: key.into() });
        self
    }

    /// Queue a sorted-set upsert.
    #[must_use]
    pub fn zadd(mut self, key: impl Into<String>, score: f64, member: impl Into<String>) -> Self {
        self.commands.push(Command::SortedAdd {
            key: key.into(),
            score,
            member: member.into(),
        });
        self
    }

    /// Queue a sorted-set member removal.
    #[must_use]
    pub fn zrem(mut self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.commands.push(Command::SortedRemove {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    /// Queued commands, in submission order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

/// Operations the chat and admin layers need from the store.
#[async_trait]
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Read every field of a hash. A missing key yields `None`.
    async fn hgetall(&self, key: &str) -> KvResult<Option<Fields>>;

    /// Read several hashes in one pipelined round trip, preserving order.
    async fn hgetall_many(&self, keys: &[String]) -> KvResult<Vec<Option<Fields>>>;

    /// Read a single hash field.
    async fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>>;

    /// Read every member of a sorted set in the given order.
    async fn zrange(&self, key: &str, order: RangeOrder) -> KvResult<Vec<String>>;

    /// Enumerate keys matching a glob pattern such as `chat:*`.
    async fn keys(&self, pattern: &str) -> KvResult<Vec<String>>;

    /// Submit a batch of writes as one round trip.
    async fn exec(&self, batch: Batch) -> KvResult<()>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
