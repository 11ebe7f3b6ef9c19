//! Process-local [`KvStore`] used as the development fallback and in tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Batch, Command, Fields, KvError, KvResult, KvStore, RangeOrder};

#[derive(Debug, Default)]
struct Inner {
    hashes: HashMap<String, Fields>,
    sorted_sets: HashMap<String, HashMap<String, f64>>,
}

/// In-memory store with Redis-compatible semantics for the commands the
/// service uses.
///
/// A whole [`Batch`] is applied under one write lock. [`Self::set_offline`]
/// makes every call fail, which lets tests exercise store outages.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKv {
    inner: Arc<RwLock<Inner>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryKv {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Write a hash directly, bypassing batching. Used to seed identity
    /// records, which this service only ever reads.
    pub fn insert_hash(&self, key: impl Into<String>, fields: Fields) {
        self.inner.write().hashes.insert(key.into(), fields);
    }

    /// Score of a sorted-set member, if present.
    pub fn score(&self, key: &str, member: &str) -> Option<f64> {
        self.inner
            .read()
            .sorted_sets
            .get(key)
            .and_then(|set| set.get(member).copied())
    }

    fn check_online(&self) -> KvResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(KvError::Unavailable("in-memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Match a key against a glob pattern. Only `*` wildcards are supported,
/// which covers every pattern the service issues.
fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !key.starts_with(first) || key.len() < first.len() + last.len() {
        return false;
    }

    let mut rest = &key[first.len()..];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[async_trait]
impl KvStore for InMemoryKv {
    async fn hgetall(&self, key: &str) -> KvResult<Option<Fields>> {
        self.check_online()?;
        Ok(self.inner.read().hashes.get(key).cloned())
    }

    async fn hgetall_many(&self, keys: &[String]) -> KvResult<Vec<Option<Fields>>> {
        self.check_online()?;
        let inner = self.inner.read();
        Ok(keys.iter().map(|key| inner.hashes.get(key).cloned()).collect())
    }

    async fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>> {
        self.check_online()?;
        Ok(self
            .inner
            .read()
            .hashes
            .get(key)
            .and_then(|fields| fields.get(field).cloned()))
    }

    async fn zrange(&self, key: &str, order: RangeOrder) -> KvResult<Vec<String>> {
        self.check_online()?;
        let inner = self.inner.read();
        let Some(set) = inner.sorted_sets.get(key) else {
            return Ok(Vec::new());
        };

        // Redis orders ties lexicographically by member
        let mut members: Vec<(&String, f64)> = set.iter().map(|(m, s)| (m, *s)).collect();
        members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        if order == RangeOrder::Descending {
            members.reverse();
        }

        Ok(members.into_iter().map(|(m, _)| m.clone()).collect())
    }

    async fn keys(&self, pattern: &str) -> KvResult<Vec<String>> {
        self.check_online()?;
        let inner = self.inner.read();
        let mut keys: Vec<String> = inner
            .hashes
            .keys()
            .chain(inner.sorted_sets.keys())
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn exec(&self, batch: Batch) -> KvResult<()> {
        self.check_online()?;
        let mut inner = self.inner.write();

        for command in batch.commands() {
            match command {
                Command::HashSetAll { key, fields } => {
                    let hash = inner.hashes.entry(key.clone()).or_default();
                    for (field, value) in fields {
                        hash.insert(field.clone(), value.clone());
                    }
                }
                Command::Delete { key } => {
                    inner.hashes.remove(key);
                    inner.sorted_sets.remove(key);
                }
                Command::SortedAdd { key, score, member } => {
                    inner
                        .sorted_sets
                        .entry(key.clone())
                        .or_default()
                        .insert(member.clone(), *score);
                }
                Command::SortedRemove { key, member } => {
                    let emptied = match inner.sorted_sets.get_mut(key) {
                        Some(set) => {
                            set.remove(member);
                            set.is_empty()
                        }
                        None => false,
                    };
                    // Redis drops a sorted set once its last member goes
                    if emptied {
                        inner.sorted_sets.remove(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("chat:*", "chat:abc"));
        assert!(glob_match("user:*", "user:chat:u1"));
        assert!(!glob_match("chat:*", "user:chat:u1"));
        assert!(glob_match("user:chat:u1", "user:chat:u1"));
        assert!(glob_match("*:chat:*", "user:chat:u1"));
        assert!(!glob_match("chat:*x", "chat:"));
    }

    #[tokio::test]
    async fn test_hash_set_and_get() {
        let kv = InMemoryKv::new();
        kv.exec(Batch::new().hset_all("chat:1", fields(&[("id", "1"), ("title", "t")])))
            .await
            .unwrap();

        let stored = kv.hgetall("chat:1").await.unwrap().unwrap();
        assert_eq!(stored.get("title").map(String::as_str), Some("t"));
        assert_eq!(kv.hget("chat:1", "id").await.unwrap().as_deref(), Some("1"));
        assert!(kv.hgetall("chat:2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hash_set_all_merges_fields() {
        let kv = InMemoryKv::new();
        kv.exec(Batch::new().hset_all("h", fields(&[("a", "1"), ("b", "2")])))
            .await
            .unwrap();
        kv.exec(Batch::new().hset_all("h", fields(&[("b", "3")])))
            .await
            .unwrap();

        let stored = kv.hgetall("h").await.unwrap().unwrap();
        assert_eq!(stored, fields(&[("a", "1"), ("b", "3")]));
    }

    #[tokio::test]
    async fn test_sorted_set_ordering() {
        let kv = InMemoryKv::new();
        kv.exec(
            Batch::new()
                .zadd("z", 2.0, "b")
                .zadd("z", 1.0, "a")
                .zadd("z", 3.0, "c"),
        )
        .await
        .unwrap();

        assert_eq!(kv.zrange("z", RangeOrder::Ascending).await.unwrap(), ["a", "b", "c"]);
        assert_eq!(kv.zrange("z", RangeOrder::Descending).await.unwrap(), ["c", "b", "a"]);

        kv.exec(Batch::new().zadd("z", 0.5, "c")).await.unwrap();
        assert_eq!(kv.zrange("z", RangeOrder::Ascending).await.unwrap(), ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_zrem_drops_empty_set() {
        let kv = InMemoryKv::new();
        kv.exec(Batch::new().zadd("z", 1.0, "a")).await.unwrap();
        kv.exec(Batch::new().zrem("z", "a")).await.unwrap();

        assert!(kv.keys("z").await.unwrap().is_empty());
        assert!(kv.zrange("z", RangeOrder::Ascending).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_by_prefix() {
        let kv = InMemoryKv::new();
        kv.insert_hash("user:a@example.com", fields(&[("id", "a")]));
        kv.exec(
            Batch::new()
                .hset_all("chat:2", fields(&[("id", "2")]))
                .hset_all("chat:1", fields(&[("id", "1")]))
                .zadd("user:chat:a", 1.0, "chat:1"),
        )
        .await
        .unwrap();

        assert_eq!(kv.keys("chat:*").await.unwrap(), ["chat:1", "chat:2"]);
        assert_eq!(
            kv.keys("user:*").await.unwrap(),
            ["user:a@example.com", "user:chat:a"]
        );
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let kv = InMemoryKv::new();
        kv.set_offline(true);

        assert!(kv.hgetall("chat:1").await.is_err());
        assert!(kv.keys("chat:*").await.is_err());
        assert!(kv.exec(Batch::new().del("chat:1")).await.is_err());

        kv.set_offline(false);
        assert!(kv.hgetall("chat:1").await.is_ok());
    }
}
