//! Redis-backed [`KvStore`].

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{Batch, Command, Fields, KvResult, KvStore, RangeOrder};

/// Redis store using a `ConnectionManager` for automatic reconnection.
///
/// The manager is cheap to clone; every call works on its own clone so
/// concurrent requests never contend on a shared handle.
#[derive(Clone)]
pub struct RedisKv {
    manager: ConnectionManager,
}

impl std::fmt::Debug for RedisKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKv").finish_non_exhaustive()
    }
}

impl RedisKv {
    /// Connect to Redis at `url`.
    pub async fn connect(url: &str) -> KvResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

/// Redis returns an empty map for a missing hash.
fn non_empty(fields: Fields) -> Option<Fields> {
    if fields.is_empty() { None } else { Some(fields) }
}

#[async_trait]
impl KvStore for RedisKv {
    async fn hgetall(&self, key: &str) -> KvResult<Option<Fields>> {
        let mut conn = self.conn();
        let fields: Fields = conn.hgetall(key).await?;
        Ok(non_empty(fields))
    }

    async fn hgetall_many(&self, keys: &[String]) -> KvResult<Vec<Option<Fields>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for key in keys {
            pipe.hgetall(key);
        }

        let mut conn = self.conn();
        let results: Vec<Fields> = pipe.query_async(&mut conn).await?;
        Ok(results.into_iter().map(non_empty).collect())
    }

    async fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>> {
        let mut conn = self.conn();
        let value: Option<String> = conn.hget(key, field).await?;
        Ok(value)
    }

    async fn zrange(&self, key: &str, order: RangeOrder) -> KvResult<Vec<String>> {
        let mut conn = self.conn();
        let members: Vec<String> = match order {
            RangeOrder::Ascending => conn.zrange(key, 0, -1).await?,
            RangeOrder::Descending => conn.zrevrange(key, 0, -1).await?,
        };
        Ok(members)
    }

    async fn keys(&self, pattern: &str) -> KvResult<Vec<String>> {
        let mut conn = self.conn();
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    async fn exec(&self, batch: Batch) -> KvResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for command in batch.commands() {
            match command {
                Command::HashSetAll { key, fields } => {
                    // HSET rejects an empty field list
                    if fields.is_empty() {
                        continue;
                    }
                    let items: Vec<(&str, &str)> = fields
                        .iter()
                        .map(|(field, value)| (field.as_str(), value.as_str()))
                        .collect();
                    pipe.hset_multiple(key, &items).ignore();
                }
                Command::Delete { key } => {
                    pipe.del(key).ignore();
                }
                Command::SortedAdd { key, score, member } => {
                    pipe.zadd(key, member, *score).ignore();
                }
                Command::SortedRemove { key, member } => {
                    pipe.zrem(key, member).ignore();
                }
            }
        }

        let mut conn = self.conn();
        pipe.query_async::<()>(&mut conn).await?;

        tracing::debug!(commands = batch.len(), "Batch executed");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
