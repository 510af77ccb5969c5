//! Redis store adapter
//!
//! Implements the [`Store`] contract over a shared
//! [`redis::aio::ConnectionManager`]. Every multi-command materialization
//! (save, interstore, unionstore, subtraction) runs as an atomic MULTI/EXEC
//! pipeline so "materialize + set TTL" is never observably split.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::set::{Id, IdWithScore};
use crate::store::{Aggregate, Order, Store};

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

pub struct RedisStore {
    conn: SharedConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    pub fn new(conn: SharedConnectionManager) -> Self {
        Self { conn }
    }

    /// Connect from a `redis://` URL and wrap the manager for sharing.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::store("connect", redis_url, e))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::store("connect", redis_url, e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(manager)),
        })
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.conn.clone()
    }

    async fn zstore_op(
        &self,
        cmd: &'static str,
        dst: &str,
        expire: Duration,
        weights: &[f64],
        aggregate: Aggregate,
        keys: &[String],
    ) -> CacheResult<()> {
        let mut conn = self.conn.lock().await;
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.cmd(cmd)
            .arg(dst)
            .arg(keys.len())
            .arg(keys)
            .arg("WEIGHTS")
            .arg(weights)
            .arg("AGGREGATE")
            .arg(aggregate.to_string())
            .ignore();
        pipe.cmd("EXPIRE").arg(dst).arg(expire.as_secs()).ignore();
        pipe.query_async::<_, ()>(&mut *conn)
            .await
            .map_err(|e| CacheError::store(cmd_label(cmd), dst, e))?;

        debug!(dst = %dst, sources = keys.len(), ttl_secs = expire.as_secs(), command = cmd, "stored set operation");
        Ok(())
    }
}

fn cmd_label(cmd: &'static str) -> &'static str {
    match cmd {
        "ZINTERSTORE" => "interstore",
        "ZUNIONSTORE" => "unionstore",
        _ => cmd,
    }
}

/// Map a PTTL reply onto the TTL contract. Negative sentinels per the Redis
/// documentation: -2 missing key, -1 no expiry.
fn decode_pttl(key: &str, millis: i64) -> CacheResult<Duration> {
    match millis {
        -2 => Err(CacheError::NotFound {
            key: key.to_string(),
        }),
        -1 => Err(CacheError::NoExpiry {
            key: key.to_string(),
        }),
        v if v < 0 => Err(CacheError::UnexpectedTtl {
            key: key.to_string(),
            value: v,
        }),
        v => Ok(Duration::from_millis(v as u64)),
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn save(&self, key: &str, members: &[IdWithScore], expire: Duration) -> CacheResult<()> {
        let mut conn = self.conn.lock().await;
        let mut pipe = redis::pipe();
        pipe.atomic();
        for m in members {
            pipe.zadd(key, m.id.as_str(), m.score).ignore();
        }
        pipe.cmd("EXPIRE").arg(key).arg(expire.as_secs()).ignore();
        pipe.query_async::<_, ()>(&mut *conn)
            .await
            .map_err(|e| CacheError::store("save", key, e))?;

        debug!(key = %key, members = members.len(), ttl_secs = expire.as_secs(), "saved sorted set");
        Ok(())
    }

    async fn ids(&self, key: &str, head: i64, tail: i64, order: Order) -> CacheResult<Vec<Id>> {
        let mut conn = self.conn.lock().await;
        let raw: Vec<String> = match order {
            Order::Ascending => conn.zrange(key, head as isize, tail as isize).await,
            Order::Descending => conn.zrevrange(key, head as isize, tail as isize).await,
        }
        .map_err(|e| CacheError::store("range", key, e))?;

        Ok(raw.into_iter().map(Id::from).collect())
    }

    async fn ids_with_score(
        &self,
        key: &str,
        head: i64,
        tail: i64,
        order: Order,
    ) -> CacheResult<Vec<IdWithScore>> {
        let mut conn = self.conn.lock().await;
        let raw: Vec<(String, f64)> = match order {
            Order::Ascending => {
                conn.zrange_withscores(key, head as isize, tail as isize)
                    .await
            }
            Order::Descending => {
                conn.zrevrange_withscores(key, head as isize, tail as isize)
                    .await
            }
        }
        .map_err(|e| CacheError::store("range", key, e))?;

        Ok(raw
            .into_iter()
            .map(|(id, score)| IdWithScore::new(id, score))
            .collect())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn.lock().await;
        let exists: bool = conn
            .exists(key)
            .await
            .map_err(|e| CacheError::store("exists", key, e))?;
        Ok(exists)
    }

    async fn ttl(&self, key: &str) -> CacheResult<Duration> {
        let mut conn = self.conn.lock().await;
        let millis: i64 = redis::cmd("PTTL")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(|e| CacheError::store("pttl", key, e))?;
        decode_pttl(key, millis)
    }

    async fn interstore(
        &self,
        dst: &str,
        expire: Duration,
        weights: &[f64],
        aggregate: Aggregate,
        keys: &[String],
    ) -> CacheResult<()> {
        self.zstore_op("ZINTERSTORE", dst, expire, weights, aggregate, keys)
            .await
    }

    async fn unionstore(
        &self,
        dst: &str,
        expire: Duration,
        weights: &[f64],
        aggregate: Aggregate,
        keys: &[String],
    ) -> CacheResult<()> {
        self.zstore_op("ZUNIONSTORE", dst, expire, weights, aggregate, keys)
            .await
    }

    async fn subtraction(
        &self,
        dst: &str,
        expire: Duration,
        key1: &str,
        key2: &str,
    ) -> CacheResult<()> {
        let mut conn = self.conn.lock().await;
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.cmd("ZUNIONSTORE")
            .arg(dst)
            .arg(2)
            .arg(key1)
            .arg(key2)
            .arg("WEIGHTS")
            .arg(1)
            .arg(1)
            .arg("AGGREGATE")
            .arg("SUM")
            .ignore();
        pipe.cmd("ZREMRANGEBYSCORE")
            .arg(dst)
            .arg("-inf")
            .arg("(0")
            .ignore();
        pipe.cmd("EXPIRE").arg(dst).arg(expire.as_secs()).ignore();
        pipe.query_async::<_, ()>(&mut *conn)
            .await
            .map_err(|e| CacheError::store("subtraction", dst, e))?;

        debug!(dst = %dst, key1 = %key1, key2 = %key2, "stored subtraction");
        Ok(())
    }

    async fn count(&self, key: &str) -> CacheResult<i64> {
        let mut conn = self.conn.lock().await;
        let count: i64 = conn
            .zcard(key)
            .await
            .map_err(|e| CacheError::store("count", key, e))?;
        Ok(count)
    }
}
