//! Cache error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// Transport or command failure talking to the backing store.
    #[error("store {op} failed for {key}: {source}")]
    Store {
        op: &'static str,
        key: String,
        #[source]
        source: redis::RedisError,
    },

    /// TTL queried for a key that does not exist.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// TTL queried for a key without a configured expiry. Keys owned by this
    /// layer always carry one, so this indicates external mutation.
    #[error("no expiry configured for key: {key}")]
    NoExpiry { key: String },

    /// The store returned a TTL outside the documented sentinel range.
    #[error("unexpected ttl value {value} for key: {key}")]
    UnexpectedTtl { key: String, value: i64 },

    /// The user-supplied source computation failed.
    #[error("source fetch failed for {key}: {source}")]
    Source {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CacheError {
    pub fn store(op: &'static str, key: impl Into<String>, source: redis::RedisError) -> Self {
        CacheError::Store {
            op,
            key: key.into(),
            source,
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
