//! Primitive set contract
//!
//! A [`Set`] is a user-supplied source of ranked members: anything that can
//! produce a list of `(id, score)` pairs, from a database query to a
//! recommendation model. Sets declare how long their materialization stays
//! usable; the composition layer handles everything else.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque member identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id(s.to_string())
    }
}

/// A ranked member: the score is the sort key in the backing sorted set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdWithScore {
    pub id: Id,
    pub score: f64,
}

impl IdWithScore {
    pub fn new(id: impl Into<Id>, score: f64) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

/// User-supplied ranked data source.
#[async_trait]
pub trait Set: Send + Sync {
    /// Stable type tag, used as the cache key prefix. Must be unique per
    /// concrete set kind and must never change across releases, or cached
    /// materializations are orphaned.
    fn kind(&self) -> &'static str;

    /// Logical parameters of this instance, appended to the key prefix.
    /// Two instances describing the same logical set must return the same
    /// suffix; different logical sets must differ.
    fn key_suffix(&self) -> String;

    /// Compute the ranked members. Possibly expensive; only called when the
    /// cached materialization is missing or stale.
    async fn fetch(&self) -> anyhow::Result<Vec<IdWithScore>>;

    /// Cache lifetime for a fresh materialization.
    fn cache_time(&self) -> Duration;

    /// Remaining-TTL margin below which the materialization is treated as
    /// stale and proactively refreshed. Must be smaller than
    /// [`cache_time`](Set::cache_time).
    fn not_available_ttl(&self) -> Duration;
}
