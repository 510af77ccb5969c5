//! Backing store contract
//!
//! The store is an external collaborator: a sorted-set key-value service
//! with atomic save/range/exists/ttl/interstore/unionstore primitives.
//! Implementations own their connections; this layer only issues commands.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;
use crate::set::{Id, IdWithScore};

/// Score combination rule when a member appears in multiple input sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
    Sum,
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::Min => write!(f, "MIN"),
            Aggregate::Max => write!(f, "MAX"),
            Aggregate::Sum => write!(f, "SUM"),
        }
    }
}

/// Result ordering by score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Sorted-set store operations required by the composition layer.
///
/// `save`, `interstore`, `unionstore`, and `subtraction` must each be atomic
/// at the store (materialize + set TTL in one observable step); concurrency
/// control beyond that is not expected.
#[async_trait]
pub trait Store: Send + Sync {
    /// Upsert each member's score under `key`, then set its expiry.
    async fn save(&self, key: &str, members: &[IdWithScore], expire: Duration) -> CacheResult<()>;

    /// Range read by score order. `tail = -1` means through the end.
    async fn ids(&self, key: &str, head: i64, tail: i64, order: Order) -> CacheResult<Vec<Id>>;

    /// Range read including scores.
    async fn ids_with_score(
        &self,
        key: &str,
        head: i64,
        tail: i64,
        order: Order,
    ) -> CacheResult<Vec<IdWithScore>>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Remaining time to live. Fails with [`CacheError::NotFound`] when the
    /// key is absent and [`CacheError::NoExpiry`] when no expiry is set.
    ///
    /// [`CacheError::NotFound`]: crate::CacheError::NotFound
    /// [`CacheError::NoExpiry`]: crate::CacheError::NoExpiry
    async fn ttl(&self, key: &str) -> CacheResult<Duration>;

    /// Store-side weighted intersection of `keys` into `dst`, expiring at
    /// `expire`. One weight per key; scores combined per `aggregate`.
    async fn interstore(
        &self,
        dst: &str,
        expire: Duration,
        weights: &[f64],
        aggregate: Aggregate,
        keys: &[String],
    ) -> CacheResult<()>;

    /// Store-side weighted union, analogous to [`interstore`](Store::interstore).
    async fn unionstore(
        &self,
        dst: &str,
        expire: Duration,
        weights: &[f64],
        aggregate: Aggregate,
        keys: &[String],
    ) -> CacheResult<()>;

    /// `key1 − key2`: union with weights (1,1) and Sum, then drop members
    /// whose combined score is negative.
    async fn subtraction(
        &self,
        dst: &str,
        expire: Duration,
        key1: &str,
        key2: &str,
    ) -> CacheResult<()>;

    /// Cardinality of the set at `key`.
    async fn count(&self, key: &str) -> CacheResult<i64>;
}

/// Stores are injected at construction and shared across composed sets.
pub type SharedStore = Arc<dyn Store>;
