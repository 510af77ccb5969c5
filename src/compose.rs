//! Composition layer: availability state machine and the uniform facade
//!
//! Every set — primitive or operator — is wrapped in [`Composed`], which
//! layers warmup and ranged reads on top of a [`Materialize`] core. The
//! state of a cache key is never stored; it is observed per call:
//!
//! - Missing: the key does not exist
//! - Stale: it exists, but remaining TTL is below `not_available_ttl`
//! - Fresh: it exists with TTL at or above the margin
//!
//! `warmup` recomputes on Missing or Stale. The read paths check bare
//! existence only: a stale-but-present entry is served as-is, and the TTL
//! margin leaves room for out-of-band refresh before the entry disappears.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::metrics::CacheMetrics;
use crate::pagination::Pagination;
use crate::set::{Id, IdWithScore, Set};
use crate::store::{SharedStore, Store};

/// Uniform public surface of any composed set.
///
/// Children of operator sets are held as `Arc<dyn ComposedSet>`: shared
/// between trees, queried and warmed but never mutated.
#[async_trait]
pub trait ComposedSet: Send + Sync {
    /// Cache key of this set's materialization. Pure: depends only on the
    /// set's identity and logical parameters, never on time or store state.
    fn key(&self) -> String;

    fn cache_time(&self) -> Duration;

    fn not_available_ttl(&self) -> Duration;

    /// Unconditionally recompute and overwrite the materialization.
    async fn update(&self) -> CacheResult<()>;

    /// Whether the current materialization is Fresh.
    async fn available(&self) -> CacheResult<bool>;

    /// Recompute unless already Fresh.
    async fn warmup(&self) -> CacheResult<()>;

    /// Identifiers in the selected range and order.
    async fn ids(&self, page: Pagination) -> CacheResult<Vec<Id>>;

    /// Identifiers with their stored scores.
    async fn ids_with_score(&self, page: Pagination) -> CacheResult<Vec<IdWithScore>>;

    /// Cardinality, warming up first.
    async fn count(&self) -> CacheResult<i64>;
}

/// Recompute core wrapped by [`Composed`]: key derivation, the unconditional
/// recompute, and the freshness observation. Primitive sources and each
/// operator implement this.
#[async_trait]
pub(crate) trait Materialize: Send + Sync {
    fn key(&self) -> String;
    fn cache_time(&self) -> Duration;
    fn not_available_ttl(&self) -> Duration;
    async fn update(&self) -> CacheResult<()>;
    async fn available(&self) -> CacheResult<bool>;
}

/// Shared freshness observation: exists, then remaining TTL against the
/// margin. A `NotFound` raced between the two round trips counts as not
/// available.
pub(crate) async fn fresh(store: &dyn Store, key: &str, margin: Duration) -> CacheResult<bool> {
    if !store.exists(key).await? {
        return Ok(false);
    }
    match store.ttl(key).await {
        Ok(remaining) => Ok(remaining >= margin),
        Err(CacheError::NotFound { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Facade adding warmup and ranged reads on top of a [`Materialize`] core.
pub(crate) struct Composed<M> {
    inner: M,
    store: SharedStore,
    metrics: CacheMetrics,
}

impl<M: Materialize> Composed<M> {
    pub(crate) fn new(inner: M, store: SharedStore) -> Self {
        Self {
            inner,
            store,
            metrics: CacheMetrics::new(),
        }
    }

    /// Existence check feeding the read paths; warms up on a true miss.
    async fn ensure_exists(&self, key: &str) -> CacheResult<()> {
        if self.store.exists(key).await? {
            self.metrics.record_hit(key);
            return Ok(());
        }
        self.metrics.record_miss(key);
        debug!(key = %key, "materialization missing, warming up");
        self.warmup().await
    }
}

#[async_trait]
impl<M: Materialize> ComposedSet for Composed<M> {
    fn key(&self) -> String {
        self.inner.key()
    }

    fn cache_time(&self) -> Duration {
        self.inner.cache_time()
    }

    fn not_available_ttl(&self) -> Duration {
        self.inner.not_available_ttl()
    }

    async fn update(&self) -> CacheResult<()> {
        let key = self.inner.key();
        match self.inner.update().await {
            Ok(()) => {
                self.metrics.record_refresh(&key);
                debug!(key = %key, "materialization updated");
                Ok(())
            }
            Err(e) => {
                self.metrics.record_error(&key, "update");
                warn!(key = %key, error = %e, "update failed");
                Err(e)
            }
        }
    }

    async fn available(&self) -> CacheResult<bool> {
        self.inner.available().await
    }

    async fn warmup(&self) -> CacheResult<()> {
        if self.available().await? {
            return Ok(());
        }
        self.update().await
    }

    async fn ids(&self, page: Pagination) -> CacheResult<Vec<Id>> {
        let key = self.inner.key();
        self.ensure_exists(&key).await?;
        self.store.ids(&key, page.head, page.tail, page.order).await
    }

    async fn ids_with_score(&self, page: Pagination) -> CacheResult<Vec<IdWithScore>> {
        let key = self.inner.key();
        self.ensure_exists(&key).await?;
        self.store
            .ids_with_score(&key, page.head, page.tail, page.order)
            .await
    }

    async fn count(&self) -> CacheResult<i64> {
        self.warmup().await?;
        self.store.count(&self.inner.key()).await
    }
}

/// Primitive-source core: key from the set's type tag and suffix, update by
/// fetching the source and saving the result.
struct CachedSource<S> {
    set: S,
    store: SharedStore,
}

#[async_trait]
impl<S: Set> Materialize for CachedSource<S> {
    fn key(&self) -> String {
        format!("{}:{}", self.set.kind(), self.set.key_suffix())
    }

    fn cache_time(&self) -> Duration {
        self.set.cache_time()
    }

    fn not_available_ttl(&self) -> Duration {
        self.set.not_available_ttl()
    }

    async fn update(&self) -> CacheResult<()> {
        let key = self.key();
        let rows = self
            .set
            .fetch()
            .await
            .map_err(|source| CacheError::Source {
                key: key.clone(),
                source,
            })?;
        debug!(key = %key, members = rows.len(), "fetched source set");
        self.store.save(&key, &rows, self.set.cache_time()).await
    }

    async fn available(&self) -> CacheResult<bool> {
        fresh(self.store.as_ref(), &self.key(), self.set.not_available_ttl()).await
    }
}

/// Wrap a primitive [`Set`] into the uniform composed surface.
pub fn compose<S: Set + 'static>(set: S, store: SharedStore) -> Arc<dyn ComposedSet> {
    debug_assert!(set.not_available_ttl() < set.cache_time());
    Arc::new(Composed::new(
        CachedSource {
            set,
            store: store.clone(),
        },
        store,
    ))
}
