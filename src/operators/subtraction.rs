//! Set subtraction (experimental)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::compose::{fresh, Composed, ComposedSet, Materialize};
use crate::error::CacheResult;
use crate::store::SharedStore;

/// `set1 − set2`, computed as a store-side union with weights (1,1) and Sum
/// aggregation, then dropping every member whose combined score is negative.
///
/// Experimental: one store round trip heavier than the other operators, and
/// correct only under a caller-owned precondition — `set2`'s scores must be
/// negative values whose magnitude exceeds any score in `set1`, so that
/// membership in `set2` reliably pushes the combined score below zero.
pub struct SubtractionSet {
    store: SharedStore,
    set1: Arc<dyn ComposedSet>,
    set2: Arc<dyn ComposedSet>,
    cache_time: Duration,
    not_available_ttl: Duration,
}

impl SubtractionSet {
    pub fn new(
        store: SharedStore,
        cache_time: Duration,
        not_available_ttl: Duration,
        set1: Arc<dyn ComposedSet>,
        set2: Arc<dyn ComposedSet>,
    ) -> Arc<dyn ComposedSet> {
        Arc::new(Composed::new(
            Self {
                store: store.clone(),
                set1,
                set2,
                cache_time,
                not_available_ttl,
            },
            store,
        ))
    }
}

#[async_trait]
impl Materialize for SubtractionSet {
    fn key(&self) -> String {
        format!("{}-{}", self.set1.key(), self.set2.key())
    }

    fn cache_time(&self) -> Duration {
        self.cache_time
    }

    fn not_available_ttl(&self) -> Duration {
        self.not_available_ttl
    }

    async fn update(&self) -> CacheResult<()> {
        self.set1.warmup().await?;
        self.set2.warmup().await?;
        self.store
            .subtraction(
                &self.key(),
                self.cache_time,
                &self.set1.key(),
                &self.set2.key(),
            )
            .await
    }

    async fn available(&self) -> CacheResult<bool> {
        fresh(self.store.as_ref(), &self.key(), self.not_available_ttl).await
    }
}
