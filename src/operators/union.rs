//! Weighted union

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::compose::{fresh, Composed, ComposedSet, Materialize};
use crate::error::CacheResult;
use crate::store::{Aggregate, SharedStore};

/// Union of two or more composed sets.
///
/// Members shared between children get their weighted scores combined per
/// the aggregate; members unique to one child keep that child's weighted
/// score. The key joins child keys with `|`, order-sensitively.
pub struct UnionSet {
    store: SharedStore,
    sets: Vec<Arc<dyn ComposedSet>>,
    cache_time: Duration,
    not_available_ttl: Duration,
    weights: Vec<f64>,
    aggregate: Aggregate,
}

impl UnionSet {
    pub fn new(
        store: SharedStore,
        cache_time: Duration,
        not_available_ttl: Duration,
        weights: Vec<f64>,
        aggregate: Aggregate,
        sets: Vec<Arc<dyn ComposedSet>>,
    ) -> Arc<dyn ComposedSet> {
        debug_assert!(sets.len() >= 2);
        debug_assert_eq!(weights.len(), sets.len());
        Arc::new(Composed::new(
            Self {
                store: store.clone(),
                sets,
                cache_time,
                not_available_ttl,
                weights,
                aggregate,
            },
            store,
        ))
    }
}

#[async_trait]
impl Materialize for UnionSet {
    fn key(&self) -> String {
        self.sets
            .iter()
            .map(|s| s.key())
            .collect::<Vec<_>>()
            .join("|")
    }

    fn cache_time(&self) -> Duration {
        self.cache_time
    }

    fn not_available_ttl(&self) -> Duration {
        self.not_available_ttl
    }

    async fn update(&self) -> CacheResult<()> {
        for set in &self.sets {
            set.warmup().await?;
        }
        let keys: Vec<String> = self.sets.iter().map(|s| s.key()).collect();
        self.store
            .unionstore(
                &self.key(),
                self.cache_time,
                &self.weights,
                self.aggregate,
                &keys,
            )
            .await
    }

    async fn available(&self) -> CacheResult<bool> {
        fresh(self.store.as_ref(), &self.key(), self.not_available_ttl).await
    }
}
