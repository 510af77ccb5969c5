//! Alias over a foreign store key

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::compose::{Composed, ComposedSet, Materialize};
use crate::error::CacheResult;
use crate::store::SharedStore;

/// Wraps a store key materialized by an entirely separate process, exposing
/// it through the uniform facade. This layer does not own the key's
/// lifecycle: `update` and `warmup` are no-ops, and availability is bare
/// existence with no TTL margin.
pub struct AliasSet {
    store: SharedStore,
    key: String,
    not_available_ttl: Duration,
}

impl AliasSet {
    pub fn new(
        store: SharedStore,
        key: impl Into<String>,
        not_available_ttl: Duration,
    ) -> Arc<dyn ComposedSet> {
        Arc::new(Composed::new(
            Self {
                store: store.clone(),
                key: key.into(),
                not_available_ttl,
            },
            store,
        ))
    }
}

#[async_trait]
impl Materialize for AliasSet {
    fn key(&self) -> String {
        self.key.clone()
    }

    fn cache_time(&self) -> Duration {
        // Aliased keys expire on their owner's schedule.
        Duration::ZERO
    }

    fn not_available_ttl(&self) -> Duration {
        self.not_available_ttl
    }

    async fn update(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn available(&self) -> CacheResult<bool> {
        self.store.exists(&self.key).await
    }
}
