//! Cache metrics for observability

use prometheus::{CounterVec, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<CacheMetricsInner> = OnceLock::new();

struct CacheMetricsInner {
    hits: CounterVec,
    misses: CounterVec,
    refreshes: CounterVec,
    errors: CounterVec,
}

impl CacheMetricsInner {
    fn new() -> Self {
        Self {
            hits: CounterVec::new(
                Opts::new("rankcache_hits_total", "Reads served from an existing materialization"),
                &["kind"],
            )
            .expect("valid metric definition"),
            misses: CounterVec::new(
                Opts::new("rankcache_misses_total", "Reads that found no materialization"),
                &["kind"],
            )
            .expect("valid metric definition"),
            refreshes: CounterVec::new(
                Opts::new("rankcache_refreshes_total", "Materializations recomputed"),
                &["kind"],
            )
            .expect("valid metric definition"),
            errors: CounterVec::new(
                Opts::new("rankcache_errors_total", "Failed cache operations"),
                &["kind", "operation"],
            )
            .expect("valid metric definition"),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.hits.clone()))?;
        registry.register(Box::new(self.misses.clone()))?;
        registry.register(Box::new(self.refreshes.clone()))?;
        registry.register(Box::new(self.errors.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static CacheMetricsInner {
    METRICS.get_or_init(CacheMetricsInner::new)
}

/// Extract the set kind from a cache key for metrics labeling.
/// Primitive keys are `{kind}:{suffix}`; operator keys start with their
/// first child's key.
fn extract_kind(key: &str) -> &str {
    match key.split_once(':') {
        Some((kind, _)) => kind,
        None => "unknown",
    }
}

/// Cache metrics wrapper
#[derive(Clone, Default)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Register metrics with a Prometheus registry
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        get_metrics().register(registry)
    }

    pub fn record_hit(&self, key: &str) {
        get_metrics()
            .hits
            .with_label_values(&[extract_kind(key)])
            .inc();
    }

    pub fn record_miss(&self, key: &str) {
        get_metrics()
            .misses
            .with_label_values(&[extract_kind(key)])
            .inc();
    }

    pub fn record_refresh(&self, key: &str) {
        get_metrics()
            .refreshes
            .with_label_values(&[extract_kind(key)])
            .inc();
    }

    pub fn record_error(&self, key: &str, operation: &str) {
        get_metrics()
            .errors
            .with_label_values(&[extract_kind(key), operation])
            .inc();
    }
}
