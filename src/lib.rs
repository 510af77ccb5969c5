//! Composable cached sorted-set algebra over Redis
//!
//! Client code defines primitive sets (arbitrary, possibly expensive data
//! sources producing ranked ID lists) and combines them through algebraic
//! operators — intersection, union, subtraction, alias — whose results are
//! themselves cacheable, composable sets.
//!
//! # Architecture
//!
//! ```text
//! compose(set, store) / IntersectionSet::new(..) / UnionSet::new(..)
//!      ↓
//! Arc<dyn ComposedSet>  — key / update / available / warmup / ids / count
//!      ↓
//! availability state machine (per call: Missing | Stale | Fresh)
//!      ↓
//! Store (Redis sorted sets):
//!   ZADD+EXPIRE  ZRANGE  ZINTERSTORE  ZUNIONSTORE  PTTL  ZCARD
//! ```
//!
//! A materialization is Fresh while its remaining TTL stays at or above the
//! set's `not_available_ttl` margin. `warmup` recomputes below that margin,
//! so refresh happens before the entry actually expires; the read paths only
//! recompute on a true existence miss.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use rankcache::{
//!     compose, Aggregate, IdWithScore, IntersectionSet, Pagination, RedisStore, Set, SharedStore,
//! };
//!
//! struct RegionSet {
//!     region: String,
//! }
//!
//! #[async_trait]
//! impl Set for RegionSet {
//!     fn kind(&self) -> &'static str {
//!         "region"
//!     }
//!
//!     fn key_suffix(&self) -> String {
//!         self.region.clone()
//!     }
//!
//!     async fn fetch(&self) -> anyhow::Result<Vec<IdWithScore>> {
//!         // Query a database, call a model, anything ranked.
//!         Ok(vec![
//!             IdWithScore::new("item1", 1.0),
//!             IdWithScore::new("item2", 2.0),
//!         ])
//!     }
//!
//!     fn cache_time(&self) -> Duration {
//!         Duration::from_secs(100)
//!     }
//!
//!     fn not_available_ttl(&self) -> Duration {
//!         Duration::from_secs(10)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store: SharedStore = Arc::new(RedisStore::connect("redis://127.0.0.1:6379").await?);
//!
//!     let tokyo = compose(RegionSet { region: "tokyo".into() }, store.clone());
//!     let osaka = compose(RegionSet { region: "osaka".into() }, store.clone());
//!
//!     let both = IntersectionSet::new(
//!         store,
//!         Duration::from_secs(100),
//!         Duration::from_secs(10),
//!         vec![1.0, 1.0],
//!         Aggregate::Sum,
//!         vec![tokyo, osaka],
//!     );
//!
//!     let ids = both.ids(Pagination::default()).await?;
//!     println!("{ids:?}");
//!     Ok(())
//! }
//! ```

mod compose;
mod error;
mod metrics;
mod operators;
mod pagination;
mod redis_store;
mod set;
mod store;

pub use compose::{compose, ComposedSet};
pub use error::{CacheError, CacheResult};
pub use metrics::CacheMetrics;
pub use operators::{AliasSet, IntersectionSet, SubtractionSet, UnionSet};
pub use pagination::Pagination;
pub use redis_store::{RedisStore, SharedConnectionManager};
pub use set::{Id, IdWithScore, Set};
pub use store::{Aggregate, Order, SharedStore, Store};
