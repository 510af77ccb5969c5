//! Shared test doubles: an in-memory sorted-set store driven by a manual
//! clock, and a store whose every call fails like an unreachable server.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rankcache::{Aggregate, CacheError, CacheResult, Id, IdWithScore, Order, Store};

#[derive(Clone)]
struct Entry {
    members: HashMap<String, f64>,
    /// Virtual-clock deadline in ms; `None` models a key without expiry.
    expires_at: Option<u64>,
}

#[derive(Default)]
struct State {
    now_ms: u64,
    entries: HashMap<String, Entry>,
    saves: HashMap<String, usize>,
}

impl State {
    fn live(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key).filter(|e| match e.expires_at {
            Some(deadline) => deadline > self.now_ms,
            None => true,
        })
    }

    fn sorted(&self, key: &str, order: Order) -> Vec<(String, f64)> {
        let mut rows: Vec<(String, f64)> = self
            .live(key)
            .map(|e| e.members.iter().map(|(id, s)| (id.clone(), *s)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .expect("comparable scores")
                .then_with(|| a.0.cmp(&b.0))
        });
        if order == Order::Descending {
            rows.reverse();
        }
        rows
    }

    fn store_result(&mut self, dst: &str, members: HashMap<String, f64>, expire: Duration) {
        if members.is_empty() {
            self.entries.remove(dst);
            return;
        }
        let expires_at = Some(self.now_ms + expire.as_millis() as u64);
        self.entries
            .insert(dst.to_string(), Entry { members, expires_at });
    }

    fn combine(
        &mut self,
        dst: &str,
        expire: Duration,
        weights: &[f64],
        aggregate: Aggregate,
        keys: &[String],
        require_all: bool,
    ) -> CacheResult<()> {
        if weights.len() != keys.len() {
            return Err(command_error(
                "zstore",
                dst,
                "WEIGHTS count must match number of keys",
            ));
        }

        let sources: Vec<HashMap<String, f64>> = keys
            .iter()
            .map(|k| {
                self.live(k)
                    .map(|e| e.members.clone())
                    .unwrap_or_default()
            })
            .collect();

        let candidates: BTreeSet<String> = sources
            .iter()
            .flat_map(|src| src.keys().cloned())
            .collect();

        let mut result = HashMap::new();
        for member in candidates {
            let contributions: Vec<f64> = sources
                .iter()
                .zip(weights)
                .filter_map(|(src, w)| src.get(&member).map(|s| s * w))
                .collect();
            if contributions.is_empty() || (require_all && contributions.len() != sources.len()) {
                continue;
            }
            let score = match aggregate {
                Aggregate::Sum => contributions.iter().sum(),
                Aggregate::Min => contributions.iter().cloned().fold(f64::INFINITY, f64::min),
                Aggregate::Max => contributions
                    .iter()
                    .cloned()
                    .fold(f64::NEG_INFINITY, f64::max),
            };
            result.insert(member, score);
        }

        self.store_result(dst, result, expire);
        Ok(())
    }
}

fn command_error(op: &'static str, key: &str, message: &'static str) -> CacheError {
    CacheError::store(
        op,
        key,
        redis::RedisError::from((redis::ErrorKind::ResponseError, message)),
    )
}

fn slice_range(rows: Vec<(String, f64)>, head: i64, tail: i64) -> Vec<(String, f64)> {
    let len = rows.len() as i64;
    let mut start = if head < 0 { len + head } else { head };
    let mut stop = if tail < 0 { len + tail } else { tail };
    if start < 0 {
        start = 0;
    }
    if stop >= len {
        stop = len - 1;
    }
    if len == 0 || start > stop || start >= len || stop < 0 {
        return Vec::new();
    }
    rows[start as usize..=stop as usize].to_vec()
}

/// In-memory [`Store`] with manually advanced time, so staleness tests are
/// deterministic without sleeping.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.state.lock().unwrap().now_ms += by.as_millis() as u64;
    }

    /// Number of `save` calls observed for `key`.
    pub fn save_count(&self, key: &str) -> usize {
        *self.state.lock().unwrap().saves.get(key).unwrap_or(&0)
    }

    /// Plant a key with no expiry, as an external writer outside this
    /// layer's contract would.
    pub fn seed_without_expiry(&self, key: &str, members: &[IdWithScore]) {
        let mut state = self.state.lock().unwrap();
        let members = members
            .iter()
            .map(|m| (m.id.as_str().to_string(), m.score))
            .collect();
        state.entries.insert(
            key.to_string(),
            Entry {
                members,
                expires_at: None,
            },
        );
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save(&self, key: &str, members: &[IdWithScore], expire: Duration) -> CacheResult<()> {
        let mut state = self.state.lock().unwrap();
        *state.saves.entry(key.to_string()).or_insert(0) += 1;

        let mut merged = state
            .live(key)
            .map(|e| e.members.clone())
            .unwrap_or_default();
        for m in members {
            merged.insert(m.id.as_str().to_string(), m.score);
        }
        state.store_result(key, merged, expire);
        Ok(())
    }

    async fn ids(&self, key: &str, head: i64, tail: i64, order: Order) -> CacheResult<Vec<Id>> {
        let state = self.state.lock().unwrap();
        Ok(slice_range(state.sorted(key, order), head, tail)
            .into_iter()
            .map(|(id, _)| Id::from(id))
            .collect())
    }

    async fn ids_with_score(
        &self,
        key: &str,
        head: i64,
        tail: i64,
        order: Order,
    ) -> CacheResult<Vec<IdWithScore>> {
        let state = self.state.lock().unwrap();
        Ok(slice_range(state.sorted(key, order), head, tail)
            .into_iter()
            .map(|(id, score)| IdWithScore::new(id, score))
            .collect())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.state.lock().unwrap().live(key).is_some())
    }

    async fn ttl(&self, key: &str) -> CacheResult<Duration> {
        let state = self.state.lock().unwrap();
        match state.live(key) {
            None => Err(CacheError::NotFound {
                key: key.to_string(),
            }),
            Some(entry) => match entry.expires_at {
                None => Err(CacheError::NoExpiry {
                    key: key.to_string(),
                }),
                Some(deadline) => Ok(Duration::from_millis(deadline - state.now_ms)),
            },
        }
    }

    async fn interstore(
        &self,
        dst: &str,
        expire: Duration,
        weights: &[f64],
        aggregate: Aggregate,
        keys: &[String],
    ) -> CacheResult<()> {
        self.state
            .lock()
            .unwrap()
            .combine(dst, expire, weights, aggregate, keys, true)
    }

    async fn unionstore(
        &self,
        dst: &str,
        expire: Duration,
        weights: &[f64],
        aggregate: Aggregate,
        keys: &[String],
    ) -> CacheResult<()> {
        self.state
            .lock()
            .unwrap()
            .combine(dst, expire, weights, aggregate, keys, false)
    }

    async fn subtraction(
        &self,
        dst: &str,
        expire: Duration,
        key1: &str,
        key2: &str,
    ) -> CacheResult<()> {
        let mut state = self.state.lock().unwrap();
        let keys = vec![key1.to_string(), key2.to_string()];
        state.combine(dst, expire, &[1.0, 1.0], Aggregate::Sum, &keys, false)?;
        let emptied = match state.entries.get_mut(dst) {
            Some(entry) => {
                entry.members.retain(|_, score| *score >= 0.0);
                entry.members.is_empty()
            }
            None => false,
        };
        if emptied {
            state.entries.remove(dst);
        }
        Ok(())
    }

    async fn count(&self, key: &str) -> CacheResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.live(key).map(|e| e.members.len()).unwrap_or(0) as i64)
    }
}

/// Every call fails the way an unreachable Redis would.
pub struct FailingStore;

fn connection_refused(op: &'static str, key: &str) -> CacheError {
    CacheError::store(
        op,
        key,
        redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")),
    )
}

#[async_trait]
impl Store for FailingStore {
    async fn save(&self, key: &str, _: &[IdWithScore], _: Duration) -> CacheResult<()> {
        Err(connection_refused("save", key))
    }

    async fn ids(&self, key: &str, _: i64, _: i64, _: Order) -> CacheResult<Vec<Id>> {
        Err(connection_refused("range", key))
    }

    async fn ids_with_score(
        &self,
        key: &str,
        _: i64,
        _: i64,
        _: Order,
    ) -> CacheResult<Vec<IdWithScore>> {
        Err(connection_refused("range", key))
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Err(connection_refused("exists", key))
    }

    async fn ttl(&self, key: &str) -> CacheResult<Duration> {
        Err(connection_refused("pttl", key))
    }

    async fn interstore(
        &self,
        dst: &str,
        _: Duration,
        _: &[f64],
        _: Aggregate,
        _: &[String],
    ) -> CacheResult<()> {
        Err(connection_refused("interstore", dst))
    }

    async fn unionstore(
        &self,
        dst: &str,
        _: Duration,
        _: &[f64],
        _: Aggregate,
        _: &[String],
    ) -> CacheResult<()> {
        Err(connection_refused("unionstore", dst))
    }

    async fn subtraction(&self, dst: &str, _: Duration, _: &str, _: &str) -> CacheResult<()> {
        Err(connection_refused("subtraction", dst))
    }

    async fn count(&self, key: &str) -> CacheResult<i64> {
        Err(connection_refused("count", key))
    }
}
