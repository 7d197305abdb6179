//! Previous-sample cache for delta and rate counters.
//!
//! Each run is a short-lived process, so counter values are carried to the
//! next run through a [`SampleStore`]. Entries are scoped per entity key and
//! expire after a TTL. Concurrent runs for the same entity are not supported.

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

pub mod file;

pub use file::FileStore;

/// Default time-to-live of cached counter values.
pub const DEFAULT_TTL: Duration = Duration::hours(1);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterState {
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

/// Raw key -> last observed counter value for one entity.
pub type CounterStates = BTreeMap<String, CounterState>;

pub trait SampleStore {
    /// Previous counter values of `entity_key`, without expired entries.
    /// Never fails: an unreadable store is treated as empty.
    fn load(&self, entity_key: &str) -> CounterStates;

    /// Replace the counter values of `entity_key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Store`] if the values could not be persisted.
    fn store(&self, entity_key: &str, counters: &CounterStates) -> Result<()>;
}

/// Drop entries observed more than `ttl` before `now`.
#[must_use]
pub fn retain_fresh(counters: CounterStates, ttl: Duration, now: DateTime<Utc>) -> CounterStates {
    counters
        .into_iter()
        .filter(|(_, state)| now - state.observed_at <= ttl)
        .collect()
}

/// In-process store, used by tests and embedders that keep their own state.
#[derive(Debug)]
pub struct MemoryStore {
    ttl: Duration,
    entities: Mutex<HashMap<String, CounterStates>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entities: Mutex::new(HashMap::new()),
        }
    }
}

impl SampleStore for MemoryStore {
    fn load(&self, entity_key: &str) -> CounterStates {
        let guard = match self.entities.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .get(entity_key)
            .cloned()
            .map(|c| retain_fresh(c, self.ttl, Utc::now()))
            .unwrap_or_default()
    }

    fn store(&self, entity_key: &str, counters: &CounterStates) -> Result<()> {
        let mut guard = match self.entities.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(entity_key.to_string(), counters.clone());
        Ok(())
    }
}
