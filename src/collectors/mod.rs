use crate::metrics::RawSample;
use anyhow::Result;
use futures::future::BoxFuture;
use sqlx::MySqlPool;
use std::collections::{BTreeMap, HashMap};

#[macro_use]
mod register_macro;

/// Raw rows returned by one collector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRows {
    /// Configuration variables, published as inventory items.
    pub inventory: BTreeMap<String, String>,
    /// Status counters, gauges and metric-relevant variables.
    pub metrics: BTreeMap<String, String>,
}

impl RawRows {
    /// Merge `other` into `self`; keys already present are kept.
    pub fn merge(&mut self, other: Self) {
        for (key, value) in other.inventory {
            self.inventory.entry(key).or_insert(value);
        }
        for (key, value) in other.metrics {
            self.metrics.entry(key).or_insert(value);
        }
    }
}

/// Everything extracted from the server in one run.
#[derive(Clone, Debug, PartialEq)]
pub struct RawData {
    pub inventory: BTreeMap<String, String>,
    pub metrics: RawSample,
}

pub trait Collector {
    fn name(&self) -> &'static str;

    /// Run the collector's queries and return its raw rows.
    ///
    /// # Errors
    ///
    /// Returns an error if a query the collector cannot do without fails.
    fn collect<'a>(&'a self, pool: &'a MySqlPool) -> BoxFuture<'a, Result<RawRows>>;

    fn enabled_by_default(&self) -> bool {
        false
    }

    /// A required collector always runs and its failure aborts the run.
    fn required(&self) -> bool {
        false
    }
}

pub mod util;

register_collectors! {
    status => StatusCollector,
    replication => ReplicationCollector,
    innodb => InnodbCollector,
    myisam => MyisamCollector,
}

pub mod config;
pub mod registry;
