use crate::collectors::{Collector, RawRows, util};
use anyhow::Result;
use futures::future::BoxFuture;
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

const SLAVE_STATUS: &str = "SHOW SLAVE STATUS";
const REPLICA_STATUS: &str = "SHOW REPLICA STATUS";

/// Replica-side replication state (`SHOW SLAVE STATUS`).
#[derive(Clone, Default)]
pub struct ReplicationCollector;

impl ReplicationCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Rewrite `Replica_`/`Source_` column names to their `Slave_`/`Master_` forms.
#[must_use]
pub fn legacy_column_name(name: &str) -> String {
    name.replace("Replica_", "Slave_")
        .replace("_Replica", "_Slave")
        .replace("Source_", "Master_")
        .replace("_Source", "_Master")
}

/// Build metric rows from the first replica status row, if any.
#[must_use]
pub fn replica_rows(first: Option<BTreeMap<String, String>>) -> RawRows {
    let mut metrics = BTreeMap::new();

    match first {
        Some(columns) => {
            for (name, value) in columns {
                metrics.entry(legacy_column_name(&name)).or_insert(value);
            }
            metrics.insert("node_type".to_string(), "slave".to_string());
        }
        None => {
            metrics.insert("node_type".to_string(), "master".to_string());
        }
    }

    RawRows {
        inventory: BTreeMap::new(),
        metrics,
    }
}

impl Collector for ReplicationCollector {
    fn name(&self) -> &'static str {
        "replication"
    }

    #[instrument(skip(self, pool), level = "info", err, fields(collector = "replication", otel.kind = "internal"))]
    fn collect<'a>(&'a self, pool: &'a MySqlPool) -> BoxFuture<'a, Result<RawRows>> {
        Box::pin(async move {
            let rows = match util::query_rows(pool, SLAVE_STATUS).await {
                Ok(rows) => rows,
                Err(e) => {
                    debug!(error = %e, "SHOW SLAVE STATUS failed; trying SHOW REPLICA STATUS");
                    util::query_rows(pool, REPLICA_STATUS).await?
                }
            };

            debug!(rows = rows.len(), "fetched replica status");

            Ok(replica_rows(rows.first().map(util::row_columns)))
        })
    }

    fn enabled_by_default(&self) -> bool {
        true
    }
}
