use crate::collectors::{Collector, RawRows, util};
use anyhow::Result;
use futures::future::BoxFuture;
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

const STATUS_QUERY: &str = "SHOW GLOBAL STATUS WHERE Variable_name NOT LIKE 'Innodb\\_%' AND Variable_name NOT LIKE 'Key\\_%'";
const VARIABLES_QUERY: &str = "SHOW GLOBAL VARIABLES";

/// Server variables that also feed metrics or metric-set attributes.
pub const METRIC_VARIABLES: &[&str] = &[
    "max_connections",
    "read_only",
    "have_ssl",
    "performance_schema",
    "innodb_buffer_pool_size",
    "key_buffer_size",
    "key_cache_block_size",
    "query_cache_size",
    "version",
    "version_comment",
];

/// Global status counters and server variables. Always runs.
#[derive(Clone, Default)]
pub struct StatusCollector;

impl StatusCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Split query results into inventory (all variables) and metric rows
/// (status plus the metric-relevant variables).
#[must_use]
pub fn split_rows(
    status: BTreeMap<String, String>,
    variables: BTreeMap<String, String>,
) -> RawRows {
    let mut metrics = status;

    for name in METRIC_VARIABLES {
        if let Some(value) = variables.get(*name) {
            metrics
                .entry((*name).to_string())
                .or_insert_with(|| value.clone());
        }
    }

    RawRows {
        inventory: variables,
        metrics,
    }
}

impl Collector for StatusCollector {
    fn name(&self) -> &'static str {
        "status"
    }

    #[instrument(skip(self, pool), level = "info", err, fields(collector = "status", otel.kind = "internal"))]
    fn collect<'a>(&'a self, pool: &'a MySqlPool) -> BoxFuture<'a, Result<RawRows>> {
        Box::pin(async move {
            let status = util::name_value_rows(&util::query_rows(pool, STATUS_QUERY).await?);
            let variables = util::name_value_rows(&util::query_rows(pool, VARIABLES_QUERY).await?);

            debug!(
                status = status.len(),
                variables = variables.len(),
                "fetched global status and variables"
            );

            Ok(split_rows(status, variables))
        })
    }

    fn enabled_by_default(&self) -> bool {
        true
    }

    fn required(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_status_collector_name() {
        let collector = StatusCollector::new();
        assert_eq!(collector.name(), "status");
        assert!(collector.required());
        assert!(collector.enabled_by_default());
    }

    #[test]
    fn test_split_rows_copies_metric_variables() {
        let rows = split_rows(
            map(&[("Queries", "1000"), ("Threads_connected", "4")]),
            map(&[
                ("max_connections", "151"),
                ("version", "10.11.6-MariaDB"),
                ("datadir", "/var/lib/mysql/"),
            ]),
        );

        assert_eq!(rows.metrics.get("Queries").map(String::as_str), Some("1000"));
        assert_eq!(rows.metrics.get("max_connections").map(String::as_str), Some("151"));
        assert_eq!(rows.metrics.get("version").map(String::as_str), Some("10.11.6-MariaDB"));
        assert!(!rows.metrics.contains_key("datadir"));

        assert_eq!(rows.inventory.len(), 3);
        assert_eq!(rows.inventory.get("datadir").map(String::as_str), Some("/var/lib/mysql/"));
    }

    #[test]
    fn test_split_rows_status_wins_over_variable() {
        let rows = split_rows(map(&[("read_only", "status")]), map(&[("read_only", "ON")]));
        assert_eq!(rows.metrics.get("read_only").map(String::as_str), Some("status"));
        assert_eq!(rows.inventory.get("read_only").map(String::as_str), Some("ON"));
    }

    #[test]
    fn test_split_rows_empty() {
        assert_eq!(split_rows(BTreeMap::new(), BTreeMap::new()), RawRows::default());
    }

    #[test]
    fn test_status_query_excludes_engine_groups() {
        assert!(STATUS_QUERY.contains("NOT LIKE 'Innodb\\_%'"));
        assert!(STATUS_QUERY.contains("NOT LIKE 'Key\\_%'"));
    }
}
