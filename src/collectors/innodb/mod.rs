use crate::collectors::{Collector, RawRows, util};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use sqlx::{MySqlPool, Row};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

pub mod status;

const STATUS_QUERY: &str = "SHOW GLOBAL STATUS LIKE 'Innodb\\_%'";
const ENGINE_STATUS_QUERY: &str = "SHOW ENGINE INNODB STATUS";

/// `InnoDB` status counters plus values parsed from the engine status report
/// (LSN and checkpoint age, active transactions, semaphore waits, adaptive
/// hash index searches).
///
/// The engine status report needs the `PROCESS` privilege; without it only the
/// status counters are returned.
#[derive(Clone, Default)]
pub struct InnodbCollector;

impl InnodbCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    async fn engine_status(pool: &MySqlPool) -> Result<BTreeMap<String, String>> {
        let rows = util::query_rows(pool, ENGINE_STATUS_QUERY).await?;

        let Some(row) = rows.first() else {
            return Ok(BTreeMap::new());
        };

        // Columns are Type, Name, Status
        let text: String = row
            .try_get("Status")
            .or_else(|_| row.try_get(2))
            .context("failed to get Status column from SHOW ENGINE INNODB STATUS")?;

        Ok(status::parse(&text))
    }
}

impl Collector for InnodbCollector {
    fn name(&self) -> &'static str {
        "innodb"
    }

    #[instrument(skip(self, pool), level = "info", err, fields(collector = "innodb", otel.kind = "internal"))]
    fn collect<'a>(&'a self, pool: &'a MySqlPool) -> BoxFuture<'a, Result<RawRows>> {
        Box::pin(async move {
            let mut metrics = util::name_value_rows(&util::query_rows(pool, STATUS_QUERY).await?);

            match Self::engine_status(pool).await {
                Ok(parsed) => {
                    debug!(parsed = parsed.len(), "parsed engine status");
                    for (key, value) in parsed {
                        metrics.entry(key).or_insert(value);
                    }
                }
                Err(e) => warn!(error = %e, "engine status unavailable; using status counters only"),
            }

            Ok(RawRows {
                inventory: BTreeMap::new(),
                metrics,
            })
        })
    }
}
