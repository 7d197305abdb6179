use crate::collectors::{
    COLLECTOR_NAMES, Collector, CollectorType, RawData, RawRows, all_factories,
    config::CollectorConfig,
};
use crate::error::{Error, Result};
use crate::metrics::RawSample;
use chrono::Utc;
use sqlx::MySqlPool;
use tracing::{debug, info_span, instrument, warn};
use tracing_futures::Instrument as _;

/// The collectors selected for one run, in merge order.
pub struct CollectorRegistry {
    collectors: Vec<CollectorType>,
}

impl CollectorRegistry {
    /// Required collectors plus those enabled in `config`, ordered as declared.
    #[must_use]
    pub fn new(config: &CollectorConfig) -> Self {
        let factories = all_factories();

        let collectors = COLLECTOR_NAMES
            .iter()
            .filter_map(|name| factories.get(name).map(|factory| factory()))
            .filter(|collector| collector.required() || config.is_enabled(collector.name()))
            .collect();

        Self { collectors }
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(Collector::name).collect()
    }

    /// Run every collector sequentially on `pool` and merge their rows.
    ///
    /// Optional collectors that fail are logged and skipped; their keys are
    /// simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if a required collector fails.
    #[instrument(skip(self, pool), level = "info", err, fields(collectors = ?self.names()))]
    pub async fn collect_all(&self, pool: &MySqlPool) -> Result<RawData> {
        let mut merged = RawRows::default();

        for collector in &self.collectors {
            let span = info_span!("collector.collect", collector = %collector.name(), otel.kind = "internal");

            match collector.collect(pool).instrument(span).await {
                Ok(rows) => {
                    debug!(
                        collector = collector.name(),
                        inventory = rows.inventory.len(),
                        metrics = rows.metrics.len(),
                        "collected"
                    );
                    merged.merge(rows);
                }
                Err(source) if collector.required() => {
                    return Err(Error::Query {
                        collector: collector.name(),
                        source,
                    });
                }
                Err(e) => {
                    warn!(collector = collector.name(), error = %e, "collector failed; continuing without it");
                }
            }
        }

        Ok(RawData {
            inventory: merged.inventory,
            metrics: RawSample::new(merged.metrics, Utc::now()),
        })
    }
}
