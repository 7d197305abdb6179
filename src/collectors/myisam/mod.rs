use crate::collectors::{Collector, RawRows, util};
use anyhow::Result;
use futures::future::BoxFuture;
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use tracing::instrument;

const KEY_CACHE_QUERY: &str = "SHOW GLOBAL STATUS LIKE 'Key\\_%'";

/// `MyISAM` key cache counters.
#[derive(Clone, Default)]
pub struct MyisamCollector;

impl MyisamCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Collector for MyisamCollector {
    fn name(&self) -> &'static str {
        "myisam"
    }

    #[instrument(skip(self, pool), level = "info", err, fields(collector = "myisam", otel.kind = "internal"))]
    fn collect<'a>(&'a self, pool: &'a MySqlPool) -> BoxFuture<'a, Result<RawRows>> {
        Box::pin(async move {
            let metrics = util::name_value_rows(&util::query_rows(pool, KEY_CACHE_QUERY).await?);

            Ok(RawRows {
                inventory: BTreeMap::new(),
                metrics,
            })
        })
    }
}
