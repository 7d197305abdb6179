//! One sampling run: connect, extract, build the entity, publish.

use crate::cache::{FileStore, SampleStore};
use crate::collectors::{RawData, config::CollectorConfig, registry::CollectorRegistry};
use crate::connection::{self, ConnectionDescriptor};
use crate::error::Result;
use crate::metrics::{GroupSelection, MetricRegistry, ResetPolicy, normalize};
use chrono::Duration;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

pub mod builder;
pub mod entity;
pub mod payload;

pub use entity::Entity;
pub use payload::{EntityData, Integration, Inventory, MetricSet};

#[derive(Clone, Debug)]
pub struct Settings {
    pub connection: ConnectionDescriptor,
    pub remote_monitoring: bool,
    pub collectors: CollectorConfig,
    pub groups: GroupSelection,
    pub inventory: bool,
    pub metrics: bool,
    /// Cache file; `None` selects [`FileStore::default_path`] for the entity.
    pub cache_path: Option<PathBuf>,
    pub cache_ttl: Duration,
    pub reset_policy: ResetPolicy,
    pub pretty: bool,
}

impl Settings {
    #[must_use]
    pub fn entity(&self) -> Entity {
        Entity::new(
            self.remote_monitoring,
            &self.connection.host,
            self.connection.port,
        )
    }

    #[must_use]
    pub fn file_store(&self, entity: &Entity) -> FileStore {
        let path = self
            .cache_path
            .clone()
            .unwrap_or_else(|| FileStore::default_path(&entity.key()));
        FileStore::new(path, self.cache_ttl)
    }

    fn metric_set_attributes(&self, entity: &Entity) -> Vec<(&'static str, String)> {
        let mut attributes = vec![
            ("hostname", self.connection.host.clone()),
            ("port", self.connection.port.to_string()),
        ];
        if entity.is_remote() {
            attributes.push((
                "entityName",
                format!("{}:{}", payload::NODE_ENTITY_TYPE, entity.key()),
            ));
            attributes.push(("displayName", entity.key()));
        }
        attributes
    }
}

/// Build the document for `entity` from already extracted data.
///
/// Loads the previous counters from `store`, normalizes, and stores the new
/// counters. A failing store is logged and does not affect the document.
pub fn assemble(
    settings: &Settings,
    entity: &Entity,
    raw: RawData,
    store: &dyn SampleStore,
) -> Integration {
    let mut data = EntityData::new(entity.metadata());

    if settings.inventory {
        builder::populate_inventory(&mut data.inventory, &raw.inventory);
        debug!(items = data.inventory.len(), "inventory populated");
    }

    if settings.metrics {
        let key = entity.key();
        let registry = MetricRegistry::global();
        let previous = store.load(&key);

        let normalized = normalize(
            &raw.metrics,
            registry,
            settings.groups,
            &previous,
            raw.metrics.observed_at(),
            settings.reset_policy,
        );

        let attributes = settings.metric_set_attributes(entity);
        let mut metric_set = MetricSet::new(payload::EVENT_TYPE, &attributes);
        builder::populate_attributes(&mut metric_set, &raw.metrics, registry, settings.groups);
        builder::populate_metrics(&mut metric_set, &normalized.metrics);

        debug!(
            metrics = normalized.metrics.len(),
            counters = normalized.counters.len(),
            previous = previous.len(),
            "metrics normalized"
        );

        if let Err(e) = store.store(&key, &normalized.counters) {
            warn!(error = %e, entity = %key, "could not store counters; next run starts over");
        }

        data.metrics.push(metric_set);
    }

    let mut integration = Integration::new();
    integration.add_entity(data);
    integration
}

/// Connect, extract and assemble, without publishing.
///
/// # Errors
///
/// Returns [`crate::error::Error::Connection`] or [`crate::error::Error::Query`].
#[instrument(skip(settings), level = "info", err, fields(endpoint = %settings.connection.endpoint()))]
pub async fn sample(settings: &Settings) -> Result<Integration> {
    let entity = settings.entity();
    let collectors = CollectorRegistry::new(&settings.collectors);

    info!(entity = %entity.key(), collectors = ?collectors.names(), "sampling");

    let raw = connection::scoped(&settings.connection, |pool| async move {
        collectors.collect_all(&pool).await
    })
    .await?;

    debug!(
        inventory = raw.inventory.len(),
        metrics = raw.metrics.len(),
        "extracted raw data"
    );

    let store = settings.file_store(&entity);

    Ok(assemble(settings, &entity, raw, &store))
}

/// Sample once and publish the document to stdout.
///
/// # Errors
///
/// Returns an error if connecting, the required collector, or publishing fails.
pub async fn run(settings: &Settings) -> Result<()> {
    let integration = sample(settings).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    integration.publish(&mut out, settings.pretty)?;

    info!("published");

    Ok(())
}
