use crate::integration::payload::{Inventory, MetricSet};
use crate::metrics::{GroupSelection, MetricRegistry, NormalizedMetric, RawSample};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// One inventory item per server variable: `{ "<name>": { "value": "<raw>" } }`.
pub fn populate_inventory(inventory: &mut Inventory, variables: &BTreeMap<String, String>) {
    for (name, value) in variables {
        inventory.set_item(name, "value", Value::String(value.clone()));
    }
}

pub fn populate_metrics(metric_set: &mut MetricSet, metrics: &[NormalizedMetric]) {
    for metric in metrics {
        if metric_set.set_metric(metric.name, metric.value) {
            trace!(metric = metric.name, value = metric.value, unit = metric.unit, "metric");
        } else {
            debug!(metric = metric.name, value = metric.value, "dropping non-finite value");
        }
    }
}

/// Copy string attributes (server version, replication role) onto the metric set.
pub fn populate_attributes(
    metric_set: &mut MetricSet,
    raw: &RawSample,
    registry: &MetricRegistry,
    groups: GroupSelection,
) {
    for attribute in registry.attributes() {
        if !groups.contains(attribute.group) {
            continue;
        }
        if let Some(value) = raw.get(attribute.key) {
            metric_set.set_attribute(attribute.name, value);
        }
    }
}
