//! Metric semantics: raw samples, the static definition registry and the
//! rate normalizer.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};

pub mod definitions;
pub mod normalize;

pub use normalize::{NormalizedMetric, Normalized, ResetPolicy, normalize};

/// How a raw value becomes a published value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Point-in-time value, published as observed.
    Gauge,
    /// Monotonic counter, published as the difference to the previous sample.
    Delta,
    /// Monotonic counter, published as the difference per elapsed second.
    Rate,
}

impl Kind {
    #[must_use]
    pub const fn is_counter(self) -> bool {
        matches!(self, Self::Delta | Self::Rate)
    }
}

/// Static value conversion applied after parsing (and after differencing for counters).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transform {
    Identity,
    /// `ON`/`YES`/`TRUE`/`1`/`RUNNING` map to 1, anything else to 0.
    Boolean,
    /// Multiply by a constant, e.g. `0.001` for milliseconds to seconds.
    Scale(f64),
}

impl Transform {
    /// Apply the transform to a raw server value.
    #[must_use]
    pub fn apply_raw(self, raw: &str) -> Option<f64> {
        match self {
            Self::Boolean => Some(to_flag(raw)),
            Self::Identity | Self::Scale(_) => parse_number(raw).map(|v| self.apply(v)),
        }
    }

    /// Apply the transform to an already numeric value (a counter difference).
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Identity | Self::Boolean => value,
            Self::Scale(factor) => value * factor,
        }
    }
}

/// Definition group; a definition is live only when its group is selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Group {
    Core,
    Extended,
    Innodb,
    Myisam,
    Replication,
}

/// Which definition groups are live for a run. `Core` is always live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GroupSelection {
    pub extended: bool,
    pub innodb: bool,
    pub myisam: bool,
    pub replication: bool,
}

impl GroupSelection {
    #[must_use]
    pub const fn all() -> Self {
        Self {
            extended: true,
            innodb: true,
            myisam: true,
            replication: true,
        }
    }

    #[must_use]
    pub const fn contains(&self, group: Group) -> bool {
        match group {
            Group::Core => true,
            Group::Extended => self.extended,
            Group::Innodb => self.innodb,
            Group::Myisam => self.myisam,
            Group::Replication => self.replication,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricDefinition {
    /// Raw key as reported by the server (status/variable/column name).
    pub key: &'static str,
    /// Published metric name.
    pub name: &'static str,
    pub kind: Kind,
    pub unit: &'static str,
    pub transform: Transform,
    pub group: Group,
}

/// A gauge computed from several raw values.
#[derive(Clone, Debug)]
pub struct DerivedDefinition {
    pub name: &'static str,
    pub unit: &'static str,
    pub group: Group,
    pub compute: fn(&RawSample) -> Option<f64>,
}

/// A string value copied verbatim onto the metric set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDefinition {
    pub key: &'static str,
    pub name: &'static str,
    pub group: Group,
}

/// Raw key -> value mapping observed at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    values: BTreeMap<String, String>,
    observed_at: DateTime<Utc>,
}

impl RawSample {
    #[must_use]
    pub const fn new(values: BTreeMap<String, String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            values,
            observed_at,
        }
    }

    #[must_use]
    pub const fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Look up a raw value; exact match first, then ASCII case-insensitive.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .or_else(|| {
                self.values
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(parse_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Immutable lookup table of every known raw key.
#[derive(Debug)]
pub struct MetricRegistry {
    definitions: Vec<MetricDefinition>,
    by_key: HashMap<String, usize>,
    derived: Vec<DerivedDefinition>,
    attributes: Vec<AttributeDefinition>,
}

static REGISTRY: Lazy<MetricRegistry> = Lazy::new(|| {
    MetricRegistry::new(
        definitions::metric_definitions(),
        definitions::derived_definitions(),
        definitions::attribute_definitions(),
    )
});

impl MetricRegistry {
    /// Build a registry. Later duplicates of a raw key are ignored.
    #[must_use]
    pub fn new(
        definitions: Vec<MetricDefinition>,
        derived: Vec<DerivedDefinition>,
        attributes: Vec<AttributeDefinition>,
    ) -> Self {
        let mut by_key = HashMap::with_capacity(definitions.len());
        for (idx, def) in definitions.iter().enumerate() {
            by_key.entry(def.key.to_ascii_lowercase()).or_insert(idx);
        }

        Self {
            definitions,
            by_key,
            derived,
            attributes,
        }
    }

    /// The process-wide registry built from [`definitions`].
    #[must_use]
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&MetricDefinition> {
        self.by_key
            .get(&key.to_ascii_lowercase())
            .and_then(|&idx| self.definitions.get(idx))
    }

    #[must_use]
    pub fn derived(&self) -> &[DerivedDefinition] {
        &self.derived
    }

    #[must_use]
    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }
}

/// Parse a server value as a number. Empty strings and `NULL` are absent.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[must_use]
pub fn to_flag(raw: &str) -> f64 {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" | "running" => 1.0,
        _ => 0.0,
    }
}
