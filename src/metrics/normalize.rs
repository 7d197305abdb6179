use super::{GroupSelection, Kind, MetricRegistry, RawSample};
use crate::cache::{CounterState, CounterStates};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use tracing::{debug, trace};

/// What to publish when a counter is lower than its previous sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Publish 0 for the interval containing the reset.
    #[default]
    Zero,
    /// Publish nothing for the interval containing the reset.
    Skip,
}

impl FromStr for ResetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zero" => Ok(Self::Zero),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown counter reset policy: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedMetric {
    pub name: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub kind: Kind,
}

/// Result of one normalization pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Normalized {
    /// Publish-ready values, sorted by name.
    pub metrics: Vec<NormalizedMetric>,
    /// Counter values to persist for the next run.
    pub counters: CounterStates,
}

/// Turn a raw sample into publishable values using the previous counter sample.
///
/// Gauges are transformed and passed through. Delta and rate counters are
/// recorded for the next run and published only when a previous value
/// exists; rates additionally need a positive elapsed time.
#[must_use]
pub fn normalize(
    raw: &RawSample,
    registry: &MetricRegistry,
    groups: GroupSelection,
    previous: &CounterStates,
    now: DateTime<Utc>,
    policy: ResetPolicy,
) -> Normalized {
    let mut out = Normalized::default();

    for (key, value) in raw.iter() {
        let Some(def) = registry.lookup(key) else {
            trace!(key, "no definition for raw key");
            continue;
        };

        if !groups.contains(def.group) {
            continue;
        }

        if !def.kind.is_counter() {
            match def.transform.apply_raw(value) {
                Some(v) => out.metrics.push(NormalizedMetric {
                    name: def.name,
                    value: v,
                    unit: def.unit,
                    kind: def.kind,
                }),
                None => debug!(metric = def.name, value, "could not parse gauge value"),
            }
            continue;
        }

        let Some(current) = super::parse_number(value) else {
            debug!(metric = def.name, value, "could not parse counter value");
            continue;
        };

        out.counters.insert(
            def.key.to_string(),
            CounterState {
                value: current,
                observed_at: now,
            },
        );

        let Some(prev) = previous.get(def.key) else {
            debug!(metric = def.name, "first observation of counter; skipping");
            continue;
        };

        let diff = current - prev.value;
        let diff = if diff < 0.0 {
            match policy {
                ResetPolicy::Zero => {
                    debug!(
                        metric = def.name,
                        current,
                        previous = prev.value,
                        "counter reset; publishing 0"
                    );
                    0.0
                }
                ResetPolicy::Skip => {
                    debug!(
                        metric = def.name,
                        current,
                        previous = prev.value,
                        "counter reset; skipping"
                    );
                    continue;
                }
            }
        } else {
            diff
        };

        let value = match def.kind {
            Kind::Rate => {
                let elapsed = seconds_between(prev.observed_at, now);
                if elapsed <= 0.0 {
                    debug!(metric = def.name, elapsed, "samples too close in time; skipping");
                    continue;
                }
                def.transform.apply(diff) / elapsed
            }
            Kind::Delta | Kind::Gauge => def.transform.apply(diff),
        };

        out.metrics.push(NormalizedMetric {
            name: def.name,
            value,
            unit: def.unit,
            kind: def.kind,
        });
    }

    for derived in registry.derived() {
        if !groups.contains(derived.group) {
            continue;
        }
        if let Some(value) = (derived.compute)(raw).filter(|v| v.is_finite()) {
            out.metrics.push(NormalizedMetric {
                name: derived.name,
                value,
                unit: derived.unit,
                kind: Kind::Gauge,
            });
        }
    }

    out.metrics.sort_by(|a, b| a.name.cmp(b.name));
    out
}

#[allow(clippy::cast_precision_loss)]
fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    delta
        .num_microseconds()
        .map_or_else(|| delta.num_seconds() as f64, |us| us as f64 / 1_000_000.0)
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::metrics::{Group, MetricDefinition, Transform};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn sample(pairs: &[(&str, &str)], at: DateTime<Utc>) -> RawSample {
        RawSample::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            at,
        )
    }

    fn prev(pairs: &[(&str, f64)], at: DateTime<Utc>) -> CounterStates {
        pairs
            .iter()
            .map(|(k, v)| {
                (
                    (*k).to_string(),
                    CounterState {
                        value: *v,
                        observed_at: at,
                    },
                )
            })
            .collect()
    }

    fn value(out: &Normalized, name: &str) -> Option<f64> {
        out.metrics.iter().find(|m| m.name == name).map(|m| m.value)
    }

    #[test]
    fn test_gauge_passes_through_without_history() {
        let raw = sample(&[("Threads_connected", "50")], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &CounterStates::new(),
            t0(),
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "net.threadsConnected"), Some(50.0));
        assert!(out.counters.is_empty());
    }

    #[test]
    fn test_gauge_ignores_previous_sample() {
        let raw = sample(&[("Threads_connected", "50")], t0());
        let history = prev(&[("Threads_connected", 10.0)], t0() - Duration::seconds(60));
        let with = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &history,
            t0(),
            ResetPolicy::Zero,
        );
        let without = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &CounterStates::new(),
            t0(),
            ResetPolicy::Zero,
        );
        assert_eq!(with.metrics, without.metrics);
    }

    #[test]
    fn test_rate_first_run_is_skipped_but_recorded() {
        let raw = sample(&[("Queries", "1000")], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &CounterStates::new(),
            t0(),
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "query.queriesPerSecond"), None);
        let state = out.counters.get("Queries").unwrap();
        assert_eq!(state.value, 1000.0);
        assert_eq!(state.observed_at, t0());
    }

    #[test]
    fn test_rate_divides_by_elapsed_seconds() {
        let now = t0() + Duration::seconds(60);
        let raw = sample(&[("Queries", "1600")], now);
        let history = prev(&[("Queries", 1000.0)], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &history,
            now,
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "query.queriesPerSecond"), Some(10.0));
        assert_eq!(out.counters.get("Queries").unwrap().value, 1600.0);
    }

    #[test]
    fn test_delta_is_difference() {
        let now = t0() + Duration::seconds(30);
        let groups = GroupSelection {
            extended: true,
            ..GroupSelection::default()
        };
        let raw = sample(&[("Created_tmp_tables", "125")], now);
        let history = prev(&[("Created_tmp_tables", 100.0)], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            groups,
            &history,
            now,
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "db.createdTmpTables"), Some(25.0));
    }

    #[test]
    fn test_delta_applies_transform_to_difference() {
        let now = t0() + Duration::seconds(30);
        let groups = GroupSelection {
            innodb: true,
            ..GroupSelection::default()
        };
        let raw = sample(&[("Innodb_row_lock_time", "7000")], now);
        let history = prev(&[("Innodb_row_lock_time", 2000.0)], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            groups,
            &history,
            now,
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "db.innodb.rowLockTimeSeconds"), Some(5.0));
    }

    #[test]
    fn test_counter_reset_zero_policy() {
        let now = t0() + Duration::seconds(60);
        let raw = sample(&[("Queries", "10")], now);
        let history = prev(&[("Queries", 5000.0)], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &history,
            now,
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "query.queriesPerSecond"), Some(0.0));
        assert_eq!(out.counters.get("Queries").unwrap().value, 10.0);
    }

    #[test]
    fn test_counter_reset_skip_policy() {
        let now = t0() + Duration::seconds(60);
        let raw = sample(&[("Queries", "10")], now);
        let history = prev(&[("Queries", 5000.0)], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &history,
            now,
            ResetPolicy::Skip,
        );
        assert_eq!(value(&out, "query.queriesPerSecond"), None);
        assert_eq!(out.counters.get("Queries").unwrap().value, 10.0);
    }

    #[test]
    fn test_counters_are_never_negative() {
        let now = t0() + Duration::seconds(10);
        let groups = GroupSelection::all();
        let raw = sample(
            &[
                ("Queries", "1"),
                ("Bytes_sent", "0"),
                ("Created_tmp_tables", "3"),
                ("Innodb_row_lock_time", "1"),
            ],
            now,
        );
        let history = prev(
            &[
                ("Queries", 100.0),
                ("Bytes_sent", 1.0),
                ("Created_tmp_tables", 4.0),
                ("Innodb_row_lock_time", 9.0),
            ],
            t0(),
        );
        for policy in [ResetPolicy::Zero, ResetPolicy::Skip] {
            let out = normalize(&raw, MetricRegistry::global(), groups, &history, now, policy);
            assert!(out.metrics.iter().all(|m| m.value >= 0.0), "{policy:?}: {:?}", out.metrics);
        }
    }

    #[test]
    fn test_rate_with_non_positive_elapsed_is_skipped() {
        let raw = sample(&[("Queries", "1600")], t0());
        for at in [t0(), t0() + Duration::seconds(5)] {
            let history = prev(&[("Queries", 1000.0)], at);
            let out = normalize(
                &raw,
                MetricRegistry::global(),
                GroupSelection::default(),
                &history,
                t0(),
                ResetPolicy::Zero,
            );
            assert_eq!(value(&out, "query.queriesPerSecond"), None);
            assert!(out.counters.contains_key("Queries"));
        }
    }

    #[test]
    fn test_delta_with_zero_elapsed_is_published() {
        let groups = GroupSelection {
            extended: true,
            ..GroupSelection::default()
        };
        let raw = sample(&[("Created_tmp_tables", "12")], t0());
        let history = prev(&[("Created_tmp_tables", 10.0)], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            groups,
            &history,
            t0(),
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "db.createdTmpTables"), Some(2.0));
    }

    #[test]
    fn test_stale_keys_are_dropped_from_counters() {
        let now = t0() + Duration::seconds(60);
        let raw = sample(&[("Queries", "1600")], now);
        let history = prev(&[("Queries", 1000.0), ("Questions", 900.0)], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &history,
            now,
            ResetPolicy::Zero,
        );
        assert!(out.counters.contains_key("Queries"));
        assert!(!out.counters.contains_key("Questions"));
    }

    #[test]
    fn test_unknown_and_disabled_keys_are_dropped() {
        let raw = sample(
            &[
                ("Some_new_counter", "1"),
                ("Innodb_buffer_pool_pages_data", "10"),
                ("Innodb_rows_read", "10"),
            ],
            t0(),
        );
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &CounterStates::new(),
            t0(),
            ResetPolicy::Zero,
        );
        assert!(out.metrics.is_empty());
        assert!(out.counters.is_empty());
    }

    #[test]
    fn test_unparseable_values_are_skipped() {
        let raw = sample(&[("Threads_connected", ""), ("Queries", "abc")], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &CounterStates::new(),
            t0(),
            ResetPolicy::Zero,
        );
        assert!(out.metrics.is_empty());
        assert!(out.counters.is_empty());
    }

    #[test]
    fn test_boolean_gauge() {
        let raw = sample(&[("read_only", "ON"), ("Slave_running", "OFF")], t0());
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &CounterStates::new(),
            t0(),
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "db.readOnly"), Some(1.0));
        assert_eq!(value(&out, "cluster.slaveRunning"), Some(0.0));
    }

    #[test]
    fn test_derived_gauges_follow_group_selection() {
        let raw = sample(
            &[
                ("Threads_created", "5"),
                ("Connections", "50"),
                ("Key_blocks_unused", "64"),
                ("key_cache_block_size", "1024"),
                ("key_buffer_size", "131072"),
            ],
            t0(),
        );
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &CounterStates::new(),
            t0(),
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "db.threadCacheMissRate"), Some(0.1));
        assert_eq!(value(&out, "db.myisam.keyCacheUtilization"), None);

        let groups = GroupSelection {
            myisam: true,
            ..GroupSelection::default()
        };
        let out = normalize(
            &raw,
            MetricRegistry::global(),
            groups,
            &CounterStates::new(),
            t0(),
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "db.myisam.keyCacheUtilization"), Some(0.5));
    }

    #[test]
    fn test_output_is_sorted_and_idempotent() {
        let now = t0() + Duration::seconds(60);
        let raw = sample(
            &[
                ("Threads_running", "3"),
                ("Queries", "1600"),
                ("Connections", "40"),
                ("Threads_connected", "50"),
            ],
            now,
        );
        let history = prev(&[("Queries", 1000.0), ("Connections", 10.0)], t0());
        let first = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &history,
            now,
            ResetPolicy::Zero,
        );
        let second = normalize(
            &raw,
            MetricRegistry::global(),
            GroupSelection::default(),
            &history,
            now,
            ResetPolicy::Zero,
        );
        assert_eq!(first, second);

        let names: Vec<_> = first.metrics.iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_custom_registry() {
        let registry = MetricRegistry::new(
            vec![MetricDefinition {
                key: "Widgets",
                name: "widgets.perSecond",
                kind: Kind::Rate,
                unit: "widgets/s",
                transform: Transform::Scale(2.0),
                group: Group::Core,
            }],
            vec![],
            vec![],
        );
        let now = t0() + Duration::seconds(4);
        let raw = sample(&[("Widgets", "20")], now);
        let history = prev(&[("Widgets", 10.0)], t0());
        let out = normalize(
            &raw,
            &registry,
            GroupSelection::default(),
            &history,
            now,
            ResetPolicy::Zero,
        );
        assert_eq!(value(&out, "widgets.perSecond"), Some(5.0));
    }

    #[test]
    fn test_reset_policy_from_str() {
        assert_eq!("zero".parse::<ResetPolicy>(), Ok(ResetPolicy::Zero));
        assert_eq!("SKIP".parse::<ResetPolicy>(), Ok(ResetPolicy::Skip));
        assert!("clamp".parse::<ResetPolicy>().is_err());
    }
}
