use crate::{
    cli::actions::Action,
    collectors::{COLLECTOR_NAMES, Collector, all_factories, config::CollectorConfig},
    connection::ConnectionDescriptor,
    error::Error,
    integration::Settings,
    metrics::{GroupSelection, ResetPolicy},
};
use anyhow::{Result, anyhow};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::debug;

fn string_arg(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

/// # Errors
///
/// Returns an error if required arguments are missing or invalid
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let host = string_arg(matches, "hostname");
    if host.trim().is_empty() {
        return Err(Error::Config("hostname must not be empty".to_string()).into());
    }

    let port = matches
        .get_one::<u16>("port")
        .copied()
        .ok_or_else(|| anyhow!("Port is required. Please provide it using the --port flag."))?;

    let connection = ConnectionDescriptor {
        host,
        port,
        username: string_arg(matches, "username"),
        password: SecretString::from(string_arg(matches, "password")),
        database: string_arg(matches, "database"),
        old_passwords: matches.get_flag("old-passwords"),
    };

    let enabled = get_enabled_collectors(matches);
    let collectors = CollectorConfig::new().with_enabled(&enabled);

    let groups = GroupSelection {
        extended: matches.get_flag("extended-metrics"),
        innodb: collectors.is_enabled("innodb"),
        myisam: collectors.is_enabled("myisam"),
        replication: collectors.is_enabled("replication"),
    };

    let (inventory, metrics) = output_selection(matches);

    let cache_ttl = matches
        .get_one::<u64>("cache-ttl")
        .copied()
        .ok_or_else(|| anyhow!("--cache-ttl is required"))?;
    let cache_ttl = i64::try_from(cache_ttl)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| Error::Config(format!("--cache-ttl {cache_ttl} is out of range")))?;

    let reset_policy = string_arg(matches, "counter-reset")
        .parse::<ResetPolicy>()
        .map_err(Error::Config)?;

    let settings = Settings {
        connection,
        remote_monitoring: matches.get_flag("remote-monitoring"),
        collectors,
        groups,
        inventory,
        metrics,
        cache_path: matches.get_one::<String>("cache-path").map(PathBuf::from),
        cache_ttl,
        reset_policy,
        pretty: matches.get_flag("pretty"),
    };

    debug!(
        connection = %settings.connection,
        collectors = ?enabled,
        inventory,
        metrics,
        "settings"
    );

    Ok(Action::Run(Box::new(settings)))
}

/// `(inventory, metrics)`; no selection flag means both.
fn output_selection(matches: &ArgMatches) -> (bool, bool) {
    let inventory = matches.get_flag("inventory");
    let metrics = matches.get_flag("metrics");
    let all = matches.get_flag("all") || (!inventory && !metrics);

    (all || inventory, all || metrics)
}

#[must_use]
pub fn get_enabled_collectors(matches: &ArgMatches) -> Vec<String> {
    let factories = all_factories();

    COLLECTOR_NAMES
        .iter()
        .filter(|&name| {
            let Some(collector) = factories.get(name).map(|factory| factory()) else {
                return false;
            };

            // Always on, no flags
            if collector.required() {
                return true;
            }

            let enable_flag = format!("collector.{name}");
            let disable_flag = format!("no-collector.{name}");

            // If explicitly disabled, skip it
            if matches.get_flag(&disable_flag) {
                return false;
            }

            // If explicitly enabled, include it
            if matches.get_flag(&enable_flag) {
                return true;
            }

            // Otherwise, check the collector's default setting
            collector.enabled_by_default()
        })
        .map(|&name| name.to_string())
        .collect()
}
