#![allow(dead_code)]

use chrono::{DateTime, Utc};
use mariadb_integration::cache::DEFAULT_TTL;
use mariadb_integration::collectors::{RawData, config::CollectorConfig};
use mariadb_integration::connection::{self, ConnectionDescriptor};
use mariadb_integration::integration::Settings;
use mariadb_integration::metrics::{GroupSelection, RawSample, ResetPolicy};
use secrecy::SecretString;
use std::collections::BTreeMap;
use std::env;

/// Settings for a remote entity `db:3306` with every output enabled.
pub fn settings() -> Settings {
    Settings {
        connection: ConnectionDescriptor {
            host: "db".to_string(),
            port: 3306,
            username: "monitor".to_string(),
            password: SecretString::from(""),
            database: String::new(),
            old_passwords: false,
        },
        remote_monitoring: true,
        collectors: CollectorConfig::new(),
        groups: GroupSelection::default(),
        inventory: true,
        metrics: true,
        cache_path: None,
        cache_ttl: DEFAULT_TTL,
        reset_policy: ResetPolicy::Zero,
        pretty: false,
    }
}

pub fn raw_data(
    inventory: &[(&str, &str)],
    metrics: &[(&str, &str)],
    observed_at: DateTime<Utc>,
) -> RawData {
    let to_map = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    };

    RawData {
        inventory: to_map(inventory),
        metrics: RawSample::new(to_map(metrics), observed_at),
    }
}

/// Connection to a live test server, from `MARIADB_TEST_*` variables.
pub fn live_descriptor() -> ConnectionDescriptor {
    ConnectionDescriptor {
        host: env::var("MARIADB_TEST_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
        port: env::var("MARIADB_TEST_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3306),
        username: env::var("MARIADB_TEST_USER").unwrap_or_else(|_| "root".to_string()),
        password: SecretString::from(
            env::var("MARIADB_TEST_PASSWORD").unwrap_or_else(|_| "root".to_string()),
        ),
        database: String::new(),
        old_passwords: false,
    }
}

/// `Some` if a live server answers; tests skip themselves otherwise.
pub async fn live_server() -> Option<ConnectionDescriptor> {
    let descriptor = live_descriptor();
    match connection::open(&descriptor).await {
        Ok(pool) => {
            pool.close().await;
            Some(descriptor)
        }
        Err(e) => {
            eprintln!("Skipping live test, no server at {}: {e}", descriptor.endpoint());
            None
        }
    }
}
