//! Connection provider: builds connect options from the run settings and
//! hands out a single-connection pool whose lifetime is scoped to a closure.

use crate::error::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info_span, instrument};
use tracing_futures::Instrument as _;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub database: String,
    /// Allow the legacy/cleartext authentication path for servers still using
    /// pre-4.1 password hashes or pluggable auth.
    pub old_passwords: bool,
}

impl ConnectionDescriptor {
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut opts = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .enable_cleartext_plugin(self.old_passwords);

        if !self.username.is_empty() {
            opts = opts.username(&self.username);
        }

        let password = self.password.expose_secret();
        if !password.is_empty() {
            opts = opts.password(password);
        }

        if !self.database.is_empty() {
            opts = opts.database(&self.database);
        }

        opts
    }
}

// Never print the password.
impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mysql://")?;
        if !self.username.is_empty() {
            write!(f, "{}:***@", self.username)?;
        }
        write!(f, "{}:{}/{}", self.host, self.port, self.database)?;
        if self.old_passwords {
            write!(f, "?allowOldPasswords=true")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("database", &self.database)
            .field("old_passwords", &self.old_passwords)
            .finish_non_exhaustive()
    }
}

/// Open a pool holding at most one connection.
///
/// # Errors
///
/// Returns [`Error::Connection`] if the server is unreachable or rejects the credentials.
#[instrument(skip(descriptor), level = "info", err, fields(db.system = "mysql", endpoint = %descriptor.endpoint()))]
pub async fn open(descriptor: &ConnectionDescriptor) -> Result<MySqlPool> {
    let span = info_span!("db.connect", db.system = "mysql", otel.kind = "client");

    MySqlPoolOptions::new()
        .max_connections(1)
        .min_connections(0)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(descriptor.connect_options())
        .instrument(span)
        .await
        .map_err(|source| Error::Connection {
            endpoint: descriptor.endpoint(),
            source,
        })
}

/// Run `f` with an open pool and close the pool on every exit path.
///
/// `f` receives a handle to the pool; the pool is closed once its future
/// completes, whether it succeeded or not.
///
/// # Errors
///
/// Returns the connection error, or whatever `f` returns.
pub async fn scoped<T, F, Fut>(descriptor: &ConnectionDescriptor, f: F) -> Result<T>
where
    F: FnOnce(MySqlPool) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let pool = open(descriptor).await?;

    let result = f(pool.clone()).await;

    pool.close().await;
    debug!(endpoint = %descriptor.endpoint(), "connection closed");

    result
}
