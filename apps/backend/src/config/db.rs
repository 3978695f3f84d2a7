//! Database connection settings.
//!
//! Read once at startup. The connection string is mandatory; everything else
//! has a default.

use std::fmt;
use std::time::Duration;

use super::{millis_or, non_empty, process_env};
use crate::error::AppError;

/// Primary and fallback variables holding the connection string.
pub const URI_VARS: [&str; 2] = ["MONGO_URI", "MONGODB_URI"];

const DEFAULT_APP_NAME: &str = "astrotalk-api";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_RETRY_COOLDOWN_MS: u64 = 5_000;

/// Immutable connection settings shared by the guard and the connector.
#[derive(Clone, PartialEq)]
pub struct ConnectionConfig {
    pub uri: String,
    /// Explicit database name; when `None` the connector uses the database
    /// named in the URI, then falls back to `test`.
    pub database: Option<String>,
    pub app_name: String,
    /// Upper bound on one whole connection attempt.
    pub connect_timeout: Duration,
    /// Minimum time after a failed attempt before another one may start.
    pub retry_cooldown: Duration,
}

impl ConnectionConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: None,
            app_name: DEFAULT_APP_NAME.to_string(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            retry_cooldown: Duration::from_millis(DEFAULT_RETRY_COOLDOWN_MS),
        }
    }

    pub fn with_database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_retry_cooldown(mut self, cooldown: Duration) -> Self {
        self.retry_cooldown = cooldown;
        self
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uri = URI_VARS
            .iter()
            .find_map(|name| non_empty(&lookup, name))
            .ok_or_else(|| {
                AppError::config(format!(
                    "Missing database connection string: set {} or {}",
                    URI_VARS[0], URI_VARS[1]
                ))
            })?;

        let mut config = Self::new(uri)
            .with_connect_timeout(millis_or(
                &lookup,
                "MONGO_CONNECT_TIMEOUT_MS",
                DEFAULT_CONNECT_TIMEOUT_MS,
            )?)
            .with_retry_cooldown(millis_or(
                &lookup,
                "MONGO_RETRY_COOLDOWN_MS",
                DEFAULT_RETRY_COOLDOWN_MS,
            )?);

        if config.connect_timeout.is_zero() {
            return Err(AppError::config(
                "MONGO_CONNECT_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }
        if let Some(name) = non_empty(&lookup, "MONGO_DB_NAME") {
            config = config.with_database(name);
        }
        Ok(config)
    }

    /// Connection string with any password replaced, safe for logs.
    pub fn redacted_uri(&self) -> String {
        redact_uri(&self.uri)
    }
}

// Credentials never reach logs through Debug.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("uri", &self.redacted_uri())
            .field("database", &self.database)
            .field("app_name", &self.app_name)
            .field("connect_timeout", &self.connect_timeout)
            .field("retry_cooldown", &self.retry_cooldown)
            .finish()
    }
}

fn redact_uri(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_string();
    };
    let rest = &uri[scheme_end + 3..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return uri.to_string();
    };
    let userinfo = &rest[..at];
    let user = userinfo.split(':').next().unwrap_or_default();
    format!("{}://{}:***@{}", &uri[..scheme_end], user, &rest[at + 1..])
}
