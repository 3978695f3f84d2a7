//! The seam between the connection guard and the database driver.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use thiserror::Error;
use tracing::debug;

use crate::config::db::ConnectionConfig;

/// Database name used when neither the config nor the URI names one.
pub const FALLBACK_DATABASE: &str = "test";

/// Why a connection attempt did not produce a handle.
///
/// Cloneable so that one outcome can be handed to every caller waiting on
/// the same attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectError {
    #[error("invalid connection string: {0}")]
    InvalidUri(String),
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("connection attempt aborted before reporting an outcome")]
    Aborted,
    /// The last attempt failed and the retry cooldown is still running.
    #[error("database unavailable: {detail}")]
    Unavailable { detail: String, retry_after: Duration },
}

/// Performs one connection handshake. Implementations must not cache:
/// the guard decides when an attempt is made.
#[async_trait]
pub trait Connector<H>: Send + Sync {
    async fn connect(&self, config: &ConnectionConfig) -> Result<H, ConnectError>;
}

/// Production connector backed by the MongoDB driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct MongoConnector;

#[async_trait]
impl Connector<Database> for MongoConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Database, ConnectError> {
        let mut options = ClientOptions::parse(config.uri.as_str())
            .await
            .map_err(|e| ConnectError::InvalidUri(e.to_string()))?;
        options.app_name = Some(config.app_name.clone());
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);

        let client =
            Client::with_options(options).map_err(|e| ConnectError::InvalidUri(e.to_string()))?;

        // The driver connects lazily; ping so handshake and auth failures surface here.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ConnectError::Handshake(e.to_string()))?;

        let database = select_database(&client, config);
        debug!(database = %database.name(), "mongo ping ok");
        Ok(database)
    }
}

fn select_database(client: &Client, config: &ConnectionConfig) -> Database {
    match &config.database {
        Some(name) => client.database(name),
        None => client
            .default_database()
            .unwrap_or_else(|| client.database(FALLBACK_DATABASE)),
    }
}
