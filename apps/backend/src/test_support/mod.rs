//! Helpers for exercising the gateway without a real MongoDB server.
//!
//! Public so integration tests under `tests/` can share them.

pub mod app_builder;
pub mod connector;

use std::time::Duration;

use mongodb::options::{ClientOptions, ServerAddress};
use mongodb::{Client, Database};

pub use app_builder::create_test_app;
pub use connector::{ScriptedConnector, ScriptedConnectorHandle};

use crate::config::cors::AllowedOrigins;
use crate::config::db::ConnectionConfig;
use crate::config::server::ServerConfig;
use crate::db::{ConnectionGuard, DbGuard};
use crate::state::app_state::AppState;

pub const TEST_DATABASE: &str = "astrotalk_test";

/// A database handle that never touches the network until an operation
/// runs on it. Must be called inside a Tokio runtime.
pub fn lazy_database(name: &str) -> Database {
    let mut options = ClientOptions::default();
    options.hosts = vec![ServerAddress::parse("127.0.0.1:27017").expect("static address is valid")];
    options.server_selection_timeout = Some(Duration::from_millis(200));
    let client = Client::with_options(options).expect("static client options are valid");
    client.database(name)
}

/// Connection settings for tests: short timeouts, configurable cooldown.
pub fn test_connection_config(retry_cooldown: Duration) -> ConnectionConfig {
    ConnectionConfig::new("mongodb://127.0.0.1:27017")
        .with_database(TEST_DATABASE)
        .with_connect_timeout(Duration::from_secs(2))
        .with_retry_cooldown(retry_cooldown)
}

/// Guard backed by `connector` instead of the MongoDB driver.
pub fn test_guard(connector: ScriptedConnector<Database>, retry_cooldown: Duration) -> DbGuard {
    ConnectionGuard::new(connector, test_connection_config(retry_cooldown))
}

/// State with the given guard, allow-list and gate timeout.
pub fn test_state(guard: DbGuard, origins: AllowedOrigins, db_gate_timeout: Duration) -> AppState {
    let server = ServerConfig {
        db_gate_timeout,
        ..ServerConfig::default()
    };
    AppState::new(guard, origins, server)
}
