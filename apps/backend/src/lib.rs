#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod config;
pub mod db;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod infra;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod test_support;
pub mod trace_ctx;

// Re-exports for public API
pub use config::cors::AllowedOrigins;
pub use config::db::ConnectionConfig;
pub use config::server::ServerConfig;
pub use db::{ConnectError, ConnectionGuard, ConnectionState, Connector, DbGuard, MongoConnector};
pub use error::AppError;
pub use extractors::Db;
pub use infra::state::{build_state, StateBuilder};
pub use middleware::{cors_middleware, RequestTrace, RequireDb, StructuredLogger, TraceSpan};
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::logging::init();
}
