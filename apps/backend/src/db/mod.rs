//! Database access: the connection guard and the connector it drives.

pub mod connector;
pub mod guard;

pub use connector::{ConnectError, Connector, MongoConnector};
pub use guard::{ConnectionGuard, ConnectionState};
use mongodb::Database;

use crate::config::db::ConnectionConfig;

/// The guard as used by the application: MongoDB handles.
pub type DbGuard = ConnectionGuard<Database>;

/// Guard wired to the real MongoDB driver. Performs no I/O until the first
/// `ensure_connected` call.
pub fn mongo_guard(config: ConnectionConfig) -> DbGuard {
    ConnectionGuard::new(MongoConnector, config)
}
