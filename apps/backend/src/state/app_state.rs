use crate::config::cors::AllowedOrigins;
use crate::config::server::ServerConfig;
use crate::db::{ConnectionState, DbGuard};

/// Application state shared by every worker.
///
/// Cloning is cheap: the guard is reference counted, so all clones observe
/// one connection state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Sole owner of the database connection lifecycle
    pub db: DbGuard,
    /// Origins allowed to make credentialed cross-origin requests
    pub origins: AllowedOrigins,
    pub server: ServerConfig,
}

impl AppState {
    pub fn new(db: DbGuard, origins: AllowedOrigins, server: ServerConfig) -> Self {
        Self {
            db,
            origins,
            server,
        }
    }

    pub fn db_state(&self) -> ConnectionState {
        self.db.state()
    }
}
