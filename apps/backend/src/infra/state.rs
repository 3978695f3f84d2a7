use crate::config::cors::AllowedOrigins;
use crate::config::db::ConnectionConfig;
use crate::config::server::ServerConfig;
use crate::db::{mongo_guard, DbGuard};
use crate::error::AppError;
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used in both tests and main)
#[derive(Default)]
pub struct StateBuilder {
    connection: Option<ConnectionConfig>,
    guard: Option<DbGuard>,
    origins: Option<AllowedOrigins>,
    server: Option<ServerConfig>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every setting from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new()
            .with_connection(ConnectionConfig::from_env()?)
            .with_origins(AllowedOrigins::from_env())
            .with_server(ServerConfig::from_env()?))
    }

    /// Connect with the MongoDB driver using `config`.
    pub fn with_connection(mut self, config: ConnectionConfig) -> Self {
        self.connection = Some(config);
        self
    }

    /// Use a prebuilt guard (e.g. one backed by a test connector).
    /// Takes precedence over `with_connection`.
    pub fn with_guard(mut self, guard: DbGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_origins(mut self, origins: AllowedOrigins) -> Self {
        self.origins = Some(origins);
        self
    }

    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Assemble the state. No connection is attempted here; the guard
    /// connects on first use or when asked to start in the background.
    pub fn build(self) -> Result<AppState, AppError> {
        let guard = match (self.guard, self.connection) {
            (Some(guard), _) => guard,
            (None, Some(config)) => mongo_guard(config),
            (None, None) => {
                return Err(AppError::config(
                    "AppState requires a database connection config".to_string(),
                ))
            }
        };

        Ok(AppState::new(
            guard,
            self.origins.unwrap_or_default(),
            self.server.unwrap_or_default(),
        ))
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
