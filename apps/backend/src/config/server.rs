use std::path::PathBuf;
use std::time::Duration;

use super::{millis_or, non_empty, process_env};
use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_UPLOADS_DIR: &str = "uploads";
/// 100kb, the usual JSON body parser default.
const DEFAULT_JSON_LIMIT: usize = 100 * 1024;
const DEFAULT_DB_GATE_TIMEOUT_MS: u64 = 5_000;

/// HTTP-side settings for the bundled server binary and route composition.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub uploads_dir: PathBuf,
    pub json_limit: usize,
    /// How long a gated request waits for the database before answering 503.
    pub db_gate_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            uploads_dir: PathBuf::from(DEFAULT_UPLOADS_DIR),
            json_limit: DEFAULT_JSON_LIMIT,
            db_gate_timeout: Duration::from_millis(DEFAULT_DB_GATE_TIMEOUT_MS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match non_empty(&lookup, "BACKEND_PORT") {
            None => defaults.port,
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                AppError::config(format!("BACKEND_PORT must be a valid port number, got '{raw}'"))
            })?,
        };

        let json_limit = match non_empty(&lookup, "JSON_BODY_LIMIT") {
            None => defaults.json_limit,
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                AppError::config(format!("JSON_BODY_LIMIT must be a byte count, got '{raw}'"))
            })?,
        };

        Ok(Self {
            host: non_empty(&lookup, "BACKEND_HOST").unwrap_or(defaults.host),
            port,
            uploads_dir: non_empty(&lookup, "UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            json_limit,
            db_gate_timeout: millis_or(&lookup, "DB_GATE_TIMEOUT_MS", DEFAULT_DB_GATE_TIMEOUT_MS)?,
        })
    }
}
