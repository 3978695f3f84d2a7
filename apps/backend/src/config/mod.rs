pub mod cors;
pub mod db;
pub mod server;

use std::time::Duration;

use crate::error::AppError;

/// Read a variable through `lookup`, treating blank values as unset.
pub(crate) fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an optional millisecond value, falling back to `default_ms` when unset.
pub(crate) fn millis_or<F>(lookup: &F, name: &str, default_ms: u64) -> Result<Duration, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, name) {
        None => Ok(Duration::from_millis(default_ms)),
        Some(raw) => raw.parse::<u64>().map(Duration::from_millis).map_err(|_| {
            AppError::config(format!(
                "{name} must be a whole number of milliseconds, got '{raw}'"
            ))
        }),
    }
}

/// Process environment as a lookup function.
pub(crate) fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
