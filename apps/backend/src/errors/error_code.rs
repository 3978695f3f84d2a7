//! Error codes for the Astrotalk API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings that
//! appear in problem responses.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// Malformed or oversized request body
    BadRequest,

    // Resource Not Found
    NotFound,

    // Database
    /// Connection attempt failed, or the retry cooldown is still running
    DbUnavailable,
    /// Connection attempt still in flight when the request gave up waiting
    DbConnecting,

    // System Errors
    Internal,
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical string that appears in HTTP responses.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbConnecting => "DB_CONNECTING",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
