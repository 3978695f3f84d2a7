//! Error codes for the Astrotalk backend.

pub mod error_code;

pub use error_code::ErrorCode;
