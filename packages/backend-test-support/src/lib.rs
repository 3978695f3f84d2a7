//! Backend test support utilities
//!
//! Shared by the backend's unit and integration tests: unified logging
//! initialization and problem-details assertions that do not depend on
//! backend types.

pub mod logging;
pub mod problem_details;
