#![allow(dead_code)]

// tests/common/mod.rs
use std::time::Duration;

use astrotalk_backend::db::{ConnectionGuard, ConnectionState};

// Logging is auto-installed for every test binary that declares `mod common;`
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// Poll until the guard reaches `state`, panicking after two seconds.
pub async fn wait_for_state<H>(guard: &ConnectionGuard<H>, state: ConnectionState)
where
    H: Clone + Send + Sync + 'static,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while guard.state() != state {
        assert!(
            tokio::time::Instant::now() < deadline,
            "guard stuck in {} waiting for {}",
            guard.state(),
            state
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
