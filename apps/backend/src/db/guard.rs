//! Lazy, single-flight connection guard.
//!
//! The guard owns the process-wide connection state. Callers never connect
//! on their own; they ask the guard for a handle and either get the cached
//! one, join the attempt already in flight, or (when nothing is in flight)
//! start exactly one new attempt.
//!
//! State transitions happen under a `parking_lot::Mutex` that is never held
//! across an `.await`. The in-flight attempt runs on its own task and
//! publishes its outcome through a `watch` channel, so it survives
//! cancellation of whichever request happened to start it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::connector::{ConnectError, Connector};
use crate::config::db::ConnectionConfig;

/// Observable lifecycle of the shared connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `None` until the attempt finishes.
type Outcome<H> = Option<Result<H, ConnectError>>;

enum Slot<H> {
    Disconnected,
    Connecting {
        attempt: u64,
        outcome: watch::Receiver<Outcome<H>>,
    },
    Connected(H),
    Failed {
        detail: String,
        at: Instant,
    },
}

impl<H> Slot<H> {
    fn state(&self) -> ConnectionState {
        match self {
            Slot::Disconnected => ConnectionState::Disconnected,
            // Sender gone without recording an outcome: the attempt task died.
            Slot::Connecting { outcome, .. } if outcome.has_changed().is_err() => {
                ConnectionState::Failed
            }
            Slot::Connecting { .. } => ConnectionState::Connecting,
            Slot::Connected(_) => ConnectionState::Connected,
            Slot::Failed { .. } => ConnectionState::Failed,
        }
    }
}

struct Inner<H> {
    connector: Arc<dyn Connector<H>>,
    config: ConnectionConfig,
    slot: Mutex<Slot<H>>,
    attempts: AtomicU64,
}

/// What a caller does after inspecting the slot.
enum Next<H> {
    Done(Result<H, ConnectError>),
    Wait(watch::Receiver<Outcome<H>>),
}

/// Shared handle to the connection guard. Clones share one state.
pub struct ConnectionGuard<H> {
    inner: Arc<Inner<H>>,
}

impl<H> Clone for ConnectionGuard<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H> fmt::Debug for ConnectionGuard<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("state", &self.inner.slot.lock().state())
            .field("attempts", &self.inner.attempts.load(Ordering::Relaxed))
            .field("config", &self.inner.config)
            .finish()
    }
}

impl<H> ConnectionGuard<H>
where
    H: Clone + Send + Sync + 'static,
{
    pub fn new<C>(connector: C, config: ConnectionConfig) -> Self
    where
        C: Connector<H> + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                connector: Arc::new(connector),
                config,
                slot: Mutex::new(Slot::Disconnected),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.slot.lock().state()
    }

    /// Number of underlying connection attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Time left before a failed guard will accept a new attempt.
    /// `None` unless the guard is in `Failed`.
    pub fn retry_after(&self) -> Option<Duration> {
        match &*self.inner.slot.lock() {
            Slot::Failed { at, .. } => {
                Some(self.inner.config.retry_cooldown.saturating_sub(at.elapsed()))
            }
            _ => None,
        }
    }

    /// Return the shared handle, connecting first if needed.
    ///
    /// Idempotent and safe to call from any number of concurrent tasks:
    /// at most one underlying attempt is in flight at a time, and every
    /// caller waiting on it receives that attempt's outcome.
    pub async fn ensure_connected(&self) -> Result<H, ConnectError> {
        let mut outcome = match self.next_step() {
            Next::Done(result) => return result,
            Next::Wait(rx) => rx,
        };

        let finished = match outcome.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };

        match finished {
            Some(result) => result,
            // The sender is gone; the slot tells us whether it reported first.
            None => match &*self.inner.slot.lock() {
                Slot::Connected(handle) => Ok(handle.clone()),
                Slot::Failed { detail, at } => Err(ConnectError::Unavailable {
                    detail: detail.clone(),
                    retry_after: self.inner.config.retry_cooldown.saturating_sub(at.elapsed()),
                }),
                _ => Err(ConnectError::Aborted),
            },
        }
    }

    /// Start the first attempt without waiting for it. The outcome is logged.
    pub fn connect_in_background(&self) {
        let guard = self.clone();
        tokio::spawn(async move {
            if let Err(e) = guard.ensure_connected().await {
                warn!(db_state = %guard.state(), error = %e, "background database connect did not succeed");
            }
        });
    }

    fn next_step(&self) -> Next<H> {
        let mut slot = self.inner.slot.lock();

        match &*slot {
            Slot::Connected(handle) => return Next::Done(Ok(handle.clone())),
            Slot::Connecting { outcome, .. } => {
                // A dropped sender with the slot still `Connecting` means the
                // attempt task died without reporting; replace it below.
                if outcome.has_changed().is_ok() {
                    return Next::Wait(outcome.clone());
                }
                warn!("db_state=connecting attempt task vanished; starting a new attempt");
            }
            Slot::Failed { detail, at } => {
                let elapsed = at.elapsed();
                let cooldown = self.inner.config.retry_cooldown;
                if elapsed < cooldown {
                    return Next::Done(Err(ConnectError::Unavailable {
                        detail: detail.clone(),
                        retry_after: cooldown - elapsed,
                    }));
                }
            }
            Slot::Disconnected => {}
        }

        let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = watch::channel(None);
        *slot = Slot::Connecting {
            attempt,
            outcome: rx.clone(),
        };
        drop(slot);

        info!(
            db_state = "connecting",
            attempt,
            uri = %self.inner.config.redacted_uri(),
            "starting database connection attempt"
        );
        self.spawn_attempt(attempt, tx);
        Next::Wait(rx)
    }

    fn spawn_attempt(&self, attempt: u64, tx: watch::Sender<Outcome<H>>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let started = Instant::now();
            let limit = inner.config.connect_timeout;
            let result = match tokio::time::timeout(limit, inner.connector.connect(&inner.config))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ConnectError::Timeout(limit)),
            };

            inner.record(attempt, &result, started.elapsed());
            // Stored even when nobody is listening any more.
            tx.send_replace(Some(result));
        });
    }
}

impl<H: Clone> Inner<H> {
    fn record(&self, attempt: u64, result: &Result<H, ConnectError>, took: Duration) {
        let mut slot = self.slot.lock();
        let current = matches!(&*slot, Slot::Connecting { attempt: a, .. } if *a == attempt);
        if !current {
            warn!(attempt, "stale database connection attempt finished; ignoring");
            return;
        }

        let took_ms = took.as_millis() as u64;
        match result {
            Ok(handle) => {
                *slot = Slot::Connected(handle.clone());
                info!(db_state = "connected", attempt, took_ms, "database connected");
            }
            Err(e) => {
                *slot = Slot::Failed {
                    detail: e.to_string(),
                    at: Instant::now(),
                };
                error!(db_state = "failed", attempt, took_ms, error = %e, "database connection failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;

    struct CountingConnector {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl Connector<u32> for CountingConnector {
        async fn connect(&self, _config: &ConnectionConfig) -> Result<u32, ConnectError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as u32 + 1;
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(ConnectError::Handshake("auth failed".to_string()))
            } else {
                Ok(n)
            }
        }
    }

    fn guard(delay_ms: u64, fail: bool) -> (ConnectionGuard<u32>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let connector = CountingConnector {
            calls: calls.clone(),
            delay: Duration::from_millis(delay_ms),
            fail,
        };
        let config = ConnectionConfig::new("mongodb://localhost")
            .with_retry_cooldown(Duration::from_secs(60));
        (ConnectionGuard::new(connector, config), calls)
    }

    #[tokio::test]
    async fn test_starts_disconnected() {
        let (guard, calls) = guard(0, false);
        assert_eq!(guard.state(), ConnectionState::Disconnected);
        assert_eq!(guard.attempts(), 0);
        assert_eq!(guard.retry_after(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_connects_once_and_caches() {
        let (guard, calls) = guard(0, false);

        assert_eq!(guard.ensure_connected().await, Ok(1));
        assert_eq!(guard.state(), ConnectionState::Connected);

        assert_eq!(guard.ensure_connected().await, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(guard.attempts(), 1);
    }

    #[tokio::test]
    async fn test_state_is_connecting_while_in_flight() {
        let (guard, _calls) = guard(100, false);

        let waiter = {
            let guard = guard.clone();
            tokio::spawn(async move { guard.ensure_connected().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(guard.state(), ConnectionState::Connecting);

        assert_eq!(waiter.await.unwrap(), Ok(1));
        assert_eq!(guard.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_failure_is_sticky_during_cooldown() {
        let (guard, calls) = guard(0, true);

        let first = guard.ensure_connected().await.unwrap_err();
        assert_eq!(first, ConnectError::Handshake("auth failed".to_string()));
        assert_eq!(guard.state(), ConnectionState::Failed);

        match guard.ensure_connected().await {
            Err(ConnectError::Unavailable {
                detail,
                retry_after,
            }) => {
                assert!(detail.contains("auth failed"));
                assert!(retry_after <= Duration::from_secs(60));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(guard.retry_after().is_some());
    }

    #[tokio::test]
    async fn test_timeout_records_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let connector = CountingConnector {
            calls: calls.clone(),
            delay: Duration::from_secs(5),
            fail: false,
        };
        let config = ConnectionConfig::new("mongodb://localhost")
            .with_connect_timeout(Duration::from_millis(30));
        let guard = ConnectionGuard::new(connector, config);

        let err = guard.ensure_connected().await.unwrap_err();
        assert_eq!(err, ConnectError::Timeout(Duration::from_millis(30)));
        assert_eq!(guard.state(), ConnectionState::Failed);
    }

    #[tokio::test]
    async fn test_display_state() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(
            serde_json::to_string(&ConnectionState::Failed).unwrap(),
            "\"failed\""
        );
    }
}
