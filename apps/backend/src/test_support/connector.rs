use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::config::db::ConnectionConfig;
use crate::db::{ConnectError, Connector};

type MakeHandle<H> = Arc<dyn Fn() -> H + Send + Sync>;

struct Shared<H> {
    calls: AtomicUsize,
    /// Outcomes consumed in order; once empty every attempt succeeds.
    script: Mutex<VecDeque<Result<(), ConnectError>>>,
    /// Attempts block here until released, when holding is enabled.
    hold: Option<Semaphore>,
    make: MakeHandle<H>,
}

/// Connector whose attempts are counted, optionally delayed or held, and
/// whose outcomes follow a script.
pub struct ScriptedConnector<H> {
    shared: Arc<Shared<H>>,
    delay: Duration,
}

/// Observes and drives a [`ScriptedConnector`] after it moved into a guard.
#[derive(Clone)]
pub struct ScriptedConnectorHandle<H> {
    shared: Arc<Shared<H>>,
}

impl<H> ScriptedConnector<H> {
    pub fn new<F>(make: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self::build(make, false)
    }

    /// Like `new`, but each attempt waits for [`ScriptedConnectorHandle::release`].
    pub fn held<F>(make: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self::build(make, true)
    }

    fn build<F>(make: F, hold: bool) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                calls: AtomicUsize::new(0),
                script: Mutex::new(VecDeque::new()),
                hold: hold.then(|| Semaphore::new(0)),
                make: Arc::new(make),
            }),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a failure for the next unscripted attempt.
    pub fn then_fail(self, error: ConnectError) -> Self {
        self.shared.script.lock().push_back(Err(error));
        self
    }

    /// Queue a success for the next unscripted attempt.
    pub fn then_succeed(self) -> Self {
        self.shared.script.lock().push_back(Ok(()));
        self
    }

    pub fn handle(&self) -> ScriptedConnectorHandle<H> {
        ScriptedConnectorHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<H> ScriptedConnectorHandle<H> {
    /// Number of connection attempts that reached the connector.
    pub fn calls(&self) -> usize {
        self.shared.calls.load(Ordering::SeqCst)
    }

    /// Let `n` held attempts proceed.
    pub fn release(&self, n: usize) {
        if let Some(hold) = &self.shared.hold {
            hold.add_permits(n);
        }
    }
}

#[async_trait]
impl<H> Connector<H> for ScriptedConnector<H>
where
    H: Send + 'static,
{
    async fn connect(&self, _config: &ConnectionConfig) -> Result<H, ConnectError> {
        self.shared.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(hold) = &self.shared.hold {
            let permit = hold.acquire().await.map_err(|_| ConnectError::Aborted)?;
            permit.forget();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.shared.script.lock().pop_front();
        match next {
            Some(Err(e)) => Err(e),
            Some(Ok(())) | None => Ok((self.shared.make)()),
        }
    }
}
