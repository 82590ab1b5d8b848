//! One-shot startup gate for deferred initialization
//!
//! Some functions wrap an inner application that needs async setup before it
//! can take traffic. `StartupGate` runs that setup exactly once, on the first
//! request that needs it, and makes every caller wait for the outcome with a
//! bounded timeout instead of sleeping a fixed interval and hoping.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Outcome of the guarded initialization
#[derive(Debug, Clone, PartialEq, Eq)]
enum StartupState {
    Pending,
    Started,
    Failed(String),
}

/// Gate that runs an initialization future at most once and shares the
/// outcome with every waiter.
#[derive(Clone)]
pub struct StartupGate {
    claimed: Arc<AtomicBool>,
    tx: Arc<watch::Sender<StartupState>>,
    rx: watch::Receiver<StartupState>,
}

impl Default for StartupGate {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupGate {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(StartupState::Pending);
        Self {
            claimed: Arc::new(AtomicBool::new(false)),
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Whether initialization has completed successfully
    pub fn is_started(&self) -> bool {
        *self.rx.borrow() == StartupState::Started
    }

    /// Wait until the initialization future has run.
    ///
    /// The first caller spawns `init`; all callers wait for it to settle or
    /// for `timeout` to elapse. The outcome is sticky: once the future
    /// resolves, later calls return immediately without re-running it, and a
    /// recorded failure stays a failure.
    pub async fn wait_started<Fut>(&self, init: Fut, timeout: Duration) -> Result<()>
    where
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let tx = Arc::clone(&self.tx);
            tokio::spawn(async move {
                let state = match init.await {
                    Ok(()) => {
                        tracing::info!("Startup initialization complete");
                        StartupState::Started
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Startup initialization failed");
                        StartupState::Failed(e.to_string())
                    }
                };
                // Receiver is held by the gate itself, send cannot fail
                let _ = tx.send(state);
            });
        }

        let mut rx = self.rx.clone();
        let settled = tokio::time::timeout(
            timeout,
            rx.wait_for(|state| *state != StartupState::Pending),
        )
        .await;

        match settled {
            Ok(Ok(state)) => match &*state {
                StartupState::Failed(message) => Err(Error::Startup(message.clone())),
                _ => Ok(()),
            },
            Ok(Err(_)) => Err(Error::Startup("Startup gate closed".to_string())),
            Err(_) => Err(Error::Startup(format!(
                "Startup did not complete within {:?}",
                timeout
            ))),
        }
    }
}
