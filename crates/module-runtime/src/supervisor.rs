// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! The per-child supervisor wrapping a module's runtime: retries on
//! initialization failure (no device yet) or any other error with the same
//! backoff, never retries a clean exit, and always runs cleanup.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::error::RuntimeError;

/// One module's runtime: acquire its device/source and drive its mode
/// loop until shutdown or a fatal condition. `run` returning `Ok(())`
/// means a clean exit the supervisor should not retry (typically because
/// `shutdown` was already cancelled); an `Err` retries.
#[async_trait::async_trait]
pub trait Runtime: Send + Sync {
    async fn run(&self) -> Result<(), RuntimeError>;

    /// Always invoked after `run` returns or errors, even across retries.
    /// Implementations log their own cleanup failures rather than
    /// propagating them, so a failed cleanup never blocks a retry or exit.
    async fn cleanup(&self);
}

/// Retry-with-backoff wrapper described in the runtime substrate's
/// supervisor contract: an [`RuntimeError::Initialization`] (no device
/// present yet) and any other error both retry after `retry_interval`,
/// until `shutdown` is cancelled. A clean exit is not retried.
pub struct Supervisor {
    retry_interval: Duration,
}

impl Supervisor {
    pub fn new(retry_interval: Duration) -> Self {
        Self { retry_interval }
    }

    pub async fn run(&self, runtime: &dyn Runtime, shutdown: &CancellationToken) {
        loop {
            let result = runtime.run().await;
            runtime.cleanup().await;

            match result {
                Ok(()) => return,
                Err(RuntimeError::Initialization(reason)) => {
                    warn!(reason, "no device available yet, retrying after backoff");
                }
                Err(e) => {
                    error!(error = %e, "module runtime exited with an error, retrying after backoff");
                }
            }

            if shutdown.is_cancelled() {
                return;
            }
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(self.retry_interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyRuntime {
        attempts: AtomicUsize,
        succeed_on_attempt: usize,
        cleanups: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Runtime for FlakyRuntime {
        async fn run(&self) -> Result<(), RuntimeError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt >= self.succeed_on_attempt {
                Ok(())
            } else {
                Err(RuntimeError::Initialization("no device".into()))
            }
        }

        async fn cleanup(&self) {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn retries_on_initialization_error_until_a_clean_exit() {
        let runtime = FlakyRuntime { attempts: AtomicUsize::new(0), succeed_on_attempt: 3, cleanups: AtomicUsize::new(0) };
        let supervisor = Supervisor::new(Duration::from_millis(1));
        let shutdown = CancellationToken::new();

        supervisor.run(&runtime, &shutdown).await;

        assert_eq!(runtime.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(runtime.cleanups.load(Ordering::SeqCst), 3, "cleanup runs on every attempt, including failures");
    }

    struct AlwaysFailingRuntime {
        attempts: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Runtime for AlwaysFailingRuntime {
        async fn run(&self) -> Result<(), RuntimeError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(RuntimeError::Other("transient failure".into()))
        }

        async fn cleanup(&self) {}
    }

    #[tokio::test]
    async fn stops_retrying_once_shutdown_is_requested() {
        let runtime = AlwaysFailingRuntime { attempts: AtomicUsize::new(0) };
        let supervisor = Supervisor::new(Duration::from_millis(20));
        let shutdown = CancellationToken::new();
        let shutdown_trigger = shutdown.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            shutdown_trigger.cancel();
        });

        supervisor.run(&runtime, &shutdown).await;
        assert!(runtime.attempts.load(Ordering::SeqCst) >= 1);
    }

    struct ImmediatelyCleanRuntime;

    #[async_trait::async_trait]
    impl Runtime for ImmediatelyCleanRuntime {
        async fn run(&self) -> Result<(), RuntimeError> {
            Ok(())
        }
        async fn cleanup(&self) {}
    }

    #[tokio::test]
    async fn a_clean_exit_is_not_retried() {
        let supervisor = Supervisor::new(Duration::from_secs(60));
        let shutdown = CancellationToken::new();
        let start = std::time::Instant::now();
        supervisor.run(&ImmediatelyCleanRuntime, &shutdown).await;
        assert!(start.elapsed() < Duration::from_secs(1), "a clean exit must not wait out the retry backoff");
    }
}
