//! Bounded, cancellable polling of a [`VerificationCheck`].

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::VerificationCheck;
use crate::runtime::Shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between attempts in milliseconds
    pub interval_ms: u64,
    /// Attempts before giving up, including the first
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self { Self { interval_ms: 5_000, max_attempts: 12 } }
}

impl PollConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_interval_ms(mut self, ms: u64) -> Self { self.interval_ms = ms; self }
    pub fn with_max_attempts(mut self, attempts: u32) -> Self { self.max_attempts = attempts.max(1); self }

    pub fn interval(&self) -> Duration { Duration::from_millis(self.interval_ms) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome {
    Verified { attempts: u32 },
    Exhausted { attempts: u32 },
    Cancelled { attempts: u32 },
}

impl PollOutcome {
    pub fn is_verified(&self) -> bool { matches!(self, Self::Verified { .. }) }
}

/// Run `check` until it passes, attempts run out, or `shutdown` fires.
/// Check errors count as a failed attempt.
pub async fn poll_until(check: &dyn VerificationCheck, config: PollConfig, shutdown: &Shutdown) -> PollOutcome {
    let max_attempts = config.max_attempts.max(1);
    let mut attempts = 0;
    loop {
        if shutdown.is_triggered() {
            return PollOutcome::Cancelled { attempts };
        }
        attempts += 1;
        match check.check().await {
            Ok(true) => return PollOutcome::Verified { attempts },
            Ok(false) => tracing::debug!(attempts, "verification not yet satisfied"),
            Err(e) => tracing::warn!(attempts, error = %e, "verification check failed"),
        }
        if attempts >= max_attempts {
            return PollOutcome::Exhausted { attempts };
        }
        tokio::select! {
            _ = shutdown.wait() => return PollOutcome::Cancelled { attempts },
            _ = tokio::time::sleep(config.interval()) => {}
        }
    }
}

/// Owns a spawned poll. Dropping it cancels the poll.
pub struct PollHandle {
    shutdown: Shutdown,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn cancel(&self) { self.shutdown.trigger(); }

    pub async fn outcome(mut self) -> PollOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(PollOutcome::Cancelled { attempts: 0 }),
            None => PollOutcome::Cancelled { attempts: 0 },
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn spawn_poll(check: Arc<dyn VerificationCheck>, config: PollConfig) -> PollHandle {
    let shutdown = Shutdown::new();
    let signal = shutdown.clone();
    let task = tokio::spawn(async move { poll_until(check.as_ref(), config, &signal).await });
    PollHandle { shutdown, task: Some(task) }
}
