//! Wall clock and sleeping, abstracted so waits can run on virtual time

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::errors::DeployError;

/// Source of the current time and of delays
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current wall clock time, which may move backwards
    fn now(&self) -> DateTime<Utc>;

    /// Wait for the given duration
    async fn sleep(&self, duration: Duration);
}

/// The real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Measures time elapsed since the start of a wait
///
/// If the clock is observed before the start instant, the start is moved to
/// that instant, so elapsed time is never negative. A backwards clock jump
/// therefore lengthens the wait instead of ending it.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: DateTime<Utc>,
}

impl Stopwatch {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self { start: now }
    }

    pub fn elapsed(&mut self, now: DateTime<Utc>) -> Duration {
        if now < self.start {
            self.start = now;
        }
        (now - self.start).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Sleep for `duration` unless cancelled first
pub async fn pause(
    clock: &dyn Clock,
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), DeployError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DeployError::Cancelled),
        () = clock.sleep(duration) => Ok(()),
    }
}
