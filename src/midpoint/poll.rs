//! Bounded polling
//!
//! Midpoint imports objects and runs tasks asynchronously, so several
//! operations have to wait until something shows up or finishes. Every wait
//! has the same shape: a fixed number of attempts with a constant sleep after
//! each attempt that did not succeed.

use crate::error::{MidpointError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Outcome of one poll attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    Pending,
}

/// Iteration budget and constant interval of a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poller {
    pub iterations: u32,
    #[serde(with = "secs")]
    pub interval: Duration,
}

impl Poller {
    pub const fn new(iterations: u32, interval: Duration) -> Self {
        Self {
            iterations,
            interval,
        }
    }

    /// Run `attempt` until it is ready or the budget is exhausted.
    ///
    /// Transient errors (see [`MidpointError::is_transient`]) count as
    /// pending; any other error is returned immediately. `target` names the
    /// awaited object in logs and in the give-up error.
    pub async fn run<T, F, Fut>(&self, target: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<PollOutcome<T>>>,
    {
        for iteration in 0..self.iterations {
            tracing::debug!("Iteration #: {} waiting for {}", iteration, target);
            match attempt(iteration).await {
                Ok(PollOutcome::Ready(value)) => return Ok(value),
                Ok(PollOutcome::Pending) => {}
                Err(e) if e.is_transient() => {
                    tracing::debug!("Transient error while waiting for {}: {}", target, e);
                }
                Err(e) => return Err(e),
            }
            tracing::trace!("Waiting {:?} for {}", self.interval, target);
            tokio::time::sleep(self.interval).await;
        }
        Err(MidpointError::GaveUp(target.to_string()))
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

/// Polling budgets used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Readiness check performed when the client is created
    pub readiness: Poller,
    /// Wait for both ends of an assignment or inducement
    pub relationship: Poller,
    /// Wait for a task object to exist before watching its status
    pub task_existence: Poller,
    /// Wait for the import task gating `set_role_requestable`
    pub task_completion: Poller,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            readiness: Poller::new(10, Duration::from_secs(10)),
            relationship: Poller::new(2, Duration::from_secs(30)),
            task_existence: Poller::new(3, Duration::from_secs(30)),
            task_completion: Poller::new(2, Duration::from_secs(30)),
        }
    }
}

impl PollSettings {
    /// Same budget everywhere, handy for tests and impatient runs
    pub fn uniform(poller: Poller) -> Self {
        Self {
            readiness: poller,
            relationship: poller,
            task_existence: poller,
            task_completion: poller,
        }
    }
}
