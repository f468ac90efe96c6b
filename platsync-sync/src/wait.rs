//! Blocking waits on remote activities.
//!
//! A wait never cancels the activity: on timeout the remote operation keeps
//! running and only the caller's view of it ends.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use platsync_core::{Activity, ActivityState, ProjectId};

use crate::remote::RemoteApi;

/// How a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Succeeded,
    /// The activity reached its failed terminal state.
    Failed,
    /// Still pending or in progress when the timeout elapsed.
    TimedOut,
    /// Polling itself failed; the activity's state is unknown.
    Interrupted { reason: String },
}

impl WaitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Succeeded)
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitOutcome::Succeeded => write!(f, "succeeded"),
            WaitOutcome::Failed => write!(f, "remote activity failed"),
            WaitOutcome::TimedOut => write!(f, "timed out waiting for the remote activity"),
            WaitOutcome::Interrupted { reason } => write!(f, "stopped polling: {reason}"),
        }
    }
}

/// Waits for an activity to reach a terminal state.
pub trait ActivityWaiter {
    /// Block until `activity` finishes or the waiter gives up, logging
    /// `success` or `failure` accordingly.
    fn wait(&self, project: &ProjectId, activity: &Activity, success: &str, failure: &str) -> WaitOutcome;
}

/// Polls [`RemoteApi::activity`] at a fixed interval.
pub struct PollingWaiter<'a> {
    api: &'a dyn RemoteApi,
    timeout: Duration,
    interval: Duration,
    sleep: fn(Duration),
}

impl<'a> PollingWaiter<'a> {
    pub fn new(api: &'a dyn RemoteApi, timeout: Duration, interval: Duration) -> Self {
        Self {
            api,
            timeout,
            interval,
            sleep: thread::sleep,
        }
    }

    /// Replace the sleep between polls.
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    fn poll(&self, project: &ProjectId, activity: &Activity) -> WaitOutcome {
        let started = Instant::now();
        let mut current = activity.clone();
        loop {
            match current.state {
                ActivityState::Completed => return WaitOutcome::Succeeded,
                ActivityState::Failed => return WaitOutcome::Failed,
                ActivityState::Pending | ActivityState::InProgress => {}
            }
            if started.elapsed() >= self.timeout {
                return WaitOutcome::TimedOut;
            }
            (self.sleep)(self.interval);
            current = match self.api.activity(project, &current.id) {
                Ok(next) => next,
                Err(err) => {
                    return WaitOutcome::Interrupted {
                        reason: err.to_string(),
                    }
                }
            };
            tracing::debug!("activity {} is {}", current.id, current.state);
        }
    }
}

impl ActivityWaiter for PollingWaiter<'_> {
    fn wait(&self, project: &ProjectId, activity: &Activity, success: &str, failure: &str) -> WaitOutcome {
        let outcome = self.poll(project, activity);
        if outcome.is_success() {
            tracing::info!("{success}");
        } else {
            tracing::warn!("{failure}: {outcome}");
        }
        outcome
    }
}
