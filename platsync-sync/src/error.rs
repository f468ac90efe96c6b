//! Error types for platsync-sync.

use platsync_core::CoreError;
use platsync_detector::DetectError;
use thiserror::Error;

use crate::remote::RemoteError;
use crate::vcs::VcsError;
use crate::wait::WaitOutcome;

/// All errors that can end a branch, checkout, or deploy invocation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid invocation: missing branch name, branch equals parent,
    /// no local root without `--force`. Never retried.
    #[error("{0}")]
    Usage(String),

    /// The remote environment does not allow the operation.
    #[error("operation not available: the environment '{environment}' can't be {operation}")]
    RemoteCapability {
        environment: String,
        operation: &'static str,
    },

    /// Checkout or branch creation failed in the working copy.
    #[error("failed to {action} branch locally: {branch}")]
    LocalSync {
        action: &'static str,
        branch: String,
        #[source]
        source: VcsError,
    },

    /// The activity did not succeed within the wait.
    #[error("{message} ({outcome})")]
    WaitFailed { outcome: WaitOutcome, message: String },

    /// No derivable local root.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("remote API error: {0}")]
    Remote(#[from] RemoteError),

    #[error("git error: {0}")]
    Vcs(#[from] VcsError),

    #[error("detection error: {0}")]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
