//! # platsync-sync
//!
//! Orchestration between a remote environment lifecycle and the local
//! working copy.
//!
//! - [`BranchOrchestrator`] creates a remote environment and mirrors it as a
//!   local git branch.
//! - [`DeployOrchestrator`] fetches a site on its first deploy, resolves its
//!   layout, and inspects the participating applications.
//!
//! Both take their collaborators ([`RemoteApi`], [`VersionControl`],
//! [`ActivityWaiter`], and an environment cache) by reference.

pub mod branch;
pub mod checkout;
pub mod deploy;
pub mod error;
pub mod options;
pub mod remote;
pub mod vcs;
pub mod wait;

pub use branch::{
    Answer, BranchOptions, BranchOrchestrator, BranchOutcome, Confirm, LocalSync, Selection,
};
pub use checkout::{checkout_branch, checkout_environment, CheckoutResult};
pub use deploy::{database_slug, slugify, AppReport, DeployOrchestrator, DeployReport};
pub use error::SyncError;
pub use options::{effective_options, DeployOptions, EffectiveOptions};
pub use remote::{find_environment, list_environments, RemoteApi, RemoteError, BRANCH_OPERATION};
pub use vcs::{Git, VcsError, VersionControl};
pub use wait::{ActivityWaiter, PollingWaiter, WaitOutcome};
