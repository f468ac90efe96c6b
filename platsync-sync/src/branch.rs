//! Branch orchestration: create a remote environment from a parent and
//! mirror it in the local working copy.
//!
//! ## Phases
//!
//! 1. Validating: branch name present and different from the parent; an
//!    existing environment diverts to checkout; the parent must allow
//!    branching.
//! 2. RemoteCreating: submit the branch, then invalidate the cache (also when
//!    the submission fails).
//! 3. LocalSyncing: check out or create the local branch (root known only).
//! 4. Waiting: optional; on success set up tracking of the new remote branch.
//! 5. Invalidate the cache again, whatever the wait outcome.
//!
//! The remote branch is never rolled back: a local failure after submission
//! leaves the environment created remotely.

use std::fmt;
use std::path::Path;

use platsync_core::{BranchRequest, Environment, EnvironmentCache, EnvironmentId, Project};
use platsync_detector::Layout;

use crate::checkout::{checkout_branch, CheckoutResult};
use crate::error::SyncError;
use crate::remote::{find_environment, list_environments, RemoteApi, BRANCH_OPERATION};
use crate::vcs::{VcsError, VersionControl};
use crate::wait::{ActivityWaiter, WaitOutcome};

/// Yes/no question asked before switching to an existing environment.
pub trait Confirm {
    fn confirm(&self, question: &str) -> bool;
}

/// Fixed answer; used for `--yes` and non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct Answer(pub bool);

impl Confirm for Answer {
    fn confirm(&self, _question: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Validating,
    RemoteCreating,
    LocalSyncing,
    Waiting,
    Done,
    PartialFailure,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validating => "validating",
            Phase::RemoteCreating => "remote-creating",
            Phase::LocalSyncing => "local-syncing",
            Phase::Waiting => "waiting",
            Phase::Done => "done",
            Phase::PartialFailure => "partial-failure",
        };
        f.write_str(name)
    }
}

fn enter(phase: Phase) {
    tracing::debug!("branch: {phase}");
}

/// What the caller selected before branching.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub project: &'a Project,
    pub parent: &'a Environment,
    /// Local project root, when run inside one.
    pub project_root: Option<&'a Path>,
    pub interactive: bool,
}

/// Switches of one branch invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchOptions {
    pub title: Option<String>,
    pub clone_parent_data: bool,
    pub force: bool,
    pub wait: bool,
}

impl Default for BranchOptions {
    fn default() -> Self {
        Self {
            title: None,
            clone_parent_data: true,
            force: false,
            wait: true,
        }
    }
}

/// Outcome of the local mirroring step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSync {
    /// No local root; the user must check out the branch later.
    Skipped,
    CheckedOut,
    Created { base: Option<EnvironmentId> },
    /// Failed, but `--force` let the operation continue.
    Failed { reason: String },
}

/// Successful end states of [`BranchOrchestrator::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum BranchOutcome {
    /// No name given in an interactive session; here are the environments instead.
    Listed(Vec<Environment>),
    /// The environment already existed and was checked out.
    CheckedOutExisting {
        environment: EnvironmentId,
        checkout: CheckoutResult,
    },
    Created {
        request: BranchRequest,
        local: LocalSync,
        /// `None` when the caller did not wait.
        wait: Option<WaitOutcome>,
        tracking: Option<String>,
    },
}

/// Drives a branch invocation against the injected collaborators.
pub struct BranchOrchestrator<'a> {
    pub api: &'a dyn RemoteApi,
    pub cache: &'a dyn EnvironmentCache,
    pub vcs: &'a dyn VersionControl,
    pub waiter: &'a dyn ActivityWaiter,
    pub confirm: &'a dyn Confirm,
    /// Name of the git remote pointing at the platform.
    pub remote_name: &'a str,
    /// Platform and command names for user-facing hints.
    pub service_name: &'a str,
    pub executable: &'a str,
}

impl BranchOrchestrator<'_> {
    pub fn run(
        &self,
        selection: &Selection<'_>,
        id: Option<EnvironmentId>,
        options: &BranchOptions,
    ) -> Result<BranchOutcome, SyncError> {
        let project = &selection.project.id;
        let parent = selection.parent;
        enter(Phase::Validating);

        let id = match id.filter(|id| !id.0.trim().is_empty()) {
            Some(id) => id,
            None if selection.interactive => {
                return Ok(BranchOutcome::Listed(list_environments(self.api, self.cache, project)?));
            }
            None => {
                return Err(SyncError::Usage(
                    "you must specify the name of the new branch".to_string(),
                ))
            }
        };

        if id == parent.id {
            return Err(SyncError::Usage(format!("already on {id}")));
        }

        if let Some(existing) = find_environment(self.api, self.cache, project, &id)? {
            return self.checkout_existing(selection, existing);
        }

        if !self.api.supports_operation(parent, BRANCH_OPERATION) {
            if parent.is_dirty {
                self.cache.invalidate(project);
            }
            return Err(SyncError::RemoteCapability {
                environment: parent.id.to_string(),
                operation: "branched",
            });
        }

        let repo = match selection.project_root {
            Some(root) => Some(Layout::detect(root).repository_dir(root)),
            None if options.force => {
                tracing::warn!(
                    "this command was run from outside your local project root: the new {} branch \
                     cannot be checked out in your local repository; run '{} checkout {id}' there later",
                    self.service_name,
                    self.executable
                );
                None
            }
            None => {
                return Err(SyncError::Usage(
                    "you must run this command inside the project root, or specify --force"
                        .to_string(),
                ))
            }
        };

        let request = BranchRequest {
            title: options.title.clone().unwrap_or_else(|| id.to_string()),
            id,
            parent_id: parent.id.clone(),
            clone_parent_data: options.clone_parent_data,
            force: options.force,
        };

        enter(Phase::RemoteCreating);
        tracing::info!(
            "creating a new environment {}, branched from {}",
            request.id,
            parent.label()
        );
        let activity = match self.api.branch(project, &request) {
            Ok(activity) => activity,
            Err(err) => {
                // The request may have been accepted before the failure.
                self.cache.invalidate(project);
                return Err(err.into());
            }
        };
        self.cache.invalidate(project);

        enter(Phase::LocalSyncing);
        let local = match &repo {
            None => LocalSync::Skipped,
            Some(repo) => match self.mirror_locally(&request, repo) {
                Ok(local) => local,
                Err((action, source)) if request.force => {
                    tracing::warn!("failed to {action} branch locally: {}: {source}", request.id);
                    LocalSync::Failed {
                        reason: source.to_string(),
                    }
                }
                Err((action, source)) => {
                    enter(Phase::PartialFailure);
                    return Err(SyncError::LocalSync {
                        action,
                        branch: request.id.to_string(),
                        source,
                    });
                }
            },
        };

        let mut wait = None;
        let mut tracking = None;
        if options.wait {
            enter(Phase::Waiting);
            let outcome = self.waiter.wait(
                project,
                &activity,
                &format!("the environment {} has been created", request.id),
                "branching failed",
            );
            if outcome.is_success() {
                if let Some(repo) = &repo {
                    tracking = self.track_remote(&request.id, repo);
                }
            }
            wait = Some(outcome);
        }

        self.cache.invalidate(project);

        match wait {
            Some(outcome) if !outcome.is_success() => {
                enter(Phase::PartialFailure);
                Err(SyncError::WaitFailed {
                    outcome,
                    message: format!("branching {} failed", request.id),
                })
            }
            wait => {
                enter(Phase::Done);
                Ok(BranchOutcome::Created {
                    request,
                    local,
                    wait,
                    tracking,
                })
            }
        }
    }

    fn checkout_existing(
        &self,
        selection: &Selection<'_>,
        existing: Environment,
    ) -> Result<BranchOutcome, SyncError> {
        let question = format!("The environment {} already exists. Check out?", existing.id);
        if !self.confirm.confirm(&question) {
            return Err(SyncError::Usage(format!(
                "the environment {} already exists",
                existing.id
            )));
        }
        let Some(root) = selection.project_root else {
            return Err(SyncError::Usage(
                "you must run this command inside the project root to check out".to_string(),
            ));
        };
        let repo = Layout::detect(root).repository_dir(root);
        let checkout = checkout_branch(self.vcs, self.remote_name, &existing.id, &repo)
            .map_err(|source| SyncError::LocalSync {
                action: "check out",
                branch: existing.id.to_string(),
                source,
            })?;
        Ok(BranchOutcome::CheckedOutExisting {
            environment: existing.id,
            checkout,
        })
    }

    fn mirror_locally(
        &self,
        request: &BranchRequest,
        repo: &Path,
    ) -> Result<LocalSync, (&'static str, VcsError)> {
        let name = request.id.as_str();
        let exists = self
            .vcs
            .branch_exists(name, repo)
            .map_err(|e| ("check out", e))?;
        if exists {
            tracing::info!("checking out {name} locally");
            self.vcs.check_out(name, repo).map_err(|e| ("check out", e))?;
            return Ok(LocalSync::CheckedOut);
        }

        let parent = request.parent_id.as_str();
        let base = match self.vcs.branch_exists(parent, repo) {
            Ok(true) => Some(request.parent_id.clone()),
            Ok(false) => None,
            Err(e) => return Err(("create", e)),
        };
        tracing::info!("creating local branch {name}");
        self.vcs
            .check_out_new(name, base.as_ref().map(EnvironmentId::as_str), repo)
            .map_err(|e| ("create", e))?;
        Ok(LocalSync::Created { base })
    }

    fn track_remote(&self, branch: &EnvironmentId, repo: &Path) -> Option<String> {
        let upstream = format!("{}/{}", self.remote_name, branch);
        let result = self
            .vcs
            .fetch(self.remote_name, branch.as_str(), repo)
            .and_then(|()| self.vcs.set_upstream(&upstream, branch.as_str(), repo));
        match result {
            Ok(()) => Some(upstream),
            Err(err) => {
                tracing::warn!("could not set {branch} to track {upstream}: {err}");
                None
            }
        }
    }
}
