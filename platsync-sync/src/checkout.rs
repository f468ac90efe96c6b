//! Switch a working copy to an existing remote environment.

use std::path::Path;

use platsync_core::{EnvironmentCache, EnvironmentId, ProjectId};

use crate::error::SyncError;
use crate::remote::{find_environment, RemoteApi};
use crate::vcs::{VcsError, VersionControl};

/// How the local branch was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutResult {
    /// The branch already existed locally.
    Existing,
    /// The branch was fetched and created tracking `upstream`.
    Tracking { upstream: String },
}

/// Check out `branch` in `repo`, creating it from `<remote>/<branch>` if needed.
pub fn checkout_branch(
    vcs: &dyn VersionControl,
    remote: &str,
    branch: &EnvironmentId,
    repo: &Path,
) -> Result<CheckoutResult, VcsError> {
    let name = branch.as_str();
    if vcs.branch_exists(name, repo)? {
        tracing::info!("checking out {name} locally");
        vcs.check_out(name, repo)?;
        return Ok(CheckoutResult::Existing);
    }

    let upstream = format!("{remote}/{name}");
    tracing::info!("creating local branch {name} from {upstream}");
    vcs.fetch(remote, name, repo)?;
    vcs.check_out_new(name, Some(&upstream), repo)?;
    vcs.set_upstream(&upstream, name, repo)?;
    Ok(CheckoutResult::Tracking { upstream })
}

/// Check out a remote environment, failing when it does not exist remotely.
pub fn checkout_environment(
    api: &dyn RemoteApi,
    cache: &dyn EnvironmentCache,
    vcs: &dyn VersionControl,
    remote: &str,
    project: &ProjectId,
    id: &EnvironmentId,
    repo: &Path,
) -> Result<CheckoutResult, SyncError> {
    if find_environment(api, cache, project, id)?.is_none() {
        return Err(SyncError::Usage(format!(
            "environment '{id}' not found in project {project}"
        )));
    }
    checkout_branch(vcs, remote, id, repo).map_err(|source| SyncError::LocalSync {
        action: "check out",
        branch: id.to_string(),
        source,
    })
}
