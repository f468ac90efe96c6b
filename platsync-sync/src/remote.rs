//! Remote API collaborator and cache-aware environment lookups.

use platsync_core::{
    Activity, ActivityId, BranchRequest, Environment, EnvironmentCache, EnvironmentId, Project,
    ProjectId,
};
use thiserror::Error;

/// Operation name checked before branching.
pub const BRANCH_OPERATION: &str = "branch";

/// Errors surfaced by a [`RemoteApi`] implementation.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
}

/// The hosting platform's API, as far as this tool needs it.
///
/// Transport, authentication, and retries are the implementor's concern.
pub trait RemoteApi {
    fn project(&self, id: &ProjectId) -> Result<Project, RemoteError>;

    /// Uncached list of every environment in `project`.
    fn environments(&self, project: &ProjectId) -> Result<Vec<Environment>, RemoteError>;

    /// Submit a branch of `request.parent_id`. Returns as soon as the
    /// activity is accepted; creation completes asynchronously.
    fn branch(&self, project: &ProjectId, request: &BranchRequest) -> Result<Activity, RemoteError>;

    /// Current state of an activity.
    fn activity(&self, project: &ProjectId, id: &ActivityId) -> Result<Activity, RemoteError>;

    fn supports_operation(&self, environment: &Environment, operation: &str) -> bool {
        environment.supports(operation)
    }
}

/// Environments of `project`, served from `cache` when present.
pub fn list_environments(
    api: &dyn RemoteApi,
    cache: &dyn EnvironmentCache,
    project: &ProjectId,
) -> Result<Vec<Environment>, RemoteError> {
    if let Some(hit) = cache.get(project) {
        tracing::debug!("environment cache hit for {project}");
        return Ok(hit);
    }
    let environments = api.environments(project)?;
    cache.put(project, environments.clone());
    Ok(environments)
}

/// Look up one environment by id, through the cache.
pub fn find_environment(
    api: &dyn RemoteApi,
    cache: &dyn EnvironmentCache,
    project: &ProjectId,
    id: &EnvironmentId,
) -> Result<Option<Environment>, RemoteError> {
    Ok(list_environments(api, cache, project)?
        .into_iter()
        .find(|env| env.id == *id))
}
