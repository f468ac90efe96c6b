//! Domain types shared by the detector, the orchestrators, and the CLI.
//!
//! Remote entities (`Project`, `Environment`, `Activity`) are transient
//! snapshots owned by the API collaborator. `LocalProjectContext` is derived
//! once per invocation and is never partially populated.
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed remote project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// An environment identifier. Environments are branches, so this is also the
/// git branch name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnvironmentId(pub String);

impl EnvironmentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EnvironmentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EnvironmentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of an in-flight remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub String);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ActivityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ActivityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Remote entities
// ---------------------------------------------------------------------------

/// A remote project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub host: String,
    /// Git URL used for the first-time fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
}

impl Project {
    /// Title when set, otherwise the id.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.id.0
        } else {
            &self.title
        }
    }
}

/// A remote environment (branch) of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvironmentId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EnvironmentId>,
    /// Set while a remote operation is mutating the environment; a dirty
    /// parent means any cached environment list is stale.
    #[serde(default)]
    pub is_dirty: bool,
    #[serde(default)]
    pub machine_name: String,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Operation names the API currently allows on this environment.
    #[serde(default)]
    pub operations: Vec<String>,
}

impl Environment {
    pub fn supports(&self, operation: &str) -> bool {
        self.operations.iter().any(|op| op == operation)
    }

    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.id.0
        } else {
            &self.title
        }
    }
}

/// Lifecycle of a remote activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ActivityState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ActivityState::Completed | ActivityState::Failed)
    }
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityState::Pending => write!(f, "pending"),
            ActivityState::InProgress => write!(f, "in progress"),
            ActivityState::Completed => write!(f, "completed"),
            ActivityState::Failed => write!(f, "failed"),
        }
    }
}

/// An asynchronous remote operation, e.g. a branch creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub state: ActivityState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Local values
// ---------------------------------------------------------------------------

/// Inputs of one branch operation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRequest {
    pub id: EnvironmentId,
    pub parent_id: EnvironmentId,
    pub title: String,
    pub clone_parent_data: bool,
    pub force: bool,
}

impl BranchRequest {
    /// A request titled after the new branch, cloning parent data, without force.
    pub fn new(id: impl Into<EnvironmentId>, parent_id: impl Into<EnvironmentId>) -> Self {
        let id = id.into();
        Self {
            title: id.0.clone(),
            id,
            parent_id: parent_id.into(),
            clone_parent_data: true,
            force: false,
        }
    }
}

/// The resolved on-disk layout of a locally materialized project.
///
/// `repository_dir` and `site_dir` are always derived from `root_dir` and
/// `legacy`; the only way to build one is [`LocalProjectContext::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalProjectContext {
    root_dir: PathBuf,
    legacy: bool,
    repository_dir: PathBuf,
    site_dir: PathBuf,
    internal_site_code: String,
}

impl LocalProjectContext {
    pub fn new(root_dir: impl Into<PathBuf>, legacy: bool, internal_site_code: impl Into<String>) -> Self {
        let root_dir = root_dir.into();
        let (repository_dir, site_dir) = if legacy {
            (root_dir.join("repository"), root_dir.join("www"))
        } else {
            (root_dir.clone(), root_dir.join("_www"))
        };
        Self {
            root_dir,
            legacy,
            repository_dir,
            site_dir,
            internal_site_code: internal_site_code.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn legacy(&self) -> bool {
        self.legacy
    }

    /// The git working copy.
    pub fn repository_dir(&self) -> &Path {
        &self.repository_dir
    }

    /// The built web root.
    pub fn site_dir(&self) -> &Path {
        &self.site_dir
    }

    pub fn internal_site_code(&self) -> &str {
        &self.internal_site_code
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(ProjectId::from("abc123").to_string(), "abc123");
        assert_eq!(EnvironmentId::from("develop").to_string(), "develop");
        assert_eq!(ActivityId::from("act-1").to_string(), "act-1");
    }

    #[test]
    fn legacy_context_splits_repository_and_www() {
        let ctx = LocalProjectContext::new("/sites/acme", true, "acme");
        assert_eq!(ctx.repository_dir(), Path::new("/sites/acme/repository"));
        assert_eq!(ctx.site_dir(), Path::new("/sites/acme/www"));
        assert!(ctx.legacy());
    }

    #[test]
    fn modern_context_uses_root_and_underscore_www() {
        let ctx = LocalProjectContext::new("/sites/acme", false, "acme");
        assert_eq!(ctx.repository_dir(), Path::new("/sites/acme"));
        assert_eq!(ctx.site_dir(), Path::new("/sites/acme/_www"));
        assert_eq!(ctx.internal_site_code(), "acme");
    }

    #[test]
    fn branch_request_defaults_title_to_id() {
        let req = BranchRequest::new("sprint-2", "develop");
        assert_eq!(req.title, "sprint-2");
        assert!(req.clone_parent_data);
        assert!(!req.force);
    }

    #[test]
    fn activity_terminal_states() {
        assert!(!ActivityState::Pending.is_terminal());
        assert!(!ActivityState::InProgress.is_terminal());
        assert!(ActivityState::Completed.is_terminal());
        assert!(ActivityState::Failed.is_terminal());
    }

    #[test]
    fn environment_capabilities_and_yaml_defaults() {
        let env: Environment =
            serde_yaml::from_str("id: develop\noperations: [branch, merge]\n").expect("parse");
        assert!(env.supports("branch"));
        assert!(!env.supports("delete"));
        assert!(!env.is_dirty);
        assert_eq!(env.label(), "develop");
    }
}
