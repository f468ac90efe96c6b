//! Recording fakes for the orchestrator collaborators.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use platsync_core::{
    Activity, ActivityId, ActivityState, BranchRequest, Environment, EnvironmentCache,
    EnvironmentId, MemoryEnvironmentCache, Project, ProjectId,
};
use platsync_sync::{ActivityWaiter, RemoteApi, RemoteError, VcsError, VersionControl, WaitOutcome};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn project(id: &str) -> Project {
    Project {
        id: ProjectId::from(id),
        title: "Acme Intranet".to_string(),
        host: "eu.platform.example".to_string(),
        repository_url: Some(format!("git@git.example:{id}.git")),
    }
}

pub fn environment(id: &str) -> Environment {
    Environment {
        id: EnvironmentId::from(id),
        title: id.to_string(),
        parent: None,
        is_dirty: false,
        machine_name: format!("{id}-abc123"),
        variables: Default::default(),
        operations: vec!["branch".to_string()],
    }
}

// ---------------------------------------------------------------------------
// Remote API
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeApi {
    pub environments: RefCell<Vec<Environment>>,
    pub environment_calls: Cell<usize>,
    pub branch_calls: RefCell<Vec<BranchRequest>>,
    /// Submission fails with a transport error after being recorded.
    pub fail_branch: Cell<bool>,
}

impl FakeApi {
    pub fn with(environments: Vec<Environment>) -> Self {
        Self {
            environments: RefCell::new(environments),
            ..Self::default()
        }
    }
}

impl RemoteApi for FakeApi {
    fn project(&self, id: &ProjectId) -> Result<Project, RemoteError> {
        Ok(project(&id.0))
    }

    fn environments(&self, _project: &ProjectId) -> Result<Vec<Environment>, RemoteError> {
        self.environment_calls.set(self.environment_calls.get() + 1);
        Ok(self.environments.borrow().clone())
    }

    fn branch(&self, _project: &ProjectId, request: &BranchRequest) -> Result<Activity, RemoteError> {
        self.branch_calls.borrow_mut().push(request.clone());
        if self.fail_branch.get() {
            return Err(RemoteError::Transport {
                url: "https://api.example/projects/abc123/environments/develop/branch".to_string(),
                message: "timed out reading response".to_string(),
            });
        }
        let mut created = environment(request.id.as_str());
        created.parent = Some(request.parent_id.clone());
        self.environments.borrow_mut().push(created);
        Ok(Activity {
            id: ActivityId::from("act-1"),
            state: ActivityState::Pending,
            created_at: None,
            completed_at: None,
        })
    }

    fn activity(&self, _project: &ProjectId, id: &ActivityId) -> Result<Activity, RemoteError> {
        Ok(Activity {
            id: id.clone(),
            state: ActivityState::Completed,
            created_at: None,
            completed_at: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// In-memory cache that counts invalidations.
#[derive(Default)]
pub struct CountingCache {
    inner: MemoryEnvironmentCache,
    pub invalidations: Cell<usize>,
}

impl EnvironmentCache for CountingCache {
    fn get(&self, project: &ProjectId) -> Option<Vec<Environment>> {
        self.inner.get(project)
    }

    fn put(&self, project: &ProjectId, environments: Vec<Environment>) {
        self.inner.put(project, environments);
    }

    fn invalidate(&self, project: &ProjectId) {
        self.invalidations.set(self.invalidations.get() + 1);
        self.inner.invalidate(project);
    }
}

// ---------------------------------------------------------------------------
// Version control
// ---------------------------------------------------------------------------

/// Records every call as a `git`-like line, e.g. `checkout -b sprint-2 develop`.
#[derive(Default)]
pub struct FakeVcs {
    pub branches: RefCell<BTreeSet<String>>,
    pub calls: RefCell<Vec<String>>,
    pub fail_checkout: Cell<bool>,
    /// The next `fetch` fails, later ones succeed.
    pub fail_next_fetch: Cell<bool>,
    /// Working-copy directory of every call, in call order.
    pub dirs: RefCell<Vec<PathBuf>>,
    /// Files (relative path, content) written under the destination on clone.
    pub clone_tree: Vec<(String, String)>,
    pub cloned_into: RefCell<Option<PathBuf>>,
}

impl FakeVcs {
    pub fn with_branches(branches: &[&str]) -> Self {
        Self {
            branches: RefCell::new(branches.iter().map(|b| b.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.starts_with(prefix))
    }

    fn record(&self, call: String, repo: &Path) {
        self.calls.borrow_mut().push(call);
        self.dirs.borrow_mut().push(repo.to_path_buf());
    }

    fn failure(&self, args: &str, repo: &Path) -> VcsError {
        VcsError::Failed {
            args: args.to_string(),
            dir: repo.to_path_buf(),
            status: "exit status: 1".to_string(),
            stderr: "simulated failure".to_string(),
        }
    }
}

impl VersionControl for FakeVcs {
    fn branch_exists(&self, branch: &str, repo: &Path) -> Result<bool, VcsError> {
        self.dirs.borrow_mut().push(repo.to_path_buf());
        Ok(self.branches.borrow().contains(branch))
    }

    fn check_out(&self, branch: &str, repo: &Path) -> Result<(), VcsError> {
        self.record(format!("checkout {branch}"), repo);
        if self.fail_checkout.get() {
            return Err(self.failure(&format!("checkout {branch}"), repo));
        }
        Ok(())
    }

    fn check_out_new(&self, branch: &str, base: Option<&str>, repo: &Path) -> Result<(), VcsError> {
        let call = match base {
            Some(base) => format!("checkout -b {branch} {base}"),
            None => format!("checkout -b {branch}"),
        };
        self.record(call.clone(), repo);
        if self.fail_checkout.get() {
            return Err(self.failure(&call, repo));
        }
        self.branches.borrow_mut().insert(branch.to_string());
        Ok(())
    }

    fn fetch(&self, remote: &str, branch: &str, repo: &Path) -> Result<(), VcsError> {
        let call = format!("fetch {remote} {branch}");
        self.record(call.clone(), repo);
        if self.fail_next_fetch.replace(false) {
            return Err(self.failure(&call, repo));
        }
        Ok(())
    }

    fn set_upstream(&self, upstream: &str, branch: &str, repo: &Path) -> Result<(), VcsError> {
        self.record(format!("branch --set-upstream-to={upstream} {branch}"), repo);
        Ok(())
    }

    fn reset_hard(&self, repo: &Path) -> Result<(), VcsError> {
        self.record("reset --hard".to_string(), repo);
        Ok(())
    }

    fn clone_repository(&self, url: &str, remote: &str, branch: &str, dest: &Path) -> Result<(), VcsError> {
        self.record(format!("clone --origin {remote} --branch {branch} {url}"), dest);
        fs::create_dir_all(dest.join(".git")).expect("create clone destination");
        for (rel, content) in &self.clone_tree {
            let path = dest.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create cloned dir");
            }
            fs::write(path, content).expect("write cloned file");
        }
        *self.cloned_into.borrow_mut() = Some(dest.to_path_buf());
        Ok(())
    }

    fn current_branch(&self, _repo: &Path) -> Result<Option<String>, VcsError> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Waiter
// ---------------------------------------------------------------------------

pub struct FakeWaiter {
    pub outcome: WaitOutcome,
    pub calls: Cell<usize>,
}

impl FakeWaiter {
    pub fn returning(outcome: WaitOutcome) -> Self {
        Self {
            outcome,
            calls: Cell::new(0),
        }
    }
}

impl ActivityWaiter for FakeWaiter {
    fn wait(&self, _project: &ProjectId, _activity: &Activity, _success: &str, _failure: &str) -> WaitOutcome {
        self.calls.set(self.calls.get() + 1);
        self.outcome.clone()
    }
}
