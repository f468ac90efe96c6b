//! Version-control collaborator and its `git` subprocess implementation.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`git {args}` failed in {dir} ({status}): {stderr}")]
    Failed {
        args: String,
        dir: PathBuf,
        status: String,
        stderr: String,
    },
}

/// Blocking version-control operations on a working copy at `repo`.
pub trait VersionControl {
    fn branch_exists(&self, branch: &str, repo: &Path) -> Result<bool, VcsError>;
    fn check_out(&self, branch: &str, repo: &Path) -> Result<(), VcsError>;
    /// Create and switch to `branch`, starting at `base` or at `HEAD` when `None`.
    fn check_out_new(&self, branch: &str, base: Option<&str>, repo: &Path) -> Result<(), VcsError>;
    fn fetch(&self, remote: &str, branch: &str, repo: &Path) -> Result<(), VcsError>;
    /// Make `branch` track `upstream` (e.g. `platform/sprint-2`).
    fn set_upstream(&self, upstream: &str, branch: &str, repo: &Path) -> Result<(), VcsError>;
    fn reset_hard(&self, repo: &Path) -> Result<(), VcsError>;
    /// Clone `url` at `branch` into `dest`, naming the remote `remote`.
    fn clone_repository(&self, url: &str, remote: &str, branch: &str, dest: &Path) -> Result<(), VcsError>;
    /// Checked-out branch, or `None` on a detached `HEAD`.
    fn current_branch(&self, repo: &Path) -> Result<Option<String>, VcsError>;
}

/// Runs the `git` executable.
#[derive(Debug, Clone)]
pub struct Git {
    program: String,
    ssh_command: Option<String>,
}

impl Default for Git {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            ssh_command: None,
        }
    }
}

impl Git {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exported as `GIT_SSH_COMMAND` for every invocation.
    pub fn with_ssh_command(mut self, command: impl Into<String>) -> Self {
        self.ssh_command = Some(command.into());
        self
    }

    fn output(&self, args: &[&str], dir: &Path) -> Result<Output, VcsError> {
        tracing::debug!("git {} (in {})", args.join(" "), dir.display());
        let mut cmd = Command::new(&self.program);
        cmd.args(args).current_dir(dir);
        if let Some(ssh) = &self.ssh_command {
            cmd.env("GIT_SSH_COMMAND", ssh);
        }
        cmd.output().map_err(|source| VcsError::Spawn {
            program: self.program.clone(),
            source,
        })
    }

    fn run(&self, args: &[&str], dir: &Path) -> Result<String, VcsError> {
        let output = self.output(args, dir)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(failed(args, dir, &output))
        }
    }
}

fn failed(args: &[&str], dir: &Path, output: &Output) -> VcsError {
    VcsError::Failed {
        args: args.join(" "),
        dir: dir.to_path_buf(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

impl VersionControl for Git {
    fn branch_exists(&self, branch: &str, repo: &Path) -> Result<bool, VcsError> {
        let reference = format!("refs/heads/{branch}");
        let args = ["show-ref", "--verify", "--quiet", reference.as_str()];
        let output = self.output(&args, repo)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(failed(&args, repo, &output)),
        }
    }

    fn check_out(&self, branch: &str, repo: &Path) -> Result<(), VcsError> {
        self.run(&["checkout", branch], repo).map(drop)
    }

    fn check_out_new(&self, branch: &str, base: Option<&str>, repo: &Path) -> Result<(), VcsError> {
        let mut args = vec!["checkout", "-b", branch];
        if let Some(base) = base {
            args.push(base);
        }
        self.run(&args, repo).map(drop)
    }

    fn fetch(&self, remote: &str, branch: &str, repo: &Path) -> Result<(), VcsError> {
        self.run(&["fetch", remote, branch], repo).map(drop)
    }

    fn set_upstream(&self, upstream: &str, branch: &str, repo: &Path) -> Result<(), VcsError> {
        let flag = format!("--set-upstream-to={upstream}");
        self.run(&["branch", flag.as_str(), branch], repo).map(drop)
    }

    fn reset_hard(&self, repo: &Path) -> Result<(), VcsError> {
        self.run(&["reset", "--hard"], repo).map(drop)
    }

    fn clone_repository(&self, url: &str, remote: &str, branch: &str, dest: &Path) -> Result<(), VcsError> {
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        let dest_arg = dest.to_string_lossy();
        self.run(
            &["clone", "--origin", remote, "--branch", branch, url, dest_arg.as_ref()],
            parent,
        )
        .map(drop)
    }

    fn current_branch(&self, repo: &Path) -> Result<Option<String>, VcsError> {
        let name = self.run(&["rev-parse", "--abbrev-ref", "HEAD"], repo)?;
        Ok(if name.is_empty() || name == "HEAD" { None } else { Some(name) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_program_is_spawn_error() {
        let git = Git {
            program: "definitely-not-a-git-binary".to_string(),
            ssh_command: None,
        };
        let dir = TempDir::new().unwrap();
        let err = git.reset_hard(dir.path()).unwrap_err();
        assert!(matches!(err, VcsError::Spawn { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn ssh_command_is_exported_to_the_subprocess() {
        let dir = TempDir::new().unwrap();
        let git = Git {
            program: "printenv".to_string(),
            ssh_command: None,
        }
        .with_ssh_command("ssh -i /keys/deploy");
        let out = git.run(&["GIT_SSH_COMMAND"], dir.path()).unwrap();
        assert_eq!(out, "ssh -i /keys/deploy");
    }

    #[test]
    fn failed_error_names_command_and_dir() {
        let err = VcsError::Failed {
            args: "checkout sprint-2".to_string(),
            dir: PathBuf::from("/srv/site"),
            status: "exit status: 1".to_string(),
            stderr: "pathspec did not match".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("git checkout sprint-2"));
        assert!(msg.contains("/srv/site"));
    }
}
