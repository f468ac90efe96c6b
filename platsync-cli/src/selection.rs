//! Project, environment, and root selection from flags, environment
//! variables, and the working directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use platsync_core::{Config, EnvironmentId, ProjectId};
use platsync_detector::{find_project_root, Layout};
use platsync_sync::VersionControl;

/// `--project`, else `<prefix>PROJECT` as returned by `lookup`.
pub fn project_id(
    flag: Option<String>,
    config: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ProjectId> {
    if let Some(id) = flag.filter(|id| !id.is_empty()) {
        return Ok(ProjectId(id));
    }
    let var = config.env_var("PROJECT");
    match lookup(&var).filter(|id| !id.is_empty()) {
        Some(id) => {
            tracing::info!("project id read from environment variable {var}: {id}");
            Ok(ProjectId(id))
        }
        None => bail!("no project specified: use --project or set {var}"),
    }
}

/// The environment named by a positional argument or `--environment`, not both.
pub fn environment_arg(
    argument: Option<String>,
    option: Option<String>,
    argument_name: &str,
) -> Result<Option<EnvironmentId>> {
    match (argument, option) {
        (Some(_), Some(_)) => bail!(
            "you cannot use both the <{argument_name}> argument and the --environment option"
        ),
        (Some(id), None) | (None, Some(id)) => Ok(Some(EnvironmentId(id))),
        (None, None) => Ok(None),
    }
}

/// `--app` values, else `<prefix>APPLICATION_NAME`.
pub fn app_ids(
    flags: Vec<String>,
    config: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<String> {
    if !flags.is_empty() {
        return flags;
    }
    lookup(&config.env_var("APPLICATION_NAME"))
        .filter(|app| !app.is_empty())
        .into_iter()
        .collect()
}

/// Local project root containing the working directory, if any.
pub fn project_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_project_root(&cwd)
}

/// The environment checked out in `root`'s working copy.
pub fn current_environment(vcs: &dyn VersionControl, root: &Path) -> Option<EnvironmentId> {
    let repo = Layout::detect(root).repository_dir(root);
    match vcs.current_branch(&repo) {
        Ok(branch) => branch.map(EnvironmentId),
        Err(err) => {
            tracing::debug!("no current branch in {}: {err}", repo.display());
            None
        }
    }
}

/// Reads the process environment.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn project_flag_wins_over_environment() {
        let config = Config::default();
        let id = project_id(Some("abc".into()), &config, |_| Some("xyz".into())).unwrap();
        assert_eq!(id, ProjectId::from("abc"));
    }

    #[test]
    fn project_falls_back_to_prefixed_variable() {
        let config = Config::default();
        let id = project_id(None, &config, |name| {
            (name == "PLATSYNC_PROJECT").then(|| "xyz".to_string())
        })
        .unwrap();
        assert_eq!(id, ProjectId::from("xyz"));
    }

    #[test]
    fn missing_project_is_an_error() {
        let err = project_id(None, &Config::default(), no_env).unwrap_err();
        assert!(err.to_string().contains("PLATSYNC_PROJECT"));
    }

    #[test]
    fn argument_and_option_conflict() {
        assert!(environment_arg(Some("a".into()), Some("b".into()), "parent").is_err());
        assert_eq!(
            environment_arg(None, Some("b".into()), "parent").unwrap(),
            Some(EnvironmentId::from("b"))
        );
        assert_eq!(environment_arg(None, None, "parent").unwrap(), None);
    }

    #[test]
    fn app_ids_from_variable_only_without_flags() {
        let config = Config::default();
        let env = |name: &str| (name == "PLATSYNC_APPLICATION_NAME").then(|| "web".to_string());
        assert_eq!(app_ids(vec![], &config, env), vec!["web".to_string()]);
        assert_eq!(app_ids(vec!["api".into()], &config, env), vec!["api".to_string()]);
        assert!(app_ids(vec![], &config, no_env).is_empty());
    }
}
