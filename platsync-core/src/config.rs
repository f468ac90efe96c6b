//! User configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.platsync/
//!   config.yaml           (optional: defaults apply when absent)
//!   cache/
//!     <project_id>.json   (environment-list cache)
//! ```
//!
//! # API pattern
//!
//! Loaders take an explicit home (`fn_at(home: &Path, …)`) so tests can use
//! a `TempDir`; callers resolve the real one once with [`home`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.platsync/`: pure, no I/O.
pub fn platsync_dir_at(home: &Path) -> PathBuf {
    home.join(".platsync")
}

/// `<home>/.platsync/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    platsync_dir_at(home).join("config.yaml")
}

/// `<home>/.platsync/cache/`: pure, no I/O.
pub fn cache_dir_at(home: &Path) -> PathBuf {
    platsync_dir_at(home).join("cache")
}

/// Replace a leading `~` with `home`. Other paths are returned unchanged.
pub fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// 2. Config
// ---------------------------------------------------------------------------

/// Read-only settings consumed by the orchestrators and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the hosting platform API.
    pub api_url: String,
    /// Name of the git remote that points at the platform.
    pub git_remote_name: String,
    /// Branch fetched on a project's first deployment.
    pub default_branch: String,
    /// Where shared install profiles are checked out.
    pub profiles_root: PathBuf,
    /// Parent directory of every deployed site root.
    pub sites_root: PathBuf,
    /// Environment variable holding a project's internal site code.
    pub site_code_variable: String,
    pub wait_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub cache_ttl_secs: u64,
    /// Prefix for `PROJECT`, `APPLICATION_NAME`, `API_TOKEN`, `API_URL`.
    pub env_prefix: String,
    /// Display name of the hosting platform, used in user-facing hints.
    pub service_name: String,
    /// Name this tool is invoked as, used in "run `<executable> checkout`" hints.
    pub executable: String,
    /// Exported as `GIT_SSH_COMMAND` for every git invocation when set.
    pub ssh_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://api.platform.sh".to_string(),
            git_remote_name: "platform".to_string(),
            default_branch: "master".to_string(),
            profiles_root: PathBuf::from("~/profiles"),
            sites_root: PathBuf::from("~/sites"),
            site_code_variable: "internal_site_code".to_string(),
            wait_timeout_secs: 3600,
            poll_interval_secs: 2,
            cache_ttl_secs: 600,
            env_prefix: "PLATSYNC_".to_string(),
            service_name: "Platform.sh".to_string(),
            executable: "platsync".to_string(),
            ssh_command: None,
        }
    }
}

impl Config {
    /// Load `<home>/.platsync/config.yaml` and expand `~` in path settings.
    ///
    /// A missing file yields [`Config::default`]; malformed YAML returns
    /// `CoreError::Parse` with path + line context.
    pub fn load_at(home: &Path) -> Result<Self, CoreError> {
        let path = config_path_at(home);
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            if contents.trim().is_empty() {
                Config::default()
            } else {
                serde_yaml::from_str(&contents)
                    .map_err(|e| CoreError::Parse { path, source: e })?
            }
        } else {
            Config::default()
        };
        config.profiles_root = expand_tilde(&config.profiles_root, home);
        config.sites_root = expand_tilde(&config.sites_root, home);
        Ok(config)
    }

    /// Name of a prefixed environment variable, e.g. `PLATSYNC_PROJECT`.
    pub fn env_var(&self, name: &str) -> String {
        format!("{}{}", self.env_prefix, name)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

/// Home directory as reported by `dirs::home_dir()`.
pub fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
