//! Deploy switches and the first-run derivation layer.

use std::path::PathBuf;

use platsync_core::EnvironmentId;

/// Switches the caller passes to a deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    /// Environment to deploy; the configured default branch when `None`.
    pub environment: Option<EnvironmentId>,
    /// Application ids to deploy; empty means all.
    pub apps: Vec<String>,
    pub db_sync: bool,
    pub sanitize: bool,
    /// Deploy root overriding `<sites_root>/<site_code>`.
    pub directory: Option<PathBuf>,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            environment: None,
            apps: Vec::new(),
            db_sync: false,
            sanitize: true,
            directory: None,
        }
    }
}

/// Options actually in effect for one deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveOptions {
    pub db_sync: bool,
    pub sanitize: bool,
    /// `db_sync` was switched on by the first run, not by the caller.
    pub db_sync_implicit: bool,
}

/// Derive the effective options. A first run always syncs the database.
pub fn effective_options(explicit: &DeployOptions, first_run: bool) -> EffectiveOptions {
    EffectiveOptions {
        db_sync: explicit.db_sync || first_run,
        sanitize: explicit.sanitize,
        db_sync_implicit: first_run && !explicit.db_sync,
    }
}
