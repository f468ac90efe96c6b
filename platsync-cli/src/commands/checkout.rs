//! `platsync checkout`: switch the local working copy to an environment.

use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;

use platsync_core::EnvironmentId;
use platsync_detector::Layout;
use platsync_sync::{checkout_environment, CheckoutResult};

use super::{step, Session};
use crate::selection;

/// Arguments for `platsync checkout`.
#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Environment (branch) to check out.
    pub id: Option<String>,

    /// Project ID.
    #[arg(short, long)]
    pub project: Option<String>,
}

impl CheckoutArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::load()?;
        let config = &session.config;
        let project_id = selection::project_id(self.project, config, selection::env_lookup)?;
        let id = self
            .id
            .map(EnvironmentId)
            .ok_or_else(|| anyhow!("you must specify the environment to check out"))?;
        let root = selection::project_root()
            .ok_or_else(|| anyhow!("you must run this command inside a local project root"))?;
        let repo = Layout::detect(&root).repository_dir(&root);

        let api = session.api();
        let cache = session.cache();
        let result = checkout_environment(
            &api,
            &cache,
            &session.git(),
            &config.git_remote_name,
            &project_id,
            &id,
            &repo,
        )?;
        match result {
            CheckoutResult::Existing => step(format!("checked out {}", id.to_string().cyan())),
            CheckoutResult::Tracking { upstream } => step(format!(
                "created {} tracking {upstream}",
                id.to_string().cyan()
            )),
        }
        Ok(())
    }
}
