//! `platsync branch`: create a new environment and mirror it locally.

use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;

use platsync_core::EnvironmentId;
use platsync_sync::{
    find_environment, Answer, BranchOptions, BranchOrchestrator, BranchOutcome, CheckoutResult,
    Confirm, LocalSync, PollingWaiter, Selection,
};

use super::{interactive, print_environments, step, Prompt, Session};
use crate::selection;

/// Arguments for `platsync branch`.
#[derive(Args, Debug)]
pub struct BranchArgs {
    /// ID (branch name) of the new environment.
    pub id: Option<String>,

    /// Parent of the new environment; defaults to the current branch.
    pub parent: Option<String>,

    /// Parent environment, as an option.
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Project ID.
    #[arg(short, long)]
    pub project: Option<String>,

    /// Title of the new environment.
    #[arg(long)]
    pub title: Option<String>,

    /// Create the environment even if the branch cannot be checked out locally.
    #[arg(long)]
    pub force: bool,

    /// Do not clone the parent's data.
    #[arg(long)]
    pub no_clone_parent: bool,

    /// Do not wait for the environment to be created.
    #[arg(short = 'W', long)]
    pub no_wait: bool,

    /// Answer yes to confirmation questions.
    #[arg(short, long)]
    pub yes: bool,
}

impl BranchArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::load()?;
        let config = &session.config;
        let project_id = selection::project_id(self.project, config, selection::env_lookup)?;
        let parent_arg = selection::environment_arg(self.parent, self.environment, "parent")?;
        let root = selection::project_root();

        let vcs = session.git();
        let parent_id = parent_arg
            .or_else(|| root.as_deref().and_then(|r| selection::current_environment(&vcs, r)))
            .ok_or_else(|| anyhow!("could not determine the parent environment: specify it"))?;

        let api = session.api();
        let cache = session.cache();
        let project = session.project(&api, &project_id)?;
        let parent = find_environment(&api, &cache, &project_id, &parent_id)?
            .ok_or_else(|| anyhow!("environment '{parent_id}' not found in project {project_id}"))?;

        let is_interactive = interactive();
        let prompt = Prompt;
        let always = Answer(true);
        let confirm: &dyn Confirm = if is_interactive && !self.yes { &prompt } else { &always };
        let waiter = PollingWaiter::new(&api, config.wait_timeout(), config.poll_interval());

        let orchestrator = BranchOrchestrator {
            api: &api,
            cache: &cache,
            vcs: &vcs,
            waiter: &waiter,
            confirm,
            remote_name: &config.git_remote_name,
            service_name: &config.service_name,
            executable: &config.executable,
        };
        let selected = Selection {
            project: &project,
            parent: &parent,
            project_root: root.as_deref(),
            interactive: is_interactive,
        };
        let options = BranchOptions {
            title: self.title,
            clone_parent_data: !self.no_clone_parent,
            force: self.force,
            wait: !self.no_wait,
        };

        match orchestrator.run(&selected, self.id.map(EnvironmentId), &options)? {
            BranchOutcome::Listed(environments) => {
                eprintln!("Enter a branch name to create a new environment. Existing environments:");
                print_environments(&environments);
            }
            BranchOutcome::CheckedOutExisting { environment, checkout } => {
                let how = match checkout {
                    CheckoutResult::Existing => "existing local branch".to_string(),
                    CheckoutResult::Tracking { upstream } => format!("tracking {upstream}"),
                };
                step(format!("checked out {} ({how})", environment.to_string().cyan()));
            }
            BranchOutcome::Created { request, local, wait, tracking } => {
                step(format!(
                    "environment {} branched from {}",
                    request.id.to_string().cyan(),
                    request.parent_id.to_string().cyan()
                ));
                match local {
                    LocalSync::Skipped => eprintln!(
                        "{} the new {} branch was not checked out locally: run '{} checkout {}' inside the project root",
                        "warning:".yellow(),
                        config.service_name,
                        config.executable,
                        request.id
                    ),
                    LocalSync::Failed { reason } => {
                        eprintln!("{} local branch not created: {reason}", "warning:".yellow())
                    }
                    LocalSync::CheckedOut | LocalSync::Created { .. } => {}
                }
                if wait.is_none() {
                    step("not waiting for the activity to complete");
                }
                if let Some(upstream) = tracking {
                    step(format!("{} now tracks {upstream}", request.id));
                }
            }
        }
        Ok(())
    }
}
