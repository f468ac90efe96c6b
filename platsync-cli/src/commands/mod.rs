pub mod branch;
pub mod checkout;
pub mod deploy;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use platsync_core::{config, Config, Environment, FileEnvironmentCache, Project, ProjectId};
use platsync_sync::{Confirm, Git, RemoteApi};
use tabled::{settings::Style, Table, Tabled};

use crate::http::HttpApi;

/// Config, API client, and cache shared by every command.
pub struct Session {
    pub home: PathBuf,
    pub config: Config,
}

impl Session {
    pub fn load() -> Result<Self> {
        let home = config::home().context("could not determine home directory")?;
        let config = Config::load_at(&home).context("failed to load ~/.platsync/config.yaml")?;
        Ok(Self { home, config })
    }

    pub fn api(&self) -> HttpApi {
        HttpApi::from_config(&self.config)
    }

    /// `git`, with the configured SSH command if any.
    pub fn git(&self) -> Git {
        match &self.config.ssh_command {
            Some(ssh) => Git::new().with_ssh_command(ssh),
            None => Git::new(),
        }
    }

    pub fn cache(&self) -> FileEnvironmentCache {
        FileEnvironmentCache::new(&self.home, self.config.cache_ttl())
    }

    pub fn project(&self, api: &dyn RemoteApi, id: &ProjectId) -> Result<Project> {
        api.project(id)
            .with_context(|| format!("failed to load project {id}"))
    }
}

/// Both stdin and stderr attached to a terminal.
pub fn interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Asks on stderr and reads the answer from stdin. Empty input means yes.
pub struct Prompt;

impl Confirm for Prompt {
    fn confirm(&self, question: &str) -> bool {
        eprint!("{question} {} ", "[Y/n]".bright_black());
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
    }
}

/// Progress line on stderr.
pub fn step(message: impl std::fmt::Display) {
    eprintln!("{} {message}", "[*]".green());
}

#[derive(Tabled)]
struct EnvironmentRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "title")]
    title: String,
    #[tabled(rename = "parent")]
    parent: String,
}

pub fn print_environments(environments: &[Environment]) {
    if environments.is_empty() {
        println!("No environments found.");
        return;
    }
    let rows: Vec<EnvironmentRow> = environments
        .iter()
        .map(|env| EnvironmentRow {
            id: env.id.to_string(),
            title: env.title.clone(),
            parent: env
                .parent
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
