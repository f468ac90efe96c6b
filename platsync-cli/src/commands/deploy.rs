//! `platsync deploy`: deploy a site locally.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use platsync_core::EnvironmentId;
use platsync_sync::{AppReport, DeployOptions, DeployOrchestrator, DeployReport};

use super::{step, Session};
use crate::selection;

/// Arguments for `platsync deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Project ID.
    #[arg(short, long)]
    pub project: Option<String>,

    /// Environment to deploy; defaults to the configured default branch.
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Only deploy these applications (repeatable).
    #[arg(long = "app", value_name = "APP")]
    pub apps: Vec<String>,

    /// Sync the database from the latest backup.
    #[arg(short, long)]
    pub db_sync: bool,

    /// Skip database sanitization.
    #[arg(short = 'S', long)]
    pub no_sanitize: bool,

    /// Deploy into this directory instead of `<sites_root>/<site code>`.
    #[arg(long)]
    pub directory: Option<PathBuf>,
}

impl DeployArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::load()?;
        let config = &session.config;
        let project_id = selection::project_id(self.project, config, selection::env_lookup)?;
        let options = DeployOptions {
            environment: self.environment.map(EnvironmentId),
            apps: selection::app_ids(self.apps, config, selection::env_lookup),
            db_sync: self.db_sync,
            sanitize: !self.no_sanitize,
            directory: self.directory,
        };

        let api = session.api();
        let cache = session.cache();
        let vcs = session.git();
        let project = session.project(&api, &project_id)?;
        step(format!(
            "deployment started for {} ({})",
            project.label().cyan(),
            project.id
        ));

        let orchestrator = DeployOrchestrator {
            api: &api,
            cache: &cache,
            vcs: &vcs,
            config,
        };
        let report = orchestrator.run(&project, &options)?;
        print_report(&report);

        let failed = report.failures().count();
        if failed > 0 {
            bail!("profile inspection failed for {failed} application(s)");
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "app")]
    app: String,
    #[tabled(rename = "database")]
    database: String,
    #[tabled(rename = "profile")]
    profile: String,
    #[tabled(rename = "source")]
    source: String,
}

fn app_row(app: &AppReport) -> AppRow {
    let (profile, source) = match &app.profile {
        Ok(Some(p)) => (
            p.name.clone(),
            format!("{} {}", p.download_type, p.location.as_deref().unwrap_or("-")),
        ),
        Ok(None) => ("-".to_string(), "-".to_string()),
        Err(err) => ("error".red().to_string(), err.to_string()),
    };
    AppRow {
        app: app.application.id.clone(),
        database: app.database.clone(),
        profile,
        source,
    }
}

fn print_report(report: &DeployReport) {
    let ctx = &report.context;
    if report.first_run {
        step(format!("fetched {} for the first time", report.project.label()));
    }
    step(format!(
        "{} at {} ({} layout)",
        report.environment.to_string().cyan(),
        ctx.root_dir().display(),
        if ctx.legacy() { "legacy" } else { "modern" }
    ));
    if report.options.db_sync {
        let note = if report.options.db_sync_implicit { " (first deployment)" } else { "" };
        let sanitize = if report.options.sanitize { "sanitized" } else { "not sanitized" };
        step(format!("database sync enabled{note}, {sanitize}"));
    }

    if report.applications.is_empty() {
        println!("No Drupal applications found.");
        return;
    }
    let rows: Vec<AppRow> = report.applications.iter().map(app_row).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
