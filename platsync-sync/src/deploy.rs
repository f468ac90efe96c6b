//! Deploy orchestration: fetch a site on first run, resolve its layout, and
//! inspect every participating application.

use std::path::Path;

use platsync_core::{
    Config, EnvironmentCache, EnvironmentId, LocalProjectContext, Project,
};
use platsync_detector::layout::{candidate_root, ensure_working_dirs, is_first_run, resolve};
use platsync_detector::{
    discover_applications, filter_applications, profile, Application, DetectError, Layout,
    ProfileReference, Resolution, DRUPAL_FLAVOR,
};

use crate::checkout::checkout_branch;
use crate::error::SyncError;
use crate::options::{effective_options, DeployOptions, EffectiveOptions};
use crate::remote::{find_environment, RemoteApi};
use crate::vcs::VersionControl;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// One application's inspection.
#[derive(Debug)]
pub struct AppReport {
    pub application: Application,
    /// MySQL-safe database name for this project/application pair.
    pub database: String,
    pub profile: Result<Option<ProfileReference>, DetectError>,
}

/// Aggregate result of a deploy; per-application failures do not abort it.
#[derive(Debug)]
pub struct DeployReport {
    pub project: Project,
    pub environment: EnvironmentId,
    pub first_run: bool,
    pub context: LocalProjectContext,
    pub options: EffectiveOptions,
    pub applications: Vec<AppReport>,
}

impl DeployReport {
    pub fn failures(&self) -> impl Iterator<Item = &AppReport> {
        self.applications.iter().filter(|app| app.profile.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// Lowercase ASCII, runs of anything else collapsed to a single `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// `<project>_<app>` with every `-` turned into `_`.
///
/// The project part is the slugified title, or the raw id when untitled.
pub fn database_slug(project: &Project, app_id: &str) -> String {
    let project_part = if project.title.is_empty() {
        project.id.to_string()
    } else {
        slugify(&project.title)
    };
    format!("{}-{}", project_part, slugify(app_id)).replace('-', "_")
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives a deploy invocation against the injected collaborators.
pub struct DeployOrchestrator<'a> {
    pub api: &'a dyn RemoteApi,
    pub cache: &'a dyn EnvironmentCache,
    pub vcs: &'a dyn VersionControl,
    pub config: &'a Config,
}

impl DeployOrchestrator<'_> {
    pub fn run(&self, project: &Project, options: &DeployOptions) -> Result<DeployReport, SyncError> {
        tracing::info!("deployment started for {} ({})", project.label(), project.id);
        ensure_working_dirs(&self.config.profiles_root, &self.config.sites_root)?;

        let environment = options
            .environment
            .clone()
            .unwrap_or_else(|| EnvironmentId::from(self.config.default_branch.as_str()));

        let site_code = if options.directory.is_some() {
            None
        } else if self.config.site_code_variable.trim().is_empty() {
            return Err(SyncError::Configuration(
                "no site_code_variable configured and no --directory given".to_string(),
            ));
        } else {
            self.site_code(project, &environment, options.environment.is_some())?
        };
        let root = candidate_root(
            options.directory.as_deref(),
            &self.config.sites_root,
            site_code.as_deref(),
        )
        .map_err(|e| match e {
            DetectError::Configuration(msg) => SyncError::Configuration(msg),
            other => SyncError::Detect(other),
        })?;
        let site_code = site_code.unwrap_or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let first_run = is_first_run(&root);
        if first_run {
            self.fetch_site(project, &root, options.environment.as_ref())?;
        }
        let effective = effective_options(options, first_run);
        if effective.db_sync_implicit {
            tracing::info!("first deployment: database sync enabled");
        }

        let context = match resolve(&root, &site_code) {
            Resolution::Resolved(context) => context,
            Resolution::NotMaterialized { root } => {
                return Err(SyncError::Configuration(format!(
                    "{} has no www or _www directory",
                    root.display()
                )))
            }
        };
        tracing::debug!(
            "root {} (legacy: {}), repository {}, site {}",
            context.root_dir().display(),
            context.legacy(),
            context.repository_dir().display(),
            context.site_dir().display()
        );

        let discovered = discover_applications(context.repository_dir())?;
        let applications = filter_applications(discovered, &options.apps, DRUPAL_FLAVOR)
            .map(|application| {
                let profile = profile::inspect(&application.root);
                if let Err(err) = &profile {
                    tracing::warn!("skipping profile detection for {}: {err}", application.id);
                }
                AppReport {
                    database: database_slug(project, &application.id),
                    application,
                    profile,
                }
            })
            .collect();

        Ok(DeployReport {
            project: project.clone(),
            environment,
            first_run,
            context,
            options: effective,
            applications,
        })
    }

    /// The internal site code stored in the environment's variables.
    fn site_code(
        &self,
        project: &Project,
        environment: &EnvironmentId,
        requested: bool,
    ) -> Result<Option<String>, SyncError> {
        let variable = &self.config.site_code_variable;
        match find_environment(self.api, self.cache, &project.id, environment)? {
            Some(env) => Ok(env
                .variables
                .get(variable)
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty())),
            None if requested => Err(SyncError::Usage(format!(
                "environment '{environment}' not found in project {}",
                project.id
            ))),
            None => {
                tracing::warn!("default environment '{environment}' not found; no {variable} available");
                Ok(None)
            }
        }
    }

    /// First-time fetch of the default branch into `root`.
    ///
    /// The site dir is created last, so a run that fails part-way is still a
    /// first run next time; a clone left behind by such a run is reused.
    fn fetch_site(
        &self,
        project: &Project,
        root: &Path,
        environment: Option<&EnvironmentId>,
    ) -> Result<(), SyncError> {
        tracing::info!("fetching {} ({}) for the first time", project.label(), project.id);
        let remote = &self.config.git_remote_name;
        if root.join(".git").exists() {
            tracing::info!("reusing the existing clone at {}", root.display());
        } else {
            let url = project.repository_url.as_deref().ok_or_else(|| {
                SyncError::Configuration(format!("project {} has no repository URL", project.id))
            })?;
            self.vcs
                .clone_repository(url, remote, &self.config.default_branch, root)?;
        }

        let layout = Layout::detect(root);
        if let Some(environment) = environment {
            let repo = layout.repository_dir(root);
            self.vcs.reset_hard(&repo)?;
            checkout_branch(self.vcs, remote, environment, &repo).map_err(|source| {
                SyncError::LocalSync {
                    action: "check out",
                    branch: environment.to_string(),
                    source,
                }
            })?;
        }

        let site_dir = match layout {
            Layout::Legacy => root.join("www"),
            Layout::Modern => root.join("_www"),
        };
        std::fs::create_dir_all(&site_dir)
            .map_err(|e| DetectError::Io { path: site_dir.clone(), source: e })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platsync_core::ProjectId;

    fn project(id: &str, title: &str) -> Project {
        Project {
            id: ProjectId::from(id),
            title: title.to_string(),
            host: String::new(),
            repository_url: None,
        }
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("ACME Corp. -- Main Site!"), "acme-corp-main-site");
        assert_eq!(slugify("  "), "");
    }

    #[test]
    fn database_slug_uses_title() {
        assert_eq!(database_slug(&project("abc123", "Acme Intranet"), "main-app"), "acme_intranet_main_app");
    }

    #[test]
    fn database_slug_falls_back_to_raw_id() {
        assert_eq!(database_slug(&project("abc-123", ""), "Web"), "abc_123_web");
    }
}
