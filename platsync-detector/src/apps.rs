//! Local application discovery and selection.
//!
//! An application is any directory holding a `.platform.app.yaml`. Only the
//! fields the deploy flow reads are modelled; everything else in the file is
//! ignored.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{io_err, DetectError};

/// File that marks an application root.
pub const APP_CONFIG_FILE: &str = ".platform.app.yaml";

/// Build flavor handled by the deploy flow.
pub const DRUPAL_FLAVOR: &str = "drupal";

const MAX_DEPTH: usize = 3;
const SKIPPED_DIRS: &[&str] = &[".git", "www", "_www", "node_modules"];

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub flavor: Option<String>,
}

/// The subset of `.platform.app.yaml` this tool reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub runtime: Option<String>,
    #[serde(default)]
    pub build: BuildConfig,
}

/// A discovered application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: String,
    pub root: PathBuf,
    pub config: AppConfig,
}

impl Application {
    pub fn flavor(&self) -> Option<&str> {
        self.config.build.flavor.as_deref()
    }
}

/// Find every application under `root`, sorted by path.
///
/// An application without a `name` takes its directory name as id.
pub fn discover_applications(root: &Path) -> Result<Vec<Application>, DetectError> {
    if !root.is_dir() {
        return Ok(vec![]);
    }

    let mut apps = Vec::new();
    let walker = WalkDir::new(root)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !SKIPPED_DIRS.iter().any(|skip| e.file_name() == *skip)
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            io_err(path, e.into())
        })?;
        if !entry.file_type().is_file() || entry.file_name() != APP_CONFIG_FILE {
            continue;
        }
        let Some(app_root) = entry.path().parent() else { continue };
        apps.push(load_application(app_root)?);
    }

    tracing::debug!("discovered {} application(s) under {}", apps.len(), root.display());
    Ok(apps)
}

fn load_application(app_root: &Path) -> Result<Application, DetectError> {
    let path = app_root.join(APP_CONFIG_FILE);
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let config: AppConfig = if contents.trim().is_empty() {
        AppConfig::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|e| DetectError::AppConfig {
            path: path.clone(),
            source: e,
        })?
    };
    let id = config.name.clone().unwrap_or_else(|| {
        app_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    Ok(Application {
        id,
        root: app_root.to_path_buf(),
        config,
    })
}

/// Lazily select applications whose id is allowed and whose flavor matches.
///
/// An empty `allow` list admits every id. Discovery order is preserved.
pub fn filter_applications<'a, I>(
    apps: I,
    allow: &'a [String],
    flavor: &'a str,
) -> impl Iterator<Item = Application> + 'a
where
    I: IntoIterator<Item = Application>,
    I::IntoIter: 'a,
{
    apps.into_iter().filter(move |app| {
        (allow.is_empty() || allow.iter().any(|id| *id == app.id)) && app.flavor() == Some(flavor)
    })
}
