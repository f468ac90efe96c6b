//! On-disk project layout.
//!
//! A deployed site lives at `<sites_root>/<internal_site_code>` in one of two
//! conventions:
//!
//! ```text
//! legacy                      modern
//! <root>/                     <root>/          (git working copy)
//!   repository/  (git)          .platform/
//!   www/         (web root)     _www/          (web root)
//! ```
//!
//! A root with neither `www` nor `_www` has never been materialized.

use std::path::{Path, PathBuf};

use platsync_core::LocalProjectContext;

use crate::error::{io_err, DetectError};

/// Which on-disk convention a project root follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Legacy,
    Modern,
}

impl Layout {
    /// Legacy iff `root/repository` is a directory. Pure apart from the stat.
    pub fn detect(root: &Path) -> Self {
        if root.join("repository").is_dir() {
            Layout::Legacy
        } else {
            Layout::Modern
        }
    }

    /// The git working copy for `root` under this layout.
    pub fn repository_dir(self, root: &Path) -> PathBuf {
        match self {
            Layout::Legacy => root.join("repository"),
            Layout::Modern => root.to_path_buf(),
        }
    }
}

/// Result of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Neither `www` nor `_www` exists; the caller must fetch the project first.
    NotMaterialized { root: PathBuf },
    Resolved(LocalProjectContext),
}

/// True iff neither `root/www` nor `root/_www` is a directory.
///
/// Reads only the filesystem, so repeated calls agree until something on
/// disk changes.
pub fn is_first_run(root: &Path) -> bool {
    !root.join("www").is_dir() && !root.join("_www").is_dir()
}

/// Create the profiles root and the sites root if absent. Idempotent.
pub fn ensure_working_dirs(profiles_root: &Path, sites_root: &Path) -> Result<(), DetectError> {
    for dir in [profiles_root, sites_root] {
        if !dir.is_dir() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
            tracing::debug!("created {}", dir.display());
        }
    }
    Ok(())
}

/// The root a project is (or will be) deployed to.
///
/// An explicit directory always wins; otherwise the root is
/// `<sites_root>/<site_code>`. With neither, returns
/// `DetectError::Configuration`.
pub fn candidate_root(
    explicit: Option<&Path>,
    sites_root: &Path,
    site_code: Option<&str>,
) -> Result<PathBuf, DetectError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    match site_code {
        Some(code) if !code.trim().is_empty() => Ok(sites_root.join(code)),
        _ => Err(DetectError::Configuration(
            "no directory given and no internal site code available".to_string(),
        )),
    }
}

/// Determine the layout of `root` and build the full context.
pub fn resolve(root: &Path, internal_site_code: &str) -> Resolution {
    if is_first_run(root) {
        return Resolution::NotMaterialized {
            root: root.to_path_buf(),
        };
    }
    let legacy = Layout::detect(root) == Layout::Legacy;
    Resolution::Resolved(LocalProjectContext::new(root, legacy, internal_site_code))
}

/// Walk up from `start` to the nearest project root.
///
/// The first ancestor holding a `.platform/` directory is the working copy.
/// When that directory is a legacy `repository/` whose parent has `www/`,
/// the parent is the root.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let found = start.ancestors().find(|dir| dir.join(".platform").is_dir())?;
    if found.file_name().is_some_and(|name| name == "repository") {
        if let Some(parent) = found.parent() {
            if parent.join("www").is_dir() {
                return Some(parent.to_path_buf());
            }
        }
    }
    Some(found.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_root_is_first_run() {
        let dir = TempDir::new().unwrap();
        assert!(is_first_run(dir.path()));
        assert!(is_first_run(dir.path()), "repeated calls must agree");
    }

    #[test]
    fn www_file_is_not_a_web_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("www"), "not a dir").unwrap();
        assert!(is_first_run(dir.path()));
    }

    #[test]
    fn missing_root_is_first_run() {
        let dir = TempDir::new().unwrap();
        assert!(is_first_run(&dir.path().join("never-created")));
    }

    #[test]
    fn candidate_root_prefers_explicit() {
        let root = candidate_root(Some(Path::new("/tmp/x")), Path::new("/sites"), Some("acme"))
            .expect("root");
        assert_eq!(root, PathBuf::from("/tmp/x"));
    }

    #[test]
    fn candidate_root_without_inputs_is_configuration_error() {
        let err = candidate_root(None, Path::new("/sites"), None).unwrap_err();
        assert!(matches!(err, DetectError::Configuration(_)));
        let err = candidate_root(None, Path::new("/sites"), Some("  ")).unwrap_err();
        assert!(matches!(err, DetectError::Configuration(_)));
    }

    #[test]
    fn ensure_working_dirs_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let profiles = dir.path().join("profiles");
        let sites = dir.path().join("sites");
        ensure_working_dirs(&profiles, &sites).expect("first");
        ensure_working_dirs(&profiles, &sites).expect("second");
        assert!(profiles.is_dir());
        assert!(sites.is_dir());
    }

    #[test]
    fn legacy_repository_resolves_to_parent_root() {
        let dir = TempDir::new().unwrap();
        let repo = dir.path().join("repository");
        fs::create_dir_all(repo.join(".platform")).unwrap();
        fs::create_dir_all(dir.path().join("www")).unwrap();
        fs::create_dir_all(repo.join("sites/default")).unwrap();

        let root = find_project_root(&repo.join("sites/default")).expect("root");
        assert_eq!(root, dir.path());
    }

    #[test]
    fn no_platform_dir_means_no_root() {
        let dir = TempDir::new().unwrap();
        assert!(find_project_root(dir.path()).is_none());
    }
}
