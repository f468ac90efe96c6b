//! Install-profile detection from an application's `project.make`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{io_err, DetectError};
use crate::make::{self, MakeTable, MakeValue};

/// Manifest file looked up in every application root.
pub const MAKE_FILE: &str = "project.make";

/// How a profile is downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadType {
    Git,
    Copy,
}

impl DownloadType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "git" => Some(DownloadType::Git),
            "copy" => Some(DownloadType::Copy),
            _ => None,
        }
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadType::Git => write!(f, "git"),
            DownloadType::Copy => write!(f, "copy"),
        }
    }
}

/// The profile an application is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileReference {
    /// Logical project name from the manifest key.
    pub name: String,
    pub download_type: DownloadType,
    /// The `url` download attribute, when present.
    pub location: Option<String>,
    /// Remaining scalar download attributes (`branch`, `tag`, `revision`, …).
    pub attributes: BTreeMap<String, String>,
}

/// Inspect `<app_root>/project.make` for a profile dependency.
///
/// Returns `Ok(None)` when there is no manifest or no matching entry;
/// malformed content returns `DetectError::Parse`.
pub fn inspect(app_root: &Path) -> Result<Option<ProfileReference>, DetectError> {
    let path = app_root.join(MAKE_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let manifest = make::parse(&raw).map_err(|e| DetectError::Parse {
        path: path.clone(),
        line: e.line,
        message: e.message,
    })?;
    let profile = first_profile(&manifest);
    if let Some(p) = &profile {
        tracing::debug!("{} uses profile '{}' ({})", app_root.display(), p.name, p.download_type);
    }
    Ok(profile)
}

/// First entry under `projects` with `type = profile` and a git or copy download.
pub fn first_profile(manifest: &MakeTable) -> Option<ProfileReference> {
    let projects = manifest.get("projects")?.as_table()?;
    projects.iter().find_map(|(name, info)| {
        let info = info.as_table()?;
        if info.get_str(&["type"]) != Some("profile") {
            return None;
        }
        let download = info.get("download")?.as_table()?;
        let download_type = DownloadType::parse(download.get_str(&["type"])?)?;
        Some(reshape(name, download_type, download))
    })
}

fn reshape(name: &str, download_type: DownloadType, download: &MakeTable) -> ProfileReference {
    let mut location = None;
    let mut attributes = BTreeMap::new();
    for (key, value) in download.iter() {
        let MakeValue::Scalar(value) = value else { continue };
        match key {
            "type" => {}
            "url" => location = Some(value.clone()),
            _ => {
                attributes.insert(key.to_string(), value.clone());
            }
        }
    }
    ProfileReference {
        name: name.to_string(),
        download_type,
        location,
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn no_manifest_means_no_profile() {
        let dir = TempDir::new().unwrap();
        assert_eq!(inspect(dir.path()).expect("inspect"), None);
    }

    #[test]
    fn copy_download_is_accepted() {
        let manifest = make::parse(
            "projects[base][type] = profile\n\
             projects[base][download][type] = copy\n\
             projects[base][download][url] = file:///profiles/base\n",
        )
        .unwrap();
        let p = first_profile(&manifest).expect("profile");
        assert_eq!(p.download_type, DownloadType::Copy);
        assert_eq!(p.location.as_deref(), Some("file:///profiles/base"));
    }

    #[test]
    fn profile_with_other_download_type_is_skipped() {
        let manifest = make::parse(
            "projects[base][type] = profile\n\
             projects[base][download][type] = file\n",
        )
        .unwrap();
        assert!(first_profile(&manifest).is_none());
    }

    #[test]
    fn malformed_manifest_is_parse_error_with_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MAKE_FILE), "projects[base\n").unwrap();
        let err = inspect(dir.path()).unwrap_err();
        assert!(matches!(err, DetectError::Parse { line: 1, .. }), "got: {err}");
        assert!(err.to_string().contains("project.make"));
    }
}
