//! Environment-list cache.
//!
//! Remote environment lists are expensive to fetch, so they are cached per
//! project. The cache never expires on remote events by itself: every
//! operation that changes a project's environment membership must call
//! [`EnvironmentCache::invalidate`] explicitly.
//!
//! [`FileEnvironmentCache`] persists a JSON document at
//! `<home>/.platsync/cache/<project_id>.json`, written with the atomic
//! `.tmp` + rename pattern. [`MemoryEnvironmentCache`] is process-scoped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::cache_dir_at;
use crate::error::{io_err, CoreError};
use crate::types::{Environment, ProjectId};

/// Cache service for a project's environment list.
///
/// Lookups are best-effort: an unreadable entry behaves as a miss, and a
/// failed write or invalidation is logged rather than returned.
pub trait EnvironmentCache {
    fn get(&self, project: &ProjectId) -> Option<Vec<Environment>>;
    fn put(&self, project: &ProjectId, environments: Vec<Environment>);
    fn invalidate(&self, project: &ProjectId);
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-scoped cache.
#[derive(Debug, Default)]
pub struct MemoryEnvironmentCache {
    entries: Mutex<HashMap<ProjectId, Vec<Environment>>>,
}

impl MemoryEnvironmentCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnvironmentCache for MemoryEnvironmentCache {
    fn get(&self, project: &ProjectId) -> Option<Vec<Environment>> {
        let entries = self.entries.lock().ok()?;
        entries.get(project).cloned()
    }

    fn put(&self, project: &ProjectId, environments: Vec<Environment>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(project.clone(), environments);
        }
    }

    fn invalidate(&self, project: &ProjectId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(project);
        }
    }
}

// ---------------------------------------------------------------------------
// On disk
// ---------------------------------------------------------------------------

/// On-disk cache payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheFile {
    pub fetched_at: DateTime<Utc>,
    pub environments: Vec<Environment>,
}

/// Cache persisted under `<home>/.platsync/cache/`.
#[derive(Debug, Clone)]
pub struct FileEnvironmentCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FileEnvironmentCache {
    pub fn new(home: &Path, ttl: Duration) -> Self {
        Self {
            dir: cache_dir_at(home),
            ttl,
        }
    }

    /// `<home>/.platsync/cache/<project_id>.json`
    ///
    /// Ids that could escape the cache directory are rejected.
    pub fn entry_path(&self, project: &ProjectId) -> Result<PathBuf, CoreError> {
        let id = project.0.as_str();
        let unsafe_id = id.is_empty()
            || id.contains("..")
            || id.contains(['/', '\\'])
            || Path::new(id).is_absolute();
        if unsafe_id {
            return Err(CoreError::InvalidProjectId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    /// Load the entry for `project`. Returns `None` when absent or older than the TTL.
    pub fn load(&self, project: &ProjectId) -> Result<Option<CacheFile>, CoreError> {
        let path = self.entry_path(project)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let entry: CacheFile = serde_json::from_str(&contents)?;
        let age = Utc::now().signed_duration_since(entry.fetched_at);
        let expired = age
            .to_std()
            .map(|age| age > self.ttl)
            .unwrap_or(false);
        if expired {
            tracing::debug!("cache entry expired: {}", path.display());
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Save the entry for `project` atomically.
    ///
    /// Writes to `<path>.tmp` then renames to `<path>`.
    pub fn save(&self, project: &ProjectId, environments: Vec<Environment>) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let path = self.entry_path(project)?;
        let entry = CacheFile {
            fetched_at: Utc::now(),
            environments,
        };
        let json = serde_json::to_string_pretty(&entry)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&path, e));
        }
        Ok(())
    }

    /// Delete the entry for `project`. Idempotent.
    pub fn remove(&self, project: &ProjectId) -> Result<(), CoreError> {
        let path = self.entry_path(project)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&path, e)),
        }
    }
}

impl EnvironmentCache for FileEnvironmentCache {
    fn get(&self, project: &ProjectId) -> Option<Vec<Environment>> {
        match self.load(project) {
            Ok(entry) => entry.map(|e| e.environments),
            Err(err) => {
                tracing::debug!("ignoring unreadable cache entry for {project}: {err}");
                None
            }
        }
    }

    fn put(&self, project: &ProjectId, environments: Vec<Environment>) {
        if let Err(err) = self.save(project, environments) {
            tracing::warn!("failed to cache environments for {project}: {err}");
        }
    }

    fn invalidate(&self, project: &ProjectId) {
        tracing::debug!("invalidating environment cache for {project}");
        if let Err(err) = self.remove(project) {
            tracing::warn!("failed to invalidate environment cache for {project}: {err}");
        }
    }
}
