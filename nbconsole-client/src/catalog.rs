//! Local pipeline catalog
//!
//! The catalog is the console's working set of known pipelines. It mirrors
//! the server's `GET /pipelines` and survives between sessions as a JSON
//! array in a single file (`~/.config/nbconsole/catalog.json` by default).
//!
//! The file is a best-effort cache, never a system of record: a missing or
//! corrupt snapshot yields an empty catalog, and failed writes are logged
//! and otherwise ignored. Every mutation rewrites the whole snapshot through
//! a temp file and an atomic rename, so readers never observe a partial
//! write.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use dirs_next::config_dir;
use nbconsole_core::domain::pipeline::Pipeline;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ApiClient;

/// File name of the persisted snapshot
pub const CATALOG_FILE_NAME: &str = "catalog.json";

/// Error raised while reading or writing the snapshot
///
/// Never returned from the store's public API; only logged.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Default snapshot location under the user's config directory
pub fn default_catalog_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nbconsole")
        .join(CATALOG_FILE_NAME)
}

/// Pipeline cache backed by a JSON file
///
/// Construct one per session with [`CatalogStore::open`] and pass it to
/// whatever needs it.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    pipelines: Vec<Pipeline>,
}

impl CatalogStore {
    /// Open the catalog at `path`, loading whatever snapshot is there
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            path: path.into(),
            pipelines: Vec::new(),
        };
        store.load();
        store
    }

    /// Reload from the persisted snapshot
    ///
    /// A missing file means an empty catalog. An unreadable or unparsable
    /// one is logged and also treated as empty.
    pub fn load(&mut self) {
        self.pipelines = match read_snapshot(&self.path) {
            Ok(Some(pipelines)) => {
                debug!(path = %self.path.display(), count = pipelines.len(), "Loaded catalog");
                pipelines
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring unreadable catalog: {}", e);
                Vec::new()
            }
        };
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    /// Overwrite the whole set (last fetch wins)
    pub fn replace_all(&mut self, pipelines: Vec<Pipeline>) {
        self.pipelines = pipelines;
        self.persist();
    }

    /// Add a pipeline; an entry with the same id is replaced in place
    pub fn add(&mut self, pipeline: Pipeline) {
        match self.pipelines.iter_mut().find(|p| p.id == pipeline.id) {
            Some(existing) => *existing = pipeline,
            None => self.pipelines.push(pipeline),
        }
        self.persist();
    }

    /// Replace the entry with the same id
    ///
    /// Returns `false` (and writes nothing) when the id is unknown.
    pub fn update(&mut self, pipeline: Pipeline) -> bool {
        let Some(existing) = self.pipelines.iter_mut().find(|p| p.id == pipeline.id) else {
            return false;
        };
        *existing = pipeline;
        self.persist();
        true
    }

    /// Remove a pipeline by id; returns whether anything was removed
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.pipelines.len();
        self.pipelines.retain(|p| p.id != id);
        if self.pipelines.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Refresh from `GET /pipelines`
    ///
    /// On failure the cached set is left untouched and the error is returned
    /// for the caller to report.
    pub async fn sync(&mut self, client: &ApiClient) -> crate::Result<usize> {
        let pipelines = client.list_pipelines().await?;
        let count = pipelines.len();
        self.replace_all(pipelines);
        info!(count, "Catalog synchronized");
        Ok(count)
    }

    fn persist(&self) {
        match write_snapshot(&self.path, &self.pipelines) {
            Ok(()) => debug!(path = %self.path.display(), count = self.pipelines.len(), "Catalog written"),
            Err(e) => warn!(path = %self.path.display(), "Failed to persist catalog: {}", e),
        }
    }
}

fn read_snapshot(path: &Path) -> Result<Option<Vec<Pipeline>>, CatalogError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if contents.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&contents)?))
}

fn write_snapshot(path: &Path, pipelines: &[Pipeline]) -> Result<(), CatalogError> {
    let bytes = serde_json::to_vec_pretty(pipelines)?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let temp_path = temp_snapshot_path(parent);
    let result = (|| -> Result<(), CatalogError> {
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn temp_snapshot_path(parent: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    parent.join(format!(".catalog-{}-{}.tmp", std::process::id(), nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nbconsole_core::domain::parameter::{ParameterType, PipelineParameter};
    use tempfile::TempDir;

    fn pipeline(name: &str) -> Pipeline {
        Pipeline {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            created_at: Utc.with_ymd_and_hms(2025, 4, 1, 10, 0, 0).unwrap(),
            parameters: vec![
                PipelineParameter::new("region", ParameterType::String).with_default("south"),
                PipelineParameter::new("filters", ParameterType::Dict),
            ],
        }
    }

    fn catalog_path(dir: &TempDir) -> PathBuf {
        dir.path().join("nested").join(CATALOG_FILE_NAME)
    }

    #[test]
    fn test_add_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let p = pipeline("daily_sales");

        let mut store = CatalogStore::open(catalog_path(&dir));
        assert!(store.is_empty());
        store.add(p.clone());

        let reopened = CatalogStore::open(catalog_path(&dir));
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get(p.id), Some(&p));
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CATALOG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let mut store = CatalogStore::open(&path);
        assert!(store.is_empty());

        store.add(pipeline("recovered"));
        assert_eq!(CatalogStore::open(&path).len(), 1);
    }

    #[test]
    fn test_update_and_remove() {
        let dir = TempDir::new().unwrap();
        let path = catalog_path(&dir);
        let mut store = CatalogStore::open(&path);
        let mut p = pipeline("weekly_report");
        store.add(p.clone());

        p.description = None;
        assert!(store.update(p.clone()));
        assert!(!store.update(pipeline("unknown")));
        assert_eq!(CatalogStore::open(&path).get(p.id).unwrap().description, None);

        assert!(store.remove(p.id));
        assert!(!store.remove(p.id));
        assert!(CatalogStore::open(&path).is_empty());
    }

    #[test]
    fn test_replace_all_and_lookup() {
        let dir = TempDir::new().unwrap();
        let path = catalog_path(&dir);
        let mut store = CatalogStore::open(&path);
        store.add(pipeline("stale"));

        store.replace_all(vec![pipeline("alpha"), pipeline("beta")]);
        assert_eq!(store.len(), 2);
        assert!(store.find_by_name("stale").is_none());
        assert!(store.find_by_name("beta").is_some());

        let reopened = CatalogStore::open(&path);
        let names: Vec<_> = reopened.pipelines().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_add_same_id_replaces() {
        let dir = TempDir::new().unwrap();
        let mut store = CatalogStore::open(catalog_path(&dir));
        let mut p = pipeline("daily_sales");
        store.add(p.clone());
        p.name = "daily_sales_v2".to_string();
        store.add(p);

        assert_eq!(store.len(), 1);
        assert_eq!(store.pipelines()[0].name, "daily_sales_v2");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CATALOG_FILE_NAME);
        let mut store = CatalogStore::open(&path);
        store.add(pipeline("one"));
        store.add(pipeline("two"));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
