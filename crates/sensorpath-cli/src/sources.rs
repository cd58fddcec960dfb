//! Selection of the floorplan data source and the graph cache location.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use sensorpath_lib::{
    FileGraphStore, Floorplan, FloorplanSource, HttpSource, PayloadFile, DEFAULT_BASE_URL,
};

/// Where room and sensor records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Remote(String),
}

impl DataSource {
    /// A payload file wins over a base URL; with neither the default data
    /// service is queried.
    pub fn from_args(payload: Option<&Path>, base_url: Option<&str>) -> Self {
        match (payload, base_url) {
            (Some(path), _) => DataSource::File(path.to_path_buf()),
            (None, Some(url)) => DataSource::Remote(url.to_string()),
            (None, None) => DataSource::Remote(DEFAULT_BASE_URL.to_string()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DataSource::File(path) => path.display().to_string(),
            DataSource::Remote(url) => url.clone(),
        }
    }

    /// Fetch the records and resolve them into a floorplan.
    pub fn load(&self) -> Result<Floorplan> {
        let payload = match self {
            DataSource::File(path) => PayloadFile::new(path).fetch(),
            DataSource::Remote(url) => HttpSource::new(url.clone())
                .context("failed to create HTTP client")?
                .fetch(),
        }
        .with_context(|| format!("failed to fetch floorplan from {}", self.describe()))?;

        payload
            .into_floorplan()
            .with_context(|| format!("invalid floorplan from {}", self.describe()))
    }
}

/// Resolve the graph cache directory. An explicit directory always wins;
/// otherwise the platform cache directory is used unless caching is off.
pub fn resolve_cache_dir(explicit: Option<&Path>, disabled: bool) -> Option<PathBuf> {
    if disabled {
        return None;
    }
    if let Some(dir) = explicit {
        return Some(dir.to_path_buf());
    }
    ProjectDirs::from("", "", "sensorpath").map(|dirs| dirs.cache_dir().join("graphs"))
}

pub fn graph_store(explicit: Option<&Path>, disabled: bool) -> Option<FileGraphStore> {
    resolve_cache_dir(explicit, disabled).map(FileGraphStore::new)
}
