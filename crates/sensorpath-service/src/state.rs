//! Application state shared by the axum handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sensorpath_lib::cache::DEFAULT_MAX_ENTRIES;
use sensorpath_lib::{FileGraphStore, GraphStore};

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// The configured cache directory could not be created.
    CacheDirUnavailable { path: PathBuf, source: std::io::Error },
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CacheDirUnavailable { path, source } => {
                write!(f, "graph cache directory {} unavailable: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CacheDirUnavailable { source, .. } => Some(source),
        }
    }
}

/// Shared state for all handlers. Cheap to clone.
///
/// Every request carries its own rooms and sensors, so the only process-wide
/// resource is the optional graph cache.
///
/// ```ignore
/// let state = AppState::with_cache_dir("/var/cache/sensorpath")?;
/// let app = sensorpath_service::router(state, &MetricsConfig::from_env(), &CorsConfig::from_env());
/// ```
#[derive(Clone, Default)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Default)]
struct AppStateInner {
    store: Option<FileGraphStore>,
}

impl AppState {
    /// State without a graph cache; every request rebuilds its graph.
    pub fn uncached() -> Self {
        Self::default()
    }

    /// State backed by a graph cache directory, created if missing.
    pub fn with_cache_dir(dir: impl AsRef<Path>) -> Result<Self, AppStateError> {
        Self::with_bounded_cache(dir, DEFAULT_MAX_ENTRIES)
    }

    /// Like [`AppState::with_cache_dir`], keeping at most `max_entries` graphs.
    pub fn with_bounded_cache(
        dir: impl AsRef<Path>,
        max_entries: usize,
    ) -> Result<Self, AppStateError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| AppStateError::CacheDirUnavailable {
            path: dir.to_path_buf(),
            source,
        })?;
        let store = FileGraphStore::new(dir).with_max_entries(max_entries);
        tracing::info!(
            path = %dir.display(),
            max_entries = store.max_entries(),
            "graph cache enabled"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { store: Some(store) }),
        })
    }

    /// Read `SENSORPATH_CACHE_DIR`; unset or empty means no cache.
    /// `SENSORPATH_CACHE_MAX_ENTRIES` caps the entries kept on disk.
    pub fn from_env() -> Result<Self, AppStateError> {
        let max_entries = std::env::var("SENSORPATH_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_ENTRIES);

        match std::env::var("SENSORPATH_CACHE_DIR") {
            Ok(dir) if !dir.trim().is_empty() => Self::with_bounded_cache(dir.trim(), max_entries),
            _ => Ok(Self::uncached()),
        }
    }

    pub fn cache_max_entries(&self) -> Option<usize> {
        self.inner.store.as_ref().map(FileGraphStore::max_entries)
    }

    pub fn graph_store(&self) -> Option<&dyn GraphStore> {
        self.inner.store.as_ref().map(|store| store as &dyn GraphStore)
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.inner.store.as_ref().map(FileGraphStore::dir)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cache_dir", &self.cache_dir())
            .finish()
    }
}
