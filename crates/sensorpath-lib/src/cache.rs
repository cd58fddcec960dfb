//! Persisted graph cache.
//!
//! Building a graph is cheap for small floorplans but grows with the square
//! of the sensors per room, so long-lived callers can keep built graphs
//! behind a [`GraphStore`]. The cache is an optimization only: a missing,
//! corrupt or stale entry always falls back to a fresh build.
//!
//! # Serialization Format
//!
//! ```text
//! Header (48 bytes):
//!   - Magic: b"SPGC" (4 bytes)
//!   - Version: u8 (1 byte)
//!   - Reserved: 3 bytes
//!   - Node count: u32 (4 bytes)
//!   - Edge count: u32 (4 bytes)
//!   - Graph key: 32 bytes
//!
//! Body:
//!   - postcard-serialized Graph
//!   - zstd compressed
//!
//! Footer (32 bytes):
//!   - SHA-256 checksum of compressed body
//! ```

use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::floorplan::Floorplan;
use crate::graph::{build_graph, Graph};

/// Magic bytes identifying a graph cache file.
const CACHE_MAGIC: &[u8; 4] = b"SPGC";

/// Current cache format version. Bump when the graph layout or the key
/// derivation changes.
const CACHE_VERSION: u8 = 1;

/// Header size in bytes.
const HEADER_SIZE: usize = 48;

/// Checksum size in bytes (SHA-256).
const CHECKSUM_SIZE: usize = 32;

/// zstd compression level (balanced speed/ratio).
const COMPRESSION_LEVEL: i32 = 3;

const FILE_EXTENSION: &str = "graph.bin";

/// Entries a [`FileGraphStore`] keeps before pruning the oldest.
pub const DEFAULT_MAX_ENTRIES: usize = 16;

/// Content hash of every input that shapes a base graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphKey([u8; 32]);

impl GraphKey {
    /// Hash the rooms and sensors of a floorplan.
    ///
    /// Room attributes that feed the weight (occupants, area, crowd factor,
    /// floor) and every sensor attribute, including the order of its rooms,
    /// are part of the key.
    pub fn for_floorplan(floorplan: &Floorplan) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([CACHE_VERSION]);

        hasher.update((floorplan.rooms().len() as u64).to_le_bytes());
        for room in floorplan.rooms() {
            update_str(&mut hasher, &room.id);
            hasher.update(room.occupants.to_le_bytes());
            hasher.update(room.area.to_bits().to_le_bytes());
            hasher.update(room.crowd_factor.to_bits().to_le_bytes());
            hasher.update(room.floor.to_le_bytes());
        }

        hasher.update((floorplan.sensors().len() as u64).to_le_bytes());
        for sensor in floorplan.sensors() {
            update_str(&mut hasher, &sensor.id);
            hasher.update(sensor.position.longitude.to_bits().to_le_bytes());
            hasher.update(sensor.position.latitude.to_bits().to_le_bytes());
            hasher.update([u8::from(sensor.is_vertical)]);
            hasher.update((sensor.rooms.len() as u64).to_le_bytes());
            for room in floorplan.rooms_of(sensor) {
                update_str(&mut hasher, &room.id);
            }
        }

        GraphKey(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering, used for file names.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Debug for GraphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphKey({})", self.to_hex())
    }
}

impl fmt::Display for GraphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// Storage capability for built graphs.
///
/// `load` never fails: an entry that cannot be read is reported as absent.
pub trait GraphStore: Send + Sync {
    fn load(&self, key: &GraphKey) -> Option<Graph>;

    fn save(&self, key: &GraphKey, graph: &Graph) -> Result<()>;
}

/// Graph store keeping one file per key in a directory.
///
/// Occupancy is part of the key, so a live floorplan produces a new entry on
/// most updates. The store holds at most `max_entries` files and drops the
/// least recently written ones after each save.
#[derive(Debug, Clone)]
pub struct FileGraphStore {
    dir: PathBuf,
    max_entries: usize,
}

impl FileGraphStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Cap the number of entries kept on disk (at least one).
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Location of the cache file for `key`.
    pub fn path_for(&self, key: &GraphKey) -> PathBuf {
        self.dir.join(format!("{}.{FILE_EXTENSION}", key.to_hex()))
    }

    /// Remove the oldest entries beyond the cap, never touching `keep`.
    /// Returns how many files were removed.
    pub fn prune(&self, keep: &Path) -> Result<usize> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == keep || !is_cache_file(&path) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((modified, path));
        }

        let excess = (entries.len() + 1).saturating_sub(self.max_entries);
        if excess == 0 {
            return Ok(0);
        }

        entries.sort();
        let mut removed = 0;
        for (_, path) in entries.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to prune graph cache entry")
                }
            }
        }

        debug!(removed, max_entries = self.max_entries, "pruned graph cache");
        Ok(removed)
    }
}

fn is_cache_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(&format!(".{FILE_EXTENSION}")))
}

impl GraphStore for FileGraphStore {
    fn load(&self, key: &GraphKey) -> Option<Graph> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!(path = %path.display(), "graph cache miss");
            return None;
        }

        match read_graph(&path, key) {
            Ok(graph) => Some(graph),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load graph cache entry, will rebuild"
                );
                None
            }
        }
    }

    fn save(&self, key: &GraphKey, graph: &Graph) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        write_graph(&path, key, graph)?;

        if let Err(e) = self.prune(&path) {
            warn!(dir = %self.dir.display(), error = %e, "failed to prune graph cache");
        }
        Ok(())
    }
}

/// Serialize a graph to `path`.
///
/// The file is written next to its destination and renamed into place, so a
/// reader never observes a partial entry.
pub fn write_graph(path: &Path, key: &GraphKey, graph: &Graph) -> Result<()> {
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "saving graph cache entry"
    );

    let serialized = postcard::to_allocvec(graph).map_err(|e| Error::GraphCacheSerialize {
        message: format!("postcard serialization failed: {}", e),
    })?;

    let compressed = zstd::encode_all(serialized.as_slice(), COMPRESSION_LEVEL).map_err(|e| {
        Error::GraphCacheSerialize {
            message: format!("zstd compression failed: {}", e),
        }
    })?;

    let checksum = Sha256::digest(&compressed);

    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(CACHE_MAGIC);
    header[4] = CACHE_VERSION;
    // bytes 5-7 reserved
    header[8..12].copy_from_slice(&(graph.node_count() as u32).to_le_bytes());
    header[12..16].copy_from_slice(&(graph.edge_count() as u32).to_le_bytes());
    header[16..48].copy_from_slice(key.as_bytes());

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        writer.write_all(&header)?;
        writer.write_all(&compressed)?;
        writer.write_all(&checksum)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|err| err.error)?;

    debug!(
        file_size = HEADER_SIZE + compressed.len() + CHECKSUM_SIZE,
        compressed_size = compressed.len(),
        "graph cache entry saved"
    );

    Ok(())
}

/// Read and verify a graph written by [`write_graph`].
///
/// Fails with [`Error::GraphCacheLoad`] on a bad magic, version, key,
/// checksum or body.
pub fn read_graph(path: &Path, key: &GraphKey) -> Result<Graph> {
    debug!(path = %path.display(), "loading graph cache entry");

    let load_error = |message: String| Error::GraphCacheLoad {
        path: path.to_path_buf(),
        message,
    };

    let bytes =
        fs::read(path).map_err(|e| load_error(format!("failed to read file: {}", e)))?;

    if bytes.len() < HEADER_SIZE + CHECKSUM_SIZE {
        return Err(load_error(format!("file too short ({} bytes)", bytes.len())));
    }

    let (header, rest) = bytes.split_at(HEADER_SIZE);
    let (compressed, stored_checksum) = rest.split_at(rest.len() - CHECKSUM_SIZE);

    if &header[0..4] != CACHE_MAGIC {
        return Err(load_error("invalid magic bytes".to_string()));
    }

    let version = header[4];
    if version != CACHE_VERSION {
        return Err(load_error(format!(
            "unsupported version {} (expected {})",
            version, CACHE_VERSION
        )));
    }

    if &header[16..48] != key.as_bytes() {
        return Err(load_error(
            "entry was written for a different graph key".to_string(),
        ));
    }

    let computed_checksum = Sha256::digest(compressed);
    if computed_checksum.as_slice() != stored_checksum {
        return Err(load_error("checksum mismatch".to_string()));
    }

    let decompressed = zstd::decode_all(compressed)
        .map_err(|e| load_error(format!("zstd decompression failed: {}", e)))?;

    let graph: Graph = postcard::from_bytes(&decompressed)
        .map_err(|e| load_error(format!("postcard deserialization failed: {}", e)))?;

    let node_count = read_u32(&header[8..12]);
    let edge_count = read_u32(&header[12..16]);
    if graph.node_count() != node_count as usize || graph.edge_count() != edge_count as usize {
        return Err(load_error(format!(
            "header counts {node_count}/{edge_count} do not match body {}/{}",
            graph.node_count(),
            graph.edge_count()
        )));
    }

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded graph cache entry"
    );

    Ok(graph)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

/// Return the base graph for a floorplan, going through `store` when given.
///
/// A cached graph whose nodes do not match the floorplan's sensors is
/// treated as stale and rebuilt. Failing to save is logged and otherwise
/// ignored.
pub fn load_or_build(store: Option<&dyn GraphStore>, floorplan: &Floorplan) -> Graph {
    let Some(store) = store else {
        return build_graph(floorplan);
    };

    let key = GraphKey::for_floorplan(floorplan);
    if let Some(graph) = store.load(&key) {
        if matches_floorplan(&graph, floorplan) {
            debug!(key = %key, "using cached graph");
            return graph;
        }
        warn!(key = %key, "cached graph does not match floorplan, will rebuild");
    }

    let graph = build_graph(floorplan);
    if let Err(e) = store.save(&key, &graph) {
        warn!(key = %key, error = %e, "failed to save graph cache entry");
    }
    graph
}

fn matches_floorplan(graph: &Graph, floorplan: &Floorplan) -> bool {
    graph.node_count() == floorplan.sensors().len()
        && graph
            .nodes()
            .iter()
            .zip(floorplan.sensors())
            .all(|(node, sensor)| !node.is_room() && node.id == sensor.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomRecord;
    use crate::sensor::SensorRecord;

    fn floorplan(occupants: u32) -> Floorplan {
        Floorplan::from_records(
            vec![RoomRecord {
                id: "r".to_string(),
                name: None,
                crowd_factor: 1.0,
                occupants,
                area: Some(20.0),
                popularity_factor: 0.0,
                floor: 0,
            }],
            vec![
                SensorRecord {
                    id: "s1".to_string(),
                    longitude: 0.0,
                    latitude: 0.0,
                    is_vertical: false,
                    rooms: vec!["r".to_string()],
                },
                SensorRecord {
                    id: "s2".to_string(),
                    longitude: 0.001,
                    latitude: 0.0,
                    is_vertical: false,
                    rooms: vec!["r".to_string()],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn key_is_stable_for_identical_input() {
        assert_eq!(
            GraphKey::for_floorplan(&floorplan(3)),
            GraphKey::for_floorplan(&floorplan(3))
        );
    }

    #[test]
    fn key_changes_with_occupancy() {
        assert_ne!(
            GraphKey::for_floorplan(&floorplan(3)),
            GraphKey::for_floorplan(&floorplan(4))
        );
    }

    #[test]
    fn hex_key_is_64_chars() {
        let hex = GraphKey::for_floorplan(&floorplan(0)).to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn non_cache_files_are_left_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();
        let store = FileGraphStore::new(dir.path()).with_max_entries(1);

        for occupants in 0..3 {
            let floorplan = floorplan(occupants);
            let key = GraphKey::for_floorplan(&floorplan);
            store.save(&key, &build_graph(&floorplan)).unwrap();
        }

        assert!(dir.path().join("notes.txt").exists());
        let latest = store.path_for(&GraphKey::for_floorplan(&floorplan(2)));
        assert!(latest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn max_entries_is_at_least_one() {
        let store = FileGraphStore::new("unused").with_max_entries(0);
        assert_eq!(store.max_entries(), 1);
        assert_eq!(FileGraphStore::new("unused").max_entries(), DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn load_or_build_without_store_builds() {
        let graph = load_or_build(None, &floorplan(1));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }
}
