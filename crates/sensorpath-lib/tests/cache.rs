mod common;

use std::fs;

use common::{fixture_floorplan, FloorplanFixture};
use sensorpath_lib::cache::{read_graph, write_graph};
use sensorpath_lib::{
    build_graph, load_or_build, plan_path, Error, FileGraphStore, GraphKey, GraphStore,
    PathRequest,
};
use tempfile::TempDir;

#[test]
fn saved_graph_loads_back_identical() {
    let dir = TempDir::new().expect("create temp dir");
    let store = FileGraphStore::new(dir.path());
    let floorplan = fixture_floorplan();
    let key = GraphKey::for_floorplan(&floorplan);
    let graph = build_graph(&floorplan);

    store.save(&key, &graph).expect("save graph");
    let loaded = store.load(&key).expect("cached graph loads");

    assert_eq!(loaded.node_count(), graph.node_count());
    assert_eq!(loaded.edges(), graph.edges());
    assert_eq!(loaded.node("s4"), graph.node("s4"));
}

#[test]
fn load_or_build_populates_the_store() {
    let dir = TempDir::new().expect("create temp dir");
    let store = FileGraphStore::new(dir.path().join("nested"));
    let floorplan = fixture_floorplan();
    let key = GraphKey::for_floorplan(&floorplan);

    assert!(store.load(&key).is_none());
    let built = load_or_build(Some(&store), &floorplan);
    assert!(store.path_for(&key).exists());

    let cached = load_or_build(Some(&store), &floorplan);
    assert_eq!(cached.edges(), built.edges());
}

#[test]
fn corrupted_entry_falls_back_to_rebuild() {
    let dir = TempDir::new().expect("create temp dir");
    let store = FileGraphStore::new(dir.path());
    let floorplan = fixture_floorplan();
    let key = GraphKey::for_floorplan(&floorplan);
    let path = store.path_for(&key);

    store.save(&key, &build_graph(&floorplan)).unwrap();
    let mut bytes = fs::read(&path).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let err = read_graph(&path, &key).unwrap_err();
    assert!(matches!(err, Error::GraphCacheLoad { .. }));
    assert!(store.load(&key).is_none());

    let rebuilt = load_or_build(Some(&store), &floorplan);
    assert_eq!(rebuilt.edges(), build_graph(&floorplan).edges());
    // The rebuild replaced the broken entry.
    assert!(read_graph(&path, &key).is_ok());
}

#[test]
fn truncated_entry_is_rejected() {
    let dir = TempDir::new().expect("create temp dir");
    let floorplan = fixture_floorplan();
    let key = GraphKey::for_floorplan(&floorplan);
    let path = dir.path().join("entry.graph.bin");

    write_graph(&path, &key, &build_graph(&floorplan)).unwrap();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..20]).unwrap();

    let err = read_graph(&path, &key).unwrap_err();
    assert!(err.to_string().contains("too short"));
}

#[test]
fn version_mismatch_is_rejected() {
    let dir = TempDir::new().expect("create temp dir");
    let floorplan = fixture_floorplan();
    let key = GraphKey::for_floorplan(&floorplan);
    let path = dir.path().join("entry.graph.bin");

    write_graph(&path, &key, &build_graph(&floorplan)).unwrap();
    let mut bytes = fs::read(&path).unwrap();
    bytes[4] = bytes[4].wrapping_add(1);
    fs::write(&path, &bytes).unwrap();

    let err = read_graph(&path, &key).unwrap_err();
    assert!(err.to_string().contains("unsupported version"));
}

#[test]
fn entry_for_another_floorplan_is_not_reused() {
    let dir = TempDir::new().expect("create temp dir");
    let store = FileGraphStore::new(dir.path());

    let small = FloorplanFixture::new()
        .empty_room("r", 0)
        .sensor("a", 10.0, 60.0, &["r"])
        .sensor("b", 10.001, 60.0, &["r"])
        .build();
    let fixture = fixture_floorplan();
    let small_key = GraphKey::for_floorplan(&small);
    let fixture_key = GraphKey::for_floorplan(&fixture);
    assert_ne!(small_key, fixture_key);

    // Plant the small graph under the fixture's file name.
    write_graph(&store.path_for(&fixture_key), &small_key, &build_graph(&small)).unwrap();
    assert!(store.load(&fixture_key).is_none());

    let graph = load_or_build(Some(&store), &fixture);
    assert_eq!(graph.node_count(), fixture.sensors().len());
}

#[test]
fn unwritable_store_does_not_break_planning() {
    let dir = TempDir::new().expect("create temp dir");
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"occupied").unwrap();
    let store = FileGraphStore::new(&blocker);

    let floorplan = fixture_floorplan();
    assert!(store
        .save(&GraphKey::for_floorplan(&floorplan), &build_graph(&floorplan))
        .is_err());

    let plan = plan_path(
        &floorplan,
        Some(&store),
        &PathRequest::new("lobby", "office"),
    )
    .expect("planning ignores cache failures");
    assert_eq!(plan.fastest_path.len(), 3);
}

#[test]
fn cached_graph_serves_room_queries() {
    let dir = TempDir::new().expect("create temp dir");
    let store = FileGraphStore::new(dir.path());
    let floorplan = fixture_floorplan();
    let request = PathRequest::new("lobby", "office");

    let cold = plan_path(&floorplan, Some(&store), &request).unwrap();
    let warm = plan_path(&floorplan, Some(&store), &request).unwrap();
    assert_eq!(cold, warm);
}

fn cache_entries(dir: &std::path::Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".graph.bin"))
        .count()
}

#[test]
fn occupancy_updates_keep_the_store_bounded() {
    let dir = TempDir::new().expect("create temp dir");
    let store = FileGraphStore::new(dir.path()).with_max_entries(3);

    let mut last = None;
    for occupants in 0..8 {
        let floorplan = FloorplanFixture::new()
            .room("r", occupants, 20.0, 0)
            .sensor("a", 10.0, 60.0, &["r"])
            .sensor("b", 10.001, 60.0, &["r"])
            .build();
        load_or_build(Some(&store), &floorplan);
        last = Some(GraphKey::for_floorplan(&floorplan));
    }

    assert_eq!(cache_entries(dir.path()), 3);
    let last = last.expect("at least one update");
    assert!(store.load(&last).is_some(), "newest entry survives pruning");
}
