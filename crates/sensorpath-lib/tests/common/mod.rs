//! Common test utilities and fixture helpers.
//!
//! Integration tests either load the JSON floorplan under `docs/fixtures` or
//! assemble a small floorplan in code with [`FloorplanFixture`].

use std::path::PathBuf;

use sensorpath_lib::{Floorplan, FloorplanSource, PayloadFile, RoomRecord, SensorRecord};

/// Path to fixtures directory used by tests.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Path to the sample floorplan payload.
#[allow(dead_code)]
pub fn fixture_payload_path() -> PathBuf {
    fixtures_dir().join("floorplan.json")
}

/// Load and resolve the sample floorplan.
#[allow(dead_code)]
pub fn fixture_floorplan() -> Floorplan {
    PayloadFile::new(fixture_payload_path())
        .fetch()
        .expect("load fixture floorplan.json")
        .into_floorplan()
        .expect("fixture floorplan is valid")
}

/// Builder for small in-code floorplans.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FloorplanFixture {
    rooms: Vec<RoomRecord>,
    sensors: Vec<SensorRecord>,
}

#[allow(dead_code)]
impl FloorplanFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an occupied room with crowd factor 1.
    pub fn room(mut self, id: &str, occupants: u32, area: f64, floor: i32) -> Self {
        self.rooms.push(RoomRecord {
            id: id.to_string(),
            name: None,
            crowd_factor: 1.0,
            occupants,
            area: Some(area),
            popularity_factor: 0.0,
            floor,
        });
        self
    }

    /// Add an empty room (weight 0.01).
    pub fn empty_room(self, id: &str, floor: i32) -> Self {
        self.room(id, 0, 10.0, floor)
    }

    pub fn sensor(mut self, id: &str, longitude: f64, latitude: f64, rooms: &[&str]) -> Self {
        self.sensors.push(SensorRecord {
            id: id.to_string(),
            longitude,
            latitude,
            is_vertical: false,
            rooms: rooms.iter().map(|room| room.to_string()).collect(),
        });
        self
    }

    /// Same records with the sensor list reversed.
    pub fn reversed(mut self) -> Self {
        self.sensors.reverse();
        self
    }

    pub fn records(self) -> (Vec<RoomRecord>, Vec<SensorRecord>) {
        (self.rooms, self.sensors)
    }

    pub fn build(self) -> Floorplan {
        Floorplan::from_records(self.rooms, self.sensors).expect("fixture floorplan is valid")
    }
}
