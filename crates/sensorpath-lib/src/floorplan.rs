use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::room::{Room, RoomId, RoomRecord};
use crate::sensor::{GeoPosition, Sensor, SensorId, SensorRecord};

/// Resolved rooms and sensors for one graph build.
///
/// The floorplan owns every [`Room`] and [`Sensor`]; sensors reference rooms
/// by index into the room table. It is constructed once per request and not
/// mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Floorplan {
    rooms: Vec<Room>,
    room_index: HashMap<RoomId, usize>,
    sensors: Vec<Sensor>,
    sensor_index: HashMap<SensorId, usize>,
}

impl Floorplan {
    /// Validate raw records and cross-link sensors to rooms.
    ///
    /// Rooms are validated first so a malformed room fails the whole build.
    /// When two room records share an id the later one replaces the earlier
    /// one. Sensor room references that do not resolve are dropped. Duplicate
    /// sensor ids are rejected.
    pub fn from_records(rooms: Vec<RoomRecord>, sensors: Vec<SensorRecord>) -> Result<Self> {
        let mut floorplan = Floorplan::default();

        for record in rooms {
            let room = Room::from_record(record)?;
            match floorplan.room_index.entry(room.id.clone()) {
                Entry::Occupied(slot) => {
                    warn!(room = %room.id, "duplicate room record; keeping the last one");
                    floorplan.rooms[*slot.get()] = room;
                }
                Entry::Vacant(slot) => {
                    slot.insert(floorplan.rooms.len());
                    floorplan.rooms.push(room);
                }
            }
        }

        for record in sensors {
            if record.id.is_empty() {
                return Err(Error::EmptyId { kind: "sensor" });
            }
            if floorplan.sensor_index.contains_key(&record.id) {
                return Err(Error::DuplicateSensor { id: record.id });
            }

            let mut resolved: Vec<usize> = Vec::with_capacity(record.rooms.len());
            for room_id in &record.rooms {
                match floorplan.room_index.get(room_id) {
                    Some(&index) if !resolved.contains(&index) => resolved.push(index),
                    Some(_) => {}
                    None => {
                        debug!(sensor = %record.id, room = %room_id, "dropping unresolved room reference");
                    }
                }
            }

            floorplan
                .sensor_index
                .insert(record.id.clone(), floorplan.sensors.len());
            floorplan.sensors.push(Sensor {
                id: record.id,
                position: GeoPosition::new(record.longitude, record.latitude),
                is_vertical: record.is_vertical,
                rooms: resolved,
            });
        }

        debug!(
            rooms = floorplan.rooms.len(),
            sensors = floorplan.sensors.len(),
            "floorplan resolved"
        );

        Ok(floorplan)
    }

    /// Rooms in first-seen order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Sensors in input order.
    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.room_index.get(id).map(|&index| &self.rooms[index])
    }

    pub fn sensor(&self, id: &str) -> Option<&Sensor> {
        self.sensor_index.get(id).map(|&index| &self.sensors[index])
    }

    /// Room stored at a sensor's room index.
    pub fn room_at(&self, index: usize) -> Option<&Room> {
        self.rooms.get(index)
    }

    /// Rooms bordered by a sensor, in the sensor's own order.
    pub fn rooms_of<'a>(&'a self, sensor: &'a Sensor) -> impl Iterator<Item = &'a Room> + 'a {
        sensor.rooms.iter().filter_map(|&index| self.rooms.get(index))
    }

    /// Sensors bordering a room, in input order.
    pub fn sensors_in_room(&self, room_id: &str) -> Vec<&Sensor> {
        let Some(&index) = self.room_index.get(room_id) else {
            return Vec::new();
        };
        self.sensors
            .iter()
            .filter(|sensor| sensor.rooms.contains(&index))
            .collect()
    }

    pub fn contains_room(&self, id: &str) -> bool {
        self.room_index.contains_key(id)
    }

    pub fn contains_sensor(&self, id: &str) -> bool {
        self.sensor_index.contains_key(id)
    }
}
