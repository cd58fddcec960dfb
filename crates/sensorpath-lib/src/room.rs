use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque room identifier as supplied by the rooms service.
pub type RoomId = String;

/// Congestion weight assigned to a room with nobody in it. Kept above zero so
/// an empty room is cheap to cross but never free.
pub const EMPTY_ROOM_WEIGHT: f64 = 0.01;

/// Largest congestion weight a room may carry. Edge weights multiply it by a
/// distance of at most half the earth's circumference and the floor penalty,
/// and path totals add those up, so everything stays finite below this.
pub const MAX_CONGESTION_WEIGHT: f64 = 1e250;

/// Room record as received from the data source.
///
/// Only `id` and `crowd_factor` are mandatory; the remaining attributes fall
/// back to neutral defaults so partially populated rooms still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: RoomId,
    #[serde(default)]
    pub name: Option<String>,
    pub crowd_factor: f64,
    #[serde(default)]
    pub occupants: u32,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub popularity_factor: f64,
    #[serde(default)]
    pub floor: i32,
}

/// Physical space whose occupancy determines the cost of crossing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub name: Option<String>,
    pub occupants: u32,
    /// Floor area in square meters.
    pub area: f64,
    pub crowd_factor: f64,
    /// Carried through for future scoring; not part of the weight.
    pub popularity_factor: f64,
    pub floor: i32,
}

impl Room {
    /// Validate a record and turn it into a room.
    ///
    /// Fails with [`Error::InvalidRoom`] when the congestion weight would be
    /// undefined: an occupied room without a positive area, a crowd factor
    /// that is negative or not finite, or a density so extreme that the
    /// resulting weight is not finite or exceeds [`MAX_CONGESTION_WEIGHT`].
    pub fn from_record(record: RoomRecord) -> Result<Self> {
        if record.id.is_empty() {
            return Err(Error::EmptyId { kind: "room" });
        }

        let area = record.area.unwrap_or(0.0);
        if !area.is_finite() {
            return Err(Error::invalid_room(&record.id, "area must be finite"));
        }
        if record.occupants > 0 && area <= 0.0 {
            return Err(Error::invalid_room(
                &record.id,
                format!(
                    "area must be positive for an occupied room (occupants={}, area={})",
                    record.occupants, area
                ),
            ));
        }
        if !record.crowd_factor.is_finite() || record.crowd_factor < 0.0 {
            return Err(Error::invalid_room(
                &record.id,
                format!(
                    "crowd_factor must be a non-negative number (got {})",
                    record.crowd_factor
                ),
            ));
        }

        let room = Self {
            id: record.id,
            name: record.name,
            occupants: record.occupants,
            area,
            crowd_factor: record.crowd_factor,
            popularity_factor: record.popularity_factor,
            floor: record.floor,
        };

        let weight = room.congestion_weight();
        if !weight.is_finite() || weight > MAX_CONGESTION_WEIGHT {
            return Err(Error::invalid_room(
                &room.id,
                format!(
                    "congestion weight out of range (occupants={}, area={}, crowd_factor={})",
                    room.occupants, room.area, room.crowd_factor
                ),
            ));
        }

        Ok(room)
    }

    /// Cost this room contributes to every edge formed through it.
    ///
    /// `0.01` for an empty room, otherwise `1 + (occupants / area) * crowd_factor`.
    pub fn congestion_weight(&self) -> f64 {
        if self.occupants == 0 {
            return EMPTY_ROOM_WEIGHT;
        }
        1.0 + (f64::from(self.occupants) / self.area) * self.crowd_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, occupants: u32, area: Option<f64>, crowd_factor: f64) -> RoomRecord {
        RoomRecord {
            id: id.to_string(),
            name: None,
            crowd_factor,
            occupants,
            area,
            popularity_factor: 1.2,
            floor: 0,
        }
    }

    #[test]
    fn empty_room_weight_ignores_other_fields() {
        for (area, crowd) in [(Some(10.0), 5.0), (Some(0.0), 0.0), (None, 100.0)] {
            let room = Room::from_record(record("r", 0, area, crowd)).unwrap();
            assert_eq!(room.congestion_weight(), EMPTY_ROOM_WEIGHT);
        }
    }

    #[test]
    fn occupied_room_weight_scales_with_density() {
        let room = Room::from_record(record("r", 2, Some(50.0), 1.0)).unwrap();
        assert!((room.congestion_weight() - 1.04).abs() < 1e-12);

        let room = Room::from_record(record("r", 100, Some(200.0), 10.0)).unwrap();
        assert!((room.congestion_weight() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn occupied_room_without_area_is_rejected() {
        let err = Room::from_record(record("hall", 3, Some(0.0), 1.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidRoom { ref id, .. } if id == "hall"));

        let err = Room::from_record(record("hall", 3, None, 1.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidRoom { .. }));
    }

    #[test]
    fn overflowing_weight_is_rejected() {
        let err = Room::from_record(record("closet", 1, Some(1e-310), 1.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidRoom { ref id, .. } if id == "closet"));
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);

        let err = Room::from_record(record("atrium", 10, Some(1.0), 1e308)).unwrap_err();
        assert!(err.to_string().contains("congestion weight"));

        let err = Room::from_record(record("hall", 1, Some(1e-260), 1.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidRoom { .. }));
    }

    #[test]
    fn dense_but_bounded_room_is_accepted() {
        let room = Room::from_record(record("r", 1, Some(1e-200), 1.0)).unwrap();
        assert!(room.congestion_weight().is_finite());
    }

    #[test]
    fn negative_crowd_factor_is_rejected() {
        let err = Room::from_record(record("r", 1, Some(10.0), -0.5)).unwrap_err();
        assert!(err.to_string().contains("crowd_factor"));
    }

    #[test]
    fn record_defaults_apply_when_fields_are_missing() {
        let record: RoomRecord =
            serde_json::from_str(r#"{"id":"room1","name":"Room A","crowd_factor":5}"#).unwrap();
        assert_eq!(record.occupants, 0);
        assert_eq!(record.area, None);
        assert_eq!(record.floor, 0);

        let room = Room::from_record(record).unwrap();
        assert_eq!(room.name.as_deref(), Some("Room A"));
        assert_eq!(room.crowd_factor, 5.0);
    }
}
