use serde::{Deserialize, Serialize};

use crate::room::RoomId;

/// Opaque sensor identifier as supplied by the sensors service.
pub type SensorId = String;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPosition {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Great-circle distance to another position in kilometers.
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(self, other)
    }
}

/// Haversine distance between two positions in kilometers.
pub fn haversine_km(a: &GeoPosition, b: &GeoPosition) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Sensor record as received from the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub id: SensorId,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub is_vertical: bool,
    /// Identifiers of the rooms this sensor borders.
    #[serde(default)]
    pub rooms: Vec<RoomId>,
}

/// Positioned doorway, opening or stair instrumented for occupancy counting.
///
/// `rooms` holds indices into the owning [`Floorplan`](crate::Floorplan)'s
/// room table, in the order the record listed them. Rooms never point back
/// at sensors.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub id: SensorId,
    pub position: GeoPosition,
    /// Marks stairways and elevators as opposed to floor-level doorways.
    pub is_vertical: bool,
    pub rooms: Vec<usize>,
}

impl Sensor {
    /// Distance to another sensor in kilometers.
    pub fn distance_km(&self, other: &Sensor) -> f64 {
        haversine_km(&self.position, &other.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_is_zero_for_identical_points() {
        let p = GeoPosition::new(12.34, 56.78);
        assert_eq!(haversine_km(&p, &p), 0.0);
    }

    #[test]
    fn haversine_is_symmetric() {
        let pairs = [
            (GeoPosition::new(16.3695, 23.8621), GeoPosition::new(61.7472, 72.8744)),
            (GeoPosition::new(-0.1276, 51.5072), GeoPosition::new(2.3522, 48.8566)),
            (GeoPosition::new(179.9, 0.0), GeoPosition::new(-179.9, 0.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(haversine_km(&a, &b), haversine_km(&b, &a));
        }
    }

    #[test]
    fn haversine_matches_known_distance() {
        // London to Paris is roughly 343.5 km along the great circle.
        let london = GeoPosition::new(-0.1276, 51.5072);
        let paris = GeoPosition::new(2.3522, 48.8566);
        let distance = london.distance_km(&paris);
        assert!((distance - 343.5).abs() < 1.0, "got {distance}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = GeoPosition::new(0.0, 0.0);
        let b = GeoPosition::new(0.0, 1.0);
        let expected = EARTH_RADIUS_KM * 1f64.to_radians();
        assert!((haversine_km(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn sensor_record_defaults() {
        let record: SensorRecord =
            serde_json::from_str(r#"{"id":"sensor2","longitude":1.0,"latitude":2.0}"#).unwrap();
        assert!(record.rooms.is_empty());
        assert!(!record.is_vertical);
    }
}
