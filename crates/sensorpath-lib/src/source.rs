use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::floorplan::Floorplan;
use crate::room::RoomRecord;
use crate::sensor::SensorRecord;

/// Base URL of the rooms/sensors data service when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8002";

/// Raw room and sensor records as supplied by a data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub rooms: Vec<RoomRecord>,
    #[serde(default)]
    pub sensors: Vec<SensorRecord>,
}

impl Payload {
    /// Validate and cross-link the records.
    pub fn into_floorplan(self) -> Result<Floorplan> {
        Floorplan::from_records(self.rooms, self.sensors)
    }
}

/// Anything that can supply room and sensor records.
pub trait FloorplanSource {
    fn fetch(&self) -> Result<Payload>;
}

/// JSON payload stored on disk, shaped `{ "rooms": [...], "sensors": [...] }`.
#[derive(Debug, Clone)]
pub struct PayloadFile {
    path: PathBuf,
}

impl PayloadFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FloorplanSource for PayloadFile {
    fn fetch(&self) -> Result<Payload> {
        debug!(path = %self.path.display(), "reading payload file");
        let contents = fs::read_to_string(&self.path)?;
        let payload: Payload = serde_json::from_str(&contents)?;
        info!(
            rooms = payload.rooms.len(),
            sensors = payload.sensors.len(),
            "loaded payload file"
        );
        Ok(payload)
    }
}

/// Rooms/sensors data service reached over HTTP.
///
/// Issues `GET {base_url}/rooms/` and `GET {base_url}/sensors/`. Each
/// response may be a bare JSON array or an object holding the array under
/// `"rooms"` or `"sensors"`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    client: Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            client: build_client()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_listing<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>> {
        let url = format!("{}/{resource}/", self.base_url);
        debug!(url = %url, "fetching listing");
        let value: Value = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()?
            .error_for_status()?
            .json()?;
        extract_listing(value, resource)
    }
}

impl FloorplanSource for HttpSource {
    fn fetch(&self) -> Result<Payload> {
        let rooms: Vec<RoomRecord> = self.get_listing("rooms")?;
        let sensors: Vec<SensorRecord> = self.get_listing("sensors")?;
        info!(
            base_url = %self.base_url,
            rooms = rooms.len(),
            sensors = sensors.len(),
            "fetched floorplan"
        );
        Ok(Payload { rooms, sensors })
    }
}

/// Accept either `[...]` or `{ "<key>": [...] }`.
pub fn extract_listing<T: DeserializeOwned>(value: Value, key: &str) -> Result<Vec<T>> {
    let list = match value {
        Value::Object(mut map) if map.contains_key(key) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(user_agent())
        .build()
        .map_err(Error::Http)
}

fn user_agent() -> String {
    format!("sensorpath-lib/{version}", version = env!("CARGO_PKG_VERSION"))
}
