//! JSON persistence for the organisation hierarchy and loaders for input data.

use occupancy_core::{Municipality, OccupancyConfig, PatientStay, WaitingListEntry};
use serde::de::DeserializeOwned;

mod backend;
mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use store::{HierarchyStore, NewRoom, DEFAULT_STORAGE_KEY, MAX_BEDS_PER_ROOM};

const SEED_MUNICIPALITY: &str = include_str!("../data/seed_municipality.json");

/// The static hierarchy used when nothing has been stored yet.
pub fn seed_municipality() -> Result<Municipality, StoreError> {
    from_json_str(SEED_MUNICIPALITY)
}

pub fn from_json_str<T: DeserializeOwned>(json: &str) -> Result<T, StoreError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads patient stays from a JSON array.
pub fn parse_stays_str(json: &str) -> Result<Vec<PatientStay>, StoreError> {
    from_json_str(json)
}

/// Reads waiting-list entries from a JSON array.
pub fn parse_waiting_list_str(json: &str) -> Result<Vec<WaitingListEntry>, StoreError> {
    from_json_str(json)
}

/// Reads a partial config; missing fields keep their defaults.
pub fn parse_config_str(json: &str) -> Result<OccupancyConfig, StoreError> {
    from_json_str(json)
}

/// Errors raised by storage backends and hierarchy edits.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Backend(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid room: {0}")]
    InvalidRoom(String),
}
