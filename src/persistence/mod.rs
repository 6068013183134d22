//! Track documents, key-value persistence and archive import/export.
//!
//! Tracks live under `track:<id>` with a summary index under `tracks`; the
//! catalog's custom elements live under `customElements`.

mod archive;
mod chunk;
mod document;
mod format;
mod store;

pub use archive::{export_track, import_track, pack, unpack, ArchiveFile, ExportMetadata};
pub use chunk::{ChunkHeader, ChunkReader, ChunkWriter};
pub use document::{BestTime, Track, MAX_BEST_TIMES};
pub use format::*;
pub use store::{load_json, save_json, DirectoryStore, KeyValueStore, MemoryStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{DefinitionStore, TrackElement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    InvalidMagic,
    UnsupportedVersion { expected: u32, found: u32 },
    TruncatedData,
    CorruptedData,
    MissingEntry(String),
    LoadFailed(String),
    ParseFailed(String),
    SerializeFailed(String),
    SaveFailed(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::InvalidMagic => write!(f, "Invalid archive magic (expected TRKA)"),
            PersistenceError::UnsupportedVersion { expected, found } => {
                write!(f, "Unsupported version: expected {expected}, found {found}")
            }
            PersistenceError::TruncatedData => write!(f, "Truncated data"),
            PersistenceError::CorruptedData => write!(f, "Corrupted data"),
            PersistenceError::MissingEntry(name) => write!(f, "Archive has no '{name}'"),
            PersistenceError::LoadFailed(msg) => write!(f, "Failed to load: {msg}"),
            PersistenceError::ParseFailed(msg) => write!(f, "Failed to parse: {msg}"),
            PersistenceError::SerializeFailed(msg) => write!(f, "Failed to serialize: {msg}"),
            PersistenceError::SaveFailed(msg) => write!(f, "Failed to save: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Entry of the saved-tracks index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: String,
    pub name: String,
    pub modified_at: DateTime<Utc>,
}

impl TrackSummary {
    fn of(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            name: track.name.clone(),
            modified_at: track.modified_at,
        }
    }
}

fn track_key(id: &str) -> String {
    format!("{TRACK_KEY_PREFIX}{id}")
}

/// Writes the track and upserts its index entry.
///
/// If the index write fails the previous track entry is put back, so the
/// index never lists a track whose body it does not describe.
///
/// # Errors
/// Returns error if the store refuses either write
pub fn save_track<S: KeyValueStore + ?Sized>(store: &mut S, track: &Track) -> Result<(), PersistenceError> {
    let key = track_key(&track.id);
    let mut index = list_tracks(store)?;
    match index.iter_mut().find(|s| s.id == track.id) {
        Some(entry) => *entry = TrackSummary::of(track),
        None => index.push(TrackSummary::of(track)),
    }

    let previous = store.get(&key)?;
    save_json(store, &key, track)?;
    if let Err(err) = save_json(store, TRACK_INDEX_KEY, &index) {
        let rollback = match &previous {
            Some(old) => store.set(&key, old),
            None => store.remove(&key),
        };
        if let Err(rollback_err) = rollback {
            warn!(id = %track.id, %rollback_err, "could not restore track after index write failed");
        }
        return Err(err);
    }
    debug!(id = %track.id, "track saved");
    Ok(())
}

/// # Errors
/// Returns error if the store cannot be read or the track JSON does not parse
pub fn load_track<S: KeyValueStore + ?Sized>(store: &S, id: &str) -> Result<Option<Track>, PersistenceError> {
    load_json(store, &track_key(id), None)
}

/// # Errors
/// Returns error if the index cannot be read or parsed
pub fn list_tracks<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<TrackSummary>, PersistenceError> {
    load_json(store, TRACK_INDEX_KEY, Vec::new())
}

/// Removes the track and its index entry. Returns whether it was listed.
///
/// # Errors
/// Returns error if the store refuses the removal
pub fn delete_track<S: KeyValueStore + ?Sized>(store: &mut S, id: &str) -> Result<bool, PersistenceError> {
    let mut index = list_tracks(store)?;
    let before = index.len();
    index.retain(|s| s.id != id);
    store.remove(&track_key(id))?;
    if index.len() == before {
        return Ok(false);
    }
    save_json(store, TRACK_INDEX_KEY, &index)?;
    debug!(id, "track deleted");
    Ok(true)
}

/// Persists only the non-default part of the catalog.
///
/// # Errors
/// Returns error if the store refuses the write
pub fn save_custom_elements<S: KeyValueStore + ?Sized>(
    store: &mut S,
    catalog: &DefinitionStore,
) -> Result<(), PersistenceError> {
    let custom: Vec<&TrackElement> = catalog.custom_elements().collect();
    save_json(store, CUSTOM_ELEMENTS_KEY, &custom)
}

/// Loads the stored custom elements and merges them into `catalog`.
/// Returns how many were accepted.
///
/// # Errors
/// Returns error if the stored list cannot be read or parsed
pub fn load_custom_elements<S: KeyValueStore + ?Sized>(
    store: &S,
    catalog: &mut DefinitionStore,
) -> Result<usize, PersistenceError> {
    let custom: Vec<TrackElement> = load_json(store, CUSTOM_ELEMENTS_KEY, Vec::new())?;
    let offered = custom.len();
    let accepted = catalog.merge_custom(custom);
    if accepted < offered {
        warn!(offered, accepted, "some stored custom elements were dropped");
    }
    Ok(accepted)
}
