//! Track export/import as a chunked archive of named files.
//!
//! Layout: `TRKA` magic, u32 archive version, then one `FILE` chunk per entry
//! holding a length-prefixed name and a length-prefixed payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::chunk::{ChunkReader, ChunkWriter};
use super::document::Track;
use super::format::*;
use super::PersistenceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl ArchiveFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub format_version: u32,
    pub game_version: String,
    pub export_date: DateTime<Utc>,
}

impl ExportMetadata {
    pub fn current() -> Self {
        Self {
            format_version: EXPORT_FORMAT_VERSION,
            game_version: GAME_VERSION.to_string(),
            export_date: Utc::now(),
        }
    }
}

pub fn pack(files: &[ArchiveFile]) -> Vec<u8> {
    let mut writer = ChunkWriter::new();
    for b in MAGIC {
        writer.write_byte(b);
    }
    writer.write_u32(ARCHIVE_VERSION);

    for file in files {
        writer.begin_chunk(CHUNK_FILE, FILE_CHUNK_VERSION);
        writer.write_string(&file.name);
        writer.write_bytes(&file.content);
        writer.end_chunk();
    }
    writer.into_bytes()
}

/// # Errors
/// Returns error on bad magic, a newer archive version or truncated chunks
pub fn unpack(data: &[u8]) -> Result<Vec<ArchiveFile>, PersistenceError> {
    let mut reader = ChunkReader::new(data);
    if reader.remaining() < 8 {
        return Err(PersistenceError::TruncatedData);
    }

    let mut magic = [0u8; 4];
    for byte in &mut magic {
        *byte = reader.read_byte()?;
    }
    if magic != MAGIC {
        return Err(PersistenceError::InvalidMagic);
    }

    let version = reader.read_u32()?;
    if version > ARCHIVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            expected: ARCHIVE_VERSION,
            found: version,
        });
    }

    let mut files = Vec::new();
    while reader.has_data() {
        let header = reader.try_read_header()?;
        if header.chunk_type != CHUNK_FILE {
            debug!(chunk = ?header.chunk_type, "skipping unknown archive chunk");
            reader.skip_chunk(&header)?;
            continue;
        }
        let end = reader.position() + header.length as usize;
        let name = reader.read_string()?;
        let content = reader.read_bytes()?;
        if reader.position() != end {
            return Err(PersistenceError::CorruptedData);
        }
        files.push(ArchiveFile { name, content });
    }
    Ok(files)
}

/// Packs `track.json` and `metadata.json` into an archive.
///
/// # Errors
/// Returns error if the track cannot be serialized
pub fn export_track(track: &Track) -> Result<Vec<u8>, PersistenceError> {
    let track_json = serde_json::to_vec_pretty(track)
        .map_err(|e| PersistenceError::SerializeFailed(e.to_string()))?;
    let metadata_json = serde_json::to_vec_pretty(&ExportMetadata::current())
        .map_err(|e| PersistenceError::SerializeFailed(e.to_string()))?;

    Ok(pack(&[
        ArchiveFile::new(TRACK_FILE, track_json),
        ArchiveFile::new(METADATA_FILE, metadata_json),
    ]))
}

/// Reads a track back out of an exported archive.
///
/// # Errors
/// Returns error if an entry is missing, the export format is newer than this
/// build understands, or the JSON does not parse
pub fn import_track(data: &[u8]) -> Result<Track, PersistenceError> {
    let files = unpack(data)?;
    let entry = |name: &str| {
        files
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| PersistenceError::MissingEntry(name.to_string()))
    };

    let metadata: ExportMetadata = serde_json::from_slice(&entry(METADATA_FILE)?.content)
        .map_err(|e| PersistenceError::ParseFailed(e.to_string()))?;
    if metadata.format_version > EXPORT_FORMAT_VERSION {
        warn!(found = metadata.format_version, "refusing track export from a newer format");
        return Err(PersistenceError::UnsupportedVersion {
            expected: EXPORT_FORMAT_VERSION,
            found: metadata.format_version,
        });
    }

    serde_json::from_slice(&entry(TRACK_FILE)?.content)
        .map_err(|e| PersistenceError::ParseFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::BestTime;

    #[test]
    fn pack_then_unpack_preserves_entries() {
        let files = vec![
            ArchiveFile::new("a.txt", b"hello".to_vec()),
            ArchiveFile::new("empty.bin", Vec::new()),
        ];
        assert_eq!(unpack(&pack(&files)).unwrap(), files);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut data = pack(&[]);
        data[0] = b'X';
        assert_eq!(unpack(&data), Err(PersistenceError::InvalidMagic));
        assert_eq!(unpack(b"TRK"), Err(PersistenceError::TruncatedData));
    }

    #[test]
    fn newer_archive_version_is_rejected() {
        let mut data = pack(&[]);
        data[4..8].copy_from_slice(&(ARCHIVE_VERSION + 1).to_le_bytes());
        assert!(matches!(
            unpack(&data),
            Err(PersistenceError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn truncated_chunk_is_rejected() {
        let data = pack(&[ArchiveFile::new("a", b"payload".to_vec())]);
        assert_eq!(
            unpack(&data[..data.len() - 2]),
            Err(PersistenceError::TruncatedData)
        );
    }

    #[test]
    fn export_import_round_trip() {
        let mut track = Track::new("t-9", "Export me", "kim");
        track.add_best_time(BestTime::new("kim", 42.0));
        let archive = export_track(&track).unwrap();

        let names: Vec<String> = unpack(&archive).unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec![TRACK_FILE, METADATA_FILE]);
        assert_eq!(import_track(&archive).unwrap(), track);
    }

    #[test]
    fn import_requires_both_entries() {
        let data = pack(&[ArchiveFile::new(METADATA_FILE, b"{}".to_vec())]);
        assert!(matches!(import_track(&data), Err(PersistenceError::ParseFailed(_))));

        let metadata = serde_json::to_vec(&ExportMetadata::current()).unwrap();
        let data = pack(&[ArchiveFile::new(METADATA_FILE, metadata)]);
        assert_eq!(
            import_track(&data),
            Err(PersistenceError::MissingEntry(TRACK_FILE.to_string()))
        );
    }

    #[test]
    fn newer_export_format_is_refused() {
        let track = serde_json::to_vec(&Track::new("t", "n", "a")).unwrap();
        let metadata = serde_json::to_vec(&ExportMetadata {
            format_version: EXPORT_FORMAT_VERSION + 1,
            ..ExportMetadata::current()
        })
        .unwrap();
        let data = pack(&[
            ArchiveFile::new(TRACK_FILE, track),
            ArchiveFile::new(METADATA_FILE, metadata),
        ]);
        assert!(matches!(
            import_track(&data),
            Err(PersistenceError::UnsupportedVersion { .. })
        ));
    }
}
