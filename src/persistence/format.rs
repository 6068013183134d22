//! Archive container and export format constants.

pub const MAGIC: [u8; 4] = [b'T', b'R', b'K', b'A'];

pub const ARCHIVE_VERSION: u32 = 1;
pub const FILE_CHUNK_VERSION: u32 = 1;

pub const CHUNK_FILE: [u8; 4] = [b'F', b'I', b'L', b'E'];

pub const CHUNK_HEADER_SIZE: usize = 12; // 4 type + 4 version + 4 length

/// Version written to `metadata.json`; imports with a newer version are refused.
pub const EXPORT_FORMAT_VERSION: u32 = 1;
pub const GAME_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const TRACK_FILE: &str = "track.json";
pub const METADATA_FILE: &str = "metadata.json";

pub const TRACK_INDEX_KEY: &str = "tracks";
pub const TRACK_KEY_PREFIX: &str = "track:";
pub const CUSTOM_ELEMENTS_KEY: &str = "customElements";
