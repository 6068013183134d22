//! String key-value stores and JSON helpers on top of them.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::PersistenceError;

/// Minimal blob store the editor persists into.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// In-memory store. Can be switched read-only to exercise write failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn check_writable(&self, key: &str) -> Result<(), PersistenceError> {
        if self.read_only {
            return Err(PersistenceError::SaveFailed(format!("store is read-only: {key}")));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.check_writable(key)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.check_writable(key)?;
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per entry under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// # Errors
    /// Returns error if the directory cannot be created
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, PersistenceError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| PersistenceError::SaveFailed(e.to_string()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_key(key)))
    }
}

/// Maps a key onto a portable file stem; anything outside `[A-Za-z0-9_-]` is `%XX` escaped.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

impl KeyValueStore for DirectoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::LoadFailed(e.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::write(self.path_for(key), value).map_err(|e| PersistenceError::SaveFailed(e.to_string()))
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::SaveFailed(e.to_string())),
        }
    }
}

/// Reads and parses `key`, or returns `default` when the key is absent.
///
/// # Errors
/// Returns error if the store cannot be read or the stored JSON does not parse
pub fn load_json<T, S>(store: &S, key: &str, default: T) -> Result<T, PersistenceError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(contents) => {
            serde_json::from_str(&contents).map_err(|e| PersistenceError::ParseFailed(e.to_string()))
        }
        None => Ok(default),
    }
}

/// # Errors
/// Returns error if the value cannot be serialized or the store refuses the write
pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), PersistenceError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let contents = serde_json::to_string_pretty(value)
        .map_err(|e| PersistenceError::SerializeFailed(e.to_string()))?;
    store.set(key, &contents)
}
