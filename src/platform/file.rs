//! Directory-backed storage for native builds
//!
//! One file per key. Writes go to `<file>.tmp` first and are renamed over the
//! record, so a crash mid-write never leaves a torn record behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::BackendError;
use crate::platform::Storage;

const RECORD_EXT: &str = "json";

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| BackendError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the record for `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{RECORD_EXT}", escape_key(key)))
    }
}

/// Map an arbitrary key to a portable file stem. ASCII alphanumerics, `-` and
/// `_` pass through; every other byte becomes `%XX`.
fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackendError::io(path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{RECORD_EXT}.tmp"));

        fs::write(&tmp, value).map_err(|e| BackendError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| BackendError::io(&path, e))?;

        log::debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::io(path, e)),
        }
    }
}
