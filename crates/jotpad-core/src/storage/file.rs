//! File-backed key-value store: one file per key inside a directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::{Error, Result};

const SLOT_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Use `dir` as the slot directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(Error::InvalidInput(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.{SLOT_EXTENSION}")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(Error::Storage(format!(
                "failed to read {}: {error}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        let temp_path = path.with_extension(format!("{SLOT_EXTENSION}.tmp"));

        fs::write(&temp_path, value).map_err(|error| {
            Error::Storage(format!("failed to write {}: {error}", temp_path.display()))
        })?;
        fs::rename(&temp_path, &path).map_err(|error| {
            Error::Storage(format!("failed to replace {}: {error}", path.display()))
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(Error::Storage(format!(
                "failed to remove {}: {error}",
                path.display()
            ))),
        }
    }
}
