use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::atomic_io::write_text_atomic;

pub const HIGH_SCORE_KEY: &str = "High Score";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access prefs file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode prefs for {path}: {message}")]
    Encode { path: PathBuf, message: String },
}

pub trait PrefsStore {
    fn get_float(&mut self, key: &str) -> Result<Option<f32>, StoreError>;
    fn set_float(&mut self, key: &str, value: f32) -> Result<(), StoreError>;
    fn delete_key(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryPrefs {
    entries: BTreeMap<String, f32>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: f32) -> Self {
        self.entries.insert(key.to_string(), value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PrefsStore for MemoryPrefs {
    fn get_float(&mut self, key: &str) -> Result<Option<f32>, StoreError> {
        Ok(self.entries.get(key).copied())
    }

    fn set_float(&mut self, key: &str, value: f32) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete_key(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Debug)]
pub struct JsonFilePrefs {
    path: PathBuf,
    entries: Option<BTreeMap<String, f32>>,
}

impl JsonFilePrefs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries_mut(&mut self) -> Result<&mut BTreeMap<String, f32>, StoreError> {
        if self.entries.is_none() {
            self.entries = Some(read_entries(&self.path)?);
        }
        Ok(self.entries.get_or_insert_with(BTreeMap::new))
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        let path = self.path.clone();
        let entries = self.entries_mut()?;
        let text = serde_json::to_string_pretty(entries).map_err(|error| StoreError::Encode {
            path: path.clone(),
            message: error.to_string(),
        })?;
        write_text_atomic(&path, &text).map_err(|source| StoreError::Io { path, source })
    }
}

impl PrefsStore for JsonFilePrefs {
    fn get_float(&mut self, key: &str) -> Result<Option<f32>, StoreError> {
        Ok(self.entries_mut()?.get(key).copied())
    }

    fn set_float(&mut self, key: &str, value: f32) -> Result<(), StoreError> {
        self.entries_mut()?.insert(key.to_string(), value);
        self.flush()?;
        debug!(key, value, path = %self.path.display(), "prefs_written");
        Ok(())
    }

    fn delete_key(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries_mut()?.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, f32>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match serde_json::from_str::<BTreeMap<String, f32>>(&raw) {
        Ok(entries) => Ok(entries),
        Err(error) => {
            warn!(
                path = %path.display(),
                error = %error,
                "prefs_file_unreadable; starting from empty prefs"
            );
            Ok(BTreeMap::new())
        }
    }
}
