//! JSON save files on the local disk.

use crate::errors::PersistenceError;
use crate::persistence::record::SaveRecord;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores one save per player key as `{key}.json` under a directory.
#[derive(Debug, Clone)]
pub struct LocalSaveStore {
    save_dir: PathBuf,
}

impl LocalSaveStore {
    pub fn new(save_dir: impl AsRef<Path>) -> Self {
        Self {
            save_dir: save_dir.as_ref().to_path_buf(),
        }
    }

    pub fn save_path(&self, key: &str) -> PathBuf {
        self.save_dir.join(format!("{}.json", sanitize_key(key)))
    }

    /// Write the record through a temp file and rename it into place.
    pub fn save(&self, key: &str, record: &SaveRecord) -> Result<PathBuf, PersistenceError> {
        fs::create_dir_all(&self.save_dir).map_err(|source| PersistenceError::Io {
            path: self.save_dir.clone(),
            source,
        })?;

        let path = self.save_path(key);
        let temp_path = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;

        fs::write(&temp_path, bytes).map_err(|source| PersistenceError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &path).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = %path.display(), "saved game locally");
        Ok(path)
    }

    /// `Ok(None)` when no save exists for `key`.
    pub fn load(&self, key: &str) -> Result<Option<SaveRecord>, PersistenceError> {
        let path = self.save_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;
        let record: SaveRecord = serde_json::from_slice(&bytes)?;

        tracing::info!(path = %path.display(), "loaded local save");
        Ok(Some(record))
    }
}

/// Keep keys usable as file names.
fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "save".to_string()
    } else {
        cleaned
    }
}
