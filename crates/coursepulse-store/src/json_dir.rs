//! A store keeping each key as `<dir>/<key>.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use coursepulse_core::error::StoreError;
use coursepulse_core::store::{KeyValueStore, StoreKey};

/// Directory-backed key-value store.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Open the store at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key`.
    pub fn path_of(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl KeyValueStore for JsonDirStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_of(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Valid JSON is pretty-printed; anything else is written as given.
    /// The file is replaced by rename so readers never see a partial write.
    fn put(&mut self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        let content = serde_json::from_str::<serde_json::Value>(value)
            .and_then(|v| serde_json::to_string_pretty(&v))
            .unwrap_or_else(|_| value.to_string());

        let path = self.path_of(key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source: std::io::Error| StoreError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::write(&tmp, content).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;
        tracing::trace!(key = %key, path = %path.display(), "store key written");
        Ok(())
    }
}
