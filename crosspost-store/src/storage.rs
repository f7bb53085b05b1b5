use crosspost_common::{CrosspostError, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// String key/value persistence, one value per key, last write wins.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(CrosspostError::Storage(format!("invalid storage key `{key}`")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CrosspostError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            CrosspostError::Storage(format!("failed to create {}: {e}", self.dir.display()))
        })?;

        // Write beside the target and rename so readers never see a torn file.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| CrosspostError::Storage(format!("temp file: {e}")))?;
        tmp.write_all(value.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| CrosspostError::Storage(format!("write {}: {e}", path.display())))?;
        tmp.persist(&path)
            .map_err(|e| CrosspostError::Storage(format!("replace {}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), bytes = value.len(), "storage.file.write");
        Ok(())
    }
}

/// In-process storage for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        storage
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CrosspostError::Storage("memory storage lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CrosspostError::Storage("memory storage lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_round_trips_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get("session").unwrap(), None);
        storage.set("session", "[1]").unwrap();
        storage.set("session", "[1,2]").unwrap();
        assert_eq!(storage.get("session").unwrap().as_deref(), Some("[1,2]"));
        assert!(dir.path().join("nested").join("session.json").exists());
    }

    #[test]
    fn rejects_path_like_keys() {
        let storage = FileStorage::new("/tmp");
        assert!(storage.path_for("../etc/passwd").is_err());
        assert!(storage.path_for("").is_err());
        assert!(storage.path_for(".hidden").is_err());
    }

    #[test]
    fn memory_storage_is_keyed() {
        let storage = MemoryStorage::with_entry("a", "1");
        storage.set("b", "2").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
        assert_eq!(storage.get("c").unwrap(), None);
    }
}
