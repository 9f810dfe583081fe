use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::{lock_file, write_atomic};

/// Flat string-to-string storage, the shape of a browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
}

/// Keys become file names, so only `[A-Za-z0-9_-]` is allowed.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

// ── In-memory ──

/// Process-local store. Used in tests and for `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored key (sorted).
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

// ── On disk ──

/// One file per key under `dir`. Writes are atomic (temp file + rename) and
/// serialized through an exclusive lock on `dir/.lock`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(".lock")
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.key_path(key)?;
        let _lock = lock_file(&self.lock_path())?;
        write_atomic(&path, value.as_bytes())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.key_path(key)?;
        if !self.dir.exists() {
            return Ok(());
        }
        let _lock = lock_file(&self.lock_path())?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get("alpha").unwrap(), None);
        store.set("alpha", "1").unwrap();
        store.set("beta", "two words").unwrap();
        assert_eq!(store.get("alpha").unwrap().as_deref(), Some("1"));
        store.set("alpha", "3").unwrap();
        assert_eq!(store.get("alpha").unwrap().as_deref(), Some("3"));
        store.remove("alpha").unwrap();
        store.remove("alpha").unwrap();
        assert_eq!(store.get("alpha").unwrap(), None);
        assert_eq!(store.get("beta").unwrap().as_deref(), Some("two words"));
    }

    #[test]
    fn memory_store_basic_ops() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn file_store_basic_ops() {
        let tmp = tempfile::tempdir().unwrap();
        exercise(&FileStore::new(tmp.path().join("state")));
    }

    #[test]
    fn file_store_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        FileStore::new(tmp.path()).set("wt_state", "{}").unwrap();
        let reopened = FileStore::new(tmp.path());
        assert_eq!(reopened.get("wt_state").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn remove_on_missing_dir_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("never-created"));
        store.remove("wt_state").unwrap();
        assert_eq!(store.get("wt_state").unwrap(), None);
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());
        for key in ["", "../escape", "a/b", ".lock", "with space"] {
            assert!(
                matches!(store.set(key, "x"), Err(StoreError::InvalidKey(_))),
                "{key:?} should be rejected"
            );
        }
        assert!(MemoryStore::new().get("a.b").is_err());
    }
}
