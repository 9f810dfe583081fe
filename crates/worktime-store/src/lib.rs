pub mod config;
pub mod error;
pub mod kv;
pub mod paths;
pub mod persist;
pub mod session;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use paths::WorktimePaths;
pub use persist::{PersistedRecord, StatePersistence, MODE_KEY, SCHEMA_VERSION, STATE_KEY};
pub use session::Session;

use fs2::FileExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the store root.
pub const HOME_ENV: &str = "WORKTIME_HOME";

/// Return the per-user store root.
/// `$WORKTIME_HOME` wins; otherwise the platform data dir (`~/.local/share/worktime`,
/// `%APPDATA%\worktime`), falling back to `~/.worktime`.
pub fn store_root() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        PathBuf::from(home)
    } else if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("worktime")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".worktime")
    } else {
        PathBuf::from(".worktime-store")
    }
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("no parent dir for {}", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// File-based exclusive lock guard. Released on drop.
pub struct LockGuard {
    _file: fs::File,
}

/// Acquire an exclusive file lock. Creates the lock file if needed.
pub fn lock_file(path: &Path) -> StoreResult<LockGuard> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.lock_exclusive().map_err(|source| StoreError::Lock {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LockGuard { _file: file })
}
