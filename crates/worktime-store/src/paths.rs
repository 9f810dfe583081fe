use std::path::{Path, PathBuf};

/// All well-known paths under the store root.
#[derive(Debug, Clone)]
pub struct WorktimePaths {
    pub root: PathBuf,
    /// One file per persisted key.
    pub state_dir: PathBuf,
    /// Offline cache versions.
    pub cache_dir: PathBuf,
    pub config_json: PathBuf,
}

impl WorktimePaths {
    /// Derive all paths from a root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            state_dir: root.join("state"),
            cache_dir: root.join("cache"),
            config_json: root.join("config.json"),
            root,
        }
    }

    /// Paths under [`crate::store_root`].
    pub fn from_env() -> Self {
        Self::discover(crate::store_root())
    }

    /// Create all required directories. Idempotent.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        for dir in [&self.state_dir, &self.cache_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
