use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::CacheError;
use crate::manifest::validate_version;
use crate::request::{Request, Response};

const INDEX_FILE: &str = "index.json";
const BLOBS_DIR: &str = "blobs";
const STAGING_PREFIX: &str = ".staging-";
/// Names the version that was last activated.
const ACTIVE_FILE: &str = "ACTIVE";

/// One cache version: request URL → stored response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cache {
    entries: BTreeMap<String, Response>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, response: Response) {
        self.entries.insert(url.into(), response);
    }

    pub fn match_request(&self, request: &Request) -> Option<&Response> {
        self.entries.get(&request.url)
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every stored cache version, optionally mirrored to a directory.
///
/// On disk each version is `<dir>/<version>/index.json` plus bodies under
/// `blobs/`, named by their blake3 hash. A version is staged in a hidden
/// sibling directory and renamed into place, so readers see all of it or none.
/// The last activated version is recorded in `<dir>/ACTIVE`.
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: BTreeMap<String, Cache>,
    active: Option<String>,
    dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexEntry {
    status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    /// blake3 hex of the body.
    body: String,
}

impl CacheStorage {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (creating if needed) a directory-backed storage and load every
    /// complete version in it. Leftover staging directories are removed.
    pub fn open_dir(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let mut caches = BTreeMap::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(STAGING_PREFIX) {
                tracing::debug!(name = %name, "removing interrupted cache staging dir");
                let _ = fs::remove_dir_all(entry.path());
                continue;
            }
            if validate_version(&name).is_err() {
                tracing::warn!(name = %name, "ignoring directory with an invalid version name");
                continue;
            }
            match read_version(&entry.path()) {
                Ok(cache) => {
                    caches.insert(name, cache);
                }
                Err(err) => {
                    tracing::warn!(version = %name, %err, "skipping unreadable cache version");
                }
            }
        }
        let active = read_active(&dir, &caches);
        Ok(Self {
            caches,
            active,
            dir: Some(dir),
        })
    }

    /// Stored version identifiers, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    pub fn has(&self, version: &str) -> bool {
        self.caches.contains_key(version)
    }

    pub fn get(&self, version: &str) -> Option<&Cache> {
        self.caches.get(version)
    }

    /// Store `cache` as `version`, replacing any previous contents wholesale.
    pub fn put(&mut self, version: &str, cache: Cache) -> Result<(), CacheError> {
        validate_version(version)?;
        if let Some(dir) = &self.dir {
            write_version(dir, version, &cache)?;
        }
        self.caches.insert(version.to_string(), cache);
        Ok(())
    }

    /// Returns whether `version` existed. Deleting the active version also
    /// forgets that it was active.
    pub fn delete(&mut self, version: &str) -> Result<bool, CacheError> {
        validate_version(version)?;
        if self.active.as_deref() == Some(version) {
            if let Some(dir) = &self.dir {
                if let Err(e) = fs::remove_file(dir.join(ACTIVE_FILE)) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        return Err(e.into());
                    }
                }
            }
            self.active = None;
        }
        if let Some(dir) = &self.dir {
            let path = dir.join(version);
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            }
        }
        Ok(self.caches.remove(version).is_some())
    }

    /// The last version recorded by [`CacheStorage::set_active`], if it is
    /// still stored.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Record `version` as the one serving requests. It must already be stored.
    pub fn set_active(&mut self, version: &str) -> Result<(), CacheError> {
        validate_version(version)?;
        if !self.has(version) {
            return Err(CacheError::Manifest(format!(
                "cannot activate {version}: it is not stored"
            )));
        }
        if let Some(dir) = &self.dir {
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(version.as_bytes())?;
            tmp.flush()?;
            tmp.persist(dir.join(ACTIVE_FILE)).map_err(|e| e.error)?;
        }
        self.active = Some(version.to_string());
        Ok(())
    }
}

fn read_active(dir: &Path, caches: &BTreeMap<String, Cache>) -> Option<String> {
    let raw = match fs::read_to_string(dir.join(ACTIVE_FILE)) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::warn!(%err, "unreadable active cache marker; ignoring it");
            return None;
        }
    };
    let version = raw.trim();
    if caches.contains_key(version) {
        Some(version.to_string())
    } else {
        tracing::warn!(version, "active cache marker names a version that is not stored");
        None
    }
}

fn read_version(path: &Path) -> Result<Cache, CacheError> {
    let index: BTreeMap<String, IndexEntry> =
        serde_json::from_str(&fs::read_to_string(path.join(INDEX_FILE))?)?;
    let blobs = path.join(BLOBS_DIR);
    let mut cache = Cache::new();
    for (url, entry) in index {
        let body = fs::read(blobs.join(&entry.body))?;
        cache.insert(
            url,
            Response {
                status: entry.status,
                content_type: entry.content_type,
                body,
            },
        );
    }
    Ok(cache)
}

fn write_version(dir: &Path, version: &str, cache: &Cache) -> Result<(), CacheError> {
    fs::create_dir_all(dir)?;
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(dir)?;
    let blobs = staging.path().join(BLOBS_DIR);
    fs::create_dir_all(&blobs)?;

    let mut index = BTreeMap::new();
    for (url, response) in &cache.entries {
        let hash = blake3::hash(&response.body).to_hex().to_string();
        let blob_path = blobs.join(&hash);
        if !blob_path.exists() {
            fs::write(&blob_path, &response.body)?;
        }
        index.insert(
            url.clone(),
            IndexEntry {
                status: response.status,
                content_type: response.content_type.clone(),
                body: hash,
            },
        );
    }
    fs::write(
        staging.path().join(INDEX_FILE),
        serde_json::to_string_pretty(&index)?,
    )?;

    let target = dir.join(version);
    if target.exists() {
        // Move the old copy aside; it is deleted when `retired` drops.
        let retired = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(dir)?;
        let old = retired.path().join("old");
        fs::rename(&target, &old)?;
        fs::rename(staging.path(), &target)?;
        return Ok(());
    }
    fs::rename(staging.path(), &target)?;
    Ok(())
}
