use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CacheError;
use crate::request::normalize_url;

pub const DEFAULT_VERSION: &str = "worktime-v1";

/// The application shell precached by the default manifest.
pub const DEFAULT_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./style.css",
    "./app.js",
    "./manifest.json",
];

/// A versioned set of assets that is cached, and replaced, as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: String,
    pub assets: Vec<String>,
}

impl Default for CacheManifest {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            assets: DEFAULT_ASSETS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl CacheManifest {
    /// Build a manifest, normalizing asset URLs and dropping duplicates.
    pub fn new(
        version: impl Into<String>,
        assets: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, CacheError> {
        let version = version.into();
        validate_version(&version)?;
        let mut normalized: Vec<String> = Vec::new();
        for asset in assets {
            let url = normalize_url(asset.as_ref());
            if !normalized.contains(&url) {
                normalized.push(url);
            }
        }
        if normalized.is_empty() {
            return Err(CacheError::Manifest(format!(
                "manifest {version} lists no assets"
            )));
        }
        Ok(Self {
            version,
            assets: normalized,
        })
    }

    /// Load a deploy-time manifest from JSON (`{"version": ..., "assets": [...]}`).
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let content = std::fs::read_to_string(path)?;
        let raw: CacheManifest = serde_json::from_str(&content)?;
        Self::new(raw.version, raw.assets)
    }
}

/// Versions double as directory names on disk.
pub fn validate_version(version: &str) -> Result<(), CacheError> {
    let ok = !version.is_empty()
        && !version.starts_with('.')
        && version
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    if ok {
        Ok(())
    } else {
        Err(CacheError::Manifest(format!(
            "invalid cache version {version:?}"
        )))
    }
}
