use std::sync::Arc;

use crate::error::CacheError;
use crate::lifecycle::{OfflineCacheManager, Served, ServedFrom, SharedStorage};
use crate::manifest::CacheManifest;
use crate::network::Network;
use crate::request::Request;
use crate::storage::CacheStorage;

/// Result of [`Registration::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The manifest's version is already the active one; nothing was fetched.
    AlreadyActive { version: String },
    Activated {
        version: String,
        /// Versions pruned during activation.
        deleted: Vec<String>,
    },
}

/// Owns the active worker for one origin and routes fetches through it.
pub struct Registration {
    storage: SharedStorage,
    network: Arc<dyn Network>,
    active: Option<OfflineCacheManager>,
}

impl Registration {
    /// No active worker yet; fetches go straight to the network.
    pub fn new(storage: SharedStorage, network: Arc<dyn Network>) -> Self {
        Self {
            storage,
            network,
            active: None,
        }
    }

    /// Pick up where a previous run left off. The version recorded as active
    /// in storage is resumed without refetching, even when `manifest` names a
    /// newer version that never finished installing. With no recorded
    /// version, `manifest`'s version is resumed if it is stored.
    pub async fn restore(
        storage: SharedStorage,
        network: Arc<dyn Network>,
        manifest: &CacheManifest,
    ) -> Self {
        let resumed = {
            let guard = storage.read().await;
            match guard.active() {
                Some(version) if version == manifest.version => Some(manifest.clone()),
                Some(version) => stored_manifest(&guard, version),
                None if guard.has(&manifest.version) => Some(manifest.clone()),
                None => None,
            }
        };
        let active = resumed.map(|resumed| {
            tracing::debug!(version = %resumed.version, "resuming active cache version");
            OfflineCacheManager::resume_active(resumed, storage.clone(), network.clone())
        });
        Self {
            storage,
            network,
            active,
        }
    }

    pub fn active(&self) -> Option<&OfflineCacheManager> {
        self.active.as_ref()
    }

    pub fn active_version(&self) -> Option<&str> {
        self.active.as_ref().map(|w| w.version())
    }

    /// Install and activate `manifest`. On failure the previous active
    /// worker, if any, stays in charge.
    pub async fn update(&mut self, manifest: CacheManifest) -> Result<UpdateOutcome, CacheError> {
        if self.active_version() == Some(manifest.version.as_str()) {
            return Ok(UpdateOutcome::AlreadyActive {
                version: manifest.version,
            });
        }

        let mut worker =
            OfflineCacheManager::new(manifest, self.storage.clone(), self.network.clone());
        worker.on_install().await?;
        let deleted = worker.on_activate().await?;
        let version = worker.version().to_string();

        if let Some(mut previous) = self.active.replace(worker) {
            previous.retire()?;
            tracing::debug!(from = %previous.version(), to = %version, "cache version replaced");
        }
        Ok(UpdateOutcome::Activated { version, deleted })
    }

    /// Cache-first through the active worker; with no active worker every
    /// request goes to the network.
    pub async fn fetch(&self, request: &Request) -> Result<Served, CacheError> {
        match &self.active {
            Some(worker) => worker.on_fetch(request).await,
            None => {
                let response = self.network.fetch(request).await?;
                Ok(Served {
                    response,
                    from: ServedFrom::Network,
                })
            }
        }
    }

    /// Every stored cache version, sorted.
    pub async fn versions(&self) -> Vec<String> {
        self.storage.read().await.keys()
    }
}

/// The manifest a stored version was installed from, rebuilt from its URLs.
fn stored_manifest(storage: &CacheStorage, version: &str) -> Option<CacheManifest> {
    let cache = storage.get(version)?;
    match CacheManifest::new(version, cache.urls()) {
        Ok(manifest) => Some(manifest),
        Err(err) => {
            tracing::warn!(version, %err, "cannot resume stored cache version");
            None
        }
    }
}
