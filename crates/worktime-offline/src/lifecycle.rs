use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::manifest::CacheManifest;
use crate::network::Network;
use crate::request::{Request, Response};
use crate::storage::{Cache, CacheStorage};

/// Cache storage shared by every worker of one origin.
pub type SharedStorage = Arc<RwLock<CacheStorage>>;

pub fn shared(storage: CacheStorage) -> SharedStorage {
    Arc::new(RwLock::new(storage))
}

// ── Worker state ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Installing,
    Activating,
    Active,
    /// Failed to install or activate, or superseded by a newer version.
    Redundant,
}

const VALID_TRANSITIONS: &[(WorkerState, &[WorkerState])] = &[
    (
        WorkerState::Installing,
        &[WorkerState::Activating, WorkerState::Redundant],
    ),
    (
        WorkerState::Activating,
        &[WorkerState::Active, WorkerState::Redundant],
    ),
    (WorkerState::Active, &[WorkerState::Redundant]),
    // Redundant is terminal
];

fn is_valid_transition(from: WorkerState, to: WorkerState) -> bool {
    VALID_TRANSITIONS
        .iter()
        .any(|(f, targets)| *f == from && targets.contains(&to))
}

/// Where a fetched response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedFrom {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub from: ServedFrom,
}

// ── Manager ──

/// The offline cache lifecycle for one manifest version.
///
/// Each handler is an `async fn` that finishes its whole body (population,
/// pruning, lookup) before returning; the worker does not move on until the
/// returned future has completed.
pub struct OfflineCacheManager {
    manifest: CacheManifest,
    state: WorkerState,
    storage: SharedStorage,
    network: Arc<dyn Network>,
}

impl OfflineCacheManager {
    /// A fresh worker, waiting to install.
    pub fn new(manifest: CacheManifest, storage: SharedStorage, network: Arc<dyn Network>) -> Self {
        Self {
            manifest,
            state: WorkerState::Installing,
            storage,
            network,
        }
    }

    /// A worker whose version is already installed and activated, e.g. found
    /// in storage at startup.
    pub(crate) fn resume_active(
        manifest: CacheManifest,
        storage: SharedStorage,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            manifest,
            state: WorkerState::Active,
            storage,
            network,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    /// CAS-guarded transition: `from` must be the current state.
    fn transition(&mut self, from: WorkerState, to: WorkerState) -> Result<(), CacheError> {
        if self.state != from {
            return Err(CacheError::WrongState {
                version: self.manifest.version.clone(),
                state: self.state,
                expected: from,
            });
        }
        if !is_valid_transition(from, to) {
            return Err(CacheError::InvalidTransition { from, to });
        }
        tracing::debug!(version = %self.manifest.version, ?from, ?to, "cache worker transition");
        self.state = to;
        Ok(())
    }

    fn expect_state(&self, expected: WorkerState) -> Result<(), CacheError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CacheError::WrongState {
                version: self.manifest.version.clone(),
                state: self.state,
                expected,
            })
        }
    }

    /// Fetch every manifest asset and store them as one cache version.
    ///
    /// All or nothing: if any fetch fails or returns a non-2xx status, nothing
    /// is stored and the worker becomes redundant.
    pub async fn on_install(&mut self) -> Result<(), CacheError> {
        self.expect_state(WorkerState::Installing)?;
        match self.populate().await {
            Ok(()) => self.transition(WorkerState::Installing, WorkerState::Activating),
            Err(err) => {
                tracing::warn!(version = %self.manifest.version, %err, "cache install failed");
                self.transition(WorkerState::Installing, WorkerState::Redundant)?;
                Err(err)
            }
        }
    }

    async fn populate(&self) -> Result<(), CacheError> {
        let version = self.manifest.version.as_str();
        let network = &*self.network;
        let fetches = self.manifest.assets.iter().map(|url| async move {
            let request = Request::get(url);
            let response =
                network
                    .fetch(&request)
                    .await
                    .map_err(|source| CacheError::AssetFetch {
                        version: version.to_string(),
                        url: request.url.clone(),
                        source,
                    })?;
            if !response.is_ok() {
                return Err(CacheError::BadStatus {
                    version: version.to_string(),
                    url: request.url,
                    status: response.status,
                });
            }
            Ok::<_, CacheError>((request.url, response))
        });
        let fetched = try_join_all(fetches).await?;

        let mut cache = Cache::new();
        for (url, response) in fetched {
            cache.insert(url, response);
        }
        let count = cache.len();
        self.storage.write().await.put(version, cache)?;
        tracing::debug!(version, assets = count, "cache version stored");
        Ok(())
    }

    /// Record this version as active, then delete every other stored
    /// version. Returns the deleted ids.
    pub async fn on_activate(&mut self) -> Result<Vec<String>, CacheError> {
        self.expect_state(WorkerState::Activating)?;
        let pruned = {
            let mut storage = self.storage.write().await;
            promote(&mut storage, &self.manifest.version)
        };
        match pruned {
            Ok(deleted) => {
                self.transition(WorkerState::Activating, WorkerState::Active)?;
                tracing::debug!(version = %self.manifest.version, ?deleted, "cache version active");
                Ok(deleted)
            }
            Err(err) => {
                self.transition(WorkerState::Activating, WorkerState::Redundant)?;
                Err(err)
            }
        }
    }

    /// Cache-first lookup. A hit never touches the network; a miss is
    /// forwarded and returned as-is, and is not written back.
    pub async fn on_fetch(&self, request: &Request) -> Result<Served, CacheError> {
        self.expect_state(WorkerState::Active)?;
        let hit = {
            let storage = self.storage.read().await;
            storage
                .get(&self.manifest.version)
                .and_then(|cache| cache.match_request(request))
                .cloned()
        };
        if let Some(response) = hit {
            return Ok(Served {
                response,
                from: ServedFrom::Cache,
            });
        }
        let response = self.network.fetch(request).await?;
        Ok(Served {
            response,
            from: ServedFrom::Network,
        })
    }

    /// Superseded by a newer active version.
    pub(crate) fn retire(&mut self) -> Result<(), CacheError> {
        self.transition(WorkerState::Active, WorkerState::Redundant)
    }
}

fn promote(storage: &mut CacheStorage, keep: &str) -> Result<Vec<String>, CacheError> {
    storage.set_active(keep)?;
    let mut deleted = Vec::new();
    for key in storage.keys() {
        if key != keep {
            storage.delete(&key)?;
            deleted.push(key);
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use crate::testing::MockNetwork;

    fn manifest(version: &str) -> CacheManifest {
        CacheManifest::new(version, ["./", "./index.html", "./app.js"]).unwrap()
    }

    fn worker(version: &str, storage: &SharedStorage, net: &Arc<MockNetwork>) -> OfflineCacheManager {
        OfflineCacheManager::new(manifest(version), storage.clone(), net.clone())
    }

    #[tokio::test]
    async fn install_then_activate_then_serve_from_cache() {
        let storage = shared(CacheStorage::in_memory());
        let net = Arc::new(MockNetwork::with_shell());
        let mut w = worker("v1", &storage, &net);
        assert_eq!(w.state(), WorkerState::Installing);

        w.on_install().await.unwrap();
        assert_eq!(w.state(), WorkerState::Activating);
        w.on_activate().await.unwrap();
        assert_eq!(w.state(), WorkerState::Active);

        let calls_after_install = net.calls().len();
        for url in ["./", "/index.html", "app.js"] {
            let served = w.on_fetch(&Request::get(url)).await.unwrap();
            assert_eq!(served.from, ServedFrom::Cache);
        }
        assert_eq!(net.calls().len(), calls_after_install);
    }

    #[tokio::test]
    async fn failed_asset_stores_nothing() {
        let storage = shared(CacheStorage::in_memory());
        let net = Arc::new(MockNetwork::with_shell());
        net.fail("./app.js");
        let mut w = worker("v1", &storage, &net);

        let err = w.on_install().await.unwrap_err();
        assert!(matches!(err, CacheError::AssetFetch { ref url, .. } if url == "./app.js"));
        assert_eq!(w.state(), WorkerState::Redundant);
        assert!(storage.read().await.keys().is_empty());
    }

    #[tokio::test]
    async fn non_ok_status_aborts_install() {
        let storage = shared(CacheStorage::in_memory());
        let net = Arc::new(MockNetwork::new());
        net.serve("./", "<html>");
        net.serve("./index.html", "<html>");
        // ./app.js missing → 404
        let mut w = worker("v1", &storage, &net);
        let err = w.on_install().await.unwrap_err();
        assert!(matches!(err, CacheError::BadStatus { status: 404, .. }));
        assert!(storage.read().await.keys().is_empty());
    }

    #[tokio::test]
    async fn activation_leaves_only_current_version() {
        let storage = shared(CacheStorage::in_memory());
        {
            let mut s = storage.write().await;
            s.put("worktime-v0", Cache::new()).unwrap();
            s.put("other-app", Cache::new()).unwrap();
        }
        let net = Arc::new(MockNetwork::with_shell());
        let mut w = worker("worktime-v1", &storage, &net);
        w.on_install().await.unwrap();
        let mut deleted = w.on_activate().await.unwrap();
        deleted.sort();
        assert_eq!(deleted, ["other-app", "worktime-v0"]);
        assert_eq!(storage.read().await.keys(), ["worktime-v1"]);
        assert_eq!(storage.read().await.active(), Some("worktime-v1"));
    }

    #[tokio::test]
    async fn miss_goes_to_network_and_is_not_cached() {
        let storage = shared(CacheStorage::in_memory());
        let net = Arc::new(MockNetwork::with_shell());
        net.serve("./extra.json", "{}");
        let mut w = worker("v1", &storage, &net);
        w.on_install().await.unwrap();
        w.on_activate().await.unwrap();

        for _ in 0..2 {
            let served = w.on_fetch(&Request::get("./extra.json")).await.unwrap();
            assert_eq!(served.from, ServedFrom::Network);
            assert_eq!(served.response.body, b"{}");
        }
        let extra_calls = net.calls().iter().filter(|u| *u == "./extra.json").count();
        assert_eq!(extra_calls, 2);
        let cached = storage.read().await.get("v1").unwrap().len();
        assert_eq!(cached, 3);
    }

    #[tokio::test]
    async fn network_error_on_miss_propagates() {
        let storage = shared(CacheStorage::in_memory());
        let net = Arc::new(MockNetwork::with_shell());
        let mut w = worker("v1", &storage, &net);
        w.on_install().await.unwrap();
        w.on_activate().await.unwrap();
        net.go_offline();

        let err = w.on_fetch(&Request::get("./missing.css")).await.unwrap_err();
        assert!(matches!(
            err,
            CacheError::Network(NetworkError::Unreachable(ref url)) if url == "./missing.css"
        ));
        // cached assets still served while offline
        let served = w.on_fetch(&Request::get("./")).await.unwrap();
        assert_eq!(served.from, ServedFrom::Cache);
    }

    #[tokio::test]
    async fn handlers_reject_wrong_state() {
        let storage = shared(CacheStorage::in_memory());
        let net = Arc::new(MockNetwork::with_shell());
        let mut w = worker("v1", &storage, &net);
        assert!(matches!(
            w.on_activate().await,
            Err(CacheError::WrongState { .. })
        ));
        assert!(matches!(
            w.on_fetch(&Request::get("./")).await,
            Err(CacheError::WrongState { .. })
        ));
        w.on_install().await.unwrap();
        assert!(matches!(
            w.on_install().await,
            Err(CacheError::WrongState { .. })
        ));
    }

    #[test]
    fn redundant_is_terminal() {
        for to in [
            WorkerState::Installing,
            WorkerState::Activating,
            WorkerState::Active,
        ] {
            assert!(!is_valid_transition(WorkerState::Redundant, to));
        }
        assert!(!is_valid_transition(WorkerState::Installing, WorkerState::Active));
        assert!(is_valid_transition(WorkerState::Active, WorkerState::Redundant));
    }
}
