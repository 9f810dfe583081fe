pub mod error;
pub mod lifecycle;
pub mod manifest;
pub mod network;
pub mod registration;
pub mod request;
pub mod storage;

pub use error::{CacheError, NetworkError};
pub use lifecycle::{shared, OfflineCacheManager, Served, ServedFrom, SharedStorage, WorkerState};
pub use manifest::{CacheManifest, DEFAULT_ASSETS, DEFAULT_VERSION};
pub use network::{DirNetwork, Network, UnreachableNetwork};
pub use registration::{Registration, UpdateOutcome};
pub use request::{normalize_url, Request, Response};
pub use storage::{Cache, CacheStorage};
