use thiserror::Error;

use crate::lifecycle::WorkerState;

/// Failure of a single resource fetch.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("network unreachable while fetching {0}")]
    Unreachable(String),

    #[error("refusing to fetch {0}: path escapes the origin")]
    Forbidden(String),

    #[error("io error fetching {url}: {source}")]
    Io {
        url: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("install of {version} failed fetching {url}: {source}")]
    AssetFetch {
        version: String,
        url: String,
        source: NetworkError,
    },

    #[error("install of {version} failed: {url} returned status {status}")]
    BadStatus {
        version: String,
        url: String,
        status: u16,
    },

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("cache storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("cache index error: {0}")]
    Index(#[from] serde_json::Error),

    #[error("invalid worker transition: {from:?} → {to:?}")]
    InvalidTransition { from: WorkerState, to: WorkerState },

    #[error("worker for {version} is {state:?}, not {expected:?}")]
    WrongState {
        version: String,
        state: WorkerState,
        expected: WorkerState,
    },

    /// A cache miss whose network fetch failed; the error is passed through as-is.
    #[error(transparent)]
    Network(#[from] NetworkError),
}
