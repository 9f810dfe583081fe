use std::path::{Component, Path, PathBuf};

use crate::error::NetworkError;
use crate::request::{Request, Response};

/// Where cache misses, and install-time fetches, go.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Serves an origin directory the way a static web server would:
/// `./` maps to `index.html`, missing files are 404 responses, not errors.
pub struct DirNetwork {
    root: PathBuf,
}

impl DirNetwork {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, NetworkError> {
        let rel = url.trim_start_matches("./");
        let rel = if rel.is_empty() || rel.ends_with('/') {
            format!("{rel}index.html")
        } else {
            rel.to_string()
        };
        let rel = Path::new(&rel);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(NetworkError::Forbidden(url.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait::async_trait]
impl Network for DirNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        if request.url.contains("://") {
            return Err(NetworkError::Unreachable(request.url.clone()));
        }
        let path = self.resolve(&request.url)?;
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(Response::ok(Some(content_type_for(&path)), body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Response::with_status(404)),
            Err(source) => Err(NetworkError::Io {
                url: request.url.clone(),
                source,
            }),
        }
    }
}

/// Always fails. Stands in for having no connection at all.
pub struct UnreachableNetwork;

#[async_trait::async_trait]
impl Network for UnreachableNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        Err(NetworkError::Unreachable(request.url.clone()))
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
