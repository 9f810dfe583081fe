/// An outgoing resource request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    /// Normalized app-relative URL (`./index.html`).
    pub url: String,
}

impl Request {
    pub fn get(url: &str) -> Self {
        Self {
            url: normalize_url(url),
        }
    }
}

/// A response as stored in, or served from, the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    /// 2xx.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Map request spellings of the same asset onto one key:
/// `""`, `"/"` → `"./"`; `"/app.js"`, `"app.js"` → `"./app.js"`.
/// Absolute URLs (with a scheme) are left alone.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.contains("://") || url.starts_with("./") {
        return url.to_string();
    }
    let rest = url.trim_start_matches('/');
    format!("./{rest}")
}
