//! Sub-request parameters for batched dispatch.

use bytes::Bytes;
use std::collections::BTreeMap;
use url::Url;

/// One HTTP exchange prepared for inclusion in a batch.
///
/// The URL is always absolute; relative paths are resolved against the
/// client endpoint before a `SubRequest` is constructed. Header keys are
/// stored lowercased so merges during cache preparation behave
/// case-insensitively.
#[derive(Clone, Debug)]
pub struct SubRequest {
    pub method: String,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl SubRequest {
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        SubRequest {
            method: method.into(),
            url,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    #[inline]
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    #[inline]
    pub fn head(url: Url) -> Self {
        Self::new("HEAD", url)
    }

    #[inline]
    pub fn options(url: Url) -> Self {
        Self::new("OPTIONS", url)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Path plus query, as written on the request line of a sub-part.
    pub fn request_target(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    /// Value for the `host` header, including the port when non-default.
    pub fn host(&self) -> Option<String> {
        let host = self.url.host_str()?;
        Some(match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    #[inline]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}
