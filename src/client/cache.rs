//! Response cache and the conditional sub-request preparer.
//!
//! The cache is an opaque key→blob store keyed by request URL. Each blob
//! is a serialized HTTP response (status line, headers, body) in exactly
//! the form the wire parser understands, so a stored representation can be
//! revived as if it had just arrived off the network.
//!
//! The preparer has two hooks. [`augment_request`] runs before a
//! sub-request is written into the multipart body and adds
//! `If-None-Match`/`If-Modified-Since` from the stored representation.
//! [`record_response`] runs on every settled sub-response: a 304 is
//! hydrated into the stored 200 (and the merged entry re-stored), a
//! cacheable 200 replaces the entry, and responses that invalidate the
//! resource drop it.
//!
//! Cache trouble never fails a dispatch. Every backend error is logged
//! and the original request or response passes through unmodified.

use crate::error::{Result, TypePadError};
use crate::protocol::{encode_sub_response, parse_http_response};
use crate::types::{SubRequest, SubResponse};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Opaque key→blob store shared by the preparer and direct requests.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory store for tests and short-lived processes.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| TypePadError::Cache(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| TypePadError::Cache(e.to_string()))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| TypePadError::Cache(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

fn cache_key(request: &SubRequest) -> String {
    request.url.to_string()
}

fn stored_response(cache: &dyn CacheStore, key: &str) -> Option<SubResponse> {
    match cache.get(key) {
        Ok(Some(blob)) => match parse_http_response(&blob) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(key, error = %e, "dropping undecodable cache entry");
                if let Err(e) = cache.delete(key) {
                    warn!(key, error = %e, "cache delete failed");
                }
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "cache read failed");
            None
        }
    }
}

/// A response is worth storing when it carries a validator and does not
/// forbid storage.
fn is_cacheable(response: &SubResponse) -> bool {
    if let Some(cc) = response.header("cache-control") {
        if cc.contains("no-store") {
            return false;
        }
    }
    response.header("etag").is_some() || response.header("last-modified").is_some()
}

/// Add conditional headers to a GET sub-request when a stored
/// representation exists.
///
/// Explicit conditional headers set by the caller win over cached
/// validators. Non-GET requests pass through untouched.
pub fn augment_request(cache: &dyn CacheStore, mut request: SubRequest) -> SubRequest {
    if request.method != "GET" {
        return request;
    }
    let Some(cached) = stored_response(cache, &cache_key(&request)) else {
        return request;
    };

    if request.header("if-none-match").is_none() {
        if let Some(etag) = cached.header("etag") {
            request = request.with_header("if-none-match", etag);
        }
    }
    if request.header("if-modified-since").is_none() {
        if let Some(modified) = cached.header("last-modified") {
            request = request.with_header("if-modified-since", modified);
        }
    }
    request
}

/// Reconcile one settled sub-response with the cache and return what the
/// caller should observe.
///
/// A 304 whose entry exists comes back as the stored 200 with the
/// revalidation headers merged in; the merged entry is re-stored so its
/// validators stay fresh.
pub fn record_response(
    cache: &dyn CacheStore,
    request: &SubRequest,
    response: SubResponse,
) -> SubResponse {
    let key = cache_key(request);

    if request.method != "GET" {
        // An unsafe method that succeeded invalidates the resource.
        if response.is_success() {
            if let Err(e) = cache.delete(&key) {
                warn!(key, error = %e, "cache invalidation failed");
            }
        }
        return response;
    }

    match response.status {
        304 => {
            let Some(mut cached) = stored_response(cache, &key) else {
                // nothing to hydrate from; the caller sees the 304
                return response;
            };
            for (name, value) in &response.headers {
                cached.headers.insert(name.clone(), value.clone());
            }
            cached.status = 200;
            if cached.reason.is_empty() || cached.reason == "Not Modified" {
                cached.reason = "OK".to_string();
            }
            if let Err(e) = cache.set(&key, &encode_sub_response(&cached)) {
                warn!(key, error = %e, "cache write failed after revalidation");
            }
            debug!(key, "hydrated 304 from cache");
            cached
        }
        200 if is_cacheable(&response) => {
            if let Err(e) = cache.set(&key, &encode_sub_response(&response)) {
                warn!(key, error = %e, "cache write failed");
            }
            response
        }
        404 | 410 => {
            if let Err(e) = cache.delete(&key) {
                warn!(key, error = %e, "cache invalidation failed");
            }
            response
        }
        _ => response,
    }
}
