//! Sub-response as parsed out of a multipart batch reply.

use crate::error::{Result, TypePadError};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// A single HTTP response carried inside a `message/http-response` part.
///
/// Header keys are lowercased during parsing, so lookups are direct map
/// probes rather than case-insensitive scans.
#[derive(Clone, Debug)]
pub struct SubResponse {
    pub status: u16,
    pub reason: String,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl SubResponse {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        SubResponse {
            status,
            reason: reason.into(),
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
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

    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The typed failure for this status, if it is one.
    pub fn error_for_status(&self) -> Option<TypePadError> {
        TypePadError::from_status(self.status, &self.reason)
    }

    /// Decode the body as JSON.
    ///
    /// A `content-type` that is present but not JSON fails with
    /// [`TypePadError::BadResponse`] before any parsing is attempted.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if let Some(content_type) = self.header("content-type") {
            if !content_type.contains("json") {
                return Err(TypePadError::BadResponse(format!(
                    "expected JSON content, got {}",
                    content_type
                )));
            }
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| TypePadError::BadResponse(format!("undecodable JSON body: {}", e)))
    }
}

impl Default for SubResponse {
    fn default() -> Self {
        SubResponse {
            status: 200,
            reason: "OK".to_string(),
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }
}
