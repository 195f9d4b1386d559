//! Error types for TypePad API operations.
//!
//! This module defines all error types that can occur when talking to the
//! TypePad API, whether directly or through a batch session. The [`Result`]
//! type alias provides a convenient shorthand for operations that may fail.
//!
//! # Error Categories
//!
//! | Category | Variants | Fatal to a batch |
//! |----------|----------|------------------|
//! | Protocol | `Protocol` | Yes |
//! | Transport | `Transport` | Yes |
//! | Authentication | `NoAuthorization` | Yes |
//! | Per-promise HTTP | `Unauthorized`, `Forbidden`, `NotFound`, `PreconditionFailed`, `RequestError`, `ServerError`, `BadResponse` | No |
//! | Usage | `Usage`, `NotDelivered` | Raised at the misuse site |
//!
//! Per-promise failures are attached to the individual [`Promise`] whose
//! sub-response carried them; the first one also surfaces out of
//! [`BatchSession::complete`] after every part has been settled.
//!
//! [`Promise`]: crate::client::Promise
//! [`BatchSession::complete`]: crate::client::BatchSession::complete

use std::panic::Location;
use thiserror::Error;

/// Result type for TypePad API operations.
pub type Result<T> = std::result::Result<T, TypePadError>;

/// Errors that can occur during TypePad API operations.
///
/// The enum is `Clone` so a delivery failure can be stored on its promise and
/// observed again on every subsequent field access; foreign error types are
/// converted to strings at the boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TypePadError {
    /// The outer HTTP exchange failed (connection error, timeout, etc.).
    ///
    /// Fatal to the whole batch: no promise in the session is delivered.
    #[error("transport error: {0}")]
    Transport(String),

    /// The batch response (or a sub-part of it) was malformed.
    ///
    /// Covers a non-multipart outer body, a sub-part whose content type is
    /// not `message/http-response`, a missing, duplicate, or non-numeric
    /// `Multipart-Request-ID`, and an unparseable status line.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No stored credentials cover the target of a signed request.
    #[error("no authorization available for {0}")]
    NoAuthorization(String),

    /// The server answered 401 for this sub-request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The server answered 403 for this sub-request.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The server answered 404 for this sub-request.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server answered 412 for this sub-request.
    ///
    /// Usually means a conditional PUT or DELETE lost a race with another
    /// writer.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The server answered 400 for this sub-request.
    #[error("bad request: {0}")]
    RequestError(String),

    /// The server answered with a 5xx status for this sub-request.
    #[error("server error {status}: {reason}")]
    ServerError {
        /// The 5xx status code as returned.
        status: u16,
        /// The reason phrase from the status line.
        reason: String,
    },

    /// The response could not be interpreted as the expected representation,
    /// e.g. a non-JSON content type where JSON was required.
    #[error("bad response: {0}")]
    BadResponse(String),

    /// A promise was read before it was delivered.
    ///
    /// Names the source location where the promise was created, which is
    /// usually more useful than where it was read.
    #[error("promise created at {origin} has not been delivered")]
    NotDelivered {
        /// File/line of the promise construction site.
        origin: &'static Location<'static>,
    },

    /// API misuse: double-open, add without a session, batch overflow,
    /// filtering a URL that does not end in `.json`, and similar.
    #[error("usage error: {0}")]
    Usage(String),

    /// The cache backend failed.
    ///
    /// Always swallowed by the conditional preparer after logging; the
    /// original request or response passes through unmodified.
    #[error("cache error: {0}")]
    Cache(String),

    /// A URL could not be parsed or resolved against the endpoint.
    #[error("invalid url: {0}")]
    Url(String),

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(String),
}

impl TypePadError {
    /// Map an HTTP status to the typed error attached to a promise.
    ///
    /// Returns `None` for statuses that are not failures (2xx and 3xx;
    /// 304 in particular is handled by the cache preparer before this
    /// mapping runs).
    pub fn from_status(status: u16, reason: &str) -> Option<Self> {
        match status {
            400 => Some(TypePadError::RequestError(reason.to_string())),
            401 => Some(TypePadError::Unauthorized(reason.to_string())),
            403 => Some(TypePadError::Forbidden(reason.to_string())),
            404 => Some(TypePadError::NotFound(reason.to_string())),
            412 => Some(TypePadError::PreconditionFailed(reason.to_string())),
            s if (500..600).contains(&s) => Some(TypePadError::ServerError {
                status: s,
                reason: reason.to_string(),
            }),
            s if (400..500).contains(&s) => Some(TypePadError::RequestError(format!(
                "{} {}",
                s, reason
            ))),
            _ => None,
        }
    }

    /// True for errors that came out of an individual sub-response rather
    /// than the batch exchange itself.
    #[inline]
    #[must_use]
    pub fn is_http_failure(&self) -> bool {
        matches!(
            self,
            TypePadError::Unauthorized(_)
                | TypePadError::Forbidden(_)
                | TypePadError::NotFound(_)
                | TypePadError::PreconditionFailed(_)
                | TypePadError::RequestError(_)
                | TypePadError::ServerError { .. }
                | TypePadError::BadResponse(_)
        )
    }

    /// True for errors that abort the whole dispatch.
    #[inline]
    #[must_use]
    pub fn is_fatal_to_batch(&self) -> bool {
        matches!(
            self,
            TypePadError::Transport(_) | TypePadError::Protocol(_) | TypePadError::NoAuthorization(_)
        )
    }
}

impl From<url::ParseError> for TypePadError {
    fn from(err: url::ParseError) -> Self {
        TypePadError::Url(err.to_string())
    }
}

impl From<serde_json::Error> for TypePadError {
    fn from(err: serde_json::Error) -> Self {
        TypePadError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for TypePadError {
    fn from(err: reqwest::Error) -> Self {
        TypePadError::Transport(err.to_string())
    }
}
