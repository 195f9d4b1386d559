//! Configuration for the TypePad client.
//!
//! This module defines the [`ClientConfig`] struct that controls the
//! behavior of a [`TypePadClient`]: the API endpoint, batching discipline,
//! and timeouts.
//!
//! # Configuration Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `endpoint` | `http://127.0.0.1:8000` | Base URL requests resolve against |
//! | `batch_required` | `true` | Refuse direct delivery outside a session |
//! | `subrequest_limit` | 20 | Maximum sub-requests per batch |
//! | `request_timeout_ms` | 30000 | Timeout for the outer HTTP exchange |
//! | `connection_timeout_secs` | 30 | Connection establishment timeout |
//!
//! # Examples
//!
//! ## Default Configuration
//!
//! ```
//! use typepad_api::client::ClientConfig;
//!
//! let config = ClientConfig::default();
//! assert_eq!(config.subrequest_limit, 20);
//! assert!(config.batch_required);
//! ```
//!
//! ## Partial Override
//!
//! ```
//! use typepad_api::client::ClientConfig;
//!
//! let config = ClientConfig {
//!     endpoint: "https://api.typepad.com".to_string(),
//!     ..Default::default()
//! };
//! assert_eq!(config.subrequest_limit, 20); // Default
//! ```
//!
//! [`TypePadClient`]: crate::client::TypePadClient

/// Configuration for the TypePad client.
///
/// Controls the endpoint, batching discipline, and HTTP timeouts for a
/// client instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL that relative request paths resolve against.
    ///
    /// Mutated at runtime only through credential changes: adding
    /// TypePad-domain OAuth credentials upgrades the scheme to HTTPS,
    /// clearing them reverts it.
    pub endpoint: String,

    /// Whether promises must be delivered through a batch session.
    ///
    /// When set, `deliver` refuses to run a promise's request on its own
    /// and the usage error names the promise's construction site. Turn
    /// this off to allow direct, one-at-a-time delivery.
    pub batch_required: bool,

    /// Maximum number of sub-requests a session accepts.
    ///
    /// `add` fails once the limit is reached.
    pub subrequest_limit: usize,

    /// Timeout for the outer HTTP exchange, in milliseconds.
    ///
    /// There is no per-sub-request timeout; the whole batch answers
    /// within this window or fails as one.
    pub request_timeout_ms: u64,

    /// Connection timeout in seconds.
    pub connection_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            endpoint: "http://127.0.0.1:8000".to_string(),
            batch_required: true,
            subrequest_limit: 20,
            request_timeout_ms: 30000,
            connection_timeout_secs: 30,
        }
    }
}
