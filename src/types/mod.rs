//! Core data types for the TypePad batch protocol.

mod credentials;
mod links;
mod request;
mod response;

pub use bytes::Bytes;
pub use credentials::{CredentialStore, KeyPair, OAuthCredentials};
pub use links::{ImageLink, Link, LinkSet};
pub use request::SubRequest;
pub use response::SubResponse;
