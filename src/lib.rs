//! typepad_api: a batching client for the TypePad API.
//!
//! The crate is organized around deferred reads:
//!
//! - **client**: `TypePadClient` (endpoint, OAuth credentials, response
//!   cache), `BatchSession`, and the `Promise` values batches settle.
//! - **protocol**: the `multipart/parallel` batch codec with
//!   `message/http-request` / `message/http-response` parts.
//! - **objects**: typed records dispatched by their `objectTypes` URIs,
//!   plus list paging and `@` path-segment filters.
//! - **upload**: the browser-style `multipart/form-data` asset upload.
//!
//! Reads are enqueued on a batch session and dispatched together in one
//! `POST` to the batch processor; each part of the reply settles the
//! promise that asked for it.
//!
//! ```no_run
//! use typepad_api::{ApiList, Event, TypePadClient, User};
//!
//! # async fn run() -> typepad_api::Result<()> {
//! let client = TypePadClient::new();
//!
//! let mut batch = client.batch()?;
//! let me = batch.get::<User>("/users/@self.json")?;
//! let events = batch.get::<ApiList<Event>>("/users/@self/events.json")?;
//! batch.complete().await?;
//!
//! println!("hello, {}", me.get()?.display_name.unwrap_or_default());
//! for event in events.get()? {
//!     println!("{:?}", event.verbs);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod objects;
pub mod protocol;
pub mod types;
pub mod upload;
pub mod urls;

// Top-level re-exports for common usage
pub use crate::client::{
    BatchSession, CacheStore, ClientConfig, MemoryCache, Promise, TypePadClient,
};
pub use crate::error::{Result, TypePadError};
pub use crate::objects::{
    ApiList, ApiObject, Asset, Entity, Event, Favorite, Filters, Group, Relationship, User,
};
pub use crate::types::{KeyPair, SubRequest, SubResponse};
pub use crate::upload::{BrowserUpload, UploadReceipt};
