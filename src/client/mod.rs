//! Client-side machinery: transport, batching, caching, and signing.

mod batch;
mod cache;
mod config;
mod fetch;
mod oauth;
mod promise;

pub use batch::{BatchSession, SettleFn};
pub use cache::{CacheStore, MemoryCache};
pub use config::ClientConfig;
pub use fetch::TypePadClient;
pub use promise::Promise;
