//! The TypePad API client: endpoint, credentials, and dispatch.
//!
//! `TypePadClient` owns the HTTP connection pool, the OAuth credential
//! store, and an optional response cache. Reads normally go through a
//! [`BatchSession`]; `deliver` performs a single request directly when
//! batching has been disabled in the configuration.

use crate::client::batch::{settle_json, BatchSession};
use crate::client::cache::{self, CacheStore};
use crate::client::config::ClientConfig;
use crate::client::oauth;
use crate::client::promise::Promise;
use crate::error::{Result, TypePadError};
use crate::types::{CredentialStore, KeyPair, OAuthCredentials, SubRequest, SubResponse};
use bytes::Bytes;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

fn is_typepad_domain(domain: &str) -> bool {
    domain == "typepad.com" || domain.ends_with(".typepad.com")
}

/// Client for a TypePad-style batching API.
pub struct TypePadClient {
    http: reqwest::Client,
    pub config: ClientConfig,
    endpoint: Url,
    credentials: CredentialStore,
    scheme_upgraded: bool,
    cache: Option<Arc<dyn CacheStore>>,
    batch_open: AtomicBool,
}

impl TypePadClient {
    /// Create a client with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default()).expect("default configuration is valid")
    }

    /// Create a client with a custom configuration.
    ///
    /// Redirects are not followed: the upload endpoint reports its result
    /// in a `302 Location`, which must reach the caller intact.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_secs(config.connection_timeout_secs))
            .redirect(Policy::none())
            .cookie_store(true)
            .build()?;
        Self::with_client(http, config)
    }

    /// Create a client wrapping an existing reqwest client.
    pub fn with_client(http: reqwest::Client, config: ClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        if endpoint.host_str().is_none() {
            return Err(TypePadError::Usage(format!(
                "endpoint {:?} has no host",
                config.endpoint
            )));
        }
        Ok(TypePadClient {
            http,
            config,
            endpoint,
            credentials: CredentialStore::new(),
            scheme_upgraded: false,
            cache: None,
            batch_open: AtomicBool::new(false),
        })
    }

    /// Attach a response cache; GET sub-requests become conditional and
    /// `304 Not Modified` replies are hydrated from it.
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub(crate) fn cache(&self) -> Option<&dyn CacheStore> {
        self.cache.as_deref()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The configured base endpoint. Its scheme can change as credentials
    /// come and go, see [`add_oauth_credentials`].
    ///
    /// [`add_oauth_credentials`]: TypePadClient::add_oauth_credentials
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Resolve a possibly relative URL against the endpoint.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(self.endpoint.join(url)?),
            Err(error) => Err(error.into()),
        }
    }

    /// Register OAuth credentials scoped to `domain`.
    ///
    /// `domain` names the API host, with its port when nonstandard.
    /// Registering credentials for a TypePad domain that the endpoint
    /// points at upgrades the endpoint to HTTPS, so every request built
    /// from it is both signed and encrypted.
    pub fn add_oauth_credentials(&mut self, consumer: KeyPair, token: KeyPair, domain: &str) {
        if self.endpoint.scheme() == "http"
            && self.endpoint.host_str() == Some(domain)
            && is_typepad_domain(domain)
            && self.endpoint.set_scheme("https").is_ok()
        {
            self.scheme_upgraded = true;
        }
        let scope = format!("{}://{}/", self.endpoint.scheme(), domain);
        debug!(%scope, "registered oauth credentials");
        self.credentials
            .insert(scope, OAuthCredentials::new(consumer, token));
    }

    /// Drop every credential. Reverts the endpoint to HTTP if registering
    /// credentials had upgraded it.
    pub fn clear_credentials(&mut self) {
        self.credentials.clear();
        if self.scheme_upgraded {
            // downgrading https to http cannot fail
            let _ = self.endpoint.set_scheme("http");
            self.scheme_upgraded = false;
        }
    }

    /// Sign `url` for `method` with the most specific credentials whose
    /// scope covers it.
    ///
    /// The URL is first rebuilt with the endpoint's scheme; credential
    /// scopes are registered under that scheme, and it tracks upgrades.
    /// Fails with [`TypePadError::NoAuthorization`] when no scope covers
    /// the target.
    pub(crate) fn sign_url_for(&self, method: &str, url: &Url) -> Result<Url> {
        let mut canonical = url.clone();
        if canonical.scheme() != self.endpoint.scheme() {
            canonical
                .set_scheme(self.endpoint.scheme())
                .map_err(|_| {
                    TypePadError::Url(format!(
                        "cannot rebuild {} with scheme {}",
                        url,
                        self.endpoint.scheme()
                    ))
                })?;
        }
        match self.credentials.lookup(canonical.as_str()) {
            Some(credentials) => oauth::sign_url(credentials, method, &canonical),
            None => Err(TypePadError::NoAuthorization(canonical.into())),
        }
    }

    /// Perform one HTTP request and collapse the reply into a
    /// [`SubResponse`] with lowercased header names.
    pub async fn request(
        &self,
        method: &str,
        url: &Url,
        headers: &BTreeMap<String, String>,
        body: Option<Bytes>,
    ) -> Result<SubResponse> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| TypePadError::Usage(format!("invalid HTTP method {:?}", method)))?;
        debug!(%method, %url, "request");

        let mut builder = self.http.request(method, url.clone());
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;

        let status = response.status();
        let mut sub = SubResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
        );
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                sub = sub.with_header(name.as_str(), value);
            }
        }
        let body = response.bytes().await?;
        Ok(sub.with_body(body))
    }

    /// Sign the URL, then perform the request against the signed URL.
    pub async fn signed_request(
        &self,
        method: &str,
        url: &Url,
        headers: &BTreeMap<String, String>,
        body: Option<Bytes>,
    ) -> Result<SubResponse> {
        let signed = self.sign_url_for(method, url)?;
        self.request(method, &signed, headers, body).await
    }

    /// Run one prepared sub-request outside a batch: conditionalize from
    /// the cache, sign when covered, perform, reconcile the cache.
    async fn dispatch(&self, mut request: SubRequest) -> Result<SubResponse> {
        if let Some(cache) = self.cache() {
            request = cache::augment_request(cache, request);
        }
        let target = match self.sign_url_for(&request.method, &request.url) {
            Ok(signed) => signed,
            Err(TypePadError::NoAuthorization(_)) => request.url.clone(),
            Err(error) => return Err(error),
        };
        let body = if request.has_body() {
            Some(request.body.clone())
        } else {
            None
        };
        let response = self
            .request(&request.method, &target, &request.headers, body)
            .await?;
        Ok(match self.cache() {
            Some(cache) => cache::record_response(cache, &request, response),
            None => response,
        })
    }

    /// GET a resource directly and decode its JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let url = self.resolve(url)?;
        let response = self.dispatch(SubRequest::get(url)).await?;
        if let Some(error) = response.error_for_status() {
            return Err(error);
        }
        response.json()
    }

    /// POST `body` as JSON directly and decode the reply.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.resolve(url)?;
        let request = SubRequest::new("POST", url)
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_vec(body)?);
        let response = self.dispatch(request).await?;
        if let Some(error) = response.error_for_status() {
            return Err(error);
        }
        response.json()
    }

    /// PUT `body` as JSON directly, conditional on `etag` when given.
    pub async fn put_json<B, T>(&self, url: &str, body: &B, etag: Option<&str>) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.resolve(url)?;
        let mut request = SubRequest::new("PUT", url)
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_vec(body)?);
        if let Some(etag) = etag {
            request = request.with_header("if-match", etag);
        }
        let response = self.dispatch(request).await?;
        if let Some(error) = response.error_for_status() {
            return Err(error);
        }
        response.json()
    }

    /// DELETE a resource directly, conditional on `etag` when given.
    pub async fn delete(&self, url: &str, etag: Option<&str>) -> Result<SubResponse> {
        let url = self.resolve(url)?;
        let mut request = SubRequest::new("DELETE", url);
        if let Some(etag) = etag {
            request = request.with_header("if-match", etag);
        }
        let response = self.dispatch(request).await?;
        if let Some(error) = response.error_for_status() {
            return Err(error);
        }
        Ok(response)
    }

    pub(crate) fn batch_url(&self) -> Result<Url> {
        Ok(self.endpoint.join("/batch-processor")?)
    }

    /// Open a batch session.
    ///
    /// At most one session may be open per client; a second open fails
    /// until the first is completed, aborted, or dropped.
    pub fn batch(&self) -> Result<BatchSession<'_>> {
        if self
            .batch_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TypePadError::Usage(
                "a batch session is already open on this client".to_string(),
            ));
        }
        Ok(BatchSession::new(self))
    }

    pub(crate) fn release_batch(&self) {
        self.batch_open.store(false, Ordering::Release);
    }

    /// Create a pending GET promise outside any batch session.
    ///
    /// The promise records this call site; reading it before delivery
    /// reports that location. Settle it with [`deliver`], or prefer
    /// enqueueing reads on a [`BatchSession`].
    ///
    /// [`deliver`]: TypePadClient::deliver
    #[track_caller]
    pub fn get<T>(&self, url: &str) -> Promise<T> {
        Promise::new("GET", url)
    }

    /// Perform a promise's request directly, without a batch session.
    ///
    /// Refused while `batch_required` is set. The request is signed when
    /// credentials cover its URL and runs through the cache like a batch
    /// sub-request would.
    pub async fn deliver<T>(&self, promise: &Promise<T>) -> Result<()>
    where
        T: DeserializeOwned,
    {
        if self.config.batch_required {
            return Err(TypePadError::Usage(format!(
                "{} {} created at {} must go through a batch session",
                promise.method(),
                promise.url(),
                promise.origin(),
            )));
        }
        let url = match self.resolve(promise.url()) {
            Ok(url) => url,
            Err(error) => {
                promise.fail(error.clone());
                return Err(error);
            }
        };
        match self.dispatch(SubRequest::new(promise.method(), url)).await {
            Ok(response) => settle_json(promise, response),
            Err(error) => {
                promise.fail(error.clone());
                Err(error)
            }
        }
    }
}

impl Default for TypePadClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypePadClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypePadClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("cache", &self.cache.is_some())
            .field("batch_open", &self.batch_open.load(Ordering::Acquire))
            .finish()
    }
}
