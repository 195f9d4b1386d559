//! Batch sessions: accumulate sub-requests, dispatch them as one POST.

use crate::client::cache;
use crate::client::fetch::TypePadClient;
use crate::client::promise::Promise;
use crate::error::{Result, TypePadError};
use crate::protocol::{self, encode_batch, parse_batch_response};
use crate::types::{SubRequest, SubResponse};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Callback invoked with the settled sub-response for one entry.
///
/// The error it returns is collected; the first one surfaces out of
/// [`BatchSession::complete`] only after every part has settled.
pub type SettleFn = Box<dyn FnOnce(SubResponse) -> Result<()> + Send>;

struct BatchEntry {
    id: u32,
    request: SubRequest,
    settle: Option<SettleFn>,
}

/// An open batch session.
///
/// A session accumulates ordered sub-requests and dispatches them in a
/// single `POST {endpoint}/batch-processor`. At most one session is open
/// per client; [`complete`] and [`abort`] consume the session, and merely
/// dropping one discards it like `abort`.
///
/// [`complete`]: BatchSession::complete
/// [`abort`]: BatchSession::abort
pub struct BatchSession<'a> {
    client: &'a TypePadClient,
    entries: Vec<BatchEntry>,
}

impl<'a> BatchSession<'a> {
    pub(crate) fn new(client: &'a TypePadClient) -> Self {
        BatchSession {
            client,
            entries: Vec::new(),
        }
    }

    /// Number of sub-requests enqueued so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a sub-request with its settle callback.
    ///
    /// Ids are dense and 1-based, in enqueue order. Fails once the
    /// configured sub-request limit is reached.
    pub fn add(&mut self, request: SubRequest, settle: SettleFn) -> Result<u32> {
        if self.entries.len() >= self.client.config.subrequest_limit {
            return Err(TypePadError::Usage(format!(
                "batch session is full ({} sub-requests)",
                self.client.config.subrequest_limit
            )));
        }
        let id = self.entries.len() as u32 + 1;
        debug!(id, method = %request.method, url = %request.url, "enqueued sub-request");
        self.entries.push(BatchEntry {
            id,
            request,
            settle: Some(settle),
        });
        Ok(id)
    }

    fn enqueue_typed<T>(&mut self, request: SubRequest, promise: &Promise<T>) -> Result<u32>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let observer = promise.clone();
        self.add(
            request,
            Box::new(move |response| settle_json(&observer, response)),
        )
    }

    fn enqueue_raw(&mut self, request: SubRequest, promise: &Promise<SubResponse>) -> Result<u32> {
        let observer = promise.clone();
        self.add(
            request,
            Box::new(move |response| {
                if let Some(error) = response.error_for_status() {
                    observer.fail(error.clone());
                    return Err(error);
                }
                observer.fulfill(response);
                Ok(())
            }),
        )
    }

    /// Enqueue a GET whose JSON body decodes into `T`.
    #[track_caller]
    pub fn get<T>(&mut self, url: &str) -> Result<Promise<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let resolved = self.client.resolve(url)?;
        let promise = Promise::new("GET", resolved.as_str());
        self.enqueue_typed(SubRequest::get(resolved), &promise)?;
        Ok(promise)
    }

    /// Enqueue a HEAD; the promise settles with the raw sub-response.
    #[track_caller]
    pub fn head(&mut self, url: &str) -> Result<Promise<SubResponse>> {
        let resolved = self.client.resolve(url)?;
        let promise = Promise::new("HEAD", resolved.as_str());
        self.enqueue_raw(SubRequest::head(resolved), &promise)?;
        Ok(promise)
    }

    /// Enqueue an OPTIONS; the promise settles with the raw sub-response.
    #[track_caller]
    pub fn options(&mut self, url: &str) -> Result<Promise<SubResponse>> {
        let resolved = self.client.resolve(url)?;
        let promise = Promise::new("OPTIONS", resolved.as_str());
        self.enqueue_raw(SubRequest::options(resolved), &promise)?;
        Ok(promise)
    }

    /// Enqueue a POST of `body` serialized as JSON; the server's
    /// representation of the created resource decodes into `T`.
    #[track_caller]
    pub fn post<B, T>(&mut self, url: &str, body: &B) -> Result<Promise<T>>
    where
        B: Serialize,
        T: DeserializeOwned + Send + 'static,
    {
        let resolved = self.client.resolve(url)?;
        let payload = serde_json::to_vec(body)?;
        let promise = Promise::new("POST", resolved.as_str());
        let request = SubRequest::new("POST", resolved)
            .with_header("content-type", "application/json")
            .with_body(payload);
        self.enqueue_typed(request, &promise)?;
        Ok(promise)
    }

    /// Enqueue a PUT of `body` serialized as JSON, conditional on `etag`
    /// when one is given.
    #[track_caller]
    pub fn put<B, T>(&mut self, url: &str, body: &B, etag: Option<&str>) -> Result<Promise<T>>
    where
        B: Serialize,
        T: DeserializeOwned + Send + 'static,
    {
        let resolved = self.client.resolve(url)?;
        let payload = serde_json::to_vec(body)?;
        let promise = Promise::new("PUT", resolved.as_str());
        let mut request = SubRequest::new("PUT", resolved)
            .with_header("content-type", "application/json")
            .with_body(payload);
        if let Some(etag) = etag {
            request = request.with_header("if-match", etag);
        }
        self.enqueue_typed(request, &promise)?;
        Ok(promise)
    }

    /// Enqueue a DELETE, conditional on `etag` when one is given.
    #[track_caller]
    pub fn delete(&mut self, url: &str, etag: Option<&str>) -> Result<Promise<SubResponse>> {
        let resolved = self.client.resolve(url)?;
        let promise = Promise::new("DELETE", resolved.as_str());
        let mut request = SubRequest::new("DELETE", resolved);
        if let Some(etag) = etag {
            request = request.with_header("if-match", etag);
        }
        self.enqueue_raw(request, &promise)?;
        Ok(promise)
    }

    /// Run the conditional preparer over every entry and assemble the
    /// multipart message.
    ///
    /// Returns the outer header map (`MIME-Version`, `Content-Type` with
    /// a fresh boundary) and the body.
    pub fn encode(&mut self) -> (BTreeMap<String, String>, Bytes) {
        if let Some(cache) = self.client.cache() {
            for entry in &mut self.entries {
                entry.request = cache::augment_request(cache, entry.request.clone());
            }
        }
        let prepared: Vec<(u32, SubRequest)> = self
            .entries
            .iter()
            .map(|entry| (entry.id, entry.request.clone()))
            .collect();
        let boundary = protocol::generate_boundary();
        encode_batch(&prepared, &boundary)
    }

    /// Settle every entry from a batch reply.
    ///
    /// Parts settle in wire order, which need not match enqueue order.
    /// Callback errors are collected and the first one is returned after
    /// every part has settled; protocol errors (unknown or duplicate id,
    /// malformed part, reply not answering every sub-request) abort
    /// immediately and leave unmatched entries pending.
    pub fn apply_response(&mut self, content_type: &str, body: &[u8]) -> Result<()> {
        let parts = parse_batch_response(content_type, body)?;

        let mut first_error = None;
        let mut settled = 0usize;
        for part in parts {
            let entry = self
                .entries
                .iter_mut()
                .find(|entry| entry.id == part.request_id)
                .ok_or_else(|| {
                    TypePadError::Protocol(format!(
                        "Multipart-Request-ID {} does not match any sub-request",
                        part.request_id
                    ))
                })?;
            let settle = entry.settle.take().ok_or_else(|| {
                TypePadError::Protocol(format!(
                    "duplicate Multipart-Request-ID {}",
                    part.request_id
                ))
            })?;

            let response = match self.client.cache() {
                Some(cache) => cache::record_response(cache, &entry.request, part.response),
                None => part.response,
            };
            if let Err(error) = settle(response) {
                debug!(id = part.request_id, error = %error, "sub-request failed");
                first_error.get_or_insert(error);
            }
            settled += 1;
        }

        if settled != self.entries.len() {
            return Err(TypePadError::Protocol(format!(
                "batch reply settled {} of {} sub-requests",
                settled,
                self.entries.len()
            )));
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Dispatch the session: encode, POST to the batch processor, settle
    /// every entry.
    ///
    /// The session is consumed whether dispatch succeeds or fails. The
    /// outer POST is signed when credentials cover the batch URL.
    /// Completing an empty session is a no-op.
    pub async fn complete(mut self) -> Result<()> {
        if self.entries.is_empty() {
            debug!("completing empty batch session");
            return Ok(());
        }

        let (headers, body) = self.encode();
        let url = self.client.batch_url()?;
        debug!(batch_size = self.entries.len(), %url, "dispatching batch");

        let response = match self.client.sign_url_for("POST", &url) {
            Ok(signed) => {
                self.client
                    .request("POST", &signed, &headers, Some(body))
                    .await?
            }
            Err(TypePadError::NoAuthorization(_)) => {
                self.client.request("POST", &url, &headers, Some(body)).await?
            }
            Err(error) => return Err(error),
        };

        if !response.is_success() {
            return Err(TypePadError::Transport(format!(
                "batch processor answered {} {}",
                response.status, response.reason
            )));
        }
        let content_type = response
            .header("content-type")
            .unwrap_or_default()
            .to_string();
        self.apply_response(&content_type, &response.body)
    }

    /// Discard the session without dispatching. Enqueued promises stay
    /// pending.
    pub fn abort(self) {
        debug!(batch_size = self.entries.len(), "aborted batch session");
    }
}

impl Drop for BatchSession<'_> {
    fn drop(&mut self) {
        self.client.release_batch();
    }
}

impl fmt::Debug for BatchSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchSession")
            .field("entries", &self.entries.len())
            .field(
                "pending_ids",
                &self
                    .entries
                    .iter()
                    .filter(|e| e.settle.is_some())
                    .map(|e| e.id)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Map a sub-response into a typed promise: status failures and non-JSON
/// bodies fail it, anything else decodes and fulfills it.
pub(crate) fn settle_json<T: DeserializeOwned>(
    promise: &Promise<T>,
    response: SubResponse,
) -> Result<()> {
    if let Some(error) = response.error_for_status() {
        promise.fail(error.clone());
        return Err(error);
    }
    match response.json::<T>() {
        Ok(value) => {
            promise.fulfill(value);
            Ok(())
        }
        Err(error) => {
            promise.fail(error.clone());
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;

    fn client() -> TypePadClient {
        TypePadClient::with_config(ClientConfig {
            endpoint: "http://127.0.0.1:8000".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn reply_part(id: u32, blob: &str, boundary: &str) -> String {
        format!(
            "--{}\r\nContent-Type: message/http-response\r\nMultipart-Request-ID: {}\r\n\r\n{}\r\n",
            boundary, id, blob
        )
    }

    #[test]
    fn test_ids_are_dense_and_one_based() {
        let client = client();
        let mut batch = client.batch().unwrap();

        let a: Promise<serde_json::Value> = batch.get("/users/moose.json").unwrap();
        let b: Promise<serde_json::Value> = batch.get("/users/fred.json").unwrap();
        assert_eq!(batch.len(), 2);
        drop((a, b));

        let (_, body) = batch.encode();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Multipart-Request-ID: 1\r\n"));
        assert!(text.contains("Multipart-Request-ID: 2\r\n"));
    }

    #[test]
    fn test_add_refuses_past_limit() {
        let client = TypePadClient::with_config(ClientConfig {
            subrequest_limit: 2,
            ..Default::default()
        })
        .unwrap();
        let mut batch = client.batch().unwrap();

        for _ in 0..2 {
            batch
                .add(
                    SubRequest::get(client.resolve("/x.json").unwrap()),
                    Box::new(|_| Ok(())),
                )
                .unwrap();
        }
        let err = batch
            .add(
                SubRequest::get(client.resolve("/x.json").unwrap()),
                Box::new(|_| Ok(())),
            )
            .unwrap_err();
        assert!(matches!(err, TypePadError::Usage(_)));
    }

    #[test]
    fn test_second_open_refused_until_first_closes() {
        let client = client();
        let first = client.batch().unwrap();
        assert!(matches!(client.batch(), Err(TypePadError::Usage(_))));

        first.abort();
        assert!(client.batch().is_ok());
    }

    #[test]
    fn test_drop_releases_session_slot() {
        let client = client();
        {
            let _open = client.batch().unwrap();
        }
        assert!(client.batch().is_ok());
    }

    #[test]
    fn test_apply_response_unknown_id_is_protocol_error() {
        let client = client();
        let mut batch = client.batch().unwrap();
        let _p: Promise<serde_json::Value> = batch.get("/moose").unwrap();

        let body = reply_part(9, "HTTP/1.1 200 OK\r\n\r\n{}", "b") + "--b--\r\n";
        let err = batch
            .apply_response("multipart/parallel; boundary=b", body.as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_apply_response_duplicate_id_is_protocol_error() {
        let client = client();
        let mut batch = client.batch().unwrap();
        let _p: Promise<serde_json::Value> = batch.get("/moose").unwrap();

        let body = reply_part(1, "HTTP/1.1 200 OK\r\n\r\n{}", "b")
            + &reply_part(1, "HTTP/1.1 200 OK\r\n\r\n{}", "b")
            + "--b--\r\n";
        let err = batch
            .apply_response("multipart/parallel; boundary=b", body.as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_apply_response_requires_every_id_answered() {
        let client = client();
        let mut batch = client.batch().unwrap();
        let _a: Promise<serde_json::Value> = batch.get("/moose").unwrap();
        let _b: Promise<serde_json::Value> = batch.get("/fred").unwrap();

        let body = reply_part(1, "HTTP/1.1 200 OK\r\n\r\n{}", "b") + "--b--\r\n";
        let err = batch
            .apply_response("multipart/parallel; boundary=b", body.as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("settled 1 of 2"));
    }

    #[test]
    fn test_non_multipart_reply_is_protocol_error() {
        let client = client();
        let mut batch = client.batch().unwrap();
        let _p: Promise<serde_json::Value> = batch.get("/moose").unwrap();

        let err = batch
            .apply_response("application/json", b"{\"oops\": true}")
            .unwrap_err();
        assert!(matches!(err, TypePadError::Protocol(_)));
    }
}
