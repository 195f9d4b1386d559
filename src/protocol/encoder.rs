//! Serializes batches into `multipart/parallel` wire form.
//!
//! All line endings in the serialized form are CRLF. Outer headers
//! (`MIME-Version`, `Content-Type` with the boundary) are returned
//! separately from the body so the transport can pass them as its HTTP
//! header map.

use crate::protocol::{MESSAGE_HTTP_REQUEST, MULTIPART_PARALLEL};
use crate::types::{SubRequest, SubResponse};
use bytes::{Bytes, BytesMut};
use std::collections::BTreeMap;

fn write_header(buffer: &mut BytesMut, key: &str, value: &str) {
    buffer.extend_from_slice(key.as_bytes());
    buffer.extend_from_slice(b": ");
    buffer.extend_from_slice(value.as_bytes());
    buffer.extend_from_slice(b"\r\n");
}

/// Serialize one sub-request as the payload of a `message/http-request`
/// part:
///
/// ```text
/// <method> <path-with-query> HTTP/1.1\r\n
/// host: <host>\r\n
/// <other headers>\r\n
/// \r\n
/// <body or empty>
/// ```
pub fn encode_sub_request(request: &SubRequest) -> Bytes {
    let mut buffer = BytesMut::with_capacity(256 + request.body.len());

    buffer.extend_from_slice(request.method.as_bytes());
    buffer.extend_from_slice(b" ");
    buffer.extend_from_slice(request.request_target().as_bytes());
    buffer.extend_from_slice(b" HTTP/1.1\r\n");

    if let Some(host) = request.host() {
        write_header(&mut buffer, "host", &host);
    }
    for (key, value) in &request.headers {
        // the host line is always derived from the URL
        if key == "host" {
            continue;
        }
        write_header(&mut buffer, key, value);
    }

    buffer.extend_from_slice(b"\r\n");
    buffer.extend_from_slice(&request.body);
    buffer.freeze()
}

/// Serialize a sub-response back to status-line + headers + body form.
///
/// This is the inverse of [`parse_http_response`] and is the blob format
/// the response cache stores, so a cached representation can be re-parsed
/// as if it had just arrived.
///
/// [`parse_http_response`]: crate::protocol::parse_http_response
pub fn encode_sub_response(response: &SubResponse) -> Bytes {
    let mut buffer = BytesMut::with_capacity(128 + response.body.len());

    buffer.extend_from_slice(
        format!("HTTP/1.1 {} {}\r\n", response.status, response.reason).as_bytes(),
    );
    for (key, value) in &response.headers {
        write_header(&mut buffer, key, value);
    }
    buffer.extend_from_slice(b"\r\n");
    buffer.extend_from_slice(&response.body);
    buffer.freeze()
}

/// Assemble the `multipart/parallel` message for a whole batch.
///
/// Returns the outer header map and the body. Each entry becomes one part
/// carrying its 1-based id in `Multipart-Request-ID`.
pub fn encode_batch(
    entries: &[(u32, SubRequest)],
    boundary: &str,
) -> (BTreeMap<String, String>, Bytes) {
    let mut body = BytesMut::new();

    for (id, request) in entries {
        body.extend_from_slice(b"--");
        body.extend_from_slice(boundary.as_bytes());
        body.extend_from_slice(b"\r\n");
        write_header(&mut body, "Content-Type", MESSAGE_HTTP_REQUEST);
        write_header(&mut body, "Multipart-Request-ID", &id.to_string());
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&encode_sub_request(request));
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(b"--");
    body.extend_from_slice(boundary.as_bytes());
    body.extend_from_slice(b"--\r\n");

    let mut headers = BTreeMap::new();
    headers.insert("MIME-Version".to_string(), "1.0".to_string());
    headers.insert(
        "Content-Type".to_string(),
        format!("{}; boundary=\"{}\"", MULTIPART_PARALLEL, boundary),
    );

    (headers, body.freeze())
}
