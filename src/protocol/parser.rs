//! Parses `multipart/parallel` batch replies.
//!
//! Each `message/http-response` part is captured as an opaque blob until
//! the next boundary; its payload carries a full serialized HTTP response
//! whose internal status line and headers would otherwise confuse a
//! generic MIME parser. Parsing of the blob itself accepts either an
//! `HTTP/1.1 <code> <reason>` status line or the bare `<code> <reason>`
//! form some servers emit.

use crate::error::{Result, TypePadError};
use crate::protocol::{MESSAGE_HTTP_RESPONSE, REQUEST_ID_HEADER};
use crate::types::SubResponse;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static STATUS_LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:HTTP/?\d*\.?\d*\s+)?(\d{3})(?:\s+(.*))?$").unwrap());

static BOUNDARY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"boundary="?([^";,\s]+)"?"#).unwrap());

/// One decoded part of a batch reply, in wire order.
#[derive(Debug, Clone)]
pub struct ParsedPart {
    pub request_id: u32,
    pub response: SubResponse,
}

/// Extract the boundary parameter from an outer `Content-Type` value.
///
/// Fails with a protocol error when the outer message is not multipart.
pub fn boundary_from_content_type(content_type: &str) -> Result<String> {
    if !content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("multipart/")
    {
        return Err(TypePadError::Protocol(format!(
            "batch reply is not multipart: {}",
            content_type
        )));
    }
    BOUNDARY_REGEX
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            TypePadError::Protocol(format!("multipart reply without boundary: {}", content_type))
        })
}

/// Parse a whole batch reply into its parts, preserving wire order.
pub fn parse_batch_response(content_type: &str, body: &[u8]) -> Result<Vec<ParsedPart>> {
    let boundary = boundary_from_content_type(content_type)?;
    let raw_parts = split_parts(body, &boundary)?;
    raw_parts.into_iter().map(parse_part).collect()
}

/// Parse one serialized HTTP response: status line, headers, body.
pub fn parse_http_response(blob: &[u8]) -> Result<SubResponse> {
    let line_end = find(blob, b"\r\n", 0)
        .ok_or_else(|| TypePadError::Protocol("sub-response is missing a status line".into()))?;
    let status_line = std::str::from_utf8(&blob[..line_end])
        .map_err(|_| TypePadError::Protocol("non-UTF-8 status line".into()))?;

    let caps = STATUS_LINE_REGEX.captures(status_line.trim()).ok_or_else(|| {
        TypePadError::Protocol(format!("unparseable status line: {:?}", status_line))
    })?;
    let status: u16 = caps
        .get(1)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .parse()
        .map_err(|_| {
            TypePadError::Protocol(format!("unparseable status line: {:?}", status_line))
        })?;
    let reason = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let rest = &blob[line_end + 2..];
    let (headers, body) = match find(rest, b"\r\n\r\n", 0) {
        Some(end) => (
            parse_header_block(&rest[..end])?,
            Bytes::copy_from_slice(&rest[end + 4..]),
        ),
        // headers only, e.g. a 304 with no body
        None => (parse_header_block(rest)?, Bytes::new()),
    };

    let mut response = SubResponse::new(status, reason).with_body(body);
    response.headers = headers;
    Ok(response)
}

fn parse_part(raw: &[u8]) -> Result<ParsedPart> {
    let header_end = find(raw, b"\r\n\r\n", 0).ok_or_else(|| {
        TypePadError::Protocol("sub-part is missing its header terminator".into())
    })?;
    let part_headers = parse_header_block(&raw[..header_end])?;

    match part_headers.get("content-type") {
        Some(ct) if ct.contains(MESSAGE_HTTP_RESPONSE) => {}
        Some(ct) => {
            return Err(TypePadError::Protocol(format!(
                "sub-part is not {}: {}",
                MESSAGE_HTTP_RESPONSE, ct
            )));
        }
        None => {
            return Err(TypePadError::Protocol(format!(
                "sub-part without a content type; expected {}",
                MESSAGE_HTTP_RESPONSE
            )));
        }
    }

    let id_value = part_headers.get(REQUEST_ID_HEADER).ok_or_else(|| {
        TypePadError::Protocol("sub-part without a Multipart-Request-ID".into())
    })?;
    let request_id: u32 = id_value.trim().parse().map_err(|_| {
        TypePadError::Protocol(format!("non-numeric Multipart-Request-ID: {:?}", id_value))
    })?;

    let response = parse_http_response(&raw[header_end + 4..])?;
    Ok(ParsedPart {
        request_id,
        response,
    })
}

/// Split a multipart body into raw part payloads (part headers + blob).
///
/// Everything before the first delimiter and after the closing delimiter
/// is discarded. Each blob is taken verbatim up to the CRLF that precedes
/// the next delimiter.
fn split_parts<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>> {
    let delimiter = format!("--{}", boundary);
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let mut pos = find(body, delimiter, 0).ok_or_else(|| {
        TypePadError::Protocol(format!("boundary {:?} not found in reply body", boundary))
    })?;

    loop {
        let after = pos + delimiter.len();
        if body[after..].starts_with(b"--") {
            break;
        }
        let content_start = match find(body, b"\r\n", after) {
            Some(p) => p + 2,
            None => break,
        };
        let next = find(body, delimiter, content_start).ok_or_else(|| {
            TypePadError::Protocol("multipart reply without a closing boundary".into())
        })?;

        let mut content_end = next;
        if content_end >= 2 && &body[content_end - 2..content_end] == b"\r\n" {
            content_end -= 2;
        }
        parts.push(&body[content_start..content_end]);
        pos = next;
    }

    Ok(parts)
}

fn parse_header_block(block: &[u8]) -> Result<BTreeMap<String, String>> {
    let text = std::str::from_utf8(block)
        .map_err(|_| TypePadError::Protocol("non-UTF-8 header block".into()))?;

    let mut headers = BTreeMap::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(colon_pos) = line.find(':') {
            let key = line[..colon_pos].trim().to_lowercase();
            let value = line[colon_pos + 1..].trim().to_string();
            headers.insert(key, value);
        }
    }
    Ok(headers)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Boundary Extraction Tests ==========

    #[test]
    fn test_boundary_quoted() {
        let b = boundary_from_content_type("multipart/parallel; boundary=\"abc123\"").unwrap();
        assert_eq!(b, "abc123");
    }

    #[test]
    fn test_boundary_unquoted() {
        let b = boundary_from_content_type("multipart/parallel; boundary=abc123").unwrap();
        assert_eq!(b, "abc123");
    }

    #[test]
    fn test_boundary_rejects_non_multipart() {
        let err = boundary_from_content_type("application/json").unwrap_err();
        assert!(matches!(err, TypePadError::Protocol(_)));
    }

    #[test]
    fn test_boundary_missing_parameter() {
        let err = boundary_from_content_type("multipart/parallel").unwrap_err();
        assert!(matches!(err, TypePadError::Protocol(_)));
    }

    // ========== HTTP Response Blob Tests ==========

    #[test]
    fn test_parse_http_response_full_status_line() {
        let blob = b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\r\n{\"a\":1}";
        let response = parse_http_response(blob).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.reason, "OK");
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.body_str(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_parse_http_response_bare_status_line() {
        let blob = b"202 Accepted\r\n\r\n";
        let response = parse_http_response(blob).unwrap();
        assert_eq!(response.status, 202);
        assert_eq!(response.reason, "Accepted");
    }

    #[test]
    fn test_parse_http_response_headers_without_body() {
        let blob = b"HTTP/1.1 304 Not Modified\r\netag: \"7\"\r\n";
        let response = parse_http_response(blob).unwrap();
        assert_eq!(response.status, 304);
        assert_eq!(response.header("etag"), Some("\"7\""));
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_parse_http_response_lowercases_header_keys() {
        let blob = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nETag: \"7\"\r\n\r\nx";
        let response = parse_http_response(blob).unwrap();
        assert!(response.headers.contains_key("content-type"));
        assert!(response.headers.contains_key("etag"));
    }

    #[test]
    fn test_parse_http_response_bad_status_line() {
        let err = parse_http_response(b"garbage here\r\n\r\n").unwrap_err();
        assert!(matches!(err, TypePadError::Protocol(_)));
    }

    // ========== Multipart Reply Tests ==========

    fn reply(parts: &[(&str, &str)], boundary: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for (id, blob) in parts {
            out.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            out.extend_from_slice(b"Content-Type: message/http-response\r\n");
            out.extend_from_slice(format!("Multipart-Request-ID: {}\r\n", id).as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(blob.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
        out
    }

    #[test]
    fn test_parse_batch_response_two_parts() {
        let body = reply(
            &[
                ("1", "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\r\n{\"n\":1}"),
                ("2", "HTTP/1.1 404 Not Found\r\n\r\n"),
            ],
            "xyz",
        );
        let parts =
            parse_batch_response("multipart/parallel; boundary=\"xyz\"", &body).unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].request_id, 1);
        assert_eq!(parts[0].response.status, 200);
        assert_eq!(parts[1].request_id, 2);
        assert_eq!(parts[1].response.status, 404);
    }

    #[test]
    fn test_parse_batch_response_preserves_wire_order() {
        let body = reply(
            &[
                ("2", "HTTP/1.1 200 OK\r\n\r\nsecond"),
                ("1", "HTTP/1.1 200 OK\r\n\r\nfirst"),
            ],
            "xyz",
        );
        let parts =
            parse_batch_response("multipart/parallel; boundary=xyz", &body).unwrap();

        assert_eq!(parts[0].request_id, 2);
        assert_eq!(parts[1].request_id, 1);
    }

    #[test]
    fn test_parse_batch_response_blob_is_opaque() {
        // A JSON body full of colons and CRLFs must not be re-parsed as
        // MIME structure.
        let inner_body = "{\"status\": \"HTTP/1.1 999 Fake\",\r\n \"note\": \"a: b\"}";
        let blob = format!("HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\r\n{}", inner_body);
        let body = reply(&[("1", &blob)], "xyz");
        let parts =
            parse_batch_response("multipart/parallel; boundary=xyz", &body).unwrap();

        assert_eq!(parts[0].response.status, 200);
        assert_eq!(parts[0].response.body_str(), Some(inner_body));
    }

    #[test]
    fn test_parse_batch_response_missing_id() {
        let mut body = Vec::new();
        body.extend_from_slice(b"--xyz\r\nContent-Type: message/http-response\r\n\r\n");
        body.extend_from_slice(b"HTTP/1.1 200 OK\r\n\r\n\r\n--xyz--\r\n");

        let err =
            parse_batch_response("multipart/parallel; boundary=xyz", &body).unwrap_err();
        assert!(matches!(err, TypePadError::Protocol(_)));
        assert!(err.to_string().contains("Multipart-Request-ID"));
    }

    #[test]
    fn test_parse_batch_response_non_numeric_id() {
        let body = reply(&[("seven", "HTTP/1.1 200 OK\r\n\r\n")], "xyz");
        let err =
            parse_batch_response("multipart/parallel; boundary=xyz", &body).unwrap_err();
        assert!(err.to_string().contains("non-numeric"));
    }

    #[test]
    fn test_parse_batch_response_wrong_part_type() {
        let mut body = Vec::new();
        body.extend_from_slice(b"--xyz\r\n");
        body.extend_from_slice(b"Content-Type: text/plain\r\nMultipart-Request-ID: 1\r\n\r\n");
        body.extend_from_slice(b"hello\r\n--xyz--\r\n");

        let err =
            parse_batch_response("multipart/parallel; boundary=xyz", &body).unwrap_err();
        assert!(err.to_string().contains("message/http-response"));
    }

    #[test]
    fn test_parse_batch_response_empty_reply() {
        let parts =
            parse_batch_response("multipart/parallel; boundary=xyz", b"--xyz--\r\n").unwrap();
        assert!(parts.is_empty());
    }

    #[test]
    fn test_round_trip_with_encoder() {
        let stored = crate::protocol::encode_sub_response(
            &SubResponse::new(200, "OK")
                .with_header("ETag", "\"7\"")
                .with_body("{\"displayName\": \"Potatoshop\"}"),
        );
        let revived = parse_http_response(&stored).unwrap();

        assert_eq!(revived.status, 200);
        assert_eq!(revived.header("etag"), Some("\"7\""));
        assert_eq!(revived.body_str(), Some("{\"displayName\": \"Potatoshop\"}"));
    }
}
