//! Wire format for the TypePad batch endpoint.
//!
//! A batch is one `multipart/parallel` message. Each sub-request travels as
//! a `message/http-request` part and comes back as a `message/http-response`
//! part; the two are re-associated by the `Multipart-Request-ID` part
//! header, so the server may answer in any order.

mod encoder;
mod parser;

pub use encoder::{encode_batch, encode_sub_request, encode_sub_response};
pub use parser::{boundary_from_content_type, parse_batch_response, parse_http_response, ParsedPart};

/// Content type of the outer batch message.
pub const MULTIPART_PARALLEL: &str = "multipart/parallel";
/// Content type of each outgoing sub-part.
pub const MESSAGE_HTTP_REQUEST: &str = "message/http-request";
/// Content type of each incoming sub-part.
pub const MESSAGE_HTTP_RESPONSE: &str = "message/http-response";
/// Part header carrying the sub-request id.
pub const REQUEST_ID_HEADER: &str = "multipart-request-id";

/// Generate a fresh boundary for one batch message, in the
/// `===============N==` shape the service's own tooling emits.
pub fn generate_boundary() -> String {
    format!("==============={:020}==", rand::random::<u64>())
}
