//! Identifier helpers for resource URLs.
//!
//! The service names records with tag URIs like
//! `tag:api.typepad.com,2009:6p0120a5fd9269970b`; resource URLs use only
//! the short alphanumeric tail (the `xid`).

use crate::error::{Result, TypePadError};
use once_cell::sync::Lazy;
use regex::Regex;

static URL_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// True when `id` can be used verbatim as a path segment.
pub fn is_url_id(id: &str) -> bool {
    URL_ID_REGEX.is_match(id)
}

/// Check `id` for use as a path segment, passing it through.
pub fn validate_url_id(id: &str) -> Result<&str> {
    if is_url_id(id) {
        Ok(id)
    } else {
        Err(TypePadError::Usage(format!(
            "{:?} is not usable as a url id",
            id
        )))
    }
}

/// Extract the `xid` tail from a full tag URI identifier.
///
/// Takes the last colon-separated piece and strips any `kind-` prefix;
/// compound identifiers like `tag:…:6a013…:6p012…` yield the final xid.
/// Returns `None` when the tail is not a valid url id.
pub fn xid_from_tag_uri(id: &str) -> Option<&str> {
    let tail = id.rsplit(':').next().unwrap_or(id);
    let tail = tail.rsplit('-').next().unwrap_or(tail);
    if is_url_id(tail) {
        Some(tail)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xid_from_plain_tag_uri() {
        assert_eq!(
            xid_from_tag_uri("tag:api.typepad.com,2009:6p0120a5fd9269970b"),
            Some("6p0120a5fd9269970b")
        );
    }

    #[test]
    fn test_xid_strips_kind_prefix() {
        assert_eq!(
            xid_from_tag_uri("tag:api.typepad.com,2009:user-6p0120a5fd9269970b"),
            Some("6p0120a5fd9269970b")
        );
    }

    #[test]
    fn test_xid_takes_last_piece_of_compound_ids() {
        assert_eq!(
            xid_from_tag_uri("tag:api.typepad.com,2009:6a0111:6p0120"),
            Some("6p0120")
        );
    }

    #[test]
    fn test_xid_rejects_bad_tails() {
        assert_eq!(xid_from_tag_uri("tag:api.typepad.com,2009:"), None);
        assert_eq!(xid_from_tag_uri("tag:api.typepad.com,2009:with space"), None);
    }

    #[test]
    fn test_validate_url_id() {
        assert!(validate_url_id("6p0120a5fd9269970b").is_ok());
        assert!(validate_url_id("moose_42").is_ok());
        assert!(matches!(
            validate_url_id("@self"),
            Err(TypePadError::Usage(_))
        ));
        assert!(matches!(validate_url_id(""), Err(TypePadError::Usage(_))));
    }
}
