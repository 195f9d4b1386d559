//! List resources: typed pages and path-segment filters.

use crate::error::{Result, TypePadError};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One page of a list resource.
///
/// List endpoints answer with `totalResults`, `startIndex`, and an
/// `entries` array of the endpoint's record type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiList<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_results: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<T>,
}

impl<T> ApiList<T> {
    /// Number of entries in this page.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }
}

impl<T> Default for ApiList<T> {
    fn default() -> Self {
        ApiList {
            total_results: None,
            start_index: None,
            entries: Vec::new(),
        }
    }
}

impl<T> IntoIterator for ApiList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ApiList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Filter names the service understands as path segments, in the order
/// it requires them to appear.
const CANONICAL_ORDER: &[&str] = &[
    "following",
    "follower",
    "blocked",
    "friend",
    "nonreciprocal",
    "published",
    "unpublished",
    "spam",
    "admin",
    "member",
    "by-group",
    "by-user",
    "photo",
    "post",
    "video",
    "audio",
    "comment",
    "link",
];

/// `by-group` and `by-user` carry their value as the next path segment.
fn takes_value(name: &str) -> bool {
    matches!(name, "by-group" | "by-user")
}

// RFC 3986 unreserved set, for query parameter values added by callers.
const QUERY_ESCAPE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A set of list filters to weave into a list URL.
///
/// Filters become `@` path segments before the terminal `.json`, always
/// emitted in the service's canonical order regardless of the order they
/// were added in; paging and other parameters become query arguments.
///
/// ```
/// use typepad_api::objects::Filters;
///
/// let url = Filters::new()
///     .by_group("7")
///     .member()
///     .start_index(0)
///     .apply("/groups/1/memberships.json")
///     .unwrap();
/// assert_eq!(url, "/groups/1/memberships/@member/@by-group/7.json?start-index=0");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Filters {
    segments: BTreeMap<&'static str, Option<String>>,
    query: Vec<(String, String)>,
}

impl Filters {
    pub fn new() -> Self {
        Filters::default()
    }

    fn flag(mut self, name: &'static str) -> Self {
        self.segments.insert(name, None);
        self
    }

    fn valued(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.segments.insert(name, Some(value.into()));
        self
    }

    pub fn following(self) -> Self {
        self.flag("following")
    }

    pub fn follower(self) -> Self {
        self.flag("follower")
    }

    pub fn blocked(self) -> Self {
        self.flag("blocked")
    }

    pub fn friend(self) -> Self {
        self.flag("friend")
    }

    pub fn nonreciprocal(self) -> Self {
        self.flag("nonreciprocal")
    }

    pub fn published(self) -> Self {
        self.flag("published")
    }

    pub fn unpublished(self) -> Self {
        self.flag("unpublished")
    }

    pub fn spam(self) -> Self {
        self.flag("spam")
    }

    pub fn admin(self) -> Self {
        self.flag("admin")
    }

    pub fn member(self) -> Self {
        self.flag("member")
    }

    /// Restrict to records tied to the group with this url id.
    pub fn by_group(self, url_id: impl Into<String>) -> Self {
        self.valued("by-group", url_id)
    }

    /// Restrict to records tied to the user with this url id.
    pub fn by_user(self, url_id: impl Into<String>) -> Self {
        self.valued("by-user", url_id)
    }

    pub fn photo(self) -> Self {
        self.flag("photo")
    }

    pub fn post(self) -> Self {
        self.flag("post")
    }

    pub fn video(self) -> Self {
        self.flag("video")
    }

    pub fn audio(self) -> Self {
        self.flag("audio")
    }

    pub fn comment(self) -> Self {
        self.flag("comment")
    }

    pub fn link(self) -> Self {
        self.flag("link")
    }

    /// First entry index to return, as the `start-index` query argument.
    pub fn start_index(self, index: u64) -> Self {
        self.param("start-index", index.to_string())
    }

    /// Page size, as the `max-results` query argument.
    pub fn max_results(self, count: u64) -> Self {
        self.param("max-results", count.to_string())
    }

    /// Any other parameter, carried as a query argument.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Rewrite `url` with these filters.
    ///
    /// Known `@` segments already in the path are merged with the new
    /// ones (new values win) and re-emitted in canonical order; other
    /// segments, including aliases like `@self`, stay where they are.
    /// Fails with a usage error when the path does not end in `.json`.
    pub fn apply(&self, url: &str) -> Result<String> {
        let (path_part, query_part) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };
        let path = path_part.strip_suffix(".json").ok_or_else(|| {
            TypePadError::Usage(format!(
                "cannot filter {:?}: the path does not end in .json",
                url
            ))
        })?;

        let mut merged: BTreeMap<&str, Option<String>> = BTreeMap::new();
        let mut plain: Vec<&str> = Vec::new();
        let mut segments = path.split('/');
        while let Some(segment) = segments.next() {
            let name = match segment.strip_prefix('@') {
                Some(name) if CANONICAL_ORDER.contains(&name) => name,
                _ => {
                    plain.push(segment);
                    continue;
                }
            };
            if takes_value(name) {
                let value = segments.next().ok_or_else(|| {
                    TypePadError::Usage(format!(
                        "filter @{} in {:?} is missing its value segment",
                        name, url
                    ))
                })?;
                merged.insert(name, Some(value.to_string()));
            } else {
                merged.insert(name, None);
            }
        }
        for (name, value) in &self.segments {
            merged.insert(name, value.clone());
        }

        let mut out = plain.join("/");
        for name in CANONICAL_ORDER {
            if let Some(value) = merged.get(name) {
                out.push_str("/@");
                out.push_str(name);
                if let Some(value) = value {
                    out.push('/');
                    out.push_str(&utf8_percent_encode(value, QUERY_ESCAPE_SET).to_string());
                }
            }
        }
        out.push_str(".json");

        // existing query arguments are already encoded; added ones are
        // encoded here, and replace same-name existing ones
        let mut args: Vec<(String, String)> = Vec::new();
        if let Some(query) = query_part {
            for pair in query.split('&').filter(|pair| !pair.is_empty()) {
                match pair.split_once('=') {
                    Some((name, value)) => args.push((name.to_string(), value.to_string())),
                    None => args.push((pair.to_string(), String::new())),
                }
            }
        }
        for (name, value) in &self.query {
            let encoded_name = utf8_percent_encode(name, QUERY_ESCAPE_SET).to_string();
            args.retain(|(existing, _)| *existing != encoded_name);
            args.push((
                encoded_name,
                utf8_percent_encode(value, QUERY_ESCAPE_SET).to_string(),
            ));
        }
        if !args.is_empty() {
            let joined = args
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("&");
            out.push('?');
            out.push_str(&joined);
        }
        Ok(out)
    }
}
