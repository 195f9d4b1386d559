//! Relationships between users and groups.

use crate::objects::{api_object, object_type, Entity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The current types of a relationship edge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationshipStatus {
    /// Relationship type URIs currently in force.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

impl RelationshipStatus {
    pub fn has_type(&self, uri: &str) -> bool {
        self.types.iter().any(|t| t == uri)
    }
}

/// A directed edge from `source` to `target`.
///
/// Membership lists are relationships whose source is a group; contact
/// lists are relationships between users.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Relationship {
    /// Full tag URI identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RelationshipStatus>,
    /// When each in-force relationship type was established, keyed by
    /// type URI.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub created: BTreeMap<String, String>,
}

api_object!(
    Relationship,
    uri: Some(object_type::RELATIONSHIP),
    self_link: "/relationships/{}.json"
);

impl Relationship {
    fn has_status(&self, uri: &str) -> bool {
        self.status
            .as_ref()
            .is_some_and(|status| status.has_type(uri))
    }

    pub fn is_admin(&self) -> bool {
        self.has_status(object_type::ADMIN)
    }

    pub fn is_member(&self) -> bool {
        self.has_status(object_type::MEMBER)
    }

    pub fn is_blocked(&self) -> bool {
        self.has_status(object_type::BLOCKED)
    }

    /// URL of this relationship's status record, for membership edits.
    pub fn status_url(&self) -> Option<String> {
        self.url_id
            .as_deref()
            .map(|id| format!("/relationships/{}/status.json", id))
    }
}
