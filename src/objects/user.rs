//! User accounts and their profiles.

use crate::error::Result;
use crate::objects::{api_object, object_type, related_lists};
use crate::types::{ImageLink, LinkSet};
use crate::urls;
use serde::{Deserialize, Serialize};

/// A registered account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    /// Full tag URI identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_link: Option<ImageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_page_url: Option<String>,
    #[serde(skip_serializing_if = "LinkSet::is_empty")]
    pub links: LinkSet,
}

api_object!(User, uri: Some(object_type::USER), self_link: "/users/{}.json");

related_lists!(User {
    relationships_url => "relationships" as ApiList<Relationship>,
    memberships_url => "memberships" as ApiList<Relationship>,
    events_url => "events" as ApiList<Event>,
    notifications_url => "notifications" as ApiList<Event>,
    favorites_url => "favorites" as ApiList<Favorite>,
});

impl User {
    /// Resource URL for a user by url id.
    pub fn url_for(url_id: &str) -> Result<String> {
        Ok(format!("/users/{}.json", urls::validate_url_id(url_id)?))
    }

    /// Resource URL for a user by full tag URI identifier.
    pub fn url_for_id(id: &str) -> Result<String> {
        match urls::xid_from_tag_uri(id) {
            Some(xid) => Ok(format!("/users/{}.json", xid)),
            None => Err(crate::error::TypePadError::Usage(format!(
                "{:?} is not a usable identifier",
                id
            ))),
        }
    }

    /// Resource URL of the authenticated user.
    pub fn self_url() -> &'static str {
        "/users/@self.json"
    }

    /// URL of this user's profile record.
    pub fn profile_url(&self) -> Option<String> {
        self.url_id
            .as_deref()
            .map(|id| format!("/users/{}/profile.json", id))
    }
}

/// The public profile attached to a [`User`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_link: Option<ImageLink>,
}

api_object!(
    UserProfile,
    uri: Some(object_type::USER_PROFILE),
    self_link: "/users/{}/profile.json"
);
