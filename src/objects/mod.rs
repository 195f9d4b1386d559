//! Typed records for the service's object model.
//!
//! Every record the server hands back carries `objectTypes`, a list of
//! type URIs from most to least specific. The dispatcher here maps those
//! URIs onto concrete Rust types, so a generic fetch can come back as the
//! specific kind the server declared. [`Asset`] and [`Entity`] decode
//! through the registry; plain records like [`User`] decode directly.

mod application;
mod asset;
mod event;
mod favorite;
mod group;
mod list;
mod relationship;
mod user;

pub use application::{ApiKey, Application, AuthToken};
pub use asset::{
    Asset, AssetKind, AssetRef, AssetSource, Audio, AudioLink, Comment, GenericAsset, LinkAsset,
    Photo, Post, Video, VideoLink,
};
pub use event::Event;
pub use favorite::Favorite;
pub use group::Group;
pub use list::{ApiList, Filters};
pub use relationship::{Relationship, RelationshipStatus};
pub use user::{User, UserProfile};

use crate::error::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Object-type URIs the service publishes for its concrete kinds.
pub mod object_type {
    pub const USER: &str = "tag:api.typepad.com,2009:User";
    pub const GROUP: &str = "tag:api.typepad.com,2009:Group";
    pub const APPLICATION: &str = "tag:api.typepad.com,2009:Application";
    pub const POST: &str = "tag:api.typepad.com,2009:Post";
    pub const PHOTO: &str = "tag:api.typepad.com,2009:Photo";
    pub const VIDEO: &str = "tag:api.typepad.com,2009:Video";
    pub const AUDIO: &str = "tag:api.typepad.com,2009:Audio";
    pub const COMMENT: &str = "tag:api.typepad.com,2009:Comment";
    pub const LINK: &str = "tag:api.typepad.com,2009:Link";
    pub const EVENT: &str = "tag:api.typepad.com,2009:Event";
    pub const RELATIONSHIP: &str = "tag:api.typepad.com,2009:Relationship";
    pub const FAVORITE: &str = "tag:api.typepad.com,2009:Favorite";
    pub const USER_PROFILE: &str = "tag:api.typepad.com,2009:UserProfile";
    pub const API_KEY: &str = "tag:api.typepad.com,2009:ApiKey";
    pub const AUTH_TOKEN: &str = "tag:api.typepad.com,2009:AuthToken";

    // relationship status types
    pub const ADMIN: &str = "tag:api.typepad.com,2009:Admin";
    pub const MEMBER: &str = "tag:api.typepad.com,2009:Member";
    pub const BLOCKED: &str = "tag:api.typepad.com,2009:Blocked";
}

/// Record kinds the dispatcher can pick from a type URI.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RecordKind {
    User,
    Group,
    Application,
    Post,
    Photo,
    Video,
    Audio,
    Comment,
    Link,
}

static RECORD_KINDS: Lazy<BTreeMap<&'static str, RecordKind>> = Lazy::new(|| {
    BTreeMap::from([
        (object_type::USER, RecordKind::User),
        (object_type::GROUP, RecordKind::Group),
        (object_type::APPLICATION, RecordKind::Application),
        (object_type::POST, RecordKind::Post),
        (object_type::PHOTO, RecordKind::Photo),
        (object_type::VIDEO, RecordKind::Video),
        (object_type::AUDIO, RecordKind::Audio),
        (object_type::COMMENT, RecordKind::Comment),
        (object_type::LINK, RecordKind::Link),
    ])
});

pub(crate) fn kind_for_uri(uri: &str) -> Option<RecordKind> {
    RECORD_KINDS.get(uri).copied()
}

/// First declared type URI that names a known kind.
pub(crate) fn kind_for_value(value: &serde_json::Value) -> Option<RecordKind> {
    value
        .get("objectTypes")?
        .as_array()?
        .iter()
        .filter_map(|uri| uri.as_str())
        .find_map(kind_for_uri)
}

/// Common surface of the typed records.
pub trait ApiObject {
    /// Type URI naming this concrete kind, when the service declares one.
    const OBJECT_TYPE_URI: Option<&'static str>;

    /// Type URIs the server attached to this record.
    fn object_types(&self) -> &[String];

    /// Short identifier used in resource URLs.
    fn url_id(&self) -> Option<&str>;

    /// Canonical resource URL, when the record's identity is known.
    fn make_self_link(&self) -> Option<String>;

    /// URL of a related list endpoint under this record's resource.
    fn related_list_url(&self, sub: &str) -> Option<String> {
        let link = self.make_self_link()?;
        let base = link.strip_suffix(".json")?;
        Some(format!("{}/{}.json", base, sub))
    }

    /// JSON snapshot of this record.
    ///
    /// Injects the declaring kind's type URI when the record was built
    /// locally without one, so the server can classify it.
    fn to_value(&self) -> Result<serde_json::Value>
    where
        Self: Serialize,
    {
        let mut value = serde_json::to_value(self)?;
        if let (Some(uri), Some(map)) = (Self::OBJECT_TYPE_URI, value.as_object_mut()) {
            let declared = map
                .get("objectTypes")
                .and_then(|types| types.as_array())
                .is_some_and(|types| !types.is_empty());
            if !declared {
                map.insert(
                    "objectTypes".to_string(),
                    serde_json::Value::Array(vec![serde_json::Value::String(uri.to_string())]),
                );
            }
        }
        Ok(value)
    }
}

/// Implement [`ApiObject`] for a record with `object_types` and `url_id`
/// fields.
///
/// ```ignore
/// api_object!(User, uri: Some(object_type::USER), self_link: "/users/{}.json");
/// // expands to an ApiObject impl whose make_self_link formats the
/// // record's url_id into the pattern.
/// ```
macro_rules! api_object {
    ($type:ty, uri: $uri:expr, self_link: $pattern:literal) => {
        impl $crate::objects::ApiObject for $type {
            const OBJECT_TYPE_URI: Option<&'static str> = $uri;

            fn object_types(&self) -> &[String] {
                &self.object_types
            }

            fn url_id(&self) -> Option<&str> {
                self.url_id.as_deref()
            }

            fn make_self_link(&self) -> Option<String> {
                self.url_id.as_deref().map(|id| format!($pattern, id))
            }
        }
    };
    ($type:ty, uri: $uri:expr) => {
        impl $crate::objects::ApiObject for $type {
            const OBJECT_TYPE_URI: Option<&'static str> = $uri;

            fn object_types(&self) -> &[String] {
                &self.object_types
            }

            fn url_id(&self) -> Option<&str> {
                self.url_id.as_deref()
            }

            fn make_self_link(&self) -> Option<String> {
                None
            }
        }
    };
}

/// Generate `*_url` accessors for the list endpoints under a record.
///
/// ```ignore
/// related_lists!(User {
///     memberships_url => "memberships" as ApiList<Relationship>,
/// });
/// // expands to `fn memberships_url(&self) -> Option<String>` returning
/// // `/users/{url_id}/memberships.json`.
/// ```
macro_rules! related_lists {
    ($type:ty { $($method:ident => $sub:literal as $entry:ty),+ $(,)? }) => {
        impl $type {
            $(
                #[doc = concat!(
                    "URL of this record's `", $sub, "` list; entries decode as `",
                    stringify!($entry), "`."
                )]
                pub fn $method(&self) -> Option<String> {
                    $crate::objects::ApiObject::related_list_url(self, $sub)
                }
            )+
        }
    };
}

pub(crate) use api_object;
pub(crate) use related_lists;

/// Any record an event or relationship can point at.
#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    User(User),
    Group(Group),
    Application(Application),
    Asset(Asset),
}

impl Entity {
    /// Decode a JSON object into the kind its `objectTypes` declare.
    ///
    /// Anything that is not a user, group, or application decodes as an
    /// asset, falling back to [`Asset::Other`] for unknown types.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(match kind_for_value(&value) {
            Some(RecordKind::User) => Entity::User(serde_json::from_value(value)?),
            Some(RecordKind::Group) => Entity::Group(serde_json::from_value(value)?),
            Some(RecordKind::Application) => Entity::Application(serde_json::from_value(value)?),
            _ => Entity::Asset(Asset::from_value(value)?),
        })
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Entity::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Entity::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            Entity::Asset(asset) => Some(asset),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Entity::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Entity {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Entity::User(user) => user.serialize(serializer),
            Entity::Group(group) => group.serialize(serializer),
            Entity::Application(application) => application.serialize(serializer),
            Entity::Asset(asset) => asset.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_uri_knows_the_registry() {
        assert_eq!(kind_for_uri(object_type::PHOTO), Some(RecordKind::Photo));
        assert_eq!(kind_for_uri("tag:api.typepad.com,2009:Blog"), None);
    }

    #[test]
    fn test_kind_for_value_takes_first_known_uri() {
        let value = serde_json::json!({
            "objectTypes": ["tag:example.com,2011:Widget", object_type::USER],
        });
        assert_eq!(kind_for_value(&value), Some(RecordKind::User));
    }

    #[test]
    fn test_entity_dispatches_users() {
        let entity: Entity = serde_json::from_value(serde_json::json!({
            "objectTypes": [object_type::USER],
            "urlId": "moose",
            "displayName": "Potatoshop",
        }))
        .unwrap();

        let user = entity.as_user().expect("decoded as a user");
        assert_eq!(user.display_name.as_deref(), Some("Potatoshop"));
    }

    #[test]
    fn test_entity_falls_back_to_assets() {
        let entity: Entity = serde_json::from_value(serde_json::json!({
            "objectTypes": ["tag:example.com,2011:Widget"],
            "urlId": "w1",
        }))
        .unwrap();

        assert!(matches!(entity, Entity::Asset(Asset::Other(_))));
    }
}
