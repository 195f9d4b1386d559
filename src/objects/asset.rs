//! Assets: the content records of the service.
//!
//! The server publishes every piece of content as an "asset" and names
//! the concrete kind in `objectTypes`. [`Asset`] decodes through that
//! declaration, so a `GET /assets/{id}.json` comes back as the specific
//! kind without the caller naming it up front.

use crate::error::Result;
use crate::objects::user::User;
use crate::objects::{api_object, object_type, RecordKind};
use crate::types::{ImageLink, LinkSet};
use serde::{Deserialize, Serialize};

/// Concrete asset kinds the dispatcher recognizes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssetKind {
    Post,
    Photo,
    Video,
    Audio,
    Comment,
    Link,
}

fn asset_kind_for_uri(uri: &str) -> Option<AssetKind> {
    match crate::objects::kind_for_uri(uri)? {
        RecordKind::Post => Some(AssetKind::Post),
        RecordKind::Photo => Some(AssetKind::Photo),
        RecordKind::Video => Some(AssetKind::Video),
        RecordKind::Audio => Some(AssetKind::Audio),
        RecordKind::Comment => Some(AssetKind::Comment),
        RecordKind::Link => Some(AssetKind::Link),
        _ => None,
    }
}

/// Where a cross-posted asset originally came from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<String>,
}

/// The external service an asset was syndicated from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Provider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Embed details for a video asset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink_url: Option<String>,
}

/// Stream details for an audio asset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

/// A reference to an asset, carried inside other records.
///
/// References never reclassify: a comment's `inReplyTo` stays a
/// reference no matter what kind of asset it points at.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetRef {
    /// Full tag URI of the referenced asset.
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<String>,
}

api_object!(AssetRef, uri: None, self_link: "/assets/{}.json");

macro_rules! asset_fields {
    ($(#[$meta:meta])* $name:ident { $($extra:tt)* }) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase", default)]
        pub struct $name {
            /// Full tag URI identifier.
            #[serde(skip_serializing_if = "Option::is_none")]
            pub id: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub url_id: Option<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            pub object_types: Vec<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub title: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub excerpt: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub content: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub text_format: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub author: Option<User>,
            /// Publication timestamp, W3CDTF.
            #[serde(skip_serializing_if = "Option::is_none")]
            pub published: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub permalink_url: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub favorite_count: Option<u64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub comment_count: Option<u64>,
            /// Tag URIs of the groups this asset was posted to.
            #[serde(skip_serializing_if = "Vec::is_empty")]
            pub groups: Vec<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub source: Option<AssetSource>,
            #[serde(skip_serializing_if = "LinkSet::is_empty")]
            pub links: LinkSet,
            $($extra)*
        }
    };
}

asset_fields! {
    /// A textual post.
    Post {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub categories: Vec<String>,
    }
}

asset_fields! {
    /// A photo.
    Photo {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub image_link: Option<ImageLink>,
    }
}

asset_fields! {
    /// An embedded video.
    Video {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub video_link: Option<VideoLink>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub preview_image_link: Option<ImageLink>,
    }
}

asset_fields! {
    /// An audio recording.
    Audio {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub audio_link: Option<AudioLink>,
    }
}

asset_fields! {
    /// A comment on another asset.
    Comment {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub in_reply_to: Option<AssetRef>,
    }
}

asset_fields! {
    /// A shared link.
    LinkAsset {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub target_url: Option<String>,
    }
}

asset_fields! {
    /// An asset of a kind this client has no specific type for.
    GenericAsset {}
}

api_object!(Post, uri: Some(object_type::POST), self_link: "/assets/{}.json");
api_object!(Photo, uri: Some(object_type::PHOTO), self_link: "/assets/{}.json");
api_object!(Video, uri: Some(object_type::VIDEO), self_link: "/assets/{}.json");
api_object!(Audio, uri: Some(object_type::AUDIO), self_link: "/assets/{}.json");
api_object!(Comment, uri: Some(object_type::COMMENT), self_link: "/assets/{}.json");
api_object!(LinkAsset, uri: Some(object_type::LINK), self_link: "/assets/{}.json");
api_object!(GenericAsset, uri: None, self_link: "/assets/{}.json");

/// An asset of whichever kind the server declared.
#[derive(Clone, Debug, PartialEq)]
pub enum Asset {
    Post(Post),
    Photo(Photo),
    Video(Video),
    Audio(Audio),
    Comment(Comment),
    Link(LinkAsset),
    Other(GenericAsset),
}

macro_rules! with_asset {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Asset::Post($inner) => $body,
            Asset::Photo($inner) => $body,
            Asset::Video($inner) => $body,
            Asset::Audio($inner) => $body,
            Asset::Comment($inner) => $body,
            Asset::Link($inner) => $body,
            Asset::Other($inner) => $body,
        }
    };
}

impl Asset {
    /// Resource URL for an asset by url id.
    pub fn url_for(url_id: &str) -> Result<String> {
        Ok(format!("/assets/{}.json", crate::urls::validate_url_id(url_id)?))
    }

    /// Decode a JSON object into the kind named by the first known URI
    /// in its `objectTypes`; unknown declarations fall back to
    /// [`Asset::Other`].
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let kind = value
            .get("objectTypes")
            .and_then(|types| types.as_array())
            .and_then(|uris| {
                uris.iter()
                    .filter_map(|uri| uri.as_str())
                    .find_map(asset_kind_for_uri)
            });
        Ok(match kind {
            Some(AssetKind::Post) => Asset::Post(serde_json::from_value(value)?),
            Some(AssetKind::Photo) => Asset::Photo(serde_json::from_value(value)?),
            Some(AssetKind::Video) => Asset::Video(serde_json::from_value(value)?),
            Some(AssetKind::Audio) => Asset::Audio(serde_json::from_value(value)?),
            Some(AssetKind::Comment) => Asset::Comment(serde_json::from_value(value)?),
            Some(AssetKind::Link) => Asset::Link(serde_json::from_value(value)?),
            None => Asset::Other(serde_json::from_value(value)?),
        })
    }

    /// Kind this value currently decodes as; `None` for [`Asset::Other`].
    pub fn kind(&self) -> Option<AssetKind> {
        match self {
            Asset::Post(_) => Some(AssetKind::Post),
            Asset::Photo(_) => Some(AssetKind::Photo),
            Asset::Video(_) => Some(AssetKind::Video),
            Asset::Audio(_) => Some(AssetKind::Audio),
            Asset::Comment(_) => Some(AssetKind::Comment),
            Asset::Link(_) => Some(AssetKind::Link),
            Asset::Other(_) => None,
        }
    }

    /// Re-dispatch this asset on its declared object types.
    ///
    /// A value whose variant already matches the declaration is returned
    /// untouched, so reclassifying twice is the same as once.
    pub fn reclassify(self) -> Result<Self> {
        let declared = self
            .object_types()
            .iter()
            .find_map(|uri| asset_kind_for_uri(uri));
        if declared == self.kind() {
            return Ok(self);
        }
        Asset::from_value(serde_json::to_value(&self)?)
    }

    pub fn object_types(&self) -> &[String] {
        with_asset!(self, inner => &inner.object_types)
    }

    pub fn url_id(&self) -> Option<&str> {
        with_asset!(self, inner => inner.url_id.as_deref())
    }

    pub fn title(&self) -> Option<&str> {
        with_asset!(self, inner => inner.title.as_deref())
    }

    pub fn author(&self) -> Option<&User> {
        with_asset!(self, inner => inner.author.as_ref())
    }

    /// Canonical resource URL, when the asset's identity is known.
    pub fn make_self_link(&self) -> Option<String> {
        self.url_id().map(|id| format!("/assets/{}.json", id))
    }

    /// JSON snapshot carrying the variant's type URI even when the
    /// record was built locally without one.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        use crate::objects::ApiObject;
        with_asset!(self, inner => inner.to_value())
    }

    fn related_list_url(&self, sub: &str) -> Option<String> {
        let link = self.make_self_link()?;
        Some(format!("{}/{}.json", link.strip_suffix(".json")?, sub))
    }

    /// URL of this asset's `comments` list; entries decode as
    /// `ApiList<Comment>`.
    pub fn comments_url(&self) -> Option<String> {
        self.related_list_url("comments")
    }

    /// URL of this asset's `favorites` list; entries decode as
    /// `ApiList<Favorite>`.
    pub fn favorites_url(&self) -> Option<String> {
        self.related_list_url("favorites")
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Asset::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Asset {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        with_asset!(self, inner => inner.serialize(serializer))
    }
}
