//! Groups: the shared spaces assets are posted into.

use crate::error::Result;
use crate::objects::{api_object, object_type, related_lists};
use crate::types::{ImageLink, LinkSet};
use crate::urls;
use serde::{Deserialize, Serialize};

/// A group of users sharing content.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
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
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_link: Option<ImageLink>,
    #[serde(skip_serializing_if = "LinkSet::is_empty")]
    pub links: LinkSet,
}

api_object!(Group, uri: Some(object_type::GROUP), self_link: "/groups/{}.json");

related_lists!(Group {
    memberships_url => "memberships" as ApiList<Relationship>,
    assets_url => "assets" as ApiList<Asset>,
    events_url => "events" as ApiList<Event>,
    post_assets_url => "post-assets" as ApiList<Post>,
    photo_assets_url => "photo-assets" as ApiList<Photo>,
    video_assets_url => "video-assets" as ApiList<Video>,
    audio_assets_url => "audio-assets" as ApiList<Audio>,
    link_assets_url => "link-assets" as ApiList<LinkAsset>,
});

impl Group {
    /// Resource URL for a group by url id.
    pub fn url_for(url_id: &str) -> Result<String> {
        Ok(format!("/groups/{}.json", urls::validate_url_id(url_id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ApiObject;

    #[test]
    fn test_self_link_and_related_lists() {
        let group = Group {
            url_id: Some("1".to_string()),
            display_name: Some("drang".to_string()),
            ..Default::default()
        };

        assert_eq!(group.make_self_link().as_deref(), Some("/groups/1.json"));
        assert_eq!(
            group.memberships_url().as_deref(),
            Some("/groups/1/memberships.json")
        );
        assert_eq!(
            group.post_assets_url().as_deref(),
            Some("/groups/1/post-assets.json")
        );
    }

    #[test]
    fn test_url_for_validates_ids() {
        assert_eq!(Group::url_for("1").unwrap(), "/groups/1.json");
        assert!(Group::url_for("one/two").is_err());
    }
}
