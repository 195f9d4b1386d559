//! Favorites: a user's bookmark of an asset.

use crate::error::Result;
use crate::objects::asset::AssetRef;
use crate::objects::user::User;
use crate::objects::{api_object, object_type};
use crate::urls;
use serde::{Deserialize, Serialize};

/// One user's favorite of one asset.
///
/// The record's url id is the compound `{asset_xid}:{user_xid}`, which
/// is also how the resource is addressed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Favorite {
    /// Full tag URI identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<AssetRef>,
    /// When the favorite was made, W3CDTF.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
}

api_object!(Favorite, uri: Some(object_type::FAVORITE), self_link: "/favorites/{}.json");

impl Favorite {
    /// Resource URL for one user's favorite of one asset.
    pub fn url_for(asset_xid: &str, user_xid: &str) -> Result<String> {
        Ok(format!(
            "/favorites/{}:{}.json",
            urls::validate_url_id(asset_xid)?,
            urls::validate_url_id(user_xid)?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ApiObject;

    #[test]
    fn test_compound_url() {
        assert_eq!(
            Favorite::url_for("6a0110", "6p0120").unwrap(),
            "/favorites/6a0110:6p0120.json"
        );
        assert!(Favorite::url_for("6a0110", "").is_err());
    }

    #[test]
    fn test_self_link_uses_compound_url_id() {
        let favorite: Favorite = serde_json::from_value(serde_json::json!({
            "urlId": "6a0110:6p0120",
            "objectTypes": [object_type::FAVORITE],
            "author": {"objectTypes": [object_type::USER], "urlId": "6p0120"},
            "inReplyTo": {"ref": "tag:api.typepad.com,2009:6a0110", "urlId": "6a0110"},
        }))
        .unwrap();

        assert_eq!(
            favorite.make_self_link().as_deref(),
            Some("/favorites/6a0110:6p0120.json")
        );
        assert_eq!(
            favorite.in_reply_to.as_ref().and_then(|r| r.url_id.as_deref()),
            Some("6a0110")
        );
    }
}
