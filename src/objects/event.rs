//! Events: the activity stream's records.

use crate::objects::{api_object, object_type, Entity};
use serde::{Deserialize, Serialize};

/// One activity stream entry: an actor did something to an object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    /// Full tag URI identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<String>,
    /// Verb URIs describing what happened, most specific first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub verbs: Vec<String>,
    /// When the event happened, W3CDTF.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// Who did it; dispatched on its declared object types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Entity>,
    /// What it was done to; dispatched on its declared object types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<Entity>,
}

api_object!(Event, uri: Some(object_type::EVENT), self_link: "/events/{}.json");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Asset, AssetKind};

    #[test]
    fn test_event_dispatches_actor_and_object() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "urlId": "e1",
            "objectTypes": [object_type::EVENT],
            "verbs": ["tag:api.typepad.com,2009:NewAsset"],
            "actor": {
                "objectTypes": [object_type::USER],
                "urlId": "moose",
                "displayName": "Potatoshop",
            },
            "object": {
                "objectTypes": [object_type::POST],
                "urlId": "6a0110",
                "title": "sturm",
            },
        }))
        .unwrap();

        let actor = event.actor.as_ref().and_then(Entity::as_user).unwrap();
        assert_eq!(actor.url_id.as_deref(), Some("moose"));

        let object = event.object.as_ref().and_then(Entity::as_asset).unwrap();
        assert_eq!(object.kind(), Some(AssetKind::Post));
        assert!(matches!(object, Asset::Post(_)));
    }

    #[test]
    fn test_event_tolerates_missing_halves() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "urlId": "e2",
            "verbs": ["tag:api.typepad.com,2009:JoinedGroup"],
        }))
        .unwrap();

        assert!(event.actor.is_none());
        assert!(event.object.is_none());
    }
}
