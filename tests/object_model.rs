//! Typed decoding and URL composition across the object model.

use typepad_api::objects::{object_type, AssetKind, Comment, Favorite, GenericAsset, Group};
use typepad_api::{ApiList, ApiObject, Asset, Entity, Event, Filters, Relationship, User};

fn membership_page() -> serde_json::Value {
    serde_json::json!({
        "totalResults": 2,
        "startIndex": 0,
        "entries": [
            {
                "urlId": "7",
                "objectTypes": [object_type::RELATIONSHIP],
                "source": {"objectTypes": [object_type::GROUP], "urlId": "1"},
                "target": {"objectTypes": [object_type::USER], "urlId": "moose"},
                "status": {"types": [object_type::ADMIN, object_type::MEMBER]},
            },
            {
                "urlId": "8",
                "objectTypes": [object_type::RELATIONSHIP],
                "source": {"objectTypes": [object_type::GROUP], "urlId": "1"},
                "target": {"objectTypes": [object_type::USER], "urlId": "fred"},
                "status": {"types": [object_type::BLOCKED]},
            },
        ],
    })
}

#[test]
fn test_membership_listing_flow() {
    // compose the filtered list URL from the group record itself
    let group = Group {
        url_id: Some("1".to_string()),
        ..Default::default()
    };
    let url = Filters::new()
        .member()
        .by_group("7")
        .start_index(0)
        .apply(&group.memberships_url().unwrap())
        .unwrap();
    assert_eq!(
        url,
        "/groups/1/memberships/@member/@by-group/7.json?start-index=0"
    );

    let page: ApiList<Relationship> = serde_json::from_value(membership_page()).unwrap();
    assert_eq!(page.total_results, Some(2));

    let admins: Vec<&Relationship> = page.iter().filter(|r| r.is_admin()).collect();
    assert_eq!(admins.len(), 1);
    assert_eq!(
        admins[0]
            .target
            .as_ref()
            .and_then(Entity::as_user)
            .and_then(|user| user.url_id.as_deref()),
        Some("moose")
    );
    assert!(page.iter().any(|r| r.is_blocked()));
}

#[test]
fn test_event_stream_decodes_and_links() {
    let page: ApiList<Event> = serde_json::from_value(serde_json::json!({
        "totalResults": 1,
        "entries": [{
            "urlId": "e1",
            "objectTypes": [object_type::EVENT],
            "verbs": ["tag:api.typepad.com,2009:NewAsset"],
            "published": "2009-08-20T06:57:59Z",
            "actor": {
                "objectTypes": [object_type::USER],
                "urlId": "moose",
                "displayName": "Potatoshop",
            },
            "object": {
                "objectTypes": [object_type::PHOTO],
                "urlId": "6a0110",
                "title": "sturm",
                "imageLink": {"urlTemplate": "http://up.example.com/6a0110-{spec}"},
            },
        }],
    }))
    .unwrap();

    let event = page.iter().next().unwrap();
    let actor = event.actor.as_ref().and_then(Entity::as_user).unwrap();
    assert_eq!(actor.display_name.as_deref(), Some("Potatoshop"));

    let asset = event.object.as_ref().and_then(Entity::as_asset).unwrap();
    assert_eq!(asset.kind(), Some(AssetKind::Photo));
    assert_eq!(
        asset.comments_url().as_deref(),
        Some("/assets/6a0110/comments.json")
    );
    match asset {
        Asset::Photo(photo) => assert_eq!(
            photo.image_link.as_ref().unwrap().by_width(300).as_deref(),
            Some("http://up.example.com/6a0110-320wi")
        ),
        other => panic!("decoded as {:?}", other),
    }
}

#[test]
fn test_mixed_asset_page_dispatches_each_entry() {
    let page: ApiList<Asset> = serde_json::from_value(serde_json::json!({
        "totalResults": 3,
        "entries": [
            {"urlId": "p1", "objectTypes": [object_type::POST], "title": "sturm"},
            {"urlId": "v1", "objectTypes": [object_type::VIDEO], "videoLink": {"embedCode": "<embed>"}},
            {"urlId": "x1", "objectTypes": ["tag:api.typepad.com,2009:Blog"]},
        ],
    }))
    .unwrap();

    let kinds: Vec<Option<AssetKind>> = page.iter().map(Asset::kind).collect();
    assert_eq!(
        kinds,
        [Some(AssetKind::Post), Some(AssetKind::Video), None]
    );
}

#[test]
fn test_reclassification_follows_the_declaration() {
    let generic = Asset::Other(GenericAsset {
        url_id: Some("6a0110".to_string()),
        object_types: vec![object_type::PHOTO.to_string()],
        title: Some("sturm".to_string()),
        ..Default::default()
    });

    let upgraded = generic.reclassify().unwrap();
    assert_eq!(upgraded.kind(), Some(AssetKind::Photo));
    assert_eq!(upgraded.title(), Some("sturm"));

    // a matching declaration is a no-op
    let again = upgraded.clone().reclassify().unwrap();
    assert_eq!(again, upgraded);
}

#[test]
fn test_comment_replies_keep_their_reference() {
    let comment: Comment = serde_json::from_value(serde_json::json!({
        "urlId": "c1",
        "objectTypes": [object_type::COMMENT],
        "content": "wow",
        "inReplyTo": {
            "ref": "tag:api.typepad.com,2009:6a0110",
            "urlId": "6a0110",
            "objectTypes": [object_type::PHOTO],
            "title": "sturm",
        },
    }))
    .unwrap();

    let reply_to = comment.in_reply_to.as_ref().unwrap();
    assert_eq!(
        reply_to.make_self_link().as_deref(),
        Some("/assets/6a0110.json")
    );
    // the declared photo type stays data on the reference
    assert_eq!(reply_to.object_types, vec![object_type::PHOTO.to_string()]);
}

#[test]
fn test_favorite_urls_compose() {
    let user: User = serde_json::from_value(serde_json::json!({
        "urlId": "6p0120",
        "objectTypes": [object_type::USER],
    }))
    .unwrap();

    assert_eq!(
        user.favorites_url().as_deref(),
        Some("/users/6p0120/favorites.json")
    );
    assert_eq!(
        Favorite::url_for("6a0110", "6p0120").unwrap(),
        "/favorites/6a0110:6p0120.json"
    );
}

#[test]
fn test_user_avatar_renditions() {
    let user: User = serde_json::from_value(serde_json::json!({
        "urlId": "6p0120",
        "objectTypes": [object_type::USER],
        "displayName": "Potatoshop",
        "avatarLink": {
            "url": "http://up.example.com/avatar-pi",
            "urlTemplate": "http://up.example.com/avatar-{spec}",
            "width": 900,
            "height": 600,
        },
    }))
    .unwrap();

    let avatar = user.avatar_link.as_ref().unwrap();
    assert_eq!(
        avatar.square(50).as_deref(),
        Some("http://up.example.com/avatar-50si")
    );
    assert_eq!(
        avatar.inscribed(640).as_deref(),
        Some("http://up.example.com/avatar-640pi")
    );
}
