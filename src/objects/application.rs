//! Applications and their API credentials.

use crate::error::Result;
use crate::objects::{api_object, object_type};
use crate::types::LinkSet;
use crate::urls;
use serde::{Deserialize, Serialize};

/// A client application registered with the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Application {
    /// Full tag URI identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Where browsers POST file uploads, see the crate's upload support.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_upload_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_request_token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_access_token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_identification_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_sync_script_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signout_url: Option<String>,
    #[serde(skip_serializing_if = "LinkSet::is_empty")]
    pub links: LinkSet,
}

api_object!(
    Application,
    uri: Some(object_type::APPLICATION),
    self_link: "/applications/{}.json"
);

impl Application {
    /// Resource URL for an application by url id.
    pub fn url_for(url_id: &str) -> Result<String> {
        Ok(format!(
            "/applications/{}.json",
            urls::validate_url_id(url_id)?
        ))
    }
}

/// An API key record, looked up by the consumer key itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Application>,
}

impl ApiKey {
    /// Resource URL for an API key.
    pub fn url_for(api_key: &str) -> Result<String> {
        Ok(format!("/api-keys/{}.json", urls::validate_url_id(api_key)?))
    }
}

/// An OAuth token granted to an application.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthToken {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_types: Vec<String>,
    /// The record this token grants access to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_object: Option<super::Entity>,
}

impl AuthToken {
    /// Resource URL for a token under the consumer key that granted it.
    pub fn url_for(api_key: &str, auth_token: &str) -> Result<String> {
        Ok(format!(
            "/auth-tokens/{}:{}.json",
            urls::validate_url_id(api_key)?,
            urls::validate_url_id(auth_token)?
        ))
    }
}
