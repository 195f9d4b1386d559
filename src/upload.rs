//! Browser-style asset upload.
//!
//! File payloads do not travel through the batch processor. They go to the
//! dedicated `POST /browser-upload.json` endpoint as `multipart/form-data`,
//! and the outcome comes back the way a browser would see it: a `302` whose
//! `Location` query string reports `status` and, on success, `asset_url`.
//! The client never follows redirects (see [`TypePadClient::with_config`]),
//! so that signal reaches us intact.

use crate::client::TypePadClient;
use crate::error::{Result, TypePadError};
use crate::objects::Asset;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, LOCATION};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tracing::debug;

/// One file upload with its asset metadata.
///
/// The service answers by redirecting to the caller-supplied `redirect_to`
/// page, carrying the outcome in that URL's query string; supply it with
/// [`with_field`] like any other extra form field.
///
/// [`with_field`]: BrowserUpload::with_field
pub struct BrowserUpload {
    asset: Asset,
    filename: String,
    content_type: String,
    content: Bytes,
    extras: Vec<(String, String)>,
}

impl BrowserUpload {
    /// Describe an upload of `content`, published as `asset`.
    pub fn new(asset: Asset, filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        BrowserUpload {
            asset,
            filename: filename.into(),
            content_type: "application/octet-stream".to_string(),
            content: content.into(),
            extras: Vec::new(),
        }
    }

    /// Set the media type of the file part.
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Add an extra form field, e.g. `redirect_to`.
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.extras.push((name.to_string(), value.to_string()));
        self
    }

    /// Post the upload and interpret the redirect it answers with.
    ///
    /// The target URL is signed when credentials cover it. A direct error
    /// status, or an error `status` reported in the redirect query, maps
    /// through the usual per-request error taxonomy.
    pub async fn send(self, client: &TypePadClient) -> Result<UploadReceipt> {
        let target = client.resolve("/browser-upload.json")?;
        let target = match client.sign_url_for("POST", &target) {
            Ok(signed) => signed,
            Err(TypePadError::NoAuthorization(_)) => target,
            Err(error) => return Err(error),
        };
        debug!(%target, filename = %self.filename, "browser upload");

        let mut part_headers = HeaderMap::new();
        part_headers.insert(
            "content-transfer-encoding",
            HeaderValue::from_static("identity"),
        );
        let file = Part::bytes(self.content.to_vec())
            .file_name(self.filename)
            .mime_str(&self.content_type)
            .map_err(|_| {
                TypePadError::Usage(format!("invalid content type {:?}", self.content_type))
            })?
            .headers(part_headers);

        let mut form = Form::new()
            .text("asset", serde_json::to_string(&self.asset.to_value()?)?)
            .part("file", file);
        for (name, value) in self.extras {
            form = form.text(name, value);
        }

        let response = client.http().post(target).multipart(form).send().await?;
        let status = response.status();
        if status == StatusCode::FOUND {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| {
                    TypePadError::BadResponse("upload redirect carries no location".to_string())
                })?;
            return receipt_from_location(location);
        }
        if let Some(error) =
            TypePadError::from_status(status.as_u16(), status.canonical_reason().unwrap_or_default())
        {
            return Err(error);
        }
        Err(TypePadError::BadResponse(format!(
            "browser upload answered {}, expected a 302 redirect",
            status
        )))
    }
}

/// Outcome of a successful upload, as reported in the redirect query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Resource URL of the newly created asset, when the service names one.
    pub asset_url: Option<String>,
}

/// Decode the `Location` a browser upload redirects to.
///
/// Works on relative locations too, so only the query string is consulted.
fn receipt_from_location(location: &str) -> Result<UploadReceipt> {
    let query = location.split_once('?').map(|(_, q)| q).unwrap_or_default();
    let mut status = None;
    let mut asset_url = None;
    let mut message = None;
    for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match name.as_ref() {
            "status" => status = value.parse::<u16>().ok(),
            "asset_url" => asset_url = Some(value.into_owned()),
            "error" => message = Some(value.into_owned()),
            _ => {}
        }
    }
    let status = status.ok_or_else(|| {
        TypePadError::BadResponse(format!("upload redirect {:?} carries no status", location))
    })?;
    match status {
        201 => Ok(UploadReceipt { asset_url }),
        _ => {
            let reason = message.unwrap_or_else(|| "browser upload failed".to_string());
            Err(TypePadError::from_status(status, &reason).unwrap_or_else(|| {
                TypePadError::BadResponse(format!("upload redirect reports status {}", status))
            }))
        }
    }
}
