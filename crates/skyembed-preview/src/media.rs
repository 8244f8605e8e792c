//! Response selection for post requests.
//!
//! The same post URL is served on several hosts. `raw.` redirects straight
//! to the media, `mosaic.` returns the composited image, `api.` dumps the
//! fetched and normalized data as JSON, and every other host gets the HTML
//! preview page.

use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::api::Author;
use crate::error::PreviewError;
use crate::mosaic::{Compositor, Mosaic};
use crate::normalize::CanonicalEmbed;

const OP: &str = "getPost";

/// How a post request should be answered, chosen by host prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Render,
    Raw,
    Mosaic,
    Api,
}

impl ViewMode {
    pub fn from_host(host: &str) -> Self {
        let host = host.trim().to_ascii_lowercase();
        if host.starts_with("raw.") {
            Self::Raw
        } else if host.starts_with("mosaic.") {
            Self::Mosaic
        } else if host.starts_with("api.") {
            Self::Api
        } else {
            Self::Render
        }
    }

    /// Mode for a request, from its `Host` header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(Self::from_host)
            .unwrap_or(Self::Render)
    }
}

/// Everything known about a post once it has been fetched and normalized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPreview {
    pub uri: String,
    pub post_id: String,
    pub author: Author,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub description: String,
    pub embed: CanonicalEmbed,
    pub media_message: Option<String>,
    /// PDS of the video owner, else of the post author; the default PDS
    /// when neither document names one.
    pub pds: String,
    pub video_url: Option<String>,
    pub reply_count: u64,
    pub repost_count: u64,
    pub like_count: u64,
    pub quote_count: u64,
}

/// A non-HTML answer to a post request.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaResponse {
    Redirect(String),
    Jpeg(Vec<u8>),
    Json(Value),
}

impl IntoResponse for MediaResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(location) => match HeaderValue::from_str(&location) {
                Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
                Err(_) => PreviewError::NoSuitableMedia(OP).into_response(),
            },
            Self::Jpeg(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"))],
                bytes,
            )
                .into_response(),
            Self::Json(value) => match serde_json::to_string_pretty(&value) {
                Ok(body) => (
                    StatusCode::OK,
                    [(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json; charset=utf-8"),
                    )],
                    body,
                )
                    .into_response(),
                Err(err) => PreviewError::Internal(err.into()).into_response(),
            },
        }
    }
}

/// Pick the response for `mode`. `Ok(None)` means "render the HTML page".
pub async fn route(
    mode: ViewMode,
    preview: &PostPreview,
    document: &Value,
    compositor: &Compositor,
) -> Result<Option<MediaResponse>, PreviewError> {
    let response = match mode {
        ViewMode::Render => return Ok(None),
        ViewMode::Mosaic => match &preview.embed {
            CanonicalEmbed::Images(images) => mosaic(compositor, images).await?,
            _ => return Err(PreviewError::InvalidType(OP)),
        },
        ViewMode::Raw => raw(preview, compositor).await?,
        ViewMode::Api => api_dump(preview, document)?,
    };
    Ok(Some(response))
}

async fn raw(preview: &PostPreview, compositor: &Compositor) -> Result<MediaResponse, PreviewError> {
    match &preview.embed {
        CanonicalEmbed::Images(images) => mosaic(compositor, images).await,
        CanonicalEmbed::External(ext) if ext.is_gif => Ok(MediaResponse::Redirect(ext.uri.clone())),
        CanonicalEmbed::External(ext) if !ext.thumbnail.is_empty() => {
            Ok(MediaResponse::Redirect(ext.thumbnail.clone()))
        }
        CanonicalEmbed::External(_) => Err(PreviewError::NoSuitableMedia(OP)),
        CanonicalEmbed::Video(video) => Ok(MediaResponse::Redirect(video.blob_url(&preview.pds))),
        CanonicalEmbed::List(common)
        | CanonicalEmbed::Feed(common)
        | CanonicalEmbed::StarterPack(common) => {
            if common.avatar_url.is_empty() {
                Err(PreviewError::NoSuitableMedia(OP))
            } else {
                Ok(MediaResponse::Redirect(common.avatar_url.clone()))
            }
        }
        CanonicalEmbed::Unknown => Err(PreviewError::InvalidType(OP)),
    }
}

async fn mosaic(
    compositor: &Compositor,
    images: &[crate::normalize::Image],
) -> Result<MediaResponse, PreviewError> {
    match compositor.composite(images).await? {
        Mosaic::Redirect(url) => Ok(MediaResponse::Redirect(url)),
        Mosaic::Jpeg(bytes) => Ok(MediaResponse::Jpeg(bytes)),
    }
}

fn api_dump(preview: &PostPreview, document: &Value) -> Result<MediaResponse, PreviewError> {
    let parsed = serde_json::to_value(preview).map_err(|e| PreviewError::Internal(e.into()))?;
    let mut body = serde_json::Map::new();
    body.insert("originalData".to_string(), document.clone());
    body.insert("parsedData".to_string(), parsed);
    Ok(MediaResponse::Json(Value::Object(body)))
}
