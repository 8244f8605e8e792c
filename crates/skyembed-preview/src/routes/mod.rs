//! Route definitions for the preview service.
//!
//! ## Routes
//!
//! - `GET /` - Redirect to the project page
//! - `GET /health` - Health check (JSON)
//! - `GET /oembed` - oEmbed document for a preview page
//! - `GET /profile/{actor}` - Profile preview
//! - `GET /profile/{actor}/post/{rkey}` - Post preview (mode from host)
//! - `GET /profile/{actor}/post/{rkey}/photo/{index}` - Post narrowed to one photo
//! - `GET /profile/{actor}/feed/{rkey}` - Feed generator preview
//! - `GET /profile/{actor}/lists/{rkey}` - List preview
//! - `GET /starter-pack/{actor}/{rkey}` - Starter pack preview

mod collection;
mod health;
mod home;
pub mod oembed;
mod post;
mod profile;

use axum::Router;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use maud::Markup;

use crate::api::Author;
use crate::error::PreviewError;
use crate::render;
use crate::state::AppState;

/// Build the complete preview service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health::health_check))
        .route("/oembed", get(oembed::oembed_handler))
        .route("/profile/{actor}", get(profile::profile_handler))
        .route("/profile/{actor}/post/{rkey}", get(post::post_handler))
        .route(
            "/profile/{actor}/post/{rkey}/photo/{index}",
            get(post::photo_handler),
        )
        .route("/profile/{actor}/feed/{rkey}", get(collection::feed_handler))
        .route("/profile/{actor}/lists/{rkey}", get(collection::list_handler))
        .route(
            "/starter-pack/{actor}/{rkey}",
            get(collection::starter_pack_handler),
        )
        .fallback(route_not_found)
        .with_state(state)
}

async fn route_not_found() -> PreviewError {
    PreviewError::RouteNotFound
}

/// Path segments pasted into chat often pick up a trailing `|`; this hits
/// record keys and, on profile links, the actor.
fn clean_segment(segment: &str) -> String {
    segment.trim().replace('|', "")
}

/// Replace `author.handle` with the primary handle from its DID document.
async fn apply_primary_handle(state: &AppState, author: &mut Author) {
    let Some(document) = state.identity.fetch_did_document(&author.did).await else {
        return;
    };
    if let Some(handle) = document.handle() {
        author.handle = handle.to_string();
    }
}

/// Build an HTML response with security headers.
fn html_response(markup: Markup) -> Response {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(render::components::CSP_HEADER),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    (StatusCode::OK, headers, markup.into_string()).into_response()
}
