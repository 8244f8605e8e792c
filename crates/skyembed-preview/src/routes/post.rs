//! Post preview handlers.
//!
//! A post URL answers differently depending on the request host; see
//! [`crate::media`]. Every mode shares the same fetch and normalize steps.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use super::{clean_segment, html_response};
use crate::api::RawThread;
use crate::describe::compose;
use crate::error::PreviewError;
use crate::media::{self, PostPreview, ViewMode};
use crate::normalize::{CanonicalEmbed, normalize};
use crate::render;
use crate::state::AppState;

/// `GET /profile/{actor}/post/{rkey}`
pub async fn post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((actor, rkey)): Path<(String, String)>,
) -> Result<Response, PreviewError> {
    serve_post(&state, ViewMode::from_headers(&headers), &actor, &rkey, None).await
}

/// `GET /profile/{actor}/post/{rkey}/photo/{index}`
pub async fn photo_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((actor, rkey, index)): Path<(String, String, String)>,
) -> Result<Response, PreviewError> {
    let mode = ViewMode::from_headers(&headers);
    serve_post(&state, mode, &actor, &rkey, Some(&index)).await
}

async fn serve_post(
    state: &AppState,
    mode: ViewMode,
    actor: &str,
    rkey: &str,
    photo: Option<&str>,
) -> Result<Response, PreviewError> {
    let rkey = clean_segment(rkey);
    let author = state.identity.resolve(&clean_segment(actor)).await;

    let RawThread {
        document,
        mut thread,
    } = state
        .appview
        .get_post_thread(&author.canonical_id, &rkey)
        .await?;

    if let Some(handle) = author.handle {
        thread.post.author.handle = handle;
    }

    let mut embed = normalize(&thread);
    let media_message = photo.and_then(|index| embed.narrow_to_photo(index));

    let (pds, video_url) = match &embed {
        CanonicalEmbed::Video(video) => {
            let pds = if video.owner_id == author.canonical_id {
                author.service_endpoint
            } else {
                state.identity.resolve_service_endpoint(&video.owner_id).await
            };
            let url = video.blob_url(&pds);
            (pds, Some(url))
        }
        _ => (author.service_endpoint, None),
    };

    let description = compose(&embed, &thread);
    let post = thread.post;

    tracing::debug!(
        uri = %post.uri,
        mode = ?mode,
        kind = ?embed.kind(),
        "serving post"
    );

    let preview = PostPreview {
        uri: post.uri,
        post_id: rkey,
        author: post.author,
        text: post.record.text,
        created_at: post.record.created_at,
        description,
        embed,
        media_message,
        pds,
        video_url,
        reply_count: post.reply_count,
        repost_count: post.repost_count,
        like_count: post.like_count,
        quote_count: post.quote_count,
    };

    if let Some(response) = media::route(mode, &preview, &document, &state.compositor).await? {
        return Ok(response.into_response());
    }

    let markup = render::post::render(&preview, &state.config.base_url, &state.config.site_name);
    Ok(html_response(markup))
}
