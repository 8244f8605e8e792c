//! Feed, list and starter-pack handlers.

use axum::extract::{Path, State};
use axum::response::Response;

use super::{apply_primary_handle, clean_segment, html_response};
use crate::error::PreviewError;
use crate::normalize::{from_feed, from_list, from_starter_pack};
use crate::render::collection::{Collection, render};
use crate::render::components::BSKY_APP_URL;
use crate::state::AppState;

/// `GET /profile/{actor}/feed/{rkey}`
pub async fn feed_handler(
    State(state): State<AppState>,
    Path((actor, rkey)): Path<(String, String)>,
) -> Result<Response, PreviewError> {
    let rkey = clean_segment(&rkey);
    let did = state.identity.resolve_did(&clean_segment(&actor)).await;
    let generator = state.appview.get_feed_generator(&did, &rkey).await?;

    let mut view = generator.view;
    apply_primary_handle(&state, &mut view.creator).await;

    let collection = Collection::Feed {
        likes: view.like_count,
        online: generator.is_online,
        valid: generator.is_valid,
    };
    let canonical = format!("{BSKY_APP_URL}/profile/{did}/feed/{rkey}");

    Ok(html_response(render(
        collection,
        &from_feed(&view),
        &canonical,
        &state.config.base_url,
        &state.config.site_name,
    )))
}

/// `GET /profile/{actor}/lists/{rkey}`
pub async fn list_handler(
    State(state): State<AppState>,
    Path((actor, rkey)): Path<(String, String)>,
) -> Result<Response, PreviewError> {
    let rkey = clean_segment(&rkey);
    let did = state.identity.resolve_did(&clean_segment(&actor)).await;
    let mut list = state.appview.get_list(&did, &rkey).await?;

    apply_primary_handle(&state, &mut list.creator).await;

    let canonical = format!("{BSKY_APP_URL}/profile/{did}/lists/{rkey}");

    Ok(html_response(render(
        Collection::List,
        &from_list(&list),
        &canonical,
        &state.config.base_url,
        &state.config.site_name,
    )))
}

/// `GET /starter-pack/{actor}/{rkey}`
pub async fn starter_pack_handler(
    State(state): State<AppState>,
    Path((actor, rkey)): Path<(String, String)>,
) -> Result<Response, PreviewError> {
    let rkey = clean_segment(&rkey);
    let did = state.identity.resolve_did(&clean_segment(&actor)).await;
    let mut pack = state.appview.get_starter_pack(&did, &rkey).await?;

    apply_primary_handle(&state, &mut pack.creator).await;

    let canonical = format!("{BSKY_APP_URL}/starter-pack/{did}/{rkey}");

    Ok(html_response(render(
        Collection::StarterPack,
        &from_starter_pack(&pack),
        &canonical,
        &state.config.base_url,
        &state.config.site_name,
    )))
}
