//! Profile preview handler.

use axum::extract::{Path, State};
use axum::response::Response;

use super::{clean_segment, html_response};
use crate::error::PreviewError;
use crate::render;
use crate::state::AppState;

/// `GET /profile/{actor}`
pub async fn profile_handler(
    State(state): State<AppState>,
    Path(actor): Path<String>,
) -> Result<Response, PreviewError> {
    let did = state.identity.resolve_did(&clean_segment(&actor)).await;
    let mut profile = state.appview.get_profile(&did).await?;

    if let Some(document) = state.identity.fetch_did_document(&profile.did).await
        && let Some(handle) = document.handle()
    {
        profile.handle = handle.to_string();
    }

    let markup = render::profile::render(&profile, &state.config.base_url, &state.config.site_name);
    Ok(html_response(markup))
}
