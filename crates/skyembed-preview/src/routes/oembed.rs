//! oEmbed responder.
//!
//! Preview pages link here with their counters in the query string. Discord
//! and friends show `author_name` above the embed and `provider_name` as the
//! small header line, which is where the stats end up.

use std::collections::HashMap;
use std::str::FromStr;

use axum::Json;
use axum::extract::{Query, State};
use serde::Serialize;

use crate::describe::{stats_line, to_notation};
use crate::error::PreviewError;
use crate::state::AppState;

/// Byte cap on `author_name`.
const MAX_AUTHOR_LEN: usize = 256;

const ELLIPSIS: &str = "...";

/// oEmbed `link` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OEmbed {
    pub version: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub provider_name: String,
    pub provider_url: String,
    pub author_name: String,
}

/// `GET /oembed?for=profile|post|feed&...`
pub async fn oembed_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<OEmbed>, PreviewError> {
    build(&params, &state.config.site_name, &state.config.base_url).map(Json)
}

/// Build the oEmbed document for a query.
pub fn build(
    params: &HashMap<String, String>,
    site_name: &str,
    base_url: &str,
) -> Result<OEmbed, PreviewError> {
    let mut provider_name = site_name.to_string();

    let author_name = match params.get("for").map(String::as_str) {
        Some("profile") => {
            let followers: u64 = parse(params, "followers")?;
            let follows: u64 = parse(params, "follows")?;
            let posts: u64 = parse(params, "posts")?;
            let labeler: bool = parse(params, "labeler")?;

            let mut name = format!(
                "👥 {} Followers - 🌐 {} Following - ✍️ {} Posts",
                to_notation(followers),
                to_notation(follows),
                to_notation(posts)
            );
            if labeler {
                name.push_str(" - 🏷️ Labeler");
            }
            name
        }
        Some("post") => {
            let stats = stats_line(
                parse(params, "replies")?,
                parse(params, "reposts")?,
                parse(params, "likes")?,
                parse(params, "quotes")?,
            );

            if let Some(message) = params.get("mediaMsg").filter(|m| !m.is_empty()) {
                provider_name = format!("{provider_name} | {message}");
            }

            match params.get("description").filter(|d| !d.is_empty()) {
                Some(description) => with_description(stats, description),
                None => stats,
            }
        }
        Some("feed") => {
            let likes: u64 = parse(params, "likes")?;
            let online: bool = parse(params, "online")?;
            let valid: bool = parse(params, "valid")?;

            format!(
                "❤️ {} Likes - {} - {}",
                to_notation(likes),
                if online { "✅ Online" } else { "❌ Not online" },
                if valid { "✅ Valid" } else { "❌ Not valid" }
            )
        }
        _ => return Err(PreviewError::BadRequest("genOembed: Invalid option".to_string())),
    };

    Ok(OEmbed {
        version: "1.0",
        kind: "link",
        provider_name,
        provider_url: base_url.to_string(),
        author_name,
    })
}

fn parse<T: FromStr>(params: &HashMap<String, String>, key: &str) -> Result<T, PreviewError> {
    params
        .get(key)
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| PreviewError::BadRequest(format!("genOembed: invalid {key}")))
}

/// Append `description` after a blank line, cut so the result fits in
/// [`MAX_AUTHOR_LEN`] bytes.
fn with_description(stats: String, description: &str) -> String {
    let prefix = format!("{stats}\n\n");
    let room = MAX_AUTHOR_LEN.saturating_sub(prefix.len());

    if description.len() <= room {
        return prefix + description;
    }

    if room >= ELLIPSIS.len() {
        let cut = floor_char_boundary(description, room - ELLIPSIS.len());
        format!("{prefix}{}{ELLIPSIS}", &description[..cut])
    } else {
        let cut = floor_char_boundary(description, room);
        format!("{prefix}{}", &description[..cut])
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
