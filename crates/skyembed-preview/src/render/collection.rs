//! Feed, list and starter-pack preview pages.
//!
//! All three share one layout: a name, a "by creator" line and an avatar or
//! card image.

use maud::{Markup, html};

use super::components::{OgImage, OpenGraphData, is_safe_url, oembed_url, open_link, page_shell};
use crate::describe::{creator_attribution, list_label};
use crate::normalize::CommonEmbed;

/// Which kind of collection is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Feed { likes: u64, online: bool, valid: bool },
    List,
    StarterPack,
}

impl Collection {
    fn label(&self, purpose: &str) -> &'static str {
        match self {
            Self::Feed { .. } => "📡 A feed",
            Self::List => list_label(purpose),
            Self::StarterPack => "📦 A starter pack",
        }
    }
}

/// Render a collection page.
pub fn render(
    collection: Collection,
    common: &CommonEmbed,
    canonical_url: &str,
    base_url: &str,
    site_name: &str,
) -> Markup {
    let byline = format!(
        "{} by {}",
        collection.label(&common.purpose),
        creator_attribution(common)
    );
    let description = if common.description.is_empty() {
        byline.clone()
    } else {
        format!("{byline}\n\n{}", common.description)
    };

    let images = if common.avatar_url.is_empty() {
        Vec::new()
    } else {
        vec![OgImage {
            url: &common.avatar_url,
            alt: &common.name,
            width: 0,
            height: 0,
        }]
    };

    let oembed = match collection {
        Collection::Feed {
            likes,
            online,
            valid,
        } => Some(oembed_url(
            base_url,
            &[
                ("for", "feed".to_string()),
                ("likes", likes.to_string()),
                ("online", online.to_string()),
                ("valid", valid.to_string()),
            ],
        )),
        _ => None,
    };

    let og = OpenGraphData {
        title: &common.name,
        description: &description,
        og_type: "website",
        images,
        video: None,
        twitter_card_type: if collection == Collection::StarterPack {
            "summary_large_image"
        } else {
            "summary"
        },
        oembed_url: oembed,
    };

    let body = html! {
        div class="card" {
            div class="author" {
                @if is_safe_url(&common.avatar_url) {
                    img class="avatar large" src=(common.avatar_url) alt=(common.name);
                }
                div {
                    div class="author-name" { (common.name) }
                    div class="author-handle" { (byline) }
                }
            }
            @if !common.description.is_empty() {
                div class="content" { (common.description) }
            }
        }
        (open_link(canonical_url))
    };

    page_shell(canonical_url, og, body, site_name)
}
