//! Profile preview page.

use maud::{Markup, html};

use super::components::{
    BSKY_APP_URL, OgImage, OpenGraphData, author_header, oembed_url, open_link, page_shell,
};
use crate::api::ProfileView;
use crate::describe::to_notation;

/// Render a profile preview page.
pub fn render(profile: &ProfileView, base_url: &str, site_name: &str) -> Markup {
    let name = profile.name();
    let title = format!("{name} (@{})", profile.handle);
    let canonical = format!("{BSKY_APP_URL}/profile/{}", profile.did);

    let images = if profile.avatar.is_empty() {
        Vec::new()
    } else {
        vec![OgImage {
            url: &profile.avatar,
            alt: name,
            width: 0,
            height: 0,
        }]
    };

    let params = [
        ("for", "profile".to_string()),
        ("followers", profile.followers_count.to_string()),
        ("follows", profile.follows_count.to_string()),
        ("posts", profile.posts_count.to_string()),
        ("labeler", profile.associated.labeler.to_string()),
    ];

    let og = OpenGraphData {
        title: &title,
        description: &profile.description,
        og_type: "profile",
        images,
        video: None,
        twitter_card_type: "summary",
        oembed_url: Some(oembed_url(base_url, &params)),
    };

    let body = html! {
        div class="card" {
            (author_header(name, &profile.handle, &profile.avatar))
            @if !profile.description.is_empty() {
                div class="content" { (profile.description) }
            }
            div class="stats" {
                span { (to_notation(profile.followers_count)) " followers" }
                span { (to_notation(profile.follows_count)) " following" }
                span { (to_notation(profile.posts_count)) " posts" }
                @if profile.associated.labeler {
                    span { "Labeler" }
                }
            }
        }
        (open_link(&canonical))
    };

    page_shell(&canonical, og, body, site_name)
}
