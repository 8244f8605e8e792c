//! Post preview page.

use maud::{Markup, html};

use super::components::{
    BSKY_APP_URL, OgImage, OgVideo, OpenGraphData, author_header, is_safe_url, oembed_url,
    open_link, page_shell,
};
use crate::describe::{attribution, stats_line};
use crate::media::PostPreview;
use crate::normalize::CanonicalEmbed;

const LARGE_CARD: &str = "summary_large_image";
const SMALL_CARD: &str = "summary";

/// Render a post preview page.
pub fn render(preview: &PostPreview, base_url: &str, site_name: &str) -> Markup {
    let title = attribution(&preview.author);
    let canonical = format!(
        "{BSKY_APP_URL}/profile/{}/post/{}",
        preview.author.did, preview.post_id
    );

    let (images, video, card) = og_media(preview);

    let og = OpenGraphData {
        title: &title,
        description: &preview.description,
        og_type: if video.is_some() { "video.other" } else { "article" },
        images,
        video,
        twitter_card_type: card,
        oembed_url: Some(oembed_url(base_url, &oembed_params(preview))),
    };

    let body = html! {
        div class="card" {
            (author_header(preview.author.name(), &preview.author.handle, &preview.author.avatar))

            @if !preview.text.is_empty() {
                div class="content" { (preview.text) }
            }

            (embed_body(preview))

            @if let Some(message) = &preview.media_message {
                div class="media-note" { (message) }
            }

            div class="stats" {
                (stats_line(preview.reply_count, preview.repost_count, preview.like_count, preview.quote_count))
            }
            @if let Some(created_at) = preview.created_at {
                time class="media-note" datetime=(created_at.to_rfc3339()) {
                    (created_at.format("%b %d, %Y %H:%M UTC").to_string())
                }
            }
        }
        (open_link(&canonical))
    };

    page_shell(&canonical, og, body, site_name)
}

fn og_media(preview: &PostPreview) -> (Vec<OgImage<'_>>, Option<OgVideo<'_>>, &'static str) {
    match &preview.embed {
        CanonicalEmbed::Images(list) if !list.is_empty() => (
            list.iter()
                .map(|i| OgImage {
                    url: &i.url,
                    alt: &i.alt,
                    width: i.width,
                    height: i.height,
                })
                .collect(),
            None,
            LARGE_CARD,
        ),
        CanonicalEmbed::External(ext) if ext.is_gif => (vec![plain_image(&ext.uri)], None, LARGE_CARD),
        CanonicalEmbed::External(ext) if !ext.thumbnail.is_empty() => {
            (vec![plain_image(&ext.thumbnail)], None, LARGE_CARD)
        }
        CanonicalEmbed::Video(v) => {
            let thumbnail = if v.thumbnail.is_empty() {
                Vec::new()
            } else {
                vec![OgImage {
                    url: &v.thumbnail,
                    alt: "",
                    width: v.aspect_ratio.width,
                    height: v.aspect_ratio.height,
                }]
            };
            let video = preview.video_url.as_deref().map(|url| OgVideo {
                url,
                width: v.aspect_ratio.width,
                height: v.aspect_ratio.height,
            });
            (thumbnail, video, LARGE_CARD)
        }
        CanonicalEmbed::StarterPack(common) if !common.avatar_url.is_empty() => {
            (vec![plain_image(&common.avatar_url)], None, LARGE_CARD)
        }
        CanonicalEmbed::List(common) | CanonicalEmbed::Feed(common)
            if !common.avatar_url.is_empty() =>
        {
            (vec![plain_image(&common.avatar_url)], None, SMALL_CARD)
        }
        _ if !preview.author.avatar.is_empty() => {
            (vec![plain_image(&preview.author.avatar)], None, SMALL_CARD)
        }
        _ => (Vec::new(), None, SMALL_CARD),
    }
}

fn plain_image(url: &str) -> OgImage<'_> {
    OgImage {
        url,
        alt: "",
        width: 0,
        height: 0,
    }
}

fn oembed_params(preview: &PostPreview) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("for", "post".to_string()),
        ("replies", preview.reply_count.to_string()),
        ("reposts", preview.repost_count.to_string()),
        ("likes", preview.like_count.to_string()),
        ("quotes", preview.quote_count.to_string()),
    ];
    if !preview.description.is_empty() {
        params.push(("description", preview.description.clone()));
    }
    if let Some(message) = &preview.media_message {
        params.push(("mediaMsg", message.clone()));
    }
    params
}

fn embed_body(preview: &PostPreview) -> Markup {
    html! {
        @match &preview.embed {
            CanonicalEmbed::Images(list) => {
                div class="media" {
                    @for image in list.iter().filter(|i| is_safe_url(&i.url)) {
                        img src=(image.url) alt=(image.alt) loading="lazy";
                    }
                }
            }
            CanonicalEmbed::External(ext) if ext.is_gif => {
                div class="media" {
                    @if is_safe_url(&ext.uri) {
                        img src=(ext.uri) alt=(ext.title);
                    }
                }
            }
            CanonicalEmbed::External(ext) => {
                @if is_safe_url(&ext.uri) {
                    a class="link-card" href=(ext.uri) {
                        div class="link-card-title" { (ext.title) }
                        div class="link-card-desc" { (ext.description) }
                    }
                }
            }
            CanonicalEmbed::Video(v) => {
                @if let Some(url) = preview.video_url.as_deref().filter(|u| is_safe_url(u)) {
                    div class="media" {
                        @if is_safe_url(&v.thumbnail) {
                            video controls preload="none" src=(url) poster=(v.thumbnail) {}
                        } @else {
                            video controls preload="none" src=(url) {}
                        }
                    }
                }
            }
            CanonicalEmbed::List(common) | CanonicalEmbed::Feed(common) | CanonicalEmbed::StarterPack(common) => {
                div class="link-card" {
                    div class="link-card-title" { (common.name) }
                    div class="link-card-desc" { (common.description) }
                }
            }
            CanonicalEmbed::Unknown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Author;
    use crate::embed::AspectRatio;
    use crate::normalize::{ExternalEmbed, Image, VideoEmbed};

    fn preview(embed: CanonicalEmbed) -> PostPreview {
        PostPreview {
            uri: "at://did:plc:a/app.bsky.feed.post/3k".into(),
            post_id: "3k".into(),
            author: Author {
                did: "did:plc:a".into(),
                handle: "alice.test".into(),
                display_name: "Alice".into(),
                avatar: "https://cdn.test/avatar.jpg".into(),
            },
            text: "hello".into(),
            created_at: None,
            description: "hello".into(),
            embed,
            media_message: None,
            pds: "https://pds.test".into(),
            video_url: None,
            reply_count: 1,
            repost_count: 2,
            like_count: 1500,
            quote_count: 0,
        }
    }

    #[test]
    fn images_page() {
        let mut p = preview(CanonicalEmbed::Images(vec![
            Image { url: "https://cdn.test/1.jpg".into(), alt: "first".into(), width: 4, height: 3 },
            Image { url: "https://cdn.test/2.jpg".into(), alt: String::new(), width: 4, height: 3 },
        ]));
        p.media_message = Some("Photo 1 of 2".into());
        let html = render(&p, "https://xbsky.test", "xbsky.test").into_string();

        assert!(html.contains(r#"<title>Alice (@alice.test)</title>"#));
        assert_eq!(html.matches(r#"property="og:image""#).count(), 2);
        assert!(html.contains(r#"content="summary_large_image""#));
        assert!(html.contains("mediaMsg=Photo+1+of+2"));
        assert!(html.contains("https://bsky.app/profile/did:plc:a/post/3k"));
    }

    #[test]
    fn video_page() {
        let mut p = preview(CanonicalEmbed::Video(VideoEmbed {
            content_id: "bafy".into(),
            owner_id: "did:plc:a".into(),
            aspect_ratio: AspectRatio { width: 1280, height: 720 },
            thumbnail: "https://video.test/thumb.jpg".into(),
        }));
        p.video_url = Some("https://pds.test/xrpc/com.atproto.sync.getBlob?cid=bafy&did=did:plc:a".into());
        let html = render(&p, "https://xbsky.test", "xbsky.test").into_string();

        assert!(html.contains(r#"property="og:video""#));
        assert!(html.contains(r#"<meta property="og:video:height" content="720">"#));
        assert!(html.contains(r#"<meta property="og:type" content="video.other">"#));
        assert!(html.contains("<video"));
    }

    #[test]
    fn gif_uses_gif_as_image() {
        let p = preview(CanonicalEmbed::External(ExternalEmbed {
            uri: "https://media.tenor.com/a/b.gif".into(),
            title: "b".into(),
            description: String::new(),
            thumbnail: "https://cdn.test/t.jpg".into(),
            is_gif: true,
        }));
        let html = render(&p, "https://xbsky.test", "xbsky.test").into_string();
        assert!(html.contains(r#"<meta property="og:image" content="https://media.tenor.com/a/b.gif">"#));
    }

    #[test]
    fn unknown_falls_back_to_author_avatar() {
        let html = render(&preview(CanonicalEmbed::Unknown), "https://xbsky.test", "s").into_string();
        assert!(html.contains(r#"<meta property="og:image" content="https://cdn.test/avatar.jpg">"#));
        assert!(html.contains(r#"<meta name="twitter:card" content="summary">"#));
    }

    #[test]
    fn oembed_carries_counters() {
        let params = oembed_params(&preview(CanonicalEmbed::Unknown));
        assert!(params.contains(&("likes", "1500".to_string())));
        assert!(params.contains(&("description", "hello".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "mediaMsg"));
    }
}
