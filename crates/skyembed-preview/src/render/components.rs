//! Shared HTML pieces for every preview page.
//!
//! These are maud functions returning `Markup` fragments. The page shell
//! carries all the Open Graph / Twitter-card metadata; the visible body is a
//! small card for people who open the link in a browser.

use maud::{Markup, PreEscaped, html};

/// Public web client that previews link back to.
pub const BSKY_APP_URL: &str = "https://bsky.app";

/// Accent color advertised through `theme-color` (embed sidebar color).
pub const THEME_COLOR: &str = "#0085ff";

/// Inline CSS for preview pages.
pub const PAGE_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#f5f7fa;--fg:#0b0f14;--fg2:#42576c;--fg3:#8a9aab;--accent:#0085ff;--border:rgba(0,133,255,.18)}
body{font-family:Inter,-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.55;color:var(--fg);background:var(--bg);min-height:100vh;display:flex;flex-direction:column;align-items:center;padding:1.5rem 1rem}
main{max-width:600px;width:100%;flex:1}
a{color:var(--accent);text-decoration:none}
a:hover{text-decoration:underline}
img,video{max-width:100%;height:auto}

.card{padding:1.25rem;border:1px solid var(--border);border-radius:12px;background:#fff}
.author{display:flex;align-items:center;gap:.75rem;margin-bottom:1rem}
.avatar{width:48px;height:48px;border-radius:50%;object-fit:cover;background:var(--accent);flex-shrink:0}
.avatar.large{width:88px;height:88px}
.author-name{font-weight:600;color:var(--fg)}
.author-handle{color:var(--fg3);font-size:.9rem}
.content{white-space:pre-wrap;word-break:break-word;font-size:1.02rem}
.media{display:grid;gap:4px;margin:.75rem 0;border-radius:8px;overflow:hidden}
.media img{width:100%;display:block;object-fit:cover}
.media-note{font-size:.85rem;color:var(--fg3);margin-top:.25rem}
.link-card{display:block;border:1px solid var(--border);border-radius:8px;padding:.75rem 1rem;margin:.75rem 0;color:var(--fg)}
.link-card:hover{border-color:var(--accent);text-decoration:none}
.link-card-title{font-weight:600}
.link-card-desc{color:var(--fg2);font-size:.9rem}
.stats{display:flex;gap:1.25rem;flex-wrap:wrap;margin-top:1rem;padding-top:.75rem;border-top:1px solid var(--border);color:var(--fg3);font-size:.9rem}
.actions{margin-top:1rem;text-align:center}
.open-link{display:inline-block;padding:.5rem 1rem;background:var(--accent);color:#fff;border-radius:6px;font-weight:500}
.open-link:hover{text-decoration:none;opacity:.9}
.footer{margin-top:1rem;font-size:.8rem;color:var(--fg3)}

@media(prefers-color-scheme:dark){
:root{--bg:#0b0f14;--fg:#f1f3f5;--fg2:#aebbc9;--fg3:#6f8397;--border:rgba(0,133,255,.3)}
.card{background:#161e27}
}
"#;

/// Inline CSS for error pages.
pub const ERROR_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;display:flex;justify-content:center;align-items:center;min-height:100vh;background:#f5f7fa;color:#0b0f14;padding:1rem}
.error-page{text-align:center;max-width:420px}
.error-page h1{font-size:1.5rem;margin-bottom:.75rem}
.error-page p{color:#42576c;line-height:1.5}
@media(prefers-color-scheme:dark){
body{background:#0b0f14;color:#f1f3f5}
.error-page p{color:#aebbc9}
}
"#;

/// Content-Security-Policy header value.
///
/// Inline styles only; no scripts, no frames. Images and video may come from
/// any HTTPS origin since they live on CDNs and PDSes.
pub const CSP_HEADER: &str = "default-src 'none'; style-src 'unsafe-inline'; img-src https: data:; media-src https:; form-action 'none'; frame-ancestors 'none'";

/// Open Graph metadata for a page.
pub struct OpenGraphData<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// OG type (e.g., "profile", "article", "video.other", "website").
    pub og_type: &'a str,
    pub images: Vec<OgImage<'a>>,
    pub video: Option<OgVideo<'a>>,
    /// Twitter card type ("summary", "summary_large_image", "player").
    pub twitter_card_type: &'a str,
    /// oEmbed discovery URL.
    pub oembed_url: Option<String>,
}

pub struct OgImage<'a> {
    pub url: &'a str,
    pub alt: &'a str,
    pub width: u32,
    pub height: u32,
}

pub struct OgVideo<'a> {
    pub url: &'a str,
    pub width: u32,
    pub height: u32,
}

/// Render the full HTML page with `<head>` metadata and body content.
///
/// `canonical_url` is the bsky.app page; browsers are sent there right away.
pub fn page_shell(
    canonical_url: &str,
    og: OpenGraphData<'_>,
    body_content: Markup,
    site_name: &str,
) -> Markup {
    html! {
        (maud::DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (og.title) }
                meta name="description" content=(og.description);
                meta name="theme-color" content=(THEME_COLOR);
                link rel="canonical" href=(canonical_url);
                meta http-equiv="refresh" content={ "0; url=" (canonical_url) };

                meta property="og:title" content=(og.title);
                meta property="og:description" content=(og.description);
                meta property="og:url" content=(canonical_url);
                meta property="og:site_name" content=(site_name);
                meta property="og:type" content=(og.og_type);
                @for image in og.images.iter().filter(|i| is_safe_url(i.url)) {
                    meta property="og:image" content=(image.url);
                    @if !image.alt.is_empty() {
                        meta property="og:image:alt" content=(image.alt);
                    }
                    @if image.width > 0 && image.height > 0 {
                        meta property="og:image:width" content=(image.width);
                        meta property="og:image:height" content=(image.height);
                    }
                }
                @if let Some(video) = og.video.as_ref().filter(|v| is_safe_url(v.url)) {
                    meta property="og:video" content=(video.url);
                    meta property="og:video:secure_url" content=(video.url);
                    meta property="og:video:type" content="video/mp4";
                    @if video.width > 0 && video.height > 0 {
                        meta property="og:video:width" content=(video.width);
                        meta property="og:video:height" content=(video.height);
                    }
                }

                meta name="twitter:card" content=(og.twitter_card_type);
                meta name="twitter:title" content=(og.title);
                meta name="twitter:description" content=(og.description);
                @if let Some(image) = og.images.iter().find(|i| is_safe_url(i.url)) {
                    meta name="twitter:image" content=(image.url);
                }

                @if let Some(oembed) = &og.oembed_url {
                    link rel="alternate" type="application/json+oembed" href=(oembed);
                }

                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                main { (body_content) }
                footer class="footer" { (site_name) }
            }
        }
    }
}

/// Avatar, display name and handle.
pub fn author_header(display_name: &str, handle: &str, avatar: &str) -> Markup {
    html! {
        div class="author" {
            @if is_safe_url(avatar) {
                img class="avatar" src=(avatar) alt=(display_name) loading="lazy";
            } @else {
                div class="avatar" {}
            }
            div {
                div class="author-name" { (display_name) }
                div class="author-handle" { "@" (handle) }
            }
        }
    }
}

/// "Open on Bluesky" button.
pub fn open_link(url: &str) -> Markup {
    html! {
        div class="actions" {
            a class="open-link" href=(url) { "Open on Bluesky" }
        }
    }
}

/// oEmbed discovery URL with the given query parameters.
pub fn oembed_url(base_url: &str, params: &[(&str, String)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{base_url}/oembed?{query}")
}

/// Check if a URL is safe to use in `src` or `href` attributes.
pub fn is_safe_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn og<'a>(images: Vec<OgImage<'a>>, video: Option<OgVideo<'a>>) -> OpenGraphData<'a> {
        OpenGraphData {
            title: "Alice (@alice.test)",
            description: "hello <world>",
            og_type: "article",
            images,
            video,
            twitter_card_type: "summary_large_image",
            oembed_url: Some("https://xbsky.test/oembed?for=post&likes=1".to_string()),
        }
    }

    #[test]
    fn shell_emits_core_meta() {
        let html = page_shell(
            "https://bsky.app/profile/alice.test",
            og(Vec::new(), None),
            html! { p { "body" } },
            "xbsky.test",
        )
        .into_string();

        assert!(html.contains(r#"<meta property="og:title" content="Alice (@alice.test)">"#));
        assert!(html.contains(r#"content="hello &lt;world&gt;""#));
        assert!(html.contains(r##"<meta name="theme-color" content="#0085ff">"##));
        assert!(html.contains("application/json+oembed"));
        assert!(html.contains("for=post&amp;likes=1"));
        assert!(html.contains(r#"content="0; url=https://bsky.app/profile/alice.test""#));
        assert!(!html.contains("og:image"));
    }

    #[test]
    fn shell_emits_each_image() {
        let images = vec![
            OgImage { url: "https://cdn.test/1.jpg", alt: "one", width: 800, height: 600 },
            OgImage { url: "https://cdn.test/2.jpg", alt: "", width: 0, height: 0 },
            OgImage { url: "javascript:alert(1)", alt: "", width: 0, height: 0 },
        ];
        let html = page_shell("https://bsky.app", og(images, None), html! {}, "s").into_string();

        assert_eq!(html.matches(r#"property="og:image""#).count(), 2);
        assert!(html.contains(r#"<meta property="og:image:alt" content="one">"#));
        assert_eq!(html.matches("og:image:width").count(), 1);
        assert!(html.contains(r#"<meta name="twitter:image" content="https://cdn.test/1.jpg">"#));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn shell_emits_video() {
        let video = OgVideo { url: "https://pds.test/blob", width: 1920, height: 1080 };
        let html = page_shell("https://bsky.app", og(Vec::new(), Some(video)), html! {}, "s").into_string();
        assert!(html.contains(r#"<meta property="og:video" content="https://pds.test/blob">"#));
        assert!(html.contains(r#"<meta property="og:video:width" content="1920">"#));
    }

    #[test]
    fn author_header_without_avatar() {
        let html = author_header("Alice", "alice.test", "").into_string();
        assert!(html.contains("@alice.test"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn oembed_url_encodes_values() {
        let url = oembed_url(
            "https://xbsky.test",
            &[("for", "post".to_string()), ("description", "a & b\nc".to_string())],
        );
        assert_eq!(url, "https://xbsky.test/oembed?for=post&description=a+%26+b%0Ac");
    }

    // -- is_safe_url() tests --

    #[test]
    fn is_safe_url_schemes() {
        assert!(is_safe_url("https://example.com"));
        assert!(is_safe_url("http://example.com"));
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url("data:text/html,x"));
        assert!(!is_safe_url(""));
        assert!(!is_safe_url("/relative"));
    }
}
