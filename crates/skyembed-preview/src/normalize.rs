//! Flattening of the embed tree into one canonical record.
//!
//! The AppView can place the media a preview should show in several spots:
//! directly on the post, next to a quoted record, inside the quoted post, or
//! on the post being replied to. [`normalize`] walks those spots in a fixed
//! priority order and produces a [`CanonicalEmbed`], which has exactly one
//! populated variant.

use serde::Serialize;

use crate::api::{Author, PostView, ThreadViewPost};
use crate::embed::{
    AspectRatio, EmbedView, EmbeddedRecord, ExternalView, GeneratorView, ImagesView, ListView,
    StarterPackView, VideoView,
};

/// Host serving Tenor GIFs; external links to it are shown as animations.
const GIF_HOST: &str = "media.tenor.com";

/// Base URL of the starter-pack card renderer.
const STARTER_PACK_CARD_BASE: &str = "https://ogcard.cdn.bsky.app/start";

/// Collection segment preceding a starter pack's record key.
const STARTER_PACK_COLLECTION: &str = "app.bsky.graph.starterpack/";

/// Canonical form of a post's embed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum CanonicalEmbed {
    Images(Vec<Image>),
    External(ExternalEmbed),
    Video(VideoEmbed),
    List(CommonEmbed),
    Feed(CommonEmbed),
    StarterPack(CommonEmbed),
    Unknown,
}

/// Discriminant of [`CanonicalEmbed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EmbedKind {
    Images,
    External,
    Video,
    List,
    Feed,
    StarterPack,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    pub url: String,
    pub alt: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEmbed {
    pub uri: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub is_gif: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEmbed {
    /// Blob CID of the video.
    pub content_id: String,
    /// DID of the account whose repository holds the blob.
    pub owner_id: String,
    pub aspect_ratio: AspectRatio,
    pub thumbnail: String,
}

impl VideoEmbed {
    /// Direct blob URL on the owner's PDS.
    pub fn blob_url(&self, pds: &str) -> String {
        format!(
            "{}/xrpc/com.atproto.sync.getBlob?cid={}&did={}",
            pds.trim_end_matches('/'),
            self.content_id,
            self.owner_id
        )
    }
}

/// Shared shape of lists, feeds and starter packs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonEmbed {
    pub name: String,
    pub avatar_url: String,
    pub description: String,
    /// List purpose; empty for feeds and starter packs.
    pub purpose: String,
    pub creator_did: String,
    pub creator_handle: String,
    pub creator_display_name: String,
}

impl CanonicalEmbed {
    pub fn kind(&self) -> EmbedKind {
        match self {
            Self::Images(_) => EmbedKind::Images,
            Self::External(_) => EmbedKind::External,
            Self::Video(_) => EmbedKind::Video,
            Self::List(_) => EmbedKind::List,
            Self::Feed(_) => EmbedKind::Feed,
            Self::StarterPack(_) => EmbedKind::StarterPack,
            Self::Unknown => EmbedKind::Unknown,
        }
    }

    /// Narrow an image embed to a single 1-based photo.
    ///
    /// Returns the "Photo i of N" message when the index selects an image.
    /// Anything else (another kind, `0`, out of range, not a number) leaves
    /// the embed as it was.
    pub fn narrow_to_photo(&mut self, index: &str) -> Option<String> {
        let Self::Images(images) = self else {
            return None;
        };

        let position: usize = index.trim().parse().ok()?;
        let total = images.len();
        if position == 0 || position > total {
            return None;
        }

        let chosen = images.swap_remove(position - 1);
        *images = vec![chosen];
        Some(format!("Photo {position} of {total}"))
    }

    /// The list/feed/starter-pack payload, if this is one.
    pub fn common(&self) -> Option<&CommonEmbed> {
        match self {
            Self::List(common) | Self::Feed(common) | Self::StarterPack(common) => Some(common),
            _ => None,
        }
    }
}

/// Normalize a thread's embed.
///
/// The primary post's embed wins. A post with no recognizable embed falls
/// back to its reply parent's embed; quoted records on the parent are only
/// mapped when they are lists, feeds or starter packs.
pub fn normalize(thread: &ThreadViewPost) -> CanonicalEmbed {
    let post = &thread.post;

    let canonical = match &post.embed {
        Some(embed) if !matches!(embed, EmbedView::Unknown) => {
            dispatch(embed, &post.author, QuoteDepth::Follow)
        }
        _ => match thread.parent_post() {
            Some(parent) => from_parent(parent),
            None => CanonicalEmbed::Unknown,
        },
    };

    tracing::debug!(uri = %post.uri, kind = ?canonical.kind(), "normalized embed");
    canonical
}

fn from_parent(parent: &PostView) -> CanonicalEmbed {
    parent
        .embed
        .as_ref()
        .map(|embed| dispatch(embed, &parent.author, QuoteDepth::CollectionsOnly))
        .unwrap_or(CanonicalEmbed::Unknown)
}

/// Whether a quoted post's own embeds may be inspected.
#[derive(Clone, Copy)]
enum QuoteDepth {
    Follow,
    CollectionsOnly,
}

/// `owner` is the author of the post carrying `embed`.
fn dispatch(embed: &EmbedView, owner: &Author, depth: QuoteDepth) -> CanonicalEmbed {
    match embed {
        EmbedView::Images(view) => images(view),
        EmbedView::External(view) => external(view),
        EmbedView::Video(view) => video(view, owner),
        EmbedView::RecordWithMedia(view) => match view.media.as_ref() {
            EmbedView::Images(media) => images(media),
            EmbedView::External(media) => external(media),
            EmbedView::Video(media) => video(media, owner),
            _ => CanonicalEmbed::Unknown,
        },
        EmbedView::Record(view) => match (&view.record, depth) {
            (EmbeddedRecord::Post(quoted), QuoteDepth::Follow) => quoted
                .embeds
                .first()
                .map(|nested| dispatch(nested, &quoted.author, QuoteDepth::CollectionsOnly))
                .unwrap_or(CanonicalEmbed::Unknown),
            (record, _) => collection(record),
        },
        EmbedView::Unknown => CanonicalEmbed::Unknown,
    }
}

fn images(view: &ImagesView) -> CanonicalEmbed {
    CanonicalEmbed::Images(
        view.images
            .iter()
            .map(|image| Image {
                url: image.fullsize.clone(),
                alt: image.alt.clone(),
                width: image.aspect_ratio.width,
                height: image.aspect_ratio.height,
            })
            .collect(),
    )
}

fn external(view: &ExternalView) -> CanonicalEmbed {
    let ext = &view.external;
    let (uri, is_gif) = match gif_url(&ext.uri) {
        Some(gif) => (gif, true),
        None => (ext.uri.clone(), false),
    };

    CanonicalEmbed::External(ExternalEmbed {
        uri,
        title: ext.title.clone(),
        description: ext.description.clone(),
        thumbnail: ext.thumb.clone(),
        is_gif,
    })
}

/// Canonical GIF URL for a Tenor link, without its query string.
fn gif_url(uri: &str) -> Option<String> {
    let parsed = url::Url::parse(uri).ok()?;
    if parsed.host_str()? != GIF_HOST {
        return None;
    }
    Some(format!("https://{GIF_HOST}{}", parsed.path()))
}

fn video(view: &VideoView, owner: &Author) -> CanonicalEmbed {
    CanonicalEmbed::Video(VideoEmbed {
        content_id: view.cid.clone(),
        owner_id: owner.did.clone(),
        aspect_ratio: view.aspect_ratio,
        thumbnail: view.thumbnail.clone(),
    })
}

fn collection(record: &EmbeddedRecord) -> CanonicalEmbed {
    match record {
        EmbeddedRecord::List(list) => CanonicalEmbed::List(from_list(list)),
        EmbeddedRecord::Feed(feed) => CanonicalEmbed::Feed(from_feed(feed)),
        EmbeddedRecord::StarterPack(pack) => CanonicalEmbed::StarterPack(from_starter_pack(pack)),
        EmbeddedRecord::Post(_) | EmbeddedRecord::Other => CanonicalEmbed::Unknown,
    }
}

pub fn from_list(list: &ListView) -> CommonEmbed {
    common(
        &list.name,
        &list.avatar,
        &list.description,
        &list.purpose,
        &list.creator,
    )
}

pub fn from_feed(feed: &GeneratorView) -> CommonEmbed {
    common(
        &feed.display_name,
        &feed.avatar,
        &feed.description,
        "",
        &feed.creator,
    )
}

pub fn from_starter_pack(pack: &StarterPackView) -> CommonEmbed {
    let card = starter_pack_card(&pack.creator.did, &pack.uri).unwrap_or_default();
    common(
        &pack.record.name,
        &card,
        &pack.record.description,
        "",
        &pack.creator,
    )
}

fn common(
    name: &str,
    avatar_url: &str,
    description: &str,
    purpose: &str,
    creator: &Author,
) -> CommonEmbed {
    CommonEmbed {
        name: name.to_string(),
        avatar_url: avatar_url.to_string(),
        description: description.to_string(),
        purpose: purpose.to_string(),
        creator_did: creator.did.clone(),
        creator_handle: creator.handle.clone(),
        creator_display_name: creator.name().to_string(),
    }
}

/// Card image for a starter pack, keyed by creator DID and record key.
pub fn starter_pack_card(creator_did: &str, record_uri: &str) -> Option<String> {
    let (_, rkey) = record_uri.split_once(STARTER_PACK_COLLECTION)?;
    if rkey.is_empty() {
        return None;
    }
    Some(format!("{STARTER_PACK_CARD_BASE}/{creator_did}/{rkey}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn thread(value: Value) -> ThreadViewPost {
        serde_json::from_value(value).unwrap()
    }

    fn post_with_embed(embed: Value) -> ThreadViewPost {
        thread(json!({
            "post": {
                "uri": "at://did:plc:author/app.bsky.feed.post/1",
                "author": { "did": "did:plc:author", "handle": "author.test" },
                "record": { "text": "hello" },
                "embed": embed
            }
        }))
    }

    fn images_json(count: usize) -> Value {
        let images: Vec<Value> = (1..=count)
            .map(|i| {
                json!({
                    "fullsize": format!("https://cdn.test/{i}.jpg"),
                    "thumb": format!("https://cdn.test/{i}-thumb.jpg"),
                    "alt": format!("image {i}"),
                    "aspectRatio": { "width": 100 * i, "height": 50 }
                })
            })
            .collect();
        json!({ "$type": "app.bsky.embed.images#view", "images": images })
    }

    fn quoted_post(embeds: Value) -> Value {
        json!({
            "$type": "app.bsky.embed.record#viewRecord",
            "uri": "at://did:plc:quoted/app.bsky.feed.post/9",
            "author": { "did": "did:plc:quoted", "handle": "quoted.test" },
            "value": { "text": "quoted text" },
            "embeds": embeds
        })
    }

    fn list_record(purpose: &str, display_name: &str) -> Value {
        json!({
            "$type": "app.bsky.graph.defs#listView",
            "uri": "at://did:plc:creator/app.bsky.graph.list/l1",
            "name": "Cool people",
            "purpose": purpose,
            "avatar": "https://cdn.test/list.jpg",
            "description": "a list",
            "creator": { "did": "did:plc:creator", "handle": "creator.test", "displayName": display_name }
        })
    }

    #[test]
    fn no_embed_no_parent_is_unknown() {
        let t = thread(json!({
            "post": { "author": { "did": "did:plc:a", "handle": "a.test" }, "record": { "text": "x" } }
        }));
        assert_eq!(normalize(&t), CanonicalEmbed::Unknown);
    }

    #[test]
    fn images_copied_verbatim() {
        let canonical = normalize(&post_with_embed(images_json(2)));
        let CanonicalEmbed::Images(images) = canonical else {
            panic!("expected images");
        };
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].url, "https://cdn.test/2.jpg");
        assert_eq!(images[1].alt, "image 2");
        assert_eq!(images[1].width, 200);
        assert_eq!(images[1].height, 50);
    }

    #[test]
    fn external_plain_link() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.external#view",
            "external": {
                "uri": "https://example.com/article?x=1",
                "title": "Article",
                "description": "About things",
                "thumb": "https://cdn.test/thumb.jpg"
            }
        })));
        let CanonicalEmbed::External(ext) = canonical else {
            panic!("expected external");
        };
        assert!(!ext.is_gif);
        assert_eq!(ext.uri, "https://example.com/article?x=1");
        assert_eq!(ext.thumbnail, "https://cdn.test/thumb.jpg");
    }

    #[test]
    fn tenor_link_becomes_gif() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.external#view",
            "external": {
                "uri": "https://media.tenor.com/abc123/dance.gif?hh=200&ww=300",
                "title": "dance"
            }
        })));
        let CanonicalEmbed::External(ext) = canonical else {
            panic!("expected external");
        };
        assert!(ext.is_gif);
        assert_eq!(ext.uri, "https://media.tenor.com/abc123/dance.gif");
    }

    #[test]
    fn tenor_lookalike_host_is_not_gif() {
        assert_eq!(gif_url("https://media.tenor.com.evil.test/a.gif"), None);
        assert_eq!(gif_url("not a url"), None);
    }

    #[test]
    fn video_owner_is_post_author() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.video#view",
            "cid": "bafyvideo",
            "thumbnail": "https://video.test/thumb.jpg",
            "aspectRatio": { "width": 1920, "height": 1080 }
        })));
        let CanonicalEmbed::Video(video) = canonical else {
            panic!("expected video");
        };
        assert_eq!(video.owner_id, "did:plc:author");
        assert_eq!(video.content_id, "bafyvideo");
        assert_eq!(video.aspect_ratio.width, 1920);
        assert_eq!(
            video.blob_url("https://pds.test/"),
            "https://pds.test/xrpc/com.atproto.sync.getBlob?cid=bafyvideo&did=did:plc:author"
        );
    }

    #[test]
    fn record_with_media_uses_media_and_outer_author() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.recordWithMedia#view",
            "record": { "$type": "app.bsky.embed.record#view", "record": quoted_post(json!([])) },
            "media": { "$type": "app.bsky.embed.video#view", "cid": "bafyouter" }
        })));
        let CanonicalEmbed::Video(video) = canonical else {
            panic!("expected video");
        };
        assert_eq!(video.owner_id, "did:plc:author");
        assert_eq!(video.content_id, "bafyouter");
    }

    #[test]
    fn quote_only_nested_video_owned_by_quoted_author() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.record#view",
            "record": quoted_post(json!([
                { "$type": "app.bsky.embed.video#view", "cid": "bafyquoted" },
                { "$type": "app.bsky.embed.images#view", "images": [] }
            ]))
        })));
        let CanonicalEmbed::Video(video) = canonical else {
            panic!("expected video");
        };
        assert_eq!(video.owner_id, "did:plc:quoted");
        assert_eq!(video.content_id, "bafyquoted");
    }

    #[test]
    fn quote_only_nested_record_with_media() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.record#view",
            "record": quoted_post(json!([{
                "$type": "app.bsky.embed.recordWithMedia#view",
                "record": { "$type": "app.bsky.embed.record#view", "record": { "$type": "app.bsky.embed.record#viewNotFound" } },
                "media": images_json(3)
            }]))
        })));
        assert_eq!(canonical.kind(), EmbedKind::Images);
    }

    #[test]
    fn quote_of_quote_is_not_followed() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.record#view",
            "record": quoted_post(json!([{
                "$type": "app.bsky.embed.record#view",
                "record": quoted_post(json!([images_json(1)]))
            }]))
        })));
        assert_eq!(canonical, CanonicalEmbed::Unknown);
    }

    #[test]
    fn quote_without_nested_embeds_is_unknown() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.record#view",
            "record": quoted_post(json!([]))
        })));
        assert_eq!(canonical, CanonicalEmbed::Unknown);
    }

    #[test]
    fn quoted_list_maps_to_common_with_name_fallback() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.record#view",
            "record": list_record("app.bsky.graph.defs#modlist", "")
        })));
        let CanonicalEmbed::List(list) = canonical else {
            panic!("expected list");
        };
        assert_eq!(list.name, "Cool people");
        assert_eq!(list.purpose, "app.bsky.graph.defs#modlist");
        assert_eq!(list.creator_display_name, "creator.test");
        assert_eq!(list.avatar_url, "https://cdn.test/list.jpg");
    }

    #[test]
    fn quoted_feed_maps_to_common() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.record#view",
            "record": {
                "$type": "app.bsky.feed.defs#generatorView",
                "displayName": "Cats",
                "description": "only cats",
                "avatar": "https://cdn.test/feed.jpg",
                "creator": { "did": "did:plc:creator", "handle": "creator.test", "displayName": "Creator" }
            }
        })));
        let CanonicalEmbed::Feed(feed) = canonical else {
            panic!("expected feed");
        };
        assert_eq!(feed.name, "Cats");
        assert_eq!(feed.creator_display_name, "Creator");
        assert!(feed.purpose.is_empty());
    }

    #[test]
    fn quoted_starter_pack_gets_card() {
        let canonical = normalize(&post_with_embed(json!({
            "$type": "app.bsky.embed.record#view",
            "record": {
                "$type": "app.bsky.graph.defs#starterPackViewBasic",
                "uri": "at://did:plc:creator/app.bsky.graph.starterpack/3kpack",
                "record": { "name": "Starters", "description": "join us" },
                "creator": { "did": "did:plc:creator", "handle": "creator.test" }
            }
        })));
        let CanonicalEmbed::StarterPack(pack) = canonical else {
            panic!("expected starter pack");
        };
        assert_eq!(pack.name, "Starters");
        assert_eq!(
            pack.avatar_url,
            "https://ogcard.cdn.bsky.app/start/did:plc:creator/3kpack"
        );
    }

    #[test]
    fn starter_pack_card_requires_rkey() {
        assert_eq!(starter_pack_card("did:plc:x", "at://did:plc:x/app.bsky.graph.list/1"), None);
        assert_eq!(starter_pack_card("did:plc:x", "at://did:plc:x/app.bsky.graph.starterpack/"), None);
    }

    #[test]
    fn reply_falls_back_to_parent_embed() {
        let t = thread(json!({
            "post": {
                "author": { "did": "did:plc:child", "handle": "child.test" },
                "record": { "text": "look" }
            },
            "parent": {
                "$type": "app.bsky.feed.defs#threadViewPost",
                "post": {
                    "author": { "did": "did:plc:parent", "handle": "parent.test" },
                    "record": { "text": "video here" },
                    "embed": { "$type": "app.bsky.embed.video#view", "cid": "bafyparent" }
                }
            }
        }));
        let CanonicalEmbed::Video(video) = normalize(&t) else {
            panic!("expected video");
        };
        assert_eq!(video.owner_id, "did:plc:parent");
    }

    #[test]
    fn unknown_primary_embed_falls_back_to_parent() {
        let t = thread(json!({
            "post": {
                "author": { "did": "did:plc:child", "handle": "child.test" },
                "embed": { "$type": "app.bsky.embed.somethingNew#view" }
            },
            "parent": {
                "$type": "app.bsky.feed.defs#threadViewPost",
                "post": {
                    "author": { "did": "did:plc:parent", "handle": "parent.test" },
                    "embed": images_json(1)
                }
            }
        }));
        assert_eq!(normalize(&t).kind(), EmbedKind::Images);
    }

    #[test]
    fn parent_quote_is_not_followed() {
        let t = thread(json!({
            "post": { "author": { "did": "did:plc:child", "handle": "child.test" } },
            "parent": {
                "$type": "app.bsky.feed.defs#threadViewPost",
                "post": {
                    "author": { "did": "did:plc:parent", "handle": "parent.test" },
                    "embed": {
                        "$type": "app.bsky.embed.record#view",
                        "record": quoted_post(json!([images_json(2)]))
                    }
                }
            }
        }));
        assert_eq!(normalize(&t), CanonicalEmbed::Unknown);
    }

    #[test]
    fn parent_quoted_list_is_mapped() {
        let t = thread(json!({
            "post": { "author": { "did": "did:plc:child", "handle": "child.test" } },
            "parent": {
                "$type": "app.bsky.feed.defs#threadViewPost",
                "post": {
                    "author": { "did": "did:plc:parent", "handle": "parent.test" },
                    "embed": { "$type": "app.bsky.embed.record#view", "record": list_record("", "Someone") }
                }
            }
        }));
        assert_eq!(normalize(&t).kind(), EmbedKind::List);
    }

    #[test]
    fn blocked_parent_is_ignored() {
        let t = thread(json!({
            "post": { "author": { "did": "did:plc:child", "handle": "child.test" } },
            "parent": { "$type": "app.bsky.feed.defs#blockedPost", "blocked": true }
        }));
        assert_eq!(normalize(&t), CanonicalEmbed::Unknown);
    }

    #[test]
    fn narrow_selects_single_photo() {
        let mut canonical = normalize(&post_with_embed(images_json(5)));
        let original = match &canonical {
            CanonicalEmbed::Images(images) => images.clone(),
            _ => panic!("expected images"),
        };

        let message = canonical.narrow_to_photo("3");
        assert_eq!(message.as_deref(), Some("Photo 3 of 5"));
        assert_eq!(canonical, CanonicalEmbed::Images(vec![original[2].clone()]));
    }

    #[test]
    fn narrow_ignores_invalid_indices() {
        let base = normalize(&post_with_embed(images_json(5)));
        for index in ["0", "6", "abc", "", "-1"] {
            let mut canonical = base.clone();
            assert_eq!(canonical.narrow_to_photo(index), None, "index {index:?}");
            assert_eq!(canonical, base);
        }
    }

    #[test]
    fn narrow_ignores_other_kinds() {
        let mut canonical = CanonicalEmbed::Unknown;
        assert_eq!(canonical.narrow_to_photo("1"), None);
    }

    #[test]
    fn every_case_yields_exactly_one_kind() {
        let cases = [
            (images_json(1), EmbedKind::Images),
            (json!({ "$type": "app.bsky.embed.external#view", "external": { "uri": "https://a.test" } }), EmbedKind::External),
            (json!({ "$type": "app.bsky.embed.video#view", "cid": "c" }), EmbedKind::Video),
            (json!({ "$type": "app.bsky.embed.record#view", "record": list_record("", "x") }), EmbedKind::List),
            (json!({ "$type": "app.bsky.embed.record#view", "record": { "$type": "app.bsky.embed.record#viewBlocked" } }), EmbedKind::Unknown),
            (json!({ "images": [] }), EmbedKind::Unknown),
        ];
        for (embed, expected) in cases {
            let canonical = normalize(&post_with_embed(embed));
            assert_eq!(canonical.kind(), expected);
            assert_eq!(canonical.common().is_some(), expected == EmbedKind::List);
        }
    }
}
