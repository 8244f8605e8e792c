//! Typed view of the AppView's embed unions.
//!
//! Embeds arrive as `$type`-tagged JSON objects, several levels deep:
//! a post's `embed` may be images, an external card, a video, a record
//! (quote) or a record-with-media, and a quoted record is itself a union of
//! posts, lists, feed generators, starter packs and unavailable stubs.
//!
//! Every union is decoded leniently: an unknown tag, a missing tag or a
//! malformed payload becomes the union's `Unknown`/`Other` variant instead of
//! failing the whole document. Business decisions about these trees live in
//! [`crate::normalize`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::api::Author;

/// `$type` of an images embed view.
pub const EMBED_IMAGES: &str = "app.bsky.embed.images#view";
/// `$type` of an external link embed view.
pub const EMBED_EXTERNAL: &str = "app.bsky.embed.external#view";
/// `$type` of a video embed view.
pub const EMBED_VIDEO: &str = "app.bsky.embed.video#view";
/// `$type` of a record (quote) embed view.
pub const EMBED_RECORD: &str = "app.bsky.embed.record#view";
/// `$type` of a record-with-media embed view.
pub const EMBED_RECORD_WITH_MEDIA: &str = "app.bsky.embed.recordWithMedia#view";

/// List purpose for moderation lists.
pub const LIST_PURPOSE_MODERATION: &str = "app.bsky.graph.defs#modlist";
/// List purpose for curation lists.
pub const LIST_PURPOSE_CURATION: &str = "app.bsky.graph.defs#curatelist";

/// Width/height pair as declared by the uploader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

/// A post embed, as returned in `PostView.embed` and `ViewRecord.embeds`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "$type")]
pub enum EmbedView {
    #[serde(rename = "app.bsky.embed.images#view")]
    Images(ImagesView),

    #[serde(rename = "app.bsky.embed.external#view")]
    External(ExternalView),

    #[serde(rename = "app.bsky.embed.video#view")]
    Video(VideoView),

    #[serde(rename = "app.bsky.embed.record#view")]
    Record(RecordView),

    #[serde(rename = "app.bsky.embed.recordWithMedia#view")]
    RecordWithMedia(RecordWithMediaView),

    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImagesView {
    pub images: Vec<ViewImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewImage {
    pub thumb: String,
    pub fullsize: String,
    pub alt: String,
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExternalView {
    pub external: ViewExternal,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewExternal {
    pub uri: String,
    pub title: String,
    pub description: String,
    pub thumb: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoView {
    pub cid: String,
    pub playlist: String,
    pub thumbnail: String,
    pub alt: String,
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordView {
    #[serde(default, deserialize_with = "lenient")]
    pub record: EmbeddedRecord,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordWithMediaView {
    #[serde(default)]
    pub record: RecordView,
    #[serde(default, deserialize_with = "lenient")]
    pub media: Box<EmbedView>,
}

/// The record inside a record embed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "$type")]
pub enum EmbeddedRecord {
    #[serde(rename = "app.bsky.embed.record#viewRecord")]
    Post(Box<ViewRecord>),

    #[serde(rename = "app.bsky.graph.defs#listView")]
    List(ListView),

    #[serde(rename = "app.bsky.feed.defs#generatorView")]
    Feed(GeneratorView),

    #[serde(rename = "app.bsky.graph.defs#starterPackViewBasic")]
    StarterPack(StarterPackView),

    /// Not-found, blocked, detached, labeler and future record kinds.
    #[default]
    #[serde(other)]
    Other,
}

/// A quoted post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewRecord {
    pub uri: String,
    pub author: Author,
    pub value: QuotedValue,
    #[serde(deserialize_with = "lenient_vec")]
    pub embeds: Vec<EmbedView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuotedValue {
    pub text: String,
}

/// `app.bsky.graph.defs#listView`.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListView {
    pub uri: String,
    pub name: String,
    pub purpose: String,
    pub avatar: String,
    pub description: String,
    pub creator: Author,
    pub list_item_count: u64,
}

/// `app.bsky.feed.defs#generatorView`.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorView {
    pub uri: String,
    pub display_name: String,
    pub avatar: String,
    pub description: String,
    pub creator: Author,
    pub like_count: u64,
}

/// `app.bsky.graph.defs#starterPackViewBasic` (also the shape of the full view).
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StarterPackView {
    pub uri: String,
    pub record: StarterPackRecord,
    pub creator: Author,
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StarterPackRecord {
    pub name: String,
    pub description: String,
}

/// Decode a union value, mapping any failure to the union's default variant.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(from_value_or_default(value))
}

/// Like [`lenient`], but `null` stays `None`.
pub(crate) fn lenient_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(from_value_or_default))
}

/// Decode every element of an array leniently.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(from_value_or_default)
        .collect())
}

fn from_value_or_default<T: DeserializeOwned + Default>(value: Value) -> T {
    match serde_json::from_value(value) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::debug!(error = %err, "unrecognized union member, treating as unknown");
            T::default()
        }
    }
}
