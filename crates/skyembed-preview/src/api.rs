//! AppView read API: post threads, profiles, feeds, lists and starter packs.
//!
//! Every call is a single GET against the public AppView with the shared
//! client's timeout. Failures are classified into [`FetchError`] so handlers
//! can report timeouts separately from other upstream failures.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::embed::{
    EmbedView, GeneratorView, ListView, StarterPackView, lenient, lenient_opt,
};
use crate::error::{FetchError, PreviewError};

/// Minimal actor view embedded in posts, lists, feeds and packs.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Author {
    pub did: String,
    pub handle: String,
    pub display_name: String,
    pub avatar: String,
}

impl Author {
    /// Display name, falling back to the handle when empty.
    pub fn name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.handle
        } else {
            &self.display_name
        }
    }
}

/// The `app.bsky.feed.post` record of a post view.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostRecord {
    pub text: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Decode `createdAt` on its own terms: RFC 3339, or a bare timestamp taken
/// as UTC. Anything else is `None` and leaves the rest of the record intact.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(raw) = value.as_ref().and_then(Value::as_str) else {
        return Ok(None);
    };

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|ts| ts.and_utc())
        });

    match parsed {
        Ok(ts) => Ok(Some(ts)),
        Err(err) => {
            tracing::debug!(created_at = raw, error = %err, "unparsable post timestamp");
            Ok(None)
        }
    }
}

/// `app.bsky.feed.defs#postView`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: Author,
    #[serde(deserialize_with = "lenient")]
    pub record: PostRecord,
    #[serde(deserialize_with = "lenient_opt")]
    pub embed: Option<EmbedView>,
    pub reply_count: u64,
    pub repost_count: u64,
    pub like_count: u64,
    pub quote_count: u64,
}

/// `app.bsky.feed.defs#threadViewPost` at depth 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadViewPost {
    pub post: PostView,
    #[serde(default, deserialize_with = "lenient_opt")]
    pub parent: Option<ThreadParent>,
}

impl ThreadViewPost {
    /// The reply parent, if it is a visible post.
    pub fn parent_post(&self) -> Option<&PostView> {
        match self.parent.as_ref()? {
            ThreadParent::Post(parent) => Some(&parent.post),
            ThreadParent::Unavailable => None,
        }
    }
}

/// Reply parent union: only a full thread view is inspectable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "$type")]
pub enum ThreadParent {
    #[serde(rename = "app.bsky.feed.defs#threadViewPost")]
    Post(Box<ParentPost>),

    /// `notFoundPost`, `blockedPost` and anything newer.
    #[default]
    #[serde(other)]
    Unavailable,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParentPost {
    pub post: PostView,
}

/// `getPostThread` response. The untyped document is kept for the JSON dump.
#[derive(Debug, Clone)]
pub struct RawThread {
    pub document: Value,
    pub thread: ThreadViewPost,
}

#[derive(Debug, Deserialize)]
struct ThreadEnvelope {
    thread: ThreadViewPost,
}

/// `app.bsky.actor.defs#profileViewDetailed`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileView {
    pub did: String,
    pub handle: String,
    pub display_name: String,
    pub description: String,
    pub avatar: String,
    pub banner: String,
    pub followers_count: u64,
    pub follows_count: u64,
    pub posts_count: u64,
    pub associated: ProfileAssociated,
}

impl ProfileView {
    /// Display name, falling back to the handle when empty.
    pub fn name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.handle
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileAssociated {
    pub labeler: bool,
}

/// `getFeedGenerator` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedGenerator {
    pub view: GeneratorView,
    pub is_online: bool,
    pub is_valid: bool,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    list: ListView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StarterPackEnvelope {
    starter_pack: StarterPackView,
}

/// Client for the AppView's read-only XRPC endpoints.
#[derive(Debug, Clone)]
pub struct AppView {
    http: reqwest::Client,
    base_url: String,
}

impl AppView {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch a post and its immediate parent.
    pub async fn get_post_thread(&self, did: &str, rkey: &str) -> Result<RawThread, PreviewError> {
        let uri = at_uri(did, "app.bsky.feed.post", rkey);
        let url = self.xrpc(
            "app.bsky.feed.getPostThread",
            &[("depth", "0"), ("uri", &uri)],
        )?;

        let document = self
            .get_document(url)
            .await
            .map_err(|e| PreviewError::upstream("getPost", e))?;
        let envelope: ThreadEnvelope = serde_json::from_value(document.clone())
            .map_err(|e| PreviewError::upstream("getPost", FetchError::Decode(e.to_string())))?;

        Ok(RawThread {
            document,
            thread: envelope.thread,
        })
    }

    pub async fn get_profile(&self, actor: &str) -> Result<ProfileView, PreviewError> {
        let url = self.xrpc("app.bsky.actor.getProfile", &[("actor", actor)])?;
        self.get_json(url)
            .await
            .map_err(|e| PreviewError::upstream("getProfile", e))
    }

    pub async fn get_feed_generator(
        &self,
        did: &str,
        rkey: &str,
    ) -> Result<FeedGenerator, PreviewError> {
        let uri = at_uri(did, "app.bsky.feed.generator", rkey);
        let url = self.xrpc("app.bsky.feed.getFeedGenerator", &[("feed", &uri)])?;
        self.get_json(url)
            .await
            .map_err(|e| PreviewError::upstream("getFeed", e))
    }

    pub async fn get_list(&self, did: &str, rkey: &str) -> Result<ListView, PreviewError> {
        let uri = at_uri(did, "app.bsky.graph.list", rkey);
        let url = self.xrpc("app.bsky.graph.getList", &[("limit", "1"), ("list", &uri)])?;
        self.get_json::<ListEnvelope>(url)
            .await
            .map(|envelope| envelope.list)
            .map_err(|e| PreviewError::upstream("getList", e))
    }

    pub async fn get_starter_pack(
        &self,
        did: &str,
        rkey: &str,
    ) -> Result<StarterPackView, PreviewError> {
        let uri = at_uri(did, "app.bsky.graph.starterpack", rkey);
        let url = self.xrpc("app.bsky.graph.getStarterPack", &[("starterPack", &uri)])?;
        self.get_json::<StarterPackEnvelope>(url)
            .await
            .map(|envelope| envelope.starter_pack)
            .map_err(|e| PreviewError::upstream("getStarterPack", e))
    }

    /// `com.atproto.identity.resolveHandle`; used by the identity resolver.
    pub(crate) async fn resolve_handle(&self, handle: &str) -> Result<String, FetchError> {
        #[derive(Deserialize)]
        struct Resolved {
            did: String,
        }

        let url = self
            .xrpc("com.atproto.identity.resolveHandle", &[("handle", handle)])
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        let resolved: Resolved = self.get_json(url).await?;
        Ok(resolved.did)
    }

    fn xrpc(&self, method: &str, params: &[(&str, &str)]) -> Result<Url, PreviewError> {
        xrpc_url(&self.base_url, method, params)
    }

    async fn get_document(&self, url: Url) -> Result<Value, FetchError> {
        tracing::debug!(url = %url, "appview request");
        let resp = self.http.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(resp.json::<Value>().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let document = self.get_document(url).await?;
        serde_json::from_value(document).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Build an `at://` URI for a record.
pub fn at_uri(did: &str, collection: &str, rkey: &str) -> String {
    format!("at://{did}/{collection}/{rkey}")
}

fn xrpc_url(base_url: &str, method: &str, params: &[(&str, &str)]) -> Result<Url, PreviewError> {
    let url = Url::parse_with_params(&format!("{base_url}/xrpc/{method}"), params)
        .map_err(|e| anyhow::anyhow!("invalid AppView URL {base_url}: {e}"))?;
    Ok(url)
}
