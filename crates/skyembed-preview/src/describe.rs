//! Human-readable description text for a post preview.

use crate::api::{Author, PostView, ThreadViewPost};
use crate::embed::{EmbedView, EmbeddedRecord, LIST_PURPOSE_CURATION, LIST_PURPOSE_MODERATION};
use crate::normalize::{CanonicalEmbed, CommonEmbed};

/// Compose the description shown under a post preview.
///
/// The post text comes first, followed by the embed's own summary, the quoted
/// post and finally the post being replied to. Sections are separated by a
/// blank line, but only once there is text to separate from.
pub fn compose(canonical: &CanonicalEmbed, thread: &ThreadViewPost) -> String {
    let post = &thread.post;
    let mut text = post.record.text.clone();

    match canonical {
        CanonicalEmbed::External(ext) if !ext.is_gif => {
            push_section(&mut text, &format!("{}\n{}", ext.title, ext.description));
        }
        CanonicalEmbed::List(common) => {
            push_section(&mut text, &collection_section(common, list_label(&common.purpose)));
        }
        CanonicalEmbed::Feed(common) => {
            push_section(&mut text, &collection_section(common, "📡 A feed"));
        }
        CanonicalEmbed::StarterPack(common) => {
            push_section(&mut text, &collection_section(common, "📦 A starter pack"));
        }
        _ => {}
    }

    if let Some((author, quoted_text)) = quoted_post(post) {
        push_section(
            &mut text,
            &format!("📝 Quoting {}:\n{quoted_text}", attribution(author)),
        );
    }

    if let Some(parent) = thread.parent_post() {
        push_section(
            &mut text,
            &format!(
                "💬 Replying to {}:\n{}",
                attribution(&parent.author),
                parent.record.text
            ),
        );
    }

    text
}

/// Icon and label for a list, by purpose.
pub fn list_label(purpose: &str) -> &'static str {
    match purpose {
        LIST_PURPOSE_MODERATION => "🚫 A moderation list",
        LIST_PURPOSE_CURATION => "👥 A curator list",
        _ => "📃 A list",
    }
}

/// "{name}\n{label} by {display name} (@{handle})\n\n{description}".
pub fn collection_section(common: &CommonEmbed, label: &str) -> String {
    format!(
        "{}\n{label} by {}\n\n{}",
        common.name,
        creator_attribution(common),
        common.description
    )
}

/// "{display name} (@{handle})" for a collection's creator.
pub fn creator_attribution(common: &CommonEmbed) -> String {
    let name = if common.creator_display_name.trim().is_empty() {
        &common.creator_handle
    } else {
        &common.creator_display_name
    };
    format!("{name} (@{})", common.creator_handle)
}

/// "{display name} (@{handle})".
pub fn attribution(author: &Author) -> String {
    format!("{} (@{})", author.name(), author.handle)
}

/// Engagement counters in compact notation.
pub fn stats_line(replies: u64, reposts: u64, likes: u64, quotes: u64) -> String {
    format!(
        "💬 {}   🔁 {}   ❤️ {}   📝 {}",
        to_notation(replies),
        to_notation(reposts),
        to_notation(likes),
        to_notation(quotes)
    )
}

/// Compact count: `1.2B`, `3.4M`, `5.6K`, or the plain number.
pub fn to_notation(n: u64) -> String {
    const UNITS: [(u64, &str); 3] = [
        (1_000_000_000, "B"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];

    for (scale, suffix) in UNITS {
        if n >= scale {
            return format!("{:.1}{suffix}", n as f64 / scale as f64);
        }
    }
    n.to_string()
}

fn quoted_post(post: &PostView) -> Option<(&Author, &str)> {
    let record = match post.embed.as_ref()? {
        EmbedView::Record(view) => &view.record,
        EmbedView::RecordWithMedia(view) => &view.record.record,
        _ => return None,
    };

    match record {
        EmbeddedRecord::Post(quoted) => Some((&quoted.author, quoted.value.text.as_str())),
        _ => None,
    }
}

fn push_section(text: &mut String, section: &str) {
    if !text.is_empty() {
        text.push_str("\n\n");
    }
    text.push_str(section);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::{Value, json};

    fn thread(value: Value) -> ThreadViewPost {
        serde_json::from_value(value).unwrap()
    }

    fn common(purpose: &str, display_name: &str) -> CommonEmbed {
        CommonEmbed {
            name: "Name".into(),
            avatar_url: String::new(),
            description: "Desc".into(),
            purpose: purpose.into(),
            creator_did: "did:plc:c".into(),
            creator_handle: "c.test".into(),
            creator_display_name: display_name.into(),
        }
    }

    #[test]
    fn plain_text_only() {
        let t = thread(json!({
            "post": { "author": { "handle": "a.test" }, "record": { "text": "just text" } }
        }));
        assert_eq!(compose(&normalize(&t), &t), "just text");
    }

    #[test]
    fn external_section_after_text() {
        let t = thread(json!({
            "post": {
                "author": { "handle": "a.test" },
                "record": { "text": "read this" },
                "embed": {
                    "$type": "app.bsky.embed.external#view",
                    "external": { "uri": "https://example.com", "title": "Title", "description": "Summary" }
                }
            }
        }));
        assert_eq!(compose(&normalize(&t), &t), "read this\n\nTitle\nSummary");
    }

    #[test]
    fn gif_has_no_external_section() {
        let t = thread(json!({
            "post": {
                "author": { "handle": "a.test" },
                "record": { "text": "" },
                "embed": {
                    "$type": "app.bsky.embed.external#view",
                    "external": { "uri": "https://media.tenor.com/x/y.gif", "title": "y" }
                }
            }
        }));
        assert_eq!(compose(&normalize(&t), &t), "");
    }

    #[test]
    fn empty_text_has_no_leading_separator() {
        let t = thread(json!({
            "post": {
                "author": { "handle": "a.test" },
                "record": { "text": "" },
                "embed": {
                    "$type": "app.bsky.embed.external#view",
                    "external": { "uri": "https://example.com", "title": "T", "description": "D" }
                }
            }
        }));
        assert_eq!(compose(&normalize(&t), &t), "T\nD");
    }

    #[test]
    fn list_labels_by_purpose() {
        assert_eq!(list_label(LIST_PURPOSE_MODERATION), "🚫 A moderation list");
        assert_eq!(list_label(LIST_PURPOSE_CURATION), "👥 A curator list");
        assert_eq!(list_label("app.bsky.graph.defs#referencelist"), "📃 A list");
        assert_eq!(list_label(""), "📃 A list");
    }

    #[test]
    fn collection_section_format() {
        assert_eq!(
            collection_section(&common("", "Creator"), "📡 A feed"),
            "Name\n📡 A feed by Creator (@c.test)\n\nDesc"
        );
        assert_eq!(
            collection_section(&common("", ""), "📦 A starter pack"),
            "Name\n📦 A starter pack by c.test (@c.test)\n\nDesc"
        );
    }

    #[test]
    fn quote_and_reply_in_order() {
        let t = thread(json!({
            "post": {
                "author": { "handle": "a.test" },
                "record": { "text": "mine" },
                "embed": {
                    "$type": "app.bsky.embed.recordWithMedia#view",
                    "record": {
                        "$type": "app.bsky.embed.record#view",
                        "record": {
                            "$type": "app.bsky.embed.record#viewRecord",
                            "author": { "handle": "q.test", "displayName": "Quoted" },
                            "value": { "text": "their words" }
                        }
                    },
                    "media": { "$type": "app.bsky.embed.images#view", "images": [] }
                }
            },
            "parent": {
                "$type": "app.bsky.feed.defs#threadViewPost",
                "post": {
                    "author": { "handle": "p.test" },
                    "record": { "text": "parent words" }
                }
            }
        }));
        assert_eq!(
            compose(&normalize(&t), &t),
            "mine\n\n📝 Quoting Quoted (@q.test):\ntheir words\n\n💬 Replying to p.test (@p.test):\nparent words"
        );
    }

    #[test]
    fn quoted_list_section_then_nothing_else() {
        let t = thread(json!({
            "post": {
                "author": { "handle": "a.test" },
                "record": { "text": "" },
                "embed": {
                    "$type": "app.bsky.embed.record#view",
                    "record": {
                        "$type": "app.bsky.graph.defs#listView",
                        "name": "Mods",
                        "purpose": "app.bsky.graph.defs#modlist",
                        "description": "blocked folks",
                        "creator": { "did": "did:plc:c", "handle": "c.test" }
                    }
                }
            }
        }));
        assert_eq!(
            compose(&normalize(&t), &t),
            "Mods\n🚫 A moderation list by c.test (@c.test)\n\nblocked folks"
        );
    }

    #[test]
    fn notation_thresholds() {
        assert_eq!(to_notation(0), "0");
        assert_eq!(to_notation(999), "999");
        assert_eq!(to_notation(1_000), "1.0K");
        assert_eq!(to_notation(5_600), "5.6K");
        assert_eq!(to_notation(3_400_000), "3.4M");
        assert_eq!(to_notation(1_200_000_000), "1.2B");
    }

    #[test]
    fn stats_line_format() {
        assert_eq!(
            stats_line(3, 1_500, 20_000, 0),
            "💬 3   🔁 1.5K   ❤️ 20.0K   📝 0"
        );
    }
}
