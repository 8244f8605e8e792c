//! skyembed Preview - link-preview pages for Bluesky.
//!
//! This crate provides an HTTP server that mirrors `bsky.app` URLs and answers
//! them with pages carrying rich Open Graph / Twitter-card metadata, so chat
//! clients can unfurl posts, profiles, feeds, lists and starter packs.
//!
//! # Architecture
//!
//! - **Resolve**: handles become DIDs through an ordered strategy chain
//!   (AppView, DNS TXT, HTTPS well-known); DID documents supply the PDS
//! - **Fetch**: AppView XRPC reads with lenient decoding of embed unions
//! - **Normalize**: every embed shape collapses into one canonical record
//! - **Render**: maud templates, an oEmbed endpoint, or raw media depending
//!   on the request host (`raw.`, `mosaic.`, `api.`)
//!
//! # URL Pattern
//!
//! ```text
//! GET /profile/{actor}
//! GET /profile/{actor}/post/{rkey}
//! GET /profile/{actor}/post/{rkey}/photo/{n}
//! GET /profile/{actor}/feed/{rkey}
//! GET /profile/{actor}/lists/{rkey}
//! GET /starter-pack/{actor}/{rkey}
//! GET /oembed?for=post|profile|feed&...
//! ```
//!
//! # Security
//!
//! - All dynamic content is HTML-escaped by maud
//! - URLs are validated (HTTPS/HTTP only) before use in attributes
//! - Strict Content-Security-Policy: no JavaScript execution
//! - X-Frame-Options: DENY prevents clickjacking

pub mod api;
pub mod config;
pub mod describe;
pub mod embed;
pub mod error;
pub mod identity;
pub mod media;
pub mod mosaic;
pub mod normalize;
pub mod render;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
