//! HTML rendering for preview pages.
//!
//! Each page type has its own renderer producing a complete document with
//! Open Graph and Twitter-card tags. Chat clients only read the `<head>`;
//! the body is a small fallback card for browsers.
//!
//! All rendering uses [maud](https://maud.lambda.xyz/) for compile-time HTML
//! generation with automatic escaping of dynamic values.

pub mod collection;
pub mod components;
pub mod post;
pub mod profile;
