//! Application configuration loaded from environment variables.

use std::time::Duration;

use anyhow::Context;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080").
    pub bind_addr: String,

    /// Public base URL of this service (used for oEmbed discovery links).
    pub base_url: String,

    /// Site name shown in OG tags and the oEmbed provider name.
    pub site_name: String,

    /// Base URL of the public Bluesky AppView.
    pub appview_url: String,

    /// Base URL of the PLC directory used for `did:plc` documents.
    pub plc_url: String,

    /// PDS used for blob URLs when a DID document has no usable service entry.
    pub default_pds: String,

    /// Path or name of the ffmpeg executable.
    pub ffmpeg_path: String,

    /// Timeout applied to every outbound network call.
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `SKYEMBED_BIND_ADDR`: Server bind address (default: "0.0.0.0:8080")
    /// - `SKYEMBED_BASE_URL`: Public base URL (default: "http://localhost:8080")
    /// - `SKYEMBED_SITE_NAME`: Site name (default: "skyembed")
    /// - `SKYEMBED_APPVIEW_URL`: AppView URL (default: "https://public.api.bsky.app")
    /// - `SKYEMBED_PLC_URL`: PLC directory (default: "https://plc.directory")
    /// - `SKYEMBED_DEFAULT_PDS`: Fallback PDS (default: "https://bsky.social")
    /// - `SKYEMBED_FFMPEG`: ffmpeg executable (default: "ffmpeg")
    /// - `SKYEMBED_HTTP_TIMEOUT_SECS`: Outbound call timeout in seconds (default: 10)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_or("SKYEMBED_BIND_ADDR", "0.0.0.0:8080");
        let base_url = trim_url(env_or("SKYEMBED_BASE_URL", "http://localhost:8080"));
        let site_name = env_or("SKYEMBED_SITE_NAME", "skyembed");
        let appview_url = trim_url(env_or("SKYEMBED_APPVIEW_URL", "https://public.api.bsky.app"));
        let plc_url = trim_url(env_or("SKYEMBED_PLC_URL", "https://plc.directory"));
        let default_pds = trim_url(env_or("SKYEMBED_DEFAULT_PDS", "https://bsky.social"));
        let ffmpeg_path = env_or("SKYEMBED_FFMPEG", "ffmpeg");

        let timeout_secs: u64 = env_or("SKYEMBED_HTTP_TIMEOUT_SECS", "10")
            .trim()
            .parse()
            .context("SKYEMBED_HTTP_TIMEOUT_SECS must be a whole number of seconds")?;
        if timeout_secs == 0 {
            anyhow::bail!("SKYEMBED_HTTP_TIMEOUT_SECS must be greater than zero");
        }

        tracing::info!(
            bind_addr = %bind_addr,
            base_url = %base_url,
            site_name = %site_name,
            appview_url = %appview_url,
            plc_url = %plc_url,
            ffmpeg = %ffmpeg_path,
            timeout_secs,
            "preview configuration loaded"
        );

        Ok(Self {
            bind_addr,
            base_url,
            site_name,
            appview_url,
            plc_url,
            default_pds,
            ffmpeg_path,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            base_url: "http://localhost:8080".to_string(),
            site_name: "skyembed".to_string(),
            appview_url: "https://public.api.bsky.app".to_string(),
            plc_url: "https://plc.directory".to_string(),
            default_pds: "https://bsky.social".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            http_timeout: Duration::from_secs(10),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
