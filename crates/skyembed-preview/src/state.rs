//! Application state shared across all request handlers.

use std::sync::Arc;

use anyhow::Context;

use crate::api::AppView;
use crate::config::Config;
use crate::identity::IdentityResolver;
use crate::mosaic::Compositor;

const USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    " (+",
    env!("CARGO_PKG_REPOSITORY"),
    ")"
);

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// AppView client.
    pub appview: AppView,

    /// Handle and DID document resolution.
    pub identity: Arc<IdentityResolver>,

    /// ffmpeg-backed image mosaic builder.
    pub compositor: Compositor,
}

impl AppState {
    /// Create a new application state from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;

        let appview = AppView::new(http.clone(), &config.appview_url);
        let identity = IdentityResolver::from_config(&config, http, appview.clone());
        let compositor = Compositor::new(&config.ffmpeg_path);

        tracing::info!(
            appview_url = %config.appview_url,
            timeout_secs = config.http_timeout.as_secs(),
            user_agent = USER_AGENT,
            "application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            appview,
            identity: Arc::new(identity),
            compositor,
        })
    }
}
