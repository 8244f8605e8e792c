//! Error types for the preview service.
//!
//! Errors are rendered as a single HTML error page carrying a short,
//! operation-prefixed message, since the consumers are link-preview crawlers
//! and people clicking through from chat clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, html};

use crate::mosaic::MosaicError;

/// Failure of a single outbound call against the AppView.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The call did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS or protocol failure.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("unexpected status ({0})")]
    Status(reqwest::StatusCode),

    /// The body was not the expected document.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Request(err)
        }
    }
}

/// Preview service error type.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// An AppView call failed; `op` names the handler that issued it.
    #[error("{op}: {source}")]
    Upstream {
        op: &'static str,
        #[source]
        source: FetchError,
    },

    /// The requested view does not apply to this embed kind.
    #[error("{0}: Invalid type")]
    InvalidType(&'static str),

    /// The embed has no media that a raw link could point at.
    #[error("{0}: No suitable media found")]
    NoSuitableMedia(&'static str),

    /// The image compositor failed.
    #[error(transparent)]
    Mosaic(#[from] MosaicError),

    /// Malformed query parameters.
    #[error("{0}")]
    BadRequest(String),

    /// No route matched the request path.
    #[error("route not found")]
    RouteNotFound,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PreviewError {
    /// Wrap a fetch failure with the name of the operation that issued it.
    pub fn upstream(op: &'static str, source: FetchError) -> Self {
        Self::Upstream { op, source }
    }

    /// The message shown on the error page.
    pub fn user_message(&self) -> String {
        match self {
            Self::Upstream { op, source } => match source {
                FetchError::Timeout => {
                    format!("{op}: Bluesky took too long to respond (timeout exceeded)")
                }
                FetchError::Request(_) => format!("{op}: Failed to do request"),
                FetchError::Status(status) => format!("{op}: Unexpected status ({status})"),
                FetchError::Decode(_) => format!("{op}: Failed to decode response"),
            },
            Self::Mosaic(MosaicError::NoImages) => "genMosaic: No images".to_string(),
            Self::Mosaic(_) => "genMosaic: Failed to run".to_string(),
            Self::Internal(_) => "An internal error occurred. Please try again later.".to_string(),
            other => other.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Upstream {
                source: FetchError::Timeout,
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::InvalidType(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoSuitableMedia(_) | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Mosaic(MosaicError::NoImages) => StatusCode::NOT_FOUND,
            Self::Mosaic(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PreviewError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::Upstream { source, .. } => {
                tracing::warn!(error = %source, "upstream fetch failed");
            }
            Self::Mosaic(err) => tracing::error!(error = %err, "mosaic generation failed"),
            Self::Internal(err) => tracing::error!(error = %err, "internal server error"),
            _ => {}
        }

        let message = self.user_message();

        if let Self::BadRequest(_) = self {
            return (status, message).into_response();
        }

        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { "Error" }
                    meta name="robots" content="noindex";
                    meta property="og:title" content="Error";
                    meta property="og:description" content=(message);
                    style { (maud::PreEscaped(crate::render::components::ERROR_CSS)) }
                }
                body {
                    main class="error-page" {
                        h1 { "Something went wrong" }
                        p { (message) }
                    }
                }
            }
        };

        (status, markup).into_response()
    }
}
