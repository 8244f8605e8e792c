//! Index route: sends visitors to the project page.

use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

pub const PROJECT_URL: &str = env!("CARGO_PKG_REPOSITORY");

/// `GET /` answers with a `302 Found` to the project page.
pub async fn index() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, PROJECT_URL)])
}
