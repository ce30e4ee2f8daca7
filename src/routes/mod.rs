mod webhook;

pub use webhook::{health, receive_upload};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::client::MAX_TOTAL_SIZE;

/// Router for the webhook receiver. The body limit sits above the 50 MiB
/// aggregate upload cap so the framework does not reject valid
/// submissions before discovery runs.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(receive_upload))
        .route("/webhook/:hook_id", post(receive_upload))
        .layer(DefaultBodyLimit::max((MAX_TOTAL_SIZE + 5 * 1024 * 1024) as usize))
}
