//! Moderator routes, nested at `/admin`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{duplicates, moderation};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/duplicates", get(duplicates::scan_duplicates))
        .route("/duplicates/allow", post(duplicates::allow_similarity))
        .route("/screenshots/merge", post(moderation::merge_screenshots))
        .route("/screenshots/{id}", delete(moderation::delete_screenshot))
}
