//! Viewer-facing screenshot routes, nested at `/screenshots`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{discovery, engagement};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/next", get(discovery::next_screenshot))
        .route("/{id}", get(discovery::get_screenshot))
        .route("/{id}/views", post(engagement::record_view))
        .route(
            "/{id}/favorites",
            post(engagement::add_favorite).delete(engagement::remove_favorite),
        )
}
