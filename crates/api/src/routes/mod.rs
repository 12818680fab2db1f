pub mod admin;
pub mod health;
pub mod screenshots;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /screenshots/next                    select next screenshot (GET)
/// /screenshots/{id}                    fetch one (GET)
/// /screenshots/{id}/views              record a view (POST)
/// /screenshots/{id}/favorites          favorite, unfavorite (POST, DELETE)
///
/// /admin/duplicates                    scan for near-duplicates (GET)
/// /admin/duplicates/allow              suppress a pair (POST)
/// /admin/screenshots/merge             merge duplicates (POST)
/// /admin/screenshots/{id}              delete (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/screenshots", screenshots::router())
        .nest("/admin", admin::router())
}
