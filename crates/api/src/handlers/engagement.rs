//! Handlers for viewer engagement: views and favorites.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hof_core::types::DbId;
use hof_db::repositories::{FavoriteRepo, ViewRepo};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FavoriteChange {
    pub screenshot_id: DbId,
    /// False when the request was a no-op (already favorited / not favorited).
    pub changed: bool,
}

/// POST /api/v1/screenshots/{id}/views
pub async fn record_view(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let recorded = ViewRepo::record(&state.pool, id, user.creator_id, None).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: recorded })))
}

/// POST /api/v1/screenshots/{id}/favorites
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<FavoriteChange>>> {
    let changed = FavoriteRepo::add(&state.pool, id, user.creator_id).await?;
    Ok(Json(DataResponse {
        data: FavoriteChange {
            screenshot_id: id,
            changed,
        },
    }))
}

/// DELETE /api/v1/screenshots/{id}/favorites
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<FavoriteChange>>> {
    let changed = FavoriteRepo::remove(&state.pool, id, user.creator_id).await?;
    Ok(Json(DataResponse {
        data: FavoriteChange {
            screenshot_id: id,
            changed,
        },
    }))
}
