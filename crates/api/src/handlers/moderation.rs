//! Handlers for moderator actions on screenshots: merges and deletion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hof_core::error::CoreError;
use hof_core::merge::{MergeOutcome, MergeRequest};
use hof_core::types::DbId;
use hof_db::repositories::{MergeRepo, ScreenshotRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireModerator;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/screenshots/merge
///
/// Fold the losers' engagement into the keeper and delete the losers.
/// Overlapping concurrent merges are rejected with 409 and may be retried.
pub async fn merge_screenshots(
    State(state): State<AppState>,
    RequireModerator(user): RequireModerator,
    Json(request): Json<MergeRequest>,
) -> AppResult<Json<DataResponse<MergeOutcome>>> {
    request.validate()?;

    let _guard = state.merge_locks.try_acquire(&request.involved_ids())?;
    let outcome = MergeRepo::merge(&state.pool, &request).await?;

    tracing::info!(
        moderator_id = user.creator_id,
        keeper_id = request.keeper_id,
        loser_ids = ?request.loser_ids,
        "Merge completed",
    );

    Ok(Json(DataResponse { data: outcome }))
}

/// DELETE /api/v1/admin/screenshots/{id}
///
/// Remove a screenshot with its embedding, views and favorites.
pub async fn delete_screenshot(
    State(state): State<AppState>,
    RequireModerator(user): RequireModerator,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let _guard = state.merge_locks.try_acquire(&[id])?;

    if !ScreenshotRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Screenshot",
            id,
        }));
    }

    tracing::info!(moderator_id = user.creator_id, screenshot_id = id, "Screenshot deleted");
    Ok(StatusCode::NO_CONTENT)
}
