//! Handlers for serving screenshots to viewers.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use hof_core::error::CoreError;
use hof_core::selection::{self, Candidate, Strategy, StrategyWeights};
use hof_core::types::DbId;
use hof_db::models::screenshot::Screenshot;
use hof_db::repositories::{ScreenshotRepo, SelectionRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::OptionalViewer;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameters / responses
// ---------------------------------------------------------------------------

/// Per-strategy weights plus the anti-repeat window. Omitted weights are zero.
#[derive(Debug, Default, Deserialize)]
pub struct NextScreenshotQuery {
    pub random: Option<u32>,
    pub popular: Option<u32>,
    pub trending: Option<u32>,
    pub recent: Option<u32>,
    pub archeologist: Option<u32>,
    pub supporter: Option<u32>,
    pub view_max_age_days: Option<u32>,
}

impl NextScreenshotQuery {
    pub fn weights(&self) -> StrategyWeights {
        [
            (Strategy::Random, self.random),
            (Strategy::Popular, self.popular),
            (Strategy::Trending, self.trending),
            (Strategy::Recent, self.recent),
            (Strategy::Archeologist, self.archeologist),
            (Strategy::Supporter, self.supporter),
        ]
        .into_iter()
        .map(|(strategy, weight)| (strategy, weight.unwrap_or(0)))
        .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct NextScreenshot {
    pub screenshot: Screenshot,
    /// Strategy that produced the screenshot (`random` after a fallback).
    pub strategy: Strategy,
    pub fell_back: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/screenshots/next
///
/// Pick the next screenshot for the (optional) viewer. Responds with
/// `{ "data": null }` when nothing is eligible.
pub async fn next_screenshot(
    State(state): State<AppState>,
    viewer: OptionalViewer,
    Query(query): Query<NextScreenshotQuery>,
) -> AppResult<Json<DataResponse<Option<NextScreenshot>>>> {
    let engine = &state.config.engine;
    let now = Utc::now();
    let view_max_age_days = query
        .view_max_age_days
        .unwrap_or(engine.default_view_max_age_days);

    let rows = SelectionRepo::eligible_pool(
        &state.pool,
        viewer.creator_id(),
        selection::seen_cutoff(now, view_max_age_days),
        engine.scoring.trending_since(now),
    )
    .await?;
    let candidates: Vec<Candidate> = rows.into_iter().map(Candidate::from).collect();

    let picked = selection::select(
        &query.weights(),
        &candidates,
        now,
        &engine.scoring,
        &mut rand::rng(),
    );
    let picked = match picked {
        Ok(picked) => picked,
        Err(CoreError::NoEligibleContent) => {
            tracing::debug!(viewer_id = ?viewer.creator_id(), "No eligible content");
            return Ok(Json(DataResponse { data: None }));
        }
        Err(e) => return Err(e.into()),
    };

    let screenshot = ScreenshotRepo::find_by_id(&state.pool, picked.screenshot_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Screenshot",
            id: picked.screenshot_id,
        }))?;

    tracing::debug!(
        screenshot_id = screenshot.id,
        strategy = %picked.strategy,
        requested = %picked.requested_strategy,
        fell_back = picked.fell_back,
        pool_size = candidates.len(),
        "Screenshot selected",
    );

    Ok(Json(DataResponse {
        data: Some(NextScreenshot {
            screenshot,
            strategy: picked.strategy,
            fell_back: picked.fell_back,
        }),
    }))
}

/// GET /api/v1/screenshots/{id}
pub async fn get_screenshot(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Screenshot>>> {
    let screenshot = ScreenshotRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Screenshot",
            id,
        }))?;
    Ok(Json(DataResponse { data: screenshot }))
}
