//! Handlers for near-duplicate screenshot detection (moderators only).
//!
//! A scan re-reads every embedding and compares pairs on a blocking thread,
//! holding only the closest `limit` candidates.

use axum::extract::{Query, State};
use axum::Json;
use hof_core::pagination::{clamp_limit, DEFAULT_SCAN_LIMIT};
use hof_core::similarity::{self, DistanceMetric, DuplicateCandidate};
use hof_db::models::embedding::AllowSimilarityRequest;
use hof_db::repositories::EmbeddingRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireModerator;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DuplicateScanQuery {
    pub limit: Option<i64>,
    /// Overrides the configured threshold for this scan only.
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DuplicateScanResult {
    pub metric: DistanceMetric,
    pub threshold: f64,
    pub candidates: Vec<DuplicateCandidate>,
}

#[derive(Debug, Serialize)]
pub struct SimilarityAllowed {
    pub screenshot_a_id: i64,
    pub screenshot_b_id: i64,
}

/// GET /api/v1/admin/duplicates
///
/// Candidate near-duplicate pairs in ascending distance order.
pub async fn scan_duplicates(
    State(state): State<AppState>,
    RequireModerator(user): RequireModerator,
    Query(query): Query<DuplicateScanQuery>,
) -> AppResult<Json<DataResponse<DuplicateScanResult>>> {
    let engine = &state.config.engine;
    let limit = clamp_limit(
        query.limit,
        DEFAULT_SCAN_LIMIT,
        engine.duplicate_scan_max_limit,
    ) as usize;
    let options = engine.scan_options(
        query.threshold.unwrap_or(engine.similarity_threshold),
        Some(limit),
    );
    options.validate()?;

    let entries = EmbeddingRepo::load_scan_entries(&state.pool).await?;
    let corpus_size = entries.len();

    let scan_options = options.clone();
    let candidates = tokio::task::spawn_blocking(move || {
        similarity::scan(&entries, &scan_options).map(|scan| scan.collect::<Vec<_>>())
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Duplicate scan task failed: {e}")))??;

    tracing::info!(
        moderator_id = user.creator_id,
        corpus_size,
        returned = candidates.len(),
        threshold = options.threshold,
        metric = %options.metric,
        "Duplicate scan completed",
    );

    Ok(Json(DataResponse {
        data: DuplicateScanResult {
            metric: options.metric,
            threshold: options.threshold,
            candidates,
        },
    }))
}

/// POST /api/v1/admin/duplicates/allow
///
/// Permanently suppress a pair from future scans.
pub async fn allow_similarity(
    State(state): State<AppState>,
    RequireModerator(user): RequireModerator,
    Json(body): Json<AllowSimilarityRequest>,
) -> AppResult<Json<DataResponse<SimilarityAllowed>>> {
    EmbeddingRepo::allow_similarity(&state.pool, body.screenshot_a_id, body.screenshot_b_id)
        .await?;

    tracing::info!(
        moderator_id = user.creator_id,
        screenshot_a_id = body.screenshot_a_id,
        screenshot_b_id = body.screenshot_b_id,
        "Pair allowed by moderator",
    );

    Ok(Json(DataResponse {
        data: SimilarityAllowed {
            screenshot_a_id: body.screenshot_a_id.min(body.screenshot_b_id),
            screenshot_b_id: body.screenshot_a_id.max(body.screenshot_b_id),
        },
    }))
}
