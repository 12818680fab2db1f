//! Feature embedding rows from `screenshot_embeddings`.

use hof_core::similarity::EmbeddingEntry;
use hof_core::types::DbId;
use serde::Deserialize;
use sqlx::FromRow;

/// The columns the duplicate scan needs. `REAL[]` maps to `Vec<f32>`.
#[derive(Debug, Clone, FromRow)]
pub struct EmbeddingRow {
    pub screenshot_id: DbId,
    pub embedding: Vec<f32>,
    pub allowed_similarity_with_ids: Vec<DbId>,
}

impl From<EmbeddingRow> for EmbeddingEntry {
    fn from(row: EmbeddingRow) -> Self {
        EmbeddingEntry {
            screenshot_id: row.screenshot_id,
            embedding: row.embedding,
            allowed_similarity_with_ids: row.allowed_similarity_with_ids,
        }
    }
}

/// Request body for permanently allowing a similar pair.
#[derive(Debug, Clone, Deserialize)]
pub struct AllowSimilarityRequest {
    pub screenshot_a_id: DbId,
    pub screenshot_b_id: DbId,
}
