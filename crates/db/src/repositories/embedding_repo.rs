//! Repository for the `screenshot_embeddings` table.
//!
//! Embeddings are stored as `REAL[]`, so they decode straight into `Vec<f32>`
//! with runtime queries. The allow-list is a `BIGINT[]` on each side of a pair.

use futures::stream::BoxStream;
use futures::TryStreamExt;
use hof_core::error::CoreError;
use hof_core::similarity::EmbeddingEntry;
use hof_core::types::DbId;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::embedding::EmbeddingRow;

pub struct EmbeddingRepo;

impl EmbeddingRepo {
    /// Stream every embedding in screenshot id order without buffering the table.
    pub fn stream_all(pool: &PgPool) -> BoxStream<'_, Result<EmbeddingRow, sqlx::Error>> {
        sqlx::query_as::<_, EmbeddingRow>(
            "SELECT screenshot_id, embedding, allowed_similarity_with_ids
             FROM screenshot_embeddings
             ORDER BY screenshot_id",
        )
        .fetch(pool)
    }

    /// Collect the streamed rows into scan input.
    pub async fn load_scan_entries(pool: &PgPool) -> Result<Vec<EmbeddingEntry>, sqlx::Error> {
        Self::stream_all(pool)
            .map_ok(EmbeddingEntry::from)
            .try_collect()
            .await
    }

    pub async fn find_by_screenshot(
        pool: &PgPool,
        screenshot_id: DbId,
    ) -> Result<Option<EmbeddingRow>, sqlx::Error> {
        sqlx::query_as::<_, EmbeddingRow>(
            "SELECT screenshot_id, embedding, allowed_similarity_with_ids
             FROM screenshot_embeddings
             WHERE screenshot_id = $1",
        )
        .bind(screenshot_id)
        .fetch_optional(pool)
        .await
    }

    /// Permanently mark `a` and `b` as not duplicates of each other.
    ///
    /// Adds each id to the other's allow-list in one transaction. Re-allowing
    /// an allowed pair changes nothing.
    pub async fn allow_similarity(pool: &PgPool, a: DbId, b: DbId) -> Result<(), StoreError> {
        if a == b {
            return Err(CoreError::Validation(format!(
                "Screenshot {a} cannot be allowed against itself"
            ))
            .into());
        }

        let mut tx = pool.begin().await?;

        let ids = if a < b { [a, b] } else { [b, a] };
        let locked: Vec<(DbId,)> = sqlx::query_as(
            "SELECT screenshot_id FROM screenshot_embeddings
             WHERE screenshot_id = ANY($1)
             ORDER BY screenshot_id
             FOR UPDATE",
        )
        .bind(&ids[..])
        .fetch_all(&mut *tx)
        .await?;

        if let Some(&missing) = ids.iter().find(|id| !locked.iter().any(|(l,)| l == *id)) {
            return Err(CoreError::NotFound {
                entity: "Screenshot",
                id: missing,
            }
            .into());
        }

        for (owner, other) in [(a, b), (b, a)] {
            sqlx::query(
                "UPDATE screenshot_embeddings
                 SET allowed_similarity_with_ids = array_append(allowed_similarity_with_ids, $2)
                 WHERE screenshot_id = $1 AND NOT ($2 = ANY(allowed_similarity_with_ids))",
            )
            .bind(owner)
            .bind(other)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(screenshot_a_id = a, screenshot_b_id = b, "Similarity allowed");
        Ok(())
    }
}
