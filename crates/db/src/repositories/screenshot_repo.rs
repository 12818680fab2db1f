//! Repository for the `screenshots` table.
//!
//! Screenshots and their embeddings are written together and deleted
//! together (the embedding row cascades).

use hof_core::similarity::validate_embedding;
use hof_core::types::DbId;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::screenshot::{CreateScreenshot, Screenshot};

const COLUMNS: &str = "id, creator_id, city_name, city_milestone, city_population, \
    views_count, unique_views_count, favorites_count, is_reported, is_approved, \
    showcased_mod_id, created_at, updated_at";

pub struct ScreenshotRepo;

impl ScreenshotRepo {
    /// Insert a screenshot and its feature embedding in one transaction.
    pub async fn create_with_embedding(
        pool: &PgPool,
        input: &CreateScreenshot,
    ) -> Result<Screenshot, StoreError> {
        validate_embedding(&input.embedding)?;

        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO screenshots
                (creator_id, city_name, city_milestone, city_population, showcased_mod_id, created_at)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()))
             RETURNING {COLUMNS}"
        );
        let screenshot = sqlx::query_as::<_, Screenshot>(&query)
            .bind(input.creator_id)
            .bind(&input.city_name)
            .bind(input.city_milestone)
            .bind(input.city_population)
            .bind(input.showcased_mod_id)
            .bind(input.created_at)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO screenshot_embeddings (screenshot_id, embedding) VALUES ($1, $2)")
            .bind(screenshot.id)
            .bind(&input.embedding)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(screenshot)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Screenshot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM screenshots WHERE id = $1");
        sqlx::query_as::<_, Screenshot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Flag or unflag a screenshot as reported. Reported screenshots leave every pool.
    pub async fn set_reported(
        pool: &PgPool,
        id: DbId,
        is_reported: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE screenshots SET is_reported = $2 WHERE id = $1")
            .bind(id)
            .bind(is_reported)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a screenshot. Its embedding, views and favorites
    /// cascade. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM screenshots WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
