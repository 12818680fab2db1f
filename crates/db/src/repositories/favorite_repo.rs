//! Repository for the `favorites` table.
//!
//! Both directions are idempotent: the counter only moves when a row is
//! actually inserted or deleted.

use hof_core::error::CoreError;
use hof_core::types::DbId;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::engagement::Favorite;
use crate::repositories::view_repo::lock_screenshot;
use crate::repositories::BanRepo;

const COLUMNS: &str = "id, screenshot_id, creator_id, favorited_at";

pub struct FavoriteRepo;

impl FavoriteRepo {
    /// Favorite a screenshot. Returns `false` if it was already favorited.
    pub async fn add(
        pool: &PgPool,
        screenshot_id: DbId,
        creator_id: DbId,
    ) -> Result<bool, StoreError> {
        if BanRepo::is_creator_banned(pool, creator_id).await? {
            return Err(CoreError::Forbidden(format!("Creator {creator_id} is banned")).into());
        }

        let mut tx = pool.begin().await?;
        lock_screenshot(&mut tx, screenshot_id).await?;

        let inserted: Option<(DbId,)> = sqlx::query_as(
            "INSERT INTO favorites (screenshot_id, creator_id)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_favorites_screenshot_creator DO NOTHING
             RETURNING id",
        )
        .bind(screenshot_id)
        .bind(creator_id)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_some() {
            sqlx::query("UPDATE screenshots SET favorites_count = favorites_count + 1 WHERE id = $1")
                .bind(screenshot_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(inserted.is_some())
    }

    /// Remove a favorite. Returns `false` if there was none.
    pub async fn remove(
        pool: &PgPool,
        screenshot_id: DbId,
        creator_id: DbId,
    ) -> Result<bool, StoreError> {
        let mut tx = pool.begin().await?;
        lock_screenshot(&mut tx, screenshot_id).await?;

        let result = sqlx::query("DELETE FROM favorites WHERE screenshot_id = $1 AND creator_id = $2")
            .bind(screenshot_id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;
        let removed = result.rows_affected() > 0;

        if removed {
            sqlx::query(
                "UPDATE screenshots SET favorites_count = GREATEST(favorites_count - 1, 0)
                 WHERE id = $1",
            )
            .bind(screenshot_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    pub async fn list_for_screenshot(
        pool: &PgPool,
        screenshot_id: DbId,
    ) -> Result<Vec<Favorite>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM favorites WHERE screenshot_id = $1 ORDER BY id");
        sqlx::query_as::<_, Favorite>(&query)
            .bind(screenshot_id)
            .fetch_all(pool)
            .await
    }
}
