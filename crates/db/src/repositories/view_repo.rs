//! Repository for the `views` table.

use hof_core::error::CoreError;
use hof_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::StoreError;
use crate::models::engagement::{View, ViewRecorded};
use crate::repositories::BanRepo;

const COLUMNS: &str = "id, screenshot_id, creator_id, viewed_at";

pub struct ViewRepo;

impl ViewRepo {
    /// Record that `creator_id` viewed `screenshot_id`.
    ///
    /// Bumps `views_count` always and `unique_views_count` only for the
    /// viewer's first view. The screenshot row is locked for the duration so
    /// concurrent first views cannot both count as unique.
    pub async fn record(
        pool: &PgPool,
        screenshot_id: DbId,
        creator_id: DbId,
        viewed_at: Option<Timestamp>,
    ) -> Result<ViewRecorded, StoreError> {
        if BanRepo::is_creator_banned(pool, creator_id).await? {
            return Err(CoreError::Forbidden(format!("Creator {creator_id} is banned")).into());
        }

        let mut tx = pool.begin().await?;
        lock_screenshot(&mut tx, screenshot_id).await?;

        let (seen_before,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM views WHERE screenshot_id = $1 AND creator_id = $2)",
        )
        .bind(screenshot_id)
        .bind(creator_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO views (screenshot_id, creator_id, viewed_at)
             VALUES ($1, $2, COALESCE($3, NOW()))
             RETURNING {COLUMNS}"
        );
        let view = sqlx::query_as::<_, View>(&query)
            .bind(screenshot_id)
            .bind(creator_id)
            .bind(viewed_at)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE screenshots SET
                views_count = views_count + 1,
                unique_views_count = unique_views_count + CASE WHEN $2 THEN 0 ELSE 1 END
             WHERE id = $1",
        )
        .bind(screenshot_id)
        .bind(seen_before)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(screenshot_id, creator_id, first_view = !seen_before, "View recorded");
        Ok(ViewRecorded {
            view,
            first_view: !seen_before,
        })
    }

    pub async fn list_for_screenshot(
        pool: &PgPool,
        screenshot_id: DbId,
    ) -> Result<Vec<View>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM views WHERE screenshot_id = $1 ORDER BY id");
        sqlx::query_as::<_, View>(&query)
            .bind(screenshot_id)
            .fetch_all(pool)
            .await
    }
}

/// `SELECT ... FOR UPDATE` on one screenshot, failing with `NotFound` if absent.
pub(crate) async fn lock_screenshot(
    tx: &mut Transaction<'_, Postgres>,
    screenshot_id: DbId,
) -> Result<(), StoreError> {
    let found: Option<(DbId,)> = sqlx::query_as("SELECT id FROM screenshots WHERE id = $1 FOR UPDATE")
        .bind(screenshot_id)
        .fetch_optional(&mut **tx)
        .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(CoreError::NotFound {
            entity: "Screenshot",
            id: screenshot_id,
        }
        .into()),
    }
}
