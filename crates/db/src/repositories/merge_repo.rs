//! Transactional merge of duplicate screenshots into a keeper.

use hof_core::error::CoreError;
use hof_core::merge::{EngagementRow, MergeOutcome, MergePlan, MergeRequest};
use hof_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::StoreError;
use crate::models::engagement::EngagementKey;

/// Tables whose rows follow a screenshot through a merge.
const ENGAGEMENT_TABLES: [&str; 2] = ["views", "favorites"];

pub struct MergeRepo;

impl MergeRepo {
    /// Fold every loser's views and favorites into the keeper and delete the losers.
    ///
    /// Runs in a single transaction. The involved screenshot rows are locked
    /// `FOR UPDATE NOWAIT` in id order, so a concurrent merge over any of the
    /// same ids fails fast with `TransactionConflict` and nothing is written.
    pub async fn merge(pool: &PgPool, request: &MergeRequest) -> Result<MergeOutcome, StoreError> {
        request.validate()?;
        let ids = request.involved_ids();

        let mut tx = pool.begin().await?;

        let locked: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM screenshots WHERE id = ANY($1) ORDER BY id FOR UPDATE NOWAIT",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        if locked.len() != ids.len() {
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !locked.iter().any(|(l,)| l == *id))
                .map(ToString::to_string)
                .collect();
            return Err(CoreError::InvalidMergeRequest(format!(
                "Unknown screenshot ids: {}",
                missing.join(", ")
            ))
            .into());
        }

        let [views, favorites] = ENGAGEMENT_TABLES;
        let keeper_viewers = keeper_creators(&mut tx, views, request.keeper_id).await?;
        let loser_views = loser_rows(&mut tx, views, &request.loser_ids).await?;
        let keeper_favoriters = keeper_creators(&mut tx, favorites, request.keeper_id).await?;
        let loser_favorites = loser_rows(&mut tx, favorites, &request.loser_ids).await?;

        let plan = MergePlan::build(
            request,
            keeper_viewers,
            &loser_views,
            keeper_favoriters,
            &loser_favorites,
        );

        // Deletes first so re-pointed favorites never collide on the unique key.
        for (table, rows) in [(views, &plan.views), (favorites, &plan.favorites)] {
            if !rows.delete.is_empty() {
                sqlx::query(&format!("DELETE FROM {table} WHERE id = ANY($1)"))
                    .bind(&rows.delete)
                    .execute(&mut *tx)
                    .await?;
            }
            if !rows.repoint.is_empty() {
                sqlx::query(&format!("UPDATE {table} SET screenshot_id = $1 WHERE id = ANY($2)"))
                    .bind(request.keeper_id)
                    .bind(&rows.repoint)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query(
            "UPDATE screenshots SET
                views_count = (SELECT COUNT(*) FROM views WHERE screenshot_id = $1),
                unique_views_count = (SELECT COUNT(DISTINCT creator_id) FROM views WHERE screenshot_id = $1),
                favorites_count = (SELECT COUNT(*) FROM favorites WHERE screenshot_id = $1)
             WHERE id = $1",
        )
        .bind(request.keeper_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM screenshots WHERE id = ANY($1)")
            .bind(&request.loser_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let outcome = plan.outcome();
        tracing::info!(
            keeper_id = request.keeper_id,
            losers = request.loser_ids.len(),
            merged_views = outcome.merged_views_count,
            deleted_views = outcome.deleted_views_count,
            merged_favorites = outcome.merged_favorites_count,
            deleted_favorites = outcome.deleted_favorites_count,
            "Screenshots merged",
        );
        Ok(outcome)
    }
}

async fn keeper_creators(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    keeper_id: DbId,
) -> Result<Vec<DbId>, sqlx::Error> {
    let rows: Vec<(DbId,)> = sqlx::query_as(&format!(
        "SELECT DISTINCT creator_id FROM {table} WHERE screenshot_id = $1"
    ))
    .bind(keeper_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

async fn loser_rows(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    loser_ids: &[DbId],
) -> Result<Vec<EngagementRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EngagementKey>(&format!(
        "SELECT id, screenshot_id, creator_id FROM {table}
         WHERE screenshot_id = ANY($1)
         ORDER BY id
         FOR UPDATE"
    ))
    .bind(loser_ids)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows.into_iter().map(EngagementRow::from).collect())
}
