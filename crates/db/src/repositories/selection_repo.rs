//! Eligible-pool query for the selector.

use hof_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::selection::CandidateRow;
use crate::repositories::ban_repo::ACTIVE_BAN;

pub struct SelectionRepo;

impl SelectionRepo {
    /// Screenshots a viewer may be shown right now, with strategy aggregates.
    ///
    /// Excludes reported screenshots and screenshots of actively banned
    /// creators. When both `viewer_id` and `seen_since` are given, also
    /// excludes every screenshot the viewer viewed after `seen_since`.
    /// `recent_engagement` counts views and favorites after `trending_since`.
    pub async fn eligible_pool(
        pool: &PgPool,
        viewer_id: Option<DbId>,
        seen_since: Option<Timestamp>,
        trending_since: Timestamp,
    ) -> Result<Vec<CandidateRow>, sqlx::Error> {
        let query = format!(
            "SELECT s.id, s.created_at, s.views_count, s.favorites_count,
                    (COALESCE(rv.n, 0) + COALESCE(rf.n, 0))::BIGINT AS recent_engagement,
                    c.is_supporter AS creator_is_supporter
             FROM screenshots s
             JOIN creators c ON c.id = s.creator_id
             LEFT JOIN (
                 SELECT screenshot_id, COUNT(*) AS n FROM views
                 WHERE viewed_at > $3 GROUP BY screenshot_id
             ) rv ON rv.screenshot_id = s.id
             LEFT JOIN (
                 SELECT screenshot_id, COUNT(*) AS n FROM favorites
                 WHERE favorited_at > $3 GROUP BY screenshot_id
             ) rf ON rf.screenshot_id = s.id
             WHERE NOT s.is_reported
               AND NOT EXISTS (
                   SELECT 1 FROM bans b WHERE b.creator_id = s.creator_id AND {ACTIVE_BAN}
               )
               AND ($1::BIGINT IS NULL OR $2::TIMESTAMPTZ IS NULL OR NOT EXISTS (
                   SELECT 1 FROM views v
                   WHERE v.screenshot_id = s.id AND v.creator_id = $1 AND v.viewed_at > $2
               ))
             ORDER BY s.id"
        );
        sqlx::query_as::<_, CandidateRow>(&query)
            .bind(viewer_id)
            .bind(seen_since)
            .bind(trending_since)
            .fetch_all(pool)
            .await
    }
}
