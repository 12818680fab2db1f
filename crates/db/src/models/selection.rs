//! Eligible-pool rows for the selector.

use hof_core::selection::Candidate;
use hof_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// One eligible screenshot with the aggregates the strategies score on.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: DbId,
    pub created_at: Timestamp,
    pub views_count: i64,
    pub favorites_count: i64,
    pub recent_engagement: i64,
    pub creator_is_supporter: bool,
}

impl From<CandidateRow> for Candidate {
    fn from(row: CandidateRow) -> Self {
        Candidate {
            screenshot_id: row.id,
            created_at: row.created_at,
            views_count: row.views_count,
            favorites_count: row.favorites_count,
            recent_engagement: row.recent_engagement,
            creator_is_supporter: row.creator_is_supporter,
        }
    }
}
