//! Planning for duplicate-screenshot merges.
//!
//! The store loads the loser screenshots' view and favorite rows together
//! with the creators that already engaged with the keeper, and this module
//! decides, row by row, whether each one is re-pointed to the keeper or
//! deleted. The store then applies the plan inside one transaction.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Keep `keeper_id`, fold every loser's engagement into it, delete the losers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeRequest {
    pub keeper_id: DbId,
    pub loser_ids: Vec<DbId>,
}

impl MergeRequest {
    pub fn new(keeper_id: DbId, loser_ids: Vec<DbId>) -> Self {
        Self {
            keeper_id,
            loser_ids,
        }
    }

    /// Shape checks that need no store access. Existence is checked by the store.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.loser_ids.is_empty() {
            return Err(CoreError::InvalidMergeRequest(
                "At least one screenshot to merge is required".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.loser_ids.len());
        for &id in &self.loser_ids {
            if id == self.keeper_id {
                return Err(CoreError::InvalidMergeRequest(format!(
                    "Screenshot {id} cannot be merged into itself"
                )));
            }
            if !seen.insert(id) {
                return Err(CoreError::InvalidMergeRequest(format!(
                    "Screenshot {id} is listed more than once"
                )));
            }
        }
        Ok(())
    }

    /// Keeper and losers, ascending. This is the row-lock order.
    pub fn involved_ids(&self) -> Vec<DbId> {
        let mut ids: Vec<DbId> = std::iter::once(self.keeper_id)
            .chain(self.loser_ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// A view or favorite row as far as merging is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementRow {
    pub id: DbId,
    pub screenshot_id: DbId,
    pub creator_id: DbId,
}

/// What happens to one engagement table's loser rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPlan {
    /// Row ids to re-point at the keeper.
    pub repoint: Vec<DbId>,
    /// Row ids to delete because the keeper already has that creator.
    pub delete: Vec<DbId>,
}

/// Decide each loser row's fate.
///
/// Losers are processed in `loser_ids` order and each loser's rows in id
/// order. A row is re-pointed if its creator has no row on the keeper yet,
/// counting rows re-pointed earlier in the same merge; otherwise it is deleted.
pub fn plan_rows(
    keeper_creators: impl IntoIterator<Item = DbId>,
    loser_ids: &[DbId],
    rows: &[EngagementRow],
) -> RowPlan {
    let mut live: HashSet<DbId> = keeper_creators.into_iter().collect();
    let mut plan = RowPlan::default();

    for &loser in loser_ids {
        let mut loser_rows: Vec<&EngagementRow> =
            rows.iter().filter(|r| r.screenshot_id == loser).collect();
        loser_rows.sort_by_key(|r| r.id);

        for row in loser_rows {
            if live.insert(row.creator_id) {
                plan.repoint.push(row.id);
            } else {
                plan.delete.push(row.id);
            }
        }
    }

    plan
}

/// Plans for both engagement tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub views: RowPlan,
    pub favorites: RowPlan,
}

impl MergePlan {
    pub fn build(
        request: &MergeRequest,
        keeper_view_creators: impl IntoIterator<Item = DbId>,
        loser_views: &[EngagementRow],
        keeper_favorite_creators: impl IntoIterator<Item = DbId>,
        loser_favorites: &[EngagementRow],
    ) -> Self {
        Self {
            views: plan_rows(keeper_view_creators, &request.loser_ids, loser_views),
            favorites: plan_rows(keeper_favorite_creators, &request.loser_ids, loser_favorites),
        }
    }

    pub fn outcome(&self) -> MergeOutcome {
        MergeOutcome {
            merged_favorites_count: self.favorites.repoint.len() as i64,
            deleted_favorites_count: self.favorites.delete.len() as i64,
            merged_views_count: self.views.repoint.len() as i64,
            deleted_views_count: self.views.delete.len() as i64,
        }
    }
}

/// Row counts reported back to the moderator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub merged_favorites_count: i64,
    pub deleted_favorites_count: i64,
    pub merged_views_count: i64,
    pub deleted_views_count: i64,
}
