//! View and favorite rows.

use hof_core::merge::EngagementRow;
use hof_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `views` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct View {
    pub id: DbId,
    pub screenshot_id: DbId,
    pub creator_id: DbId,
    pub viewed_at: Timestamp,
}

/// A row from the `favorites` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Favorite {
    pub id: DbId,
    pub screenshot_id: DbId,
    pub creator_id: DbId,
    pub favorited_at: Timestamp,
}

/// The `(id, screenshot_id, creator_id)` projection merges plan over.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct EngagementKey {
    pub id: DbId,
    pub screenshot_id: DbId,
    pub creator_id: DbId,
}

impl From<EngagementKey> for EngagementRow {
    fn from(key: EngagementKey) -> Self {
        EngagementRow {
            id: key.id,
            screenshot_id: key.screenshot_id,
            creator_id: key.creator_id,
        }
    }
}

/// Result of recording a view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewRecorded {
    pub view: View,
    /// True when this was the viewer's first view of the screenshot.
    pub first_view: bool,
}
