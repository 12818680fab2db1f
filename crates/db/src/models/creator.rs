//! Creator entity model and DTOs.

use hof_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `creators` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Creator {
    pub id: DbId,
    pub creator_name: String,
    pub is_supporter: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCreator {
    pub creator_name: String,
    #[serde(default)]
    pub is_supporter: bool,
}
