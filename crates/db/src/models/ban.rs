//! Ban entity model and DTOs.

use hof_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `bans` table. `expires_at = None` never expires.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ban {
    pub id: DbId,
    pub creator_id: Option<DbId>,
    pub hardware_id: Option<String>,
    pub ip_address: Option<String>,
    pub reason: String,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBan {
    pub creator_id: Option<DbId>,
    pub hardware_id: Option<String>,
    pub ip_address: Option<String>,
    pub reason: String,
    pub expires_at: Option<Timestamp>,
}
