//! Screenshot entity model and DTOs.

use hof_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `screenshots` table.
///
/// The three counters are denormalised aggregates of the `views` and
/// `favorites` rows and are only written by the engagement and merge paths.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Screenshot {
    pub id: DbId,
    pub creator_id: DbId,
    pub city_name: String,
    pub city_milestone: i32,
    pub city_population: i32,
    pub views_count: i64,
    pub unique_views_count: i64,
    pub favorites_count: i64,
    pub is_reported: bool,
    pub is_approved: bool,
    pub showcased_mod_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for ingesting a screenshot together with its feature embedding.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScreenshot {
    pub creator_id: DbId,
    pub city_name: String,
    #[serde(default)]
    pub city_milestone: i32,
    #[serde(default)]
    pub city_population: i32,
    pub showcased_mod_id: Option<DbId>,
    pub embedding: Vec<f32>,
    /// Backdated upload time; defaults to now.
    pub created_at: Option<Timestamp>,
}
