//! Repository for the `bans` table.

use hof_core::types::DbId;
use sqlx::PgPool;

use crate::models::ban::{Ban, CreateBan};

const COLUMNS: &str = "id, creator_id, hardware_id, ip_address, reason, expires_at, created_at";

/// SQL predicate for a ban that is still in force. Expects the table alias `b`.
pub(crate) const ACTIVE_BAN: &str = "(b.expires_at IS NULL OR b.expires_at > NOW())";

pub struct BanRepo;

impl BanRepo {
    pub async fn create(pool: &PgPool, input: &CreateBan) -> Result<Ban, sqlx::Error> {
        let query = format!(
            "INSERT INTO bans (creator_id, hardware_id, ip_address, reason, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ban>(&query)
            .bind(input.creator_id)
            .bind(&input.hardware_id)
            .bind(&input.ip_address)
            .bind(&input.reason)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Whether `creator_id` has at least one active ban.
    pub async fn is_creator_banned(pool: &PgPool, creator_id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM bans b WHERE b.creator_id = $1 AND {ACTIVE_BAN})"
        );
        let (banned,): (bool,) = sqlx::query_as(&query)
            .bind(creator_id)
            .fetch_one(pool)
            .await?;
        Ok(banned)
    }
}
