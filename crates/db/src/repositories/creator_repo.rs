//! Repository for the `creators` table.

use hof_core::types::DbId;
use sqlx::PgPool;

use crate::models::creator::{CreateCreator, Creator};

const COLUMNS: &str = "id, creator_name, is_supporter, created_at, updated_at";

pub struct CreatorRepo;

impl CreatorRepo {
    pub async fn create(pool: &PgPool, input: &CreateCreator) -> Result<Creator, sqlx::Error> {
        let query = format!(
            "INSERT INTO creators (creator_name, is_supporter)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Creator>(&query)
            .bind(&input.creator_name)
            .bind(input.is_supporter)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Creator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM creators WHERE id = $1");
        sqlx::query_as::<_, Creator>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Flip the supporter flag. Returns `true` if the creator exists.
    pub async fn set_supporter(
        pool: &PgPool,
        id: DbId,
        is_supporter: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE creators SET is_supporter = $2 WHERE id = $1")
            .bind(id)
            .bind(is_supporter)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
