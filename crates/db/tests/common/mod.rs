//! Fixtures shared by the store integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use hof_core::types::DbId;
use hof_db::models::creator::CreateCreator;
use hof_db::models::screenshot::CreateScreenshot;
use hof_db::repositories::{CreatorRepo, ScreenshotRepo};
use sqlx::PgPool;

pub async fn creator(pool: &PgPool, name: &str) -> DbId {
    CreatorRepo::create(
        pool,
        &CreateCreator {
            creator_name: name.to_string(),
            is_supporter: false,
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn supporter(pool: &PgPool, name: &str) -> DbId {
    let id = creator(pool, name).await;
    CreatorRepo::set_supporter(pool, id, true).await.unwrap();
    id
}

pub fn new_screenshot(creator_id: DbId, embedding: Vec<f32>) -> CreateScreenshot {
    CreateScreenshot {
        creator_id,
        city_name: "Testopolis".to_string(),
        city_milestone: 3,
        city_population: 12_000,
        showcased_mod_id: None,
        embedding,
        created_at: None,
    }
}

pub async fn screenshot(pool: &PgPool, creator_id: DbId) -> DbId {
    screenshot_with_embedding(pool, creator_id, vec![1.0, 0.0, 0.0]).await
}

pub async fn screenshot_with_embedding(
    pool: &PgPool,
    creator_id: DbId,
    embedding: Vec<f32>,
) -> DbId {
    ScreenshotRepo::create_with_embedding(pool, &new_screenshot(creator_id, embedding))
        .await
        .unwrap()
        .id
}

pub async fn screenshot_aged(pool: &PgPool, creator_id: DbId, age_days: i64) -> DbId {
    let mut input = new_screenshot(creator_id, vec![0.0, 1.0, 0.0]);
    input.created_at = Some(Utc::now() - Duration::days(age_days));
    ScreenshotRepo::create_with_embedding(pool, &input)
        .await
        .unwrap()
        .id
}
