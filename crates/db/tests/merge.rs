//! Integration tests for the transactional screenshot merge.

mod common;

use assert_matches::assert_matches;
use hof_core::error::CoreError;
use hof_core::merge::{MergeOutcome, MergeRequest};
use hof_db::error::StoreError;
use hof_db::repositories::{EmbeddingRepo, FavoriteRepo, MergeRepo, ScreenshotRepo, ViewRepo};
use sqlx::PgPool;

async fn favoriters(pool: &PgPool, screenshot_id: i64) -> Vec<i64> {
    let mut ids: Vec<i64> = FavoriteRepo::list_for_screenshot(pool, screenshot_id)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.creator_id)
        .collect();
    ids.sort_unstable();
    ids
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_shared_favorite_is_deduplicated(pool: PgPool) {
    let owner = common::creator(&pool, "owner").await;
    let fan = common::creator(&pool, "fan").await;
    let keeper = common::screenshot(&pool, owner).await;
    let loser = common::screenshot(&pool, owner).await;
    FavoriteRepo::add(&pool, keeper, fan).await.unwrap();
    FavoriteRepo::add(&pool, loser, fan).await.unwrap();

    let outcome = MergeRepo::merge(&pool, &MergeRequest::new(keeper, vec![loser]))
        .await
        .unwrap();

    assert_eq!(outcome.merged_favorites_count, 0);
    assert_eq!(outcome.deleted_favorites_count, 1);
    assert_eq!(favoriters(&pool, keeper).await, vec![fan]);
    let row = ScreenshotRepo::find_by_id(&pool, keeper).await.unwrap().unwrap();
    assert_eq!(row.favorites_count, 1);
    assert!(ScreenshotRepo::find_by_id(&pool, loser).await.unwrap().is_none());
}

/// Keeper favorited by C1; L1 by C1 and C2; L2 by C1.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_two_losers_with_keeper_already_favorited(pool: PgPool) {
    let owner = common::creator(&pool, "owner").await;
    let c1 = common::creator(&pool, "c1").await;
    let c2 = common::creator(&pool, "c2").await;
    let keeper = common::screenshot(&pool, owner).await;
    let l1 = common::screenshot(&pool, owner).await;
    let l2 = common::screenshot(&pool, owner).await;

    FavoriteRepo::add(&pool, keeper, c1).await.unwrap();
    FavoriteRepo::add(&pool, l1, c1).await.unwrap();
    FavoriteRepo::add(&pool, l1, c2).await.unwrap();
    FavoriteRepo::add(&pool, l2, c1).await.unwrap();

    let outcome = MergeRepo::merge(&pool, &MergeRequest::new(keeper, vec![l1, l2]))
        .await
        .unwrap();

    assert_eq!(outcome.merged_favorites_count, 1);
    assert_eq!(outcome.deleted_favorites_count, 2);
    assert_eq!(favoriters(&pool, keeper).await, vec![c1, c2]);
    let row = ScreenshotRepo::find_by_id(&pool, keeper).await.unwrap().unwrap();
    assert_eq!(row.favorites_count, 2);
}

/// Same losers, but the keeper starts with no favorites.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_two_losers_with_unfavorited_keeper(pool: PgPool) {
    let owner = common::creator(&pool, "owner").await;
    let c1 = common::creator(&pool, "c1").await;
    let c2 = common::creator(&pool, "c2").await;
    let keeper = common::screenshot(&pool, owner).await;
    let l1 = common::screenshot(&pool, owner).await;
    let l2 = common::screenshot(&pool, owner).await;

    FavoriteRepo::add(&pool, l1, c1).await.unwrap();
    FavoriteRepo::add(&pool, l1, c2).await.unwrap();
    FavoriteRepo::add(&pool, l2, c1).await.unwrap();

    let outcome = MergeRepo::merge(&pool, &MergeRequest::new(keeper, vec![l1, l2]))
        .await
        .unwrap();

    assert_eq!(outcome.merged_favorites_count, 2);
    assert_eq!(outcome.deleted_favorites_count, 1);
    assert_eq!(favoriters(&pool, keeper).await, vec![c1, c2]);
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_viewer_is_repointed_and_counted(pool: PgPool) {
    let owner = common::creator(&pool, "owner").await;
    let viewer = common::creator(&pool, "viewer").await;
    let regular = common::creator(&pool, "regular").await;
    let keeper = common::screenshot(&pool, owner).await;
    let loser = common::screenshot(&pool, owner).await;

    ViewRepo::record(&pool, keeper, regular, None).await.unwrap();
    ViewRepo::record(&pool, loser, regular, None).await.unwrap();
    ViewRepo::record(&pool, loser, viewer, None).await.unwrap();
    let before = ScreenshotRepo::find_by_id(&pool, keeper).await.unwrap().unwrap();

    let outcome = MergeRepo::merge(&pool, &MergeRequest::new(keeper, vec![loser]))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        MergeOutcome {
            merged_favorites_count: 0,
            deleted_favorites_count: 0,
            merged_views_count: 1,
            deleted_views_count: 1,
        }
    );

    let after = ScreenshotRepo::find_by_id(&pool, keeper).await.unwrap().unwrap();
    assert_eq!(after.unique_views_count, before.unique_views_count + 1);
    assert_eq!(after.views_count, 2);

    let viewers: Vec<i64> = ViewRepo::list_for_screenshot(&pool, keeper)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.creator_id)
        .collect();
    assert!(viewers.contains(&viewer));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unique_views_become_the_union(pool: PgPool) {
    let owner = common::creator(&pool, "owner").await;
    let mut viewers = Vec::new();
    for name in ["a", "b", "c", "d"] {
        viewers.push(common::creator(&pool, name).await);
    }
    let keeper = common::screenshot(&pool, owner).await;
    let l1 = common::screenshot(&pool, owner).await;
    let l2 = common::screenshot(&pool, owner).await;

    // keeper {a, b}, l1 {b, c, c}, l2 {c, d}
    for (shot, who) in [
        (keeper, 0),
        (keeper, 1),
        (l1, 1),
        (l1, 2),
        (l1, 2),
        (l2, 2),
        (l2, 3),
    ] {
        ViewRepo::record(&pool, shot, viewers[who], None).await.unwrap();
    }

    MergeRepo::merge(&pool, &MergeRequest::new(keeper, vec![l1, l2]))
        .await
        .unwrap();

    let row = ScreenshotRepo::find_by_id(&pool, keeper).await.unwrap().unwrap();
    assert_eq!(row.unique_views_count, 4);
    let live = ViewRepo::list_for_screenshot(&pool, keeper).await.unwrap();
    assert_eq!(row.views_count, live.len() as i64);
}

// ---------------------------------------------------------------------------
// Validation and atomicity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_loser_mutates_nothing(pool: PgPool) {
    let owner = common::creator(&pool, "owner").await;
    let fan = common::creator(&pool, "fan").await;
    let keeper = common::screenshot(&pool, owner).await;
    let loser = common::screenshot(&pool, owner).await;
    FavoriteRepo::add(&pool, loser, fan).await.unwrap();

    let result = MergeRepo::merge(&pool, &MergeRequest::new(keeper, vec![loser, 777_777])).await;
    assert_matches!(result, Err(StoreError::Core(CoreError::InvalidMergeRequest(_))));

    assert!(ScreenshotRepo::find_by_id(&pool, loser).await.unwrap().is_some());
    assert_eq!(favoriters(&pool, loser).await, vec![fan]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_malformed_requests_are_rejected(pool: PgPool) {
    let owner = common::creator(&pool, "owner").await;
    let keeper = common::screenshot(&pool, owner).await;

    for request in [
        MergeRequest::new(keeper, vec![]),
        MergeRequest::new(keeper, vec![keeper]),
    ] {
        assert_matches!(
            MergeRepo::merge(&pool, &request).await,
            Err(StoreError::Core(CoreError::InvalidMergeRequest(_)))
        );
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_locked_row_conflicts_then_retry_succeeds(pool: PgPool) {
    let owner = common::creator(&pool, "owner").await;
    let keeper = common::screenshot(&pool, owner).await;
    let loser = common::screenshot(&pool, owner).await;

    let mut blocker = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM screenshots WHERE id = $1 FOR UPDATE")
        .bind(loser)
        .execute(&mut *blocker)
        .await
        .unwrap();

    let request = MergeRequest::new(keeper, vec![loser]);
    assert_matches!(
        MergeRepo::merge(&pool, &request).await,
        Err(StoreError::Core(CoreError::TransactionConflict(_)))
    );

    blocker.rollback().await.unwrap();
    MergeRepo::merge(&pool, &request).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_loser_embedding_is_removed(pool: PgPool) {
    let owner = common::creator(&pool, "owner").await;
    let keeper = common::screenshot(&pool, owner).await;
    let loser = common::screenshot(&pool, owner).await;

    MergeRepo::merge(&pool, &MergeRequest::new(keeper, vec![loser]))
        .await
        .unwrap();

    assert!(EmbeddingRepo::find_by_screenshot(&pool, loser).await.unwrap().is_none());
    assert!(EmbeddingRepo::find_by_screenshot(&pool, keeper).await.unwrap().is_some());
}
