//! Account deletion endpoint tests.

use super::*;
use serde_json::json;

#[tokio::test]
async fn test_delete_existing_account() {
    let pool = setup_test_db().await;
    UserRepository::create(&pool, "ana", "ABC123", "hash")
        .await
        .unwrap();

    let (status, body) = post_json(
        test_app(pool.clone()),
        "/api/delete-account",
        json!({ "username": "ana" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(UserRepository::find_by_username(&pool, "ana")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_unknown_account_not_found() {
    let pool = setup_test_db().await;

    let (status, body) = post_json(
        test_app(pool),
        "/api/delete-account",
        json!({ "username": "ghost" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_deleted_username_can_register_again() {
    let pool = setup_test_db().await;
    UserRepository::create(&pool, "ana", "ABC123", "hash")
        .await
        .unwrap();

    post_json(
        test_app(pool.clone()),
        "/api/delete-account",
        json!({ "username": "ana" }),
    )
    .await;

    let (status, _) = post_json(
        test_app(pool),
        "/api/register",
        json!({ "username": "ana", "password": "pass1234" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
}
