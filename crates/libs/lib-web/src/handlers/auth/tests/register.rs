//! Registration endpoint tests.

use super::*;
use serde_json::json;

#[tokio::test]
async fn test_register_creates_account_with_code() {
    let pool = setup_test_db().await;
    let app = test_app(pool.clone());

    let (status, body) = post_json(
        app,
        "/api/register",
        json!({ "username": "ana", "password": "pass1234" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let user = UserRepository::find_by_username(&pool, "ana")
        .await
        .unwrap()
        .expect("User should exist after registration");
    assert_eq!(user.code.len(), 6);
    assert!(!user.password_hash.is_empty());
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let pool = setup_test_db().await;

    let (status, _) = post_json(
        test_app(pool.clone()),
        "/api/register",
        json!({ "username": "ana", "password": "pass1234" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(
        test_app(pool),
        "/api/register",
        json!({ "username": "ana", "password": "other999" }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Username already taken");
}

#[tokio::test]
async fn test_register_short_password_rejected() {
    let pool = setup_test_db().await;

    let (status, body) = post_json(
        test_app(pool),
        "/api/register",
        json!({ "username": "ana", "password": "abc" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_register_empty_username_rejected() {
    let pool = setup_test_db().await;

    let (status, _) = post_json(
        test_app(pool),
        "/api/register",
        json!({ "username": "   ", "password": "pass1234" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_claims_passwordless_account() {
    let pool = setup_test_db().await;

    // Account created through the chat handshake, no password yet.
    UserRepository::create(&pool, "ana", "ABC123", "")
        .await
        .unwrap();

    let (status, _) = post_json(
        test_app(pool.clone()),
        "/api/register",
        json!({ "username": "ana", "password": "pass1234" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);

    // Code is unchanged, password is now set.
    let user = UserRepository::find_by_username(&pool, "ana")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.code, "ABC123");
    assert!(!user.password_hash.is_empty());
}
