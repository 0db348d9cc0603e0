//! # Auth Handler Tests
//!
//! Test suite for the account endpoints (register, login, delete-account).

mod delete;
mod register;

use super::*;
use crate::chat::PresenceTable;
use crate::server::AppState;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::post;
use axum::Router;
use lib_core::Config;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

/// Setup test database with schema
pub async fn setup_test_db() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            code TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_login TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await
    .expect("Failed to create users table");

    pool
}

/// Create test config
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        public_dir: "public".to_string(),
        gemini_api_key: None,
    }
}

/// Create test app with the account routes
pub fn test_app(pool: DbPool) -> Router {
    let state = AppState {
        db: pool,
        config: test_config(),
        presence: Arc::new(PresenceTable::new()),
    };

    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/delete-account", post(delete_account))
        .with_state(state)
}

/// POST a JSON body and return (status, parsed response body)
pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request");

    let response = app.oneshot(request).await.expect("Request failed");
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}
