//! # Authentication Data Transfer Objects
//!
//! Defines request and response structures for authentication endpoints.
//!
//! ## Endpoints Using These DTOs
//!
//! - `POST /api/register` - [`RegisterRequest`] -> [`StatusResponse`]
//! - `POST /api/login` - [`LoginRequest`] -> [`LoginResponse`]
//! - `POST /api/delete-account` - [`DeleteAccountRequest`] -> [`StatusResponse`]
//!
//! ## Wire Format
//!
//! All DTOs use **snake_case** field names in JSON (default serde behavior).
//! The `{username, code}` pair returned by login is the pre-authenticated
//! identity a client may later present to the websocket handshake.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /api/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /api/delete-account`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAccountRequest {
    pub username: String,
}

/// Public user identity: the stable username plus the shareable friend code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub code: String,
}

/// Response body for `POST /api/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserInfo,
}

/// Generic `{success, message}` response used by register and delete-account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}
