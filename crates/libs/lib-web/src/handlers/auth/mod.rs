//! # Authentication Handlers
//!
//! HTTP request handlers for account endpoints.
//!
//! ## Overview
//!
//! This module implements the account flow including:
//! - Registration with username/password (assigns a friend code)
//! - Login returning the `{username, code}` pair for the websocket handshake
//! - Account deletion
//!
//! Accounts first seen through the chat handshake exist without a password;
//! registering the same username with a password claims that account instead
//! of conflicting.

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use lib_auth::{hash_password, verify_password};
use lib_core::dto::{
    DeleteAccountRequest, ErrorResponse, LoginRequest, LoginResponse, RegisterRequest,
    StatusResponse, UserInfo,
};
use lib_core::model::code::unique_code;
use lib_core::model::store::user_repository::{is_unique_violation, UserRepository};
use lib_core::DbPool;
use tracing::{debug, error, info, instrument, warn};

fn err(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            success: false,
            message: message.to_string(),
        }),
    )
}

/// Registration handler - creates a new user account with a friend code.
///
/// # Returns
///
/// * `Ok((StatusCode::CREATED, StatusResponse))` - Account created (or claimed)
/// * `Err((StatusCode, ErrorResponse))` - Validation error, taken username, or server error
///
/// # Validation
///
/// - Username must be non-empty after trimming
/// - Password must be at least 4 characters (validated in `hash_password`)
/// - Username must be unique (enforced twice: lookup, then UNIQUE constraint)
#[instrument(skip(pool, req), fields(username = %req.username))]
pub async fn register(
    State(pool): State<DbPool>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("[REGISTER] New account request");

    let username = req.username.trim().to_string();
    if username.is_empty() {
        warn!("[REGISTER] Empty username");
        return Err(err(StatusCode::BAD_REQUEST, "Username is required"));
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("[REGISTER] Password rejected: {}", e);
            return Err(err(StatusCode::BAD_REQUEST, &e));
        }
    };

    match UserRepository::find_by_username(&pool, &username).await {
        Ok(Some(user)) if user.password_hash.is_empty() => {
            // Chat-created account without a password: claim it.
            debug!("[REGISTER] Claiming passwordless account");
            if let Err(e) = UserRepository::set_password_hash(&pool, user.id, &password_hash).await
            {
                error!("[REGISTER] Failed to claim account: {}", e);
                return Err(err(StatusCode::INTERNAL_SERVER_ERROR, "Database error"));
            }
            info!("[REGISTER] Account claimed: {}", username);
            return Ok((
                StatusCode::CREATED,
                Json(StatusResponse {
                    success: true,
                    message: "Registration successful".to_string(),
                }),
            ));
        }
        Ok(Some(_)) => {
            warn!("[REGISTER] Username already taken: {}", username);
            return Err(err(StatusCode::CONFLICT, "Username already taken"));
        }
        Ok(None) => {}
        Err(e) => {
            error!("[REGISTER] Database error checking username: {}", e);
            return Err(err(StatusCode::INTERNAL_SERVER_ERROR, "Database error"));
        }
    }

    let code = match unique_code(&pool).await {
        Ok(code) => code,
        Err(e) => {
            error!("[REGISTER] Code generation failed: {}", e);
            return Err(err(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create account",
            ));
        }
    };

    debug!("[REGISTER] Creating user in database...");
    match UserRepository::create(&pool, &username, &code, &password_hash).await {
        Ok(user) => {
            info!("[REGISTER] Account created: {} ({})", user.username, user.code);
            Ok((
                StatusCode::CREATED,
                Json(StatusResponse {
                    success: true,
                    message: "Registration successful".to_string(),
                }),
            ))
        }
        Err(e) if is_unique_violation(&e) => {
            // Lost a creation race since the lookup above.
            warn!("[REGISTER] Username taken in creation race: {}", username);
            Err(err(StatusCode::CONFLICT, "Username already taken"))
        }
        Err(e) => {
            error!("[REGISTER] Failed to create user: {}", e);
            Err(err(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create account",
            ))
        }
    }
}

/// Login handler - authenticates an existing account.
///
/// # Returns
///
/// * `Ok((StatusCode::OK, LoginResponse))` - The `{username, code}` identity pair
/// * `Err((StatusCode, ErrorResponse))` - Invalid credentials or server error
///
/// Unknown usernames, wrong passwords, and unclaimed (passwordless) accounts
/// all answer the same 401 so the endpoint leaks nothing about which exists.
pub async fn login(
    State(pool): State<DbPool>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("[LOGIN] Login attempt");
    debug!("   Username: {}", req.username);

    let user = match UserRepository::find_by_username(&pool, req.username.trim()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("[LOGIN] User not found: {}", req.username);
            return Err(err(StatusCode::UNAUTHORIZED, "Invalid credentials"));
        }
        Err(e) => {
            error!("[LOGIN] Database error: {}", e);
            return Err(err(StatusCode::INTERNAL_SERVER_ERROR, "Database error"));
        }
    };

    if user.password_hash.is_empty() {
        warn!("[LOGIN] Unclaimed account: {}", user.username);
        return Err(err(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }

    debug!("[LOGIN] Verifying password...");
    let is_valid = match verify_password(&req.password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            error!("[LOGIN] Password verification error: {}", e);
            return Err(err(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error",
            ));
        }
    };

    if !is_valid {
        warn!("[LOGIN] Invalid password for user: {}", user.username);
        return Err(err(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }

    debug!("[LOGIN] Updating last login timestamp...");
    if let Err(e) = UserRepository::update_last_login(&pool, user.id).await {
        // Best effort: the timestamp is informational, the login still counts.
        warn!("[LOGIN] Failed to update last login for {}: {}", user.username, e);
    }

    info!("[LOGIN] User authenticated: {}", user.username);

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            user: UserInfo {
                username: user.username,
                code: user.code,
            },
        }),
    ))
}

/// Account deletion handler.
///
/// # Returns
///
/// * `Ok((StatusCode::OK, StatusResponse))` - Account removed
/// * `Err((StatusCode, ErrorResponse))` - Unknown username or server error
pub async fn delete_account(
    State(pool): State<DbPool>,
    Json(req): Json<DeleteAccountRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("[DELETE] Account deletion request: {}", req.username);

    match UserRepository::delete_by_username(&pool, req.username.trim()).await {
        Ok(0) => {
            warn!("[DELETE] No such account: {}", req.username);
            Err(err(StatusCode::NOT_FOUND, "Account not found"))
        }
        Ok(_) => {
            info!("[DELETE] Account deleted: {}", req.username);
            Ok((
                StatusCode::OK,
                Json(StatusResponse {
                    success: true,
                    message: "Account deleted".to_string(),
                }),
            ))
        }
        Err(e) => {
            error!("[DELETE] Database error: {}", e);
            Err(err(StatusCode::INTERNAL_SERVER_ERROR, "Database error"))
        }
    }
}

#[cfg(test)]
mod tests;
