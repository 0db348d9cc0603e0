//! # User Repository
//!
//! Provides database access layer for user-related operations.
//!
//! This module implements the repository pattern for user data access,
//! providing a clean abstraction over SQL queries. The `users` table is the
//! durable identity store: usernames and friend codes are both UNIQUE, and
//! concurrent creation races are resolved by those constraints (the losing
//! insert fails and the caller re-reads the winning record).

use super::models::User;
use super::DbPool;
use sqlx::query_as;

/// User repository for database operations.
///
/// Provides methods for creating, retrieving, and deleting user records.
/// All methods are async and return `Result` types for proper error handling.
pub struct UserRepository;

impl UserRepository {
    /// Find a user by their username.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - User found with matching username
    /// * `Ok(None)` - No user found with that username
    /// * `Err(sqlx::Error)` - Database error occurred
    pub async fn find_by_username(pool: &DbPool, username: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by their friend code.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - User found with matching code
    /// * `Ok(None)` - No user found with that code
    /// * `Err(sqlx::Error)` - Database error occurred
    pub async fn find_by_code(pool: &DbPool, code: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE code = ?")
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Create a new user in the database.
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `username` - The username for the new user (must be unique)
    /// * `code` - The generated friend code (must be unique)
    /// * `password_hash` - The hashed password (use `lib_auth::hash_password`)
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if:
    /// - Username already exists (UNIQUE constraint violation)
    /// - Friend code already exists (UNIQUE constraint violation)
    /// - Database connection fails
    pub async fn create(
        pool: &DbPool,
        username: &str,
        code: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (username, code, password_hash) VALUES (?, ?, ?)"
        )
        .bind(username)
        .bind(code)
        .bind(password_hash)
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();

        query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Update the last login timestamp for a user.
    ///
    /// # Note
    ///
    /// This method does not verify that the user exists. If the user ID is invalid,
    /// it will succeed but not update any rows.
    pub async fn update_last_login(pool: &DbPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Replace a user's password hash.
    ///
    /// Used when a chat-created account (empty hash) is claimed through
    /// the HTTP registration endpoint.
    pub async fn set_password_hash(
        pool: &DbPool,
        id: i64,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Delete a user by username.
    ///
    /// # Returns
    ///
    /// * `Ok(count)` - Number of rows deleted (0 when no such user)
    /// * `Err(sqlx::Error)` - Database error occurred
    pub async fn delete_by_username(pool: &DbPool, username: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Returns true when the error is a UNIQUE constraint violation.
///
/// Used by callers that race on creation (two interleaved handshakes for the
/// same new username): the loser sees this error and falls back to re-reading
/// the record the winner created.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
