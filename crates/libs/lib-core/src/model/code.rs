//! # Friend-Code Generation
//!
//! Short, unique, generated tokens identifying a user for out-of-band
//! sharing, independent of username. Codes are drawn from a fixed alphabet
//! and checked against the identity store until no collision exists.

use crate::error::{AppError, Result};
use crate::model::store::{DbPool, UserRepository};
use rand::Rng;

/// Alphabet the codes are drawn from (uppercase letters and digits).
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a generated friend code.
pub const CODE_LENGTH: usize = 6;

/// Upper bound on collision retries before giving up.
///
/// 36^6 possible codes make more than a handful of consecutive collisions
/// overwhelmingly unlikely; hitting the cap indicates a storage problem.
const MAX_CODE_ATTEMPTS: usize = 16;

/// Draw a random friend code from the fixed alphabet.
pub fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a friend code that is unique in the identity store.
///
/// Retries random draws until `find_by_code` reports no collision, up to
/// [`MAX_CODE_ATTEMPTS`]. The returned code is only reserved once the caller
/// inserts it; a concurrent insert of the same code fails on the UNIQUE
/// constraint and the caller retries registration.
pub async fn unique_code(pool: &DbPool) -> Result<String> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = random_code();
        if UserRepository::find_by_code(pool, &code).await?.is_none() {
            return Ok(code);
        }
        tracing::debug!(code = %code, "friend code collision, retrying");
    }

    Err(AppError::Storage(
        "Could not generate a unique friend code".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> DbPool {
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

    #[test]
    fn test_random_code_shape() {
        for _ in 0..100 {
            let code = random_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_random_codes_vary() {
        // 36^6 codes; 20 consecutive identical draws would mean a broken RNG.
        let first = random_code();
        let all_same = (0..20).all(|_| random_code() == first);
        assert!(!all_same);
    }

    #[tokio::test]
    async fn test_unique_code_avoids_taken_codes() {
        let pool = setup_test_db().await;

        UserRepository::create(&pool, "ana", "ABC123", "hash")
            .await
            .unwrap();

        let code = unique_code(&pool).await.unwrap();

        assert_ne!(code, "ABC123");
        assert!(UserRepository::find_by_code(&pool, &code)
            .await
            .unwrap()
            .is_none());
    }
}
