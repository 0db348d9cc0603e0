//! # Application Configuration
//!
//! This module manages application configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.

use std::env;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite database connection URL
    pub database_url: String,

    /// Directory holding the static frontend (index.html, css, js)
    pub public_dir: String,

    /// API key for the Gemini explanation proxy
    ///
    /// Optional: when absent the `/api/explain-math` endpoint answers 503.
    pub gemini_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:data/mente.db".to_string());

        let public_dir = env::var("PUBLIC_DIR")
            .unwrap_or_else(|_| "public".to_string());

        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());

        Ok(Self {
            database_url,
            public_dir,
            gemini_api_key,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("DATABASE_URL must not be empty".to_string());
        }

        if self.public_dir.is_empty() {
            return Err("PUBLIC_DIR must not be empty".to_string());
        }

        Ok(())
    }
}
