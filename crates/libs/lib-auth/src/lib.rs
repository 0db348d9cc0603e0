//! # Authentication Library
//!
//! Password hashing and verification.

pub mod pwd;

// Re-export commonly used types
pub use pwd::{hash_password, verify_password};
