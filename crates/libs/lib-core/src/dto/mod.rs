//! # Data Transfer Objects
//!
//! Request and response structures shared by the HTTP handlers.

pub mod auth;
pub mod tutor;

pub use auth::*;
pub use tutor::*;
