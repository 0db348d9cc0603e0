//! # Request Handlers
//!
//! HTTP request handlers for the API endpoints.

pub mod auth;
pub mod tutor;
