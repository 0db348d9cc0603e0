//! # Model Layer
//!
//! Database store and friend-code generation.

pub mod store;
pub mod code;
