//! # Web Library
//!
//! HTTP handlers, chat module, and server setup.

pub mod handlers;
pub mod chat;
pub mod server;

pub use server::{start_server, ServerConfig, AppState};
