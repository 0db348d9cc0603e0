//! # Backend Entry Point
//!
//! Thin binary: reads the bind address from the environment and hands off
//! to `lib_web::start_server`.

use lib_web::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());

    let config = ServerConfig {
        bind_address: format!("0.0.0.0:{}", port),
        ..ServerConfig::default()
    };

    start_server(config).await
}
