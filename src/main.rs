//! HTTP server entry point for the Evaluation Engine.
//!
//! Environment:
//!
//! * `EVAL_ENGINE_CONFIG`: configuration directory (default `./config/default`)
//! * `EVAL_ENGINE_HOST` / `EVAL_ENGINE_PORT`: bind address (default `127.0.0.1:3000`)
//! * `RUST_LOG`, falling back to `EVAL_ENGINE_LOG`: log filter (default `info`)

use std::env;
use std::error::Error;

use evaluation_engine::api::{AppState, create_router};
use evaluation_engine::config::ConfigLoader;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() -> Result<(), Box<dyn Error + Send + Sync>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level = env::var("EVAL_ENGINE_LOG").unwrap_or_else(|_| "info".to_string());
            EnvFilter::try_new(level)?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init()
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    init_tracing()?;

    let config_path =
        env::var("EVAL_ENGINE_CONFIG").unwrap_or_else(|_| "./config/default".to_string());
    let host = env::var("EVAL_ENGINE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("EVAL_ENGINE_PORT").unwrap_or_else(|_| "3000".to_string());

    let config = ConfigLoader::load(&config_path)?;
    info!(config_path = %config_path, "Configuration loaded");

    let router = create_router(AppState::new(config));
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    info!(address = %listener.local_addr()?, "Evaluation engine listening");

    axum::serve(listener, router).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}
