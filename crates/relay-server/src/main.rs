//! Relay Gateway - Unified multi-backend LLM API server
//!
//! An OpenAI-compatible gateway providing:
//! - Multi-provider chat routing with failover
//! - Managed vector stores and files replicated across backends behind
//!   unified resource ids
//! - API key authentication

use anyhow::Result;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relay_core::config::{GatewayConfig, LlmConfig, ProviderConfig, ServerConfig, StorageConfig};
use relay_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting Relay Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = AppState::new(config).await?;

    bootstrap_api_key(&state).await?;

    // Build router with middleware
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr: SocketAddr = addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the first API key on an empty database. The raw key is logged once
/// at startup and never recoverable afterwards.
async fn bootstrap_api_key(state: &AppState) -> Result<()> {
    if state.records.has_api_keys().await? {
        return Ok(());
    }

    let (_, raw_key) = state.records.create_api_key("default").await?;
    info!(
        "No API keys found, created initial key (store it now, it is not shown again): {}",
        raw_key
    );
    Ok(())
}

fn load_config() -> Result<GatewayConfig> {
    // A JSON config file wins; otherwise build from environment variables
    if let Ok(path) = std::env::var("GATEWAY_CONFIG") {
        let raw = std::fs::read_to_string(&path)?;
        return Ok(serde_json::from_str(&raw)?);
    }

    let mut providers = std::collections::HashMap::new();
    if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                api_key: Some(api_key),
                api_base: std::env::var("OPENAI_API_BASE").ok(),
                enabled: true,
            },
        );
    }
    if let Ok(api_key) = std::env::var("ANTHROPIC_API_KEY") {
        providers.insert(
            "anthropic".to_string(),
            ProviderConfig {
                api_key: Some(api_key),
                api_base: std::env::var("ANTHROPIC_API_BASE").ok(),
                enabled: true,
            },
        );
    }

    Ok(GatewayConfig {
        server: ServerConfig {
            host: std::env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("GATEWAY_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            cors_origins: vec![],
        },
        llm: LlmConfig {
            providers,
            ..Default::default()
        },
        storage: StorageConfig {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://relay.db?mode=rwc".to_string()),
            redis_url: std::env::var("REDIS_URL").ok(),
            ..Default::default()
        },
    })
}
