// Standalone MCP server binary

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use supamcp_client::{ApiCaller, ApiConfig, BackendClients, DEFAULT_APP_BASE_URL};
use supamcp_core::MemoryBackend;
use supamcp_mcp::tools::app_registry;
use supamcp_mcp::{McpServer, Settings};
use url::Url;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();

    // stdout carries the protocol, so logs go to stderr
    let filter = match settings.log_level.as_deref() {
        Some(directive) => tracing_subscriber::EnvFilter::try_new(directive)?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "supamcp=info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if settings.list_tools {
        let api = ApiCaller::new(&ApiConfig::new(Url::parse(DEFAULT_APP_BASE_URL)?))?;
        let registry = app_registry(Arc::new(MemoryBackend::new()), Arc::new(api))?;
        println!("{}", serde_json::to_string_pretty(&registry.list_schemas())?);
        return Ok(());
    }

    tracing::info!("Supabase app MCP server starting...");

    // Configuration problems are fatal before the transport opens
    let backend_config = settings.backend_config()?;
    let api_config = settings.api_config()?;
    tracing::debug!(?backend_config, app_base_url = %api_config.base_url, "Loaded configuration");

    let clients = BackendClients::connect(&backend_config)?;
    let api = ApiCaller::new(&api_config)?;
    let registry = app_registry(clients.reader(), Arc::new(api))?;

    let server = Arc::new(McpServer::new(registry));
    server.start().await?;

    Ok(())
}
