use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use trino_mcp_auth::{CommandMinter, CredentialManager};
use trino_mcp_core::{GatewayConfig, McpConfig, Transport};
use trino_mcp_engine::{ExecutionClient, TrinoHttpEngine};
use trino_mcp_server::{McpServer, ToolCatalog, ToolDispatcher};

/// MCP gateway exposing Datadog logs, spans and metrics in Trino as agent tools.
///
/// Connection and authentication settings are read from the environment
/// (TRINO_SERVER, TRINO_AUTH_TYPE, DD_ORG_ID, ...).
#[derive(Parser, Debug)]
#[command(name = "trino-mcp", version, about)]
struct Cli {
    /// Transport to serve MCP on: stdio or http.
    #[arg(long, env = "TRINO_MCP_TRANSPORT")]
    transport: Option<Transport>,

    /// Host to bind (http transport only).
    #[arg(long, env = "TRINO_MCP_HOST")]
    host: Option<String>,

    /// Port to bind (http transport only).
    #[arg(long, env = "TRINO_MCP_PORT")]
    port: Option<u16>,

    /// Print the tool catalog as JSON and exit.
    #[arg(long, default_value_t = false)]
    list_tools: bool,
}

impl Cli {
    fn apply(&self, mcp: &mut McpConfig) {
        if let Some(transport) = self.transport {
            mcp.transport = transport;
        }
        if let Some(host) = &self.host {
            mcp.host = host.clone();
        }
        if let Some(port) = self.port {
            mcp.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the stdio protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = GatewayConfig::from_env().context("invalid configuration")?;
    cli.apply(&mut config.mcp);

    if cli.list_tools {
        let catalog = ToolCatalog::new(&config.defaults);
        println!("{}", serde_json::to_string_pretty(catalog.list())?);
        return Ok(());
    }

    tracing::info!(
        server = %config.engine.server,
        catalog = %config.engine.catalog,
        schema = %config.engine.schema,
        auth = %config.auth.mode,
        transport = %config.mcp.transport,
        "starting trino-mcp"
    );

    let minter = CommandMinter::from_config(&config.auth);
    let credentials = CredentialManager::new(config.auth.clone(), &config.engine, Arc::new(minter));
    let engine = TrinoHttpEngine::new(&config.engine).context("failed to create Trino client")?;
    let client = ExecutionClient::new(Arc::new(engine), credentials);
    let dispatcher = ToolDispatcher::new(client, config.defaults.clone());

    McpServer::new(config.mcp, dispatcher).run().await?;
    Ok(())
}
