use std::sync::Arc;
use std::time::Duration;

use foundry_agents::ClientFactory;
use foundry_api::{build_router, config::Config, state::AppState, telemetry::init_logging};
use foundry_runner::AgentSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config.logging);

    tracing::info!("Starting Foundry API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Initialize agents client
    tracing::info!("Connecting to agents endpoint {}", config.foundry.endpoint);
    let foundry_config = config
        .foundry_config()
        .map_err(|e| anyhow::anyhow!("Invalid agents configuration: {}", e))?;
    let client = ClientFactory::create_client(foundry_config)?;

    let mut builder = AgentSession::builder()
        .client(client)
        .agent_id(config.foundry.agent_id.clone())
        .run_options(config.run_options())
        .poll_config(config.poll_config());

    if let Some(credential) = config.mcp_credential()? {
        tracing::info!("MCP server '{}' enabled", config.mcp.server_label);
        builder = builder.with_mcp(config.mcp.server_label.clone(), credential);
    }
    let session = builder.build()?;

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), session));

    // Drop runs nobody came back to approve
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let dropped = sweeper.sweep().await;
            if dropped > 0 {
                tracing::info!("Dropped {} expired parked runs", dropped);
            }
        }
    });

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
