use anyhow::Context;
use menu_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    setup_environment()?;

    print_banner();

    tracing::info!("Menu server starting...");

    // 2. Configuration
    let config = Config::from_env().context("loading configuration")?;

    // 3. Services
    let state = ServerState::initialize(&config).context("initializing server state")?;

    // 4. HTTP
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
