//! veil-daemon: runs a local Veil overlay.
//!
//! Starts the registry, the onion routers and the users described by the
//! configuration, then serves until Ctrl-C.

mod config;

use tracing::info;

use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_directive().parse()?),
        )
        .init();

    info!("Veil daemon starting");

    // 3. Launch registry, routers and users
    let network = veil_node::launch_network(&config.network).await?;
    info!(
        host = %config.network.host,
        registry_port = config.network.registry_port,
        routers = network.router_count(),
        users = network.user_count(),
        "Overlay running"
    );

    // 4. Serve until interrupted
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");

    network.shutdown();
    info!("Daemon stopped");
    Ok(())
}
