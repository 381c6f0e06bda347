// src/main.rs
use analysis_bridge::config::Config;
use analysis_bridge::grpc_server::BridgeServer;
use clap::Parser;
use log::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Exits with a usage error when --port / BRIDGE_PORT is missing.
    let config = Config::parse();

    if config.engine.is_none() {
        warn!("no analysis engine configured, every file will be skipped");
    }

    let server = match BridgeServer::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!("startup failed: {}", e);
            return Err(e.into());
        }
    };

    server
        .serve_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("shutdown requested");
        })
        .await?;

    Ok(())
}
