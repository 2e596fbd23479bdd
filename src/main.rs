// src/main.rs
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

mod account;
mod builder;
mod chain;
mod config;
mod contracts;
mod error;
#[cfg(test)]
mod mock;
mod rpc;
mod server;
mod signer;
mod submitter;
mod types;

use crate::config::Config;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen_addr: SocketAddr,

    /// Overrides the port of the listen address.
    #[clap(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    // Fails fast, naming every missing variable
    let config = Config::from_env()?;

    let mut server_addr = args.listen_addr;
    if let Some(port) = args.port {
        server_addr.set_port(port);
    }

    info!(
        "Starting smart-account relay on {} (bundler: {}, paymaster: {})",
        server_addr, config.bundler_url, config.paymaster_url
    );

    start_server(server_addr, Arc::new(config)).await?;
    info!("Server stopped");

    Ok(())
}

async fn start_server(server_addr: SocketAddr, config: Arc<Config>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(server_addr).await?;

    axum::serve(listener, server::router(config))
        .with_graceful_shutdown(async {
            // Keep the server running until Ctrl+C is pressed
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
