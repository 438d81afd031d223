// ABOUTME: Server binary for the Magenta conversational agent runtime
// ABOUTME: Loads configuration, wires resources, and serves the HTTP API until Ctrl-C
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! # Magenta Server Binary
//!
//! Starts the HTTP API. In-flight turns are cancelled and drained on shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use magenta_server::{config::RuntimeConfig, logging, resources::ServerResources, routes};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "magenta-server")]
#[command(about = "Magenta - conversational agent runtime with tools and retrieval")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL (`memory` or `sqlite:<path>`)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = RuntimeConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }

    info!("Starting Magenta agent runtime");

    let port = config.http_port;
    let resources = Arc::new(ServerResources::build(config).await?);
    let dispatcher = Arc::clone(&resources.dispatcher);
    let app = routes::router(resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {addr}");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
    }

    info!("Draining in-flight turns");
    dispatcher.shutdown().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}
