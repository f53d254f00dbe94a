// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docqr: PDF download server with startup-generated QR codes.
//
// Entry point. Initialises logging, loads configuration, makes sure every
// document has a QR image, then serves until Ctrl+C / SIGTERM.

mod bootstrap;
mod shutdown;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use docqr_core::error::Result;
use docqr_core::AppConfig;
use docqr_server::{AppState, DocumentServer};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "docqr starting");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "docqr failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load()?;
    bootstrap::prepare_files_dir(&config)?;
    bootstrap::generate_qr_codes(&config).await;

    let mut server = DocumentServer::new(SocketAddr::new(config.bind_address, config.port));
    server.start(Arc::new(AppState::from_config(&config))).await?;

    match shutdown::shutdown_signal().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            // Without a signal handler the only way out is being killed.
            tracing::error!(error = %e, "failed to listen for shutdown signals");
            std::future::pending::<()>().await;
        }
    }

    server.stop().await
}
