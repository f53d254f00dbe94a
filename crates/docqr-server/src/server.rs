// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP download server lifecycle.
//
// The server binds a TCP listener and hands it to `axum::serve` on a spawned
// Tokio task. Handlers only read from disk, so there is no shared mutable
// state; stopping signals a `Notify` that drives axum's graceful shutdown and
// lets in-flight downloads finish.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use docqr_core::error::{DocqrError, Result};
use docqr_core::types::ServerStatus;

use crate::routes::{AppState, router};

/// Embedded HTTP server for documents and their QR codes.
pub struct DocumentServer {
    /// Address to bind (port 0 picks a free port).
    bind_addr: SocketAddr,
    /// Address actually bound, once running.
    local_addr: Option<SocketAddr>,
    /// Current lifecycle state of the server.
    status: ServerStatus,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the Tokio task running `axum::serve`.
    task_handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl DocumentServer {
    /// Create a server for `bind_addr`. Call [`start`](Self::start) to begin
    /// accepting connections.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            local_addr: None,
            status: ServerStatus::Stopped,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
        }
    }

    /// The bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// Bind and start serving in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is in use or cannot be bound.
    pub async fn start(&mut self, state: Arc<AppState>) -> Result<()> {
        if self.status == ServerStatus::Running {
            debug!(addr = %self.bind_addr, "HTTP server already running");
            return Ok(());
        }

        self.status = ServerStatus::Starting;

        let listener = match TcpListener::bind(self.bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.status = ServerStatus::Error;
                return Err(DocqrError::Server(format!("bind {}: {e}", self.bind_addr)));
            }
        };
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, documents = state.documents.len(), "HTTP server listening");

        let shutdown = Arc::clone(&self.shutdown_signal);
        let app = router(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown.notified().await;
                    debug!("HTTP server received shutdown signal");
                })
                .await
        });

        self.local_addr = Some(local_addr);
        self.task_handle = Some(handle);
        self.status = ServerStatus::Running;
        Ok(())
    }

    /// Gracefully stop the server and wait for the serve task to finish.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }

        info!(addr = ?self.local_addr, "stopping HTTP server");
        self.shutdown_signal.notify_one();

        if let Some(handle) = self.task_handle.take() {
            let served = handle
                .await
                .map_err(|e| DocqrError::Server(format!("task join: {e}")))?;
            if let Err(e) = served {
                self.status = ServerStatus::Error;
                return Err(e.into());
            }
        }

        self.local_addr = None;
        self.status = ServerStatus::Stopped;
        info!("HTTP server stopped");
        Ok(())
    }
}
