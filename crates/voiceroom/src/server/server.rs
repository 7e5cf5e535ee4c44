//! WebSocket signaling server
//!
//! Accept loop plus lifecycle handle. Each accepted connection gets its
//! own handler task; all handlers share one [`SharedState`].

use crate::config::ServerConfig;
use crate::server::handler::{handle_connection, SharedState};
use crate::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Room signaling server
pub struct SignalingServer {
    listener: TcpListener,
    state: Arc<SharedState>,
}

impl SignalingServer {
    /// Bind the listener without accepting connections yet
    ///
    /// Binding separately lets callers (tests in particular) bind port 0
    /// and learn the assigned address before starting the accept loop.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|e| Error::Signaling(format!("Failed to bind {}: {}", config.bind_addr, e)))?;

        info!("Signaling server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            state: Arc::new(SharedState::new()),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared registry state, for introspection
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Start the accept loop on the current runtime
    ///
    /// Returns a handle that stops the loop when dropped or explicitly
    /// shut down. Live connections finish on their own handler tasks.
    pub fn start(self) -> ServerHandle {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
        let local_addr = self.listener.local_addr().ok();
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = self.listener.accept() => {
                        match accepted {
                            Ok((stream, addr)) => {
                                info!("Accepted connection from {}", addr);
                                let state = Arc::clone(&self.state);
                                tokio::spawn(async move {
                                    if let Err(e) = handle_connection(stream, state).await {
                                        error!("Connection handler error: {}", e);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Accept error: {}", e);
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Signaling server shutting down");
                        break;
                    }
                }
            }
        });

        ServerHandle {
            shutdown_tx,
            task,
            local_addr,
            state,
        }
    }
}

/// Handle to a running signaling server
pub struct ServerHandle {
    shutdown_tx: broadcast::Sender<()>,
    task: tokio::task::JoinHandle<()>,
    local_addr: Option<SocketAddr>,
    state: Arc<SharedState>,
}

impl ServerHandle {
    /// Address the server is listening on
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Shared registry state, for introspection
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Stop accepting connections and wait for the accept loop to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        let _ = (&mut self.task).await;
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_bind_assigns_port() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
        };
        let server = tokio_test::assert_ok!(SignalingServer::bind(&config).await);
        let addr = tokio_test::assert_ok!(server.local_addr());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_rejects_invalid_config() {
        let config = ServerConfig {
            bind_addr: "nowhere".to_string(),
        };
        assert!(SignalingServer::bind(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_stops_accept_loop() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
        };
        let server = SignalingServer::bind(&config).await.unwrap();
        let handle = server.start();
        handle.shutdown().await;
    }
}
