//! Shared helpers for integration tests
//!
//! Spins up a real server on an ephemeral port and wraps clients with
//! timeout-guarded typed receives.

use std::time::Duration;
use tokio::time::timeout;
use voiceroom::{
    ClientMessage, ServerConfig, ServerMessage, SignalingClient, SignalingServer,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_TIMEOUT: Duration = Duration::from_millis(200);

/// Server bound to an ephemeral local port
pub struct TestServer {
    pub url: String,
    handle: voiceroom::server::ServerHandle,
}

impl TestServer {
    pub async fn start() -> Self {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
        };
        let server = SignalingServer::bind(&config).await.expect("bind failed");
        let addr = server.local_addr().expect("no local addr");
        let handle = server.start();
        Self {
            url: format!("ws://{}", addr),
            handle,
        }
    }

    pub async fn stop(self) {
        self.handle.shutdown().await;
    }
}

/// Connected client that has already consumed its welcome frame
pub struct TestClient {
    pub id: String,
    client: SignalingClient,
}

impl TestClient {
    pub async fn connect(server: &TestServer) -> Self {
        let mut client = SignalingClient::connect(&server.url)
            .await
            .expect("connect failed");

        let id = match timeout(RECV_TIMEOUT, client.recv()).await {
            Ok(Some(ServerMessage::Welcome { id })) => id,
            other => panic!("expected welcome frame, got {:?}", other),
        };

        Self { id, client }
    }

    pub fn send(&self, msg: ClientMessage) {
        self.client.send(msg).expect("send failed");
    }

    pub fn join(&self, room_id: &str, user_name: &str) {
        self.send(ClientMessage::JoinRoom {
            room_id: room_id.to_string(),
            user_name: user_name.to_string(),
        });
    }

    /// Next server message, panicking if none arrives in time
    pub async fn recv(&mut self) -> ServerMessage {
        match timeout(RECV_TIMEOUT, self.client.recv()).await {
            Ok(Some(msg)) => msg,
            Ok(None) => panic!("connection closed while waiting for a message"),
            Err(_) => panic!("timed out waiting for a message"),
        }
    }

    /// Assert that nothing arrives within a short quiet window
    pub async fn expect_silence(&mut self) {
        if let Ok(Some(msg)) = timeout(QUIET_TIMEOUT, self.client.recv()).await {
            panic!("expected silence, got {:?}", msg);
        }
    }

    /// Consume messages until one matches, panicking after too many
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> ServerMessage
    where
        F: FnMut(&ServerMessage) -> bool,
    {
        for _ in 0..16 {
            let msg = self.recv().await;
            if predicate(&msg) {
                return msg;
            }
        }
        panic!("predicate never matched");
    }
}
