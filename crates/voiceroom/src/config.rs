//! Configuration types for the signaling server and client

use serde::{Deserialize, Serialize};

/// Configuration for the signaling server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the WebSocket listener to (e.g. "0.0.0.0:3000")
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if `bind_addr` is not a parseable socket address.
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(Error::InvalidConfig(format!(
                "bind_addr must be a socket address, got {}",
                self.bind_addr
            )));
        }

        Ok(())
    }
}

/// Configuration for a signaling client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket signaling server URL (ws:// or wss://)
    pub signaling_url: String,

    /// Display name announced when joining a room
    pub user_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: "ws://localhost:3000".to_string(),
            user_name: "anonymous".to_string(),
        }
    }
}

impl ClientConfig {
    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `signaling_url` is not a valid WebSocket URL
    /// - `user_name` is empty
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        if !self.signaling_url.starts_with("ws://") && !self.signaling_url.starts_with("wss://") {
            return Err(Error::InvalidConfig(format!(
                "signaling_url must start with ws:// or wss://, got {}",
                self.signaling_url
            )));
        }

        if self.user_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "user_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_bind_addr_fails() {
        let mut config = ServerConfig::default();
        config.bind_addr = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_client_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_signaling_url_fails() {
        let mut config = ClientConfig::default();
        config.signaling_url = "http://localhost:3000".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_user_name_fails() {
        let mut config = ClientConfig::default();
        config.user_name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = ClientConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.signaling_url, deserialized.signaling_url);
    }
}
