//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the sign client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Project identifier issued by the relay operator.
    ///
    /// Usually supplied through `WALLETCONNECT_PROJECT_ID` rather than the file.
    pub project_id: String,

    /// Target chain and block explorer.
    pub chain: ChainConfig,

    /// Sidecar bridge hosting the sign-client library.
    pub bridge: BridgeConfig,

    /// Session lifecycle tuning.
    pub session: SessionConfig,

    /// Fixed transaction sent by the `send` action.
    pub transaction: TransactionConfig,

    /// Dapp metadata shown to the wallet during pairing.
    pub metadata: MetadataConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// CAIP-2 chain identifier (e.g., "eip155:5" for Goerli).
    pub id: String,

    /// Explorer prefix; the transaction result is appended to it.
    pub explorer_tx_url: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            id: "eip155:5".to_string(),
            explorer_tx_url: "https://goerli.etherscan.io/tx/".to_string(),
        }
    }
}

/// Bridge connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// WebSocket URL of the sidecar (e.g., "ws://127.0.0.1:8787").
    pub url: String,

    /// Timeout for a single JSON-RPC round trip in seconds.
    pub request_timeout_secs: u64,

    /// Optional relay URL forwarded to the sign client on init.
    pub relay_url: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8787".to_string(),
            request_timeout_secs: 30,
            relay_url: None,
        }
    }
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Local bound on waiting for wallet approval. 0 disables it.
    pub approval_timeout_secs: u64,

    /// Maximum client initialization attempts at startup.
    pub init_max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub init_base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub init_max_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            approval_timeout_secs: 300,
            init_max_attempts: 3,
            init_base_delay_ms: 500,
            init_max_delay_ms: 5000,
        }
    }
}

/// The fixed transaction submitted by the send action.
///
/// Values are hex strings as the wallet expects them on the wire.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Recipient address.
    pub to: String,
    /// Call data.
    pub data: String,
    /// Gas price in wei (hex quantity).
    pub gas_price: String,
    /// Gas limit (hex quantity).
    pub gas_limit: String,
    /// Value in wei (hex quantity).
    pub value: String,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            to: "0xBDE1EAE59cE082505bB73fedBa56252b1b9C60Ce".to_string(),
            data: "0x".to_string(),
            gas_price: "0x029104e28c".to_string(),
            gas_limit: "0x5208".to_string(),
            value: "0x00".to_string(),
        }
    }
}

/// Dapp metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            name: "Sign v2 Standalone".to_string(),
            description: "Terminal dapp for the sign protocol".to_string(),
            url: "https://localhost".to_string(),
            icons: Vec::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_goerli() {
        let config = AppConfig::default();
        assert_eq!(config.chain.id, "eip155:5");
        assert!(config.project_id.is_empty());
        assert_eq!(config.session.approval_timeout_secs, 300);
        assert_eq!(config.transaction.gas_limit, "0x5208");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            project_id = "abc"

            [bridge]
            url = "ws://localhost:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.project_id, "abc");
        assert_eq!(config.bridge.url, "ws://localhost:9000");
        assert_eq!(config.bridge.request_timeout_secs, 30);
        assert_eq!(config.chain.explorer_tx_url, "https://goerli.etherscan.io/tx/");
    }
}
