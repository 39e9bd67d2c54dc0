//! Connector subsystem: the sign client as seen from the dapp.
//!
//! # Data Flow
//! ```text
//! SessionController
//!     → ConnectorFactory::init (project id, metadata)
//!     → ConnectorClient::connect → Pairing { uri, approval }
//!     → ConnectorClient::disconnect / request
//!     ← ConnectorEvent (session_delete, session_expire, session_update)
//! ```
//!
//! # Design Decisions
//! - Traits are object safe so the controller holds `Arc<dyn ConnectorClient>`
//! - The pairing protocol itself lives behind the bridge (bridge.rs)
//! - Approval is a boxed future so callers can race it against cancellation

pub mod bridge;
pub mod client;

pub use bridge::{BridgeClient, BridgeFactory};
pub use client::{
    Approval, ClientConfig, ConnectParams, ConnectorClient, ConnectorError, ConnectorEvent,
    ConnectorFactory, ConnectorResult, DisconnectParams, Pairing, RequestParams, RpcCall,
};
