//! Capability surface of the sign client.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::session::types::{Metadata, ProposalNamespaces, Session};

/// Errors surfaced by a connector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// Socket or I/O failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote side answered with a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// No answer within the configured bound.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The wallet rejected the proposal or request.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// A message could not be understood.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The connection went away while waiting.
    #[error("Connection closed")]
    Closed,
}

/// Result type for connector calls.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Options passed to `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<String>,
    pub metadata: Metadata,
}

/// Parameters of a session proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub required_namespaces: ProposalNamespaces,
}

/// Resolves once the wallet approves or rejects the proposal.
pub type Approval = BoxFuture<'static, ConnectorResult<Session>>;

/// Outcome of `connect`.
pub struct Pairing {
    /// Absent when an existing pairing is reused.
    pub uri: Option<String>,
    pub approval: Approval,
}

impl std::fmt::Debug for Pairing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pairing").field("uri", &self.uri).finish()
    }
}

/// Parameters of `disconnect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectParams {
    pub topic: String,
    pub message: String,
    pub code: i64,
}

/// JSON-RPC call forwarded to the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcCall {
    pub method: String,
    pub params: serde_json::Value,
}

/// Parameters of `request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    pub topic: String,
    pub chain_id: String,
    pub request: RpcCall,
}

/// Notifications emitted by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorEvent {
    /// The wallet tore the session down.
    SessionDeleted { topic: String },
    /// The session expired.
    SessionExpired { topic: String },
    /// Namespaces of an active session changed.
    SessionUpdated { topic: String },
    /// The client lost its connection; every later call fails.
    Closed,
}

/// A ready client handle.
#[async_trait]
pub trait ConnectorClient: Send + Sync {
    /// Propose a session.
    async fn connect(&self, params: ConnectParams) -> ConnectorResult<Pairing>;

    /// Tear down a session.
    async fn disconnect(&self, params: DisconnectParams) -> ConnectorResult<()>;

    /// Forward a JSON-RPC request to the wallet and return its result.
    async fn request(&self, params: RequestParams) -> ConnectorResult<serde_json::Value>;

    /// Subscribe to client notifications.
    fn events(&self) -> broadcast::Receiver<ConnectorEvent>;

    /// True once the handle can no longer reach the remote side.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Builds client handles; `init` may be called again after a failure.
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    async fn init(&self, config: &ClientConfig) -> ConnectorResult<Arc<dyn ConnectorClient>>;
}
