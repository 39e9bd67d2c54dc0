//! Session controller errors.

use thiserror::Error;

use crate::connector::ConnectorError;
use crate::transaction::TransactionError;

/// Errors returned by [`SessionController`](crate::session::SessionController).
///
/// Precondition variants are returned before any state is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// An action needed a client handle that does not exist yet.
    #[error("Client is not set")]
    Uninitialized,

    /// Another initialization is still running.
    #[error("Client initialization already in progress")]
    InitInProgress,

    /// The action needs an active session.
    #[error("No active session")]
    NoSession,

    #[error("Already connected")]
    AlreadyConnected,

    /// A proposal is already waiting for wallet approval.
    #[error("A connection attempt is already pending")]
    ConnectInProgress,

    #[error("No connection attempt to cancel")]
    NotConnecting,

    /// The connector could not be constructed.
    #[error("Client initialization failed: {0}")]
    Init(ConnectorError),

    /// A connector call failed.
    #[error("{0}")]
    Connector(ConnectorError),

    /// The wallet rejected or never delivered the session.
    #[error("Session approval failed: {0}")]
    Approval(ConnectorError),

    /// No approval within the local bound.
    #[error("No wallet approval after {0} seconds")]
    ApprovalTimeout(u64),

    /// The user cancelled the pending connection.
    #[error("Connection attempt cancelled")]
    Cancelled,

    /// The approved session has no usable account.
    #[error("Approved session is unusable: {0}")]
    InvalidSession(TransactionError),

    /// The configured transaction could not be built.
    #[error("Cannot build transaction: {0}")]
    InvalidTransaction(TransactionError),

    /// The configured chain id is malformed.
    #[error("Invalid chain configuration: {0}")]
    Config(TransactionError),
}

impl SessionError {
    /// True for errors raised because the action was not available.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SessionError::Uninitialized
                | SessionError::InitInProgress
                | SessionError::NoSession
                | SessionError::AlreadyConnected
                | SessionError::ConnectInProgress
                | SessionError::NotConnecting
        )
    }
}
