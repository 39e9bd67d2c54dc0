//! Controller state and the read-only snapshot handed to the view.

use crate::session::types::Session;
use crate::transaction::{AccountId, TransactionResult};

/// Lifecycle of the client handle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClientStatus {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    /// Last initialization failed; `initialize` may be retried.
    Failed(String),
}

/// Session state machine.
///
/// ```text
/// Disconnected ──connect──▶ Connecting ──approval──▶ Connected
///      ▲                        │                        │
///      └──── fail/cancel ───────┘                        │
///      └────────────── disconnect / session_delete ──────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Waiting for wallet approval of proposal number `attempt`.
    Connecting { attempt: u64 },
    Connected { session: Session, account: AccountId },
}

impl ConnectionState {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting { .. } => "connecting",
            ConnectionState::Connected { .. } => "connected",
        }
    }
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub client: ClientStatus,
    pub connection: ConnectionState,
    pub last_result: Option<TransactionResult>,
}

impl Snapshot {
    /// Displayed account (chain prefix stripped). Present iff connected.
    pub fn account(&self) -> Option<&str> {
        match &self.connection {
            ConnectionState::Connected { account, .. } => Some(account.address()),
            _ => None,
        }
    }

    pub fn topic(&self) -> Option<&str> {
        match &self.connection {
            ConnectionState::Connected { session, .. } => Some(session.topic.as_str()),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.account().is_some_and(|a| !a.is_empty())
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.connection, ConnectionState::Connecting { .. })
    }

    /// The connect button is enabled.
    pub fn can_connect(&self) -> bool {
        self.client == ClientStatus::Ready
            && matches!(self.connection, ConnectionState::Disconnected)
    }

    pub fn can_send(&self) -> bool {
        self.client == ClientStatus::Ready && self.is_connected()
    }
}
