//! Session controller.
//!
//! # Responsibilities
//! - Own the client handle, the session, the account and the last result
//! - Drive the connect → approve → connected flow and show the pairing modal
//! - Disconnect, send the fixed transaction, react to remote deletion
//!
//! # Concurrency
//! State sits behind one async mutex that is never held across a connector
//! call. Each connect attempt gets a number; an approval only lands if the
//! state is still `Connecting` with that number.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex, Notify};

use crate::config::{AppConfig, TransactionConfig};
use crate::connector::{
    ClientConfig, ConnectParams, ConnectorClient, ConnectorEvent, ConnectorFactory,
    DisconnectParams, RequestParams, RpcCall,
};
use crate::lifecycle::Shutdown;
use crate::modal::{ModalPresenter, ModalRequest};
use crate::observability::metrics;
use crate::resilience::{with_deadline, Backoff};
use crate::session::error::SessionError;
use crate::session::state::{ClientStatus, ConnectionState, Snapshot};
use crate::session::types::{proposal_for, Metadata, Session};
use crate::transaction::{
    AccountId, ChainId, TransactionPayload, TransactionResult, SEND_TRANSACTION_METHOD,
};

/// Reason sent with a user-initiated disconnect.
pub const DISCONNECT_MESSAGE: &str = "User disconnected.";

/// Reason code sent with a user-initiated disconnect.
pub const DISCONNECT_CODE: i64 = 6000;

enum ClientSlot {
    Uninitialized,
    Initializing,
    Ready(Arc<dyn ConnectorClient>),
    Failed(String),
}

impl ClientSlot {
    fn status(&self) -> ClientStatus {
        match self {
            ClientSlot::Uninitialized => ClientStatus::Uninitialized,
            ClientSlot::Initializing => ClientStatus::Initializing,
            ClientSlot::Ready(_) => ClientStatus::Ready,
            ClientSlot::Failed(reason) => ClientStatus::Failed(reason.clone()),
        }
    }
}

struct Inner {
    client: ClientSlot,
    connection: ConnectionState,
    /// Wakes the pending connect attempt when the user cancels it.
    pending_cancel: Option<Arc<Notify>>,
    last_result: Option<TransactionResult>,
}

impl Inner {
    fn ready_client(&self) -> Result<Arc<dyn ConnectorClient>, SessionError> {
        match &self.client {
            ClientSlot::Ready(client) => Ok(client.clone()),
            _ => Err(SessionError::Uninitialized),
        }
    }

    fn active(&self) -> Result<(&Session, &AccountId), SessionError> {
        match &self.connection {
            ConnectionState::Connected { session, account } => Ok((session, account)),
            _ => Err(SessionError::NoSession),
        }
    }

    fn is_active_topic(&self, topic: &str) -> bool {
        matches!(&self.connection, ConnectionState::Connected { session, .. } if session.topic == topic)
    }

    fn is_connecting(&self) -> bool {
        matches!(self.connection, ConnectionState::Connecting { .. })
    }

    fn is_attempt(&self, attempt: u64) -> bool {
        matches!(self.connection, ConnectionState::Connecting { attempt: a } if a == attempt)
    }

    fn reset_session(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.last_result = None;
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            client: self.client.status(),
            connection: self.connection.clone(),
            last_result: self.last_result.clone(),
        }
    }
}

/// Mediates between a sign client, the pairing modal and the view.
pub struct SessionController {
    factory: Arc<dyn ConnectorFactory>,
    modal: Box<dyn ModalPresenter>,
    client_config: ClientConfig,
    chain: ChainId,
    transaction: TransactionConfig,
    approval_timeout_secs: u64,
    backoff: Backoff,
    shutdown: Shutdown,
    next_attempt: AtomicU64,
    state: Mutex<Inner>,
    changes: watch::Sender<Snapshot>,
}

impl SessionController {
    /// Build a controller. No client exists until [`initialize`](Self::initialize).
    pub fn new(
        config: &AppConfig,
        factory: Arc<dyn ConnectorFactory>,
        modal: Box<dyn ModalPresenter>,
        shutdown: Shutdown,
    ) -> Result<Arc<Self>, SessionError> {
        let chain: ChainId = config.chain.id.parse().map_err(SessionError::Config)?;
        let (changes, _) = watch::channel(Snapshot::default());

        Ok(Arc::new(Self {
            factory,
            modal,
            client_config: ClientConfig {
                project_id: config.project_id.clone(),
                relay_url: config.bridge.relay_url.clone(),
                metadata: Metadata {
                    name: config.metadata.name.clone(),
                    description: config.metadata.description.clone(),
                    url: config.metadata.url.clone(),
                    icons: config.metadata.icons.clone(),
                },
            },
            chain,
            transaction: config.transaction.clone(),
            approval_timeout_secs: config.session.approval_timeout_secs,
            backoff: Backoff::from_config(&config.session),
            shutdown,
            next_attempt: AtomicU64::new(0),
            state: Mutex::new(Inner {
                client: ClientSlot::Uninitialized,
                connection: ConnectionState::Disconnected,
                pending_cancel: None,
                last_result: None,
            }),
            changes,
        }))
    }

    /// Current state.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.lock().await.snapshot()
    }

    /// Receives a fresh snapshot after every state change.
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.changes.subscribe()
    }

    pub fn chain(&self) -> &ChainId {
        &self.chain
    }

    fn publish(&self, inner: &Inner) {
        self.changes.send_replace(inner.snapshot());
    }

    /// Construct the client handle and subscribe to its notifications.
    ///
    /// A no-op while the client is ready and connected. After a failure, or
    /// once the client's connection has closed, it may be called again.
    pub async fn initialize(self: &Arc<Self>) -> Result<(), SessionError> {
        {
            let mut inner = self.state.lock().await;
            let rebuild_closed = match &inner.client {
                ClientSlot::Ready(client) if !client.is_closed() => return Ok(()),
                ClientSlot::Ready(_) => true,
                ClientSlot::Initializing => return Err(SessionError::InitInProgress),
                ClientSlot::Uninitialized | ClientSlot::Failed(_) => false,
            };
            if rebuild_closed {
                tracing::info!("Client connection closed, rebuilding");
                if inner.is_connecting() {
                    self.abort_pending(&mut inner);
                }
                inner.reset_session();
                metrics::set_session_active(false);
            }
            inner.client = ClientSlot::Initializing;
            self.publish(&inner);
        }

        match self.factory.init(&self.client_config).await {
            Ok(client) => {
                let events = client.events();
                {
                    let mut inner = self.state.lock().await;
                    inner.client = ClientSlot::Ready(client);
                    self.publish(&inner);
                }
                self.spawn_event_listener(events);
                metrics::record_init(true);
                tracing::info!(chain = %self.chain, "Sign client ready");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Sign client initialization failed");
                let mut inner = self.state.lock().await;
                inner.client = ClientSlot::Failed(e.to_string());
                self.publish(&inner);
                metrics::record_init(false);
                Err(SessionError::Init(e))
            }
        }
    }

    /// [`initialize`](Self::initialize) with exponential backoff between attempts.
    pub async fn initialize_with_retry(self: &Arc<Self>) -> Result<(), SessionError> {
        let mut last_error = SessionError::Uninitialized;

        for attempt in 1..=self.backoff.max_attempts {
            let delay = self.backoff.delay(attempt);
            if !delay.is_zero() {
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying client initialization");
                tokio::time::sleep(delay).await;
            }

            match self.initialize().await {
                Ok(()) => return Ok(()),
                Err(SessionError::InitInProgress) => return Err(SessionError::InitInProgress),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.backoff.max_attempts,
                        error = %e,
                        "Initialization attempt failed"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    fn spawn_event_listener(self: &Arc<Self>, mut events: broadcast::Receiver<ConnectorEvent>) {
        let controller: Weak<Self> = Arc::downgrade(self);
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(event) => {
                            let closed = event == ConnectorEvent::Closed;
                            let Some(controller) = controller.upgrade() else { break };
                            controller.handle_event(event).await;
                            // A closed client sends nothing more; init starts a new listener.
                            if closed {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Session event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = shutdown.recv() => break,
                }
            }
            tracing::debug!("Session event listener stopped");
        });
    }

    async fn handle_event(&self, event: ConnectorEvent) {
        match event {
            ConnectorEvent::SessionDeleted { topic } => {
                tracing::info!(topic = %topic, "The user deleted the session from their wallet");
                self.handle_session_delete(&topic).await;
            }
            ConnectorEvent::SessionExpired { topic } => {
                tracing::info!(topic = %topic, "Session expired");
                self.handle_session_delete(&topic).await;
            }
            ConnectorEvent::SessionUpdated { topic } => {
                tracing::debug!(topic = %topic, "Session updated");
            }
            ConnectorEvent::Closed => self.handle_client_closed().await,
        }
    }

    /// The client lost its connection: mark it failed and drop any session.
    async fn handle_client_closed(&self) {
        let mut inner = self.state.lock().await;
        match &inner.client {
            ClientSlot::Ready(client) if client.is_closed() => {}
            // Stale notice from a client that has since been replaced.
            _ => return,
        }

        tracing::warn!("Sign client connection closed, type `init` to reconnect");
        inner.client = ClientSlot::Failed("bridge closed".to_string());
        if inner.is_connecting() {
            self.abort_pending(&mut inner);
        }
        inner.reset_session();
        metrics::set_session_active(false);
        self.publish(&inner);
    }

    /// Wake the pending attempt and dismiss its modal. Caller holds the lock.
    fn abort_pending(&self, inner: &mut Inner) {
        if let Some(cancel) = inner.pending_cancel.take() {
            cancel.notify_one();
        }
        inner.connection = ConnectionState::Disconnected;
        self.modal.close();
    }

    /// Remote teardown: clear session, account and last result.
    ///
    /// A pending `Connecting` attempt holds no session yet and is left alone.
    pub async fn handle_session_delete(&self, topic: &str) {
        let mut inner = self.state.lock().await;
        if let ConnectionState::Connected { session, .. } = &inner.connection {
            if session.topic != topic {
                tracing::debug!(deleted = %topic, active = %session.topic, "Deletion for another topic, resetting anyway");
            }
        }
        if !inner.is_connecting() {
            inner.reset_session();
            metrics::set_session_active(false);
        }
        self.publish(&inner);
    }

    /// Propose a session and wait for the wallet to approve it.
    ///
    /// Fails with [`SessionError::Uninitialized`] before the client exists,
    /// without touching state.
    pub async fn connect(&self) -> Result<Session, SessionError> {
        let (client, attempt, cancel) = {
            let mut inner = self.state.lock().await;
            let client = inner.ready_client()?;
            match inner.connection {
                ConnectionState::Disconnected => {}
                ConnectionState::Connecting { .. } => return Err(SessionError::ConnectInProgress),
                ConnectionState::Connected { .. } => return Err(SessionError::AlreadyConnected),
            }

            let attempt = self.next_attempt.fetch_add(1, Ordering::SeqCst) + 1;
            let cancel = Arc::new(Notify::new());
            inner.connection = ConnectionState::Connecting { attempt };
            inner.pending_cancel = Some(cancel.clone());
            self.publish(&inner);
            (client, attempt, cancel)
        };

        tracing::info!(attempt, chain = %self.chain, "Proposing session");
        let outcome = self.propose(client.as_ref(), attempt, &cancel).await;

        let mut inner = self.state.lock().await;
        // A superseded attempt leaves the modal alone; cancel already closed it
        // and a newer attempt may be showing its own URI.
        let still_pending = inner.is_attempt(attempt);
        if still_pending {
            inner.pending_cancel = None;
            self.modal.close();
        }

        match outcome {
            Ok((session, account)) if still_pending => {
                tracing::info!(topic = %session.topic, account = %account.address(), "Session connected");
                inner.connection = ConnectionState::Connected {
                    session: session.clone(),
                    account,
                };
                self.publish(&inner);
                metrics::record_connect("approved");
                metrics::set_session_active(true);
                Ok(session)
            }
            Ok((session, _)) => {
                drop(inner);
                tracing::warn!(topic = %session.topic, "Approval arrived after cancellation, discarding session");
                let params = DisconnectParams {
                    topic: session.topic,
                    message: DISCONNECT_MESSAGE.to_string(),
                    code: DISCONNECT_CODE,
                };
                if let Err(e) = client.disconnect(params).await {
                    tracing::warn!(error = %e, "Could not discard late session");
                }
                metrics::record_connect("cancelled");
                Err(SessionError::Cancelled)
            }
            Err(e) => {
                if still_pending {
                    inner.connection = ConnectionState::Disconnected;
                    self.publish(&inner);
                }
                tracing::warn!(attempt, error = %e, "Connection attempt failed");
                metrics::record_connect(match e {
                    SessionError::Cancelled => "cancelled",
                    SessionError::ApprovalTimeout(_) => "timeout",
                    _ => "failed",
                });
                Err(e)
            }
        }
    }

    async fn propose(
        &self,
        client: &dyn ConnectorClient,
        attempt: u64,
        cancel: &Notify,
    ) -> Result<(Session, AccountId), SessionError> {
        let required_namespaces = proposal_for(&self.chain, SEND_TRANSACTION_METHOD);
        let chains: Vec<String> = required_namespaces
            .values()
            .flat_map(|ns| ns.chains.iter().cloned())
            .collect();

        let pairing = tokio::select! {
            biased;
            _ = cancel.notified() => return Err(SessionError::Cancelled),
            res = client.connect(ConnectParams { required_namespaces }) => {
                res.map_err(SessionError::Connector)?
            }
        };

        {
            // Opening under the lock orders it against cancel_connect's close.
            let inner = self.state.lock().await;
            if !inner.is_attempt(attempt) {
                return Err(SessionError::Cancelled);
            }
            match &pairing.uri {
                Some(uri) => self.modal.open(&ModalRequest {
                    uri: uri.clone(),
                    chains,
                }),
                None => tracing::debug!("Existing pairing reused, nothing to display"),
            }
        }

        let session = tokio::select! {
            biased;
            _ = cancel.notified() => return Err(SessionError::Cancelled),
            res = with_deadline(self.approval_timeout_secs, pairing.approval) => match res {
                Ok(Ok(session)) => session,
                Ok(Err(e)) => return Err(SessionError::Approval(e)),
                Err(t) => return Err(SessionError::ApprovalTimeout(t.secs)),
            },
        };

        let account = session
            .primary_account(self.chain.namespace())
            .map_err(SessionError::InvalidSession)?;

        Ok((session, account))
    }

    /// Abort the pending connect attempt.
    pub async fn cancel_connect(&self) -> Result<(), SessionError> {
        let mut inner = self.state.lock().await;
        if !inner.is_connecting() {
            return Err(SessionError::NotConnecting);
        }

        self.abort_pending(&mut inner);
        self.publish(&inner);
        tracing::info!("Connection attempt cancelled by user");
        Ok(())
    }

    /// End the active session.
    ///
    /// Local state is cleared whatever the remote outcome; a remote failure
    /// is still returned.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        let (client, topic) = {
            let inner = self.state.lock().await;
            let (session, _) = inner.active()?;
            let topic = session.topic.clone();
            (inner.ready_client()?, topic)
        };

        let result = client
            .disconnect(DisconnectParams {
                topic: topic.clone(),
                message: DISCONNECT_MESSAGE.to_string(),
                code: DISCONNECT_CODE,
            })
            .await;

        {
            let mut inner = self.state.lock().await;
            if inner.is_active_topic(&topic) {
                inner.reset_session();
                self.publish(&inner);
            }
        }
        metrics::set_session_active(false);
        metrics::record_disconnect(result.is_ok());

        match result {
            Ok(()) => {
                tracing::info!(topic = %topic, "Session disconnected");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(topic = %topic, error = %e, "Remote disconnect failed, local session cleared");
                Err(SessionError::Connector(e))
            }
        }
    }

    /// Submit the fixed transaction over the active session.
    pub async fn send_transaction(&self) -> Result<TransactionResult, SessionError> {
        let (client, topic, from) = {
            let inner = self.state.lock().await;
            let client = inner.ready_client()?;
            let (session, account) = inner.active()?;
            (client, session.topic.clone(), account.address().to_string())
        };

        let payload = TransactionPayload::from_config(&from, &self.transaction)
            .map_err(SessionError::InvalidTransaction)?;

        let params = RequestParams {
            topic: topic.clone(),
            chain_id: self.chain.to_string(),
            request: RpcCall {
                method: SEND_TRANSACTION_METHOD.to_string(),
                params: payload.to_params(),
            },
        };

        tracing::info!(topic = %topic, to = %payload.to, "Requesting transaction signature");
        let value = match client.request(params).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(topic = %topic, error = %e, "Transaction request failed");
                metrics::record_request(false);
                return Err(SessionError::Connector(e));
            }
        };
        metrics::record_request(true);

        let result = match value {
            serde_json::Value::String(s) => TransactionResult(s),
            other => TransactionResult(other.to_string()),
        };

        let mut inner = self.state.lock().await;
        if inner.is_active_topic(&topic) {
            inner.last_result = Some(result.clone());
            self.publish(&inner);
        } else {
            tracing::debug!(topic = %topic, "Session gone before result arrived, not storing it");
        }
        tracing::info!(result = %result, "Transaction submitted");
        Ok(result)
    }
}
