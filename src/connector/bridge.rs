//! WebSocket bridge to a sign-client sidecar.
//!
//! The sidecar hosts the actual pairing library; this side only speaks
//! JSON-RPC 2.0 text frames to it.
//!
//! # Wire format
//! ```text
//! → {"jsonrpc":"2.0","id":1,"method":"init","params":{"projectId":..,"metadata":{..}}}
//! ← {"jsonrpc":"2.0","id":1,"result":null}
//! → {"jsonrpc":"2.0","id":2,"method":"connect","params":{"requiredNamespaces":{..},"approvalId":"<uuid>"}}
//! ← {"jsonrpc":"2.0","id":2,"result":{"uri":"wc:..."}}
//! ← {"jsonrpc":"2.0","method":"session_approval","params":{"approvalId":"<uuid>","session":{..}}}
//! ← {"jsonrpc":"2.0","method":"session_approval","params":{"approvalId":"<uuid>","error":{"code":5000,"message":".."}}}
//! → {"jsonrpc":"2.0","id":3,"method":"disconnect","params":{"topic":..,"message":..,"code":6000}}
//! → {"jsonrpc":"2.0","id":4,"method":"request","params":{"topic":..,"chainId":..,"request":{..}}}
//! ← {"jsonrpc":"2.0","method":"session_delete","params":{"topic":".."}}
//! ```
//!
//! Approval waiters are registered under `approvalId` before `connect` is
//! sent, so a fast wallet cannot race the response.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{FutureExt, SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

use crate::config::BridgeConfig;
use crate::connector::client::{
    ClientConfig, ConnectParams, ConnectorClient, ConnectorError, ConnectorEvent,
    ConnectorFactory, ConnectorResult, DisconnectParams, Pairing, RequestParams,
};
use crate::lifecycle::Shutdown;
use crate::resilience::with_deadline;
use crate::session::types::Session;

const EVENT_CAPACITY: usize = 16;

/// Builds [`BridgeClient`]s by dialing the sidecar.
pub struct BridgeFactory {
    url: String,
    request_timeout_secs: u64,
    shutdown: Shutdown,
}

impl BridgeFactory {
    pub fn new(config: &BridgeConfig, shutdown: Shutdown) -> Self {
        Self {
            url: config.url.clone(),
            request_timeout_secs: config.request_timeout_secs,
            shutdown,
        }
    }
}

#[async_trait]
impl ConnectorFactory for BridgeFactory {
    async fn init(&self, config: &ClientConfig) -> ConnectorResult<Arc<dyn ConnectorClient>> {
        let (ws, _) = with_deadline(
            self.request_timeout_secs,
            tokio_tungstenite::connect_async(self.url.as_str()),
        )
        .await
        .map_err(|e| ConnectorError::Timeout(e.secs))?
        .map_err(|e| ConnectorError::Transport(format!("cannot reach bridge {}: {}", self.url, e)))?;

        tracing::debug!(url = %self.url, "Bridge socket open");

        let (mut sink, mut stream) = ws.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let inner = Arc::new(Inner {
            next_id: AtomicU64::new(1),
            pending: DashMap::new(),
            approvals: DashMap::new(),
            events,
            outgoing: outgoing_tx,
            request_timeout_secs: self.request_timeout_secs,
            closed: AtomicBool::new(false),
        });

        // Writer
        let mut writer_shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    msg = outgoing_rx.recv() => {
                        let Some(msg) = msg else { break };
                        if let Err(e) = sink.send(msg).await {
                            tracing::warn!(error = %e, "Bridge write failed");
                            break;
                        }
                    }
                    _ = writer_shutdown.recv() => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        // Reader
        let reader_inner = inner.clone();
        let mut reader_shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = stream.next() => match frame {
                        Some(Ok(Message::Text(text))) => reader_inner.handle_frame(text.as_str()),
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Bridge read failed");
                            break;
                        }
                    },
                    _ = reader_shutdown.recv() => break,
                }
            }
            reader_inner.fail_all();
            tracing::info!("Bridge connection closed");
        });

        let params = serde_json::to_value(config)
            .map_err(|e| ConnectorError::Protocol(e.to_string()))?;
        if let Err(e) = inner.call("init", params).await {
            let _ = inner.outgoing.send(Message::Close(None));
            return Err(e);
        }

        tracing::info!(url = %self.url, "Sign client initialized via bridge");
        Ok(Arc::new(BridgeClient { inner }))
    }
}

/// Client handle backed by a bridge socket.
pub struct BridgeClient {
    inner: Arc<Inner>,
}

struct Inner {
    next_id: AtomicU64,
    pending: DashMap<u64, oneshot::Sender<ConnectorResult<Value>>>,
    approvals: DashMap<String, oneshot::Sender<ConnectorResult<Session>>>,
    events: broadcast::Sender<ConnectorEvent>,
    outgoing: mpsc::UnboundedSender<Message>,
    request_timeout_secs: u64,
    closed: AtomicBool,
}

#[derive(Debug, Deserialize)]
struct IncomingFrame {
    id: Option<u64>,
    method: Option<String>,
    #[serde(default)]
    params: Value,
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl From<RpcErrorObject> for ConnectorError {
    fn from(e: RpcErrorObject) -> Self {
        ConnectorError::Rpc {
            code: e.code,
            message: e.message,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalParams {
    approval_id: String,
    session: Option<Session>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct TopicParams {
    topic: String,
}

#[derive(Debug, Deserialize)]
struct ConnectResult {
    uri: Option<String>,
}

impl Inner {
    async fn call(&self, method: &str, params: Value) -> ConnectorResult<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConnectorError::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let frame = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        if self.outgoing.send(Message::Text(frame.to_string().into())).is_err()
            || self.closed.load(Ordering::SeqCst)
        {
            self.pending.remove(&id);
            return Err(ConnectorError::Closed);
        }

        tracing::debug!(id, method, "Bridge request sent");

        match with_deadline(self.request_timeout_secs, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(ConnectorError::Closed),
            Err(e) => {
                self.pending.remove(&id);
                Err(ConnectorError::Timeout(e.secs))
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        let frame: IncomingFrame = match serde_json::from_str(text) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed bridge frame");
                return;
            }
        };

        match (frame.id, frame.method.as_deref()) {
            (Some(id), None) => {
                let Some((_, tx)) = self.pending.remove(&id) else {
                    tracing::debug!(id, "Response for unknown request id");
                    return;
                };
                let outcome = match frame.error {
                    Some(err) => Err(err.into()),
                    None => Ok(frame.result.unwrap_or(Value::Null)),
                };
                let _ = tx.send(outcome);
            }
            (_, Some("session_approval")) => self.handle_approval(frame.params),
            (_, Some(method @ ("session_delete" | "session_expire" | "session_update"))) => {
                let topic = match serde_json::from_value::<TopicParams>(frame.params) {
                    Ok(p) => p.topic,
                    Err(e) => {
                        tracing::warn!(method, error = %e, "Notification without topic");
                        return;
                    }
                };
                let event = match method {
                    "session_delete" => ConnectorEvent::SessionDeleted { topic },
                    "session_expire" => ConnectorEvent::SessionExpired { topic },
                    _ => ConnectorEvent::SessionUpdated { topic },
                };
                // No receivers is fine; nobody listens before a session exists.
                let _ = self.events.send(event);
            }
            (_, Some(other)) => tracing::debug!(method = other, "Ignoring bridge notification"),
            (None, None) => tracing::warn!("Bridge frame has neither id nor method"),
        }
    }

    fn handle_approval(&self, params: Value) {
        let params: ApprovalParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed session_approval notification");
                return;
            }
        };

        let Some((_, tx)) = self.approvals.remove(&params.approval_id) else {
            tracing::debug!(approval_id = %params.approval_id, "Approval for unknown proposal");
            return;
        };

        let outcome = match (params.session, params.error) {
            (_, Some(err)) => Err(ConnectorError::Rejected(err.message)),
            (Some(session), None) => Ok(session),
            (None, None) => Err(ConnectorError::Protocol(
                "session_approval carries neither session nor error".to_string(),
            )),
        };
        let _ = tx.send(outcome);
    }

    fn fail_all(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.events.send(ConnectorEvent::Closed);

        let ids: Vec<u64> = self.pending.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, tx)) = self.pending.remove(&id) {
                let _ = tx.send(Err(ConnectorError::Closed));
            }
        }

        let approval_ids: Vec<String> = self.approvals.iter().map(|e| e.key().clone()).collect();
        for id in approval_ids {
            if let Some((_, tx)) = self.approvals.remove(&id) {
                let _ = tx.send(Err(ConnectorError::Closed));
            }
        }
    }
}

impl Drop for BridgeClient {
    fn drop(&mut self) {
        let _ = self.inner.outgoing.send(Message::Close(None));
    }
}

/// Removes an abandoned approval waiter when its future is dropped.
struct ApprovalGuard {
    inner: Arc<Inner>,
    approval_id: String,
}

impl Drop for ApprovalGuard {
    fn drop(&mut self) {
        self.inner.approvals.remove(&self.approval_id);
    }
}

#[async_trait]
impl ConnectorClient for BridgeClient {
    async fn connect(&self, params: ConnectParams) -> ConnectorResult<Pairing> {
        let approval_id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.inner.approvals.insert(approval_id.clone(), tx);
        let guard = ApprovalGuard {
            inner: self.inner.clone(),
            approval_id: approval_id.clone(),
        };

        let params = json!({
            "requiredNamespaces": params.required_namespaces,
            "approvalId": approval_id,
        });
        // On error the guard drops here and unregisters the waiter.
        let result = self.inner.call("connect", params).await?;
        let result: ConnectResult = serde_json::from_value(result)
            .map_err(|e| ConnectorError::Protocol(format!("bad connect result: {}", e)))?;

        let approval = async move {
            let _guard = guard;
            rx.await.unwrap_or(Err(ConnectorError::Closed))
        }
        .boxed();

        Ok(Pairing {
            uri: result.uri,
            approval,
        })
    }

    async fn disconnect(&self, params: DisconnectParams) -> ConnectorResult<()> {
        let params = serde_json::to_value(params)
            .map_err(|e| ConnectorError::Protocol(e.to_string()))?;
        self.inner.call("disconnect", params).await.map(|_| ())
    }

    async fn request(&self, params: RequestParams) -> ConnectorResult<Value> {
        let params = serde_json::to_value(params)
            .map_err(|e| ConnectorError::Protocol(e.to_string()))?;
        self.inner.call("request", params).await
    }

    fn events(&self) -> broadcast::Receiver<ConnectorEvent> {
        self.inner.events.subscribe()
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}
