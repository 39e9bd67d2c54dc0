//! Shared fixtures for integration tests: a scriptable connector and a
//! modal that records what it was asked to show.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::Value;
use tokio::sync::{broadcast, oneshot, Notify};

use sign_standalone::config::AppConfig;
use sign_standalone::connector::{
    ClientConfig, ConnectParams, ConnectorClient, ConnectorError, ConnectorEvent,
    ConnectorFactory, ConnectorResult, DisconnectParams, Pairing, RequestParams,
};
use sign_standalone::lifecycle::Shutdown;
use sign_standalone::modal::{ModalPresenter, ModalRequest};
use sign_standalone::session::{Session, SessionController, SessionNamespace, Snapshot};

pub const PAIRING_URI: &str = "wc:7f6e504bfad60b485450578e05678ed3@2?relay-protocol=irn";

/// A valid address, for flows that build a transaction from the account.
pub const WALLET: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig {
        project_id: "test-project".to_string(),
        ..AppConfig::default()
    };
    config.session.init_base_delay_ms = 1;
    config.session.init_max_delay_ms = 5;
    config
}

pub fn session(topic: &str, account: &str) -> Session {
    let mut namespaces = BTreeMap::new();
    namespaces.insert(
        "eip155".to_string(),
        SessionNamespace {
            accounts: vec![account.to_string()],
            methods: vec!["eth_sendTransaction".to_string()],
            events: vec!["connect".to_string(), "disconnect".to_string()],
        },
    );
    Session {
        topic: topic.to_string(),
        namespaces,
        expiry: None,
        peer: None,
    }
}

/// How the wallet answers the next proposal.
pub enum Script {
    Approve(Session),
    Reject(ConnectorError),
    /// Wait for [`MockClient::approve`].
    Manual,
}

pub struct MockClient {
    uri: Mutex<Option<String>>,
    script: Mutex<Script>,
    manual: Mutex<Option<oneshot::Sender<ConnectorResult<Session>>>>,
    /// Signalled when `connect` has been called.
    pub proposed: Notify,
    disconnect_result: Mutex<ConnectorResult<()>>,
    request_result: Mutex<ConnectorResult<Value>>,
    pub connects: Mutex<Vec<ConnectParams>>,
    pub disconnects: Mutex<Vec<DisconnectParams>>,
    pub requests: Mutex<Vec<RequestParams>>,
    events: broadcast::Sender<ConnectorEvent>,
    closed: AtomicBool,
}

impl MockClient {
    pub fn new(script: Script) -> Arc<Self> {
        let (events, _) = broadcast::channel(8);
        Arc::new(Self {
            uri: Mutex::new(Some(PAIRING_URI.to_string())),
            script: Mutex::new(script),
            manual: Mutex::new(None),
            proposed: Notify::new(),
            disconnect_result: Mutex::new(Ok(())),
            request_result: Mutex::new(Ok(Value::String("0xdeadbeef".to_string()))),
            connects: Mutex::new(Vec::new()),
            disconnects: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            events,
            closed: AtomicBool::new(false),
        })
    }

    pub fn approving(topic: &str, account: &str) -> Arc<Self> {
        Self::new(Script::Approve(session(topic, account)))
    }

    pub fn set_uri(&self, uri: Option<&str>) {
        *self.uri.lock().unwrap() = uri.map(str::to_string);
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    pub fn fail_disconnect(&self, error: ConnectorError) {
        *self.disconnect_result.lock().unwrap() = Err(error);
    }

    pub fn set_request_result(&self, result: ConnectorResult<Value>) {
        *self.request_result.lock().unwrap() = result;
    }

    /// Resolve a [`Script::Manual`] proposal.
    pub fn approve(&self, outcome: ConnectorResult<Session>) {
        if let Some(tx) = self.manual.lock().unwrap().take() {
            let _ = tx.send(outcome);
        }
    }

    pub fn emit(&self, event: ConnectorEvent) {
        let _ = self.events.send(event);
    }

    /// Drop the remote connection, as a bridge does when its socket ends.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.emit(ConnectorEvent::Closed);
    }

    /// Make the next init hand out a working handle again.
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectorClient for MockClient {
    async fn connect(&self, params: ConnectParams) -> ConnectorResult<Pairing> {
        self.connects.lock().unwrap().push(params);

        let approval = match &*self.script.lock().unwrap() {
            Script::Approve(session) => futures_util::future::ready(Ok(session.clone())).boxed(),
            Script::Reject(error) => futures_util::future::ready(Err(error.clone())).boxed(),
            Script::Manual => {
                let (tx, rx) = oneshot::channel();
                *self.manual.lock().unwrap() = Some(tx);
                async move { rx.await.unwrap_or(Err(ConnectorError::Closed)) }.boxed()
            }
        };
        self.proposed.notify_one();

        Ok(Pairing {
            uri: self.uri.lock().unwrap().clone(),
            approval,
        })
    }

    async fn disconnect(&self, params: DisconnectParams) -> ConnectorResult<()> {
        self.disconnects.lock().unwrap().push(params);
        self.disconnect_result.lock().unwrap().clone()
    }

    async fn request(&self, params: RequestParams) -> ConnectorResult<Value> {
        self.requests.lock().unwrap().push(params);
        self.request_result.lock().unwrap().clone()
    }

    fn events(&self) -> broadcast::Receiver<ConnectorEvent> {
        self.events.subscribe()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Fails the first `failures` inits, then hands out the client.
pub struct MockFactory {
    client: Arc<MockClient>,
    failures: AtomicU32,
    pub init_calls: AtomicU32,
}

impl MockFactory {
    pub fn new(client: Arc<MockClient>) -> Arc<Self> {
        Self::failing(client, 0)
    }

    pub fn failing(client: Arc<MockClient>, failures: u32) -> Arc<Self> {
        Arc::new(Self {
            client,
            failures: AtomicU32::new(failures),
            init_calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl ConnectorFactory for MockFactory {
    async fn init(&self, config: &ClientConfig) -> ConnectorResult<Arc<dyn ConnectorClient>> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(config.project_id, "test-project");

        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(ConnectorError::Transport("relay unreachable".to_string()));
        }
        Ok(self.client.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalCall {
    Open(ModalRequest),
    Close,
}

/// Records every open/close for later inspection.
#[derive(Clone, Default)]
pub struct RecordingModal {
    pub calls: Arc<Mutex<Vec<ModalCall>>>,
}

impl RecordingModal {
    pub fn calls(&self) -> Vec<ModalCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ModalPresenter for RecordingModal {
    fn open(&self, request: &ModalRequest) {
        self.calls.lock().unwrap().push(ModalCall::Open(request.clone()));
    }

    fn close(&self) {
        self.calls.lock().unwrap().push(ModalCall::Close);
    }
}

pub struct Harness {
    pub controller: Arc<SessionController>,
    pub client: Arc<MockClient>,
    pub factory: Arc<MockFactory>,
    pub modal: RecordingModal,
    pub shutdown: Shutdown,
}

pub fn harness_with(config: &AppConfig, client: Arc<MockClient>, failures: u32) -> Harness {
    let factory = MockFactory::failing(client.clone(), failures);
    let modal = RecordingModal::default();
    let shutdown = Shutdown::new();
    let controller = SessionController::new(
        config,
        factory.clone(),
        Box::new(modal.clone()),
        shutdown.clone(),
    )
    .unwrap();
    Harness {
        controller,
        client,
        factory,
        modal,
        shutdown,
    }
}

pub fn harness(client: Arc<MockClient>) -> Harness {
    harness_with(&test_config(), client, 0)
}

/// Harness whose client is already initialized.
pub async fn ready_harness(client: Arc<MockClient>) -> Harness {
    let h = harness(client);
    h.controller.initialize().await.unwrap();
    h
}

/// Wait until a published snapshot satisfies `pred`.
pub async fn wait_for<F>(controller: &SessionController, pred: F) -> Snapshot
where
    F: FnMut(&Snapshot) -> bool,
{
    let mut rx = controller.watch();
    let snapshot = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
        .await
        .expect("state change not observed")
        .expect("controller dropped")
        .clone();
    snapshot
}
