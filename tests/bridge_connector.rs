//! Bridge connector against an in-process sidecar speaking the same
//! JSON-RPC over WebSocket.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use common::{test_config, RecordingModal, WALLET};
use sign_standalone::config::BridgeConfig;
use sign_standalone::connector::{
    BridgeFactory, ClientConfig, ConnectParams, ConnectorError, ConnectorEvent, ConnectorFactory,
    DisconnectParams, RequestParams, RpcCall,
};
use sign_standalone::lifecycle::Shutdown;
use sign_standalone::session::types::proposal_for;
use sign_standalone::session::{ClientStatus, Metadata, SessionController, SessionError};
use sign_standalone::transaction::ChainId;

const URI: &str = "wc:c0ffee@2?relay-protocol=irn&symKey=abcd";

#[derive(Default, Clone, Copy)]
struct Behavior {
    reject_init: bool,
    /// Close the socket instead of answering this method.
    hang_up_on: Option<&'static str>,
}

struct Sidecar {
    url: String,
    push: mpsc::UnboundedSender<Value>,
    received: Arc<Mutex<Vec<Value>>>,
}

impl Sidecar {
    fn methods(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter_map(|f| f["method"].as_str().map(str::to_string))
            .collect()
    }

    fn notify(&self, method: &str, params: Value) {
        let _ = self
            .push
            .send(json!({ "jsonrpc": "2.0", "method": method, "params": params }));
    }
}

fn approved_session() -> Value {
    json!({
        "topic": "t1",
        "namespaces": {
            "eip155": {
                "accounts": [format!("eip155:5:{}", WALLET)],
                "methods": ["eth_sendTransaction"],
                "events": ["connect", "disconnect"]
            }
        }
    })
}

fn replies(request: &Value, behavior: Behavior) -> Vec<Value> {
    let id = request["id"].clone();
    match request["method"].as_str() {
        Some("init") if behavior.reject_init => vec![json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32000, "message": "invalid project id" }
        })],
        Some("connect") => vec![
            json!({ "jsonrpc": "2.0", "id": id, "result": { "uri": URI } }),
            json!({
                "jsonrpc": "2.0",
                "method": "session_approval",
                "params": {
                    "approvalId": request["params"]["approvalId"],
                    "session": approved_session()
                }
            }),
        ],
        Some("request") => vec![json!({ "jsonrpc": "2.0", "id": id, "result": "0xdeadbeef" })],
        _ => vec![json!({ "jsonrpc": "2.0", "id": id, "result": null })],
    }
}

async fn start_sidecar(behavior: Behavior) -> Sidecar {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (push, mut push_rx) = mpsc::unbounded_channel::<Value>();
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else { return };
        let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else { return };

        loop {
            tokio::select! {
                frame = ws.next() => {
                    let Some(Ok(Message::Text(text))) = frame else { break };
                    let request: Value = serde_json::from_str(text.as_str()).unwrap();
                    log.lock().unwrap().push(request.clone());

                    if behavior.hang_up_on.is_some() && request["method"].as_str() == behavior.hang_up_on {
                        break;
                    }
                    for reply in replies(&request, behavior) {
                        if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                            return;
                        }
                    }
                }
                Some(note) = push_rx.recv() => {
                    if ws.send(Message::Text(note.to_string().into())).await.is_err() {
                        return;
                    }
                }
            }
        }
    });

    Sidecar {
        url: format!("ws://{}", addr),
        push,
        received,
    }
}

fn bridge_config(url: &str) -> BridgeConfig {
    BridgeConfig {
        url: url.to_string(),
        request_timeout_secs: 5,
        relay_url: None,
    }
}

fn client_config() -> ClientConfig {
    ClientConfig {
        project_id: "test-project".to_string(),
        relay_url: None,
        metadata: Metadata::default(),
    }
}

fn proposal() -> ConnectParams {
    let chain: ChainId = "eip155:5".parse().unwrap();
    ConnectParams {
        required_namespaces: proposal_for(&chain, "eth_sendTransaction"),
    }
}

#[tokio::test]
async fn test_bridge_round_trip() {
    let sidecar = start_sidecar(Behavior::default()).await;
    let factory = BridgeFactory::new(&bridge_config(&sidecar.url), Shutdown::new());

    let client = factory.init(&client_config()).await.unwrap();

    let pairing = client.connect(proposal()).await.unwrap();
    assert_eq!(pairing.uri.as_deref(), Some(URI));
    let session = pairing.approval.await.unwrap();
    assert_eq!(session.topic, "t1");

    let result = client
        .request(RequestParams {
            topic: "t1".to_string(),
            chain_id: "eip155:5".to_string(),
            request: RpcCall {
                method: "eth_sendTransaction".to_string(),
                params: json!([{}]),
            },
        })
        .await
        .unwrap();
    assert_eq!(result, json!("0xdeadbeef"));

    client
        .disconnect(DisconnectParams {
            topic: "t1".to_string(),
            message: "User disconnected.".to_string(),
            code: 6000,
        })
        .await
        .unwrap();

    assert_eq!(sidecar.methods(), vec!["init", "connect", "request", "disconnect"]);

    let received = sidecar.received.lock().unwrap().clone();
    assert_eq!(received[0]["params"]["projectId"], "test-project");
    assert!(received[1]["params"]["requiredNamespaces"]["eip155"].is_object());
    assert_eq!(received[3]["params"]["code"], 6000);
}

#[tokio::test]
async fn test_bridge_init_rejected() {
    let sidecar = start_sidecar(Behavior {
        reject_init: true,
        ..Behavior::default()
    })
    .await;
    let factory = BridgeFactory::new(&bridge_config(&sidecar.url), Shutdown::new());

    let err = factory.init(&client_config()).await.err().unwrap();
    assert_eq!(
        err,
        ConnectorError::Rpc {
            code: -32000,
            message: "invalid project id".to_string(),
        }
    );
}

#[tokio::test]
async fn test_bridge_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let factory = BridgeFactory::new(&bridge_config(&format!("ws://{}", addr)), Shutdown::new());
    let err = factory.init(&client_config()).await.err().unwrap();
    assert!(matches!(err, ConnectorError::Transport(_)));
}

#[tokio::test]
async fn test_bridge_hang_up_fails_pending_call() {
    let sidecar = start_sidecar(Behavior {
        hang_up_on: Some("connect"),
        ..Behavior::default()
    })
    .await;
    let factory = BridgeFactory::new(&bridge_config(&sidecar.url), Shutdown::new());
    let client = factory.init(&client_config()).await.unwrap();

    let err = client.connect(proposal()).await.err().unwrap();
    assert_eq!(err, ConnectorError::Closed);
}

#[tokio::test]
async fn test_bridge_forwards_session_delete() {
    let sidecar = start_sidecar(Behavior::default()).await;
    let factory = BridgeFactory::new(&bridge_config(&sidecar.url), Shutdown::new());
    let client = factory.init(&client_config()).await.unwrap();
    let mut events = client.events();

    sidecar.notify("session_delete", json!({ "topic": "t1" }));

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        event,
        ConnectorEvent::SessionDeleted {
            topic: "t1".to_string()
        }
    );
}

#[tokio::test]
async fn test_controller_over_bridge() {
    let sidecar = start_sidecar(Behavior::default()).await;
    let mut config = test_config();
    config.bridge = bridge_config(&sidecar.url);

    let shutdown = Shutdown::new();
    let factory = Arc::new(BridgeFactory::new(&config.bridge, shutdown.clone()));
    let modal = RecordingModal::default();
    let controller =
        SessionController::new(&config, factory, Box::new(modal.clone()), shutdown.clone()).unwrap();

    controller.initialize().await.unwrap();
    controller.connect().await.unwrap();
    assert_eq!(controller.snapshot().await.account(), Some(WALLET));

    let result = controller.send_transaction().await.unwrap();
    assert_eq!(result.as_str(), "0xdeadbeef");

    sidecar.notify("session_delete", json!({ "topic": "t1" }));
    let snapshot = common::wait_for(&controller, |s| !s.is_connected()).await;
    assert!(snapshot.last_result.is_none());

    let sent = sidecar.received.lock().unwrap().clone();
    let tx = &sent[2]["params"]["request"]["params"][0];
    assert_eq!(tx["from"].as_str().unwrap().to_lowercase(), WALLET.to_lowercase());

    shutdown.trigger();
}

#[tokio::test]
async fn test_controller_marks_client_failed_after_hang_up() {
    let sidecar = start_sidecar(Behavior {
        hang_up_on: Some("connect"),
        ..Behavior::default()
    })
    .await;
    let mut config = test_config();
    config.bridge = bridge_config(&sidecar.url);

    let shutdown = Shutdown::new();
    let factory = Arc::new(BridgeFactory::new(&config.bridge, shutdown.clone()));
    let controller = SessionController::new(
        &config,
        factory,
        Box::new(RecordingModal::default()),
        shutdown.clone(),
    )
    .unwrap();
    controller.initialize().await.unwrap();

    let err = controller.connect().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Connector(ConnectorError::Closed) | SessionError::Cancelled
    ));

    let snapshot =
        common::wait_for(&controller, |s| matches!(s.client, ClientStatus::Failed(_))).await;
    assert_eq!(snapshot.client, ClientStatus::Failed("bridge closed".to_string()));
    assert!(matches!(
        controller.connect().await,
        Err(SessionError::Uninitialized)
    ));

    // The sidecar is gone, so a rebuild is attempted and fails visibly.
    assert!(matches!(
        controller.initialize().await,
        Err(SessionError::Init(_))
    ));

    shutdown.trigger();
}
