//! In-process JSON-RPC endpoint for integration tests, plus a client whose DNS
//! overrides point named hosts (`ok`, `bad`, ...) at it.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use evm_gas_monitor::EvmRpcClient;
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tokio::{net::TcpListener, task::JoinHandle};

#[derive(Debug, Clone)]
pub enum MockReply {
    /// `{"jsonrpc":"2.0","id":1,"result":<value>}`
    Result(Value),
    /// Bare status code with an empty body
    Status(u16),
    /// 200 with an arbitrary body
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    replies: HashMap<String, MockReply>,
    requests: Vec<RecordedRequest>,
}

pub struct MockRpc {
    pub addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    handle: JoinHandle<()>,
}

impl MockRpc {
    /// Starts a server that answers HTTP 500 to anything not configured.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new().fallback(handle_rpc).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("mock rpc must bind");
        let addr = listener.local_addr().expect("mock rpc must have an address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock rpc server failed");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Answers `eth_gasPrice`.
    pub fn with_gas_price(self, hex: &str) -> Self {
        self.reply("eth_gasPrice", MockReply::Result(json!(hex)))
    }

    /// Answers every fee oracle selector with the same value.
    pub fn with_fee_oracle(self, hex: &str) -> Self {
        ["0x519b4bd3", "0xf8206140", "0xc5985918", "0x68d5dca6"]
            .into_iter()
            .fold(self, |mock, selector| {
                mock.reply(&eth_call_key(selector), MockReply::Result(json!(hex)))
            })
    }

    /// `key` is a method name, or `eth_call:<selector>` for oracle calls.
    pub fn reply(self, key: &str, reply: MockReply) -> Self {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert(key.to_string(), reply);
        self
    }

    pub fn url(&self, host: &str) -> String {
        format!("http://{host}:{}", self.addr.port())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl Drop for MockRpc {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn eth_call_key(selector: &str) -> String {
    format!("eth_call:{selector}")
}

/// Client that resolves each named host to the given mock address.
/// Accepts connections and never answers, holding each socket open.
pub async fn start_silent_listener() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (addr, handle)
}

pub fn client_for(hosts: &[(&str, SocketAddr)]) -> EvmRpcClient {
    let builder = hosts
        .iter()
        .fold(reqwest::Client::builder().no_proxy(), |builder, (host, addr)| {
            builder.resolve(host, *addr)
        });
    EvmRpcClient::from_client(builder.build().expect("test client must build"))
}

async fn handle_rpc(
    State(state): State<Arc<Mutex<MockState>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let key = match body["method"].as_str() {
        Some("eth_call") => eth_call_key(body["params"][0]["data"].as_str().unwrap_or_default()),
        Some(method) => method.to_string(),
        None => String::new(),
    };

    let reply = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            content_type: headers
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            body: body.clone(),
        });
        state.replies.get(&key).cloned()
    };

    match reply {
        Some(MockReply::Result(result)) => {
            Json(json!({"jsonrpc": "2.0", "id": body["id"], "result": result})).into_response()
        }
        Some(MockReply::Status(code)) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Some(MockReply::Raw(raw)) => raw.into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
