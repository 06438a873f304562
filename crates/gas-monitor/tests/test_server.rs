mod common;

use common::{MockReply, MockRpc, client_for};
use evm_gas_monitor::{
    Collector, EndpointRegistry,
    collector::DEFAULT_FEE_ORACLE_CHAINS,
    server::{self, AppState},
};
use std::net::SocketAddr;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start(collector: Collector, registry: EndpointRegistry) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(server::serve(
            listener,
            AppState::new(collector, registry),
            shutdown.clone(),
        ));

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap()
            .get(format!("http://{}{path}", self.addr))
            .send()
            .await
            .unwrap()
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn scrape_returns_exposition_text() {
    let ok = MockRpc::start().await.with_gas_price("0x3b9aca00");
    let bad = MockRpc::start()
        .await
        .reply("eth_gasPrice", MockReply::Status(500));

    let registry =
        EndpointRegistry::from_urls([("testchain", vec![ok.url("ok"), bad.url("bad")])]).unwrap();
    let collector = Collector::new(
        client_for(&[("ok", ok.addr), ("bad", bad.addr)]),
        DEFAULT_FEE_ORACLE_CHAINS,
    );
    let server = TestServer::start(collector, registry).await;

    let response = server.get("/").await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .unwrap(),
        "text/plain"
    );

    let body = response.text().await.unwrap();
    assert!(body.starts_with("# TYPE evm_gas_price_wei gauge\n# UNIT evm_gas_price_wei wei\n"));
    assert!(body.contains("evm_gas_price_wei{chain=\"testchain\",source=\"ok\"} 1000000000\n"));
    assert!(body.contains("evm_scrape_errors{source=\"bad\"} 1\n"));

    // Each request is a fresh sweep; the tally carries over.
    let body = server.get("/metrics").await.text().await.unwrap();
    assert!(body.contains("evm_scrape_errors{source=\"bad\"} 2\n"));
    assert!(body.contains("evm_gas_price_wei{chain=\"testchain\",source=\"ok\"} 1000000000\n"));

    server.stop().await;
}

#[tokio::test]
async fn all_endpoints_down_still_answers_ok() {
    let bad = MockRpc::start()
        .await
        .reply("eth_gasPrice", MockReply::Status(500));
    let registry = EndpointRegistry::from_urls([
        ("optimism", vec![bad.url("bad")]),
        ("base", vec![bad.url("worse")]),
    ])
    .unwrap();
    let collector = Collector::new(
        client_for(&[("bad", bad.addr), ("worse", bad.addr)]),
        DEFAULT_FEE_ORACLE_CHAINS,
    );
    let server = TestServer::start(collector, registry).await;

    let response = server.get("/").await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body = response.text().await.unwrap();
    for name in [
        "evm_gas_price_wei",
        "evm_base_fee_wei",
        "evm_blob_base_fee_wei",
        "evm_base_fee_scalar",
        "evm_blob_base_fee_scalar",
    ] {
        assert_eq!(body.matches(&format!("# TYPE {name} gauge\n")).count(), 1);
        assert_eq!(body.matches(&format!("# UNIT {name} ")).count(), 1);
        assert!(!body.contains(&format!("{name}{{")));
    }
    assert!(body.contains("# TYPE evm_scrape_errors counter\n"));
    assert!(body.contains("evm_scrape_errors{source=\"bad\"} 1\n"));
    assert!(body.contains("evm_scrape_errors{source=\"worse\"} 1\n"));

    server.stop().await;
}
