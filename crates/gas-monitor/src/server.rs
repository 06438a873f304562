//! HTTP surface: every request, whatever its path, runs one collection cycle
//! and answers with the rendered exposition text.

use crate::{Result, collector::Collector, exposition, registry::EndpointRegistry};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct AppState {
    collector: Collector,
    registry: Arc<EndpointRegistry>,
}

impl AppState {
    pub fn new(collector: Collector, registry: EndpointRegistry) -> Self {
        Self {
            collector,
            registry: Arc::new(registry),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new().fallback(scrape).with_state(state)
}

/// Serves on an already-bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, "serving metrics at http://{addr}/");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn scrape(State(state): State<AppState>) -> Response {
    let rendered = state
        .collector
        .collect_all(&state.registry)
        .await
        .map(|metrics| exposition::render(&metrics, &state.collector.error_snapshot()));
    scrape_response(rendered)
}

/// 200 with the exposition, or 500 with the error text for a failed cycle.
fn scrape_response(rendered: Result<String>) -> Response {
    match rendered {
        Ok(body) => text_response(StatusCode::OK, body),
        Err(err) => {
            error!(%err, "collection cycle failed");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn text_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], body).into_response()
}
