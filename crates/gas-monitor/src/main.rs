use anyhow::Context;
use clap::Parser;
use evm_gas_monitor::{
    Collector, EvmRpcClient,
    server::{self, AppState},
    settings::{AppArgs, Settings},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AppArgs::parse();
    let mut settings = Settings::new(args.config)?;
    if let Some(listen) = args.listen {
        settings.override_listen_addr(listen)?;
    }

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(metrics_addr) = settings.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        info!(%metrics_addr, "service metrics exporter listening");
    }

    export_build_info();

    let registry = settings.registry()?;
    let client = EvmRpcClient::new(settings.rpc_timeout())?;
    let collector = Collector::new(client, settings.fee_oracle_chains.clone());

    info!(
        chains = registry.chain_count(),
        endpoints = registry.endpoint_count(),
        fee_oracle_chains = ?settings.fee_oracle_chains,
        timeout = ?settings.rpc_timeout(),
        "EVM gas monitor starting"
    );

    let listener = TcpListener::bind(settings.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen_addr))?;

    server::serve(listener, AppState::new(collector, registry), shutdown_listener()?).await?;

    info!("EVM gas monitor shutting down");

    Ok(())
}

fn shutdown_listener() -> anyhow::Result<CancellationToken> {
    let cancellation_token = CancellationToken::new();
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("sigterm listener failed")?;
    tokio::spawn({
        let cancellation_token = cancellation_token.clone();
        async move {
            tokio::select! {
                _ = sigterm.recv() => cancellation_token.cancel(),
                _ = signal::ctrl_c() => cancellation_token.cancel(),
            }
            info!("shutdown signal received");
        }
    });

    Ok(cancellation_token)
}

fn export_build_info() {
    let version = option_env!("BUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    let build_commit = option_env!("BUILD_COMMIT").unwrap_or("UNKNOWN");
    let build_date = option_env!("DATE").unwrap_or("UNKNOWN");
    let pkg_version = env!("CARGO_PKG_VERSION");

    metrics::gauge!(
        "evm_gas_monitor_build_info",
        "version" => version,
        "commit" => build_commit,
        "date" => build_date,
        "pkg_version" => pkg_version
    )
    .set(1);
}
