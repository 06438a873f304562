use crate::{
    Error, Result,
    client::EvmRpcClient,
    metric::Metric,
    registry::{EndpointRegistry, source_name},
    tally::ErrorTally,
};
use indexmap::IndexMap;
use std::{collections::HashSet, sync::Arc, time::Instant};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, warn};
use url::Url;

/// OP-stack chains exposing the `GasPriceOracle` predeploy.
pub const DEFAULT_FEE_ORACLE_CHAINS: [&str; 2] = ["optimism", "base"];

/// Fans out one task per (chain, endpoint) and gathers whatever succeeds.
#[derive(Debug, Clone)]
pub struct Collector {
    client: EvmRpcClient,
    tally: Arc<ErrorTally>,
    fee_oracle_chains: Arc<HashSet<String>>,
}

impl Collector {
    pub fn new<I, S>(client: EvmRpcClient, fee_oracle_chains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_tally(client, fee_oracle_chains, Arc::new(ErrorTally::new()))
    }

    pub fn with_tally<I, S>(
        client: EvmRpcClient,
        fee_oracle_chains: I,
        tally: Arc<ErrorTally>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
            tally,
            fee_oracle_chains: Arc::new(fee_oracle_chains.into_iter().map(Into::into).collect()),
        }
    }

    pub fn tally(&self) -> &Arc<ErrorTally> {
        &self.tally
    }

    pub fn error_snapshot(&self) -> IndexMap<String, u64> {
        self.tally.snapshot()
    }

    pub fn is_fee_oracle_chain(&self, chain: &str) -> bool {
        self.fee_oracle_chains.contains(chain)
    }

    /// Runs one full sweep over `registry`.
    ///
    /// Endpoint failures are counted in the tally and never fail the sweep;
    /// only a task that dies outside its own error handling does. Metrics are
    /// returned in completion order.
    pub async fn collect_all(&self, registry: &EndpointRegistry) -> Result<Vec<Metric>> {
        let started = Instant::now();
        let mut tasks = JoinSet::new();

        for (chain, url) in registry.endpoints() {
            let client = self.client.clone();
            let tally = self.tally.clone();
            let chain = chain.to_string();
            let url = url.clone();
            let fee_oracle = self.is_fee_oracle_chain(&chain);

            tasks.spawn(async move {
                collect_endpoint(&client, &tally, &chain, &url, fee_oracle).await
            });
        }

        let harvest = drain(tasks).await;

        metrics::counter!("evm_gas_monitor_collections").increment(1);
        metrics::histogram!("evm_gas_monitor_collection_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        debug!(
            endpoints = registry.endpoint_count(),
            metrics = harvest.metrics.len(),
            failures = harvest.failures,
            faulted = harvest.fault.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collection cycle complete"
        );

        harvest.into_metrics()
    }
}

/// What a set of endpoint tasks gathered.
#[derive(Debug, Default)]
pub(crate) struct Harvest {
    pub(crate) metrics: Vec<Metric>,
    pub(crate) failures: usize,
    pub(crate) fault: Option<JoinError>,
}

impl Harvest {
    fn absorb(&mut self, other: Harvest) {
        self.metrics.extend(other.metrics);
        self.failures += other.failures;
    }

    pub(crate) fn into_metrics(self) -> Result<Vec<Metric>> {
        match self.fault {
            Some(err) => {
                metrics::counter!("evm_gas_monitor_collection_faults").increment(1);
                Err(Error::CollectionCycle(err.to_string()))
            }
            None => Ok(self.metrics),
        }
    }
}

/// Joins every task, even after one has faulted, so sibling failures still
/// land in the tally. The first fault is kept.
pub(crate) async fn drain(mut tasks: JoinSet<Harvest>) -> Harvest {
    let mut harvest = Harvest::default();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(found) => harvest.absorb(found),
            Err(err) => {
                error!(%err, "collection task failed");
                harvest.fault.get_or_insert(err);
            }
        }
    }

    harvest
}

async fn collect_endpoint(
    client: &EvmRpcClient,
    tally: &ErrorTally,
    chain: &str,
    url: &Url,
    fee_oracle: bool,
) -> Harvest {
    let source = source_name(url);
    let mut harvest = Harvest::default();

    match client.fetch_gas_price(chain, &source, url).await {
        Ok(metric) => harvest.metrics.push(metric),
        Err(err) => {
            record_failure(tally, chain, &source, &err);
            harvest.failures += 1;
            return harvest;
        }
    }

    if fee_oracle {
        match client.fetch_fee_oracle_metrics(chain, &source, url).await {
            Ok(found) => harvest.metrics.extend(found),
            Err(err) => {
                record_failure(tally, chain, &source, &err);
                harvest.failures += 1;
            }
        }
    }

    harvest
}

fn record_failure(tally: &ErrorTally, chain: &str, source: &str, err: &Error) {
    warn!(source, chain, error = %err, "rpc source failed");
    tally.record_failure(source);
    metrics::counter!("evm_gas_monitor_source_failures", "source" => source.to_string())
        .increment(1);
}
