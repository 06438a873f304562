use crate::{
    Result,
    client::rpc::EvmRpcClient,
    metric::{Metric, MetricName},
};
use futures::future::try_join_all;
use serde_json::json;
use url::Url;

/// OP-stack `GasPriceOracle` predeploy.
pub const FEE_ORACLE_ADDRESS: &str = "0x420000000000000000000000000000000000000F";

/// Oracle getters and the metric each one feeds.
pub const FEE_ORACLE_QUERIES: [(MetricName, &str); 4] = [
    // l1BaseFee()
    (MetricName::BaseFeeWei, "0x519b4bd3"),
    // blobBaseFee()
    (MetricName::BlobBaseFeeWei, "0xf8206140"),
    // baseFeeScalar()
    (MetricName::BaseFeeScalar, "0xc5985918"),
    // blobBaseFeeScalar()
    (MetricName::BlobBaseFeeScalar, "0x68d5dca6"),
];

impl EvmRpcClient {
    pub async fn fetch_gas_price(&self, chain: &str, source: &str, url: &Url) -> Result<Metric> {
        let value = self
            .call_hex(url, source, "gasPrice", "eth_gasPrice", json!([]))
            .await?;

        Ok(Metric::new(MetricName::GasPriceWei, value, chain, source))
    }

    /// Reads all four oracle fields concurrently. The batch is all-or-nothing:
    /// the first failing call aborts it and its error names the lost metric.
    pub async fn fetch_fee_oracle_metrics(
        &self,
        chain: &str,
        source: &str,
        url: &Url,
    ) -> Result<Vec<Metric>> {
        try_join_all(FEE_ORACLE_QUERIES.iter().map(|(name, selector)| async move {
            let params = json!([{ "to": FEE_ORACLE_ADDRESS, "data": selector }, "latest"]);
            self.call_hex(url, source, name.as_str(), "eth_call", params)
                .await
                .map(|value| Metric::new(*name, value, chain, source))
        }))
        .await
    }
}
