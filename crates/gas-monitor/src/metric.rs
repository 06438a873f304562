use std::fmt;

/// Measurement kinds exported in the gas feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    GasPriceWei,
    BaseFeeWei,
    BlobBaseFeeWei,
    BaseFeeScalar,
    BlobBaseFeeScalar,
}

impl MetricName {
    /// Header order of the exposition format.
    pub const ALL: [MetricName; 5] = [
        MetricName::GasPriceWei,
        MetricName::BaseFeeWei,
        MetricName::BlobBaseFeeWei,
        MetricName::BaseFeeScalar,
        MetricName::BlobBaseFeeScalar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::GasPriceWei => "evm_gas_price_wei",
            MetricName::BaseFeeWei => "evm_base_fee_wei",
            MetricName::BlobBaseFeeWei => "evm_blob_base_fee_wei",
            MetricName::BaseFeeScalar => "evm_base_fee_scalar",
            MetricName::BlobBaseFeeScalar => "evm_blob_base_fee_scalar",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricName::GasPriceWei | MetricName::BaseFeeWei | MetricName::BlobBaseFeeWei => "wei",
            MetricName::BaseFeeScalar | MetricName::BlobBaseFeeScalar => "ratio",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sample gathered from one RPC source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    pub name: MetricName,
    /// Raw wei or ratio units.
    pub value: u128,
    /// Chain name like "optimism"
    pub chain: String,
    /// Host of the RPC endpoint, like "mainnet.optimism.io"
    pub source: String,
}

impl Metric {
    pub fn new(name: MetricName, value: u128, chain: &str, source: &str) -> Self {
        Self {
            name,
            value,
            chain: chain.to_string(),
            source: source.to_string(),
        }
    }
}
