pub mod client;
pub mod collector;
mod error;
pub mod exposition;
pub mod metric;
pub mod registry;
pub mod server;
pub mod settings;
pub mod tally;

pub use client::EvmRpcClient;
pub use collector::Collector;
pub use error::{Error, Result};
pub use metric::{Metric, MetricName};
pub use registry::EndpointRegistry;
pub use tally::ErrorTally;
