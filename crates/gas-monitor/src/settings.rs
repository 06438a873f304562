use crate::{
    collector::DEFAULT_FEE_ORACLE_CHAINS,
    registry::{ApiKeys, EndpointRegistry, default_chain_templates},
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use config::{Config, Environment, File};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

const ENV_PREFIX: &str = "EVM_GAS";
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Parser)]
#[command(
    name = "evm-gas-monitor",
    about = "Serves gas prices scraped from public EVM RPC endpoints as Prometheus text",
    version,
    after_help = r#"Configuration:
    1. Environment variables with EVM_GAS__ prefix (e.g., EVM_GAS__API_KEYS__DRPC)
    2. .env file in the current directory
    3. Config file with -c option (TOML)"#
)]
pub struct AppArgs {
    /// Path to the configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the listen address, e.g. 127.0.0.1:3000
    #[arg(short = 'l', long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Address for the service's own Prometheus exporter; disabled when unset
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
    #[serde(default)]
    pub rpc: RpcSettings,
    #[serde(default)]
    pub api_keys: ApiKeys,
    /// Chains whose endpoints are also queried for the fee oracle fields
    #[serde(
        default = "default_fee_oracle_chains",
        deserialize_with = "comma_separated"
    )]
    pub fee_oracle_chains: Vec<String>,
    /// Chain → endpoint URL templates; the built-in table when unset
    #[serde(default)]
    pub chains: Option<IndexMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcSettings {
    /// Per-request deadline in milliseconds. Unset leaves slow endpoints unbounded.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Settings {
    /// Loads the optional config file, then environment overrides (`EVM_GAS__*`).
    pub fn new<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        // NOTE: a missing .env is fine
        let _ = dotenvy::dotenv();

        Self::from_sources(path, environment())
    }

    /// Environment values stay strings: API keys such as `00012345` must reach
    /// the URL templates unchanged.
    fn from_sources<P: AsRef<Path>>(path: Option<P>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(file) = path {
            builder = builder.add_source(File::with_name(&file.as_ref().to_string_lossy()));
        }

        let settings: Settings = builder
            .add_source(env)
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Applies the `--listen` override and re-runs validation against it.
    pub fn override_listen_addr(&mut self, listen_addr: SocketAddr) -> Result<()> {
        self.listen_addr = listen_addr;
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!(
                "Invalid log level '{}'. Valid options are: {:?}",
                self.log_level,
                VALID_LOG_LEVELS
            );
        }

        if self.rpc.timeout_ms == Some(0) {
            bail!("rpc.timeout_ms must be greater than 0");
        }

        if self.metrics_addr == Some(self.listen_addr) {
            bail!("metrics_addr must differ from listen_addr ({})", self.listen_addr);
        }

        self.registry()?;

        Ok(())
    }

    pub fn rpc_timeout(&self) -> Option<Duration> {
        self.rpc.timeout_ms.map(Duration::from_millis)
    }

    /// Resolves the configured (or built-in) chain table against the API keys.
    pub fn registry(&self) -> Result<EndpointRegistry> {
        let registry = match &self.chains {
            Some(chains) => EndpointRegistry::from_templates(chains, &self.api_keys),
            None => EndpointRegistry::from_templates(&default_chain_templates(), &self.api_keys),
        };
        registry.context("Failed to resolve endpoint registry")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            listen_addr: default_listen_addr(),
            metrics_addr: None,
            rpc: RpcSettings::default(),
            api_keys: ApiKeys::default(),
            fee_oracle_chains: default_fee_oracle_chains(),
            chains: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000))
}

fn default_fee_oracle_chains() -> Vec<String> {
    DEFAULT_FEE_ORACLE_CHAINS.iter().map(|c| c.to_string()).collect()
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}

/// Accepts a TOML array or a comma-separated string (`EVM_GAS__FEE_ORACLE_CHAINS=optimism,base`).
fn comma_separated<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrString {
        List(Vec<String>),
        String(String),
    }

    Ok(match ListOrString::deserialize(deserializer)? {
        ListOrString::List(items) => items,
        ListOrString::String(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
