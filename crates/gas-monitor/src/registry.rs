//! Chain → endpoint registry. Endpoints are written as URL templates whose
//! `{placeholder}` segments are filled from the configured API keys; a
//! template that needs a key the operator did not provide is left out.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Provider keys available for template substitution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub alchemy: String,
    pub infura_project_id: String,
    pub pokt_portal: String,
    pub drpc: String,
    pub quiknode: String,
}

impl ApiKeys {
    fn lookup(&self, placeholder: &str) -> Option<&str> {
        match placeholder {
            "alchemy" => Some(self.alchemy.as_str()),
            "infura" => Some(self.infura_project_id.as_str()),
            "pokt" => Some(self.pokt_portal.as_str()),
            "drpc" => Some(self.drpc.as_str()),
            "quiknode" => Some(self.quiknode.as_str()),
            _ => None,
        }
    }
}

/// Public endpoints per chain, plus keyed providers that are only used when
/// their key is configured.
pub const DEFAULT_CHAINS: &[(&str, &[&str])] = &[
    (
        "ethereum",
        &[
            "https://eth-mainnet.alchemyapi.io/v2/{alchemy}",
            "https://mainnet.infura.io/v3/{infura}",
            "https://eth-mainnet.rpc.grove.city/v1/{pokt}",
            "https://lb.drpc.org/ogrpc?network=ethereum&dkey={drpc}",
            "https://cloudflare-eth.com",
            "https://rpc.ankr.com/eth",
        ],
    ),
    (
        "arbitrum",
        &[
            "https://arb1.arbitrum.io/rpc",
            "https://arbitrum-one.public.blastapi.io",
            "https://rpc.ankr.com/arbitrum",
            "https://arbitrum-one.rpc.grove.city/v1/lb/{pokt}",
            "https://lb.drpc.org/ogrpc?network=arbitrum&dkey={drpc}",
        ],
    ),
    (
        "optimism",
        &[
            "https://mainnet.optimism.io",
            "https://rpc.ankr.com/optimism",
            "https://lb.drpc.org/ogrpc?network=optimism&dkey={drpc}",
        ],
    ),
    (
        "polygon",
        &[
            "https://polygon-rpc.com/",
            "https://rpc.polycat.finance",
            "https://rpc-mainnet.maticvigil.com",
            "https://matic-mainnet.chainstacklabs.com",
            "https://rpc.ankr.com/polygon",
            "https://poly-mainnet.rpc.grove.city/v1/{pokt}",
            "https://rpc-mainnet.matic.quiknode.pro/{quiknode}/",
            "https://lb.drpc.org/ogrpc?network=polygon&dkey={drpc}",
        ],
    ),
    (
        "base",
        &[
            "https://lb.drpc.org/ogrpc?network=base&dkey={drpc}",
            "https://base-mainnet.public.blastapi.io",
            "https://rpc.ankr.com/base",
        ],
    ),
    (
        "binancesmartchain",
        &[
            "https://rpc.ankr.com/bsc",
            "https://bsc-dataseed.binance.org",
            "https://bsc-dataseed1.defibit.io",
            "https://bsc-dataseed1.ninicoin.io",
            "https://lb.drpc.org/ogrpc?network=bsc&dkey={drpc}",
        ],
    ),
    (
        "avalanche",
        &[
            "https://api.avax.network/ext/bc/C/rpc",
            "https://rpc.ankr.com/avalanche",
            "https://lb.drpc.org/ogrpc?network=avalanche&dkey={drpc}",
        ],
    ),
    (
        "fantom",
        &[
            "https://fantom-mainnet.rpc.grove.city/v1/{pokt}",
            "https://polished-empty-cloud.fantom.quiknode.pro/{quiknode}/",
            "https://rpc.ankr.com/fantom",
            "https://rpc.ftm.tools",
            "https://lb.drpc.org/ogrpc?network=fantom&dkey={drpc}",
        ],
    ),
    (
        "celo",
        &[
            "https://forno.celo.org",
            "https://rpc.ankr.com/celo",
            "https://celo-mainnet-rpc.allthatnode.com",
            "https://lb.drpc.org/ogrpc?network=celo&dkey={drpc}",
        ],
    ),
    (
        "zksync",
        &[
            "https://mainnet.era.zksync.io",
            "https://lb.drpc.org/ogrpc?network=zksync&dkey={drpc}",
        ],
    ),
    (
        "rsk",
        &[
            "https://public-node.rsk.co",
            "https://lb.drpc.org/ogrpc?network=rootstock&dkey={drpc}",
        ],
    ),
    ("pulsechain", &["https://rpc.pulsechain.com/"]),
    (
        "hyperevm",
        &[
            "https://rpc.hyperliquid.xyz/evm",
            "https://rpc.hypurrscan.io",
            "https://hyperliquid-json-rpc.stakely.io",
        ],
    ),
    ("sonic", &["https://rpc.soniclabs.com"]),
    (
        "filecoinfevm",
        &[
            "https://api.node.glif.io/",
            "https://rpc.ankr.com/filecoin",
            "https://lb.drpc.org/ogrpc?network=filecoin&dkey={drpc}",
        ],
    ),
    (
        "ethereumclassic",
        &[
            "https://etc.rivet.link",
            "https://geth-de.etc-network.info",
            "https://geth-at.etc-network.info",
            "https://etc.etcdesktop.com",
        ],
    ),
    ("botanix", &["https://rpc.botanixlabs.com"]),
    ("bobevm", &["https://rpc.gobob.xyz"]),
];

/// Built-in chain table as owned templates.
pub fn default_chain_templates() -> IndexMap<String, Vec<String>> {
    DEFAULT_CHAINS
        .iter()
        .map(|(chain, templates)| {
            (
                chain.to_string(),
                templates.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}

/// Resolved, read-only mapping of chain to endpoint URLs, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    chains: IndexMap<String, Vec<Url>>,
}

impl EndpointRegistry {
    pub fn new(chains: IndexMap<String, Vec<Url>>) -> Self {
        Self { chains }
    }

    /// Parses already-resolved URLs, e.g. `[("testchain", vec!["http://ok:8545"])]`.
    pub fn from_urls<C, U>(chains: impl IntoIterator<Item = (C, Vec<U>)>) -> Result<Self>
    where
        C: Into<String>,
        U: AsRef<str>,
    {
        let mut resolved = IndexMap::new();
        for (chain, urls) in chains {
            let chain = chain.into();
            let mut endpoints = Vec::with_capacity(urls.len());
            for url in urls {
                endpoints.push(parse_endpoint(&chain, url.as_ref())?);
            }
            resolved.entry(chain).or_insert_with(Vec::new).extend(endpoints);
        }
        Ok(Self::new(resolved))
    }

    /// Resolves URL templates against `keys`, dropping templates whose key is unset.
    pub fn from_templates(
        templates: &IndexMap<String, Vec<String>>,
        keys: &ApiKeys,
    ) -> Result<Self> {
        let mut chains = IndexMap::with_capacity(templates.len());
        for (chain, chain_templates) in templates {
            let mut endpoints = Vec::with_capacity(chain_templates.len());
            for template in chain_templates {
                if let Some(url) = resolve_template(chain, template, keys)? {
                    endpoints.push(parse_endpoint(chain, &url)?);
                }
            }
            chains.insert(chain.clone(), endpoints);
        }
        Ok(Self::new(chains))
    }

    pub fn chains(&self) -> impl Iterator<Item = (&str, &[Url])> {
        self.chains
            .iter()
            .map(|(chain, urls)| (chain.as_str(), urls.as_slice()))
    }

    /// Every (chain, endpoint) pair, chains in configuration order.
    pub fn endpoints(&self) -> impl Iterator<Item = (&str, &Url)> {
        self.chains
            .iter()
            .flat_map(|(chain, urls)| urls.iter().map(move |url| (chain.as_str(), url)))
    }

    pub fn endpoint_count(&self) -> usize {
        self.chains.values().map(Vec::len).sum()
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }
}

/// Short label for an endpoint: its host, or the full URL when it has none.
pub fn source_name(url: &Url) -> String {
    url.host_str()
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string())
}

fn parse_endpoint(chain: &str, raw: &str) -> Result<Url> {
    let invalid = |reason: String| Error::InvalidEndpoint {
        chain: chain.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|err| invalid(format!("{err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("url has no host".to_string()));
    }

    Ok(url)
}

fn resolve_template(chain: &str, template: &str, keys: &ApiKeys) -> Result<Option<String>> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let end = rest[start..]
            .find('}')
            .map(|offset| start + offset)
            .ok_or_else(|| Error::InvalidEndpoint {
                chain: chain.to_string(),
                reason: "unterminated placeholder in endpoint template".to_string(),
            })?;

        let placeholder = &rest[start + 1..end];
        let key = keys
            .lookup(placeholder)
            .ok_or_else(|| Error::InvalidEndpoint {
                chain: chain.to_string(),
                reason: format!("unknown placeholder {{{placeholder}}}"),
            })?;
        if key.is_empty() {
            return Ok(None);
        }

        resolved.push_str(&rest[..start]);
        resolved.push_str(key);
        rest = &rest[end + 1..];
    }
    resolved.push_str(rest);

    Ok(Some(resolved))
}
