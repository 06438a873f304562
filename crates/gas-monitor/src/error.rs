use thiserror::Error;

pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Non-success status, or the endpoint could not be reached at all.
    #[error("could not fetch {label} from {source_name}: {reason}")]
    Transport {
        label: String,
        source_name: String,
        reason: String,
    },
    /// The endpoint answered, but not with a `0x`-prefixed hex `result`.
    #[error("could not decode {label} from {source_name}: {reason}")]
    Decode {
        label: String,
        source_name: String,
        reason: String,
    },
    /// A fault outside the per-endpoint isolation boundary.
    #[error("collection cycle failed: {0}")]
    CollectionCycle(String),
    #[error("invalid endpoint for chain {chain}: {reason}")]
    InvalidEndpoint { chain: String, reason: String },
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn transport(label: &str, source_name: &str, reason: impl ToString) -> Self {
        Error::Transport {
            label: label.to_string(),
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(label: &str, source_name: &str, reason: impl ToString) -> Self {
        Error::Decode {
            label: label.to_string(),
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Per-endpoint failures, absorbed into the error tally instead of failing the cycle.
    pub fn is_source_failure(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Decode { .. })
    }
}
