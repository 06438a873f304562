//! Single-shot JSON-RPC over HTTP POST. Every call either yields a decoded
//! hex quantity or fails immediately; retries are left to the next cycle.

use crate::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const JSONRPC_VERSION: &str = "2.0";
const REQUEST_ID: u64 = 1;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// Only the `result` member is read; `error` objects and ids are ignored.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct EvmRpcClient {
    http: reqwest::Client,
}

impl EvmRpcClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::from_client(builder.build()?))
    }

    /// Wraps a preconfigured client, e.g. one with DNS overrides.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Issues `method` against `url` and decodes the hex `result`.
    ///
    /// `label` names what is being fetched so failures can say which value was
    /// lost; `source` is the short host identifier used in errors.
    pub async fn call_hex(
        &self,
        url: &Url,
        source: &str,
        label: &str,
        method: &str,
        params: Value,
    ) -> Result<u128> {
        let request = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: REQUEST_ID,
            method,
            params,
        };

        let response = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| Error::transport(label, source, err.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(label, source, format!("http status {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| Error::transport(label, source, err.without_url()))?;

        let value = decode_result(&body).map_err(|reason| Error::decode(label, source, reason))?;
        debug!(source, method, label, %value, "rpc call completed");

        Ok(value)
    }
}

fn decode_result(body: &[u8]) -> std::result::Result<u128, String> {
    let response: JsonRpcResponse =
        serde_json::from_slice(body).map_err(|err| format!("invalid json-rpc response: {err}"))?;

    match response.result {
        Some(Value::String(raw)) => parse_hex_quantity(&raw),
        Some(other) => Err(format!("expected hex string, got: {other}")),
        None => Err("response has no result".to_string()),
    }
}

/// Parses a `0x`-prefixed hex string into an unsigned integer.
///
/// Zero-padded 32-byte words from `eth_call` are accepted as long as the
/// significant digits fit in 128 bits.
pub fn parse_hex_quantity(raw: &str) -> std::result::Result<u128, String> {
    let digits = raw
        .strip_prefix("0x")
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| format!("expected hex string, got: {raw}"))?;

    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(0);
    }
    if significant.len() > 32 {
        return Err(format!("hex value exceeds 128 bits: {raw}"));
    }

    u128::from_str_radix(significant, 16).map_err(|err| format!("invalid hex value {raw}: {err}"))
}
