//! Minimal Ethereum JSON-RPC 2.0 client over HTTP.

use ballot_types::{Address, TxHash};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::error::ContractError;
use crate::interface::TxReceipt;
use crate::revert::RevertReason;

/// `0x`-prefixed hex of arbitrary bytes.
pub fn to_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Minimal `0x`-prefixed hex quantity.
pub fn to_quantity(value: u128) -> String {
    format!("0x{value:x}")
}

pub fn parse_data(s: &str) -> Result<Vec<u8>, ContractError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| ContractError::Decode(format!("invalid hex data {s:?}: {e}")))
}

pub fn parse_quantity(s: &str) -> Result<u128, ContractError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ContractError::Decode(format!("invalid quantity {s:?}: {e}")))
}

fn parse_quantity_u64(s: &str) -> Result<u64, ContractError> {
    let value = parse_quantity(s)?;
    u64::try_from(value).map_err(|_| ContractError::Decode(format!("quantity {s} exceeds u64")))
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptBody {
    transaction_hash: String,
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    gas_used: Option<String>,
}

/// A receipt as the node reports it, before success/failure is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawReceipt {
    pub receipt: TxReceipt,
    pub success: bool,
}

/// Turn a JSON-RPC error into a revert when it carries revert data or says so.
fn classify_error(err: RpcErrorBody) -> ContractError {
    let data = err.data.as_ref().and_then(|d| match d {
        Value::String(s) => Some(s.clone()),
        Value::Object(o) => o.get("data").and_then(|v| v.as_str()).map(str::to_string),
        _ => None,
    });
    if let Some(bytes) = data.as_deref().and_then(|s| parse_data(s).ok()) {
        return ContractError::Reverted(RevertReason::decode(&bytes));
    }
    if err.code == 3 || err.message.contains("execution reverted") {
        return ContractError::Reverted(RevertReason::Reverted);
    }
    ContractError::Rpc {
        code: err.code,
        message: err.message,
    }
}

/// HTTP client for an Ethereum node.
///
/// Wraps `reqwest::Client` with the node URL and an id counter; exposes typed
/// methods for the `eth_*` calls the ballot client needs.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, ContractError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ContractError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and return its `result`.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ContractError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        debug!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ContractError::Transport(format!("{method} request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ContractError::Transport(format!(
                "{method}: node returned HTTP {}",
                response.status()
            )));
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ContractError::Transport(format!("{method}: invalid JSON response: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(classify_error(err));
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }

    async fn request_str(&self, method: &str, params: Value) -> Result<String, ContractError> {
        match self.request(method, params).await? {
            Value::String(s) => Ok(s),
            other => Err(ContractError::Decode(format!(
                "{method}: expected string result, got {other}"
            ))),
        }
    }

    pub async fn chain_id(&self) -> Result<u64, ContractError> {
        parse_quantity_u64(&self.request_str("eth_chainId", json!([])).await?)
    }

    pub async fn get_code(&self, address: Address) -> Result<Vec<u8>, ContractError> {
        let code = self
            .request_str("eth_getCode", json!([address.to_string(), "latest"]))
            .await?;
        parse_data(&code)
    }

    /// `eth_call` against `to`, optionally as `from` and at a given block.
    pub async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: &[u8],
        block: Option<u64>,
    ) -> Result<Vec<u8>, ContractError> {
        let mut tx = json!({ "to": to.to_string(), "data": to_data(data) });
        if let Some(from) = from {
            tx["from"] = json!(from.to_string());
        }
        let block = block
            .map(|b| to_quantity(u128::from(b)))
            .unwrap_or_else(|| "latest".to_string());
        parse_data(&self.request_str("eth_call", json!([tx, block])).await?)
    }

    pub async fn transaction_count(&self, address: Address) -> Result<u64, ContractError> {
        parse_quantity_u64(
            &self
                .request_str(
                    "eth_getTransactionCount",
                    json!([address.to_string(), "pending"]),
                )
                .await?,
        )
    }

    pub async fn gas_price(&self) -> Result<u128, ContractError> {
        parse_quantity(&self.request_str("eth_gasPrice", json!([])).await?)
    }

    pub async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
    ) -> Result<u64, ContractError> {
        let tx = json!({ "from": from.to_string(), "to": to.to_string(), "data": to_data(data) });
        parse_quantity_u64(&self.request_str("eth_estimateGas", json!([tx])).await?)
    }

    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, ContractError> {
        let hash = self
            .request_str("eth_sendRawTransaction", json!([to_data(raw)]))
            .await?;
        hash.parse()
            .map_err(|e| ContractError::Decode(format!("invalid tx hash {hash}: {e}")))
    }

    /// The receipt of `hash`, or `None` while it is not yet mined.
    pub async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<RawReceipt>, ContractError> {
        let value = self
            .request("eth_getTransactionReceipt", json!([hash.to_string()]))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        let body: ReceiptBody = serde_json::from_value(value)
            .map_err(|e| ContractError::Decode(format!("invalid receipt: {e}")))?;
        let Some(block_number) = body.block_number else {
            return Ok(None);
        };
        let tx_hash = body
            .transaction_hash
            .parse()
            .map_err(|e| ContractError::Decode(format!("invalid receipt hash: {e}")))?;
        Ok(Some(RawReceipt {
            receipt: TxReceipt {
                tx_hash,
                block_number: parse_quantity_u64(&block_number)?,
                gas_used: body
                    .gas_used
                    .as_deref()
                    .map(parse_quantity_u64)
                    .transpose()?
                    .unwrap_or(0),
            },
            success: body.status.as_deref().map_or(true, |s| s == "0x1"),
        }))
    }
}
