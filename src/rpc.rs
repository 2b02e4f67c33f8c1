use std::cell::Cell;

use gloo::net::http::Request;
use serde_json::{json, Value};

use pikuseru_core::abi::{from_hex, to_hex};
use pikuseru_core::RawLog;

/// JSON-RPC over fetch. One client per RPC endpoint; request ids are only
/// used to satisfy the protocol, responses come back on the same fetch.
pub(crate) struct RpcClient {
    url: String,
    next_id: Cell<u64>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub(crate) enum RpcError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("rpc {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("decode: {0}")]
    Decode(String),
}

pub(crate) struct TxReceipt {
    pub(crate) status: bool,
}

impl RpcClient {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            next_id: Cell::new(1),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = Request::post(&self.url)
            .json(&body)
            .map_err(|err| RpcError::Transport(err.to_string()))?
            .send()
            .await
            .map_err(|err| RpcError::Transport(err.to_string()))?;
        let value: Value = response
            .json()
            .await
            .map_err(|err| RpcError::Transport(err.to_string()))?;
        if let Some(error) = value.get("error") {
            return Err(RpcError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown rpc error")
                    .to_string(),
            });
        }
        Ok(value.get("result").cloned().unwrap_or(Value::Null))
    }

    pub(crate) async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let result = self
            .request(
                "eth_call",
                json!([{ "to": to, "data": to_hex(data) }, "latest"]),
            )
            .await?;
        let text = result
            .as_str()
            .ok_or_else(|| RpcError::Decode("eth_call result is not a string".into()))?;
        from_hex(text).map_err(|err| RpcError::Decode(err.to_string()))
    }

    pub(crate) async fn block_number(&self) -> Result<u64, RpcError> {
        parse_quantity(&self.request("eth_blockNumber", json!([])).await?)
    }

    pub(crate) async fn get_logs(
        &self,
        address: &str,
        from_block: u64,
    ) -> Result<Vec<RawLog>, RpcError> {
        let result = self
            .request(
                "eth_getLogs",
                json!([{
                    "address": address,
                    "fromBlock": format!("0x{from_block:x}"),
                    "toBlock": "latest",
                }]),
            )
            .await?;
        let entries = result
            .as_array()
            .ok_or_else(|| RpcError::Decode("eth_getLogs result is not an array".into()))?;
        entries.iter().map(parse_log).collect()
    }

    pub(crate) async fn transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TxReceipt>, RpcError> {
        let result = self
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let status = result
            .get("status")
            .and_then(Value::as_str)
            .map(|text| text == "0x1")
            .unwrap_or(false);
        Ok(Some(TxReceipt { status }))
    }
}

fn parse_quantity(value: &Value) -> Result<u64, RpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Decode("quantity is not a string".into()))?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u64::from_str_radix(digits, 16).map_err(|err| RpcError::Decode(err.to_string()))
}

fn parse_log(value: &Value) -> Result<RawLog, RpcError> {
    let raw_topics = value
        .get("topics")
        .and_then(Value::as_array)
        .ok_or_else(|| RpcError::Decode("log entry has no topics".into()))?;
    let mut topics = Vec::with_capacity(raw_topics.len());
    for topic in raw_topics {
        let text = topic
            .as_str()
            .ok_or_else(|| RpcError::Decode("log topic is not a string".into()))?;
        let bytes = from_hex(text).map_err(|err| RpcError::Decode(err.to_string()))?;
        let word: [u8; 32] = bytes
            .try_into()
            .map_err(|_| RpcError::Decode("log topic is not 32 bytes".into()))?;
        topics.push(word);
    }
    let data = value
        .get("data")
        .and_then(Value::as_str)
        .map(from_hex)
        .transpose()
        .map_err(|err| RpcError::Decode(err.to_string()))?
        .unwrap_or_default();
    Ok(RawLog { topics, data })
}
