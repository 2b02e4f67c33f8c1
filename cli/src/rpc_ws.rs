use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use pikuseru_core::abi::{from_hex, to_hex};
use pikuseru_core::RawLog;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// JSON-RPC over a websocket connection. Calls block until their matching
/// id comes back; subscription pushes are drained separately.
pub(crate) struct RpcSocket {
    stream: WsStream,
    next_id: u64,
}

impl RpcSocket {
    pub(crate) async fn connect(url: &Url) -> Result<Self, Box<dyn std::error::Error>> {
        let (stream, _response) = connect_async(url.as_str()).await?;
        Ok(Self { stream, next_id: 1 })
    }

    pub(crate) async fn call(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<Value, Box<dyn std::error::Error>> {
        let id = self.next_id;
        self.next_id += 1;
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        self.stream.send(Message::Text(body.to_string())).await?;
        loop {
            let Some(message) = self.stream.next().await else {
                return Err("connection closed".into());
            };
            let Message::Text(text) = message? else {
                continue;
            };
            let value: Value = serde_json::from_str(&text)?;
            if value.get("id").and_then(Value::as_u64) != Some(id) {
                continue;
            }
            if let Some(error) = value.get("error") {
                return Err(format!("rpc error: {error}").into());
            }
            return Ok(value.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    pub(crate) async fn eth_call(
        &mut self,
        to: &str,
        data: &[u8],
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let result = self
            .call("eth_call", json!([{ "to": to, "data": to_hex(data) }, "latest"]))
            .await?;
        let text = result.as_str().ok_or("eth_call result is not a string")?;
        Ok(from_hex(text)?)
    }

    pub(crate) async fn subscribe_logs(
        &mut self,
        address: &str,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let result = self
            .call("eth_subscribe", json!(["logs", { "address": address }]))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "subscription id missing".into())
    }

    /// Block until the next subscription push and return its log entry.
    pub(crate) async fn next_log(&mut self) -> Result<RawLog, Box<dyn std::error::Error>> {
        loop {
            let Some(message) = self.stream.next().await else {
                return Err("connection closed".into());
            };
            let Message::Text(text) = message? else {
                continue;
            };
            let value: Value = serde_json::from_str(&text)?;
            if value.get("method").and_then(Value::as_str) != Some("eth_subscription") {
                continue;
            }
            let Some(result) = value.pointer("/params/result") else {
                continue;
            };
            if let Some(log) = parse_raw_log(result) {
                return Ok(log);
            }
        }
    }
}

pub(crate) fn normalize_ws_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    let normalized = if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else {
        trimmed.to_string()
    };
    Url::parse(&normalized)
}

pub(crate) fn parse_raw_log(value: &Value) -> Option<RawLog> {
    let topics = value
        .get("topics")?
        .as_array()?
        .iter()
        .map(|topic| {
            let bytes = from_hex(topic.as_str()?).ok()?;
            <[u8; 32]>::try_from(bytes).ok()
        })
        .collect::<Option<Vec<_>>>()?;
    let data = value
        .get("data")
        .and_then(Value::as_str)
        .and_then(|text| from_hex(text).ok())
        .unwrap_or_default();
    Some(RawLog { topics, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_http_schemes() {
        assert_eq!(
            normalize_ws_url("https://testnet-rpc.monad.xyz").unwrap().as_str(),
            "wss://testnet-rpc.monad.xyz/"
        );
        assert_eq!(
            normalize_ws_url("http://localhost:8545").unwrap().scheme(),
            "ws"
        );
        assert_eq!(
            normalize_ws_url("wss://example.org/ws").unwrap().scheme(),
            "wss"
        );
    }

    #[test]
    fn parses_subscription_logs() {
        let value = serde_json::json!({
            "topics": [format!("0x{}", "11".repeat(32))],
            "data": "0x00",
        });
        let log = parse_raw_log(&value).unwrap();
        assert_eq!(log.topics.len(), 1);
        assert_eq!(log.data, vec![0]);

        let bad = serde_json::json!({ "topics": ["0x1234"] });
        assert!(parse_raw_log(&bad).is_none());
    }
}
