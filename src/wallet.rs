//! Injected-wallet boundary (`window.ethereum`). Everything past the
//! `request` call is the wallet's business; errors come back as text for
//! the tracker's reason matching.

use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use pikuseru_core::Address;

#[derive(Debug, Clone, thiserror::Error)]
pub(crate) enum WalletError {
    #[error("no wallet provider found")]
    NoProvider,
    #[error("{0}")]
    Request(String),
    #[error("wallet returned malformed data")]
    Malformed,
}

fn provider() -> Option<Object> {
    let window = web_sys::window()?;
    let value = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    value.dyn_into::<Object>().ok()
}

fn js_error(value: JsValue) -> WalletError {
    let message = Reflect::get(&value, &JsValue::from_str("message"))
        .ok()
        .and_then(|field| field.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"));
    WalletError::Request(message)
}

async fn request(method: &str, params: Option<JsValue>) -> Result<JsValue, WalletError> {
    let provider = provider().ok_or(WalletError::NoProvider)?;
    let request_fn = Reflect::get(&provider, &JsValue::from_str("request"))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
        .ok_or(WalletError::NoProvider)?;

    let args = Object::new();
    Reflect::set(&args, &JsValue::from_str("method"), &JsValue::from_str(method))
        .map_err(js_error)?;
    if let Some(params) = params {
        Reflect::set(&args, &JsValue::from_str("params"), &params).map_err(js_error)?;
    }

    let promise: Promise = request_fn
        .call1(&provider, &args)
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| WalletError::Malformed)?;
    JsFuture::from(promise).await.map_err(js_error)
}

pub(crate) fn has_provider() -> bool {
    provider().is_some()
}

/// Prompt the wallet for account access and return the active address.
pub(crate) async fn connect() -> Result<Address, WalletError> {
    let accounts = request("eth_requestAccounts", None).await?;
    let list: Array = accounts.dyn_into().map_err(|_| WalletError::Malformed)?;
    let first = list.get(0).as_string().ok_or(WalletError::Malformed)?;
    Address::parse(&first).map_err(|_| WalletError::Malformed)
}

/// Submit a contract call. Returns the transaction hash the chain will
/// know it by.
pub(crate) async fn send_transaction(
    from: Address,
    to: &str,
    data: &[u8],
    value_wei: u128,
) -> Result<String, WalletError> {
    let tx = Object::new();
    let set = |key: &str, value: String| -> Result<(), WalletError> {
        Reflect::set(&tx, &JsValue::from_str(key), &JsValue::from_str(&value))
            .map_err(js_error)?;
        Ok(())
    };
    set("from", from.to_string())?;
    set("to", to.to_string())?;
    set("data", pikuseru_core::abi::to_hex(data))?;
    if value_wei > 0 {
        set("value", format!("0x{value_wei:x}"))?;
    }

    let params = Array::new();
    params.push(&tx);
    let result = request("eth_sendTransaction", Some(params.into())).await?;
    result.as_string().ok_or(WalletError::Malformed)
}
