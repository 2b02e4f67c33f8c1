//! Externally supplied endpoints, baked in at build time with testnet
//! defaults, plus the small persisted boot preferences blob.

use serde::{Deserialize, Serialize};

const DEFAULT_CONTRACT_ADDRESS: &str = "0x82d0b70ad6fcdb8aad6048f86afca83d69f556b9";
const DEFAULT_RPC_URL: &str = "https://testnet-rpc.monad.xyz";
const DEFAULT_EXPLORER_TX_BASE: &str = "https://testnet.monadexplorer.com/tx/";
const DEFAULT_INDEXER_BASE: &str = "/api/indexer";
const DEFAULT_HEALTH_URL: &str = "/api/health";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AppConfig {
    pub(crate) contract_address: String,
    pub(crate) rpc_url: String,
    pub(crate) explorer_tx_base: String,
    pub(crate) indexer_base: String,
    pub(crate) health_url: String,
}

impl AppConfig {
    pub(crate) fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}{tx_hash}", self.explorer_tx_base)
    }
}

fn pick(primary: Option<&str>, trunk: Option<&str>, default_value: &str) -> String {
    for candidate in [primary, trunk].into_iter().flatten() {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    default_value.to_string()
}

pub(crate) fn load() -> AppConfig {
    AppConfig {
        contract_address: pick(
            option_env!("PIKUSERU_CONTRACT_ADDRESS"),
            option_env!("TRUNK_PUBLIC_PIKUSERU_CONTRACT_ADDRESS"),
            DEFAULT_CONTRACT_ADDRESS,
        ),
        rpc_url: pick(
            option_env!("PIKUSERU_RPC_URL"),
            option_env!("TRUNK_PUBLIC_PIKUSERU_RPC_URL"),
            DEFAULT_RPC_URL,
        ),
        explorer_tx_base: pick(
            option_env!("PIKUSERU_EXPLORER_TX_BASE"),
            option_env!("TRUNK_PUBLIC_PIKUSERU_EXPLORER_TX_BASE"),
            DEFAULT_EXPLORER_TX_BASE,
        ),
        indexer_base: pick(
            option_env!("PIKUSERU_INDEXER_BASE"),
            option_env!("TRUNK_PUBLIC_PIKUSERU_INDEXER_BASE"),
            DEFAULT_INDEXER_BASE,
        ),
        health_url: pick(
            option_env!("PIKUSERU_HEALTH_URL"),
            option_env!("TRUNK_PUBLIC_PIKUSERU_HEALTH_URL"),
            DEFAULT_HEALTH_URL,
        ),
    }
}

/// Boot preferences persisted across sessions. Canvas state itself is
/// never persisted locally; the chain is the source of truth.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct BootPrefs {
    #[serde(default)]
    pub(crate) show_sidebar: Option<bool>,
    #[serde(default)]
    pub(crate) last_position: Option<(u32, u32)>,
}

#[cfg(target_arch = "wasm32")]
const PREFS_KEY: &str = "pikuseru.prefs";

#[cfg(target_arch = "wasm32")]
pub(crate) fn load_prefs() -> BootPrefs {
    let Some(storage) = web_sys::window().and_then(|window| window.local_storage().ok().flatten())
    else {
        return BootPrefs::default();
    };
    storage
        .get_item(PREFS_KEY)
        .ok()
        .flatten()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn update_prefs(mutate: impl FnOnce(&mut BootPrefs)) {
    let Some(storage) = web_sys::window().and_then(|window| window.local_storage().ok().flatten())
    else {
        return;
    };
    let mut prefs = load_prefs();
    mutate(&mut prefs);
    if let Ok(raw) = serde_json::to_string(&prefs) {
        let _ = storage.set_item(PREFS_KEY, &raw);
    }
}

/// One GET against the backend health endpoint before the indexer-backed
/// views are enabled. The canvas itself works without it.
#[cfg(target_arch = "wasm32")]
pub(crate) async fn backend_healthy(config: &AppConfig) -> bool {
    match gloo::net::http::Request::get(&config.health_url).send().await {
        Ok(response) => response.ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_prefers_nonempty_values() {
        assert_eq!(pick(Some("a"), Some("b"), "c"), "a");
        assert_eq!(pick(Some("  "), Some("b"), "c"), "b");
        assert_eq!(pick(None, None, "c"), "c");
    }

    #[test]
    fn explorer_url_joins_base_and_hash() {
        let config = load();
        assert!(config.explorer_tx_url("0xabc").ends_with("/tx/0xabc"));
    }
}
