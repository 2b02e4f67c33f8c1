//! Read-only client for the NFT indexing service that backs the token
//! list views, with a short-TTL response cache in front of it.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::Deserialize;

use pikuseru_core::{cell_coords, is_composite_id, Address, CellKey};

pub(crate) const INDEXER_CACHE_TTL_MS: f64 = 60_000.0;
pub(crate) const DEFAULT_PAGE_LIMIT: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenFilter {
    Pixels,
    Composites,
}

impl TokenFilter {
    fn label(self) -> &'static str {
        match self {
            TokenFilter::Pixels => "pixels",
            TokenFilter::Composites => "composites",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NftItem {
    pub(crate) token_id: u64,
    pub(crate) owner: Option<Address>,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) image: String,
    pub(crate) cell: Option<CellKey>,
    pub(crate) minted_at: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum IndexerError {
    #[error("indexer response malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("indexer request failed: {0}")]
    Request(String),
    #[error("metadata decode failed: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct ListingResponse {
    tokens: Vec<TokenEnvelope>,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    token: TokenRecord,
}

#[derive(Deserialize)]
struct TokenRecord {
    #[serde(rename = "tokenId")]
    token_id: String,
    contract: Option<String>,
    name: Option<String>,
    description: Option<String>,
    image: Option<String>,
    owner: Option<String>,
    #[serde(rename = "mintedAt")]
    minted_at: Option<String>,
}

/// Parse one listing page, keeping only tokens that match the filter (and
/// the contract, when the endpoint mixes collections). Tokens without a
/// name are dropped; the indexer occasionally returns them before
/// metadata propagates.
pub(crate) fn parse_listing(
    json: &str,
    filter: TokenFilter,
    contract: Option<&str>,
) -> Result<Vec<NftItem>, IndexerError> {
    let listing: ListingResponse = serde_json::from_str(json)?;
    Ok(listing
        .tokens
        .into_iter()
        .filter_map(|envelope| convert(envelope.token, filter, contract))
        .collect())
}

fn convert(record: TokenRecord, filter: TokenFilter, contract: Option<&str>) -> Option<NftItem> {
    if let (Some(expected), Some(actual)) = (contract, record.contract.as_deref()) {
        if !actual.eq_ignore_ascii_case(expected) {
            return None;
        }
    }
    let token_id = record.token_id.parse::<u64>().ok()?;
    let name = record.name?;
    let keep = match filter {
        TokenFilter::Pixels => name.contains("Pixel (") && !name.contains("Composite"),
        TokenFilter::Composites => name.contains("Composite"),
    };
    if !keep {
        return None;
    }
    let cell = if is_composite_id(token_id) {
        None
    } else {
        cell_coords(token_id).ok()
    };
    Some(NftItem {
        token_id,
        owner: record
            .owner
            .as_deref()
            .and_then(|owner| Address::parse(owner).ok()),
        name,
        description: record.description.unwrap_or_default(),
        image: record.image.unwrap_or_default(),
        cell,
        minted_at: record.minted_at,
    })
}

/// Inline metadata from `tokenURI` (`data:application/json;base64,...`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct NftMetadata {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) image: String,
}

pub(crate) fn decode_metadata(token_uri: &str) -> Result<NftMetadata, IndexerError> {
    let payload = token_uri
        .strip_prefix("data:application/json;base64,")
        .unwrap_or(token_uri);
    let bytes = base64::decode(payload).map_err(|err| IndexerError::Decode(err.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Time-bounded memoization of listing responses, keyed by
/// `kind-owner-filter`.
pub(crate) struct ResponseCache {
    entries: RefCell<HashMap<String, (f64, Vec<NftItem>)>>,
}

impl ResponseCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn key(kind: &str, owner: Option<&Address>, filter: TokenFilter) -> String {
        let owner = owner
            .map(|address| address.to_string())
            .unwrap_or_else(|| "all".to_string());
        format!("{kind}-{owner}-{}", filter.label())
    }

    pub(crate) fn get(&self, key: &str, now_ms: f64) -> Option<Vec<NftItem>> {
        let entries = self.entries.borrow();
        let (stored_at, items) = entries.get(key)?;
        if now_ms - stored_at < INDEXER_CACHE_TTL_MS {
            Some(items.clone())
        } else {
            None
        }
    }

    pub(crate) fn put(&self, key: String, items: Vec<NftItem>, now_ms: f64) {
        self.entries.borrow_mut().insert(key, (now_ms, items));
    }

    pub(crate) fn clear(&self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.entries.borrow_mut().remove(key);
            }
            None => self.entries.borrow_mut().clear(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) mod remote {
    use super::*;

    use gloo::net::http::Request;

    use crate::config::AppConfig;

    pub(crate) async fn collection(
        config: &AppConfig,
        filter: TokenFilter,
        limit: usize,
    ) -> Result<Vec<NftItem>, IndexerError> {
        let url = format!(
            "{}/collection?collection={}&limit={limit}",
            config.indexer_base, config.contract_address
        );
        fetch(&url, filter, None).await
    }

    pub(crate) async fn by_owner(
        config: &AppConfig,
        owner: &Address,
        filter: TokenFilter,
        limit: usize,
    ) -> Result<Vec<NftItem>, IndexerError> {
        let url = format!(
            "{}/user?address={owner}&limit={limit}",
            config.indexer_base
        );
        // The user endpoint mixes collections, so filter by contract.
        fetch(&url, filter, Some(&config.contract_address)).await
    }

    async fn fetch(
        url: &str,
        filter: TokenFilter,
        contract: Option<&str>,
    ) -> Result<Vec<NftItem>, IndexerError> {
        let response = Request::get(url)
            .send()
            .await
            .map_err(|err| IndexerError::Request(err.to_string()))?;
        if !response.ok() {
            return Err(IndexerError::Request(format!(
                "status {} from {url}",
                response.status()
            )));
        }
        let text = response
            .text()
            .await
            .map_err(|err| IndexerError::Request(err.to_string()))?;
        parse_listing(&text, filter, contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "tokens": [
            {"token": {"tokenId": "3010", "name": "Pixel (10, 20)", "owner": "0x00000000000000000000000000000000000000aa", "image": "img-a"}},
            {"token": {"tokenId": "3011", "name": null, "image": "img-b"}},
            {"token": {"tokenId": "100001", "name": "Composite #1", "image": "img-c"}},
            {"token": {"tokenId": "12", "name": "Pixel (12, 0)", "contract": "0x00000000000000000000000000000000000000ff", "image": "img-d"}}
        ]
    }"#;

    #[test]
    fn filters_pixels_and_drops_nameless_tokens() {
        let items = parse_listing(LISTING, TokenFilter::Pixels, None).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].token_id, 3010);
        assert_eq!(items[0].cell, Some((10, 20)));
        assert_eq!(items[1].token_id, 12);
    }

    #[test]
    fn filters_composites_without_cells() {
        let items = parse_listing(LISTING, TokenFilter::Composites, None).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].token_id, 100_001);
        assert_eq!(items[0].cell, None);
    }

    #[test]
    fn contract_mismatch_is_dropped() {
        let expected = "0x00000000000000000000000000000000000000ee";
        let items = parse_listing(LISTING, TokenFilter::Pixels, Some(expected)).unwrap();
        // Only the entry with a contract field can mismatch.
        assert_eq!(items.iter().filter(|item| item.token_id == 12).count(), 0);
    }

    #[test]
    fn cache_expires_after_ttl() {
        let cache = ResponseCache::new();
        let key = ResponseCache::key("minted", None, TokenFilter::Pixels);
        assert_eq!(key, "minted-all-pixels");

        let items = parse_listing(LISTING, TokenFilter::Pixels, None).unwrap();
        cache.put(key.clone(), items.clone(), 1_000.0);
        assert_eq!(cache.get(&key, 2_000.0), Some(items.clone()));
        assert_eq!(cache.get(&key, 1_000.0 + INDEXER_CACHE_TTL_MS), None);

        cache.put(key.clone(), items, 1_000.0);
        cache.clear(Some(&key));
        assert_eq!(cache.get(&key, 1_500.0), None);
    }

    #[test]
    fn decodes_base64_metadata() {
        let metadata = r#"{"name":"Pixel (10, 20)","description":"","image":"data:image/svg+xml;base64,AA=="}"#;
        let uri = format!(
            "data:application/json;base64,{}",
            base64::encode(metadata.as_bytes())
        );
        let decoded = decode_metadata(&uri).unwrap();
        assert_eq!(decoded.name, "Pixel (10, 20)");
        assert!(decode_metadata("data:application/json;base64,!!!").is_err());
    }
}
