use crate::domain::keys::{decode_hex, StorageKey};
use crate::domain::model::{BlockHash, BlockNumber};
use crate::domain::ports::ChainSource;
use crate::utils::error::{ExportError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

/// JSON-RPC 2.0 client for a Substrate node's HTTP endpoint.
pub struct RpcClient {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct StorageChangeSet {
    #[allow(dead_code)]
    block: String,
    changes: Vec<(String, Option<String>)>,
}

impl RpcClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = http_endpoint(endpoint)?;
        let client = Client::builder().timeout(timeout).build()?;

        tracing::debug!("Using RPC endpoint {}", endpoint);
        Ok(Self {
            client,
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 回傳 `None` 表示節點回覆 `null`
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!("RPC #{} {}", id, method);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body: RpcResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(ExportError::RpcError {
                code: error.code,
                message: error.message,
            });
        }

        match body.result {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }
}

#[async_trait]
impl ChainSource for RpcClient {
    async fn block_hash(&self, number: BlockNumber) -> Result<Option<BlockHash>> {
        let hash: Option<String> = self.call("chain_getBlockHash", json!([number])).await?;
        hash.map(|hex| parse_block_hash(&hex)).transpose()
    }

    async fn storage(&self, key: &StorageKey, at: Option<&BlockHash>) -> Result<Option<Vec<u8>>> {
        let value: Option<String> = self
            .call("state_getStorage", json!([key.to_hex(), at.map(BlockHash::to_hex)]))
            .await?;
        value.map(|hex| decode_hex(&hex)).transpose()
    }

    async fn storage_keys_paged(
        &self,
        prefix: &StorageKey,
        count: u32,
        start_key: Option<&StorageKey>,
        at: Option<&BlockHash>,
    ) -> Result<Vec<StorageKey>> {
        let keys: Option<Vec<String>> = self
            .call(
                "state_getKeysPaged",
                json!([
                    prefix.to_hex(),
                    count,
                    start_key.map(StorageKey::to_hex),
                    at.map(BlockHash::to_hex)
                ]),
            )
            .await?;

        keys.unwrap_or_default()
            .iter()
            .map(|key| StorageKey::from_hex(key))
            .collect()
    }

    async fn query_storage_at(
        &self,
        keys: &[StorageKey],
        at: Option<&BlockHash>,
    ) -> Result<Vec<(StorageKey, Option<Vec<u8>>)>> {
        let hex_keys: Vec<String> = keys.iter().map(StorageKey::to_hex).collect();
        let change_sets: Option<Vec<StorageChangeSet>> = self
            .call(
                "state_queryStorageAt",
                json!([hex_keys, at.map(BlockHash::to_hex)]),
            )
            .await?;

        let mut values = Vec::with_capacity(keys.len());
        for change_set in change_sets.unwrap_or_default() {
            for (key, value) in change_set.changes {
                let value = value.map(|hex| decode_hex(&hex)).transpose()?;
                values.push((StorageKey::from_hex(&key)?, value));
            }
        }
        Ok(values)
    }
}

/// 將 websocket 端點轉為同主機、同埠的 HTTP 端點
pub fn http_endpoint(endpoint: &str) -> Result<String> {
    let invalid = |reason: String| ExportError::InvalidConfigValueError {
        field: "ws_url".to_string(),
        value: endpoint.to_string(),
        reason,
    };

    let mut url = Url::parse(endpoint).map_err(|e| invalid(format!("Invalid URL format: {}", e)))?;
    let scheme = match url.scheme() {
        "ws" | "http" => "http",
        "wss" | "https" => "https",
        other => return Err(invalid(format!("Unsupported URL scheme: {}", other))),
    };

    // set_scheme 會丟棄與新 scheme 預設值相同的埠號，先記下來
    let port = url.port();
    url.set_scheme(scheme)
        .map_err(|_| invalid("Cannot switch to an HTTP scheme".to_string()))?;
    url.set_port(port)
        .map_err(|_| invalid("Cannot keep the endpoint port".to_string()))?;

    Ok(url.to_string())
}

fn parse_block_hash(hex: &str) -> Result<BlockHash> {
    let bytes = decode_hex(hex)?;
    let hash: [u8; 32] = bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| ExportError::InvalidBlockHash {
            hash: hex.to_string(),
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        })?;
    Ok(BlockHash(hash))
}
