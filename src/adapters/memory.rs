use crate::domain::keys::{decode_hex, StorageKey};
use crate::domain::model::{BlockHash, BlockNumber};
use crate::domain::ports::ChainSource;
use crate::utils::error::{ExportError, Result};
use async_trait::async_trait;
use parity_scale_codec::Encode;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;

/// Chain state held in memory, e.g. a raw state dump of a stopped chain.
///
/// All reads observe the same state regardless of the requested block.
#[derive(Debug, Clone, Default)]
pub struct MemoryChain {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `{"0xkey": "0xvalue"}` or a raw chain spec (`genesis.raw.top`).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let json: Value = serde_json::from_str(&content)?;
        let chain = Self::from_json(&json)?;

        tracing::info!(
            "Loaded {} raw storage entries from {}",
            chain.len(),
            path.as_ref().display()
        );
        Ok(chain)
    }

    pub fn from_json(json: &Value) -> Result<Self> {
        let top = json
            .pointer("/genesis/raw/top")
            .unwrap_or(json)
            .as_object()
            .ok_or_else(|| {
                ExportError::config("Raw state must be an object of hex keys to hex values")
            })?;

        let mut chain = Self::new();
        for (key, value) in top {
            let value = value.as_str().ok_or_else(|| {
                ExportError::config(format!("Raw state value for {} is not a hex string", key))
            })?;
            chain.entries.insert(decode_hex(key)?, decode_hex(value)?);
        }
        Ok(chain)
    }

    pub fn insert(&mut self, key: StorageKey, value: Vec<u8>) {
        self.entries.insert(key.0, value);
    }

    pub fn insert_encoded<V: Encode>(&mut self, key: StorageKey, value: &V) {
        self.insert(key, value.encode());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ChainSource for MemoryChain {
    async fn block_hash(&self, number: BlockNumber) -> Result<Option<BlockHash>> {
        let mut hash = [0u8; 32];
        hash[28..].copy_from_slice(&number.to_be_bytes());
        Ok(Some(BlockHash(hash)))
    }

    async fn storage(&self, key: &StorageKey, _at: Option<&BlockHash>) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(&key.0).cloned())
    }

    async fn storage_keys_paged(
        &self,
        prefix: &StorageKey,
        count: u32,
        start_key: Option<&StorageKey>,
        _at: Option<&BlockHash>,
    ) -> Result<Vec<StorageKey>> {
        let lower = match start_key {
            Some(start) => Bound::Excluded(start.0.clone()),
            None => Bound::Included(prefix.0.clone()),
        };

        Ok(self
            .entries
            .range((lower, Bound::Unbounded))
            .map(|(key, _)| key)
            .skip_while(|key| key.as_slice() < prefix.as_bytes())
            .take_while(|key| key.starts_with(prefix.as_bytes()))
            .take(count as usize)
            .map(|key| StorageKey(key.clone()))
            .collect())
    }

    async fn query_storage_at(
        &self,
        keys: &[StorageKey],
        _at: Option<&BlockHash>,
    ) -> Result<Vec<(StorageKey, Option<Vec<u8>>)>> {
        Ok(keys
            .iter()
            .map(|key| (key.clone(), self.entries.get(&key.0).cloned()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(bytes: &[u8]) -> StorageKey {
        StorageKey(bytes.to_vec())
    }

    #[tokio::test]
    async fn test_keys_paged_stays_within_prefix() {
        let mut chain = MemoryChain::new();
        chain.insert(key(&[1, 0]), vec![0]);
        chain.insert(key(&[2, 1]), vec![1]);
        chain.insert(key(&[2, 2]), vec![2]);
        chain.insert(key(&[2, 3]), vec![3]);
        chain.insert(key(&[3, 0]), vec![4]);

        let first = chain
            .storage_keys_paged(&key(&[2]), 2, None, None)
            .await
            .unwrap();
        assert_eq!(first, vec![key(&[2, 1]), key(&[2, 2])]);

        let second = chain
            .storage_keys_paged(&key(&[2]), 2, first.last(), None)
            .await
            .unwrap();
        assert_eq!(second, vec![key(&[2, 3])]);
    }

    #[test]
    fn test_loads_raw_chain_spec() {
        let spec = json!({
            "name": "Local",
            "genesis": { "raw": { "top": { "0x0102": "0x2a", "0x0103": "0x" } } }
        });

        let chain = MemoryChain::from_json(&spec).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.entries.get(&vec![1, 2]), Some(&vec![42]));
    }

    #[test]
    fn test_rejects_non_string_values() {
        assert!(MemoryChain::from_json(&json!({ "0x01": 5 })).is_err());
        assert!(MemoryChain::from_json(&json!(["0x01"])).is_err());
    }

    #[tokio::test]
    async fn test_query_storage_at_reports_missing_keys() {
        let mut chain = MemoryChain::new();
        chain.insert(key(&[9]), vec![7]);

        let values = chain
            .query_storage_at(&[key(&[9]), key(&[8])], None)
            .await
            .unwrap();
        assert_eq!(values[0], (key(&[9]), Some(vec![7])));
        assert_eq!(values[1], (key(&[8]), None));
    }
}
