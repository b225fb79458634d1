use crate::domain::keys::{StorageItem, StorageKey};
use crate::domain::model::{BlockHash, BlockNumber, LeadingFields};
use crate::domain::ports::ChainSource;
use crate::utils::error::{ExportError, Result};
use parity_scale_codec::{Decode, DecodeAll, Encode, Input};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: u32 = 1000;
/// Largest `count` a node accepts for `state_getKeysPaged`.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Typed, block-pinned reads over a [`ChainSource`].
#[derive(Clone)]
pub struct ChainReader {
    source: Arc<dyn ChainSource>,
    at: Option<BlockHash>,
    page_size: u32,
}

impl ChainReader {
    pub fn new(source: Arc<dyn ChainSource>) -> Self {
        Self {
            source,
            at: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Pins all subsequent reads to the given block; `None` reads the best block.
    pub async fn at_block(mut self, number: Option<BlockNumber>) -> Result<Self> {
        if let Some(number) = number {
            let hash = self
                .source
                .block_hash(number)
                .await?
                .ok_or(ExportError::BlockNotFound(number))?;
            tracing::info!("Reading state at block #{} ({:?})", number, hash);
            self.at = Some(hash);
        }
        Ok(self)
    }

    pub fn at(&self) -> Option<&BlockHash> {
        self.at.as_ref()
    }

    pub async fn value<T: Decode>(&self, item: &StorageItem) -> Result<Option<T>> {
        let raw = self.source.storage(&item.value_key(), self.at()).await?;
        raw.map(|bytes| decode(&bytes, || item.path())).transpose()
    }

    /// Missing values read as the type's default, like a `ValueQuery`.
    pub async fn value_or_default<T: Decode + Default>(&self, item: &StorageItem) -> Result<T> {
        Ok(self.value(item).await?.unwrap_or_default())
    }

    pub async fn map_value<K, T>(&self, item: &StorageItem, key: &K) -> Result<Option<T>>
    where
        K: Encode + Debug + Sync,
        T: Decode,
    {
        let raw = self.source.storage(&item.map_key(key), self.at()).await?;
        raw.map(|bytes| decode(&bytes, || format!("{}({:?})", item.path(), key)))
            .transpose()
    }

    pub async fn required_map_value<K, T>(&self, item: &StorageItem, key: &K) -> Result<T>
    where
        K: Encode + Debug + Sync,
        T: Decode,
    {
        self.map_value(item, key)
            .await?
            .ok_or_else(|| ExportError::MissingStorage {
                map: item.path(),
                key: format!("{:?}", key),
            })
    }

    /// Every key of a map, fetched page by page.
    pub async fn keys(&self, item: &StorageItem) -> Result<Vec<StorageKey>> {
        let prefix = item.prefix();
        let mut keys: Vec<StorageKey> = Vec::new();

        loop {
            let page = self
                .source
                .storage_keys_paged(&prefix, self.page_size, keys.last(), self.at())
                .await?;
            let page_len = page.len();
            keys.extend(page);

            tracing::debug!("{}: {} keys so far", item.path(), keys.len());
            if page_len < self.page_size as usize {
                break;
            }
        }

        Ok(keys)
    }

    /// Every `(key, value)` of a map whose hasher retains the key.
    pub async fn entries<K: Decode, T: Decode>(&self, item: &StorageItem) -> Result<Vec<(K, T)>> {
        let keys = self.keys(item).await?;
        let mut entries = Vec::with_capacity(keys.len());

        for chunk in keys.chunks(self.page_size as usize) {
            let values: HashMap<StorageKey, Option<Vec<u8>>> = self
                .source
                .query_storage_at(chunk, self.at())
                .await?
                .into_iter()
                .collect();

            for key in chunk {
                // 已在列舉與查詢之間被移除的項目直接略過
                let Some(Some(bytes)) = values.get(key) else {
                    continue;
                };
                let decoded_key: K = item.decode_key(key)?;
                let value: T = decode(bytes, || format!("{} at {}", item.path(), key))?;
                entries.push((decoded_key, value));
            }
        }

        tracing::debug!("{}: {} entries", item.path(), entries.len());
        Ok(entries)
    }
}

/// A value decoded from its leading fields, with whatever follows discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Leading<T>(pub T);

impl<T: LeadingFields> Decode for Leading<T> {
    fn decode<I: Input>(input: &mut I) -> std::result::Result<Self, parity_scale_codec::Error> {
        let value = T::decode(input)?;
        if let Some(rest) = input.remaining_len()? {
            let mut tail = vec![0u8; rest];
            input.read(&mut tail)?;
        }
        Ok(Leading(value))
    }
}

// 其餘位元組未被讀完即視為格式不符
fn decode<T: Decode>(bytes: &[u8], context: impl FnOnce() -> String) -> Result<T> {
    T::decode_all(&mut &bytes[..]).map_err(|e| ExportError::codec(context(), e))
}
