//! Storage key layout of the chain's state trie.
//!
//! Every entry lives under `twox128(pallet) ++ twox128(item)`; map entries
//! append the hashed SCALE encoding of their key.

use crate::utils::error::{ExportError, Result};
use parity_scale_codec::{Decode, Encode};
use sp_crypto_hashing::{blake2_128, blake2_256, twox_128, twox_64};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageKey(pub Vec<u8>);

impl StorageKey {
    pub fn from_hex(value: &str) -> Result<Self> {
        Ok(Self(decode_hex(value)?))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &StorageKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Decodes `0x`-prefixed (or bare) hex as returned by the node.
pub fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    Ok(hex::decode(trimmed)?)
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageHasher {
    Blake2_128,
    Blake2_256,
    Blake2_128Concat,
    Twox128,
    Twox64Concat,
    Identity,
}

impl StorageHasher {
    pub fn hash(&self, encoded: &[u8]) -> Vec<u8> {
        match self {
            Self::Blake2_128 => blake2_128(encoded).to_vec(),
            Self::Blake2_256 => blake2_256(encoded).to_vec(),
            Self::Blake2_128Concat => [&blake2_128(encoded)[..], encoded].concat(),
            Self::Twox128 => twox_128(encoded).to_vec(),
            Self::Twox64Concat => [&twox_64(encoded)[..], encoded].concat(),
            Self::Identity => encoded.to_vec(),
        }
    }

    /// 可從完整 key 還原原始 key 時，回傳雜湊前綴長度
    fn concat_offset(&self) -> Option<usize> {
        match self {
            Self::Blake2_128Concat => Some(16),
            Self::Twox64Concat => Some(8),
            Self::Identity => Some(0),
            Self::Blake2_128 | Self::Blake2_256 | Self::Twox128 => None,
        }
    }
}

/// A storage value or map declared by a runtime pallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageItem {
    pub pallet: &'static str,
    pub name: &'static str,
    pub hasher: Option<StorageHasher>,
}

impl StorageItem {
    pub const fn value(pallet: &'static str, name: &'static str) -> Self {
        Self {
            pallet,
            name,
            hasher: None,
        }
    }

    pub const fn map(pallet: &'static str, name: &'static str, hasher: StorageHasher) -> Self {
        Self {
            pallet,
            name,
            hasher: Some(hasher),
        }
    }

    pub fn path(&self) -> String {
        format!("{}.{}", self.pallet, self.name)
    }

    pub fn prefix(&self) -> StorageKey {
        StorageKey(storage_prefix(self.pallet, self.name).to_vec())
    }

    pub fn value_key(&self) -> StorageKey {
        self.prefix()
    }

    pub fn map_key<K: Encode>(&self, key: &K) -> StorageKey {
        let mut full = storage_prefix(self.pallet, self.name).to_vec();
        let hasher = self.hasher.unwrap_or(StorageHasher::Identity);
        full.extend(hasher.hash(&key.encode()));
        StorageKey(full)
    }

    /// Recovers the map key from a full storage key.
    pub fn decode_key<K: Decode>(&self, full: &StorageKey) -> Result<K> {
        let hasher = self.hasher.ok_or_else(|| {
            ExportError::config(format!("{} is a storage value, not a map", self.path()))
        })?;
        let offset = hasher.concat_offset().ok_or_else(|| {
            ExportError::config(format!(
                "{} uses {:?}, which does not retain the key",
                self.path(),
                hasher
            ))
        })?;

        if !full.starts_with(&self.prefix()) || full.0.len() < 32 + offset {
            return Err(ExportError::config(format!(
                "{} does not belong to {}",
                full,
                self.path()
            )));
        }

        let mut raw = &full.0[32 + offset..];
        K::decode(&mut raw).map_err(|e| ExportError::codec(format!("key of {}", self.path()), e))
    }
}

pub fn storage_prefix(pallet: &str, item: &str) -> [u8; 32] {
    let mut prefix = [0u8; 32];
    prefix[..16].copy_from_slice(&twox_128(pallet.as_bytes()));
    prefix[16..].copy_from_slice(&twox_128(item.as_bytes()));
    prefix
}

/// Storage items read by the exporters.
pub mod items {
    use super::StorageHasher::{Blake2_128Concat, Twox64Concat};
    use super::StorageItem;

    pub const SYSTEM_ACCOUNT: StorageItem = StorageItem::map("System", "Account", Blake2_128Concat);
    pub const TOTAL_ISSUANCE: StorageItem = StorageItem::value("Balances", "TotalIssuance");

    pub const NEXT_MEMBER_ID: StorageItem = StorageItem::value("Members", "NextMemberId");
    pub const MEMBERSHIP_BY_ID: StorageItem =
        StorageItem::map("Members", "MembershipById", Blake2_128Concat);

    pub const STAKES: StorageItem = StorageItem::map("Stake", "Stakes", Blake2_128Concat);
    pub const HIRING_APPLICATION_BY_ID: StorageItem =
        StorageItem::map("Hiring", "ApplicationById", Blake2_128Concat);
    pub const PROPOSALS: StorageItem =
        StorageItem::map("ProposalsEngine", "Proposals", Blake2_128Concat);

    pub const NEXT_CATEGORY_ID: StorageItem = StorageItem::value("Forum", "NextCategoryId");
    pub const NEXT_THREAD_ID: StorageItem = StorageItem::value("Forum", "NextThreadId");
    pub const NEXT_POST_ID: StorageItem = StorageItem::value("Forum", "NextPostId");
    pub const CATEGORY_BY_ID: StorageItem =
        StorageItem::map("Forum", "CategoryById", Blake2_128Concat);
    pub const THREAD_BY_ID: StorageItem = StorageItem::map("Forum", "ThreadById", Blake2_128Concat);
    pub const POST_BY_ID: StorageItem = StorageItem::map("Forum", "PostById", Blake2_128Concat);

    pub const ACTIVE_COUNCIL: StorageItem = StorageItem::value("Council", "ActiveCouncil");
    pub const TERM_ENDS_AT: StorageItem = StorageItem::value("Council", "TermEndsAt");

    pub const SESSION_VALIDATORS: StorageItem = StorageItem::value("Session", "Validators");
    pub const STAKING_BONDED: StorageItem = StorageItem::map("Staking", "Bonded", Twox64Concat);
    pub const STAKING_LEDGER: StorageItem = StorageItem::map("Staking", "Ledger", Blake2_128Concat);

    /// Items of a working group pallet instance.
    pub fn next_worker_id(pallet: &'static str) -> StorageItem {
        StorageItem::value(pallet, "NextWorkerId")
    }

    pub fn worker_by_id(pallet: &'static str) -> StorageItem {
        StorageItem::map(pallet, "WorkerById", Blake2_128Concat)
    }

    pub fn application_by_id(pallet: &'static str) -> StorageItem {
        StorageItem::map(pallet, "ApplicationById", Blake2_128Concat)
    }
}
