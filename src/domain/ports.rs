use crate::domain::keys::StorageKey;
use crate::domain::model::{BlockHash, BlockNumber};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Read-only access to a chain's state.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn block_hash(&self, number: BlockNumber) -> Result<Option<BlockHash>>;

    async fn storage(&self, key: &StorageKey, at: Option<&BlockHash>) -> Result<Option<Vec<u8>>>;

    /// Keys under `prefix` in lexicographic order, strictly after `start_key`.
    async fn storage_keys_paged(
        &self,
        prefix: &StorageKey,
        count: u32,
        start_key: Option<&StorageKey>,
        at: Option<&BlockHash>,
    ) -> Result<Vec<StorageKey>>;

    async fn query_storage_at(
        &self,
        keys: &[StorageKey],
        at: Option<&BlockHash>,
    ) -> Result<Vec<(StorageKey, Option<Vec<u8>>)>>;
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unsupported output format '{}', expected json or csv", other)),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn endpoint(&self) -> &str;
    fn at_block(&self) -> Option<BlockNumber>;
    fn page_size(&self) -> u32;
    fn output_format(&self) -> OutputFormat;
}

/// The rendered output of an export.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub name: &'static str,
    pub record_count: usize,
    pub json_output: String,
    pub csv_output: Option<String>,
}

/// Number of chain records gathered by an extract phase.
pub trait RecordCount {
    fn record_count(&self) -> usize;
}

impl<T> RecordCount for Vec<T> {
    fn record_count(&self) -> usize {
        self.len()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: RecordCount + Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
