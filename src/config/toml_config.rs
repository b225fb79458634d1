use crate::config::ConfigLayer;
use crate::core::OutputFormat;
use crate::domain::model::BlockNumber;
use crate::utils::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Export defaults kept in a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub balances: BalancesSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSection {
    pub ws_url: Option<String>,
    pub at_block: Option<BlockNumber>,
    pub raw_state: Option<String>,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub ss58_prefix: Option<u16>,
}

/// TOML integers are 64-bit, so amounts are limited to `u64` here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalancesSection {
    pub cap: Option<u64>,
    pub floor: Option<u64>,
    pub with_stake: Option<bool>,
    pub exclude: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub dir: Option<String>,
    pub format: Option<OutputFormat>,
}

impl FileConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ExportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ExportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${WS_URL})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ExportError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn into_layer(self) -> ConfigLayer {
        ConfigLayer {
            endpoint: self.source.ws_url,
            at_block: self.source.at_block,
            raw_state: self.source.raw_state,
            output_dir: self.output.dir,
            output_format: self.output.format,
            page_size: self.source.page_size,
            timeout_secs: self.source.timeout_secs,
            ss58_prefix: self.source.ss58_prefix,
            cap: self.balances.cap.map(u128::from),
            floor: self.balances.floor.map(u128::from),
            with_stake: self.balances.with_stake,
            exclude: self.balances.exclude,
        }
    }
}
