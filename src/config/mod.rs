#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::app::pipelines::balances::BalanceOptions;
use crate::core::chain::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::core::{ConfigProvider, OutputFormat};
use crate::domain::model::{AccountId, Balance, BlockNumber};
use crate::domain::ss58;
use crate::utils::error::{ExportError, Result};
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_url, Validate,
};

pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:9944";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One source of settings. Layers are merged from highest to lowest priority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigLayer {
    pub endpoint: Option<String>,
    pub at_block: Option<BlockNumber>,
    pub raw_state: Option<String>,
    pub output_dir: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub ss58_prefix: Option<u16>,
    pub cap: Option<Balance>,
    pub floor: Option<Balance>,
    pub with_stake: Option<bool>,
    pub exclude: Option<Vec<String>>,
}

impl ConfigLayer {
    /// Fills unset fields from `lower`.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            endpoint: self.endpoint.or(lower.endpoint),
            at_block: self.at_block.or(lower.at_block),
            raw_state: self.raw_state.or(lower.raw_state),
            output_dir: self.output_dir.or(lower.output_dir),
            output_format: self.output_format.or(lower.output_format),
            page_size: self.page_size.or(lower.page_size),
            timeout_secs: self.timeout_secs.or(lower.timeout_secs),
            ss58_prefix: self.ss58_prefix.or(lower.ss58_prefix),
            cap: self.cap.or(lower.cap),
            floor: self.floor.or(lower.floor),
            with_stake: self.with_stake.or(lower.with_stake),
            exclude: self.exclude.or(lower.exclude),
        }
    }

    pub fn resolve(self) -> ExportConfig {
        ExportConfig {
            endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            at_block: self.at_block,
            raw_state: self.raw_state,
            output_dir: self.output_dir,
            output_format: self.output_format.unwrap_or_default(),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ss58_prefix: self.ss58_prefix.unwrap_or(ss58::DEFAULT_PREFIX),
            // 0 表示不設上下限
            cap: self.cap.filter(|cap| *cap > 0),
            floor: self.floor.filter(|floor| *floor > 0),
            with_stake: self.with_stake.unwrap_or(false),
            exclude: self.exclude.unwrap_or_default(),
        }
    }
}

/// Fully resolved settings of one export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub endpoint: String,
    pub at_block: Option<BlockNumber>,
    pub raw_state: Option<String>,
    pub output_dir: Option<String>,
    pub output_format: OutputFormat,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub ss58_prefix: u16,
    pub cap: Option<Balance>,
    pub floor: Option<Balance>,
    pub with_stake: bool,
    pub exclude: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ConfigLayer::default().resolve()
    }
}

impl ExportConfig {
    pub fn excluded_accounts(&self) -> Result<Vec<AccountId>> {
        self.exclude
            .iter()
            .map(|address| {
                AccountId::from_ss58(address.trim()).map_err(|e| {
                    ExportError::InvalidConfigValueError {
                        field: "exclude".to_string(),
                        value: address.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect()
    }

    pub fn balance_options(&self) -> Result<BalanceOptions> {
        Ok(BalanceOptions {
            cap: self.cap,
            floor: self.floor,
            with_stake: self.with_stake,
            exclude: self.excluded_accounts()?,
        })
    }
}

impl ConfigProvider for ExportConfig {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn at_block(&self) -> Option<BlockNumber> {
        self.at_block
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn output_format(&self) -> OutputFormat {
        self.output_format
    }
}

impl Validate for ExportConfig {
    fn validate(&self) -> Result<()> {
        match &self.raw_state {
            Some(path) => validate_path("raw_state", path)?,
            None => validate_url("ws_url", &self.endpoint)?,
        }

        if let Some(dir) = &self.output_dir {
            validate_path("output_dir", dir)?;
        }

        validate_range("page_size", self.page_size, 1, MAX_PAGE_SIZE)?;
        validate_positive_number("timeout_secs", self.timeout_secs, 1)?;
        validate_range("ss58_prefix", self.ss58_prefix, 0, ss58::MAX_PREFIX)?;

        if let (Some(cap), Some(floor)) = (self.cap, self.floor) {
            if floor > cap {
                return Err(ExportError::ConfigValidationError {
                    field: "floor".to_string(),
                    message: format!("floor {} is above cap {}", floor, cap),
                });
            }
        }

        self.excluded_accounts()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.ss58_prefix, 42);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_higher_layer_wins() {
        let cli = ConfigLayer {
            endpoint: Some("wss://node.example:9944".to_string()),
            ..Default::default()
        };
        let file = ConfigLayer {
            endpoint: Some("ws://file:9944".to_string()),
            page_size: Some(200),
            ..Default::default()
        };

        let config = cli.or(file).resolve();
        assert_eq!(config.endpoint, "wss://node.example:9944");
        assert_eq!(config.page_size, 200);
    }

    #[test]
    fn test_zero_cap_and_floor_mean_none() {
        let config = ConfigLayer {
            cap: Some(0),
            floor: Some(0),
            ..Default::default()
        }
        .resolve();
        assert_eq!(config.cap, None);
        assert_eq!(config.floor, None);
    }

    #[test]
    fn test_floor_above_cap_is_rejected() {
        let config = ConfigLayer {
            cap: Some(10),
            floor: Some(11),
            ..Default::default()
        }
        .resolve();
        assert!(matches!(
            config.validate(),
            Err(ExportError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_page_size_is_bounded_by_node_limit() {
        for page_size in [0, 1001, 5000] {
            let config = ExportConfig {
                page_size,
                ..ExportConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ExportError::InvalidConfigValueError { .. })
            ));
        }

        let config = ExportConfig {
            page_size: 1000,
            ..ExportConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_raw_state_skips_url_check() {
        let config = ConfigLayer {
            endpoint: Some("not a url".to_string()),
            raw_state: Some("state.json".to_string()),
            ..Default::default()
        }
        .resolve();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_exclude_list_is_parsed() {
        let config = ConfigLayer {
            exclude: Some(vec![ALICE.to_string()]),
            ..Default::default()
        }
        .resolve();
        let options = config.balance_options().unwrap();
        assert_eq!(options.exclude.len(), 1);

        let config = ConfigLayer {
            exclude: Some(vec!["nonsense".to_string()]),
            ..Default::default()
        }
        .resolve();
        assert!(matches!(
            config.validate(),
            Err(ExportError::InvalidConfigValueError { .. })
        ));
    }
}
