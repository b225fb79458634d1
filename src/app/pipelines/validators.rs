use crate::core::output::{to_csv, write_result};
use crate::core::{ChainReader, ConfigProvider, Pipeline, Storage, TransformResult};
use crate::domain::export::{ValidatorRecord, ValidatorsDocument};
use crate::domain::keys::items;
use crate::domain::model::{AccountId, Balance, StakingLedger};
use crate::utils::error::Result;
use serde::Serialize;

/// A session validator with its bonding, when any.
#[derive(Debug, Clone)]
pub struct BondedValidator {
    pub stash: AccountId,
    pub controller: Option<AccountId>,
    pub ledger: Option<StakingLedger>,
}

#[derive(Serialize)]
struct ValidatorRow {
    stash: AccountId,
    controller: String,
    total: String,
    active: String,
}

pub struct ValidatorsPipeline<S: Storage, C: ConfigProvider> {
    reader: ChainReader,
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> ValidatorsPipeline<S, C> {
    pub fn new(reader: ChainReader, storage: S, config: C) -> Self {
        Self {
            reader,
            storage,
            config,
        }
    }
}

pub fn validator_record(validator: BondedValidator) -> ValidatorRecord {
    let (total, active) = validator
        .ledger
        .as_ref()
        .map(|ledger| (ledger.total, ledger.active))
        .unwrap_or_default();

    ValidatorRecord {
        stash: validator.stash,
        controller: validator.controller,
        total,
        active,
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ValidatorsPipeline<S, C> {
    type Extracted = Vec<BondedValidator>;

    async fn extract(&self) -> Result<Self::Extracted> {
        let stashes: Vec<AccountId> = self
            .reader
            .value_or_default(&items::SESSION_VALIDATORS)
            .await?;

        let mut validators = Vec::with_capacity(stashes.len());
        for stash in stashes {
            let controller: Option<AccountId> =
                self.reader.map_value(&items::STAKING_BONDED, &stash).await?;
            let ledger: Option<StakingLedger> = match &controller {
                Some(controller) => self.reader.map_value(&items::STAKING_LEDGER, controller).await?,
                None => {
                    tracing::warn!("Validator {} has no bonded controller", stash);
                    None
                }
            };

            validators.push(BondedValidator {
                stash,
                controller,
                ledger,
            });
        }

        Ok(validators)
    }

    async fn transform(&self, data: Self::Extracted) -> Result<TransformResult> {
        let validators: Vec<ValidatorRecord> = data.into_iter().map(validator_record).collect();
        let total_bonded: Balance = validators
            .iter()
            .fold(0, |sum: Balance, v| sum.saturating_add(v.total));
        tracing::info!(
            "{} validators, total bonded {}",
            validators.len(),
            total_bonded
        );

        let rows: Vec<ValidatorRow> = validators
            .iter()
            .map(|v| ValidatorRow {
                stash: v.stash,
                controller: v.controller.map(|c| c.to_ss58()).unwrap_or_default(),
                total: v.total.to_string(),
                active: v.active.to_string(),
            })
            .collect();

        let document = ValidatorsDocument {
            validators,
            total_bonded,
        };

        Ok(TransformResult {
            name: "validators",
            record_count: document.validators.len(),
            json_output: serde_json::to_string(&document)?,
            csv_output: Some(to_csv(rows)?),
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        write_result(&self.storage, self.config.output_format(), result).await
    }
}
