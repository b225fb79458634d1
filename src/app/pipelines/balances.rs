use crate::app::pipelines::stakes::{collect_stakes, Reconciliation, StakeReport};
use crate::core::output::{to_csv, write_result};
use crate::core::{ChainReader, ConfigProvider, Pipeline, RecordCount, Storage, TransformResult};
use crate::domain::export::BalancesDocument;
use crate::domain::keys::items;
use crate::domain::model::{AccountId, AccountInfo, Balance, WorkingGroup};
use crate::utils::error::{ExportError, Result};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceOptions {
    /// Upper bound per account, `None` for no cap.
    pub cap: Option<Balance>,
    /// Accounts below this after capping and stake merging are dropped.
    pub floor: Option<Balance>,
    pub with_stake: bool,
    pub exclude: Vec<AccountId>,
}

#[derive(Debug, Default)]
pub struct BalancesExtract {
    pub accounts: Vec<(AccountId, Balance)>,
    pub total_issuance: Balance,
    pub stakes: Option<StakeReport>,
}

impl RecordCount for BalancesExtract {
    fn record_count(&self) -> usize {
        self.accounts.len()
            + self
                .stakes
                .as_ref()
                .map_or(0, |report| report.attributed.len())
    }
}

#[derive(Serialize)]
struct BalanceRow {
    address: String,
    balance: String,
}

fn sum(balances: &[(AccountId, Balance)]) -> Balance {
    balances
        .iter()
        .fold(0, |sum: Balance, (_, amount)| sum.saturating_add(*amount))
}

/// Applies the sanity check, cap, stake merge, exclusions and floor, in that
/// order.
pub fn build_balances(
    extracted: BalancesExtract,
    options: &BalanceOptions,
) -> Result<Vec<(AccountId, Balance)>> {
    let BalancesExtract {
        mut accounts,
        total_issuance,
        stakes,
    } = extracted;

    let all_balances = sum(&accounts);
    if all_balances > total_issuance {
        return Err(ExportError::InvariantViolation {
            message: format!(
                "sum of balances {} exceeds total issuance {}",
                all_balances, total_issuance
            ),
        });
    }
    if all_balances == total_issuance {
        tracing::info!("Balances add up to total issuance {}", total_issuance);
    } else {
        tracing::warn!(
            "Balances are {} short of total issuance {}",
            total_issuance - all_balances,
            total_issuance
        );
    }

    if let Some(cap) = options.cap {
        for (_, amount) in accounts.iter_mut() {
            *amount = (*amount).min(cap);
        }
    }

    let mut all_stake: Balance = 0;
    if let Some(report) = stakes {
        let mut index: HashMap<AccountId, usize> = accounts
            .iter()
            .enumerate()
            .map(|(i, (account, _))| (*account, i))
            .collect();

        for attribution in &report.attributed {
            match index.get(&attribution.account).copied() {
                Some(i) => accounts[i].1 = accounts[i].1.saturating_add(attribution.amount),
                None => {
                    index.insert(attribution.account, accounts.len());
                    accounts.push((attribution.account, attribution.amount));
                }
            }
        }
        all_stake = report.attributed_total();

        match report.reconcile() {
            Reconciliation::Exact => tracing::info!("All staked funds accounted for"),
            Reconciliation::Short(missing) => tracing::warn!(
                "{} of {} staked funds not accounted for",
                missing,
                report.staked_total
            ),
            Reconciliation::Over(excess) => tracing::warn!(
                "Attributed stakes exceed the {} staked by {}",
                report.staked_total,
                excess
            ),
        }

        // 穩定排序，金額相同時保留原本順序
        accounts.sort_by(|a, b| b.1.cmp(&a.1));
    }

    tracing::info!("all balances: {}, all stake: {}", all_balances, all_stake);

    accounts.retain(|(account, amount)| {
        !options.exclude.contains(account) && options.floor.map_or(true, |floor| *amount >= floor)
    });
    Ok(accounts)
}

pub struct BalancesPipeline<S: Storage, C: ConfigProvider> {
    reader: ChainReader,
    storage: S,
    config: C,
    options: BalanceOptions,
}

impl<S: Storage, C: ConfigProvider> BalancesPipeline<S, C> {
    pub fn new(reader: ChainReader, storage: S, config: C, options: BalanceOptions) -> Self {
        Self {
            reader,
            storage,
            config,
            options,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for BalancesPipeline<S, C> {
    type Extracted = BalancesExtract;

    async fn extract(&self) -> Result<Self::Extracted> {
        let accounts: Vec<(AccountId, AccountInfo)> =
            self.reader.entries(&items::SYSTEM_ACCOUNT).await?;
        let total_issuance: Balance = self.reader.value_or_default(&items::TOTAL_ISSUANCE).await?;

        let stakes = if self.options.with_stake {
            Some(collect_stakes(&self.reader, &WorkingGroup::ALL).await?)
        } else {
            None
        };

        Ok(BalancesExtract {
            accounts: accounts
                .into_iter()
                .map(|(account, info)| (account, info.total_balance()))
                .collect(),
            total_issuance,
            stakes,
        })
    }

    async fn transform(&self, data: Self::Extracted) -> Result<TransformResult> {
        let balances = build_balances(data, &self.options)?;

        let document = BalancesDocument {
            balances: balances
                .iter()
                .map(|(account, amount)| (account.to_ss58(), *amount))
                .collect(),
        };
        let rows = document.balances.iter().map(|(address, amount)| BalanceRow {
            address: address.clone(),
            balance: amount.to_string(),
        });

        Ok(TransformResult {
            name: "balances",
            record_count: document.balances.len(),
            csv_output: Some(to_csv(rows)?),
            json_output: serde_json::to_string(&document)?,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        write_result(&self.storage, self.config.output_format(), result).await
    }
}
