//! Attribution of funds locked in the stake module back to the accounts that
//! put them up.

use crate::core::chain::Leading;
use crate::core::{ChainReader, Result};
use crate::domain::keys::items;
use crate::domain::model::{
    AccountId, Balance, HiringApplication, Membership, Proposal, ProposalId, Stake, StakeId,
    WorkingGroup, WorkingGroupApplication,
};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeSource {
    Proposal(ProposalId),
    ApplicationStake(WorkingGroup),
    RoleStake(WorkingGroup),
}

impl fmt::Display for StakeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StakeSource::Proposal(id) => write!(f, "proposal {}", id),
            StakeSource::ApplicationStake(group) => write!(f, "{} application stake", group),
            StakeSource::RoleStake(group) => write!(f, "{} role stake", group),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StakeAttribution {
    pub account: AccountId,
    pub amount: Balance,
    pub source: StakeSource,
}

/// Outcome of comparing attributed stakes with the stake module total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Exact,
    /// Staked funds no attribution accounts for.
    Short(Balance),
    /// Attributions exceed what the stake module holds.
    Over(Balance),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StakeReport {
    pub attributed: Vec<StakeAttribution>,
    /// Sum of every `Staked` entry of the stake module.
    pub staked_total: Balance,
}

impl StakeReport {
    pub fn attributed_total(&self) -> Balance {
        self.attributed
            .iter()
            .fold(0, |sum: Balance, a| sum.saturating_add(a.amount))
    }

    pub fn reconcile(&self) -> Reconciliation {
        let attributed = self.attributed_total();
        match attributed.cmp(&self.staked_total) {
            Ordering::Equal => Reconciliation::Exact,
            Ordering::Less => Reconciliation::Short(self.staked_total - attributed),
            Ordering::Greater => Reconciliation::Over(attributed - self.staked_total),
        }
    }
}

async fn staked_amount(reader: &ChainReader, stake_id: StakeId) -> Result<Option<Balance>> {
    let stake: Option<Stake> = reader.map_value(&items::STAKES, &stake_id).await?;
    Ok(stake.and_then(|stake| stake.staked_amount()))
}

async fn proposal_stakes(reader: &ChainReader) -> Result<Vec<StakeAttribution>> {
    let proposals: Vec<(ProposalId, Leading<Proposal>)> =
        reader.entries(&items::PROPOSALS).await?;
    tracing::debug!("{} proposals", proposals.len());

    let mut attributed = Vec::new();
    for (id, Leading(proposal)) in proposals {
        let Some(active) = proposal.active_stake() else {
            continue;
        };
        if let Some(amount) = staked_amount(reader, active.stake_id).await? {
            attributed.push(StakeAttribution {
                account: active.source_account_id,
                amount,
                source: StakeSource::Proposal(id),
            });
        }
    }
    Ok(attributed)
}

async fn group_stakes(reader: &ChainReader, group: WorkingGroup) -> Result<Vec<StakeAttribution>> {
    let applications: Vec<(u64, WorkingGroupApplication)> = reader
        .entries(&items::application_by_id(group.pallet()))
        .await?;
    tracing::debug!("{}: {} applications", group, applications.len());

    let mut attributed = Vec::new();
    for (_, application) in applications {
        let member: Membership = reader
            .required_map_value(&items::MEMBERSHIP_BY_ID, &application.member_id)
            .await?;
        let Leading(hiring): Leading<HiringApplication> = reader
            .required_map_value(&items::HIRING_APPLICATION_BY_ID, &application.application_id)
            .await?;

        let stakes = [
            (
                hiring.active_application_staking_id,
                StakeSource::ApplicationStake(group),
            ),
            (hiring.active_role_staking_id, StakeSource::RoleStake(group)),
        ];
        for (stake_id, source) in stakes {
            let Some(stake_id) = stake_id else {
                continue;
            };
            if let Some(amount) = staked_amount(reader, stake_id).await? {
                attributed.push(StakeAttribution {
                    account: member.controller_account,
                    amount,
                    source,
                });
            }
        }
    }
    Ok(attributed)
}

/// Walks proposals and working group applications for stakes, and totals the
/// stake module for reconciliation.
pub async fn collect_stakes(reader: &ChainReader, groups: &[WorkingGroup]) -> Result<StakeReport> {
    let mut attributed = proposal_stakes(reader).await?;
    for group in groups {
        attributed.extend(group_stakes(reader, *group).await?);
    }

    let stakes: Vec<(StakeId, Stake)> = reader.entries(&items::STAKES).await?;
    let staked_total = stakes
        .iter()
        .filter_map(|(_, stake)| stake.staked_amount())
        .fold(0, |sum: Balance, amount| sum.saturating_add(amount));

    for attribution in &attributed {
        tracing::debug!(
            "{} staked {} ({})",
            attribution.account,
            attribution.amount,
            attribution.source
        );
    }

    Ok(StakeReport {
        attributed,
        staked_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribution(amount: Balance) -> StakeAttribution {
        StakeAttribution {
            account: AccountId([1; 32]),
            amount,
            source: StakeSource::Proposal(1),
        }
    }

    fn report(amounts: &[Balance], staked_total: Balance) -> StakeReport {
        StakeReport {
            attributed: amounts.iter().map(|a| attribution(*a)).collect(),
            staked_total,
        }
    }

    #[test]
    fn test_reconcile_exact() {
        let report = report(&[150, 50], 200);
        assert_eq!(report.attributed_total(), 200);
        assert_eq!(report.reconcile(), Reconciliation::Exact);
    }

    #[test]
    fn test_reconcile_short_reports_remainder() {
        let report = report(&[100, 50], 200);
        assert_eq!(report.attributed_total(), 150);
        assert_eq!(report.reconcile(), Reconciliation::Short(50));
    }

    #[test]
    fn test_reconcile_over_attributed() {
        // the same stake credited twice
        let report = report(&[150, 150], 200);
        assert_eq!(report.attributed_total(), 300);
        assert_eq!(report.reconcile(), Reconciliation::Over(100));
    }

    #[test]
    fn test_reconcile_empty_report() {
        assert_eq!(StakeReport::default().reconcile(), Reconciliation::Exact);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(StakeSource::Proposal(3).to_string(), "proposal 3");
        assert_eq!(
            StakeSource::RoleStake(WorkingGroup::Storage).to_string(),
            "storage role stake"
        );
    }
}
