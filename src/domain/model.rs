//! Records mirrored from chain storage, in their SCALE layout.

use crate::domain::ss58;
use crate::utils::error::Result;
use parity_scale_codec::{Decode, Encode};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type Balance = u128;
pub type BlockNumber = u32;
pub type Moment = u64;
pub type MemberId = u64;
pub type StakeId = u64;
pub type WorkerId = u64;
pub type ApplicationId = u64;
pub type OpeningId = u64;
pub type RewardRelationshipId = u64;
pub type ProposalId = u32;
pub type CategoryId = u64;
pub type ThreadId = u64;
pub type PostId = u64;

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn from_ss58(address: &str) -> Result<Self> {
        ss58::decode(address).map(|(public, _)| Self(public))
    }

    pub fn to_ss58(&self) -> String {
        ss58::encode(&self.0, ss58::address_prefix())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ss58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_ss58())
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_ss58())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// System / Balances

#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
pub struct AccountData {
    pub free: Balance,
    pub reserved: Balance,
    pub misc_frozen: Balance,
    pub fee_frozen: Balance,
}

#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
pub struct AccountInfo {
    pub nonce: u32,
    pub refcount: u8,
    pub data: AccountData,
}

impl AccountInfo {
    pub fn total_balance(&self) -> Balance {
        self.data.free.saturating_add(self.data.reserved)
    }
}

// Members

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub enum EntryMethod {
    Paid(u64),
    Screening(AccountId),
    Genesis,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Membership {
    pub handle: Vec<u8>,
    pub avatar_uri: Vec<u8>,
    pub about: Vec<u8>,
    pub registered_at_block: BlockNumber,
    pub registered_at_time: Moment,
    pub entry: EntryMethod,
    pub suspended: bool,
    pub subscription: Option<u64>,
    pub root_account: AccountId,
    pub controller_account: AccountId,
}

// Stake

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Slash {
    pub started_at_block: BlockNumber,
    pub is_active: bool,
    pub blocks_remaining_in_active_period_for_slashing: BlockNumber,
    pub slash_amount: Balance,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct UnstakingState {
    pub started_at_block: BlockNumber,
    pub is_active: bool,
    pub blocks_remaining_in_active_period_for_unstaking: BlockNumber,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub enum StakedStatus {
    Normal,
    Unstaking(UnstakingState),
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct StakedState {
    pub staked_amount: Balance,
    pub staked_status: StakedStatus,
    pub next_slash_id: u64,
    pub ongoing_slashes: BTreeMap<u64, Slash>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub enum StakingStatus {
    NotStaked,
    Staked(StakedState),
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Stake {
    pub created: BlockNumber,
    pub staking_status: StakingStatus,
}

impl Stake {
    /// Amount held by the stake module, `None` while not staked.
    pub fn staked_amount(&self) -> Option<Balance> {
        match &self.staking_status {
            StakingStatus::Staked(state) => Some(state.staked_amount),
            StakingStatus::NotStaked => None,
        }
    }
}

/// Records read from their leading fields only; bytes after them are left
/// undecoded. Read through [`crate::core::chain::Leading`].
pub trait LeadingFields: Decode {}

// Hiring / working groups

/// Leading fields of a `Hiring.ApplicationById` record. Stage and text follow
/// in storage and are not read.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct HiringApplication {
    pub opening_id: OpeningId,
    pub application_index_in_opening: u32,
    pub add_to_opening_in_block: BlockNumber,
    pub active_role_staking_id: Option<StakeId>,
    pub active_application_staking_id: Option<StakeId>,
}

impl LeadingFields for HiringApplication {}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct WorkingGroupApplication {
    pub role_account_id: AccountId,
    pub opening_id: OpeningId,
    pub member_id: MemberId,
    pub application_id: ApplicationId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Encode, Decode)]
pub struct RoleStakeProfile {
    pub stake_id: StakeId,
    pub termination_unstaking_period: Option<BlockNumber>,
    pub exit_unstaking_period: Option<BlockNumber>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Encode, Decode)]
pub struct Worker {
    pub member_id: MemberId,
    pub role_account_id: AccountId,
    pub reward_relationship: Option<RewardRelationshipId>,
    pub role_stake_profile: Option<RoleStakeProfile>,
}

/// Working group pallet instances that hire through the hiring module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkingGroup {
    Storage,
    Content,
    Distribution,
    Gateway,
    OperationsAlpha,
    OperationsBeta,
    OperationsGamma,
}

impl WorkingGroup {
    pub const ALL: [WorkingGroup; 7] = [
        Self::Storage,
        Self::Content,
        Self::Distribution,
        Self::Gateway,
        Self::OperationsAlpha,
        Self::OperationsBeta,
        Self::OperationsGamma,
    ];

    pub fn pallet(&self) -> &'static str {
        match self {
            Self::Storage => "StorageWorkingGroup",
            Self::Content => "ContentWorkingGroup",
            Self::Distribution => "DistributionWorkingGroup",
            Self::Gateway => "GatewayWorkingGroup",
            Self::OperationsAlpha => "OperationsWorkingGroupAlpha",
            Self::OperationsBeta => "OperationsWorkingGroupBeta",
            Self::OperationsGamma => "OperationsWorkingGroupGamma",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Content => "content",
            Self::Distribution => "distribution",
            Self::Gateway => "gateway",
            Self::OperationsAlpha => "operations_alpha",
            Self::OperationsBeta => "operations_beta",
            Self::OperationsGamma => "operations_gamma",
        }
    }
}

impl fmt::Display for WorkingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkingGroup {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|group| group.name() == normalized)
            .ok_or_else(|| format!("unknown working group '{}'", value))
    }
}

// Proposals

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ProposalParameters {
    pub voting_period: BlockNumber,
    pub grace_period: BlockNumber,
    pub approval_quorum_percentage: u32,
    pub approval_threshold_percentage: u32,
    pub slashing_quorum_percentage: u32,
    pub slashing_threshold_percentage: u32,
    pub required_stake: Option<Balance>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ActiveStake {
    pub stake_id: StakeId,
    pub source_account_id: AccountId,
}

/// Finalization data trailing the `Finalized` tag is not read.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub enum ProposalStatus {
    Active(Option<ActiveStake>),
    Finalized,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Proposal {
    pub parameters: ProposalParameters,
    pub proposer_id: MemberId,
    pub title: Vec<u8>,
    pub description: Vec<u8>,
    pub created_at: BlockNumber,
    pub status: ProposalStatus,
}

impl LeadingFields for Proposal {}

impl Proposal {
    pub fn active_stake(&self) -> Option<&ActiveStake> {
        match &self.status {
            ProposalStatus::Active(stake) => stake.as_ref(),
            ProposalStatus::Finalized => None,
        }
    }
}

// Forum

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct BlockAndTime {
    pub block: BlockNumber,
    pub time: Moment,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ModerationAction {
    pub moderated_at: BlockAndTime,
    pub moderator_id: AccountId,
    pub rationale: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct PostTextChange {
    pub expired_at: BlockAndTime,
    pub text: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ChildPositionInParentCategory {
    pub parent_id: CategoryId,
    pub child_nr_in_parent_category: u32,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Category {
    pub id: CategoryId,
    pub title: Vec<u8>,
    pub description: Vec<u8>,
    pub created_at: BlockAndTime,
    pub deleted: bool,
    pub archived: bool,
    pub num_direct_subcategories: u32,
    pub num_direct_unmoderated_threads: u32,
    pub num_direct_moderated_threads: u32,
    pub position_in_parent_category: Option<ChildPositionInParentCategory>,
    pub moderator_id: AccountId,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Thread {
    pub id: ThreadId,
    pub title: Vec<u8>,
    pub category_id: CategoryId,
    pub nr_in_category: u32,
    pub moderation: Option<ModerationAction>,
    pub num_unmoderated_posts: u32,
    pub num_moderated_posts: u32,
    pub created_at: BlockAndTime,
    pub author_id: AccountId,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Post {
    pub id: PostId,
    pub thread_id: ThreadId,
    pub nr_in_thread: u32,
    pub current_text: Vec<u8>,
    pub moderation: Option<ModerationAction>,
    pub text_change_history: Vec<PostTextChange>,
    pub created_at: BlockAndTime,
    pub author_id: AccountId,
}

// Council

#[derive(Clone, Debug, PartialEq, Serialize, Encode, Decode)]
pub struct Backer {
    pub member: AccountId,
    pub stake: Balance,
}

#[derive(Clone, Debug, PartialEq, Serialize, Encode, Decode)]
pub struct Seat {
    pub member: AccountId,
    pub stake: Balance,
    pub backers: Vec<Backer>,
}

impl Seat {
    pub fn total_stake(&self) -> Balance {
        self.backers
            .iter()
            .fold(self.stake, |sum, backer| sum.saturating_add(backer.stake))
    }
}

// Staking

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct UnlockChunk {
    #[codec(compact)]
    pub value: Balance,
    #[codec(compact)]
    pub era: u32,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct StakingLedger {
    pub stash: AccountId,
    #[codec(compact)]
    pub total: Balance,
    #[codec(compact)]
    pub active: Balance,
    pub unlocking: Vec<UnlockChunk>,
    pub claimed_rewards: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(byte: u8) -> AccountId {
        AccountId([byte; 32])
    }

    #[test]
    fn test_account_serializes_as_ss58() {
        let json = serde_json::to_string(&account(1)).unwrap();
        assert_eq!(json, format!("\"{}\"", account(1).to_ss58()));
        assert_eq!(AccountId::from_ss58(&account(1).to_ss58()).unwrap(), account(1));
    }

    #[test]
    fn test_total_balance_includes_reserved() {
        let info = AccountInfo {
            nonce: 3,
            refcount: 1,
            data: AccountData {
                free: 150,
                reserved: 50,
                misc_frozen: 10,
                fee_frozen: 10,
            },
        };
        assert_eq!(info.total_balance(), 200);
    }

    #[test]
    fn test_staked_amount() {
        let staked = Stake {
            created: 10,
            staking_status: StakingStatus::Staked(StakedState {
                staked_amount: 5_000,
                staked_status: StakedStatus::Normal,
                next_slash_id: 0,
                ongoing_slashes: BTreeMap::new(),
            }),
        };
        let idle = Stake {
            created: 10,
            staking_status: StakingStatus::NotStaked,
        };
        assert_eq!(staked.staked_amount(), Some(5_000));
        assert_eq!(idle.staked_amount(), None);
    }

    #[test]
    fn test_hiring_application_reads_leading_fields_only() {
        // opening, index, block, role stake, application stake, then a stage and text
        let mut bytes = (3u64, 0u32, 120u32, Some(9u64), None::<u64>).encode();
        bytes.extend([0u8, 8, b'h', b'i']);

        let application = HiringApplication::decode(&mut &bytes[..]).unwrap();
        assert_eq!(application.opening_id, 3);
        assert_eq!(application.active_role_staking_id, Some(9));
        assert_eq!(application.active_application_staking_id, None);
    }

    #[test]
    fn test_working_group_names() {
        assert_eq!("storage".parse::<WorkingGroup>().unwrap(), WorkingGroup::Storage);
        assert_eq!(
            "operations-beta".parse::<WorkingGroup>().unwrap(),
            WorkingGroup::OperationsBeta
        );
        assert_eq!(WorkingGroup::Gateway.pallet(), "GatewayWorkingGroup");
        assert!("forum".parse::<WorkingGroup>().is_err());
    }

    #[test]
    fn test_seat_total_stake_includes_backers() {
        let seat = Seat {
            member: account(1),
            stake: 100,
            backers: vec![
                Backer {
                    member: account(2),
                    stake: 20,
                },
                Backer {
                    member: account(3),
                    stake: 30,
                },
            ],
        };
        assert_eq!(seat.total_stake(), 150);
    }
}
