use crate::domain::model::{AccountId, Balance, BlockNumber, MemberId, Moment, Seat, Worker};
use serde::Serialize;
use std::collections::BTreeMap;

/// `{"balances": [[address, amount], ...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BalancesDocument {
    pub balances: Vec<(String, Balance)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRecord {
    pub member_id: MemberId,
    pub root_account: AccountId,
    pub controller_account: AccountId,
    pub handle: String,
    pub name: String,
    pub avatar_uri: String,
    pub about: String,
    pub registered_at_time: Moment,
}

/// Workers keyed by working group name.
pub type WorkersDocument = BTreeMap<String, Vec<Worker>>;

/// Hex encoded SCALE records ready for a new chain's genesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForumDocument {
    pub categories: Vec<String>,
    pub posts: Vec<String>,
    pub threads: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouncilDocument {
    pub term_ends_at: BlockNumber,
    pub seats: Vec<Seat>,
    pub total_stake: Balance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorRecord {
    pub stash: AccountId,
    pub controller: Option<AccountId>,
    pub total: Balance,
    pub active: Balance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorsDocument {
    pub validators: Vec<ValidatorRecord>,
    pub total_bonded: Balance,
}
