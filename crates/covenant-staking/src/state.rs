//! Persisted record shapes for the Stake Ledger, Lock & Commitment Ledger,
//! Unbonding Queue, and Reputation Engine (spec §3.1-3.4).

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use covenant_params::Tier;
use covenant_types::{Address, LockKind};

/// One owner's bonded position (spec §3.1). Absent from the store iff
/// `bonded_amount == 0`.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct UserStake {
    pub owner: Address,
    pub bonded_amount: u64,
    pub tier: Tier,
    /// Fixed-point reputation score in `[0, 100]`.
    pub reputation: u64,
    pub is_validator: bool,
    pub pending_rewards: u64,
    pub lifetime_claimed_rewards: u64,
    pub last_reward_claim_time: u64,
    pub bond_creation_time: u64,
}

impl UserStake {
    pub fn new(owner: Address, now: u64) -> Self {
        Self {
            owner,
            bonded_amount: 0,
            tier: Tier::None,
            reputation: 50,
            is_validator: false,
            pending_rewards: 0,
            lifetime_claimed_rewards: 0,
            last_reward_claim_time: 0,
            bond_creation_time: now,
        }
    }
}

/// Per-tier population counts (spec §3.1). One record for the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TierCount {
    pub holder: u64,
    pub keeper: u64,
    pub warden: u64,
    pub steward: u64,
    pub archon: u64,
    pub validator: u64,
}

impl TierCount {
    pub fn get(&self, tier: Tier) -> u64 {
        match tier {
            Tier::None => 0,
            Tier::Holder => self.holder,
            Tier::Keeper => self.keeper,
            Tier::Warden => self.warden,
            Tier::Steward => self.steward,
            Tier::Archon => self.archon,
            Tier::Validator => self.validator,
        }
    }

    pub fn increment(&mut self, tier: Tier) {
        match tier {
            Tier::None => {}
            Tier::Holder => self.holder += 1,
            Tier::Keeper => self.keeper += 1,
            Tier::Warden => self.warden += 1,
            Tier::Steward => self.steward += 1,
            Tier::Archon => self.archon += 1,
            Tier::Validator => self.validator += 1,
        }
    }

    pub fn decrement(&mut self, tier: Tier) {
        match tier {
            Tier::None => {}
            Tier::Holder => self.holder = self.holder.saturating_sub(1),
            Tier::Keeper => self.keeper = self.keeper.saturating_sub(1),
            Tier::Warden => self.warden = self.warden.saturating_sub(1),
            Tier::Steward => self.steward = self.steward.saturating_sub(1),
            Tier::Archon => self.archon = self.archon.saturating_sub(1),
            Tier::Validator => self.validator = self.validator.saturating_sub(1),
        }
    }

    pub fn total(&self) -> u64 {
        self.holder + self.keeper + self.warden + self.steward + self.archon + self.validator
    }
}

/// Tag byte for a [`LockKind`], used to build the lock store key
/// (`covenant_store::keys::lock`). Stable ABI alongside the key prefixes.
pub fn lock_kind_tag(kind: LockKind) -> u8 {
    match kind {
        LockKind::ActiveCompanyListing => 0,
        LockKind::PendingListing => 1,
        LockKind::ActiveLoan => 2,
        LockKind::ActiveDispute => 3,
        LockKind::PendingVote => 4,
        LockKind::UserBanned => 5,
        LockKind::ActiveValidator => 6,
        LockKind::ActiveModerator => 7,
    }
}

/// A non-commitment lock: a boolean obligation blocking full unbond until
/// released or expired (spec §3.2).
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Lock {
    pub kind: LockKind,
    pub reference: String,
    pub description: String,
    pub creation_time: u64,
    pub expiry: Option<u64>,
}

impl Lock {
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiry.is_some_and(|e| e <= now)
    }
}

/// Commitment kinds: numeric reservations against the trust ceiling
/// (spec §3.2), disjoint from [`LockKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum CommitmentKind {
    EscrowCommitment,
    LendingCommitment,
    P2pCommitment,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct StakeCommitment {
    pub kind: CommitmentKind,
    pub reference: String,
    pub amount: u64,
    pub description: String,
    pub creation_time: u64,
}

/// One owner's held commitments plus cached per-kind and grand totals
/// (spec §3.2). Deleted from the store once the holder list is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct UserStakeCommitments {
    pub commitments: Vec<StakeCommitment>,
    pub escrow_total: u64,
    pub lending_total: u64,
    pub p2p_total: u64,
    pub total_committed: u64,
}

impl UserStakeCommitments {
    pub fn kind_total_mut(&mut self, kind: CommitmentKind) -> &mut u64 {
        match kind {
            CommitmentKind::EscrowCommitment => &mut self.escrow_total,
            CommitmentKind::LendingCommitment => &mut self.lending_total,
            CommitmentKind::P2pCommitment => &mut self.p2p_total,
        }
    }

    pub fn kind_total(&self, kind: CommitmentKind) -> u64 {
        match kind {
            CommitmentKind::EscrowCommitment => self.escrow_total,
            CommitmentKind::LendingCommitment => self.lending_total,
            CommitmentKind::P2pCommitment => self.p2p_total,
        }
    }
}

/// A pending withdrawal, at most one per owner (spec §3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct UnbondingRequest {
    pub owner: Address,
    pub amount: u64,
    pub request_time: u64,
    pub completion_time: u64,
    pub completed: bool,
}

/// An unbond redirected to a beneficiary other than the original owner
/// (spec §3.3, component C14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct InheritanceUnbonding {
    pub owner: Address,
    pub recipient: Address,
    pub amount: u64,
    pub request_time: u64,
    pub completion_time: u64,
    pub completed: bool,
}

/// One reputation-affecting event (spec §3.4).
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub owner: Address,
    pub action: String,
    pub delta: i64,
    pub resulting_score: u64,
    pub reason: String,
    pub block_height: u64,
    pub timestamp: u64,
    pub related_tx: String,
}

/// Last 100 reputation records plus running totals (spec §3.4).
#[derive(Debug, Clone, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ReputationHistory {
    pub records: Vec<ReputationRecord>,
    pub total_gains: u64,
    pub total_losses: u64,
    pub highest: u64,
    pub lowest: u64,
}

impl ReputationHistory {
    pub const MAX_RECORDS: usize = 100;

    pub fn push(&mut self, record: ReputationRecord) {
        if record.delta >= 0 {
            self.total_gains += record.delta as u64;
        } else {
            self.total_losses += record.delta.unsigned_abs();
        }
        self.highest = self.highest.max(record.resulting_score);
        self.lowest = if self.records.is_empty() {
            record.resulting_score
        } else {
            self.lowest.min(record.resulting_score)
        };
        self.records.push(record);
        if self.records.len() > Self::MAX_RECORDS {
            self.records.remove(0);
        }
    }
}

/// Per-(owner, reason) count of slashes, used to escalate the penalty on
/// repeated offenses (spec §2.2, grounded on the teacher's three-strike
/// jail escalation in `runtime/slashing.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct OffenseCounter {
    pub count: u32,
}
