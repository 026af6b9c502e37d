//! Persisted record shapes for the Proposal Store, Voting & Tally, and
//! delegation graph (spec §3.5, components C9/C10). Grounded on the
//! teacher's `governance/src/state.rs` account layout (`Proposal`,
//! `ProposalStatus`, `Vote`, `VoteRecord`), generalized from a fixed-size
//! Solana account to `KvStore` records and from the teacher's
//! lock-duration-only vote weight (`vote_weight.rs`) to a delegation-aware
//! one (no teacher analogue for delegation; see DESIGN.md).

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use covenant_params::Tier;
use covenant_types::Address;

/// Proposal classification (spec §3.5). Per-type data lives inline on the
/// variant where it is small and fixed-shape; everything else rides in
/// `Proposal::metadata` (spec §9 "per-type data lives either inline or in a
/// metadata map").
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum ProposalType {
    Generic,
    ParameterChange,
    SoftwareUpgrade,
    CommunitySpend { recipient: Address, amount: u64 },
    CompanyGovernance { company_id: u64 },
    ValidatorTierChange { validator: Address, new_tier: Tier },
    ListingRequirementChange,
    TradingHalt { halted: bool },
    Emergency,
    TreasuryTransfer { recipient: Address, amount: u64 },
}

/// Tag byte for a [`ProposalType`], used to build the by-type secondary
/// index key and the emergency-by-type index key. Stable ABI alongside the
/// store key prefixes.
pub fn proposal_type_tag(t: &ProposalType) -> u8 {
    match t {
        ProposalType::Generic => 0,
        ProposalType::ParameterChange => 1,
        ProposalType::SoftwareUpgrade => 2,
        ProposalType::CommunitySpend { .. } => 3,
        ProposalType::CompanyGovernance { .. } => 4,
        ProposalType::ValidatorTierChange { .. } => 5,
        ProposalType::ListingRequirementChange => 6,
        ProposalType::TradingHalt { .. } => 7,
        ProposalType::Emergency => 8,
        ProposalType::TreasuryTransfer { .. } => 9,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum ProposalStatus {
    DepositPeriod,
    VotingPeriod,
    Passed,
    Rejected,
    Failed,
    Canceled,
}

pub fn proposal_status_tag(s: ProposalStatus) -> u8 {
    match s {
        ProposalStatus::DepositPeriod => 0,
        ProposalStatus::VotingPeriod => 1,
        ProposalStatus::Passed => 2,
        ProposalStatus::Rejected => 3,
        ProposalStatus::Failed => 4,
        ProposalStatus::Canceled => 5,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum VoteOption {
    Yes,
    No,
    Abstain,
    Veto,
}

/// Classification used only to key the emergency-by-type secondary index
/// (spec §3.6); spec.md leaves "emergency type" as free-form, but an index
/// needs a fixed tag set the same way `ProposalType`/`LockKind` do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum EmergencyType {
    SecurityIncident,
    MarketManipulation,
    SystemFailure,
    RegulatoryAction,
    Other,
}

pub fn emergency_type_tag(t: EmergencyType) -> u8 {
    match t {
        EmergencyType::SecurityIncident => 0,
        EmergencyType::MarketManipulation => 1,
        EmergencyType::SystemFailure => 2,
        EmergencyType::RegulatoryAction => 3,
        EmergencyType::Other => 4,
    }
}

/// Emergency annotation (spec §3.5): higher quorum, shorter voting period,
/// minimum-tier gate on voters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EmergencyAnnotation {
    pub emergency_type: EmergencyType,
    /// Severity level in `[1,5]`.
    pub severity: u8,
    pub min_voter_tier: Tier,
    /// When set, the voting period is `GovernanceParams::emergency_voting_period_seconds`
    /// rather than the proposer-supplied period.
    pub fast_track: bool,
    pub execute_on_pass: bool,
    pub time_limit_seconds: u64,
}

/// Cached tally counters (spec §3.5 `TallyResult`, "derived, cached on
/// finalization"). Kept embedded on `Proposal` rather than as a separate
/// record — the design note on cached-vs-recomputed tallies (spec §9)
/// permits a cache as long as it agrees with a fresh recomputation from
/// stored votes, which `crate::voting::recompute_tally` provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TallyCounters {
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
    pub veto: u64,
}

impl TallyCounters {
    pub fn participating(&self) -> u64 {
        self.yes.saturating_add(self.no).saturating_add(self.abstain).saturating_add(self.veto)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub proposal_type: ProposalType,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub status: ProposalStatus,
    pub deposit_end_time: u64,
    pub voting_start_time: u64,
    pub voting_end_time: u64,
    pub total_deposit: u64,
    pub min_deposit: u64,
    pub quorum_bps: u64,
    pub threshold_bps: u64,
    pub veto_threshold_bps: u64,
    pub tally: TallyCounters,
    pub executed: bool,
    pub execution_time: u64,
    pub execution_result: String,
    pub company_id: Option<u64>,
    pub validator: Option<Address>,
    pub metadata: BTreeMap<String, String>,
    pub emergency: Option<EmergencyAnnotation>,
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: u64,
    pub voter: Address,
    pub option: VoteOption,
    /// Always 1 for a simple vote; kept as a field rather than an implicit
    /// constant so `recompute_tally` can treat `Vote` and `WeightedVote`
    /// uniformly.
    pub weight: u64,
    /// Snapshotted at cast time; zero if the voter's tier fell below an
    /// emergency proposal's `min_voter_tier` (spec §4.6 — "recorded but
    /// contributes 0 to tally").
    pub voting_power: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct WeightedVote {
    pub proposal_id: u64,
    pub voter: Address,
    /// `(option, basis points)` pairs; basis points are non-negative and
    /// sum to exactly `BPS_DENOMINATOR`.
    pub weights: Vec<(VoteOption, u64)>,
    pub voting_power: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Deposit {
    pub proposal_id: u64,
    pub depositor: Address,
    pub amount: u64,
    pub deposited_time: u64,
}

/// A delegator's transfer of voting-power share to a delegate, scoped to a
/// company and/or proposal type (spec §3.5). No teacher analogue exists —
/// the teacher's `vote_weight.rs` derives voting power purely from
/// lock-duration tier with no delegation concept; this is built in the
/// teacher's record-and-index idiom, generalized to the delegation graph
/// spec §9 describes ("flat records with indices in both directions").
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct VoteDelegation {
    pub delegator: Address,
    pub delegate: Address,
    pub company_scope: Option<u64>,
    /// `Some(proposal_type_tag)` restricts the delegation to one proposal
    /// type; `None` matches any type.
    pub type_scope: Option<u8>,
    /// Share of the delegator's own stake weight forwarded to `delegate`,
    /// in basis points.
    pub share_bps: u64,
    /// `u64::MAX` means "no expiry" (mirrors `Lock::expiry`'s `Option`
    /// intent without the `Option` wrapper, since spec §3.5 states the
    /// field as a plain "expiry height" rather than an optional one).
    pub expiry_height: u64,
    pub revocable: bool,
    pub revoked: bool,
    pub created_at: u64,
}

impl VoteDelegation {
    pub fn is_active(&self, now_height: u64) -> bool {
        !self.revoked && self.expiry_height > now_height
    }

    /// `true` iff this delegation's scope matches a proposal with the given
    /// company id and proposal-type tag (spec §4.6: "unscoped matches all;
    /// company-scoped matches only proposals for that company; type-scoped
    /// matches only that type").
    pub fn matches(&self, company_id: Option<u64>, type_tag: u8) -> bool {
        let company_ok = match self.company_scope {
            None => true,
            Some(c) => company_id == Some(c),
        };
        let type_ok = match self.type_scope {
            None => true,
            Some(t) => t == type_tag,
        };
        company_ok && type_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn tally_participating_sums_all_four_buckets() {
        let t = TallyCounters { yes: 10, no: 5, abstain: 2, veto: 1 };
        assert_eq!(t.participating(), 18);
    }

    #[test]
    fn delegation_scope_matching() {
        let unscoped = VoteDelegation {
            delegator: addr(1),
            delegate: addr(2),
            company_scope: None,
            type_scope: None,
            share_bps: 10_000,
            expiry_height: u64::MAX,
            revocable: true,
            revoked: false,
            created_at: 0,
        };
        assert!(unscoped.matches(Some(7), 3));
        assert!(unscoped.matches(None, 0));

        let company_scoped = VoteDelegation { company_scope: Some(7), ..unscoped };
        assert!(company_scoped.matches(Some(7), 3));
        assert!(!company_scoped.matches(Some(8), 3));
        assert!(!company_scoped.matches(None, 3));
    }

    #[test]
    fn delegation_is_active_respects_expiry_and_revocation() {
        let d = VoteDelegation {
            delegator: addr(1),
            delegate: addr(2),
            company_scope: None,
            type_scope: None,
            share_bps: 5_000,
            expiry_height: 100,
            revocable: true,
            revoked: false,
            created_at: 0,
        };
        assert!(d.is_active(50));
        assert!(!d.is_active(100));
        let revoked = VoteDelegation { revoked: true, ..d };
        assert!(!revoked.is_active(50));
    }
}
