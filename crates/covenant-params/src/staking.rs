//! Staking parameter set (component C12, spec §3.1/§4.1/§4.4/§4.5).
//!
//! A versioned, validated struct tree loaded at genesis and mutated only
//! through a governance-authored `UpdateParams` message — there is no
//! environment-variable or file-based configuration path in this crate.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use covenant_types::CoreError;

use crate::tier::{is_testnet_chain, thresholds_for_chain, TierThresholds};

/// Reasons a slash can be triggered for. Mirrors the teacher's
/// `SlashOffense` enum (`runtime/slashing.rs`), generalized from the
/// validator-only double-sign/invalid-block pair to the full reason set
/// spec §4.5 leaves as "governance parameters".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum SlashReason {
    Downtime,
    DoubleSign,
    BadVerification,
    FraudAttempt,
    BadModeration,
    UnfairDispute,
}

/// Actions that move an owner's reputation score (spec §4.4 action table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum ReputationAction {
    SuccessfulVerification,
    FailedVerification,
    GoodVote,
    BadVote,
    UptimeBonus,
    Downtime,
    SuccessfulLoan,
    LoanDefault,
    LiquidityProvided,
    Slashed,
    FraudAttempt,
    SuccessfulDispute,
    UnfairDispute,
    BadModeration,
}

impl ReputationAction {
    /// Signed delta applied to the owner's score (spec §4.4: "applies a
    /// signed delta defined by the action table").
    pub fn delta(self) -> i64 {
        match self {
            ReputationAction::SuccessfulVerification => 5,
            ReputationAction::FailedVerification => -3,
            ReputationAction::GoodVote => 2,
            ReputationAction::BadVote => -2,
            ReputationAction::UptimeBonus => 1,
            ReputationAction::Downtime => -5,
            ReputationAction::SuccessfulLoan => 4,
            ReputationAction::LoanDefault => -15,
            ReputationAction::LiquidityProvided => 3,
            ReputationAction::Slashed => -20,
            ReputationAction::FraudAttempt => -25,
            ReputationAction::SuccessfulDispute => 6,
            ReputationAction::UnfairDispute => -10,
            ReputationAction::BadModeration => -12,
        }
    }
}

/// All tunables governing the Stake Ledger, Lock/Commitment Ledger,
/// Reputation Engine, and Reward/Epoch Engine.
#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct StakingParams {
    pub version: u64,

    pub tier_thresholds: TierThresholds,
    pub min_stake_amount: u64,

    pub unbonding_blocks: u64,
    pub block_seconds: u64,

    pub epoch_blocks: u64,
    pub min_rewards_distribution: u64,
    /// Staker / validator / governance pool split, basis points, sums to
    /// `BPS_DENOMINATOR`.
    pub staker_pool_bps: u64,
    pub validator_pool_bps: u64,
    pub governance_pool_bps: u64,
    /// Minimum reputation score to share in the governance reward pool
    /// (spec §4.5: "restricted to owners with reputation ≥ 70").
    pub governance_pool_min_reputation: u64,

    /// Base slash fraction per reason, basis points of bonded amount,
    /// before the `tier.SlashRisk` cap and before repeat-offense escalation.
    pub slash_base_bps: BTreeMap<SlashReason, u64>,
    /// Occurrence count (per owner, per reason) at which the escalated
    /// fraction applies instead of the reason's base fraction.
    pub repeat_offense_threshold: u32,
    /// Escalated fraction (basis points), still capped by `tier.SlashRisk`.
    pub repeat_offense_penalty_bps: u64,

    /// `MeetsReputationRequirement` thresholds, keyed by action name.
    pub reputation_requirements: BTreeMap<String, u64>,
    /// Decay run interval, ~14,400 blocks (spec §4.4).
    pub reputation_decay_interval_blocks: u64,
    /// Decay is `max_reputation_decay_bps / 30` per decay run (spec §4.4).
    pub max_reputation_decay_bps: u64,
    /// Recovery granted at each epoch boundary to owners below 100 who
    /// claimed rewards within the last 7 days.
    pub reputation_recovery_rate: u64,
    pub reputation_recovery_window_seconds: u64,
}

impl StakingParams {
    pub fn defaults_for_chain(chain_id: &str) -> Self {
        let mut slash_base_bps = BTreeMap::new();
        slash_base_bps.insert(SlashReason::Downtime, 200);
        slash_base_bps.insert(SlashReason::DoubleSign, 2_000);
        slash_base_bps.insert(SlashReason::BadVerification, 1_000);
        slash_base_bps.insert(SlashReason::FraudAttempt, 3_000);
        slash_base_bps.insert(SlashReason::BadModeration, 1_500);
        slash_base_bps.insert(SlashReason::UnfairDispute, 1_000);

        let mut reputation_requirements = BTreeMap::new();
        reputation_requirements.insert("lend".to_string(), 50);
        reputation_requirements.insert("borrow".to_string(), 40);
        reputation_requirements.insert("verify_business".to_string(), 60);
        reputation_requirements.insert("moderate".to_string(), 70);
        reputation_requirements.insert("moderate_large_disputes".to_string(), 85);
        reputation_requirements.insert("slash_moderators".to_string(), 90);
        reputation_requirements.insert("submit_listing".to_string(), 30);

        // Scaled the same 1000x as the tier thresholds (tier.rs) so it stays
        // below the testnet Holder threshold instead of coinciding with
        // Warden and locking out Holder/Keeper bonds (spec §3.1, S4/S5).
        let min_stake_amount = if is_testnet_chain(chain_id) { 1 } else { 100 };

        Self {
            version: 1,
            tier_thresholds: thresholds_for_chain(chain_id),
            min_stake_amount,
            unbonding_blocks: 100_800,
            block_seconds: 6,
            epoch_blocks: 14_400,
            min_rewards_distribution: 1_000,
            staker_pool_bps: 6_000,
            validator_pool_bps: 3_000,
            governance_pool_bps: 1_000,
            governance_pool_min_reputation: 70,
            slash_base_bps,
            repeat_offense_threshold: 3,
            repeat_offense_penalty_bps: 7_500,
            reputation_requirements,
            reputation_decay_interval_blocks: 14_400,
            max_reputation_decay_bps: 3_000,
            reputation_recovery_rate: 2,
            reputation_recovery_window_seconds: 7 * 86_400,
        }
    }

    /// `unbonding_blocks × block_seconds` (spec §3.3).
    pub fn unbonding_period_seconds(&self) -> u64 {
        self.unbonding_blocks.saturating_mul(self.block_seconds)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.tier_thresholds.is_monotone() {
            return Err(CoreError::InvalidGovernanceParams(
                "tier thresholds must be strictly increasing".to_string(),
            ));
        }
        if self.min_stake_amount == 0 {
            return Err(CoreError::InvalidGovernanceParams(
                "min_stake_amount must be positive".to_string(),
            ));
        }
        if self.unbonding_blocks == 0 || self.block_seconds == 0 {
            return Err(CoreError::InvalidGovernanceParams(
                "unbonding_blocks and block_seconds must be positive".to_string(),
            ));
        }
        if self.epoch_blocks == 0 {
            return Err(CoreError::InvalidGovernanceParams(
                "epoch_blocks must be positive".to_string(),
            ));
        }
        let pool_sum = self.staker_pool_bps + self.validator_pool_bps + self.governance_pool_bps;
        if pool_sum != covenant_types::BPS_DENOMINATOR {
            return Err(CoreError::InvalidGovernanceParams(format!(
                "reward pool split must sum to 10_000 bps, got {pool_sum}"
            )));
        }
        if self.governance_pool_min_reputation > 100 {
            return Err(CoreError::InvalidGovernanceParams(
                "governance_pool_min_reputation must be <= 100".to_string(),
            ));
        }
        for (reason, bps) in &self.slash_base_bps {
            if *bps > covenant_types::BPS_DENOMINATOR {
                return Err(CoreError::InvalidGovernanceParams(format!(
                    "slash_base_bps for {reason:?} exceeds 10_000 bps"
                )));
            }
        }
        if self.repeat_offense_penalty_bps > covenant_types::BPS_DENOMINATOR {
            return Err(CoreError::InvalidGovernanceParams(
                "repeat_offense_penalty_bps exceeds 10_000 bps".to_string(),
            ));
        }
        if self.repeat_offense_threshold == 0 {
            return Err(CoreError::InvalidGovernanceParams(
                "repeat_offense_threshold must be positive".to_string(),
            ));
        }
        if self.max_reputation_decay_bps > covenant_types::BPS_DENOMINATOR {
            return Err(CoreError::InvalidGovernanceParams(
                "max_reputation_decay_bps exceeds 10_000 bps".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        StakingParams::defaults_for_chain("covenant-1").validate().unwrap();
        StakingParams::defaults_for_chain("covenant-testnet").validate().unwrap();
    }

    #[test]
    fn pool_split_must_sum_to_denominator() {
        let mut p = StakingParams::defaults_for_chain("covenant-1");
        p.governance_pool_bps += 1;
        assert!(p.validate().is_err());
    }

    #[test]
    fn non_monotone_thresholds_are_rejected() {
        let mut p = StakingParams::defaults_for_chain("covenant-1");
        p.tier_thresholds.keeper = p.tier_thresholds.holder;
        assert!(p.validate().is_err());
    }

    #[test]
    fn unbonding_period_is_blocks_times_seconds() {
        let p = StakingParams::defaults_for_chain("covenant-1");
        assert_eq!(p.unbonding_period_seconds(), p.unbonding_blocks * p.block_seconds);
    }
}
