//! Governance parameter set (component C12, spec §4.6-4.8).
//!
//! Default values are drawn from the teacher's `governance/src/constants.rs`
//! (`DEFAULT_QUORUM_BPS`, `DEFAULT_PASS_THRESHOLD_BPS`,
//! `DEFAULT_VETO_THRESHOLD_BPS`, …), re-expressed in seconds rather than
//! epochs since this system's voting/deposit windows are wall-clock
//! deadlines (spec §5), not epoch counts.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use covenant_types::{Address, CoreError, BPS_DENOMINATOR};

#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct GovernanceParams {
    pub version: u64,

    /// Address authorized to submit `UpdateParams` (spec §4.8).
    pub authority: Address,

    pub min_deposit: u64,
    pub deposit_period_seconds: u64,
    pub voting_period_seconds: u64,
    pub emergency_voting_period_seconds: u64,

    pub quorum_bps: u64,
    pub threshold_bps: u64,
    pub veto_threshold_bps: u64,

    /// Anti-spam gate (spec §4.7).
    pub min_proposer_stake: u64,
    pub max_proposals_per_day: u32,
    pub proposal_cooldown_hours: u64,
    pub proposal_fee: u64,

    /// Policy knobs for end-of-block deposit disposition.
    pub burn_deposits: bool,
    pub burn_vote_veto: bool,

    pub max_title_len: usize,
    pub max_description_len: usize,
}

impl GovernanceParams {
    pub fn defaults(authority: Address) -> Self {
        Self {
            version: 1,
            authority,
            min_deposit: 10_000,
            deposit_period_seconds: 14 * 86_400,
            voting_period_seconds: 7 * 86_400,
            emergency_voting_period_seconds: 86_400,
            quorum_bps: 3_334,
            threshold_bps: 5_000,
            veto_threshold_bps: 3_334,
            min_proposer_stake: 1_000,
            max_proposals_per_day: 5,
            proposal_cooldown_hours: 24,
            proposal_fee: 100,
            burn_deposits: true,
            burn_vote_veto: true,
            max_title_len: 256,
            max_description_len: 10_000,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.quorum_bps > BPS_DENOMINATOR
            || self.threshold_bps > BPS_DENOMINATOR
            || self.veto_threshold_bps > BPS_DENOMINATOR
        {
            return Err(CoreError::InvalidGovernanceParams(
                "quorum/threshold/veto_threshold must be <= 10_000 bps".to_string(),
            ));
        }
        if self.deposit_period_seconds == 0 || self.voting_period_seconds == 0 {
            return Err(CoreError::InvalidGovernanceParams(
                "deposit_period_seconds and voting_period_seconds must be positive".to_string(),
            ));
        }
        if self.emergency_voting_period_seconds == 0 {
            return Err(CoreError::InvalidGovernanceParams(
                "emergency_voting_period_seconds must be positive".to_string(),
            ));
        }
        if self.max_proposals_per_day == 0 || self.max_proposals_per_day > 100 {
            return Err(CoreError::InvalidGovernanceParams(
                "max_proposals_per_day must be in 1..=100".to_string(),
            ));
        }
        if self.min_deposit == 0 {
            return Err(CoreError::InvalidGovernanceParams(
                "min_deposit must be positive".to_string(),
            ));
        }
        if self.max_title_len == 0 || self.max_description_len == 0 {
            return Err(CoreError::InvalidGovernanceParams(
                "max_title_len and max_description_len must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority() -> Address {
        Address::new([7; 32])
    }

    #[test]
    fn defaults_validate() {
        GovernanceParams::defaults(authority()).validate().unwrap();
    }

    #[test]
    fn bps_over_denominator_is_rejected() {
        let mut p = GovernanceParams::defaults(authority());
        p.quorum_bps = BPS_DENOMINATOR + 1;
        assert!(p.validate().is_err());
    }

    #[test]
    fn proposals_per_day_capped_at_100() {
        let mut p = GovernanceParams::defaults(authority());
        p.max_proposals_per_day = 101;
        assert!(p.validate().is_err());
    }
}
