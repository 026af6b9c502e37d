//! Resolves a `ParameterChange` proposal's `ExecutionEffect::ParameterChange`
//! patch against the live parameter sets (spec §4.8).
//!
//! The patch is a `BTreeMap<String, String>` of `"staking.<field>"` /
//! `"governance.<field>"` keys to decimal-string values (spec.md leaves the
//! wire format for a parameter-change payload unspecified; this is the
//! proposal's existing `metadata` map, reused rather than inventing a new
//! encoding — see DESIGN.md). Only scalar fields are patchable this way;
//! `tier_thresholds`, `slash_base_bps`, and `reputation_requirements` are
//! structured values with no single-field decimal encoding and are out of
//! scope for a text patch — a full `UpdateParams` message replaces those.

use std::collections::BTreeMap;

use covenant_params::{GovernanceParams, StakingParams};

/// Applies `patch` to a clone of `staking`/`governance`, re-validating the
/// result. Unknown keys and unparseable values fail the whole patch rather
/// than applying partially, so a bad proposal never leaves params half
/// updated.
pub fn apply_parameter_patch(
    staking: &StakingParams,
    governance: &GovernanceParams,
    patch: &BTreeMap<String, String>,
) -> Result<(StakingParams, GovernanceParams), String> {
    let mut staking = staking.clone();
    let mut governance = governance.clone();

    for (key, value) in patch {
        match key.split_once('.') {
            Some(("staking", field)) => apply_staking_field(&mut staking, field, value)?,
            Some(("governance", field)) => apply_governance_field(&mut governance, field, value)?,
            _ => return Err(format!("unrecognized parameter key: {key}")),
        }
    }

    staking.validate().map_err(|e| e.to_string())?;
    governance.validate().map_err(|e| e.to_string())?;
    Ok((staking, governance))
}

fn parse<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, String> {
    value.parse().map_err(|_| format!("invalid value for {field}: {value}"))
}

fn apply_staking_field(params: &mut StakingParams, field: &str, value: &str) -> Result<(), String> {
    match field {
        "min_stake_amount" => params.min_stake_amount = parse(field, value)?,
        "unbonding_blocks" => params.unbonding_blocks = parse(field, value)?,
        "block_seconds" => params.block_seconds = parse(field, value)?,
        "epoch_blocks" => params.epoch_blocks = parse(field, value)?,
        "min_rewards_distribution" => params.min_rewards_distribution = parse(field, value)?,
        "staker_pool_bps" => params.staker_pool_bps = parse(field, value)?,
        "validator_pool_bps" => params.validator_pool_bps = parse(field, value)?,
        "governance_pool_bps" => params.governance_pool_bps = parse(field, value)?,
        "governance_pool_min_reputation" => params.governance_pool_min_reputation = parse(field, value)?,
        "repeat_offense_threshold" => params.repeat_offense_threshold = parse(field, value)?,
        "repeat_offense_penalty_bps" => params.repeat_offense_penalty_bps = parse(field, value)?,
        "reputation_decay_interval_blocks" => params.reputation_decay_interval_blocks = parse(field, value)?,
        "max_reputation_decay_bps" => params.max_reputation_decay_bps = parse(field, value)?,
        "reputation_recovery_rate" => params.reputation_recovery_rate = parse(field, value)?,
        "reputation_recovery_window_seconds" => params.reputation_recovery_window_seconds = parse(field, value)?,
        _ => return Err(format!("unrecognized staking parameter field: {field}")),
    }
    Ok(())
}

fn apply_governance_field(params: &mut GovernanceParams, field: &str, value: &str) -> Result<(), String> {
    match field {
        "min_deposit" => params.min_deposit = parse(field, value)?,
        "deposit_period_seconds" => params.deposit_period_seconds = parse(field, value)?,
        "voting_period_seconds" => params.voting_period_seconds = parse(field, value)?,
        "emergency_voting_period_seconds" => params.emergency_voting_period_seconds = parse(field, value)?,
        "quorum_bps" => params.quorum_bps = parse(field, value)?,
        "threshold_bps" => params.threshold_bps = parse(field, value)?,
        "veto_threshold_bps" => params.veto_threshold_bps = parse(field, value)?,
        "min_proposer_stake" => params.min_proposer_stake = parse(field, value)?,
        "max_proposals_per_day" => params.max_proposals_per_day = parse(field, value)?,
        "proposal_cooldown_hours" => params.proposal_cooldown_hours = parse(field, value)?,
        "proposal_fee" => params.proposal_fee = parse(field, value)?,
        "burn_deposits" => params.burn_deposits = parse(field, value)?,
        "burn_vote_veto" => params.burn_vote_veto = parse(field, value)?,
        "max_title_len" => params.max_title_len = parse(field, value)?,
        "max_description_len" => params.max_description_len = parse(field, value)?,
        _ => return Err(format!("unrecognized governance parameter field: {field}")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use covenant_types::Address;

    use super::*;

    fn params() -> (StakingParams, GovernanceParams) {
        (StakingParams::defaults_for_chain("covenant-testnet"), GovernanceParams::defaults(Address::new([9; 32])))
    }

    #[test]
    fn patches_a_known_staking_field() {
        let (staking, governance) = params();
        let mut patch = BTreeMap::new();
        patch.insert("staking.min_stake_amount".to_string(), "250".to_string());
        let (new_staking, _) = apply_parameter_patch(&staking, &governance, &patch).unwrap();
        assert_eq!(new_staking.min_stake_amount, 250);
    }

    #[test]
    fn patches_a_known_governance_field() {
        let (staking, governance) = params();
        let mut patch = BTreeMap::new();
        patch.insert("governance.quorum_bps".to_string(), "4000".to_string());
        let (_, new_governance) = apply_parameter_patch(&staking, &governance, &patch).unwrap();
        assert_eq!(new_governance.quorum_bps, 4_000);
    }

    #[test]
    fn unknown_key_fails_the_whole_patch() {
        let (staking, governance) = params();
        let mut patch = BTreeMap::new();
        patch.insert("staking.nonexistent_field".to_string(), "1".to_string());
        assert!(apply_parameter_patch(&staking, &governance, &patch).is_err());
    }

    #[test]
    fn result_that_fails_validation_is_rejected() {
        let (staking, governance) = params();
        let mut patch = BTreeMap::new();
        patch.insert("governance.quorum_bps".to_string(), "20000".to_string());
        assert!(apply_parameter_patch(&staking, &governance, &patch).is_err());
    }
}
