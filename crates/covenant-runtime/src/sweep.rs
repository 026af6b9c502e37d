//! `run_end_of_block` (spec §4.7/§5): the single deterministic
//! hook the host calls once per block after all of that block's transactions
//! have been applied.
//!
//! Order, in full: (1) Unbonding Queue sweep (spec §4.7: "runs ... before
//! these three governance passes"); (2) epoch-boundary reward distribution
//! and reputation recovery, gated by `StakeEngine::should_distribute`
//! (spec §4.5); (3) periodic reputation decay, gated on
//! `height % reputation_decay_interval_blocks == 0` (spec §4.4); (4)-(6) the
//! three governance passes (spec §4.7). Steps 2 and 3 are independent of
//! each other and of the unbonding sweep within the same block — see
//! DESIGN.md for why this crate still fixes one order rather than leaving it
//! to the host.

use covenant_bank::{Bank, Pool};
use covenant_events::EventBus;
use covenant_governance::ExecutionEffect;
use covenant_staking::HookRegistry;
use covenant_store::KvStore;

use crate::message::ParamRegistry;
use crate::params_patch::apply_parameter_patch;

/// Counts of work done by one `run_end_of_block` call, for diagnostics and
/// tests. Assembled by this module from the individual sweep return values;
/// neither `covenant-staking` nor `covenant-governance` needs to know this
/// shape exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub unbonding_completed: u32,
    pub rewards_distributed: bool,
    pub reputation_recoveries: u32,
    pub reputation_decays: u32,
    pub deposit_periods_rejected: u32,
    pub voting_periods_finalized: u32,
    pub proposals_executed: u32,
    pub proposals_failed: u32,
}

#[allow(clippy::too_many_arguments)]
pub fn run_end_of_block(
    store: &mut dyn KvStore,
    bank: &mut dyn Bank,
    events: &mut dyn EventBus,
    hooks: &mut HookRegistry,
    params: &mut ParamRegistry,
    height: u64,
    now: u64,
) -> SweepReport {
    let mut report = SweepReport::default();

    {
        let mut stake_engine = covenant_staking::StakeEngine::new(store, bank, events, &params.staking, hooks);
        report.unbonding_completed = stake_engine.sweep_unbonding_queue(now);

        if stake_engine.should_distribute(height) {
            let epoch = height / params.staking.epoch_blocks.max(1);
            let treasury_balance = stake_engine.bank.pool_balance(Pool::Rewards);
            match stake_engine.distribute(epoch, treasury_balance) {
                Ok(()) => report.rewards_distributed = true,
                Err(e) => log::error!("reward distribution failed at epoch {epoch}: {e}"),
            }
            report.reputation_recoveries = stake_engine.apply_reputation_recovery(now);
        }

        if height > 0 && height % params.staking.reputation_decay_interval_blocks.max(1) == 0 {
            report.reputation_decays = stake_engine.apply_reputation_decay(now);
        }
    }

    let mut gov_engine =
        covenant_governance::GovernanceEngine::new(store, bank, events, &params.governance, &params.staking);
    report.deposit_periods_rejected = gov_engine.sweep_deposit_end(now);
    let (finalized, passed) = gov_engine.sweep_voting_end(now);
    report.voting_periods_finalized = finalized;

    for id in passed {
        let effect = match gov_engine.execute_proposal(id, now) {
            Ok(effect) => effect,
            Err(e) => {
                if let Err(e2) = gov_engine.finalize_execution(id, now, Err(e.to_string())) {
                    log::error!("failed to finalize execution failure for proposal {id}: {e2}");
                }
                report.proposals_failed += 1;
                continue;
            }
        };

        let result =
            apply_execution_effect(gov_engine.store, gov_engine.bank, gov_engine.events, hooks, params, effect, now);
        match &result {
            Ok(()) => report.proposals_executed += 1,
            Err(_) => report.proposals_failed += 1,
        }
        if let Err(e) = gov_engine.finalize_execution(id, now, result) {
            log::error!("failed to finalize execution for proposal {id}: {e}");
        }
    }

    report
}

/// Applies the part of a passed proposal's execution `covenant-governance`
/// cannot: Parameter Registry writes and Stake Ledger tier overrides.
/// `ListingRequirementChange`/`TradingHalt` have no collaborating module in
/// this crate — the proposal record itself (type, metadata, `executed`) is
/// the durable record of the decision; enforcing it is a host-module concern
/// outside this crate's scope (spec §1 non-goals) — see DESIGN.md.
fn apply_execution_effect(
    store: &mut dyn KvStore,
    bank: &mut dyn Bank,
    events: &mut dyn EventBus,
    hooks: &mut HookRegistry,
    params: &mut ParamRegistry,
    effect: ExecutionEffect,
    now: u64,
) -> Result<(), String> {
    match effect {
        ExecutionEffect::Applied => Ok(()),
        ExecutionEffect::ParameterChange { patch } => {
            let (new_staking, new_governance) = apply_parameter_patch(&params.staking, &params.governance, &patch)?;
            params.staking = new_staking;
            params.governance = new_governance;
            Ok(())
        }
        ExecutionEffect::ValidatorTierChange { validator, new_tier } => {
            let mut engine = covenant_staking::StakeEngine::new(store, bank, events, &params.staking, hooks);
            engine.set_validator_tier(&validator, new_tier, now).map_err(|e| e.to_string())
        }
        ExecutionEffect::ListingRequirementChange { .. } | ExecutionEffect::TradingHalt { .. } => {
            log::info!("execution effect recorded on the proposal record; no in-crate module enforces it");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use covenant_bank::MemBank;
    use covenant_events::MemEventBus;
    use covenant_governance::{GovMsg, ProposalType};
    use covenant_params::{GovernanceParams, StakingParams};
    use covenant_store::MemKvStore;
    use covenant_types::Address;

    use super::*;
    use crate::message::{dispatch_message, Message};

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn end_of_block_sweeps_unbonding_and_governance_in_one_call() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 10_000);
        let mut events = MemEventBus::new();
        let mut hooks = HookRegistry::new();
        let mut params = ParamRegistry::new(
            StakingParams::defaults_for_chain("covenant-testnet"),
            GovernanceParams::defaults(addr(9)),
        );

        dispatch_message(
            &mut store,
            &mut bank,
            &mut events,
            &mut hooks,
            &mut params,
            Message::Stake(covenant_staking::StakeMsg::Stake { staker: addr(1), amount: 5_000 }),
            0,
            0,
        )
        .unwrap();
        dispatch_message(
            &mut store,
            &mut bank,
            &mut events,
            &mut hooks,
            &mut params,
            Message::Stake(covenant_staking::StakeMsg::Unstake { staker: addr(1), amount: 1_000 }),
            0,
            0,
        )
        .unwrap();

        let completion = params.staking.unbonding_period_seconds();
        let report = run_end_of_block(&mut store, &mut bank, &mut events, &mut hooks, &mut params, 1, completion + 1);
        assert_eq!(report.unbonding_completed, 1);
        assert_eq!(bank.balance(&addr(1)), 6_000);
    }

    #[test]
    fn parameter_change_proposal_executes_into_live_params() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 50_000);
        let mut events = MemEventBus::new();
        let mut hooks = HookRegistry::new();
        let mut params = ParamRegistry::new(
            StakingParams::defaults_for_chain("covenant-testnet"),
            GovernanceParams::defaults(addr(9)),
        );

        dispatch_message(
            &mut store,
            &mut bank,
            &mut events,
            &mut hooks,
            &mut params,
            Message::Stake(covenant_staking::StakeMsg::Stake { staker: addr(1), amount: 50_000 }),
            0,
            0,
        )
        .unwrap();

        let resp = dispatch_message(
            &mut store,
            &mut bank,
            &mut events,
            &mut hooks,
            &mut params,
            Message::Governance(GovMsg::SubmitProposal {
                proposer: addr(1),
                proposal_type: ProposalType::ParameterChange,
                title: "raise quorum".into(),
                description: "d".into(),
                initial_deposit: params.governance.min_deposit,
                company_id: None,
                validator: None,
                emergency: None,
                metadata: Default::default(),
            }),
            0,
            0,
        )
        .unwrap();
        let id = match resp {
            crate::message::MessageResponse::Governance(covenant_governance::GovMsgResponse::ProposalSubmitted {
                proposal_id,
            }) => proposal_id,
            _ => panic!("unexpected response"),
        };

        {
            let mut p = covenant_governance::get_proposal_query(&store, id).unwrap();
            p.metadata.insert("governance.quorum_bps".to_string(), "4000".to_string());
            store.set(&covenant_store::keys::proposal(id), covenant_store::encode(&p));
        }

        dispatch_message(
            &mut store,
            &mut bank,
            &mut events,
            &mut hooks,
            &mut params,
            Message::Governance(GovMsg::Vote { voter: addr(1), proposal_id: id, option: covenant_governance::VoteOption::Yes }),
            0,
            0,
        )
        .unwrap();

        let voting_end = params.governance.voting_period_seconds + 1;
        run_end_of_block(&mut store, &mut bank, &mut events, &mut hooks, &mut params, 1, voting_end);
        assert_eq!(params.governance.quorum_bps, 4_000);
        let p = covenant_governance::get_proposal_query(&store, id).unwrap();
        assert!(p.executed);
        assert_eq!(p.status, covenant_governance::ProposalStatus::Passed);
    }
}
