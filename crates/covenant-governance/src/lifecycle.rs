//! Governance Lifecycle (component C11, spec §4.7): the three end-of-block
//! passes over the deposit-end queue, the voting-end queue, and the pending
//! execution list. Grounded on the teacher's end-of-epoch settlement sweep
//! idiom (`governance/src/processor.rs`'s `process_execute_proposal`),
//! generalized from a single caller-invoked instruction into three ordered,
//! store-driven queue sweeps that `covenant-runtime::run_end_of_block` drives.

use std::collections::BTreeMap;

use covenant_bank::Pool;
use covenant_events::Event;
use covenant_params::Tier;
use covenant_store::keys;
use covenant_types::{Address, CoreError};

use crate::engine::GovernanceEngine;
use crate::state::{proposal_status_tag, Deposit, Proposal, ProposalStatus, ProposalType};
use crate::voting::{decide_outcome, recompute_tally, Outcome};

fn get_proposal(store: &dyn covenant_store::KvStore, id: u64) -> Option<Proposal> {
    store.get(&keys::proposal(id)).map(|b| covenant_store::decode(&b).expect("corrupt Proposal record"))
}

fn put_proposal(store: &mut dyn covenant_store::KvStore, p: &Proposal) {
    store.set(&keys::proposal(p.id), covenant_store::encode(p));
}

fn reindex_status(store: &mut dyn covenant_store::KvStore, id: u64, old: ProposalStatus, new: ProposalStatus) {
    store.remove(&keys::proposal_by_status(proposal_status_tag(old), id));
    store.set(&keys::proposal_by_status(proposal_status_tag(new), id), covenant_store::encode(&id));
}

/// Refunds (to each depositor) or burns (from the `Deposits` pool) every
/// `Deposit` recorded against `proposal_id`. The `Bank` trait has no
/// pool-to-pool primitive, so "forfeited, not returned" (spec §4.7) is
/// implemented as a burn rather than a reroute into `Pool::Community` — see
/// DESIGN.md.
fn dispose_deposits(engine: &mut GovernanceEngine<'_>, proposal_id: u64, refund: bool) -> Result<(), CoreError> {
    let deposits: Vec<Deposit> = engine
        .store
        .prefix_iterate(&keys::deposit_scan(proposal_id))
        .into_iter()
        .map(|(_, v)| covenant_store::decode(&v).expect("corrupt Deposit record"))
        .collect();
    for d in deposits {
        if refund {
            engine.bank.transfer_from_pool(Pool::Deposits, &d.depositor, d.amount)?;
        } else {
            engine.bank.burn_from_pool(Pool::Deposits, d.amount)?;
        }
    }
    Ok(())
}

/// Effect a passed proposal's execution surfaces to `covenant-runtime` for
/// the part this engine cannot apply itself (spec §4.7: "dispatches by
/// proposal type to the relevant mutator"). `CommunitySpend`/
/// `TreasuryTransfer` are applied directly against the `Bank` inside
/// `execute_proposal` and always produce `Applied`; every other mutating
/// proposal type needs a collaborating module (the Parameter Registry or the
/// Stake Ledger) this engine has no handle to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEffect {
    /// Execution is complete; nothing further to apply.
    Applied,
    /// Parameter Registry write (spec §4.8). `patch` carries
    /// `"staking.<field>"` / `"governance.<field>"` keys to decimal-string
    /// values; the runtime resolves and re-validates them against its live
    /// `StakingParams`/`GovernanceParams`.
    ParameterChange { patch: BTreeMap<String, String> },
    ValidatorTierChange { validator: Address, new_tier: Tier },
    ListingRequirementChange { metadata: BTreeMap<String, String> },
    TradingHalt { halted: bool },
}

impl<'a> GovernanceEngine<'a> {
    /// Pass 1 (spec §4.7): rejects every `DepositPeriod` proposal whose
    /// `deposit_end_time <= now` and still hasn't reached `min_deposit`.
    /// Proposals already activated by `try_activate` were removed from this
    /// queue at activation time, so a stale hit here is a no-op cleanup, not
    /// an error.
    pub fn sweep_deposit_end(&mut self, now: u64) -> u32 {
        let (lower, upper) = keys::time_queue_bound(covenant_store::prefix::DEPOSIT_END_QUEUE, now);
        let due: Vec<u64> = self
            .store
            .range_iterate(&lower, &upper)
            .into_iter()
            .map(|(_, v)| covenant_store::decode(&v).expect("corrupt deposit-end queue entry"))
            .collect();

        let mut rejected = 0u32;
        for id in due {
            let Some(mut proposal) = get_proposal(self.store, id) else { continue };
            self.store.remove(&keys::deposit_end_queue_entry(proposal.deposit_end_time, id));
            if proposal.status != ProposalStatus::DepositPeriod {
                continue;
            }

            reindex_status(self.store, id, ProposalStatus::DepositPeriod, ProposalStatus::Rejected);
            proposal.status = ProposalStatus::Rejected;
            put_proposal(self.store, &proposal);

            if let Err(e) = dispose_deposits(self, id, !self.gov_params.burn_deposits) {
                log::error!("deposit disposition failed for proposal {id}: {e}");
            }
            self.events.emit(Event::ProposalRejected {
                proposal_id: id,
                reason: "deposit period ended without reaching min_deposit".to_string(),
            });
            log::info!("proposal {id} rejected at deposit-end sweep");
            rejected += 1;
        }
        rejected
    }

    /// Pass 2 (spec §4.7): finalizes every `VotingPeriod` proposal whose
    /// `voting_end_time <= now` by recomputing its tally and applying the
    /// quorum/threshold/veto rule. Returns the ids of proposals that passed,
    /// for pass 3 to execute.
    pub fn sweep_voting_end(&mut self, now: u64) -> (u32, Vec<u64>) {
        let (lower, upper) = keys::time_queue_bound(covenant_store::prefix::VOTING_END_QUEUE, now);
        let due: Vec<u64> = self
            .store
            .range_iterate(&lower, &upper)
            .into_iter()
            .map(|(_, v)| covenant_store::decode(&v).expect("corrupt voting-end queue entry"))
            .collect();

        let mut finalized = 0u32;
        let mut passed = Vec::new();
        for id in due {
            let Some(mut proposal) = get_proposal(self.store, id) else { continue };
            self.store.remove(&keys::voting_end_queue_entry(proposal.voting_end_time, id));
            if proposal.status != ProposalStatus::VotingPeriod {
                continue;
            }

            let tally = recompute_tally(self.store, id);
            let total_eligible = covenant_staking::get_total_weight(self.store).min(u64::MAX as u128) as u64;
            let outcome = decide_outcome(&tally, total_eligible, &proposal);
            proposal.tally = tally;

            match outcome {
                Outcome::Passed => {
                    reindex_status(self.store, id, ProposalStatus::VotingPeriod, ProposalStatus::Passed);
                    proposal.status = ProposalStatus::Passed;
                    put_proposal(self.store, &proposal);
                    if let Err(e) = dispose_deposits(self, id, true) {
                        log::error!("deposit refund failed for passed proposal {id}: {e}");
                    }
                    self.events.emit(Event::ProposalPassed { proposal_id: id });
                    log::info!("proposal {id} passed, queued for execution");
                    passed.push(id);
                }
                Outcome::RejectedQuorumNotMet | Outcome::RejectedThresholdNotMet => {
                    reindex_status(self.store, id, ProposalStatus::VotingPeriod, ProposalStatus::Rejected);
                    proposal.status = ProposalStatus::Rejected;
                    put_proposal(self.store, &proposal);
                    if let Err(e) = dispose_deposits(self, id, !self.gov_params.burn_deposits) {
                        log::error!("deposit disposition failed for rejected proposal {id}: {e}");
                    }
                    let reason = if outcome == Outcome::RejectedQuorumNotMet { "quorum not met" } else { "approval threshold not met" };
                    self.events.emit(Event::ProposalRejected { proposal_id: id, reason: reason.to_string() });
                    log::info!("proposal {id} rejected at voting-end sweep: {reason}");
                }
                Outcome::RejectedVetoed => {
                    reindex_status(self.store, id, ProposalStatus::VotingPeriod, ProposalStatus::Rejected);
                    proposal.status = ProposalStatus::Rejected;
                    put_proposal(self.store, &proposal);
                    if let Err(e) = dispose_deposits(self, id, !self.gov_params.burn_vote_veto) {
                        log::error!("deposit disposition failed for vetoed proposal {id}: {e}");
                    }
                    self.events.emit(Event::ProposalRejected { proposal_id: id, reason: "vetoed".to_string() });
                    log::info!("proposal {id} vetoed at voting-end sweep");
                }
            }
            finalized += 1;
        }
        (finalized, passed)
    }

    /// Pass 3, step one (spec §4.7): dispatches `id`'s execution by proposal
    /// type. An emergency proposal whose `time_limit_seconds` has elapsed
    /// since `voting_end_time` fails outright rather than executing late.
    pub fn execute_proposal(&mut self, id: u64, now: u64) -> Result<ExecutionEffect, CoreError> {
        let proposal = get_proposal(self.store, id).ok_or(CoreError::ProposalNotFound(id))?;
        if proposal.status != ProposalStatus::Passed {
            return Err(CoreError::InvalidProposalStatus);
        }
        if let Some(ann) = proposal.emergency {
            if now > proposal.voting_end_time.saturating_add(ann.time_limit_seconds) {
                return Err(CoreError::ProposalExecutionFailed("emergency time limit exceeded".to_string()));
            }
        }

        match proposal.proposal_type {
            ProposalType::CommunitySpend { recipient, amount } | ProposalType::TreasuryTransfer { recipient, amount } => {
                self.bank.transfer_from_pool(Pool::Community, &recipient, amount)?;
                Ok(ExecutionEffect::Applied)
            }
            ProposalType::ValidatorTierChange { validator, new_tier } => {
                Ok(ExecutionEffect::ValidatorTierChange { validator, new_tier })
            }
            ProposalType::ParameterChange => Ok(ExecutionEffect::ParameterChange { patch: proposal.metadata.clone() }),
            ProposalType::ListingRequirementChange => {
                Ok(ExecutionEffect::ListingRequirementChange { metadata: proposal.metadata.clone() })
            }
            ProposalType::TradingHalt { halted } => Ok(ExecutionEffect::TradingHalt { halted }),
            ProposalType::Generic | ProposalType::SoftwareUpgrade | ProposalType::CompanyGovernance { .. } | ProposalType::Emergency => {
                Ok(ExecutionEffect::Applied)
            }
        }
    }

    /// Pass 3, step two (spec §4.7): records the outcome of applying an
    /// `ExecutionEffect`. `Passed` proposals have no distinct "executed"
    /// status of their own — `executed`/`execution_time`/`execution_result`
    /// on the `Proposal` record carry that — a failure is the only outcome
    /// that moves the status forward, to `Failed`.
    pub fn finalize_execution(&mut self, id: u64, now: u64, result: Result<(), String>) -> Result<(), CoreError> {
        let mut proposal = get_proposal(self.store, id).ok_or(CoreError::ProposalNotFound(id))?;
        proposal.executed = true;
        proposal.execution_time = now;

        match result {
            Ok(()) => {
                proposal.execution_result = "ok".to_string();
                put_proposal(self.store, &proposal);
                self.events.emit(Event::ProposalExecuted { proposal_id: id });
                log::info!("proposal {id} executed");
            }
            Err(msg) => {
                reindex_status(self.store, id, ProposalStatus::Passed, ProposalStatus::Failed);
                proposal.status = ProposalStatus::Failed;
                proposal.execution_result = msg.clone();
                put_proposal(self.store, &proposal);
                self.events.emit(Event::ProposalFailed { proposal_id: id, result: msg });
                log::warn!("proposal {id} execution failed");
            }
        }
        Ok(())
    }
}
