//! Voting & Tally (component C10, spec §4.6 "Vote / VoteWeighted", "Tally").
//! Grounded on the teacher's `process_vote`/`vote_weight.rs` cast-and-tally
//! shape, generalized from a single lock-duration weight lookup to
//! delegation-resolved effective power (§4.6) and from a fixed yes/no
//! outcome to the full quorum/threshold/veto rule.

use covenant_events::Event;
use covenant_store::keys;
use covenant_types::{Address, CoreError, BPS_DENOMINATOR};

use crate::delegation::effective_power;
use crate::engine::GovernanceEngine;
use crate::state::{proposal_type_tag, Proposal, ProposalStatus, TallyCounters, Vote, VoteOption, WeightedVote};

fn get_proposal(store: &dyn covenant_store::KvStore, id: u64) -> Option<Proposal> {
    store.get(&keys::proposal(id)).map(|b| covenant_store::decode(&b).expect("corrupt Proposal record"))
}

fn put_proposal(store: &mut dyn covenant_store::KvStore, p: &Proposal) {
    store.set(&keys::proposal(p.id), covenant_store::encode(p));
}

/// Zero unless the proposal carries an emergency annotation and `tier` is at
/// least its `min_voter_tier` (spec §4.6: "a voter at tier < emergency's
/// required tier contributes zero to the proposal's tally even if their
/// vote record exists").
fn emergency_gated_power(proposal: &Proposal, voter_tier: covenant_params::Tier, power: u64) -> u64 {
    match proposal.emergency {
        Some(ann) if voter_tier < ann.min_voter_tier => 0,
        _ => power,
    }
}

impl<'a> GovernanceEngine<'a> {
    /// `Vote(voter, proposal_id, option, reason?)` (spec §4.6, §6.1).
    /// Replaces any prior `Vote` or `WeightedVote` this voter cast on the
    /// same proposal — at most one of the two may exist per (proposal,
    /// voter), and re-casting is a plain overwrite since the tally is
    /// recomputed lazily from stored votes at finalization.
    pub fn cast_vote(
        &mut self,
        voter: Address,
        proposal_id: u64,
        option: VoteOption,
        now: u64,
        now_height: u64,
    ) -> Result<(), CoreError> {
        let proposal = get_proposal(self.store, proposal_id).ok_or(CoreError::ProposalNotFound(proposal_id))?;
        if proposal.status != ProposalStatus::VotingPeriod {
            return Err(CoreError::InvalidProposalStatus);
        }
        if now >= proposal.voting_end_time {
            return Err(CoreError::VotingPeriodEnded);
        }

        let type_tag = proposal_type_tag(&proposal.proposal_type);
        let voter_tier = covenant_staking::get_user_tier(self.store, &voter);
        let raw_power = effective_power(self.store, &voter, proposal.company_id, type_tag, now_height);
        let power = emergency_gated_power(&proposal, voter_tier, raw_power);

        self.store.remove(&keys::weighted_vote(proposal_id, &voter));
        let record = Vote { proposal_id, voter, option, weight: 1, voting_power: power };
        self.store.set(&keys::vote(proposal_id, &voter), covenant_store::encode(&record));

        self.events.emit(Event::Vote { proposal_id, voter, power });
        log::info!("vote cast: proposal {proposal_id} voter {voter:?} option {option:?} power {power}");
        Ok(())
    }

    /// `VoteWeighted(voter, proposal_id, [(option, weight)], reason?)`
    /// (spec §4.6, §6.1). `weights` must be non-negative (guaranteed by the
    /// `u64` basis-point type) and sum to exactly `BPS_DENOMINATOR`.
    pub fn cast_weighted_vote(
        &mut self,
        voter: Address,
        proposal_id: u64,
        weights: Vec<(VoteOption, u64)>,
        now: u64,
        now_height: u64,
    ) -> Result<(), CoreError> {
        let proposal = get_proposal(self.store, proposal_id).ok_or(CoreError::ProposalNotFound(proposal_id))?;
        if proposal.status != ProposalStatus::VotingPeriod {
            return Err(CoreError::InvalidProposalStatus);
        }
        if now >= proposal.voting_end_time {
            return Err(CoreError::VotingPeriodEnded);
        }
        let sum: u64 = weights.iter().map(|(_, w)| *w).sum();
        if sum != BPS_DENOMINATOR {
            return Err(CoreError::InvalidVoteOption);
        }

        let type_tag = proposal_type_tag(&proposal.proposal_type);
        let voter_tier = covenant_staking::get_user_tier(self.store, &voter);
        let raw_power = effective_power(self.store, &voter, proposal.company_id, type_tag, now_height);
        let power = emergency_gated_power(&proposal, voter_tier, raw_power);

        self.store.remove(&keys::vote(proposal_id, &voter));
        let record = WeightedVote { proposal_id, voter, weights, voting_power: power };
        self.store.set(&keys::weighted_vote(proposal_id, &voter), covenant_store::encode(&record));

        self.events.emit(Event::Vote { proposal_id, voter, power });
        log::info!("weighted vote cast: proposal {proposal_id} voter {voter:?} power {power}");
        Ok(())
    }
}

/// Recomputes tally counters from every stored `Vote`/`WeightedVote` on
/// `proposal_id` (spec §9: "lazy tally computation at finalization from
/// stored votes"). Pure function of store state — used both by
/// `finalize_proposal` and by a property test asserting the cached tally on
/// `Proposal` agrees with a fresh recomputation.
pub fn recompute_tally(store: &dyn covenant_store::KvStore, proposal_id: u64) -> TallyCounters {
    let mut counters = TallyCounters::default();

    for (_, v) in store.prefix_iterate(&keys::vote_scan(proposal_id)) {
        let vote: Vote = covenant_store::decode(&v).expect("corrupt Vote record");
        match vote.option {
            VoteOption::Yes => counters.yes += vote.voting_power,
            VoteOption::No => counters.no += vote.voting_power,
            VoteOption::Abstain => counters.abstain += vote.voting_power,
            VoteOption::Veto => counters.veto += vote.voting_power,
        }
    }

    for (_, v) in store.prefix_iterate(&keys::weighted_vote_scan(proposal_id)) {
        let wv: WeightedVote = covenant_store::decode(&v).expect("corrupt WeightedVote record");
        for (option, weight_bps) in wv.weights {
            let share = covenant_types::bps_of(wv.voting_power, weight_bps);
            match option {
                VoteOption::Yes => counters.yes += share,
                VoteOption::No => counters.no += share,
                VoteOption::Abstain => counters.abstain += share,
                VoteOption::Veto => counters.veto += share,
            }
        }
    }

    counters
}

/// Tally outcome (spec §4.6). `Rejected` variants carry the reason an
/// indexer or `ProposalRejected` event would want (`QuorumNotMet`,
/// `Vetoed`, or plain threshold failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    RejectedQuorumNotMet,
    RejectedVetoed,
    RejectedThresholdNotMet,
}

/// Applies spec §4.6's outcome rule to a tally and the chain's total
/// eligible voting weight at `voting_end_time`.
pub fn decide_outcome(tally: &TallyCounters, total_eligible_power: u64, proposal: &Proposal) -> Outcome {
    let participating = tally.participating();
    if total_eligible_power == 0 {
        return Outcome::RejectedQuorumNotMet;
    }
    let turnout_bps = (participating as u128 * BPS_DENOMINATOR as u128 / total_eligible_power as u128) as u64;
    if turnout_bps < proposal.quorum_bps {
        return Outcome::RejectedQuorumNotMet;
    }
    if participating == 0 {
        return Outcome::RejectedThresholdNotMet;
    }
    let veto_bps = (tally.veto as u128 * BPS_DENOMINATOR as u128 / participating as u128) as u64;
    if veto_bps >= proposal.veto_threshold_bps {
        return Outcome::RejectedVetoed;
    }
    let yes_bps = (tally.yes as u128 * BPS_DENOMINATOR as u128 / participating as u128) as u64;
    if yes_bps >= proposal.threshold_bps {
        Outcome::Passed
    } else {
        Outcome::RejectedThresholdNotMet
    }
}

pub fn get_vote_query(store: &dyn covenant_store::KvStore, proposal_id: u64, voter: &Address) -> Option<Vote> {
    store.get(&keys::vote(proposal_id, voter)).map(|b| covenant_store::decode(&b).expect("corrupt Vote record"))
}

pub fn get_weighted_vote_query(store: &dyn covenant_store::KvStore, proposal_id: u64, voter: &Address) -> Option<WeightedVote> {
    store.get(&keys::weighted_vote(proposal_id, voter)).map(|b| covenant_store::decode(&b).expect("corrupt WeightedVote record"))
}

pub(crate) fn put_proposal_tally(store: &mut dyn covenant_store::KvStore, proposal: &mut Proposal, tally: TallyCounters) {
    proposal.tally = tally;
    put_proposal(store, proposal);
}
