//! Genesis state load (spec §6.6): seeds the Stake Ledger and Proposal Store
//! directly from chain-config state, with no bank transfers and no emitted
//! events — the host's bank module is assumed to already hold the bonded
//! balances genesis declares, the same way the teacher's `solana-genesis`/
//! `trv1_genesis.rs` stamps initial account lamports directly into the
//! ledger rather than replaying a funding transaction for each one.
//!
//! No teacher module is a direct analogue (the teacher's genesis tooling
//! builds a `solana_sdk::Account` table, not `KvStore` records), so this is
//! built in the crate's own established idiom: validate-then-commit, direct
//! `covenant_store::keys` + `encode` calls, the same pattern
//! `covenant_runtime::params_patch` and the `covenant-governance` proposal
//! writers already use.

use covenant_governance::{
    emergency_type_tag, proposal_status_tag, proposal_type_tag, Deposit, Proposal, ProposalStatus, Vote, WeightedVote,
};
use covenant_params::{GovernanceParams, StakingParams};
use covenant_staking::{TierCount, UserStake};
use covenant_store::{keys, KvStore};
use covenant_types::CoreError;

use crate::message::ParamRegistry;

/// One proposal plus the votes and deposits recorded against it at genesis
/// (spec §6.6: "open proposals, open votes, open deposits").
#[derive(Debug, Clone)]
pub struct GenesisProposal {
    pub proposal: Proposal,
    pub votes: Vec<Vote>,
    pub weighted_votes: Vec<WeightedVote>,
    pub deposits: Vec<Deposit>,
}

#[derive(Debug, Clone)]
pub struct GenesisState {
    pub staking_params: StakingParams,
    pub governance_params: GovernanceParams,
    pub user_stakes: Vec<UserStake>,
    pub proposals: Vec<GenesisProposal>,
}

/// Validates and commits `genesis` into `store`, returning the live
/// [`ParamRegistry`] the runtime dispatches against thereafter.
///
/// Validation order mirrors the write order: parameter sets first (nothing
/// downstream is meaningful without them), then each `UserStake` against
/// the *genesis* tier thresholds (spec §6.6: "validation rejects any
/// UserStake whose tier does not match its bonded amount given the genesis
/// thresholds" — deliberately the thresholds this genesis declares, not
/// whatever a later `UpdateParams` might set), then proposals.
pub fn init_genesis(store: &mut dyn KvStore, genesis: GenesisState) -> Result<ParamRegistry, CoreError> {
    genesis.staking_params.validate()?;
    genesis.governance_params.validate()?;

    let mut tier_count = TierCount::default();
    for stake in &genesis.user_stakes {
        if stake.bonded_amount == 0 {
            return Err(CoreError::InvalidGenesis(format!(
                "UserStake for {:?} has bonded_amount 0; absent bonded_amount must mean an absent record",
                stake.owner
            )));
        }
        let expected_tier = genesis.staking_params.tier_thresholds.tier_for_amount(stake.bonded_amount);
        if stake.tier != expected_tier {
            return Err(CoreError::InvalidGenesis(format!(
                "UserStake for {:?} has tier {:?}, expected {:?} for bonded_amount {}",
                stake.owner, stake.tier, expected_tier, stake.bonded_amount
            )));
        }
        if stake.is_validator && stake.tier < covenant_params::Tier::Validator {
            return Err(CoreError::InvalidGenesis(format!(
                "UserStake for {:?} is marked is_validator but tier {:?} is below Validator",
                stake.owner, stake.tier
            )));
        }
        tier_count.increment(stake.tier);
        store.set(&keys::user_stake(&stake.owner), covenant_store::encode(stake));
    }
    store.set(&keys::tier_count(), covenant_store::encode(&tier_count));

    let mut max_proposal_id = None;
    for gp in &genesis.proposals {
        let p = &gp.proposal;
        max_proposal_id = Some(max_proposal_id.map_or(p.id, |m: u64| m.max(p.id)));

        store.set(&keys::proposal_by_status(proposal_status_tag(p.status), p.id), covenant_store::encode(&p.id));
        store.set(&keys::proposal_by_submitter(&p.proposer, p.id), covenant_store::encode(&p.id));
        store.set(&keys::proposal_by_type(proposal_type_tag(&p.proposal_type), p.id), covenant_store::encode(&p.id));
        if let Some(cid) = p.company_id {
            store.set(&keys::proposal_by_company(cid, p.id), covenant_store::encode(&p.id));
        }
        if let Some(v) = p.validator {
            store.set(&keys::proposal_by_validator(&v, p.id), covenant_store::encode(&p.id));
        }
        if let Some(ann) = p.emergency {
            store.set(&keys::emergency_by_type(emergency_type_tag(ann.emergency_type), p.id), covenant_store::encode(&p.id));
            store.set(&keys::emergency_by_severity(ann.severity, p.id), covenant_store::encode(&p.id));
        }
        match p.status {
            ProposalStatus::DepositPeriod => {
                store.set(&keys::deposit_end_queue_entry(p.deposit_end_time, p.id), covenant_store::encode(&p.id));
            }
            ProposalStatus::VotingPeriod => {
                store.set(&keys::voting_end_queue_entry(p.voting_end_time, p.id), covenant_store::encode(&p.id));
            }
            _ => {}
        }

        for vote in &gp.votes {
            store.set(&keys::vote(p.id, &vote.voter), covenant_store::encode(vote));
        }
        for wv in &gp.weighted_votes {
            store.set(&keys::weighted_vote(p.id, &wv.voter), covenant_store::encode(wv));
        }
        for dep in &gp.deposits {
            store.set(&keys::deposit(p.id, &dep.depositor), covenant_store::encode(dep));
        }

        store.set(&keys::proposal(p.id), covenant_store::encode(p));
    }
    store.set(&keys::next_proposal_id(), covenant_store::encode(&max_proposal_id.map_or(0, |m| m + 1)));

    Ok(ParamRegistry::new(genesis.staking_params, genesis.governance_params))
}

#[cfg(test)]
mod tests {
    use covenant_governance::{ProposalType, TallyCounters};
    use covenant_params::Tier;
    use covenant_store::MemKvStore;
    use covenant_types::Address;

    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    fn authority() -> Address {
        addr(99)
    }

    #[test]
    fn seeds_user_stakes_and_tier_counts() {
        let mut store = MemKvStore::new();
        let staking_params = StakingParams::defaults_for_chain("covenant-testnet");
        let thresholds = staking_params.tier_thresholds;
        let mut stake = UserStake::new(addr(1), 0);
        stake.bonded_amount = thresholds.keeper;
        stake.tier = Tier::Keeper;

        let genesis = GenesisState {
            staking_params,
            governance_params: GovernanceParams::defaults(authority()),
            user_stakes: vec![stake],
            proposals: vec![],
        };

        let params = init_genesis(&mut store, genesis).unwrap();
        let loaded: UserStake = covenant_store::decode(&store.get(&keys::user_stake(&addr(1))).unwrap()).unwrap();
        assert_eq!(loaded.tier, Tier::Keeper);
        let counts: TierCount = covenant_store::decode(&store.get(&keys::tier_count()).unwrap()).unwrap();
        assert_eq!(counts.get(Tier::Keeper), 1);
        assert_eq!(params.governance.authority, authority());
    }

    #[test]
    fn rejects_tier_mismatched_with_genesis_thresholds() {
        let mut store = MemKvStore::new();
        let staking_params = StakingParams::defaults_for_chain("covenant-testnet");
        let mut stake = UserStake::new(addr(1), 0);
        stake.bonded_amount = staking_params.tier_thresholds.keeper;
        stake.tier = Tier::Warden; // wrong: amount only qualifies for Keeper

        let genesis = GenesisState {
            staking_params,
            governance_params: GovernanceParams::defaults(authority()),
            user_stakes: vec![stake],
            proposals: vec![],
        };

        assert!(init_genesis(&mut store, genesis).is_err());
    }

    #[test]
    fn rejects_zero_bonded_user_stake_record() {
        let mut store = MemKvStore::new();
        let staking_params = StakingParams::defaults_for_chain("covenant-testnet");
        let stake = UserStake::new(addr(1), 0);

        let genesis = GenesisState {
            staking_params,
            governance_params: GovernanceParams::defaults(authority()),
            user_stakes: vec![stake],
            proposals: vec![],
        };

        assert!(init_genesis(&mut store, genesis).is_err());
    }

    #[test]
    fn seeds_open_proposal_with_votes_and_deposits_and_queue_entry() {
        let mut store = MemKvStore::new();
        let gparams = GovernanceParams::defaults(authority());

        let mut proposal = Proposal {
            id: 7,
            proposal_type: ProposalType::Generic,
            title: "t".into(),
            description: "d".into(),
            proposer: addr(1),
            status: ProposalStatus::VotingPeriod,
            deposit_end_time: 100,
            voting_start_time: 100,
            voting_end_time: 200,
            total_deposit: gparams.min_deposit,
            min_deposit: gparams.min_deposit,
            quorum_bps: gparams.quorum_bps,
            threshold_bps: gparams.threshold_bps,
            veto_threshold_bps: gparams.veto_threshold_bps,
            tally: TallyCounters::default(),
            executed: false,
            execution_time: 0,
            execution_result: String::new(),
            company_id: None,
            validator: None,
            metadata: Default::default(),
            emergency: None,
            created_at: 0,
        };
        proposal.total_deposit = gparams.min_deposit;

        let vote = Vote { proposal_id: 7, voter: addr(2), option: covenant_governance::VoteOption::Yes, weight: 1, voting_power: 500 };
        let deposit = Deposit { proposal_id: 7, depositor: addr(1), amount: gparams.min_deposit, deposited_time: 0 };

        let genesis = GenesisState {
            staking_params: StakingParams::defaults_for_chain("covenant-testnet"),
            governance_params: gparams,
            user_stakes: vec![],
            proposals: vec![GenesisProposal { proposal, votes: vec![vote], weighted_votes: vec![], deposits: vec![deposit] }],
        };

        init_genesis(&mut store, genesis).unwrap();

        let loaded = covenant_governance::get_proposal_query(&store, 7).unwrap();
        assert_eq!(loaded.status, ProposalStatus::VotingPeriod);
        assert!(store.get(&keys::voting_end_queue_entry(200, 7)).is_some());
        assert!(store.get(&keys::vote(7, &addr(2))).is_some());
        assert!(store.get(&keys::deposit(7, &addr(1))).is_some());
        let next_id: u64 = covenant_store::decode(&store.get(&keys::next_proposal_id()).unwrap()).unwrap();
        assert_eq!(next_id, 8);
    }
}
