//! Governance message taxonomy and dispatch (spec §6.1).
//!
//! Mirrors `covenant_staking::message`'s shape: a value-typed enum crossing
//! the host boundary, dispatched against a borrowed `GovernanceEngine`.
//! `Delegate`/`RevokeDelegation` are not named in spec.md's §6.1 list, which
//! enumerates only `SubmitProposal`/`Vote`/`VoteWeighted`/`Deposit`/
//! `CancelProposal`, but `VoteDelegation` is a full data-model entity with
//! its own queries (spec §3.5) that needs a way to be created in the first
//! place; see DESIGN.md.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use covenant_params::GovernanceParams;
use covenant_types::{Address, CoreError};

use crate::engine::GovernanceEngine;
use crate::state::{EmergencyAnnotation, ProposalType, VoteOption};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GovMsg {
    SubmitProposal {
        proposer: Address,
        proposal_type: ProposalType,
        title: String,
        description: String,
        initial_deposit: u64,
        company_id: Option<u64>,
        validator: Option<Address>,
        emergency: Option<EmergencyAnnotation>,
        metadata: BTreeMap<String, String>,
    },
    Vote {
        voter: Address,
        proposal_id: u64,
        option: VoteOption,
    },
    VoteWeighted {
        voter: Address,
        proposal_id: u64,
        weights: Vec<(VoteOption, u64)>,
    },
    Deposit {
        depositor: Address,
        proposal_id: u64,
        amount: u64,
    },
    CancelProposal {
        caller: Address,
        proposal_id: u64,
    },
    Delegate {
        delegator: Address,
        delegate: Address,
        company_scope: Option<u64>,
        type_scope: Option<u8>,
        share_bps: u64,
        expiry_height: u64,
        revocable: bool,
    },
    RevokeDelegation {
        delegator: Address,
        delegate: Address,
    },
    UpdateParams {
        authority: Address,
        params: Box<GovernanceParams>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovMsgResponse {
    ProposalSubmitted { proposal_id: u64 },
    Voted,
    Deposited,
    ProposalCanceled,
    Delegated,
    DelegationRevoked,
    ParamsUpdated,
}

/// Dispatches one `GovMsg` against `engine`. `now_height` is only consulted
/// by the vote/weighted-vote paths (delegation resolution is block-height
/// scoped, spec §4.6); `on_update_params` commits a validated new
/// `GovernanceParams` to the Parameter Registry, owned by `covenant-runtime`
/// outside this engine's borrowed-context lifetime.
#[allow(clippy::too_many_arguments)]
pub fn dispatch(
    engine: &mut GovernanceEngine<'_>,
    msg: GovMsg,
    now: u64,
    now_height: u64,
    on_update_params: impl FnOnce(GovernanceParams),
) -> Result<GovMsgResponse, CoreError> {
    match msg {
        GovMsg::SubmitProposal {
            proposer,
            proposal_type,
            title,
            description,
            initial_deposit,
            company_id,
            validator,
            emergency,
            metadata,
        } => {
            let id = engine.submit_proposal(
                proposer,
                proposal_type,
                title,
                description,
                initial_deposit,
                company_id,
                validator,
                emergency,
                metadata,
                now,
            )?;
            Ok(GovMsgResponse::ProposalSubmitted { proposal_id: id })
        }
        GovMsg::Vote { voter, proposal_id, option } => {
            engine.cast_vote(voter, proposal_id, option, now, now_height)?;
            Ok(GovMsgResponse::Voted)
        }
        GovMsg::VoteWeighted { voter, proposal_id, weights } => {
            engine.cast_weighted_vote(voter, proposal_id, weights, now, now_height)?;
            Ok(GovMsgResponse::Voted)
        }
        GovMsg::Deposit { depositor, proposal_id, amount } => {
            engine.deposit(proposal_id, depositor, amount, now)?;
            Ok(GovMsgResponse::Deposited)
        }
        GovMsg::CancelProposal { caller, proposal_id } => {
            engine.cancel_proposal(caller, proposal_id)?;
            Ok(GovMsgResponse::ProposalCanceled)
        }
        GovMsg::Delegate { delegator, delegate, company_scope, type_scope, share_bps, expiry_height, revocable } => {
            engine.delegate(&delegator, &delegate, company_scope, type_scope, share_bps, expiry_height, revocable, now, now_height)?;
            Ok(GovMsgResponse::Delegated)
        }
        GovMsg::RevokeDelegation { delegator, delegate } => {
            engine.revoke_delegation(&delegator, &delegate)?;
            Ok(GovMsgResponse::DelegationRevoked)
        }
        GovMsg::UpdateParams { authority, params } => {
            if authority != engine.gov_params.authority {
                return Err(CoreError::Unauthorized);
            }
            params.validate()?;
            on_update_params(*params);
            Ok(GovMsgResponse::ParamsUpdated)
        }
    }
}

#[cfg(test)]
mod tests {
    use covenant_bank::MemBank;
    use covenant_events::MemEventBus;
    use covenant_params::StakingParams;
    use covenant_store::MemKvStore;

    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn submit_proposal_dispatch_returns_id() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 10_000);
        let mut events = MemEventBus::new();
        let gparams = GovernanceParams::defaults(addr(9));
        let sparams = StakingParams::defaults_for_chain("covenant-testnet");
        let mut engine = GovernanceEngine::new(&mut store, &mut bank, &mut events, &gparams, &sparams);

        let resp = dispatch(
            &mut engine,
            GovMsg::SubmitProposal {
                proposer: addr(1),
                proposal_type: ProposalType::Generic,
                title: "t".into(),
                description: "d".into(),
                initial_deposit: 1,
                company_id: None,
                validator: None,
                emergency: None,
                metadata: Default::default(),
            },
            0,
            0,
            |_| panic!("must not commit"),
        )
        .unwrap();
        assert!(matches!(resp, GovMsgResponse::ProposalSubmitted { proposal_id: 0 }));
    }

    #[test]
    fn update_params_rejects_wrong_authority() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        let mut events = MemEventBus::new();
        let gparams = GovernanceParams::defaults(addr(9));
        let sparams = StakingParams::defaults_for_chain("covenant-testnet");
        let mut engine = GovernanceEngine::new(&mut store, &mut bank, &mut events, &gparams, &sparams);

        let err = dispatch(
            &mut engine,
            GovMsg::UpdateParams { authority: addr(1), params: Box::new(gparams.clone()) },
            0,
            0,
            |_| panic!("must not commit"),
        )
        .unwrap_err();
        assert_eq!(err, CoreError::Unauthorized);
    }
}
