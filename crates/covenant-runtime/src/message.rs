//! Top-level message envelope (spec §6.1): wraps `covenant_staking::StakeMsg`
//! and `covenant_governance::GovMsg` behind one entry point, owning the
//! Parameter Registry both engines' `UpdateParams` variants write into.
//!
//! Grounded on the teacher's top-level `process_instruction` dispatcher
//! (`runtime/src/lib.rs`), which matches a wire-format discriminant onto one
//! of several program modules' own instruction enums the same way `Message`
//! matches onto `StakeMsg`/`GovMsg` here.

use serde::{Deserialize, Serialize};

use covenant_bank::Bank;
use covenant_events::EventBus;
use covenant_governance::{self, GovMsg, GovMsgResponse, GovernanceEngine};
use covenant_params::{GovernanceParams, StakingParams};
use covenant_staking::{self, HookRegistry, StakeEngine, StakeMsg, StakeMsgResponse};
use covenant_store::KvStore;
use covenant_types::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Stake(StakeMsg),
    Governance(GovMsg),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageResponse {
    Stake(StakeMsgResponse),
    Governance(GovMsgResponse),
}

/// Registry of the two live parameter sets, mutated only by a successful
/// `UpdateParams` dispatch or a `ParameterChange` proposal execution
/// (spec §4.8). Plain fields, not a `KvStore` record: both parameter sets
/// are small, read on every message, and natural to keep resident for the
/// lifetime of the host process, the way the teacher keeps its `Bank`
/// feature set resident rather than re-reading it from an account each
/// instruction.
pub struct ParamRegistry {
    pub staking: StakingParams,
    pub governance: GovernanceParams,
}

impl ParamRegistry {
    pub fn new(staking: StakingParams, governance: GovernanceParams) -> Self {
        Self { staking, governance }
    }
}

/// Dispatches one `Message` against the live state. `now` is wall-clock
/// seconds (spec §5); `now_height` is the current block height, consulted
/// only by the governance vote/delegation paths.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_message(
    store: &mut dyn KvStore,
    bank: &mut dyn Bank,
    events: &mut dyn EventBus,
    hooks: &mut HookRegistry,
    params: &mut ParamRegistry,
    msg: Message,
    now: u64,
    now_height: u64,
) -> Result<MessageResponse, CoreError> {
    match msg {
        Message::Stake(msg) => {
            let mut new_params = None;
            let resp = {
                let mut engine = StakeEngine::new(store, bank, events, &params.staking, hooks);
                covenant_staking::dispatch(&mut engine, &params.governance.authority, msg, now, |p| new_params = Some(p))?
            };
            if let Some(p) = new_params {
                params.staking = p;
            }
            Ok(MessageResponse::Stake(resp))
        }
        Message::Governance(msg) => {
            let mut new_params = None;
            let resp = {
                let mut engine = GovernanceEngine::new(store, bank, events, &params.governance, &params.staking);
                covenant_governance::dispatch(&mut engine, msg, now, now_height, |p| new_params = Some(p))?
            };
            if let Some(p) = new_params {
                params.governance = p;
            }
            Ok(MessageResponse::Governance(resp))
        }
    }
}

#[cfg(test)]
mod tests {
    use covenant_bank::MemBank;
    use covenant_events::MemEventBus;
    use covenant_governance::ProposalType;
    use covenant_store::MemKvStore;
    use covenant_types::Address;

    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn stake_message_routes_to_staking_engine() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 1_000);
        let mut events = MemEventBus::new();
        let mut hooks = HookRegistry::new();
        let mut params = ParamRegistry::new(
            StakingParams::defaults_for_chain("covenant-testnet"),
            GovernanceParams::defaults(addr(9)),
        );

        let resp = dispatch_message(
            &mut store,
            &mut bank,
            &mut events,
            &mut hooks,
            &mut params,
            Message::Stake(StakeMsg::Stake { staker: addr(1), amount: 500 }),
            0,
            0,
        )
        .unwrap();
        assert!(matches!(resp, MessageResponse::Stake(StakeMsgResponse::Staked { total_staked: 500, .. })));
    }

    #[test]
    fn governance_update_params_commits_into_registry() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        let mut events = MemEventBus::new();
        let mut hooks = HookRegistry::new();
        let mut params =
            ParamRegistry::new(StakingParams::defaults_for_chain("covenant-testnet"), GovernanceParams::defaults(addr(9)));

        let mut new_gparams = GovernanceParams::defaults(addr(9));
        new_gparams.quorum_bps = 4_000;
        dispatch_message(
            &mut store,
            &mut bank,
            &mut events,
            &mut hooks,
            &mut params,
            Message::Governance(GovMsg::UpdateParams { authority: addr(9), params: Box::new(new_gparams) }),
            0,
            0,
        )
        .unwrap();
        assert_eq!(params.governance.quorum_bps, 4_000);
    }

    #[test]
    fn governance_message_routes_to_governance_engine() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 100);
        let mut events = MemEventBus::new();
        let mut hooks = HookRegistry::new();
        let mut params =
            ParamRegistry::new(StakingParams::defaults_for_chain("covenant-testnet"), GovernanceParams::defaults(addr(9)));

        let resp = dispatch_message(
            &mut store,
            &mut bank,
            &mut events,
            &mut hooks,
            &mut params,
            Message::Governance(GovMsg::SubmitProposal {
                proposer: addr(1),
                proposal_type: ProposalType::Generic,
                title: "t".into(),
                description: "d".into(),
                initial_deposit: 1,
                company_id: None,
                validator: None,
                emergency: None,
                metadata: Default::default(),
            }),
            0,
            0,
        )
        .unwrap();
        assert!(matches!(resp, MessageResponse::Governance(GovMsgResponse::ProposalSubmitted { proposal_id: 0 })));
    }
}
