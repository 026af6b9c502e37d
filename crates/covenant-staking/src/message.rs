//! Stake message taxonomy and dispatch (spec §6.1).
//!
//! Only the four user-signed message kinds here cross the host boundary as
//! a value-typed contract; locks, commitments, reputation updates, slashing,
//! and the inheritance redirect are driven directly by collaborating modules
//! calling the engine, not by an end-user-signed `StakeMsg`.

use serde::{Deserialize, Serialize};

use covenant_params::StakingParams;
use covenant_types::{Address, CoreError};

use crate::engine::StakeEngine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeMsg {
    Stake { staker: Address, amount: u64 },
    Unstake { staker: Address, amount: u64 },
    ClaimRewards { staker: Address },
    UpdateParams { authority: Address, params: Box<StakingParams> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakeMsgResponse {
    Staked { new_tier: i8, total_staked: u64 },
    Unstaked { new_tier: i8, remaining_staked: u64 },
    Claimed { amount: u64 },
    ParamsUpdated,
}

/// Dispatches one `StakeMsg` against `engine`. `governance_authority` is the
/// address configured as the only legal `UpdateParams` sender (spec §4.8);
/// `on_update_params` commits the validated new parameter set to the
/// Parameter Registry (owned by `covenant-runtime`, outside this engine's
/// borrowed-context lifetime).
pub fn dispatch(
    engine: &mut StakeEngine<'_>,
    governance_authority: &Address,
    msg: StakeMsg,
    now: u64,
    on_update_params: impl FnOnce(StakingParams),
) -> Result<StakeMsgResponse, CoreError> {
    match msg {
        StakeMsg::Stake { staker, amount } => {
            let (tier, total) = engine.bond(&staker, amount, now)?;
            Ok(StakeMsgResponse::Staked { new_tier: tier.as_i8(), total_staked: total })
        }
        StakeMsg::Unstake { staker, amount } => {
            let (tier, remaining) = engine.unbond(&staker, amount, now)?;
            Ok(StakeMsgResponse::Unstaked { new_tier: tier.as_i8(), remaining_staked: remaining })
        }
        StakeMsg::ClaimRewards { staker } => {
            let amount = engine.claim_rewards(&staker, now)?;
            Ok(StakeMsgResponse::Claimed { amount })
        }
        StakeMsg::UpdateParams { authority, params } => {
            if authority != *governance_authority {
                return Err(CoreError::Unauthorized);
            }
            params.validate()?;
            on_update_params(*params);
            Ok(StakeMsgResponse::ParamsUpdated)
        }
    }
}

#[cfg(test)]
mod tests {
    use covenant_bank::{Bank, MemBank};
    use covenant_events::MemEventBus;
    use covenant_store::MemKvStore;

    use super::*;
    use crate::hooks::HookRegistry;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn stake_dispatch_bonds_and_responds() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 1_000);
        let mut events = MemEventBus::new();
        let params = StakingParams::defaults_for_chain("covenant-testnet");
        let mut hooks = HookRegistry::new();
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);

        let resp = dispatch(
            &mut engine,
            &addr(9),
            StakeMsg::Stake { staker: addr(1), amount: 10 },
            0,
            |_| {},
        )
        .unwrap();
        assert!(matches!(resp, StakeMsgResponse::Staked { total_staked: 10, .. }));
    }

    #[test]
    fn update_params_rejects_wrong_authority() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        let mut events = MemEventBus::new();
        let params = StakingParams::defaults_for_chain("covenant-testnet");
        let mut hooks = HookRegistry::new();
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);

        let err = dispatch(
            &mut engine,
            &addr(9),
            StakeMsg::UpdateParams { authority: addr(1), params: Box::new(params.clone()) },
            0,
            |_| panic!("must not commit"),
        )
        .unwrap_err();
        assert_eq!(err, CoreError::Unauthorized);
    }
}
