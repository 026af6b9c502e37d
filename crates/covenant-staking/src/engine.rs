//! `StakeEngine`: the borrowed-context handle every Stake Ledger / Lock &
//! Commitment Ledger / Unbonding Queue / Reputation / Reward operation runs
//! through. Mirrors the teacher's `invoke_context: &InvokeContext` parameter
//! idiom — one short-lived struct threading the store, bank, event bus,
//! parameters and hook registry through a single message handler.

use covenant_bank::Bank;
use covenant_events::EventBus;
use covenant_params::StakingParams;
use covenant_store::KvStore;

use crate::hooks::HookRegistry;

pub struct StakeEngine<'a> {
    pub store: &'a mut dyn KvStore,
    pub bank: &'a mut dyn Bank,
    pub events: &'a mut dyn EventBus,
    pub params: &'a StakingParams,
    pub hooks: &'a mut HookRegistry,
}

impl<'a> StakeEngine<'a> {
    pub fn new(
        store: &'a mut dyn KvStore,
        bank: &'a mut dyn Bank,
        events: &'a mut dyn EventBus,
        params: &'a StakingParams,
        hooks: &'a mut HookRegistry,
    ) -> Self {
        Self { store, bank, events, params, hooks }
    }
}
