//! `GovernanceEngine`: the borrowed-context handle every Proposal Store /
//! Voting & Tally / Governance Lifecycle operation runs through. Mirrors
//! `covenant_staking::StakeEngine`'s borrowed-context shape, itself grounded
//! on the teacher's `invoke_context: &InvokeContext` parameter idiom.

use covenant_bank::Bank;
use covenant_events::EventBus;
use covenant_params::{GovernanceParams, StakingParams};
use covenant_store::KvStore;

pub struct GovernanceEngine<'a> {
    pub store: &'a mut dyn KvStore,
    pub bank: &'a mut dyn Bank,
    pub events: &'a mut dyn EventBus,
    pub gov_params: &'a GovernanceParams,
    /// Read only: voting power and proposer eligibility derive from bonded
    /// stake and tier (spec §1), so the governance engine needs the active
    /// staking parameter set to weigh stake the same way the Reward/Epoch
    /// Engine does, but never mutates staking state directly.
    pub staking_params: &'a StakingParams,
}

impl<'a> GovernanceEngine<'a> {
    pub fn new(
        store: &'a mut dyn KvStore,
        bank: &'a mut dyn Bank,
        events: &'a mut dyn EventBus,
        gov_params: &'a GovernanceParams,
        staking_params: &'a StakingParams,
    ) -> Self {
        Self { store, bank, events, gov_params, staking_params }
    }
}
