//! Unbonding Queue (component C6, spec §4.3).
//!
//! Completion is time-indexed: `(completion_time, owner)` queue keys are
//! swept once per block by `covenant_runtime::run_end_of_block`, in
//! ascending key order, so entries due the same block complete in
//! owner-address lexicographic order (spec §4.3's documented tie-break).

use covenant_bank::Pool;
use covenant_events::Event;
use covenant_params::Tier;
use covenant_store::keys;
use covenant_types::{Address, CoreError};

use crate::engine::StakeEngine;
use crate::ledger::{get_tier_count, get_user_stake, put_tier_count, put_user_stake};
use crate::state::{InheritanceUnbonding, UnbondingRequest};

pub(crate) fn get_request(store: &dyn covenant_store::KvStore, owner: &Address) -> Option<UnbondingRequest> {
    store
        .get(&keys::unbonding_request(owner))
        .map(|bytes| covenant_store::decode(&bytes).expect("corrupt UnbondingRequest record"))
}

pub(crate) fn get_inheritance(store: &dyn covenant_store::KvStore, owner: &Address) -> Option<InheritanceUnbonding> {
    store
        .get(&keys::inheritance_unbonding(owner))
        .map(|bytes| covenant_store::decode(&bytes).expect("corrupt InheritanceUnbonding record"))
}

impl<'a> StakeEngine<'a> {
    pub(crate) fn enqueue_unbonding(&mut self, owner: &Address, amount: u64, now: u64) {
        let completion_time = now + self.params.unbonding_period_seconds();
        let request = UnbondingRequest { owner: *owner, amount, request_time: now, completion_time, completed: false };
        self.store.set(&keys::unbonding_request(owner), covenant_store::encode(&request));
        self.store.set(&keys::unbonding_queue_entry(completion_time, owner), covenant_store::encode(&request));
        self.events.emit(Event::UnbondingStarted { owner: *owner, amount, completion_time });
    }

    pub(crate) fn enqueue_inheritance_unbonding(&mut self, owner: &Address, recipient: &Address, amount: u64, now: u64) {
        let completion_time = now + self.params.unbonding_period_seconds();
        let request = InheritanceUnbonding {
            owner: *owner,
            recipient: *recipient,
            amount,
            request_time: now,
            completion_time,
            completed: false,
        };
        self.store.set(&keys::inheritance_unbonding(owner), covenant_store::encode(&request));
        self.store.set(&keys::inheritance_queue_entry(completion_time, owner), covenant_store::encode(&request));
        self.events.emit(Event::UnbondingStarted { owner: *owner, amount, completion_time });
    }

    /// Governance-only cancel (spec §9 Open Question 1, resolved in
    /// DESIGN.md): not reachable from a user-signed message. Restores
    /// `bonded_amount`, recomputes `tier`, and adjusts `TierCount` exactly,
    /// rather than leaving the staking-pool invariant balance short the way
    /// a bare delete of the pending request would.
    pub fn cancel_unbonding(&mut self, owner: &Address, now: u64) -> Result<(), CoreError> {
        let request = get_request(self.store, owner).ok_or(CoreError::NoUnbondingInProgress)?;
        self.store.remove(&keys::unbonding_request(owner));
        self.store.remove(&keys::unbonding_queue_entry(request.completion_time, owner));

        let mut stake = get_user_stake(self.store, owner).unwrap_or_else(|| crate::state::UserStake::new(*owner, now));
        let old_tier = stake.tier;
        stake.bonded_amount = stake.bonded_amount.saturating_add(request.amount);
        stake.tier = self.params.tier_thresholds.tier_for_amount(stake.bonded_amount);
        if stake.tier < Tier::Validator {
            stake.is_validator = false;
        }

        if old_tier != stake.tier {
            let mut counts = get_tier_count(self.store);
            counts.decrement(old_tier);
            counts.increment(stake.tier);
            put_tier_count(self.store, &counts);
        }
        put_user_stake(self.store, &stake);

        self.events.emit(Event::UnbondingCancelled { owner: *owner, amount: request.amount });
        log::info!("unbonding cancelled (governance path): {owner:?} amount {}", request.amount);
        Ok(())
    }

    /// Processes one due `UnbondingRequest`: transfers `amount` from the
    /// staking pool to `owner` and deletes the request and its queue entry.
    fn complete_unbonding(&mut self, request: &UnbondingRequest) -> Result<(), CoreError> {
        self.bank.transfer_from_pool(Pool::Staking, &request.owner, request.amount)?;
        self.store.remove(&keys::unbonding_request(&request.owner));
        self.store.remove(&keys::unbonding_queue_entry(request.completion_time, &request.owner));
        self.events.emit(Event::UnbondingCompleted { owner: request.owner, amount: request.amount });
        Ok(())
    }

    /// Processes one due `InheritanceUnbonding`: transfers `amount` from the
    /// staking pool to `recipient` and deletes the record and its queue
    /// entry.
    fn complete_inheritance_unbonding(&mut self, request: &InheritanceUnbonding) -> Result<(), CoreError> {
        self.bank.transfer_from_pool(Pool::Staking, &request.recipient, request.amount)?;
        self.store.remove(&keys::inheritance_unbonding(&request.owner));
        self.store.remove(&keys::inheritance_queue_entry(request.completion_time, &request.owner));
        self.events.emit(Event::InheritanceUnbondingCompleted {
            owner: request.owner,
            recipient: request.recipient,
            amount: request.amount,
        });
        Ok(())
    }

    /// End-of-block sweep (spec §4.3): completes every `UnbondingRequest` and
    /// `InheritanceUnbonding` whose `completion_time <= now`. Entries are
    /// visited in ascending queue-key order, i.e. by completion time then by
    /// owner address lexicographically, the spec's documented tie-break.
    /// Returns the number of entries processed, for sweep-progress logging.
    pub fn sweep_unbonding_queue(&mut self, now: u64) -> u32 {
        let (lower, upper) = keys::time_queue_bound(covenant_store::prefix::UNBONDING_QUEUE, now);
        let due: Vec<UnbondingRequest> = self
            .store
            .range_iterate(&lower, &upper)
            .into_iter()
            .map(|(_, v)| covenant_store::decode(&v).expect("corrupt UnbondingRequest queue entry"))
            .collect();
        let mut processed = 0u32;
        for request in due {
            match self.complete_unbonding(&request) {
                Ok(()) => processed += 1,
                Err(e) => log::error!("unbonding completion failed for {:?}: {e}", request.owner),
            }
        }

        let (lower, upper) = keys::time_queue_bound(covenant_store::prefix::INHERITANCE_QUEUE, now);
        let due: Vec<InheritanceUnbonding> = self
            .store
            .range_iterate(&lower, &upper)
            .into_iter()
            .map(|(_, v)| covenant_store::decode(&v).expect("corrupt InheritanceUnbonding queue entry"))
            .collect();
        for request in due {
            match self.complete_inheritance_unbonding(&request) {
                Ok(()) => processed += 1,
                Err(e) => log::error!("inheritance unbonding completion failed for {:?}: {e}", request.owner),
            }
        }

        log::info!("unbonding sweep at t={now}: {processed} entries completed");
        processed
    }
}

#[cfg(test)]
mod tests {
    use covenant_bank::{Bank, MemBank};
    use covenant_events::MemEventBus;
    use covenant_params::StakingParams;
    use covenant_store::MemKvStore;

    use super::*;
    use crate::hooks::HookRegistry;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    fn harness() -> (MemKvStore, MemBank, MemEventBus, StakingParams, HookRegistry) {
        (
            MemKvStore::new(),
            MemBank::new(),
            MemEventBus::new(),
            StakingParams::defaults_for_chain("covenant-testnet"),
            HookRegistry::new(),
        )
    }

    #[test]
    fn unbonding_completes_after_period_elapses() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 1_000);
        let period = params.unbonding_period_seconds();
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 500, 0).unwrap();
        engine.unbond(&addr(1), 500, 0).unwrap();

        let processed = engine.sweep_unbonding_queue(period - 1);
        assert_eq!(processed, 0);
        let processed = engine.sweep_unbonding_queue(period);
        assert_eq!(processed, 1);
        assert_eq!(bank.balance(&addr(1)), 1_000);
    }

    #[test]
    fn cancel_unbonding_restores_bonded_amount_and_tier() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 1_000);
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 100, 0).unwrap();
        engine.unbond(&addr(1), 100, 0).unwrap();
        assert!(get_user_stake(&store, &addr(1)).is_none());

        engine.cancel_unbonding(&addr(1), 5).unwrap();
        let stake = get_user_stake(&store, &addr(1)).unwrap();
        assert_eq!(stake.bonded_amount, 100);
        assert_eq!(stake.tier, Tier::Keeper);
        assert_eq!(get_tier_count(&store).get(Tier::Keeper), 1);
    }

    #[test]
    fn inheritance_unbonding_pays_recipient_not_owner() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 500);
        let period = params.unbonding_period_seconds();
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 500, 0).unwrap();
        engine.unbond_for_inheritance(&addr(1), &addr(2), 500, 0).unwrap();
        assert!(get_user_stake(&store, &addr(1)).is_none());

        engine.sweep_unbonding_queue(period);
        assert_eq!(bank.balance(&addr(1)), 0);
        assert_eq!(bank.balance(&addr(2)), 500);
    }
}
