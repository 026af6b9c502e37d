//! Stake Ledger (component C4, spec §4.1): `Bond`, `Unbond`, and tier
//! derivation. Grounded on the teacher's `process_initialize_passive_stake`
//! / `process_unlock` handlers (`passive-stake/src/processor.rs`), adapted
//! from a fixed-size Solana account to a `KvStore` record and generalized
//! from lock-duration tiers to bonded-amount tiers.

use covenant_bank::Pool;
use covenant_events::Event;
use covenant_params::Tier;
use covenant_store::keys;
use covenant_types::{Address, CoreError};

use crate::engine::StakeEngine;
use crate::locks::total_committed;
use crate::state::{TierCount, UserStake};

pub(crate) fn get_user_stake(store: &dyn covenant_store::KvStore, owner: &Address) -> Option<UserStake> {
    store
        .get(&keys::user_stake(owner))
        .map(|bytes| covenant_store::decode(&bytes).expect("corrupt UserStake record"))
}

pub(crate) fn put_user_stake(store: &mut dyn covenant_store::KvStore, stake: &UserStake) {
    store.set(&keys::user_stake(&stake.owner), covenant_store::encode(stake));
}

pub(crate) fn delete_user_stake(store: &mut dyn covenant_store::KvStore, owner: &Address) {
    store.remove(&keys::user_stake(owner));
}

pub(crate) fn get_tier_count(store: &dyn covenant_store::KvStore) -> TierCount {
    store
        .get(&keys::tier_count())
        .map(|bytes| covenant_store::decode(&bytes).expect("corrupt TierCount record"))
        .unwrap_or_default()
}

pub(crate) fn put_tier_count(store: &mut dyn covenant_store::KvStore, counts: &TierCount) {
    store.set(&keys::tier_count(), covenant_store::encode(counts));
}

/// Recomputes `stake.tier` from `bonded_amount`, adjusting `is_validator`
/// down if it no longer satisfies the §3.1 invariant
/// `is_validator ⇒ tier ≥ Validator`. Returns the prior tier.
fn recompute_tier(stake: &mut UserStake, thresholds: &covenant_params::TierThresholds) -> Tier {
    let old_tier = stake.tier;
    stake.tier = thresholds.tier_for_amount(stake.bonded_amount);
    if stake.tier < Tier::Validator {
        stake.is_validator = false;
    }
    old_tier
}

impl<'a> StakeEngine<'a> {
    /// `Bond(owner, amount)` (spec §4.1, message `Stake`).
    pub fn bond(&mut self, owner: &Address, amount: u64, now: u64) -> Result<(Tier, u64), CoreError> {
        if amount == 0 {
            return Err(CoreError::InvalidAmount);
        }
        if amount < self.params.min_stake_amount {
            log::warn!("bond rejected for {owner:?}: {amount} below min_stake_amount {}", self.params.min_stake_amount);
            return Err(CoreError::BelowMinimumStake);
        }

        self.bank.transfer_to_pool(owner, Pool::Staking, amount)?;

        let mut stake = get_user_stake(self.store, owner).unwrap_or_else(|| UserStake::new(*owner, now));
        stake.bonded_amount = stake
            .bonded_amount
            .checked_add(amount)
            .ok_or(CoreError::ArithmeticOverflow)?;

        let mut counts = get_tier_count(self.store);
        let old_tier = recompute_tier(&mut stake, &self.params.tier_thresholds);
        if old_tier != stake.tier {
            counts.decrement(old_tier);
            counts.increment(stake.tier);
            put_tier_count(self.store, &counts);
        }

        let new_total = stake.bonded_amount;
        let new_tier = stake.tier;
        put_user_stake(self.store, &stake);

        self.events.emit(Event::Stake { owner: *owner, amount, new_total });
        if old_tier != new_tier {
            self.events.emit(Event::TierChange { owner: *owner, old_tier: old_tier.as_i8(), new_tier: new_tier.as_i8() });
        }
        self.hooks.fire_after_stake(owner, amount, new_total);
        if old_tier != new_tier {
            self.hooks.fire_after_tier_change(owner, old_tier, new_tier);
        }

        log::info!("bond: {owner:?} +{amount} -> total {new_total}, tier {new_tier:?}");
        Ok((new_tier, new_total))
    }

    /// Governance-driven validator promotion/demotion (spec §4.8,
    /// `ValidatorTierChange` proposal execution). Unlike [`StakeEngine::bond`]
    /// the tier is set directly rather than derived from `bonded_amount` —
    /// governance is overriding the ladder for this owner, not adding stake —
    /// so `TierCount` is adjusted the same way but `is_validator` is only
    /// raised, never lowered, by this path; demotion out of the validator set
    /// happens through the normal bonded-amount recompute in `bond`/`unbond`.
    pub fn set_validator_tier(&mut self, owner: &Address, new_tier: Tier, now: u64) -> Result<(), CoreError> {
        let mut stake = get_user_stake(self.store, owner).unwrap_or_else(|| UserStake::new(*owner, now));
        let old_tier = stake.tier;
        if old_tier == new_tier {
            return Ok(());
        }

        let mut counts = get_tier_count(self.store);
        counts.decrement(old_tier);
        counts.increment(new_tier);
        put_tier_count(self.store, &counts);

        stake.tier = new_tier;
        if new_tier >= Tier::Validator {
            stake.is_validator = true;
        }
        put_user_stake(self.store, &stake);

        self.events.emit(Event::TierChange { owner: *owner, old_tier: old_tier.as_i8(), new_tier: new_tier.as_i8() });
        self.hooks.fire_after_tier_change(owner, old_tier, new_tier);
        log::info!("validator tier override: {owner:?} {old_tier:?} -> {new_tier:?}");
        Ok(())
    }

    /// Preconditions shared by `Unbond` and the inheritance redirect
    /// (spec §4.1 steps 1, 3, 4 — step 2, the lock check, is caller-gated so
    /// the inheritance path can bypass it per spec §4.1).
    fn validate_unbond_amount(&mut self, owner: &Address, amount: u64) -> Result<UserStake, CoreError> {
        if amount == 0 {
            return Err(CoreError::InvalidAmount);
        }
        let stake = get_user_stake(self.store, owner).ok_or(CoreError::StakeNotFound(*owner))?;
        if stake.bonded_amount < amount {
            return Err(CoreError::InvalidAmount);
        }
        let committed = total_committed(self.store, owner);
        if stake.bonded_amount.saturating_sub(amount) < committed {
            log::warn!(
                "unbond rejected for {owner:?}: bonded {} - amount {amount} would fall below total_committed {committed}",
                stake.bonded_amount
            );
            return Err(CoreError::ExceedsTrustCeiling);
        }
        Ok(stake)
    }

    /// Debits `amount` from `stake`, recomputes tier/TierCount, and writes
    /// (or deletes) the `UserStake` record. Shared by `Unbond` and the
    /// inheritance redirect; does not touch the unbonding queue or bank.
    fn debit_bonded(&mut self, mut stake: UserStake, amount: u64) -> (Tier, Tier, u64) {
        stake.bonded_amount -= amount;
        let mut counts = get_tier_count(self.store);
        let old_tier = recompute_tier(&mut stake, &self.params.tier_thresholds);
        let new_tier = stake.tier;
        if old_tier != new_tier {
            counts.decrement(old_tier);
            counts.increment(new_tier);
            put_tier_count(self.store, &counts);
        }

        let owner = stake.owner;
        let remaining = stake.bonded_amount;
        if remaining == 0 {
            delete_user_stake(self.store, &owner);
        } else {
            put_user_stake(self.store, &stake);
        }
        (old_tier, new_tier, remaining)
    }

    /// `Unstake(staker, amount)` (spec §4.1).
    pub fn unbond(&mut self, owner: &Address, amount: u64, now: u64) -> Result<(Tier, u64), CoreError> {
        self.clean_expired_locks(owner, now);
        self.can_unstake(owner)?;
        if self.store.get(&keys::unbonding_request(owner)).is_some() {
            return Err(CoreError::UnbondingInProgress);
        }

        let stake = self.validate_unbond_amount(owner, amount)?;
        let (old_tier, new_tier, remaining) = self.debit_bonded(stake, amount);

        self.enqueue_unbonding(owner, amount, now);

        self.events.emit(Event::Unstake { owner: *owner, amount, remaining });
        if old_tier != new_tier {
            self.events.emit(Event::TierChange { owner: *owner, old_tier: old_tier.as_i8(), new_tier: new_tier.as_i8() });
        }
        self.hooks.fire_after_unstake(owner, amount, remaining);
        if old_tier != new_tier {
            self.hooks.fire_after_tier_change(owner, old_tier, new_tier);
        }

        log::info!("unbond: {owner:?} -{amount} -> remaining {remaining}, tier {new_tier:?}");
        Ok((new_tier, remaining))
    }

    /// Inheritance unbond (component C14, spec §4.1): identical to
    /// [`StakeEngine::unbond`] but bypasses the lock check and redirects the
    /// completion payout to `recipient`.
    pub fn unbond_for_inheritance(
        &mut self,
        owner: &Address,
        recipient: &Address,
        amount: u64,
        now: u64,
    ) -> Result<(Tier, u64), CoreError> {
        if self.store.get(&keys::inheritance_unbonding(owner)).is_some() {
            return Err(CoreError::UnbondingInProgress);
        }

        let stake = self.validate_unbond_amount(owner, amount)?;
        let (old_tier, new_tier, remaining) = self.debit_bonded(stake, amount);

        self.enqueue_inheritance_unbonding(owner, recipient, amount, now);

        self.events.emit(Event::Unstake { owner: *owner, amount, remaining });
        if old_tier != new_tier {
            self.events.emit(Event::TierChange { owner: *owner, old_tier: old_tier.as_i8(), new_tier: new_tier.as_i8() });
        }
        self.hooks.fire_after_unstake(owner, amount, remaining);
        if old_tier != new_tier {
            self.hooks.fire_after_tier_change(owner, old_tier, new_tier);
        }

        log::info!("inheritance unbond: {owner:?} -{amount} -> {recipient:?}, remaining {remaining}");
        Ok((new_tier, remaining))
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
    fn bond_promotes_tier_and_emits_event() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 1_000);
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);

        let (tier, total) = engine.bond(&addr(1), 10, 0).unwrap();
        assert_eq!(tier, Tier::Keeper);
        assert_eq!(total, 10);

        let count = get_tier_count(&store);
        assert_eq!(count.get(Tier::Keeper), 1);
        assert!(matches!(events.events()[0], Event::Stake { .. }));
        assert!(matches!(events.events()[1], Event::TierChange { old_tier: -1, new_tier: 1, .. }));
    }

    #[test]
    fn bond_below_minimum_is_rejected() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 1_000);
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        let err = engine.bond(&addr(1), 0, 0).unwrap_err();
        assert_eq!(err, CoreError::InvalidAmount);
    }

    #[test]
    fn bond_then_unbond_round_trips_to_pending_request() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 1_000);
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 100, 0).unwrap();
        let (tier, remaining) = engine.unbond(&addr(1), 100, 10).unwrap();
        assert_eq!(tier, Tier::None);
        assert_eq!(remaining, 0);

        assert!(get_user_stake(&store, &addr(1)).is_none());
        assert!(store.get(&keys::unbonding_request(&addr(1))).is_some());
        assert_eq!(get_tier_count(&store).total(), 0);
    }

    #[test]
    fn unbond_without_stake_fails() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        let err = engine.unbond(&addr(9), 1, 0).unwrap_err();
        assert_eq!(err, CoreError::StakeNotFound(addr(9)));
    }

    #[test]
    fn double_unbond_rejected_while_pending() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 1_000);
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 100, 0).unwrap();
        engine.unbond(&addr(1), 10, 0).unwrap();
        let err = engine.unbond(&addr(1), 10, 0).unwrap_err();
        assert_eq!(err, CoreError::UnbondingInProgress);
    }

    // Property tests for the spec §8 universal invariants this module owns:
    // tier always matches the threshold-derived tier, and TierCount stays
    // the true per-tier population count, across arbitrary bond sequences
    // for many owners. Grounded in the teacher's `tests/invariants` proptest
    // harness (`staking_invariants.rs`), adapted to the bonded-amount ladder.
    mod props {
        use proptest::prelude::*;

        use super::*;

        fn owner_pool() -> Vec<Address> {
            (1u8..=8).map(addr).collect()
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn tier_and_tier_count_stay_consistent_after_bond_sequence(
                amounts in prop::collection::vec(1u64..200_000u64, 1..30),
                owner_picks in prop::collection::vec(0usize..8, 1..30),
            ) {
                let (mut store, mut bank, mut events, params, mut hooks) = harness();
                let owners = owner_pool();
                for o in &owners {
                    bank.credit(o, 10_000_000);
                }
                let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);

                let n = amounts.len().min(owner_picks.len());
                for i in 0..n {
                    let owner = owners[owner_picks[i] % owners.len()];
                    let amount = amounts[i].max(params.min_stake_amount);
                    let _ = engine.bond(&owner, amount, 0);
                }

                for o in &owners {
                    if let Some(stake) = get_user_stake(&store, o) {
                        prop_assert_eq!(stake.tier, params.tier_thresholds.tier_for_amount(stake.bonded_amount));
                        prop_assert!(stake.bonded_amount > 0);
                    }
                }

                let counts = get_tier_count(&store);
                let mut expected = TierCount::default();
                let mut live = 0u64;
                for o in &owners {
                    if let Some(stake) = get_user_stake(&store, o) {
                        expected.increment(stake.tier);
                        live += 1;
                    }
                }
                prop_assert_eq!(counts, expected);
                prop_assert_eq!(counts.total(), live);
            }

            #[test]
            fn bond_then_full_unbond_always_deletes_record_and_zeroes_tier_count(
                amount in 1u64..1_000_000u64,
            ) {
                let (mut store, mut bank, mut events, params, mut hooks) = harness();
                let amount = amount.max(params.min_stake_amount);
                bank.credit(&addr(1), amount);
                let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
                engine.bond(&addr(1), amount, 0).unwrap();
                let (tier, remaining) = engine.unbond(&addr(1), amount, 0).unwrap();

                prop_assert_eq!(tier, Tier::None);
                prop_assert_eq!(remaining, 0);
                prop_assert!(get_user_stake(&store, &addr(1)).is_none());
                prop_assert_eq!(get_tier_count(&store).total(), 0);
            }
        }
    }
}
