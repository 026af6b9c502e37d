//! Lock & Commitment Ledger (component C5, spec §4.2).
//!
//! Non-commitment locks (boolean obligations) and stake commitments (numeric
//! trust-ceiling reservations) are kept as separate record families per
//! spec §9 — conflating them would lose either the fast boolean check or the
//! per-amount ceiling.

use covenant_events::Event;
use covenant_store::keys;
use covenant_types::{Address, CoreError, LockKind};

use crate::engine::StakeEngine;
use crate::ledger::get_user_stake;
use crate::state::{lock_kind_tag, CommitmentKind, Lock, StakeCommitment, UserStakeCommitments};

fn get_lock(store: &dyn covenant_store::KvStore, owner: &Address, kind: LockKind, reference: &str) -> Option<Lock> {
    store
        .get(&keys::lock(owner, lock_kind_tag(kind), reference))
        .map(|bytes| covenant_store::decode(&bytes).expect("corrupt Lock record"))
}

fn all_locks(store: &dyn covenant_store::KvStore, owner: &Address) -> Vec<Lock> {
    store
        .prefix_iterate(&keys::lock_scan_prefix(owner))
        .into_iter()
        .map(|(_, v)| covenant_store::decode(&v).expect("corrupt Lock record"))
        .collect()
}

pub(crate) fn get_commitments(store: &dyn covenant_store::KvStore, owner: &Address) -> UserStakeCommitments {
    store
        .get(&keys::commitments(owner))
        .map(|bytes| covenant_store::decode(&bytes).expect("corrupt UserStakeCommitments record"))
        .unwrap_or_default()
}

pub(crate) fn total_committed(store: &dyn covenant_store::KvStore, owner: &Address) -> u64 {
    get_commitments(store, owner).total_committed
}

impl<'a> StakeEngine<'a> {
    /// `AddLock` (spec §4.2). Idempotent on `(kind, reference)`.
    pub fn add_lock(
        &mut self,
        owner: &Address,
        kind: LockKind,
        reference: String,
        description: String,
        expiry: Option<u64>,
        now: u64,
    ) -> Result<(), CoreError> {
        if get_lock(self.store, owner, kind, &reference).is_some() {
            return Ok(());
        }
        let lock = Lock { kind, reference: reference.clone(), description, creation_time: now, expiry };
        self.store.set(&keys::lock(owner, lock_kind_tag(kind), &reference), covenant_store::encode(&lock));
        self.events.emit(Event::StakeLocked { owner: *owner, kind, reference });
        log::info!("lock added: {owner:?} kind {kind:?}");
        Ok(())
    }

    /// `RemoveLock` (spec §4.2).
    pub fn remove_lock(&mut self, owner: &Address, kind: LockKind, reference: &str) -> Result<(), CoreError> {
        if get_lock(self.store, owner, kind, reference).is_none() {
            return Err(CoreError::LockNotFound);
        }
        self.store.remove(&keys::lock(owner, lock_kind_tag(kind), reference));
        self.events.emit(Event::StakeUnlocked { owner: *owner, kind, reference: reference.to_string() });
        log::info!("lock removed: {owner:?} kind {kind:?}");
        Ok(())
    }

    /// `CleanExpiredLocks(owner)` (spec §4.2). Must run before any
    /// `CanUnstake` check; safe to call opportunistically elsewhere.
    pub fn clean_expired_locks(&mut self, owner: &Address, now: u64) {
        for lock in all_locks(self.store, owner) {
            if lock.is_expired(now) {
                self.store.remove(&keys::lock(owner, lock_kind_tag(lock.kind), &lock.reference));
                log::debug!("expired lock swept: {owner:?} kind {:?}", lock.kind);
            }
        }
    }

    /// `CanUnstake` (spec §4.2, §6.4). Reports the first blocking
    /// non-expired lock, in the iteration order `all_locks` returns. Callers
    /// must run `clean_expired_locks` first; this only re-checks `now`
    /// defensively.
    pub fn can_unstake_at(&self, owner: &Address, now: u64) -> Result<(), CoreError> {
        match all_locks(self.store, owner).into_iter().find(|l| !l.is_expired(now)) {
            Some(lock) => Err(CoreError::StakeLocked(lock.kind)),
            None => Ok(()),
        }
    }

    /// Convenience form of [`StakeEngine::can_unstake_at`] for callers that
    /// already called `clean_expired_locks` and just need a boolean gate.
    pub fn can_unstake(&self, owner: &Address) -> Result<(), CoreError> {
        match all_locks(self.store, owner).into_iter().next() {
            Some(lock) => Err(CoreError::StakeLocked(lock.kind)),
            None => Ok(()),
        }
    }

    /// `AddCommitment` (spec §4.2).
    pub fn add_commitment(
        &mut self,
        owner: &Address,
        kind: CommitmentKind,
        reference: String,
        amount: u64,
        description: String,
        now: u64,
    ) -> Result<(), CoreError> {
        if amount == 0 {
            return Err(CoreError::InvalidAmount);
        }
        let stake = get_user_stake(self.store, owner).ok_or(CoreError::StakeNotFound(*owner))?;
        let mut commitments = get_commitments(self.store, owner);
        if stake.bonded_amount.saturating_sub(commitments.total_committed) < amount {
            log::warn!(
                "add_commitment rejected for {owner:?}: available {} < amount {amount}",
                stake.bonded_amount.saturating_sub(commitments.total_committed)
            );
            return Err(CoreError::ExceedsTrustCeiling);
        }

        commitments.commitments.push(StakeCommitment {
            kind,
            reference: reference.clone(),
            amount,
            description,
            creation_time: now,
        });
        *commitments.kind_total_mut(kind) += amount;
        commitments.total_committed += amount;
        self.store.set(&keys::commitments(owner), covenant_store::encode(&commitments));

        self.events.emit(Event::CommitmentAdded { owner: *owner, reference, amount });
        log::info!("commitment added: {owner:?} kind {kind:?} amount {amount}");
        Ok(())
    }

    /// `ReleaseCommitment` (spec §4.2). Idempotent: missing is a no-op.
    pub fn release_commitment(&mut self, owner: &Address, kind: CommitmentKind, reference: &str) -> Result<(), CoreError> {
        let mut commitments = get_commitments(self.store, owner);
        let Some(idx) = commitments.commitments.iter().position(|c| c.kind == kind && c.reference == reference) else {
            return Ok(());
        };
        let removed = commitments.commitments.remove(idx);
        *commitments.kind_total_mut(kind) -= removed.amount;
        commitments.total_committed -= removed.amount;

        if commitments.commitments.is_empty() {
            self.store.remove(&keys::commitments(owner));
        } else {
            self.store.set(&keys::commitments(owner), covenant_store::encode(&commitments));
        }

        self.events.emit(Event::CommitmentReleased { owner: *owner, reference: reference.to_string(), amount: removed.amount });
        log::info!("commitment released: {owner:?} kind {kind:?} amount {}", removed.amount);
        Ok(())
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
    fn add_lock_is_idempotent_and_blocks_unstake() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 1_000);
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 100, 0).unwrap();

        engine.add_lock(&addr(1), LockKind::ActiveCompanyListing, "C".into(), "desc".into(), None, 0).unwrap();
        engine.add_lock(&addr(1), LockKind::ActiveCompanyListing, "C".into(), "desc".into(), None, 0).unwrap();
        assert_eq!(all_locks(&store, &addr(1)).len(), 1);

        let err = engine.unbond(&addr(1), 1, 1).unwrap_err();
        assert_eq!(err, CoreError::StakeLocked(LockKind::ActiveCompanyListing));

        engine.remove_lock(&addr(1), LockKind::ActiveCompanyListing, "C").unwrap();
        engine.unbond(&addr(1), 1, 1).unwrap();
    }

    #[test]
    fn expired_lock_does_not_block() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 1_000);
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 100, 0).unwrap();
        engine.add_lock(&addr(1), LockKind::ActiveLoan, "L".into(), String::new(), Some(50), 0).unwrap();
        engine.unbond(&addr(1), 1, 100).unwrap();
    }

    #[test]
    fn commitment_blocks_beyond_trust_ceiling() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 1_000);
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 1_000, 0).unwrap();
        engine.add_commitment(&addr(1), CommitmentKind::EscrowCommitment, "7".into(), 700, String::new(), 0).unwrap();
        let err = engine.add_commitment(&addr(1), CommitmentKind::LendingCommitment, "4".into(), 400, String::new(), 0).unwrap_err();
        assert_eq!(err, CoreError::ExceedsTrustCeiling);
        assert_eq!(total_committed(&store, &addr(1)), 700);
    }

    #[test]
    fn release_commitment_restores_available_stake() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        bank.credit(&addr(1), 1_000);
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 1_000, 0).unwrap();
        engine.add_commitment(&addr(1), CommitmentKind::EscrowCommitment, "7".into(), 700, String::new(), 0).unwrap();
        engine.release_commitment(&addr(1), CommitmentKind::EscrowCommitment, "7").unwrap();
        assert_eq!(total_committed(&store, &addr(1)), 0);
        assert!(store.get(&keys::commitments(&addr(1))).is_none());
    }

    #[test]
    fn release_commitment_missing_is_noop() {
        let (mut store, mut bank, mut events, params, mut hooks) = harness();
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.release_commitment(&addr(1), CommitmentKind::EscrowCommitment, "nope").unwrap();
    }

    // Property test for the spec §3.2 trust-ceiling invariant: for any
    // sequence of add/release commitment calls, `total_committed` can never
    // exceed `bonded_amount`, and the cached total always equals the sum of
    // the held commitments.
    mod props {
        use proptest::prelude::*;

        use super::*;

        #[derive(Debug, Clone, Copy)]
        enum Op {
            Add(u64),
            Release(usize),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![(1u64..500).prop_map(Op::Add), (0usize..10).prop_map(Op::Release),]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn commitment_total_never_exceeds_bonded(ops in prop::collection::vec(op_strategy(), 1..40)) {
                let (mut store, mut bank, mut events, params, mut hooks) = harness();
                bank.credit(&addr(1), 1_000);
                let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
                engine.bond(&addr(1), 1_000, 0).unwrap();

                let mut held: Vec<String> = Vec::new();
                let mut next_ref = 0u64;
                for op in ops {
                    match op {
                        Op::Add(amount) => {
                            let reference = next_ref.to_string();
                            next_ref += 1;
                            if engine
                                .add_commitment(&addr(1), CommitmentKind::EscrowCommitment, reference.clone(), amount, String::new(), 0)
                                .is_ok()
                            {
                                held.push(reference);
                            }
                        }
                        Op::Release(idx) => {
                            if !held.is_empty() {
                                let reference = held.remove(idx % held.len());
                                engine.release_commitment(&addr(1), CommitmentKind::EscrowCommitment, &reference).unwrap();
                            }
                        }
                    }

                    let stake = get_user_stake(&store, &addr(1)).unwrap();
                    let commitments = get_commitments(&store, &addr(1));
                    prop_assert!(commitments.total_committed <= stake.bonded_amount);
                    let sum: u64 = commitments.commitments.iter().map(|c| c.amount).sum();
                    prop_assert_eq!(sum, commitments.total_committed);
                }
            }
        }
    }
}
