//! Bank adapter (spec §1 non-goals, component C3).
//!
//! Token custody and burn primitives live outside this crate's boundary —
//! the host's bank module owns balances. This crate only needs the narrow
//! slice of that module's behavior the staking/governance engines drive:
//! moving tokens between a user's spendable balance and one of this crate's
//! module-owned pools, and burning from a pool. `MemBank` is a reference
//! implementation used by tests, shaped like the teacher's `TreasuryConfig`
//! cumulative-counter bookkeeping (`total_received` / `total_disbursed`).

use std::collections::HashMap;

use covenant_types::{Address, CoreError};

/// The module-owned pools this crate moves tokens through. Spec §5 assigns
/// each pool a fixed set of mutating call sites; the `Bank` trait does not
/// enforce that by itself — callers (the engines) are responsible for only
/// touching the pool their component owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    /// Bonded + in-unbonding tokens.
    Staking,
    /// Undistributed epoch rewards.
    Rewards,
    /// Pending governance proposal deposits.
    Deposits,
    /// Deposits forfeited (not burned) by rejected proposals, plus the
    /// source pool for `community-spend` and `treasury` proposal execution.
    Community,
}

/// Narrow bank contract this crate depends on. The host's real bank module
/// implements this over its own ledger; `covenant-runtime` wires `MemBank`
/// for tests and as a minimal reference host.
pub trait Bank {
    /// Moves `amount` from `owner`'s spendable balance into `pool`.
    fn transfer_to_pool(&mut self, owner: &Address, pool: Pool, amount: u64) -> Result<(), CoreError>;

    /// Moves `amount` from `pool` into `owner`'s spendable balance.
    fn transfer_from_pool(&mut self, pool: Pool, owner: &Address, amount: u64) -> Result<(), CoreError>;

    /// Destroys `amount` held in `pool`, removing it from circulation.
    fn burn_from_pool(&mut self, pool: Pool, amount: u64) -> Result<(), CoreError>;

    /// Spendable balance of `owner`, outside any pool.
    fn balance(&self, owner: &Address) -> u64;

    /// Current balance held in `pool`.
    fn pool_balance(&self, pool: Pool) -> u64;
}

/// In-memory reference `Bank`. Pools and user balances are plain maps;
/// cumulative received/disbursed counters per pool mirror the teacher's
/// `TreasuryConfig::{total_received,total_disbursed}` idiom so tests can
/// assert on lifetime totals, not just point-in-time balances.
#[derive(Debug, Default, Clone)]
pub struct MemBank {
    balances: HashMap<Address, u64>,
    pools: HashMap<Pool, u64>,
    total_received: HashMap<Pool, u64>,
    total_disbursed: HashMap<Pool, u64>,
    total_burned: HashMap<Pool, u64>,
}

impl MemBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/genesis helper: mints `amount` directly into `owner`'s spendable
    /// balance. Not part of the `Bank` trait — production hosts mint via
    /// their own token-supply mechanism, out of this crate's scope.
    pub fn credit(&mut self, owner: &Address, amount: u64) {
        *self.balances.entry(*owner).or_insert(0) += amount;
    }

    pub fn total_received(&self, pool: Pool) -> u64 {
        *self.total_received.get(&pool).unwrap_or(&0)
    }

    pub fn total_disbursed(&self, pool: Pool) -> u64 {
        *self.total_disbursed.get(&pool).unwrap_or(&0)
    }

    pub fn total_burned(&self, pool: Pool) -> u64 {
        *self.total_burned.get(&pool).unwrap_or(&0)
    }
}

impl Bank for MemBank {
    fn transfer_to_pool(&mut self, owner: &Address, pool: Pool, amount: u64) -> Result<(), CoreError> {
        let balance = self.balances.entry(*owner).or_insert(0);
        if *balance < amount {
            return Err(CoreError::Bank(format!(
                "insufficient spendable balance for {owner:?}: have {balance}, need {amount}"
            )));
        }
        *balance -= amount;
        *self.pools.entry(pool).or_insert(0) += amount;
        *self.total_received.entry(pool).or_insert(0) += amount;
        Ok(())
    }

    fn transfer_from_pool(&mut self, pool: Pool, owner: &Address, amount: u64) -> Result<(), CoreError> {
        let pool_balance = self.pools.entry(pool).or_insert(0);
        if *pool_balance < amount {
            return Err(CoreError::Bank(format!(
                "pool {pool:?} underfunded: have {pool_balance}, need {amount}"
            )));
        }
        *pool_balance -= amount;
        *self.balances.entry(*owner).or_insert(0) += amount;
        *self.total_disbursed.entry(pool).or_insert(0) += amount;
        Ok(())
    }

    fn burn_from_pool(&mut self, pool: Pool, amount: u64) -> Result<(), CoreError> {
        let pool_balance = self.pools.entry(pool).or_insert(0);
        if *pool_balance < amount {
            return Err(CoreError::Bank(format!(
                "pool {pool:?} underfunded for burn: have {pool_balance}, need {amount}"
            )));
        }
        *pool_balance -= amount;
        *self.total_burned.entry(pool).or_insert(0) += amount;
        Ok(())
    }

    fn balance(&self, owner: &Address) -> u64 {
        *self.balances.get(owner).unwrap_or(&0)
    }

    fn pool_balance(&self, pool: Pool) -> u64 {
        *self.pools.get(&pool).unwrap_or(&0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn transfer_to_and_from_pool_round_trips() {
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 100);

        bank.transfer_to_pool(&addr(1), Pool::Staking, 40).unwrap();
        assert_eq!(bank.balance(&addr(1)), 60);
        assert_eq!(bank.pool_balance(Pool::Staking), 40);

        bank.transfer_from_pool(Pool::Staking, &addr(1), 15).unwrap();
        assert_eq!(bank.balance(&addr(1)), 75);
        assert_eq!(bank.pool_balance(Pool::Staking), 25);

        assert_eq!(bank.total_received(Pool::Staking), 40);
        assert_eq!(bank.total_disbursed(Pool::Staking), 15);
    }

    #[test]
    fn insufficient_balance_is_rejected() {
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 5);
        assert!(bank.transfer_to_pool(&addr(1), Pool::Staking, 10).is_err());
    }

    #[test]
    fn burn_reduces_pool_without_crediting_anyone() {
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 100);
        bank.transfer_to_pool(&addr(1), Pool::Staking, 100).unwrap();
        bank.burn_from_pool(Pool::Staking, 30).unwrap();
        assert_eq!(bank.pool_balance(Pool::Staking), 70);
        assert_eq!(bank.total_burned(Pool::Staking), 30);
    }
}
