//! Read-only queries and capability predicates (spec §6.4).
//!
//! Free functions over `&dyn KvStore` rather than `StakeEngine` methods:
//! queries never mutate and several (e.g. `GetAllTierStats`) are called from
//! contexts with no bank/event-bus/hooks handle available.

use covenant_params::Tier;
use covenant_store::KvStore;
use covenant_types::Address;

use crate::ledger::{get_tier_count, get_user_stake};
use crate::locks::{get_commitments, total_committed};
use crate::state::{InheritanceUnbonding, Lock, TierCount, UnbondingRequest, UserStake, UserStakeCommitments};
use crate::unbonding::{get_inheritance, get_request};

pub fn get_user_stake_query(store: &dyn KvStore, owner: &Address) -> Option<UserStake> {
    get_user_stake(store, owner)
}

pub fn get_user_tier(store: &dyn KvStore, owner: &Address) -> Tier {
    get_user_stake(store, owner).map(|s| s.tier).unwrap_or(Tier::None)
}

pub fn has_minimum_tier(store: &dyn KvStore, owner: &Address, minimum: Tier) -> bool {
    get_user_tier(store, owner) >= minimum
}

pub fn get_pending_rewards(store: &dyn KvStore, owner: &Address) -> u64 {
    get_user_stake(store, owner).map(|s| s.pending_rewards).unwrap_or(0)
}

pub fn get_total_rewards_claimed(store: &dyn KvStore, owner: &Address) -> u64 {
    get_user_stake(store, owner).map(|s| s.lifetime_claimed_rewards).unwrap_or(0)
}

pub fn get_tier_stats(store: &dyn KvStore, tier: Tier) -> u64 {
    get_tier_count(store).get(tier)
}

pub fn get_all_tier_stats(store: &dyn KvStore) -> TierCount {
    get_tier_count(store)
}

fn all_stakes(store: &dyn KvStore) -> Vec<UserStake> {
    store
        .prefix_iterate(&[covenant_store::prefix::USER_STAKE])
        .into_iter()
        .map(|(_, v)| covenant_store::decode(&v).expect("corrupt UserStake record"))
        .collect()
}

pub fn get_total_staked(store: &dyn KvStore) -> u64 {
    all_stakes(store).iter().map(|s| s.bonded_amount).sum()
}

pub fn get_total_weight(store: &dyn KvStore) -> u128 {
    all_stakes(store)
        .iter()
        .map(|s| s.bonded_amount as u128 * covenant_params::tier_reward_weight_bps(s.tier) as u128)
        .sum()
}

pub fn get_active_locks(store: &dyn KvStore, owner: &Address, now: u64) -> Vec<Lock> {
    store
        .prefix_iterate(&covenant_store::keys::lock_scan_prefix(owner))
        .into_iter()
        .map(|(_, v)| covenant_store::decode::<Lock>(&v).expect("corrupt Lock record"))
        .filter(|l| !l.is_expired(now))
        .collect()
}

pub fn get_user_commitments(store: &dyn KvStore, owner: &Address) -> UserStakeCommitments {
    get_commitments(store, owner)
}

pub fn get_available_stake(store: &dyn KvStore, owner: &Address) -> u64 {
    let Some(stake) = get_user_stake(store, owner) else {
        return 0;
    };
    stake.bonded_amount.saturating_sub(total_committed(store, owner))
}

pub fn get_unbonding_request(store: &dyn KvStore, owner: &Address) -> Option<UnbondingRequest> {
    get_request(store, owner)
}

/// Not in spec §6.4's named query list, but symmetrical with
/// `get_unbonding_request` for the inheritance redirect path (component
/// C14) — external collaborators need to read a pending redirect the same
/// way they read a plain pending withdrawal.
pub fn get_inheritance_unbonding(store: &dyn KvStore, owner: &Address) -> Option<InheritanceUnbonding> {
    get_inheritance(store, owner)
}

fn meets_reputation(store: &dyn KvStore, params: &covenant_params::StakingParams, owner: &Address, action: &str) -> bool {
    let Some(stake) = get_user_stake(store, owner) else {
        return false;
    };
    params.reputation_requirements.get(action).is_some_and(|required| stake.reputation >= *required)
}

pub fn can_lend(store: &dyn KvStore, params: &covenant_params::StakingParams, owner: &Address) -> bool {
    meets_reputation(store, params, owner, "lend")
}

pub fn can_borrow(store: &dyn KvStore, params: &covenant_params::StakingParams, owner: &Address) -> bool {
    meets_reputation(store, params, owner, "borrow")
}

pub fn can_verify_business(store: &dyn KvStore, params: &covenant_params::StakingParams, owner: &Address) -> bool {
    meets_reputation(store, params, owner, "verify_business")
}

pub fn can_moderate(store: &dyn KvStore, params: &covenant_params::StakingParams, owner: &Address) -> bool {
    meets_reputation(store, params, owner, "moderate")
}

pub fn can_moderate_large_disputes(store: &dyn KvStore, params: &covenant_params::StakingParams, owner: &Address) -> bool {
    meets_reputation(store, params, owner, "moderate_large_disputes")
}

pub fn can_slash_moderators(store: &dyn KvStore, params: &covenant_params::StakingParams, owner: &Address) -> bool {
    meets_reputation(store, params, owner, "slash_moderators")
}

pub fn can_submit_listing(store: &dyn KvStore, params: &covenant_params::StakingParams, owner: &Address) -> bool {
    meets_reputation(store, params, owner, "submit_listing")
}

pub fn can_unstake(store: &dyn KvStore, owner: &Address, now: u64) -> bool {
    get_active_locks(store, owner, now).is_empty()
}

pub fn can_commit(store: &dyn KvStore, owner: &Address, amount: u64) -> bool {
    get_available_stake(store, owner) >= amount
}

pub fn can_unstake_amount(store: &dyn KvStore, owner: &Address, amount: u64) -> bool {
    let Some(stake) = get_user_stake(store, owner) else {
        return false;
    };
    stake.bonded_amount.saturating_sub(amount) >= total_committed(store, owner)
}

#[cfg(test)]
mod tests {
    use covenant_bank::{Bank, MemBank};
    use covenant_events::MemEventBus;
    use covenant_params::StakingParams;
    use covenant_store::MemKvStore;

    use super::*;
    use crate::engine::StakeEngine;
    use crate::hooks::HookRegistry;
    use crate::state::CommitmentKind;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn available_stake_excludes_commitments() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 1_000);
        let mut events = MemEventBus::new();
        let params = StakingParams::defaults_for_chain("covenant-testnet");
        let mut hooks = HookRegistry::new();
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 1_000, 0).unwrap();
        engine.add_commitment(&addr(1), CommitmentKind::EscrowCommitment, "7".into(), 700, String::new(), 0).unwrap();

        assert_eq!(get_available_stake(&store, &addr(1)), 300);
        assert!(can_commit(&store, &addr(1), 300));
        assert!(!can_commit(&store, &addr(1), 301));
    }

    #[test]
    fn tier_stats_reflect_population() {
        let mut store = MemKvStore::new();
        let mut bank = MemBank::new();
        bank.credit(&addr(1), 1_000);
        bank.credit(&addr(2), 1_000);
        let mut events = MemEventBus::new();
        let params = StakingParams::defaults_for_chain("covenant-testnet");
        let mut hooks = HookRegistry::new();
        let mut engine = StakeEngine::new(&mut store, &mut bank, &mut events, &params, &mut hooks);
        engine.bond(&addr(1), 10, 0).unwrap();
        engine.bond(&addr(2), 10, 0).unwrap();

        assert_eq!(get_tier_stats(&store, Tier::Keeper), 2);
        assert_eq!(get_total_staked(&store), 20);
        assert!(has_minimum_tier(&store, &addr(1), Tier::Holder));
        assert!(!has_minimum_tier(&store, &addr(1), Tier::Warden));
    }
}
