//! Reward/Epoch Engine (component C7, spec §4.5).
//!
//! Epoch pool split and weighted allocation are grounded on the teacher's
//! tiered reward-rate table (`passive-stake/src/constants.rs`); the
//! escalating offense counter is grounded on the three-strike jail/ban
//! idiom in `runtime/slashing.rs` (spec §2.2).

use covenant_bank::Pool;
use covenant_events::Event;
use covenant_params::{tier_reward_weight_bps, tier_slash_risk_bps, SlashReason, Tier};
use covenant_store::keys;
use covenant_types::{bps_of, Address, CoreError, LockKind};

use crate::engine::StakeEngine;
use crate::ledger::{get_tier_count, get_user_stake, put_tier_count, put_user_stake};
use crate::state::{OffenseCounter, UserStake};

fn slash_reason_tag(reason: SlashReason) -> u8 {
    match reason {
        SlashReason::Downtime => 0,
        SlashReason::DoubleSign => 1,
        SlashReason::BadVerification => 2,
        SlashReason::FraudAttempt => 3,
        SlashReason::BadModeration => 4,
        SlashReason::UnfairDispute => 5,
    }
}

fn get_offense_counter(store: &dyn covenant_store::KvStore, owner: &Address, reason: SlashReason) -> OffenseCounter {
    store
        .get(&keys::offense_counter(owner, slash_reason_tag(reason)))
        .map(|bytes| covenant_store::decode(&bytes).expect("corrupt OffenseCounter record"))
        .unwrap_or_default()
}

fn weight(stake: &UserStake) -> u128 {
    stake.bonded_amount as u128 * tier_reward_weight_bps(stake.tier) as u128
}

fn all_stakes(store: &dyn covenant_store::KvStore) -> Vec<UserStake> {
    store
        .prefix_iterate(&[covenant_store::prefix::USER_STAKE])
        .into_iter()
        .map(|(_, v)| covenant_store::decode(&v).expect("corrupt UserStake record"))
        .collect()
}

impl<'a> StakeEngine<'a> {
    /// `ShouldDistribute(height)` (spec §4.5): true exactly once per epoch
    /// boundary.
    pub fn should_distribute(&self, height: u64) -> bool {
        height > 0 && height % self.params.epoch_blocks == 0
    }

    /// `Distribute(treasury_balance)` (spec §4.5). Skipped if
    /// `treasury_balance < min_rewards_distribution`. Splits into staker,
    /// validator, and governance pools and credits each eligible owner's
    /// `pending_rewards` pro-rata by weight within its pool.
    pub fn distribute(&mut self, epoch: u64, treasury_balance: u64) -> Result<(), CoreError> {
        if treasury_balance < self.params.min_rewards_distribution {
            log::info!("epoch {epoch}: distribution skipped, treasury_balance {treasury_balance} below floor");
            return Ok(());
        }

        let staker_pool = bps_of(treasury_balance, self.params.staker_pool_bps);
        let validator_pool = bps_of(treasury_balance, self.params.validator_pool_bps);
        let governance_pool = bps_of(treasury_balance, self.params.governance_pool_bps);

        let stakes = all_stakes(self.store);

        self.allocate_pool(&stakes, staker_pool, |_| true);
        self.allocate_pool(&stakes, validator_pool, |s| s.tier == Tier::Validator && s.is_validator);
        self.allocate_pool(&stakes, governance_pool, |s| s.reputation >= self.params.governance_pool_min_reputation);

        self.events.emit(Event::RewardsDistributed {
            epoch,
            total: staker_pool + validator_pool + governance_pool,
            staker_pool,
            validator_pool,
            governance_pool,
            recipient_policy: "reputation_threshold",
        });
        log::info!("epoch {epoch}: distributed staker={staker_pool} validator={validator_pool} governance={governance_pool}");
        Ok(())
    }

    fn allocate_pool(&mut self, stakes: &[UserStake], pool_amount: u64, eligible: impl Fn(&UserStake) -> bool) {
        if pool_amount == 0 {
            return;
        }
        let total_weight: u128 = stakes.iter().filter(|s| eligible(s)).map(weight).sum();
        if total_weight == 0 {
            return;
        }
        for stake in stakes.iter().filter(|s| eligible(s)) {
            let share = (weight(stake) * pool_amount as u128 / total_weight) as u64;
            if share == 0 {
                continue;
            }
            if let Some(mut current) = get_user_stake(self.store, &stake.owner) {
                current.pending_rewards = current.pending_rewards.saturating_add(share);
                put_user_stake(self.store, &current);
            }
        }
    }

    /// `ClaimRewards(owner)` (spec §4.5, §6.1).
    pub fn claim_rewards(&mut self, owner: &Address, now: u64) -> Result<u64, CoreError> {
        let mut stake = get_user_stake(self.store, owner).ok_or(CoreError::StakeNotFound(*owner))?;
        if stake.pending_rewards == 0 {
            return Err(CoreError::NoRewardsToClaim);
        }
        let amount = stake.pending_rewards;
        self.bank.transfer_from_pool(Pool::Rewards, owner, amount)?;

        stake.pending_rewards = 0;
        stake.lifetime_claimed_rewards = stake.lifetime_claimed_rewards.saturating_add(amount);
        stake.last_reward_claim_time = now;
        put_user_stake(self.store, &stake);

        self.events.emit(Event::ClaimRewards { owner: *owner, amount });
        log::info!("rewards claimed: {owner:?} amount {amount}");
        Ok(amount)
    }

    /// `Slash(owner, reason, fraction_bps)` (spec §4.5). The requested
    /// fraction is capped at the owner's `tier.SlashRisk`; on the
    /// `repeat_offense_threshold`-th occurrence of `reason` the fraction
    /// escalates to `repeat_offense_penalty_bps` (still capped) and the
    /// owner additionally receives a `Banned` lock (spec §2.2).
    pub fn slash(&mut self, owner: &Address, reason: SlashReason, fraction_bps: u64, now: u64) -> Result<u64, CoreError> {
        let mut stake = get_user_stake(self.store, owner).ok_or(CoreError::StakeNotFound(*owner))?;
        let cap = tier_slash_risk_bps(stake.tier);

        let mut counter = get_offense_counter(self.store, owner, reason);
        counter.count += 1;
        let escalated = counter.count >= self.params.repeat_offense_threshold;
        let effective_bps = if escalated { self.params.repeat_offense_penalty_bps } else { fraction_bps }.min(cap);
        self.store.set(&keys::offense_counter(owner, slash_reason_tag(reason)), covenant_store::encode(&counter));

        let slash_amount = bps_of(stake.bonded_amount, effective_bps);
        if slash_amount == 0 {
            return Ok(0);
        }

        self.bank.burn_from_pool(Pool::Staking, slash_amount)?;

        let mut counts = get_tier_count(self.store);
        let old_tier = stake.tier;
        stake.bonded_amount -= slash_amount;
        stake.tier = self.params.tier_thresholds.tier_for_amount(stake.bonded_amount);
        if stake.tier < Tier::Validator {
            stake.is_validator = false;
        }
        if old_tier != stake.tier {
            counts.decrement(old_tier);
            counts.increment(stake.tier);
            put_tier_count(self.store, &counts);
        }

        if stake.bonded_amount == 0 {
            self.store.remove(&keys::user_stake(owner));
        } else {
            put_user_stake(self.store, &stake);
        }

        self.events.emit(Event::Slash {
            owner: *owner,
            reason: format!("{reason:?}"),
            amount: slash_amount,
            fraction_bps: effective_bps,
        });
        if old_tier != stake.tier {
            self.events.emit(Event::TierChange { owner: *owner, old_tier: old_tier.as_i8(), new_tier: stake.tier.as_i8() });
        }
        self.hooks.fire_after_slash(owner, slash_amount);
        if old_tier != stake.tier {
            self.hooks.fire_after_tier_change(owner, old_tier, stake.tier);
        }

        if escalated {
            self.add_lock(owner, LockKind::UserBanned, "slash-escalation".to_string(), format!("{reason:?}"), None, now)?;
        }

        log::warn!("slash: {owner:?} reason {reason:?} amount {slash_amount} effective_bps {effective_bps} escalated {escalated}");
        Ok(slash_amount)
    }
}
