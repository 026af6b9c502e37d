//! Reputation Engine (component C8, spec §4.4).

use covenant_events::Event;
use covenant_params::ReputationAction;
use covenant_store::keys;
use covenant_types::{Address, CoreError};

use crate::engine::StakeEngine;
use crate::ledger::{get_user_stake, put_user_stake};
use crate::state::{ReputationHistory, ReputationRecord};

pub(crate) fn get_history(store: &dyn covenant_store::KvStore, owner: &Address) -> ReputationHistory {
    store
        .get(&keys::reputation_history(owner))
        .map(|bytes| covenant_store::decode(&bytes).expect("corrupt ReputationHistory record"))
        .unwrap_or_default()
}

fn put_history(store: &mut dyn covenant_store::KvStore, owner: &Address, history: &ReputationHistory) {
    store.set(&keys::reputation_history(owner), covenant_store::encode(history));
}

impl<'a> StakeEngine<'a> {
    /// `UpdateReputation(owner, action, reason, related_tx)` (spec §4.4).
    pub fn update_reputation(
        &mut self,
        owner: &Address,
        action: ReputationAction,
        reason: String,
        related_tx: String,
        block_height: u64,
        now: u64,
    ) -> Result<(), CoreError> {
        let mut stake = get_user_stake(self.store, owner).ok_or(CoreError::StakeNotFound(*owner))?;
        let delta = action.delta();
        let resulting_score = (stake.reputation as i64 + delta).clamp(0, 100) as u64;
        stake.reputation = resulting_score;
        put_user_stake(self.store, &stake);

        let mut history = get_history(self.store, owner);
        history.push(ReputationRecord {
            owner: *owner,
            action: format!("{action:?}"),
            delta,
            resulting_score,
            reason: reason.clone(),
            block_height,
            timestamp: now,
            related_tx,
        });
        put_history(self.store, owner, &history);

        self.events.emit(Event::ReputationChange { owner: *owner, delta, new_score: resulting_score, reason });
        self.hooks.fire_after_reputation_change(owner, delta, resulting_score);
        log::info!("reputation update: {owner:?} {action:?} delta {delta} -> {resulting_score}");
        Ok(())
    }

    /// `MeetsReputationRequirement(owner, action_name)` (spec §4.4, §6.4).
    pub fn meets_reputation_requirement(&self, owner: &Address, action_name: &str) -> bool {
        let Some(stake) = get_user_stake(self.store, owner) else {
            return false;
        };
        let Some(required) = self.params.reputation_requirements.get(action_name) else {
            return false;
        };
        stake.reputation >= *required
    }

    /// `ApplyReputationDecay` (spec §4.4): runs once every
    /// `reputation_decay_interval_blocks`. For every owner whose score is
    /// strictly above 100 — only reachable via a future cap change, per the
    /// preserved §9 Open Question branch — applies `max_reputation_decay_bps
    /// / 30` as a daily decay.
    pub fn apply_reputation_decay(&mut self, now: u64) -> u32 {
        let decay_bps = self.params.max_reputation_decay_bps / 30;
        let mut decayed = 0u32;
        let owners: Vec<Address> = self
            .store
            .prefix_iterate(&[covenant_store::prefix::USER_STAKE])
            .into_iter()
            .map(|(k, _)| {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(&k[1..33]);
                Address::new(bytes)
            })
            .collect();

        for owner in owners {
            let Some(mut stake) = get_user_stake(self.store, &owner) else { continue };
            // Dead under the current [0,100] clamp; preserved per spec §9 so a
            // future parameter raising the cap needs no migration.
            if stake.reputation > 100 {
                let decay = covenant_types::bps_of(stake.reputation, decay_bps);
                let new_score = stake.reputation.saturating_sub(decay);
                let delta = new_score as i64 - stake.reputation as i64;
                stake.reputation = new_score;
                put_user_stake(self.store, &stake);

                let mut history = get_history(self.store, &owner);
                history.push(ReputationRecord {
                    owner,
                    action: "ReputationDecay".to_string(),
                    delta,
                    resulting_score: new_score,
                    reason: "periodic decay".to_string(),
                    block_height: 0,
                    timestamp: now,
                    related_tx: String::new(),
                });
                put_history(self.store, &owner, &history);

                self.events.emit(Event::ReputationChange {
                    owner,
                    delta,
                    new_score,
                    reason: "periodic decay".to_string(),
                });
                decayed += 1;
            }
        }
        log::info!("reputation decay at t={now}: {decayed} owners affected");
        decayed
    }

    /// `ApplyReputationRecovery` (spec §4.4): runs at each epoch boundary.
    /// Any owner below 100 who claimed rewards within the recovery window
    /// gains `reputation_recovery_rate`, capped at 100.
    pub fn apply_reputation_recovery(&mut self, now: u64) -> u32 {
        let window = self.params.reputation_recovery_window_seconds;
        let rate = self.params.reputation_recovery_rate;
        let mut recovered = 0u32;
        let owners: Vec<Address> = self
            .store
            .prefix_iterate(&[covenant_store::prefix::USER_STAKE])
            .into_iter()
            .map(|(k, _)| {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(&k[1..33]);
                Address::new(bytes)
            })
            .collect();

        for owner in owners {
            let Some(mut stake) = get_user_stake(self.store, &owner) else { continue };
            let claimed_recently = stake.last_reward_claim_time != 0 && now.saturating_sub(stake.last_reward_claim_time) <= window;
            if stake.reputation < 100 && claimed_recently {
                let new_score = (stake.reputation + rate).min(100);
                let delta = new_score as i64 - stake.reputation as i64;
                stake.reputation = new_score;
                put_user_stake(self.store, &stake);

                let mut history = get_history(self.store, &owner);
                history.push(ReputationRecord {
                    owner,
                    action: "ReputationRecovery".to_string(),
                    delta,
                    resulting_score: new_score,
                    reason: "epoch recovery".to_string(),
                    block_height: 0,
                    timestamp: now,
                    related_tx: String::new(),
                });
                put_history(self.store, &owner, &history);

                self.events.emit(Event::ReputationChange {
                    owner,
                    delta,
                    new_score,
                    reason: "epoch recovery".to_string(),
                });
                recovered += 1;
            }
        }
        log::info!("reputation recovery at t={now}: {recovered} owners affected");
        recovered
    }
}
