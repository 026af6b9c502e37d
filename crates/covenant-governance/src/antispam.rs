//! Anti-spam gate (spec §4.7), run once before a `SubmitProposal` is
//! accepted. Grounded on the teacher's `InsufficientStakeForProposal`/
//! `TooManyActiveProposals` checks (`governance/src/error.rs`,
//! `constants.rs::MAX_ACTIVE_PROPOSALS`), generalized from a single
//! proposal-count ceiling to the full per-day/cooldown/fee gate spec §4.7
//! names.

use covenant_bank::Pool;
use covenant_store::keys;
use covenant_types::{Address, CoreError};

use crate::engine::GovernanceEngine;

fn day_start(now: u64) -> u64 {
    (now / 86_400) * 86_400
}

impl<'a> GovernanceEngine<'a> {
    /// Runs all four gate checks and, only if every one passes, records the
    /// per-day counter and cooldown timestamp and burns the non-refundable
    /// proposal fee. Nothing is recorded if any check fails.
    pub(crate) fn enforce_anti_spam(&mut self, proposer: &Address, now: u64) -> Result<(), CoreError> {
        let available = covenant_staking::get_available_stake(self.store, proposer);
        if available < self.gov_params.min_proposer_stake {
            log::warn!(
                "proposal rejected for {proposer:?}: available stake {available} below min_proposer_stake {}",
                self.gov_params.min_proposer_stake
            );
            return Err(CoreError::Unauthorized);
        }

        let today = day_start(now);
        let day_key = keys::proposer_day_count(proposer, today);
        let count: u32 =
            self.store.get(&day_key).map(|b| covenant_store::decode(&b).expect("corrupt day-count record")).unwrap_or(0);
        if count >= self.gov_params.max_proposals_per_day {
            log::warn!("proposal rejected for {proposer:?}: max_proposals_per_day {} reached", self.gov_params.max_proposals_per_day);
            return Err(CoreError::InvalidProposal("max_proposals_per_day reached".to_string()));
        }

        let cooldown_seconds = self.gov_params.proposal_cooldown_hours * 3_600;
        if let Some(bytes) = self.store.get(&keys::proposer_last_submit(proposer)) {
            let last: u64 = covenant_store::decode(&bytes).expect("corrupt last-submit record");
            if now.saturating_sub(last) < cooldown_seconds {
                log::warn!("proposal rejected for {proposer:?}: cooldown not elapsed (last={last}, now={now})");
                return Err(CoreError::InvalidProposal("proposal cooldown not elapsed".to_string()));
            }
        }

        self.bank.transfer_to_pool(proposer, Pool::Community, self.gov_params.proposal_fee)?;
        self.bank.burn_from_pool(Pool::Community, self.gov_params.proposal_fee)?;

        self.store.set(&day_key, covenant_store::encode(&(count + 1)));
        self.store.set(&keys::proposer_last_submit(proposer), covenant_store::encode(&now));
        Ok(())
    }
}
