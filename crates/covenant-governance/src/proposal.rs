//! Proposal Store (component C9, spec §4.6 "Submit / Deposit / Cancel").
//! Grounded on the teacher's `process_create_proposal`/`process_vote`
//! dispatch shape (`governance/src/processor.rs`) and its `Proposal` account
//! layout (`state.rs`), generalized from a single fixed quorum/threshold to
//! a per-proposal snapshot of the then-current `GovernanceParams` (spec §9:
//! "the quorum/threshold in force at proposal *creation* time governs its
//! own tally, even if params change mid-vote").

use std::collections::BTreeMap;

use covenant_store::keys;
use covenant_types::{Address, CoreError};

use crate::engine::GovernanceEngine;
use crate::state::{
    proposal_status_tag, proposal_type_tag, Deposit, EmergencyAnnotation, Proposal, ProposalStatus, ProposalType,
    TallyCounters,
};

fn get_proposal(store: &dyn covenant_store::KvStore, id: u64) -> Option<Proposal> {
    store.get(&keys::proposal(id)).map(|b| covenant_store::decode(&b).expect("corrupt Proposal record"))
}

fn put_proposal(store: &mut dyn covenant_store::KvStore, p: &Proposal) {
    store.set(&keys::proposal(p.id), covenant_store::encode(p));
}

fn next_id(store: &mut dyn covenant_store::KvStore) -> u64 {
    let key = keys::next_proposal_id();
    let current: u64 = store.get(&key).map(|b| covenant_store::decode(&b).expect("corrupt id counter")).unwrap_or(0);
    store.set(&key, covenant_store::encode(&(current + 1)));
    current
}

/// Moves a proposal's by-status secondary index entry from `old` to `new`.
fn reindex_status(store: &mut dyn covenant_store::KvStore, id: u64, old: ProposalStatus, new: ProposalStatus) {
    store.remove(&keys::proposal_by_status(proposal_status_tag(old), id));
    store.set(&keys::proposal_by_status(proposal_status_tag(new), id), covenant_store::encode(&id));
}

impl<'a> GovernanceEngine<'a> {
    /// Submits a new proposal (spec §4.6). Runs the anti-spam gate, snapshots
    /// the current governance parameters onto the proposal record, writes
    /// the primary record and every secondary index, enqueues the
    /// deposit-end sweep entry, and records the proposer's initial deposit
    /// if any.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_proposal(
        &mut self,
        proposer: Address,
        proposal_type: ProposalType,
        title: String,
        description: String,
        initial_deposit: u64,
        company_id: Option<u64>,
        validator: Option<Address>,
        emergency: Option<EmergencyAnnotation>,
        metadata: BTreeMap<String, String>,
        now: u64,
    ) -> Result<u64, CoreError> {
        if title.is_empty() || title.len() > self.gov_params.max_title_len {
            return Err(CoreError::InvalidProposal("title length out of bounds".to_string()));
        }
        if description.len() > self.gov_params.max_description_len {
            return Err(CoreError::InvalidProposal("description too long".to_string()));
        }

        self.enforce_anti_spam(&proposer, now)?;

        if initial_deposit > 0 {
            let available = covenant_staking::get_available_stake(self.store, &proposer);
            if available < initial_deposit {
                return Err(CoreError::InvalidDeposit);
            }
            self.bank.transfer_to_pool(&proposer, covenant_bank::Pool::Deposits, initial_deposit)?;
        }

        let id = next_id(self.store);
        let voting_period =
            if emergency.as_ref().is_some_and(|e| e.fast_track) { self.gov_params.emergency_voting_period_seconds } else { self.gov_params.voting_period_seconds };
        let deposit_end_time = now + self.gov_params.deposit_period_seconds;

        let mut proposal = Proposal {
            id,
            proposal_type,
            title,
            description,
            proposer,
            status: ProposalStatus::DepositPeriod,
            deposit_end_time,
            voting_start_time: 0,
            voting_end_time: 0,
            total_deposit: initial_deposit,
            min_deposit: self.gov_params.min_deposit,
            quorum_bps: self.gov_params.quorum_bps,
            threshold_bps: self.gov_params.threshold_bps,
            veto_threshold_bps: self.gov_params.veto_threshold_bps,
            tally: TallyCounters::default(),
            executed: false,
            execution_time: 0,
            execution_result: String::new(),
            company_id,
            validator,
            metadata,
            emergency,
            created_at: now,
        };
        // voting_end_time is fixed relative to when voting actually starts;
        // stash the configured window length in voting_start_time until
        // try_activate fires, then resolve both together.
        proposal.voting_start_time = voting_period;

        let type_tag = proposal_type_tag(&proposal.proposal_type);
        self.store.set(&keys::proposal_by_status(proposal_status_tag(ProposalStatus::DepositPeriod), id), covenant_store::encode(&id));
        self.store.set(&keys::proposal_by_submitter(&proposer, id), covenant_store::encode(&id));
        self.store.set(&keys::proposal_by_type(type_tag, id), covenant_store::encode(&id));
        if let Some(cid) = company_id {
            self.store.set(&keys::proposal_by_company(cid, id), covenant_store::encode(&id));
        }
        if let Some(v) = validator {
            self.store.set(&keys::proposal_by_validator(&v, id), covenant_store::encode(&id));
        }
        if let Some(ann) = proposal.emergency {
            self.store.set(
                &keys::emergency_by_type(crate::state::emergency_type_tag(ann.emergency_type), id),
                covenant_store::encode(&id),
            );
            self.store.set(&keys::emergency_by_severity(ann.severity, id), covenant_store::encode(&id));
        }
        self.store.set(&keys::deposit_end_queue_entry(deposit_end_time, id), covenant_store::encode(&id));

        if initial_deposit > 0 {
            let deposit = Deposit { proposal_id: id, depositor: proposer, amount: initial_deposit, deposited_time: now };
            self.store.set(&keys::deposit(id, &proposer), covenant_store::encode(&deposit));
        }

        self.events.emit(covenant_events::Event::SubmitProposal { proposal_id: id, proposer });
        if initial_deposit > 0 {
            self.events.emit(covenant_events::Event::ProposalDeposit { proposal_id: id, depositor: proposer, amount: initial_deposit });
        }
        log::info!("proposal {id} submitted by {proposer:?}, type_tag {type_tag}");

        put_proposal(self.store, &proposal);
        self.try_activate(id, now)?;
        Ok(id)
    }

    /// Adds to a proposal's deposit total, refunding nothing on its own
    /// (refunds happen only on `Rejected` at the deposit-end sweep, spec
    /// §4.7). Crossing `min_deposit` immediately activates voting.
    pub fn deposit(&mut self, proposal_id: u64, depositor: Address, amount: u64, now: u64) -> Result<(), CoreError> {
        let mut proposal = get_proposal(self.store, proposal_id).ok_or(CoreError::ProposalNotFound(proposal_id))?;
        if proposal.status != ProposalStatus::DepositPeriod {
            return Err(CoreError::InvalidProposalStatus);
        }
        if now >= proposal.deposit_end_time {
            return Err(CoreError::DepositPeriodEnded);
        }
        if amount == 0 {
            return Err(CoreError::InvalidDeposit);
        }

        self.bank.transfer_to_pool(&depositor, covenant_bank::Pool::Deposits, amount)?;

        let key = keys::deposit(proposal_id, &depositor);
        let mut record: Deposit = self
            .store
            .get(&key)
            .map(|b| covenant_store::decode(&b).expect("corrupt Deposit record"))
            .unwrap_or(Deposit { proposal_id, depositor, amount: 0, deposited_time: now });
        record.amount += amount;
        record.deposited_time = now;
        self.store.set(&key, covenant_store::encode(&record));

        proposal.total_deposit += amount;
        put_proposal(self.store, &proposal);

        self.events.emit(covenant_events::Event::ProposalDeposit { proposal_id, depositor, amount });
        self.try_activate(proposal_id, now)?;
        Ok(())
    }

    /// Transitions a proposal from `DepositPeriod` to `VotingPeriod` the
    /// moment its `total_deposit` first meets `min_deposit` (spec §4.6:
    /// "may activate before the deposit period elapses"). A no-op if the
    /// proposal is not eligible yet or already past `DepositPeriod`.
    pub(crate) fn try_activate(&mut self, proposal_id: u64, now: u64) -> Result<(), CoreError> {
        let mut proposal = get_proposal(self.store, proposal_id).ok_or(CoreError::ProposalNotFound(proposal_id))?;
        if proposal.status != ProposalStatus::DepositPeriod || proposal.total_deposit < proposal.min_deposit {
            return Ok(());
        }
        let voting_period = proposal.voting_start_time; // stashed window length, see submit_proposal
        proposal.voting_start_time = now;
        proposal.voting_end_time = now + voting_period;
        reindex_status(self.store, proposal_id, ProposalStatus::DepositPeriod, ProposalStatus::VotingPeriod);
        self.store.set(&keys::voting_end_queue_entry(proposal.voting_end_time, proposal_id), covenant_store::encode(&proposal_id));
        self.store.remove(&keys::deposit_end_queue_entry(proposal.deposit_end_time, proposal_id));
        put_proposal(self.store, &proposal);
        log::info!("proposal {proposal_id} activated for voting, ends at {}", proposal.voting_end_time);
        Ok(())
    }

    /// Cancels a proposal. Proposer-only, and only while still in
    /// `DepositPeriod` (spec §4.6). No `Event` variant exists for
    /// cancellation in the taxonomy this chain exposes to indexers, so this
    /// is recorded only via the diagnostic log, not the event bus.
    pub fn cancel_proposal(&mut self, caller: Address, proposal_id: u64) -> Result<(), CoreError> {
        let mut proposal = get_proposal(self.store, proposal_id).ok_or(CoreError::ProposalNotFound(proposal_id))?;
        if proposal.proposer != caller {
            return Err(CoreError::Unauthorized);
        }
        if proposal.status != ProposalStatus::DepositPeriod {
            return Err(CoreError::InvalidProposalStatus);
        }

        for (_, v) in self.store.prefix_iterate(&keys::deposit_scan(proposal_id)) {
            let d: Deposit = covenant_store::decode(&v).expect("corrupt Deposit record");
            self.bank.transfer_from_pool(covenant_bank::Pool::Deposits, &d.depositor, d.amount)?;
        }

        reindex_status(self.store, proposal_id, ProposalStatus::DepositPeriod, ProposalStatus::Canceled);
        self.store.remove(&keys::deposit_end_queue_entry(proposal.deposit_end_time, proposal_id));
        proposal.status = ProposalStatus::Canceled;
        put_proposal(self.store, &proposal);
        log::info!("proposal {proposal_id} canceled by proposer {caller:?}");
        Ok(())
    }
}

pub fn get_proposal_query(store: &dyn covenant_store::KvStore, id: u64) -> Option<Proposal> {
    get_proposal(store, id)
}

/// Resolves a secondary-index scan (each entry's value is the encoded
/// proposal id) into the primary `Proposal` records, in ascending key order
/// (spec §3.6's indices are all `{prefix}{...}{id}`, so this is also
/// ascending-id order within one status/type/submitter/company/validator).
fn resolve_index_scan(store: &dyn covenant_store::KvStore, prefix: &[u8]) -> Vec<Proposal> {
    store
        .prefix_iterate(prefix)
        .into_iter()
        .filter_map(|(_, v)| {
            let id: u64 = covenant_store::decode(&v).expect("corrupt proposal index entry");
            get_proposal(store, id)
        })
        .collect()
}

/// `iterate proposals by status` (spec §6.4).
pub fn iterate_proposals_by_status(store: &dyn covenant_store::KvStore, status: ProposalStatus) -> Vec<Proposal> {
    resolve_index_scan(store, &keys::proposal_by_status_scan(proposal_status_tag(status)))
}

/// `iterate proposals by submitter` (spec §6.4).
pub fn iterate_proposals_by_submitter(store: &dyn covenant_store::KvStore, submitter: &Address) -> Vec<Proposal> {
    resolve_index_scan(store, &keys::proposal_by_submitter_scan(submitter))
}

/// `iterate proposals by type` (spec §6.4). Callers without a proposal
/// instance at hand can compute the tag via [`proposal_type_tag`] against a
/// sample variant (per-variant payloads, e.g. `CommunitySpend { .. }`, do
/// not affect the tag).
pub fn iterate_proposals_by_type(store: &dyn covenant_store::KvStore, type_tag: u8) -> Vec<Proposal> {
    resolve_index_scan(store, &keys::proposal_by_type_scan(type_tag))
}

/// `iterate proposals by company` (spec §6.4, company-shareholder proposals).
pub fn iterate_proposals_by_company(store: &dyn covenant_store::KvStore, company_id: u64) -> Vec<Proposal> {
    resolve_index_scan(store, &keys::proposal_by_company_scan(company_id))
}

/// `iterate proposals by validator` (spec §6.4, validator-tier-change proposals).
pub fn iterate_proposals_by_validator(store: &dyn covenant_store::KvStore, validator: &Address) -> Vec<Proposal> {
    resolve_index_scan(store, &keys::proposal_by_validator_scan(validator))
}

/// `GetTallyResult` (spec §6.4): the cached `TallyCounters` on a finalized
/// (or still-accumulating, if read mid-vote) proposal.
pub fn get_tally_result_query(store: &dyn covenant_store::KvStore, id: u64) -> Option<TallyCounters> {
    get_proposal(store, id).map(|p| p.tally)
}
