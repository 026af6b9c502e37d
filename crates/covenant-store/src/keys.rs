//! Byte-key layout (spec §6.5).
//!
//! Every entity gets a fixed single-byte prefix; numeric ids and timestamps
//! are encoded big-endian so that byte-lexicographic order matches numeric
//! order, which is what makes `prefix_iterate`/`range_iterate` produce
//! ascending-id or ascending-deadline results. Prefixes are stable ABI: a
//! change here requires a migration, not a code review note.

use covenant_types::Address;

pub mod prefix {
    pub const USER_STAKE: u8 = b'S';
    pub const TIER_COUNT: u8 = b'T';
    pub const LOCK: u8 = b'L';
    pub const COMMITMENTS: u8 = b'C';
    pub const UNBONDING_REQUEST: u8 = b'U';
    pub const UNBONDING_QUEUE: u8 = b'o';
    pub const INHERITANCE_UNBONDING: u8 = b'I';
    pub const INHERITANCE_QUEUE: u8 = b'h';
    pub const REPUTATION_HISTORY: u8 = b'R';
    pub const OFFENSE_COUNTER: u8 = b'O';

    pub const PROPOSAL: u8 = b'P';
    pub const PROPOSAL_BY_STATUS: u8 = b's';
    pub const PROPOSAL_BY_SUBMITTER: u8 = b'u';
    pub const PROPOSAL_BY_TYPE: u8 = b't';
    pub const PROPOSAL_BY_COMPANY: u8 = b'c';
    pub const PROPOSAL_BY_VALIDATOR: u8 = b'v';
    pub const DEPOSIT_END_QUEUE: u8 = b'q';
    pub const VOTING_END_QUEUE: u8 = b'r';

    pub const VOTE: u8 = b'V';
    pub const WEIGHTED_VOTE: u8 = b'W';
    pub const DEPOSIT: u8 = b'D';

    pub const DELEGATION: u8 = b'G';
    pub const DELEGATION_BY_DELEGATE: u8 = b'g';
    pub const DELEGATION_BY_DELEGATOR: u8 = b'd';

    pub const PROPOSER_DAY_COUNT: u8 = b'n';
    pub const PROPOSER_LAST_SUBMIT: u8 = b'm';

    pub const EMERGENCY_BY_TYPE: u8 = b'e';
    pub const EMERGENCY_BY_SEVERITY: u8 = b'y';

    pub const PARAMS: u8 = b'Z';
    pub const NEXT_PROPOSAL_ID: u8 = b'N';
}

fn with_address(p: u8, addr: &Address) -> Vec<u8> {
    let mut k = Vec::with_capacity(33);
    k.push(p);
    k.extend_from_slice(addr.as_bytes());
    k
}

fn with_u64(p: u8, n: u64) -> Vec<u8> {
    let mut k = Vec::with_capacity(9);
    k.push(p);
    k.extend_from_slice(&n.to_be_bytes());
    k
}

pub fn user_stake(owner: &Address) -> Vec<u8> {
    with_address(prefix::USER_STAKE, owner)
}

pub fn tier_count() -> Vec<u8> {
    vec![prefix::TIER_COUNT]
}

pub fn lock(owner: &Address, kind_tag: u8, reference: &str) -> Vec<u8> {
    let mut k = with_address(prefix::LOCK, owner);
    k.push(kind_tag);
    k.push(0);
    k.extend_from_slice(reference.as_bytes());
    k
}

pub fn lock_scan_prefix(owner: &Address) -> Vec<u8> {
    with_address(prefix::LOCK, owner)
}

pub fn commitments(owner: &Address) -> Vec<u8> {
    with_address(prefix::COMMITMENTS, owner)
}

pub fn unbonding_request(owner: &Address) -> Vec<u8> {
    with_address(prefix::UNBONDING_REQUEST, owner)
}

pub fn unbonding_queue_entry(completion_time: u64, owner: &Address) -> Vec<u8> {
    let mut k = with_u64(prefix::UNBONDING_QUEUE, completion_time);
    k.extend_from_slice(owner.as_bytes());
    k
}

pub fn inheritance_unbonding(owner: &Address) -> Vec<u8> {
    with_address(prefix::INHERITANCE_UNBONDING, owner)
}

pub fn inheritance_queue_entry(completion_time: u64, owner: &Address) -> Vec<u8> {
    let mut k = with_u64(prefix::INHERITANCE_QUEUE, completion_time);
    k.extend_from_slice(owner.as_bytes());
    k
}

pub fn reputation_history(owner: &Address) -> Vec<u8> {
    with_address(prefix::REPUTATION_HISTORY, owner)
}

pub fn offense_counter(owner: &Address, reason_tag: u8) -> Vec<u8> {
    let mut k = with_address(prefix::OFFENSE_COUNTER, owner);
    k.push(reason_tag);
    k
}

pub fn proposal(id: u64) -> Vec<u8> {
    with_u64(prefix::PROPOSAL, id)
}

pub fn proposal_by_status(status_tag: u8, id: u64) -> Vec<u8> {
    let mut k = vec![prefix::PROPOSAL_BY_STATUS, status_tag];
    k.extend_from_slice(&id.to_be_bytes());
    k
}

pub fn proposal_by_status_scan(status_tag: u8) -> Vec<u8> {
    vec![prefix::PROPOSAL_BY_STATUS, status_tag]
}

pub fn proposal_by_submitter(owner: &Address, id: u64) -> Vec<u8> {
    let mut k = with_address(prefix::PROPOSAL_BY_SUBMITTER, owner);
    k.extend_from_slice(&id.to_be_bytes());
    k
}

pub fn proposal_by_submitter_scan(owner: &Address) -> Vec<u8> {
    with_address(prefix::PROPOSAL_BY_SUBMITTER, owner)
}

pub fn proposal_by_type(type_tag: u8, id: u64) -> Vec<u8> {
    let mut k = vec![prefix::PROPOSAL_BY_TYPE, type_tag];
    k.extend_from_slice(&id.to_be_bytes());
    k
}

pub fn proposal_by_type_scan(type_tag: u8) -> Vec<u8> {
    vec![prefix::PROPOSAL_BY_TYPE, type_tag]
}

pub fn proposal_by_company(company_id: u64, id: u64) -> Vec<u8> {
    let mut k = with_u64(prefix::PROPOSAL_BY_COMPANY, company_id);
    k.extend_from_slice(&id.to_be_bytes());
    k
}

pub fn proposal_by_company_scan(company_id: u64) -> Vec<u8> {
    with_u64(prefix::PROPOSAL_BY_COMPANY, company_id)
}

pub fn proposal_by_validator(validator: &Address, id: u64) -> Vec<u8> {
    let mut k = with_address(prefix::PROPOSAL_BY_VALIDATOR, validator);
    k.extend_from_slice(&id.to_be_bytes());
    k
}

pub fn proposal_by_validator_scan(validator: &Address) -> Vec<u8> {
    with_address(prefix::PROPOSAL_BY_VALIDATOR, validator)
}

pub fn emergency_by_type(type_tag: u8, id: u64) -> Vec<u8> {
    let mut k = vec![prefix::EMERGENCY_BY_TYPE, type_tag];
    k.extend_from_slice(&id.to_be_bytes());
    k
}

pub fn emergency_by_type_scan(type_tag: u8) -> Vec<u8> {
    vec![prefix::EMERGENCY_BY_TYPE, type_tag]
}

pub fn emergency_by_severity(severity: u8, id: u64) -> Vec<u8> {
    let mut k = vec![prefix::EMERGENCY_BY_SEVERITY, severity];
    k.extend_from_slice(&id.to_be_bytes());
    k
}

pub fn emergency_by_severity_scan(severity: u8) -> Vec<u8> {
    vec![prefix::EMERGENCY_BY_SEVERITY, severity]
}

pub fn deposit_end_queue_entry(deadline: u64, id: u64) -> Vec<u8> {
    let mut k = with_u64(prefix::DEPOSIT_END_QUEUE, deadline);
    k.extend_from_slice(&id.to_be_bytes());
    k
}

pub fn voting_end_queue_entry(deadline: u64, id: u64) -> Vec<u8> {
    let mut k = with_u64(prefix::VOTING_END_QUEUE, deadline);
    k.extend_from_slice(&id.to_be_bytes());
    k
}

pub fn vote(proposal_id: u64, voter: &Address) -> Vec<u8> {
    let mut k = with_u64(prefix::VOTE, proposal_id);
    k.extend_from_slice(voter.as_bytes());
    k
}

pub fn vote_scan(proposal_id: u64) -> Vec<u8> {
    with_u64(prefix::VOTE, proposal_id)
}

pub fn weighted_vote(proposal_id: u64, voter: &Address) -> Vec<u8> {
    let mut k = with_u64(prefix::WEIGHTED_VOTE, proposal_id);
    k.extend_from_slice(voter.as_bytes());
    k
}

pub fn weighted_vote_scan(proposal_id: u64) -> Vec<u8> {
    with_u64(prefix::WEIGHTED_VOTE, proposal_id)
}

pub fn deposit(proposal_id: u64, depositor: &Address) -> Vec<u8> {
    let mut k = with_u64(prefix::DEPOSIT, proposal_id);
    k.extend_from_slice(depositor.as_bytes());
    k
}

pub fn deposit_scan(proposal_id: u64) -> Vec<u8> {
    with_u64(prefix::DEPOSIT, proposal_id)
}

pub fn delegation(delegator: &Address, delegate: &Address) -> Vec<u8> {
    let mut k = with_address(prefix::DELEGATION, delegator);
    k.extend_from_slice(delegate.as_bytes());
    k
}

pub fn delegation_by_delegator_scan(delegator: &Address) -> Vec<u8> {
    with_address(prefix::DELEGATION, delegator)
}

pub fn delegation_by_delegate(delegate: &Address, delegator: &Address) -> Vec<u8> {
    let mut k = with_address(prefix::DELEGATION_BY_DELEGATE, delegate);
    k.extend_from_slice(delegator.as_bytes());
    k
}

pub fn delegation_by_delegate_scan(delegate: &Address) -> Vec<u8> {
    with_address(prefix::DELEGATION_BY_DELEGATE, delegate)
}

pub fn proposer_day_count(proposer: &Address, day_start: u64) -> Vec<u8> {
    let mut k = with_address(prefix::PROPOSER_DAY_COUNT, proposer);
    k.extend_from_slice(&day_start.to_be_bytes());
    k
}

pub fn proposer_last_submit(proposer: &Address) -> Vec<u8> {
    with_address(prefix::PROPOSER_LAST_SUBMIT, proposer)
}

pub fn params() -> Vec<u8> {
    vec![prefix::PARAMS]
}

/// Monotonic proposal-id counter (spec §4.6 "allocates a new monotonic
/// proposal id"). One record for the whole chain.
pub fn next_proposal_id() -> Vec<u8> {
    vec![prefix::NEXT_PROPOSAL_ID]
}

/// Builds an inclusive `[prefix, prefix || 0xff*8]` bound pair so a
/// time-queue scan up to `deadline` can use `KvStore::range_iterate`.
pub fn time_queue_bound(queue_prefix: u8, deadline: u64) -> (Vec<u8>, Vec<u8>) {
    let lower = vec![queue_prefix];
    let mut upper = with_u64(queue_prefix, deadline);
    upper.extend_from_slice(&[0xff; 32]);
    (lower, upper)
}
