//! Governance Engine: Proposal Store, Voting & Tally, Delegation resolution,
//! Anti-spam gate, and the Governance Lifecycle end-of-block sweep
//! (components C9-C11).
//!
//! `GovernanceEngine` is the borrowed-context handle every operation runs
//! through; `covenant-runtime` constructs one per message (or per
//! end-of-block pass) from the host's store/bank/event-bus and the current
//! `GovernanceParams`/`StakingParams`.

mod antispam;
mod delegation;
mod engine;
mod lifecycle;
mod message;
mod proposal;
mod state;
mod voting;

pub use delegation::{get_delegation_query, iterate_by_delegate, iterate_by_delegator};
pub use engine::GovernanceEngine;
pub use lifecycle::ExecutionEffect;
pub use message::{dispatch, GovMsg, GovMsgResponse};
pub use proposal::{
    get_proposal_query, get_tally_result_query, iterate_proposals_by_company, iterate_proposals_by_status,
    iterate_proposals_by_submitter, iterate_proposals_by_type, iterate_proposals_by_validator,
};
pub use state::{
    emergency_type_tag, proposal_status_tag, proposal_type_tag, Deposit, EmergencyAnnotation, EmergencyType, Proposal,
    ProposalStatus, ProposalType, TallyCounters, Vote, VoteDelegation, VoteOption, WeightedVote,
};
pub use voting::{decide_outcome, get_vote_query, get_weighted_vote_query, recompute_tally, Outcome};
