//! Crate-wide error taxonomy.
//!
//! Every state-mutating path returns `Result<T, CoreError>`. Handlers never
//! panic on user input; a panic here means an invariant was violated and the
//! block must halt rather than continue on corrupted state.

use thiserror::Error;

use crate::Address;

/// Non-commitment lock kinds that can block a full unbond. Carried on
/// `CoreError::StakeLocked` so the caller learns which obligation is open
/// without having to re-query the lock ledger.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    #[error("active company listing")]
    ActiveCompanyListing,
    #[error("pending listing")]
    PendingListing,
    #[error("active loan")]
    ActiveLoan,
    #[error("active dispute")]
    ActiveDispute,
    #[error("pending governance vote")]
    PendingVote,
    #[error("account banned")]
    UserBanned,
    #[error("active validator role")]
    ActiveValidator,
    #[error("active moderator role")]
    ActiveModerator,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid address")]
    InvalidAddress,

    #[error("proposal {0} not found")]
    ProposalNotFound(u64),

    #[error("invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("invalid proposal status for this operation")]
    InvalidProposalStatus,

    #[error("proposal is closed")]
    ProposalClosed,

    #[error("voter has already voted on this proposal")]
    AlreadyVoted,

    #[error("invalid vote option")]
    InvalidVoteOption,

    #[error("voting period has ended")]
    VotingPeriodEnded,

    #[error("insufficient voting power")]
    InsufficientVotingPower,

    #[error("invalid deposit")]
    InvalidDeposit,

    #[error("deposit period has ended")]
    DepositPeriodEnded,

    #[error("invalid governance parameters: {0}")]
    InvalidGovernanceParams(String),

    #[error("quorum not reached")]
    QuorumNotReached,

    #[error("approval threshold not met")]
    ThresholdNotMet,

    #[error("veto threshold exceeded")]
    VetoThresholdExceeded,

    #[error("proposal execution failed: {0}")]
    ProposalExecutionFailed(String),

    #[error("stake not found for {0:?}")]
    StakeNotFound(Address),

    #[error("amount is below the minimum stake")]
    BelowMinimumStake,

    #[error("invalid amount")]
    InvalidAmount,

    #[error("an unbonding request is already in progress")]
    UnbondingInProgress,

    #[error("unbonding period has not elapsed")]
    UnbondingNotComplete,

    #[error("no unbonding request is in progress")]
    NoUnbondingInProgress,

    #[error("lock not found")]
    LockNotFound,

    #[error("stake is locked: {0}")]
    StakeLocked(LockKind),

    #[error("commitment would exceed the trust ceiling")]
    ExceedsTrustCeiling,

    #[error("insufficient available (uncommitted) stake")]
    InsufficientAvailable,

    #[error("invalid commitment kind")]
    InvalidLockType,

    #[error("no rewards to claim")]
    NoRewardsToClaim,

    #[error("circular delegation detected")]
    CircularDelegation,

    #[error("delegation not found")]
    DelegationNotFound,

    #[error("emergency minimum voter tier not met")]
    EmergencyThresholdNotMet,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("store error: {0}")]
    Store(String),

    #[error("bank error: {0}")]
    Bank(String),

    #[error("invalid genesis state: {0}")]
    InvalidGenesis(String),
}
