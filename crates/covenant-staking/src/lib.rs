//! Universal Staking Engine: Stake Ledger, Lock & Commitment Ledger,
//! Unbonding Queue, Reputation Engine, Reward/Epoch Engine, and the
//! inheritance-unbond bridge (components C4-C8, C14).
//!
//! `StakeEngine` is the borrowed-context handle every operation runs
//! through; `covenant-runtime` constructs one per message from the host's
//! store/bank/event-bus and the current `StakingParams`.

mod engine;
mod hooks;
mod ledger;
mod locks;
mod message;
mod queries;
mod reputation;
mod reward;
mod state;
mod unbonding;

pub use engine::StakeEngine;
pub use hooks::{HookRegistry, StakeHooks};
pub use message::{dispatch, StakeMsg, StakeMsgResponse};
pub use queries::{
    can_borrow, can_commit, can_lend, can_moderate, can_moderate_large_disputes, can_slash_moderators, can_submit_listing,
    can_unstake, can_unstake_amount, can_verify_business, get_active_locks, get_all_tier_stats, get_available_stake,
    get_inheritance_unbonding, get_pending_rewards, get_tier_stats, get_total_rewards_claimed, get_total_staked,
    get_total_weight, get_unbonding_request, get_user_commitments, get_user_stake_query, get_user_tier, has_minimum_tier,
};
pub use state::{
    lock_kind_tag, CommitmentKind, InheritanceUnbonding, Lock, OffenseCounter, ReputationHistory, ReputationRecord,
    StakeCommitment, TierCount, UnbondingRequest, UserStake, UserStakeCommitments,
};
