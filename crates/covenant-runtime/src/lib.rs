//! Runtime wiring: the single `Message` envelope over `covenant-staking`'s
//! `StakeMsg` and `covenant-governance`'s `GovMsg` (spec §6.1), the
//! `ParamRegistry` both engines' `UpdateParams` paths write into, genesis
//! load (spec §6.6), and `run_end_of_block` (spec §4.3/§4.7).
//!
//! This is the crate a host binds to: construct a `KvStore`/`Bank`/
//! `EventBus`/`HookRegistry`, call [`genesis::init_genesis`] once, then call
//! [`message::dispatch_message`] per transaction and [`sweep::run_end_of_block`]
//! once per block, in that order, the way the teacher's top-level
//! `process_instruction` entry point and its `declare_process_instruction!`
//! dispatch macro are the single thing a Solana runtime host calls into.

mod genesis;
mod message;
mod params_patch;
mod sweep;

pub use genesis::{init_genesis, GenesisProposal, GenesisState};
pub use message::{dispatch_message, Message, MessageResponse, ParamRegistry};
pub use sweep::{run_end_of_block, SweepReport};
