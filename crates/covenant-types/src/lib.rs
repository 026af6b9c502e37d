//! Shared primitives used across the staking and governance engines:
//! the address newtype, the crate-wide error taxonomy, and basis-point
//! arithmetic helpers.

mod address;
mod bps;
mod error;

pub use address::Address;
pub use bps::{bps_of, BPS_DENOMINATOR};
pub use error::{CoreError, LockKind};
