//! Deterministic record encode/decode (component C2).
//!
//! Every record persisted through `KvStore` uses Borsh, matching the
//! corpus's on-chain account encoding. State roots derive from committed
//! bytes, so encoding must be deterministic — Borsh's fixed field order and
//! this crate's ban on floats in persisted records (ratios are basis
//! points, `covenant_types::bps_of`) both serve that property.

use borsh::{BorshDeserialize, BorshSerialize};

use covenant_types::CoreError;

pub fn encode<T: BorshSerialize>(value: &T) -> Vec<u8> {
    borsh::to_vec(value).expect("borsh encoding of a persisted record must not fail")
}

pub fn decode<T: BorshDeserialize>(bytes: &[u8]) -> Result<T, CoreError> {
    T::try_from_slice(bytes).map_err(|e| CoreError::Store(format!("corrupt record: {e}")))
}
