//! mevbuild primitive types
//!
//! This crate provides the data model consumed by the ordering core: typed
//! transactions with their canonical encoding, fee and signature rules, and the
//! bundle types produced by simulation.
//!
//! # Transaction Types
//!
//! - [`TxLegacy`]: legacy transactions (type `0x00`), optionally EIP-155 protected
//! - [`TxAccessList`]: EIP-2930 transactions (type `0x01`)
//! - [`TxDynamicFee`]: EIP-1559 transactions (type `0x02`)
//! - [`Transaction`]: an immutable transaction with first-seen time and memoized hash,
//!   size and sender
//!
//! # Bundle Types
//!
//! - [`MevBundle`]: an atomic transaction group with a derived uuid
//! - [`SimulatedBundle`] and [`SimSBundle`]: simulation outcomes priced for ordering
//!
//! Sender recovery is supplied by the caller through the [`Signer`] trait.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod bundle;
pub mod error;
pub mod fee;
pub mod signature;
pub mod signer;
pub mod transaction;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use bundle::{LatestUuidBundle, MevBundle, SimSBundle, SimulatedBundle};
pub use error::{FeeError, TransactionError};
pub use fee::{effective_gas_tip, effective_gas_tip_value};
pub use signature::SignatureValues;
pub use signer::{Signer, recover_sender};
pub use transaction::{
    Transaction, TxAccessList, TxDynamicFee, TxLegacy, TxType, TypedTransaction,
    encode_index, hash_difference, sort_by_nonce, tx_difference,
};
