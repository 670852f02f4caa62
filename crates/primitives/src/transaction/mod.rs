//! Transaction types.

pub mod access_list;
pub mod dynamic_fee;
pub mod envelope;
pub mod legacy;
pub mod signed;

pub use access_list::{ACCESS_LIST_TX_TYPE_ID, TxAccessList};
pub use dynamic_fee::{DYNAMIC_FEE_TX_TYPE_ID, TxDynamicFee};
pub use envelope::{LEGACY_TX_TYPE_ID, TxType, TypedTransaction};
pub use legacy::TxLegacy;
pub use signed::{Transaction, encode_index, hash_difference, sort_by_nonce, tx_difference};
