//! Error types for transaction decoding, signature handling and fee computation.

use alloy_primitives::I256;

/// Errors produced by the transaction model.
///
/// Codec and signature errors are always returned to the caller; nothing in this crate
/// swallows them.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// The `v`, `r`, `s` values are outside the secp256k1 ranges.
    #[error("invalid transaction v, r, s values")]
    InvalidSignature,

    /// A replay-protected `v` value was found where none is allowed.
    #[error("transaction type does not support EIP-155 protected signatures")]
    UnexpectedProtection,

    /// The transaction type cannot be handled by this signer or call site.
    #[error("transaction type not valid in this context")]
    TxTypeNotValid,

    /// The leading type byte does not name a known transaction type.
    #[error("transaction type not supported")]
    TxTypeNotSupported,

    /// A typed envelope carried no payload after the type byte.
    #[error("typed transaction too short")]
    ShortTypedTransaction,

    /// A raw signature did not have the `[R || S || V]` layout.
    #[error("wrong size for signature: got {len}, want 65")]
    InvalidSignatureLength {
        /// Length of the rejected signature.
        len: usize,
    },

    /// The RLP payload was malformed.
    #[error("failed to decode transaction: {0}")]
    Rlp(#[from] alloy_rlp::Error),
}

impl From<TransactionError> for alloy_rlp::Error {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Rlp(err) => err,
            TransactionError::InvalidSignature => Self::Custom("invalid transaction v, r, s values"),
            TransactionError::UnexpectedProtection => {
                Self::Custom("transaction type does not support EIP-155 protected signatures")
            }
            TransactionError::TxTypeNotValid => Self::Custom("transaction type not valid in this context"),
            TransactionError::TxTypeNotSupported => Self::Custom("transaction type not supported"),
            TransactionError::ShortTypedTransaction => Self::Custom("typed transaction too short"),
            TransactionError::InvalidSignatureLength { .. } => Self::Custom("wrong size for signature"),
        }
    }
}

/// Fee computation failures.
///
/// These are not fatal: the computed value travels with the error so the caller can
/// decide between excluding the transaction and aborting.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum FeeError {
    /// The fee cap does not cover the base fee.
    #[error("fee cap {fee_cap} less than base fee {base_fee}")]
    FeeCapTooLow {
        /// Maximum fee per gas the sender is willing to pay.
        fee_cap: u128,
        /// Base fee of the target block.
        base_fee: u64,
        /// The effective tip, negative whenever this error is raised.
        tip: I256,
    },
}

impl FeeError {
    /// Returns the effective tip computed alongside the error.
    pub const fn tip(&self) -> I256 {
        match self {
            Self::FeeCapTooLow { tip, .. } => *tip,
        }
    }
}
