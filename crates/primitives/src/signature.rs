//! Signature value checks for transaction `v`, `r`, `s` triples.
//!
//! Legacy transactions may carry EIP-155 replay protection folded into `v`
//! (`v = parity + 35 + 2 * chain_id`); typed transactions carry the bare parity.

use crate::TransactionError;
use alloy_primitives::{U256, uint};

/// Order of the secp256k1 curve.
pub const SECP256K1_N: U256 =
    uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

/// Half the order of the secp256k1 curve, the upper bound for `s` after Homestead.
pub const SECP256K1_HALF_N: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// Raw signature values in the form stored on a transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SignatureValues {
    /// The `r` value.
    pub r: U256,
    /// The `s` value.
    pub s: U256,
    /// The recovery value, possibly carrying EIP-155 protection.
    pub v: U256,
}

impl SignatureValues {
    /// Creates a new set of signature values.
    pub const fn new(r: U256, s: U256, v: U256) -> Self {
        Self { r, s, v }
    }
}

/// Splits a 65 byte `[R || S || V]` signature, `V` being the bare parity.
pub fn split_signature(sig: &[u8]) -> Result<SignatureValues, TransactionError> {
    if sig.len() != 65 {
        return Err(TransactionError::InvalidSignatureLength { len: sig.len() });
    }
    Ok(SignatureValues {
        r: U256::from_be_slice(&sig[..32]),
        s: U256::from_be_slice(&sig[32..64]),
        v: U256::from(sig[64]),
    })
}

/// Returns whether `v` encodes EIP-155 replay protection.
pub fn is_protected_v(v: U256) -> bool {
    if v.bit_len() <= 8 {
        let v = v.to::<u64>();
        return v != 27 && v != 28 && v != 1 && v != 0;
    }
    // anything wider than a byte is protected
    true
}

/// Derives the chain id from a legacy `v` value.
///
/// Unprotected values (27, 28) yield zero.
pub fn derive_chain_id(v: U256) -> U256 {
    if v.bit_len() <= 64 {
        let v = v.to::<u64>();
        if v == 27 || v == 28 {
            return U256::ZERO;
        }
        return U256::from(v.wrapping_sub(35) / 2);
    }
    v.wrapping_sub(U256::from(35)) / U256::from(2)
}

/// Checks `r`, `s` and the recovery parity against the curve ranges.
///
/// With `homestead` set, `s` must also lie in the lower half of the curve order.
pub fn validate_signature_values(v: u8, r: U256, s: U256, homestead: bool) -> bool {
    if r < U256::from(1) || s < U256::from(1) {
        return false;
    }
    if homestead && s > SECP256K1_HALF_N {
        return false;
    }
    r < SECP256K1_N && s < SECP256K1_N && (v == 0 || v == 1)
}

/// Validates a raw `v`, `r`, `s` triple.
///
/// `maybe_protected` states whether the caller accepts an EIP-155 `v`. Protected values
/// are reduced to their parity before the range check; unprotected ones are taken as
/// `27`/`28` when protection was possible, or as the bare parity otherwise.
pub fn sanity_check_signature(
    v: U256,
    r: U256,
    s: U256,
    maybe_protected: bool,
) -> Result<(), TransactionError> {
    let protected = is_protected_v(v);
    if protected && !maybe_protected {
        return Err(TransactionError::UnexpectedProtection);
    }

    let plain_v = if protected {
        let chain_id = derive_chain_id(v);
        v.wrapping_sub(U256::from(35)).wrapping_sub(chain_id.wrapping_mul(U256::from(2))).byte(0)
    } else if maybe_protected {
        v.wrapping_sub(U256::from(27)).byte(0)
    } else {
        v.byte(0)
    };

    if !validate_signature_values(plain_v, r, s, false) {
        return Err(TransactionError::InvalidSignature);
    }
    Ok(())
}
