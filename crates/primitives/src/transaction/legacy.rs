//! Legacy (pre EIP-2718) transaction payload.

use crate::signature::{SignatureValues, derive_chain_id, is_protected_v};
use alloy_primitives::{Bytes, TxKind, U256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};

/// A legacy transaction, optionally replay protected through EIP-155.
///
/// The chain id is not stored: it is folded into `v` and derived on demand.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TxLegacy {
    /// Number of transactions sent by the sender before this one.
    pub nonce: u64,
    /// Wei paid per unit of gas.
    pub gas_price: u128,
    /// Maximum gas this transaction may consume.
    pub gas_limit: u64,
    /// Message call recipient, or [`TxKind::Create`].
    pub to: TxKind,
    /// Wei transferred to the recipient.
    pub value: U256,
    /// Call data or init code.
    pub input: Bytes,
    /// Recovery value, `27`/`28` or `parity + 35 + 2 * chain_id`.
    pub v: U256,
    /// Signature `r`.
    pub r: U256,
    /// Signature `s`.
    pub s: U256,
}

impl TxLegacy {
    /// Returns the chain id encoded in `v`, zero when unprotected.
    pub fn chain_id(&self) -> U256 {
        derive_chain_id(self.v)
    }

    /// Returns whether `v` carries EIP-155 replay protection.
    pub fn is_protected(&self) -> bool {
        is_protected_v(self.v)
    }

    /// Returns the raw signature values.
    pub const fn signature_values(&self) -> SignatureValues {
        SignatureValues::new(self.r, self.s, self.v)
    }

    /// Sets the signature values. The chain id is expected to be folded into `v` already.
    pub const fn set_signature_values(&mut self, values: SignatureValues) {
        self.v = values.v;
        self.r = values.r;
        self.s = values.s;
    }

    /// Outputs the length of the transaction's fields.
    #[doc(hidden)]
    pub fn fields_len(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to.length()
            + self.value.length()
            + self.input.length()
            + self.v.length()
            + self.r.length()
            + self.s.length()
    }

    /// Encode the transaction fields (without the RLP header).
    pub fn encode_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.input.encode(out);
        self.v.encode(out);
        self.r.encode(out);
        self.s.encode(out);
    }

    /// Decode the transaction fields (without the RLP header).
    pub fn decode_fields(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Ok(Self {
            nonce: Decodable::decode(buf)?,
            gas_price: Decodable::decode(buf)?,
            gas_limit: Decodable::decode(buf)?,
            to: Decodable::decode(buf)?,
            value: Decodable::decode(buf)?,
            input: Decodable::decode(buf)?,
            v: Decodable::decode(buf)?,
            r: Decodable::decode(buf)?,
            s: Decodable::decode(buf)?,
        })
    }
}

impl Encodable for TxLegacy {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.fields_len() }.encode(out);
        self.encode_fields(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.fields_len();
        Header { list: true, payload_length }.length() + payload_length
    }
}

impl Decodable for TxLegacy {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }

        let remaining = buf.len();
        if header.payload_length > remaining {
            return Err(alloy_rlp::Error::InputTooShort);
        }

        let tx = Self::decode_fields(buf)?;

        if buf.len() + header.payload_length != remaining {
            return Err(alloy_rlp::Error::UnexpectedLength);
        }
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn sample() -> TxLegacy {
        TxLegacy {
            nonce: 7,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: TxKind::Call(address!("0x3535353535353535353535353535353535353535")),
            value: U256::from(1_000_000_000_000_000_000u128),
            input: Bytes::new(),
            v: U256::from(37),
            r: U256::from(1),
            s: U256::from(2),
        }
    }

    #[test]
    fn test_legacy_chain_id_from_v() {
        let tx = sample();
        assert!(tx.is_protected());
        assert_eq!(tx.chain_id(), U256::from(1));

        let unprotected = TxLegacy { v: U256::from(27), ..sample() };
        assert!(!unprotected.is_protected());
        assert_eq!(unprotected.chain_id(), U256::ZERO);
    }

    #[test]
    fn test_legacy_rlp_roundtrip() {
        let tx = sample();
        let mut buf = Vec::new();
        tx.encode(&mut buf);
        assert_eq!(buf.len(), tx.length());

        let decoded = TxLegacy::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_legacy_decode_rejects_string() {
        let mut buf = Vec::new();
        Bytes::from_static(&[1, 2, 3]).encode(&mut buf);
        assert_eq!(
            TxLegacy::decode(&mut buf.as_slice()),
            Err(alloy_rlp::Error::UnexpectedString)
        );
    }

    #[test]
    fn test_legacy_decode_rejects_truncated() {
        let mut buf = Vec::new();
        sample().encode(&mut buf);
        buf.truncate(buf.len() - 3);
        assert!(TxLegacy::decode(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn test_legacy_create_roundtrip() {
        let tx = TxLegacy {
            to: TxKind::Create,
            input: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]),
            ..sample()
        };
        let mut buf = Vec::new();
        tx.encode(&mut buf);
        let decoded = TxLegacy::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded.to, TxKind::Create);
        assert_eq!(decoded.input, tx.input);
    }
}
