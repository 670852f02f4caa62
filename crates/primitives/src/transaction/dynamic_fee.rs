//! EIP-1559 dynamic-fee transaction payload.

use crate::signature::SignatureValues;
use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Bytes, TxKind, U256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};

/// EIP-1559 transaction type byte.
pub const DYNAMIC_FEE_TX_TYPE_ID: u8 = 0x02;

/// A transaction paying a capped priority fee on top of the block base fee.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TxDynamicFee {
    /// Chain the transaction is valid on.
    pub chain_id: U256,
    /// Number of transactions sent by the sender before this one.
    pub nonce: u64,
    /// Maximum priority fee per gas, the tip cap.
    pub max_priority_fee_per_gas: u128,
    /// Maximum total fee per gas, the fee cap.
    pub max_fee_per_gas: u128,
    /// Maximum gas this transaction may consume.
    pub gas_limit: u64,
    /// Message call recipient, or [`TxKind::Create`].
    pub to: TxKind,
    /// Wei transferred to the recipient.
    pub value: U256,
    /// Call data or init code.
    pub input: Bytes,
    /// Addresses and storage keys warmed before execution.
    pub access_list: AccessList,
    /// Signature parity, `0` or `1`.
    pub v: U256,
    /// Signature `r`.
    pub r: U256,
    /// Signature `s`.
    pub s: U256,
}

impl TxDynamicFee {
    /// Returns the raw signature values.
    pub const fn signature_values(&self) -> SignatureValues {
        SignatureValues::new(self.r, self.s, self.v)
    }

    /// Sets the chain id and signature values.
    pub const fn set_signature_values(&mut self, chain_id: U256, values: SignatureValues) {
        self.chain_id = chain_id;
        self.v = values.v;
        self.r = values.r;
        self.s = values.s;
    }

    /// Outputs the length of the transaction's fields.
    #[doc(hidden)]
    pub fn fields_len(&self) -> usize {
        self.chain_id.length()
            + self.nonce.length()
            + self.max_priority_fee_per_gas.length()
            + self.max_fee_per_gas.length()
            + self.gas_limit.length()
            + self.to.length()
            + self.value.length()
            + self.input.length()
            + self.access_list.length()
            + self.v.length()
            + self.r.length()
            + self.s.length()
    }

    /// Encode the transaction fields (without the RLP header).
    pub fn encode_fields(&self, out: &mut dyn BufMut) {
        self.chain_id.encode(out);
        self.nonce.encode(out);
        self.max_priority_fee_per_gas.encode(out);
        self.max_fee_per_gas.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.input.encode(out);
        self.access_list.encode(out);
        self.v.encode(out);
        self.r.encode(out);
        self.s.encode(out);
    }

    /// Decode the transaction fields (without the RLP header).
    pub fn decode_fields(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Ok(Self {
            chain_id: Decodable::decode(buf)?,
            nonce: Decodable::decode(buf)?,
            max_priority_fee_per_gas: Decodable::decode(buf)?,
            max_fee_per_gas: Decodable::decode(buf)?,
            gas_limit: Decodable::decode(buf)?,
            to: Decodable::decode(buf)?,
            value: Decodable::decode(buf)?,
            input: Decodable::decode(buf)?,
            access_list: Decodable::decode(buf)?,
            v: Decodable::decode(buf)?,
            r: Decodable::decode(buf)?,
            s: Decodable::decode(buf)?,
        })
    }
}

impl Encodable for TxDynamicFee {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.fields_len() }.encode(out);
        self.encode_fields(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.fields_len();
        Header { list: true, payload_length }.length() + payload_length
    }
}

impl Decodable for TxDynamicFee {
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
