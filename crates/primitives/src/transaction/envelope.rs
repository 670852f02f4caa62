use alloy_eips::{Typed2718, eip2718::Encodable2718, eip2930::AccessList};
use alloy_primitives::{Bytes, TxKind, U256};
use alloy_rlp::{BufMut, Decodable, Header};
use core::fmt;

use crate::{
    TransactionError,
    signature::SignatureValues,
    transaction::{
        ACCESS_LIST_TX_TYPE_ID, DYNAMIC_FEE_TX_TYPE_ID, TxAccessList, TxDynamicFee, TxLegacy,
    },
};

/// Legacy transaction type byte.
pub const LEGACY_TX_TYPE_ID: u8 = 0x00;

/// Supported transaction types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TxType {
    /// Legacy transaction (type 0x00)
    #[default]
    Legacy = LEGACY_TX_TYPE_ID,
    /// EIP-2930 access list transaction (type 0x01)
    AccessList = ACCESS_LIST_TX_TYPE_ID,
    /// EIP-1559 dynamic fee transaction (type 0x02)
    DynamicFee = DYNAMIC_FEE_TX_TYPE_ID,
}

impl TxType {
    /// Returns `true` if this is a legacy transaction.
    pub const fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy)
    }
}

impl TryFrom<u8> for TxType {
    type Error = TransactionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            LEGACY_TX_TYPE_ID => Ok(Self::Legacy),
            ACCESS_LIST_TX_TYPE_ID => Ok(Self::AccessList),
            DYNAMIC_FEE_TX_TYPE_ID => Ok(Self::DynamicFee),
            _ => Err(TransactionError::TxTypeNotSupported),
        }
    }
}

impl From<TxType> for u8 {
    fn from(ty: TxType) -> Self {
        ty as Self
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::AccessList => f.write_str("access-list"),
            Self::DynamicFee => f.write_str("dynamic-fee"),
        }
    }
}

/// The consensus payload of a transaction, one variant per [`TxType`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypedTransaction {
    /// Legacy transaction (type 0x00)
    Legacy(TxLegacy),
    /// EIP-2930 access list transaction (type 0x01)
    AccessList(TxAccessList),
    /// EIP-1559 dynamic fee transaction (type 0x02)
    DynamicFee(TxDynamicFee),
}

impl TypedTransaction {
    /// Return the [`TxType`] of the inner txn.
    pub const fn tx_type(&self) -> TxType {
        match self {
            Self::Legacy(_) => TxType::Legacy,
            Self::AccessList(_) => TxType::AccessList,
            Self::DynamicFee(_) => TxType::DynamicFee,
        }
    }

    /// Chain id, derived from `v` for legacy transactions.
    pub fn chain_id(&self) -> U256 {
        match self {
            Self::Legacy(tx) => tx.chain_id(),
            Self::AccessList(tx) => tx.chain_id,
            Self::DynamicFee(tx) => tx.chain_id,
        }
    }

    pub const fn nonce(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.nonce,
            Self::AccessList(tx) => tx.nonce,
            Self::DynamicFee(tx) => tx.nonce,
        }
    }

    pub const fn gas_limit(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.gas_limit,
            Self::AccessList(tx) => tx.gas_limit,
            Self::DynamicFee(tx) => tx.gas_limit,
        }
    }

    /// Gas price. Dynamic-fee transactions report their fee cap.
    pub const fn gas_price(&self) -> u128 {
        match self {
            Self::Legacy(tx) => tx.gas_price,
            Self::AccessList(tx) => tx.gas_price,
            Self::DynamicFee(tx) => tx.max_fee_per_gas,
        }
    }

    /// Maximum priority fee per gas.
    pub const fn gas_tip_cap(&self) -> u128 {
        match self {
            Self::Legacy(tx) => tx.gas_price,
            Self::AccessList(tx) => tx.gas_price,
            Self::DynamicFee(tx) => tx.max_priority_fee_per_gas,
        }
    }

    /// Maximum total fee per gas.
    pub const fn gas_fee_cap(&self) -> u128 {
        match self {
            Self::Legacy(tx) => tx.gas_price,
            Self::AccessList(tx) => tx.gas_price,
            Self::DynamicFee(tx) => tx.max_fee_per_gas,
        }
    }

    pub const fn value(&self) -> U256 {
        match self {
            Self::Legacy(tx) => tx.value,
            Self::AccessList(tx) => tx.value,
            Self::DynamicFee(tx) => tx.value,
        }
    }

    pub const fn kind(&self) -> TxKind {
        match self {
            Self::Legacy(tx) => tx.to,
            Self::AccessList(tx) => tx.to,
            Self::DynamicFee(tx) => tx.to,
        }
    }

    pub const fn input(&self) -> &Bytes {
        match self {
            Self::Legacy(tx) => &tx.input,
            Self::AccessList(tx) => &tx.input,
            Self::DynamicFee(tx) => &tx.input,
        }
    }

    /// Access list, `None` for legacy transactions.
    pub const fn access_list(&self) -> Option<&AccessList> {
        match self {
            Self::Legacy(_) => None,
            Self::AccessList(tx) => Some(&tx.access_list),
            Self::DynamicFee(tx) => Some(&tx.access_list),
        }
    }

    pub const fn signature_values(&self) -> SignatureValues {
        match self {
            Self::Legacy(tx) => tx.signature_values(),
            Self::AccessList(tx) => tx.signature_values(),
            Self::DynamicFee(tx) => tx.signature_values(),
        }
    }

    /// Sets the signature values. Legacy transactions ignore `chain_id`, which is
    /// expected to be folded into `v` by the signer.
    pub const fn set_signature_values(&mut self, chain_id: U256, values: SignatureValues) {
        match self {
            Self::Legacy(tx) => tx.set_signature_values(values),
            Self::AccessList(tx) => tx.set_signature_values(chain_id, values),
            Self::DynamicFee(tx) => tx.set_signature_values(chain_id, values),
        }
    }

    /// Outputs the length of the inner fields.
    #[doc(hidden)]
    pub fn fields_len(&self) -> usize {
        match self {
            Self::Legacy(tx) => tx.fields_len(),
            Self::AccessList(tx) => tx.fields_len(),
            Self::DynamicFee(tx) => tx.fields_len(),
        }
    }

    /// Encode the inner fields (without the RLP header or type byte).
    pub fn encode_fields(&self, out: &mut dyn BufMut) {
        match self {
            Self::Legacy(tx) => tx.encode_fields(out),
            Self::AccessList(tx) => tx.encode_fields(out),
            Self::DynamicFee(tx) => tx.encode_fields(out),
        }
    }

    /// Decodes the canonical encoding: an RLP list for legacy transactions, otherwise
    /// `type || rlp(fields)`.
    ///
    /// The whole input must be consumed.
    pub fn decode_2718(bytes: &[u8]) -> Result<Self, TransactionError> {
        match bytes.first() {
            Some(&first) if first > 0x7f => {
                let mut buf = bytes;
                let tx = TxLegacy::decode(&mut buf)?;
                if !buf.is_empty() {
                    return Err(alloy_rlp::Error::UnexpectedLength.into());
                }
                Ok(Self::Legacy(tx))
            }
            _ => Self::decode_typed(bytes),
        }
    }

    /// Decodes a typed envelope, `type || rlp(fields)`.
    pub fn decode_typed(bytes: &[u8]) -> Result<Self, TransactionError> {
        let [ty, payload @ ..] = bytes else {
            return Err(TransactionError::ShortTypedTransaction);
        };
        if payload.is_empty() {
            return Err(TransactionError::ShortTypedTransaction);
        }

        let mut buf = payload;
        let tx = match TxType::try_from(*ty)? {
            TxType::AccessList => Self::AccessList(TxAccessList::decode(&mut buf)?),
            TxType::DynamicFee => Self::DynamicFee(TxDynamicFee::decode(&mut buf)?),
            // legacy transactions never travel in a typed envelope
            TxType::Legacy => return Err(TransactionError::TxTypeNotSupported),
        };
        if !buf.is_empty() {
            return Err(alloy_rlp::Error::UnexpectedLength.into());
        }
        Ok(tx)
    }
}

impl From<TxLegacy> for TypedTransaction {
    fn from(tx: TxLegacy) -> Self {
        Self::Legacy(tx)
    }
}

impl From<TxAccessList> for TypedTransaction {
    fn from(tx: TxAccessList) -> Self {
        Self::AccessList(tx)
    }
}

impl From<TxDynamicFee> for TypedTransaction {
    fn from(tx: TxDynamicFee) -> Self {
        Self::DynamicFee(tx)
    }
}

impl Typed2718 for TypedTransaction {
    fn ty(&self) -> u8 {
        self.tx_type().into()
    }
}

impl Encodable2718 for TypedTransaction {
    fn type_flag(&self) -> Option<u8> {
        match self.tx_type() {
            TxType::Legacy => None,
            ty => Some(ty.into()),
        }
    }

    fn encode_2718_len(&self) -> usize {
        let payload_length = self.fields_len();
        let list_len = Header { list: true, payload_length }.length() + payload_length;
        if self.tx_type().is_legacy() { list_len } else { 1 + list_len }
    }

    fn encode_2718(&self, out: &mut dyn BufMut) {
        if let Some(ty) = self.type_flag() {
            out.put_u8(ty);
        }
        Header { list: true, payload_length: self.fields_len() }.encode(out);
        self.encode_fields(out);
    }
}
