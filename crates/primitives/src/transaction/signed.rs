use alloy_eips::{Typed2718, eip2718::Encodable2718, eip2930::AccessList};
use alloy_primitives::{Address, B256, Bytes, I256, TxKind, U256, keccak256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};
use std::{
    cmp::Ordering,
    collections::HashSet,
    sync::{Arc, OnceLock},
    time::SystemTime,
};

use crate::{
    FeeError, Signer, TransactionError,
    fee::{effective_gas_tip, effective_gas_tip_value},
    signature::{SignatureValues, sanity_check_signature},
    transaction::{TxType, TypedTransaction},
};

/// Sender recovered under a specific chain id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CachedSender {
    chain_id: U256,
    from: Address,
}

/// An immutable transaction together with its first-seen time and lazily computed
/// hash, encoded size and sender.
///
/// Equality only considers the payload.
#[derive(Clone, Debug)]
pub struct Transaction {
    inner: TypedTransaction,
    time: SystemTime,
    hash: OnceLock<B256>,
    size: OnceLock<usize>,
    sender: OnceLock<CachedSender>,
}

impl Transaction {
    /// Creates a new transaction first seen now.
    pub fn new(inner: impl Into<TypedTransaction>) -> Self {
        Self::new_at(inner.into(), SystemTime::now())
    }

    fn new_at(inner: TypedTransaction, time: SystemTime) -> Self {
        Self {
            inner,
            time,
            hash: OnceLock::new(),
            size: OnceLock::new(),
            sender: OnceLock::new(),
        }
    }

    fn decoded(inner: TypedTransaction, size: usize) -> Self {
        let tx = Self::new_at(inner, SystemTime::now());
        if size > 0 {
            let _ = tx.size.set(size);
        }
        tx
    }

    /// Replaces the first-seen time.
    pub fn with_time(mut self, time: SystemTime) -> Self {
        self.time = time;
        self
    }

    /// Decodes the canonical binary encoding.
    ///
    /// A first byte above `0x7f` starts a legacy RLP list, anything else is a typed
    /// envelope.
    pub fn decode_2718(bytes: &[u8]) -> Result<Self, TransactionError> {
        let inner = TypedTransaction::decode_2718(bytes)?;
        Ok(Self::decoded(inner, bytes.len()))
    }

    /// Decodes the block body form: a legacy list, or a typed envelope wrapped in an
    /// RLP byte string.
    pub fn decode_rlp(buf: &mut &[u8]) -> Result<Self, TransactionError> {
        let mut peek = *buf;
        let header = Header::decode(&mut peek)?;

        if header.list {
            let start = buf.len();
            let inner = TypedTransaction::Legacy(Decodable::decode(buf)?);
            return Ok(Self::decoded(inner, start - buf.len()));
        }

        if peek.len() < header.payload_length {
            return Err(alloy_rlp::Error::InputTooShort.into());
        }
        let (payload, rest) = peek.split_at(header.payload_length);
        let inner = TypedTransaction::decode_typed(payload)?;
        *buf = rest;
        Ok(Self::decoded(inner, payload.len()))
    }

    /// Returns the consensus payload.
    pub const fn inner(&self) -> &TypedTransaction {
        &self.inner
    }

    pub const fn tx_type(&self) -> TxType {
        self.inner.tx_type()
    }

    /// Chain id the transaction is bound to. Unprotected legacy transactions report zero.
    pub fn chain_id(&self) -> U256 {
        self.inner.chain_id()
    }

    pub const fn nonce(&self) -> u64 {
        self.inner.nonce()
    }

    pub const fn gas_limit(&self) -> u64 {
        self.inner.gas_limit()
    }

    /// Gas price. Dynamic-fee transactions report their fee cap.
    pub const fn gas_price(&self) -> u128 {
        self.inner.gas_price()
    }

    pub const fn gas_tip_cap(&self) -> u128 {
        self.inner.gas_tip_cap()
    }

    pub const fn gas_fee_cap(&self) -> u128 {
        self.inner.gas_fee_cap()
    }

    pub const fn value(&self) -> U256 {
        self.inner.value()
    }

    pub const fn kind(&self) -> TxKind {
        self.inner.kind()
    }

    /// Recipient, `None` for contract creation.
    pub fn to(&self) -> Option<Address> {
        self.kind().to().copied()
    }

    pub const fn input(&self) -> &Bytes {
        self.inner.input()
    }

    pub const fn access_list(&self) -> Option<&AccessList> {
        self.inner.access_list()
    }

    /// Returns the raw `v`, `r`, `s` values.
    pub const fn raw_signature_values(&self) -> SignatureValues {
        self.inner.signature_values()
    }

    /// Time the transaction was first seen locally.
    pub const fn time(&self) -> SystemTime {
        self.time
    }

    /// Returns whether the transaction is replay protected. Typed transactions always are.
    pub fn protected(&self) -> bool {
        match &self.inner {
            TypedTransaction::Legacy(tx) => tx.is_protected(),
            TypedTransaction::AccessList(_) | TypedTransaction::DynamicFee(_) => true,
        }
    }

    /// Checks the signature values for range and protection consistency.
    pub fn sanity_check_signature(&self) -> Result<(), TransactionError> {
        let SignatureValues { r, s, v } = self.raw_signature_values();
        sanity_check_signature(v, r, s, self.tx_type().is_legacy())
    }

    /// Maximum wei the transaction can spend: `gas_limit * gas_price + value`.
    pub fn cost(&self) -> U256 {
        U256::from(self.gas_limit())
            .saturating_mul(U256::from(self.gas_price()))
            .saturating_add(self.value())
    }

    /// Keccak256 of the canonical encoding, computed once.
    pub fn hash(&self) -> B256 {
        *self.hash.get_or_init(|| keccak256(self.inner.encoded_2718()))
    }

    /// Length of the canonical encoding, computed once.
    pub fn size(&self) -> usize {
        *self.size.get_or_init(|| self.inner.encode_2718_len())
    }

    /// Returns the sender cached for `chain_id`, if any.
    pub fn cached_sender(&self, chain_id: U256) -> Option<Address> {
        self.sender.get().filter(|cached| cached.chain_id == chain_id).map(|cached| cached.from)
    }

    /// Caches the sender recovered under `chain_id`. The first cached sender wins.
    pub fn cache_sender(&self, chain_id: U256, from: Address) {
        let _ = self.sender.set(CachedSender { chain_id, from });
    }

    /// Effective tip at the given base fee, see [`effective_gas_tip`].
    pub fn effective_gas_tip(&self, base_fee: Option<u64>) -> Result<I256, FeeError> {
        effective_gas_tip(self.gas_tip_cap(), self.gas_fee_cap(), base_fee)
    }

    /// Effective tip at the given base fee, ignoring an insufficient fee cap.
    pub fn effective_gas_tip_value(&self, base_fee: Option<u64>) -> I256 {
        effective_gas_tip_value(self.gas_tip_cap(), self.gas_fee_cap(), base_fee)
    }

    pub fn gas_fee_cap_cmp(&self, other: &Self) -> Ordering {
        self.gas_fee_cap().cmp(&other.gas_fee_cap())
    }

    pub fn gas_tip_cap_cmp(&self, other: &Self) -> Ordering {
        self.gas_tip_cap().cmp(&other.gas_tip_cap())
    }

    /// Compares effective tips at `base_fee`. Without a base fee this compares tip caps.
    pub fn effective_gas_tip_cmp(&self, other: &Self, base_fee: Option<u64>) -> Ordering {
        if base_fee.is_none() {
            return self.gas_tip_cap_cmp(other);
        }
        self.effective_gas_tip_value(base_fee).cmp(&other.effective_gas_tip_value(base_fee))
    }

    /// Compares the fee cap with a plain value.
    pub fn gas_fee_cap_cmp_value(&self, other: u128) -> Ordering {
        self.gas_fee_cap().cmp(&other)
    }

    /// Compares the tip cap with a plain value.
    pub fn gas_tip_cap_cmp_value(&self, other: u128) -> Ordering {
        self.gas_tip_cap().cmp(&other)
    }

    /// Compares the effective tip at `base_fee` with a plain value. Without a base fee
    /// this compares the tip cap.
    pub fn effective_gas_tip_cmp_value(&self, other: u128, base_fee: Option<u64>) -> Ordering {
        if base_fee.is_none() {
            return self.gas_tip_cap_cmp_value(other);
        }
        self.effective_gas_tip_value(base_fee).cmp(&I256::from_raw(U256::from(other)))
    }

    /// Returns a copy carrying the signature produced for `signer`.
    ///
    /// `sig` must be in the `[R || S || V]` format with `V` being `0` or `1`. Typed
    /// transactions also take the signer's chain id. The first-seen time is kept.
    pub fn with_signature<S>(&self, signer: &S, sig: &[u8]) -> Result<Self, TransactionError>
    where
        S: Signer + ?Sized,
    {
        let values = signer.signature_values(self, sig)?;
        let mut inner = self.inner.clone();
        inner.set_signature_values(signer.chain_id(), values);

        let tx = Self::new_at(inner, self.time);
        tx.sanity_check_signature()?;
        Ok(tx)
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Transaction {}

impl From<TypedTransaction> for Transaction {
    fn from(inner: TypedTransaction) -> Self {
        Self::new(inner)
    }
}

impl Typed2718 for Transaction {
    fn ty(&self) -> u8 {
        self.inner.ty()
    }
}

impl Encodable2718 for Transaction {
    fn type_flag(&self) -> Option<u8> {
        self.inner.type_flag()
    }

    fn encode_2718_len(&self) -> usize {
        self.size()
    }

    fn encode_2718(&self, out: &mut dyn BufMut) {
        self.inner.encode_2718(out)
    }
}

impl Encodable for Transaction {
    fn encode(&self, out: &mut dyn BufMut) {
        self.network_encode(out)
    }

    fn length(&self) -> usize {
        self.network_len()
    }
}

impl Decodable for Transaction {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Self::decode_rlp(buf).map_err(Into::into)
    }
}

/// Returns the transactions of `a` whose hash does not appear in `b`, in order.
pub fn tx_difference(a: &[Arc<Transaction>], b: &[Arc<Transaction>]) -> Vec<Arc<Transaction>> {
    let remove: HashSet<B256> = b.iter().map(|tx| tx.hash()).collect();
    a.iter().filter(|tx| !remove.contains(&tx.hash())).cloned().collect()
}

/// Returns the hashes of `a` that do not appear in `b`, in order.
pub fn hash_difference(a: &[B256], b: &[B256]) -> Vec<B256> {
    let remove: HashSet<&B256> = b.iter().collect();
    a.iter().filter(|hash| !remove.contains(hash)).copied().collect()
}

/// Writes the canonical encoding of `txs[index]` into `out`, as used for the
/// transactions trie. Does nothing for an out of range index.
pub fn encode_index(txs: &[Arc<Transaction>], index: usize, out: &mut dyn BufMut) {
    if let Some(tx) = txs.get(index) {
        tx.encode_2718(out);
    }
}

/// Sorts transactions of a single account by nonce. The sort is stable.
pub fn sort_by_nonce(txs: &mut [Arc<Transaction>]) {
    txs.sort_by_key(|tx| tx.nonce());
}
