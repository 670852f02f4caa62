//! Test helpers: a deterministic signer and builders for signed transactions and
//! simulated bundles.

use crate::{
    MevBundle, SignatureValues, Signer, SimSBundle, SimulatedBundle, Transaction,
    TransactionError,
    signature::split_signature,
    transaction::{TxDynamicFee, TxLegacy},
};
use alloy_primitives::{Address, B256, Bytes, TxKind, U256, address};
use std::sync::Arc;

/// Chain id used by the builders in this module.
pub const TEST_CHAIN_ID: u64 = 1;

/// Recipient used by the builders in this module.
pub const TEST_RECIPIENT: Address = address!("0x000000000000000000000000000000000000dead");

/// Signer that reads the sender from the low 20 bytes of `r`.
///
/// A zero `r` fails recovery with [`TransactionError::InvalidSignature`].
#[derive(Clone, Copy, Debug)]
pub struct MockSigner {
    chain_id: U256,
}

impl MockSigner {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id: U256::from(chain_id) }
    }
}

impl Default for MockSigner {
    fn default() -> Self {
        Self::new(TEST_CHAIN_ID)
    }
}

impl Signer for MockSigner {
    fn chain_id(&self) -> U256 {
        self.chain_id
    }

    fn sender(&self, tx: &Transaction) -> Result<Address, TransactionError> {
        let r = tx.raw_signature_values().r;
        if r.is_zero() {
            return Err(TransactionError::InvalidSignature);
        }
        Ok(address_from_r(r))
    }

    fn signature_values(
        &self,
        tx: &Transaction,
        sig: &[u8],
    ) -> Result<SignatureValues, TransactionError> {
        let mut values = split_signature(sig)?;
        if tx.tx_type().is_legacy() {
            values.v = if self.chain_id.is_zero() {
                values.v + U256::from(27)
            } else {
                values.v + U256::from(35) + self.chain_id * U256::from(2)
            };
        }
        Ok(values)
    }
}

/// Encodes `from` into an `r` value understood by [`MockSigner`].
pub fn r_for(from: Address) -> U256 {
    U256::from_be_slice(from.as_slice())
}

/// Inverse of [`r_for`].
pub fn address_from_r(r: U256) -> Address {
    Address::from_word(B256::from(r.to_be_bytes::<32>()))
}

/// A dynamic-fee transaction from `from`, signed for [`MockSigner`].
pub fn dynamic_fee_tx(
    from: Address,
    nonce: u64,
    tip_cap: u128,
    fee_cap: u128,
) -> Arc<Transaction> {
    Arc::new(Transaction::new(TxDynamicFee {
        chain_id: U256::from(TEST_CHAIN_ID),
        nonce,
        max_priority_fee_per_gas: tip_cap,
        max_fee_per_gas: fee_cap,
        gas_limit: 21_000,
        to: TxKind::Call(TEST_RECIPIENT),
        value: U256::ZERO,
        input: Bytes::new(),
        access_list: Default::default(),
        v: U256::ZERO,
        r: r_for(from),
        s: U256::from(1),
    }))
}

/// A replay protected legacy transaction from `from`, signed for [`MockSigner`].
pub fn legacy_tx(from: Address, nonce: u64, gas_price: u128) -> Arc<Transaction> {
    Arc::new(Transaction::new(TxLegacy {
        nonce,
        gas_price,
        gas_limit: 21_000,
        to: TxKind::Call(TEST_RECIPIENT),
        value: U256::ZERO,
        input: Bytes::new(),
        v: U256::from(35 + 2 * TEST_CHAIN_ID),
        r: r_for(from),
        s: U256::from(1),
    }))
}

/// A transaction whose sender cannot be recovered by [`MockSigner`].
pub fn unrecoverable_tx(nonce: u64, tip_cap: u128, fee_cap: u128) -> Arc<Transaction> {
    dynamic_fee_tx(Address::ZERO, nonce, tip_cap, fee_cap)
}

/// A simulated bundle with a single transaction and the given economics.
pub fn simulated_bundle(
    mev_gas_price: u64,
    total_gas_used: u64,
    eth_sent_to_coinbase: u64,
) -> SimulatedBundle {
    let from = address!("0x00000000000000000000000000000000000b0b0b");
    let bundle = MevBundle::new(vec![dynamic_fee_tx(from, 0, 0, 0)], 1, from, Vec::new());
    SimulatedBundle {
        mev_gas_price: U256::from(mev_gas_price),
        total_eth: U256::from(eth_sent_to_coinbase),
        eth_sent_to_coinbase: U256::from(eth_sent_to_coinbase),
        total_gas_used,
        original_bundle: bundle,
    }
}

/// A simulated share bundle with the given economics.
pub fn sim_sbundle(mev_gas_price: u64, gas_used: u64, profit: u64) -> SimSBundle {
    let from = address!("0x00000000000000000000000000000000005b5b5b");
    let txs = vec![dynamic_fee_tx(from, 0, 0, 0)];
    SimSBundle {
        hash: MevBundle::compute_hash(&txs),
        txs,
        profit: U256::from(profit),
        mev_gas_price: U256::from(mev_gas_price),
        gas_used,
    }
}
