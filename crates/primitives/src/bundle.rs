//! Bundles and their simulated economic summaries.

use crate::Transaction;
use alloy_primitives::{Address, B256, U256, keccak256};
use integer_encoding::VarInt;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// An atomic, ordered set of transactions targeting one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MevBundle {
    /// Transactions in execution order.
    pub txs: Vec<Arc<Transaction>>,
    /// Target block number.
    pub block_number: u64,
    /// Identity derived from the block number, hash and reverting hashes.
    pub uuid: Uuid,
    /// Account that submitted the bundle.
    pub signing_address: Address,
    /// Earliest block timestamp the bundle is valid for, zero for unbounded.
    pub min_timestamp: u64,
    /// Latest block timestamp the bundle is valid for, zero for unbounded.
    pub max_timestamp: u64,
    /// Hashes of transactions allowed to revert.
    pub reverting_tx_hashes: Vec<B256>,
    /// Keccak256 over the concatenated transaction hashes.
    pub hash: B256,
}

impl MevBundle {
    /// Creates a bundle and derives its hash and uuid.
    pub fn new(
        txs: Vec<Arc<Transaction>>,
        block_number: u64,
        signing_address: Address,
        reverting_tx_hashes: Vec<B256>,
    ) -> Self {
        let hash = Self::compute_hash(&txs);
        let mut bundle = Self {
            txs,
            block_number,
            uuid: Uuid::nil(),
            signing_address,
            min_timestamp: 0,
            max_timestamp: 0,
            reverting_tx_hashes,
            hash,
        };
        bundle.uuid = bundle.compute_uuid();
        bundle
    }

    /// Sets the inclusion window.
    pub const fn with_timestamps(mut self, min_timestamp: u64, max_timestamp: u64) -> Self {
        self.min_timestamp = min_timestamp;
        self.max_timestamp = max_timestamp;
        self
    }

    /// Keccak256 over the concatenated hashes of `txs`.
    pub fn compute_hash(txs: &[Arc<Transaction>]) -> B256 {
        let mut buf = Vec::with_capacity(txs.len() * 32);
        for tx in txs {
            buf.extend_from_slice(tx.hash().as_slice());
        }
        keccak256(&buf)
    }

    /// Returns whether `hash` may revert without invalidating the bundle.
    pub fn reverting_hash(&self, hash: &B256) -> bool {
        self.reverting_tx_hashes.contains(hash)
    }

    /// Bytes the uuid is derived from: zigzag varint of the block number, the bundle
    /// hash and the reverting hashes in ascending order.
    pub fn unique_payload(&self) -> Vec<u8> {
        let mut reverting = self.reverting_tx_hashes.clone();
        reverting.sort_unstable();

        let mut buf = Vec::with_capacity(size_of::<i64>() + 32 + 32 * reverting.len());
        buf.extend_from_slice(&(self.block_number as i64).encode_var_vec());
        buf.extend_from_slice(self.hash.as_slice());
        for hash in &reverting {
            buf.extend_from_slice(hash.as_slice());
        }
        buf
    }

    /// Name-based (version 5 layout) uuid over [`Self::unique_payload`] in the nil
    /// namespace, hashed with sha256.
    pub fn compute_uuid(&self) -> Uuid {
        let digest = {
            let mut hasher = Sha256::new();
            hasher.update(Uuid::nil().as_bytes());
            hasher.update(self.unique_payload());
            hasher.finalize()
        };
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        uuid::Builder::from_sha1_bytes(bytes).into_uuid()
    }
}

/// Latest known replacement of a bundle submitted under a caller provided uuid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LatestUuidBundle {
    /// Replacement uuid chosen by the submitter.
    pub uuid: Uuid,
    /// Account that submitted the bundle.
    pub signing_address: Address,
    /// Hash of the latest bundle under this uuid.
    pub bundle_hash: B256,
    /// Derived uuid of the latest bundle under this uuid.
    pub bundle_uuid: Uuid,
}

/// Economic outcome of a simulated [`MevBundle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulatedBundle {
    /// Value paid to the block producer per unit of gas.
    pub mev_gas_price: U256,
    /// Total value paid to the block producer, fees included.
    pub total_eth: U256,
    /// Value transferred directly to the coinbase.
    pub eth_sent_to_coinbase: U256,
    /// Gas consumed by the bundle.
    pub total_gas_used: u64,
    /// The simulated bundle.
    pub original_bundle: MevBundle,
}

/// Economic outcome of a simulated share bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimSBundle {
    /// Share bundle hash.
    pub hash: B256,
    /// Transactions in execution order.
    pub txs: Vec<Arc<Transaction>>,
    /// Value paid to the block producer.
    pub profit: U256,
    /// Value paid to the block producer per unit of gas.
    pub mev_gas_price: U256,
    /// Gas consumed by the share bundle.
    pub gas_used: u64,
}
