//! Sender recovery capability.

use crate::{SignatureValues, Transaction, TransactionError};
use alloy_primitives::{Address, U256};
use std::sync::Arc;

/// Recovers transaction senders and produces signature values for one chain.
///
/// Implementations hold the cryptography; the ordering core only consumes the
/// recovered addresses.
pub trait Signer: Send + Sync {
    /// Chain id this signer operates on.
    fn chain_id(&self) -> U256;

    /// Recovers the account that signed `tx`.
    ///
    /// Returns [`TransactionError::TxTypeNotValid`] for transaction types the signer
    /// does not handle.
    fn sender(&self, tx: &Transaction) -> Result<Address, TransactionError>;

    /// Converts a 65 byte `[R || S || V]` signature into the values stored on `tx`.
    fn signature_values(
        &self,
        tx: &Transaction,
        sig: &[u8],
    ) -> Result<SignatureValues, TransactionError>;
}

impl<S: Signer + ?Sized> Signer for Arc<S> {
    fn chain_id(&self) -> U256 {
        (**self).chain_id()
    }

    fn sender(&self, tx: &Transaction) -> Result<Address, TransactionError> {
        (**self).sender(tx)
    }

    fn signature_values(
        &self,
        tx: &Transaction,
        sig: &[u8],
    ) -> Result<SignatureValues, TransactionError> {
        (**self).signature_values(tx, sig)
    }
}

/// Returns the sender of `tx`, consulting the transaction's sender cache first.
///
/// The cache is keyed by the signer's chain id, so a signer for another chain always
/// recovers afresh.
pub fn recover_sender<S>(signer: &S, tx: &Transaction) -> Result<Address, TransactionError>
where
    S: Signer + ?Sized,
{
    let chain_id = signer.chain_id();
    if let Some(from) = tx.cached_sender(chain_id) {
        return Ok(from);
    }

    let from = signer.sender(tx)?;
    tx.cache_sender(chain_id, from);
    Ok(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{signature::split_signature, transaction::TxDynamicFee};
    use alloy_primitives::address;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingSigner {
        calls: AtomicUsize,
    }

    impl Signer for CountingSigner {
        fn chain_id(&self) -> U256 {
            U256::from(1)
        }

        fn sender(&self, _tx: &Transaction) -> Result<Address, TransactionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(address!("0x00000000000000000000000000000000000000bb"))
        }

        fn signature_values(
            &self,
            _tx: &Transaction,
            sig: &[u8],
        ) -> Result<SignatureValues, TransactionError> {
            split_signature(sig)
        }
    }

    #[test]
    fn test_recover_sender_uses_cache() {
        let signer = CountingSigner::default();
        let tx = Transaction::new(TxDynamicFee::default());

        let first = recover_sender(&signer, &tx).unwrap();
        let second = recover_sender(&signer, &tx).unwrap();
        assert_eq!(first, second);
        assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_arc_signer_delegates() {
        let signer = Arc::new(CountingSigner::default());
        let tx = Transaction::new(TxDynamicFee::default());
        assert_eq!(Signer::chain_id(&signer), U256::from(1));
        recover_sender(&signer, &tx).unwrap();
        assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
    }
}
