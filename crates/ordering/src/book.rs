//! Merge of per-sender nonce queues and bundles into a single priority stream.

use crate::OrderWrapper;
use alloy_primitives::Address;
use mevbuild_primitives::{SimSBundle, SimulatedBundle, Signer, Transaction, recover_sender};
use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, binary_heap::PeekMut},
    fmt, mem,
    sync::Arc,
};
use tracing::{debug, trace, warn};

/// Transactions of one sender that are not yet in the heap.
///
/// The backing slice is shared between snapshots and only the cursor moves.
#[derive(Clone, Debug)]
struct SenderQueue {
    txs: Arc<[Arc<Transaction>]>,
    next: usize,
}

impl SenderQueue {
    fn peek(&self) -> Option<&Arc<Transaction>> {
        self.txs.get(self.next)
    }

    fn remaining(&self) -> &[Arc<Transaction>] {
        self.txs.get(self.next..).unwrap_or_default()
    }

    fn is_empty(&self) -> bool {
        self.next >= self.txs.len()
    }
}

/// Heap entry ordered by [`OrderWrapper::cmp_priority`].
#[derive(Clone, Debug)]
struct Head(OrderWrapper);

impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp_priority(&other.0)
    }
}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

/// A set of transactions and bundles that yields orders in a profit maximizing
/// sequence while honouring each sender's nonce order.
///
/// Only one transaction per sender is in the heap at a time. The block assembler
/// drives the book:
///
/// - [`OrderBook::peek`] returns the best order,
/// - [`OrderBook::shift`] consumes it and queues the sender's next transaction,
/// - [`OrderBook::pop`] discards it, leaving the sender's remaining transactions
///   unreachable.
pub struct OrderBook<S: ?Sized> {
    /// Per sender nonce-sorted transactions not yet in the heap.
    txs: HashMap<Address, SenderQueue>,
    /// Next transaction for each sender and every bundle.
    heads: BinaryHeap<Head>,
    signer: Arc<S>,
    base_fee: Option<u64>,
}

impl<S: Signer + ?Sized> OrderBook<S> {
    /// Creates a book from nonce-sorted per-sender transactions and simulated bundles.
    ///
    /// A sender is dropped when its first transaction cannot be recovered, was signed
    /// by another account, or does not pay the base fee. Senders are seeded in address
    /// order.
    pub fn new(
        signer: Arc<S>,
        txs: HashMap<Address, Vec<Arc<Transaction>>>,
        bundles: Vec<Arc<SimulatedBundle>>,
        sbundles: Vec<Arc<SimSBundle>>,
        base_fee: Option<u64>,
    ) -> Self {
        let mut heads = Vec::with_capacity(txs.len() + bundles.len() + sbundles.len());
        heads.extend(sbundles.into_iter().map(OrderWrapper::from_sbundle));
        heads.extend(bundles.into_iter().map(OrderWrapper::from_bundle));

        let mut senders: Vec<_> = txs.into_iter().collect();
        senders.sort_unstable_by_key(|(from, _)| *from);

        let mut queues = HashMap::with_capacity(senders.len());
        for (from, account_txs) in senders {
            let Some(first) = account_txs.first() else {
                continue;
            };

            match recover_sender(signer.as_ref(), first) {
                Ok(recovered) if recovered == from => {}
                Ok(recovered) => {
                    warn!(
                        target: "mevbuild::ordering",
                        %from,
                        %recovered,
                        hash = %first.hash(),
                        "Dropping sender, first transaction signed by another account"
                    );
                    continue;
                }
                Err(err) => {
                    debug!(
                        target: "mevbuild::ordering",
                        %from,
                        %err,
                        hash = %first.hash(),
                        "Dropping sender, failed to recover first transaction sender"
                    );
                    continue;
                }
            }

            match OrderWrapper::from_tx(Arc::clone(first), base_fee) {
                Ok(wrapped) => heads.push(wrapped),
                Err(err) => {
                    debug!(
                        target: "mevbuild::ordering",
                        %from,
                        %err,
                        hash = %first.hash(),
                        "Dropping sender, first transaction not wrappable"
                    );
                    continue;
                }
            }

            let queue = SenderQueue { txs: account_txs.into(), next: 1 };
            if !queue.is_empty() {
                queues.insert(from, queue);
            }
        }

        for head in &heads {
            trace!(
                target: "mevbuild::ordering",
                order = %head.order(),
                price = %head.price(),
                "Seeded order book head"
            );
        }

        Self { txs: queues, heads: heads.into_iter().map(Head).collect(), signer, base_fee }
    }

    /// Returns the best order without removing it.
    pub fn peek(&self) -> Option<&OrderWrapper> {
        self.heads.peek().map(|head| &head.0)
    }

    /// Consumes the best order and returns it.
    ///
    /// If it was a transaction, the sender's next transaction takes its place in the
    /// heap. Bundles are single use and leave no replacement.
    pub fn shift(&mut self) -> Option<OrderWrapper> {
        let mut head = self.heads.peek_mut()?;
        let next = match head.0.tx() {
            Some(tx) => pull_next(&mut self.txs, self.signer.as_ref(), tx, self.base_fee),
            None => None,
        };

        Some(match next {
            // sifts down when `head` is dropped
            Some(next) => mem::replace(&mut head.0, next),
            None => PeekMut::pop(head).0,
        })
    }

    /// Removes the best order without replacement.
    ///
    /// Used when a transaction fails: later transactions of the same sender can no
    /// longer execute, so the sender leaves the heap.
    pub fn pop(&mut self) -> Option<OrderWrapper> {
        self.heads.pop().map(|head| head.0)
    }

    /// Advances the queue of `tx`'s sender and pushes its next transaction.
    ///
    /// For resynchronising after the sender's head was consumed without [`Self::shift`].
    pub fn shift_and_push_by_account_for_tx(&mut self, tx: &Transaction) {
        if let Some(next) = pull_next(&mut self.txs, self.signer.as_ref(), tx, self.base_fee) {
            self.heads.push(Head(next));
        }
    }

    /// Inserts a previously removed order.
    pub fn push(&mut self, order: OrderWrapper) {
        self.heads.push(Head(order));
    }
}

impl<S: ?Sized> OrderBook<S> {
    /// Returns an independent snapshot of the book.
    ///
    /// Heads are cloned, which only bumps reference counts. Sender queues share their
    /// backing storage with this book.
    pub fn deep_copy(&self) -> Self {
        Self {
            txs: self.txs.clone(),
            heads: self.heads.clone(),
            signer: Arc::clone(&self.signer),
            base_fee: self.base_fee,
        }
    }

    /// Base fee transactions are priced at.
    pub const fn base_fee(&self) -> Option<u64> {
        self.base_fee
    }

    /// Sets the base fee used to price transactions entering the heap from now on.
    /// Orders already in the heap keep their price.
    pub const fn set_base_fee(&mut self, base_fee: Option<u64>) {
        self.base_fee = base_fee;
    }

    /// Number of orders in the heap.
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Transactions of `sender` waiting behind its head.
    pub fn pending(&self, sender: &Address) -> &[Arc<Transaction>] {
        self.txs.get(sender).map(SenderQueue::remaining).unwrap_or_default()
    }
}

impl<S: ?Sized> Clone for OrderBook<S> {
    fn clone(&self) -> Self {
        self.deep_copy()
    }
}

impl<S: ?Sized> fmt::Debug for OrderBook<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderBook")
            .field("senders", &self.txs.len())
            .field("heads", &self.heads.len())
            .field("base_fee", &self.base_fee)
            .finish_non_exhaustive()
    }
}

/// Wraps the next queued transaction of `tx`'s sender and advances the queue.
///
/// The queue is left untouched when the next transaction cannot be wrapped.
fn pull_next<S: Signer + ?Sized>(
    queues: &mut HashMap<Address, SenderQueue>,
    signer: &S,
    tx: &Transaction,
    base_fee: Option<u64>,
) -> Option<OrderWrapper> {
    let from = recover_sender(signer, tx).ok()?;
    let queue = queues.get_mut(&from)?;
    let next = queue.peek()?;

    let wrapped = match OrderWrapper::from_tx(Arc::clone(next), base_fee) {
        Ok(wrapped) => wrapped,
        Err(err) => {
            debug!(
                target: "mevbuild::ordering",
                %from,
                %err,
                hash = %next.hash(),
                "Next transaction not wrappable"
            );
            return None;
        }
    };

    queue.next += 1;
    if queue.is_empty() {
        queues.remove(&from);
    }
    Some(wrapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, address};
    use mevbuild_primitives::test_utils::{
        MockSigner, dynamic_fee_tx, legacy_tx, sim_sbundle, simulated_bundle, unrecoverable_tx,
    };

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");
    const CAROL: Address = address!("0x00000000000000000000000000000000000ca201");

    fn book(
        txs: Vec<(Address, Vec<Arc<Transaction>>)>,
        bundles: Vec<SimulatedBundle>,
        base_fee: Option<u64>,
    ) -> OrderBook<MockSigner> {
        OrderBook::new(
            Arc::new(MockSigner::default()),
            txs.into_iter().collect(),
            bundles.into_iter().map(Arc::new).collect(),
            Vec::new(),
            base_fee,
        )
    }

    /// Drains the book with `shift`, returning `(sender, nonce)` for transactions.
    fn drain(book: &mut OrderBook<MockSigner>) -> Vec<(Address, u64)> {
        let signer = MockSigner::default();
        let mut out = Vec::new();
        while let Some(order) = book.shift() {
            if let Some(tx) = order.tx() {
                out.push((recover_sender(&signer, tx).unwrap(), tx.nonce()));
            }
        }
        out
    }

    #[test]
    fn test_scenario_tx_beats_low_priced_bundle() {
        let mut book = book(
            vec![(ALICE, vec![dynamic_fee_tx(ALICE, 0, 10, 150)])],
            // 500 wei over 1000 gas rounds down to a price of zero
            vec![simulated_bundle(0, 1_000, 500)],
            Some(100),
        );

        let head = book.peek().unwrap();
        assert_eq!(head.price(), U256::from(10));
        assert!(head.tx().is_some());

        book.pop();
        assert!(book.peek().unwrap().bundle().is_some());
        book.pop();
        assert!(book.peek().is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn test_scenario_shift_restores_heap_order() {
        let mut book = book(
            vec![
                (ALICE, vec![dynamic_fee_tx(ALICE, 0, 10, 10), dynamic_fee_tx(ALICE, 1, 20, 20)]),
                (BOB, vec![dynamic_fee_tx(BOB, 0, 15, 15)]),
            ],
            vec![],
            None,
        );

        assert_eq!(book.peek().unwrap().tx().unwrap().nonce(), 0);
        assert_eq!(book.peek().unwrap().price(), U256::from(15));

        // bob's only transaction
        let shifted = book.shift().unwrap();
        assert_eq!(shifted.price(), U256::from(15));

        // alice nonce 0
        let shifted = book.shift().unwrap();
        assert_eq!(shifted.price(), U256::from(10));

        // alice nonce 1 was pulled in behind it
        let head = book.peek().unwrap();
        assert_eq!(head.price(), U256::from(20));
        assert_eq!(head.tx().unwrap().nonce(), 1);
    }

    #[test]
    fn test_shift_resorts_replacement_below_other_heads() {
        let mut book = book(
            vec![
                (ALICE, vec![dynamic_fee_tx(ALICE, 0, 30, 30), dynamic_fee_tx(ALICE, 1, 5, 5)]),
                (BOB, vec![dynamic_fee_tx(BOB, 0, 20, 20)]),
            ],
            vec![simulated_bundle(10, 100, 0)],
            None,
        );

        let prices: Vec<_> = std::iter::from_fn(|| book.shift()).map(|o| o.price()).collect();
        assert_eq!(prices, vec![U256::from(30), U256::from(20), U256::from(10), U256::from(5)]);
    }

    #[test]
    fn test_full_width_tips_order_by_exact_price() {
        // the lower tip is seen first and would win an equal-price tie
        let lower = dynamic_fee_tx(ALICE, 0, u128::MAX - 1, u128::MAX - 1);
        let higher = dynamic_fee_tx(BOB, 0, u128::MAX, u128::MAX);
        let mut book = book(vec![(ALICE, vec![lower]), (BOB, vec![higher])], vec![], None);

        let top = book.shift().unwrap();
        assert_eq!(top.tx().unwrap().gas_tip_cap(), u128::MAX);
        assert_eq!(top.price(), U256::from(u128::MAX));

        let next = book.shift().unwrap();
        assert_eq!(next.price(), U256::from(u128::MAX - 1));
        assert!(book.is_empty());
    }

    #[test]
    fn test_shift_preserves_nonce_order_per_sender() {
        let queue = |from, tips: &[u128]| -> Vec<_> {
            tips.iter()
                .enumerate()
                .map(|(nonce, tip)| dynamic_fee_tx(from, nonce as u64, *tip, *tip))
                .collect()
        };
        let mut book = book(
            vec![(ALICE, queue(ALICE, &[7, 50, 1, 90])), (BOB, queue(BOB, &[40, 3, 60]))],
            vec![simulated_bundle(45, 1, 0)],
            None,
        );

        let drained = drain(&mut book);
        let nonces = |who: Address| -> Vec<u64> {
            drained.iter().filter(|(from, _)| *from == who).map(|(_, nonce)| *nonce).collect()
        };
        assert_eq!(nonces(ALICE), vec![0, 1, 2, 3]);
        assert_eq!(nonces(BOB), vec![0, 1, 2]);
        assert!(book.is_empty());
    }

    #[test]
    fn test_peek_is_maximal_after_every_operation() {
        let alice: Vec<_> =
            (0..5u64).map(|n| dynamic_fee_tx(ALICE, n, (n as u128 * 37) % 11, 100)).collect();
        let bob: Vec<_> =
            (0..5u64).map(|n| dynamic_fee_tx(BOB, n, (n as u128 * 13) % 7, 100)).collect();
        let mut book = book(
            vec![(ALICE, alice), (BOB, bob)],
            vec![simulated_bundle(4, 10, 0), simulated_bundle(4, 5, 0)],
            None,
        );

        let mut step = 0;
        while let Some(top) = book.peek().cloned() {
            let below_top = |other: &Head| other.0.cmp_priority(&top) != Ordering::Greater;
            assert!(book.heads.iter().all(below_top));
            if step % 3 == 2 {
                let popped = book.pop().unwrap();
                if popped.bundle().is_some() {
                    book.push(popped);
                    book.shift();
                }
            } else {
                book.shift();
            }
            step += 1;
        }
    }

    #[test]
    fn test_pop_drops_sender_remainder() {
        let mut book = book(
            vec![(ALICE, vec![dynamic_fee_tx(ALICE, 0, 10, 10), dynamic_fee_tx(ALICE, 1, 10, 10)])],
            vec![],
            None,
        );
        assert_eq!(book.pending(&ALICE).len(), 1);
        book.pop();
        assert!(book.peek().is_none());
        assert!(book.shift().is_none());
    }

    #[test]
    fn test_construction_drops_mismatched_sender() {
        let book = book(
            vec![
                // first transaction is bob's, filed under alice
                (ALICE, vec![dynamic_fee_tx(BOB, 0, 10, 10), dynamic_fee_tx(ALICE, 1, 10, 10)]),
                (CAROL, vec![dynamic_fee_tx(CAROL, 0, 5, 5)]),
            ],
            vec![],
            None,
        );
        assert_eq!(book.len(), 1);
        assert!(book.pending(&ALICE).is_empty());
        assert_eq!(book.peek().unwrap().price(), U256::from(5));
    }

    #[test]
    fn test_construction_drops_unrecoverable_and_underpaying_senders() {
        let book = book(
            vec![
                (ALICE, vec![unrecoverable_tx(0, 10, 200)]),
                // fee cap below the base fee
                (BOB, vec![dynamic_fee_tx(BOB, 0, 10, 90), dynamic_fee_tx(BOB, 1, 10, 200)]),
                (CAROL, vec![legacy_tx(CAROL, 0, 150)]),
                (address!("0x00000000000000000000000000000000000000ee"), vec![]),
            ],
            vec![],
            Some(100),
        );
        assert_eq!(book.len(), 1);
        assert!(book.pending(&BOB).is_empty());
        // legacy transactions tip their whole gas price above the base fee
        assert_eq!(book.peek().unwrap().price(), U256::from(50));
    }

    #[test]
    fn test_construction_wraps_all_bundles() {
        let book = OrderBook::new(
            Arc::new(MockSigner::default()),
            HashMap::new(),
            vec![Arc::new(simulated_bundle(3, 100, 0))],
            vec![Arc::new(sim_sbundle(4, 100, 0)), Arc::new(sim_sbundle(2, 100, 0))],
            Some(1_000_000),
        );
        assert_eq!(book.len(), 3);
        assert!(book.peek().unwrap().sbundle().is_some());
    }

    #[test]
    fn test_shift_stops_at_underpaying_transaction() {
        let mut book = book(
            vec![(
                ALICE,
                vec![dynamic_fee_tx(ALICE, 0, 10, 200), dynamic_fee_tx(ALICE, 1, 10, 90)],
            )],
            vec![],
            Some(100),
        );
        assert!(book.shift().unwrap().tx().is_some());
        assert!(book.peek().is_none());
        // the queue was not advanced past the underpaying transaction
        assert_eq!(book.pending(&ALICE).len(), 1);
    }

    #[test]
    fn test_shift_and_push_by_account_for_tx() {
        let first = dynamic_fee_tx(ALICE, 0, 10, 10);
        let mut book = book(
            vec![(ALICE, vec![Arc::clone(&first), dynamic_fee_tx(ALICE, 1, 20, 20)])],
            vec![],
            None,
        );

        // the head was consumed out of band
        let popped = book.pop().unwrap();
        assert_eq!(popped.tx().unwrap().hash(), first.hash());
        assert!(book.is_empty());

        book.shift_and_push_by_account_for_tx(&first);
        let head = book.peek().unwrap();
        assert_eq!(head.tx().unwrap().nonce(), 1);
        assert!(book.pending(&ALICE).is_empty());

        // nothing left to pull
        book.shift_and_push_by_account_for_tx(&first);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_push_reinserts_order() {
        let mut book = book(
            vec![(ALICE, vec![dynamic_fee_tx(ALICE, 0, 10, 10)])],
            vec![simulated_bundle(20, 1, 0)],
            None,
        );
        let bundle = book.pop().unwrap();
        assert!(bundle.bundle().is_some());
        book.push(bundle);
        assert!(book.peek().unwrap().bundle().is_some());
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_deep_copy_isolation() {
        let mut original = book(
            vec![
                (ALICE, vec![dynamic_fee_tx(ALICE, 0, 10, 150), dynamic_fee_tx(ALICE, 1, 5, 150)]),
                (BOB, vec![dynamic_fee_tx(BOB, 0, 8, 150)]),
            ],
            vec![],
            Some(100),
        );
        let head = original.peek().unwrap().tx().unwrap().hash();

        let mut copy = original.deep_copy();
        copy.set_base_fee(Some(146));
        while copy.shift().is_some() {}

        assert!(copy.is_empty());
        assert_eq!(copy.base_fee(), Some(146));
        assert_eq!(original.base_fee(), Some(100));
        assert_eq!(original.peek().unwrap().tx().unwrap().hash(), head);
        assert_eq!(original.pending(&ALICE).len(), 1);

        let drained = drain(&mut original);
        assert_eq!(drained, vec![(ALICE, 0), (BOB, 0), (ALICE, 1)]);
    }

    #[test]
    fn test_deep_copy_shares_queue_storage() {
        let book = book(
            vec![(ALICE, vec![dynamic_fee_tx(ALICE, 0, 10, 10), dynamic_fee_tx(ALICE, 1, 10, 10)])],
            vec![],
            None,
        );
        let copy = book.clone();
        assert!(Arc::ptr_eq(&book.txs[&ALICE].txs, &copy.txs[&ALICE].txs));
    }

    #[test]
    fn test_order_book_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<OrderBook<MockSigner>>();
        assert_send::<OrderBook<dyn Signer>>();
    }
}
