//! Price-time priority of [`OrderWrapper`]s.
//!
//! Orders with greater priority are scheduled first. Orders compare by price; equal
//! prices are broken as follows:
//!
//! | self \ other | transaction             | bundle or share bundle |
//! |--------------|-------------------------|------------------------|
//! | transaction  | earlier first-seen wins | other wins             |
//! | bundle       | self wins               | smaller gas used wins  |

use crate::{Order, OrderWrapper};
use std::{cmp::Ordering, time::SystemTime};

/// Secondary sort key applied between equally priced orders.
enum TieKey {
    Tx(SystemTime),
    Bundle(u64),
}

impl OrderWrapper {
    fn tie_key(&self) -> TieKey {
        match self.order() {
            Order::Tx(tx) => TieKey::Tx(tx.time()),
            Order::Bundle(bundle) => TieKey::Bundle(bundle.total_gas_used),
            Order::SBundle(sbundle) => TieKey::Bundle(sbundle.gas_used),
        }
    }

    /// Compares scheduling priority. [`Ordering::Greater`] means `self` goes first.
    ///
    /// Distinct orders may compare [`Ordering::Equal`], so this is not an identity.
    pub fn cmp_priority(&self, other: &Self) -> Ordering {
        self.price().cmp(&other.price()).then_with(|| match (self.tie_key(), other.tie_key()) {
            (TieKey::Tx(a), TieKey::Tx(b)) => b.cmp(&a),
            (TieKey::Bundle(a), TieKey::Bundle(b)) => b.cmp(&a),
            (TieKey::Bundle(_), TieKey::Tx(_)) => Ordering::Greater,
            (TieKey::Tx(_), TieKey::Bundle(_)) => Ordering::Less,
        })
    }
}
