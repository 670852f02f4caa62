//! Uniform price and profit view over transactions, bundles and share bundles.

use crate::OrderError;
use alloy_primitives::{B256, I256, Sign, U256};
use mevbuild_primitives::{FeeError, SimSBundle, SimulatedBundle, Transaction};
use std::{fmt, sync::Arc};

/// A schedulable unit.
#[derive(Clone, Debug)]
pub enum Order {
    /// A single transaction, head of its sender's queue.
    Tx(Arc<Transaction>),
    /// A simulated bundle.
    Bundle(Arc<SimulatedBundle>),
    /// A simulated share bundle.
    SBundle(Arc<SimSBundle>),
}

impl Order {
    /// Transaction hash, bundle hash or share bundle hash.
    pub fn hash(&self) -> B256 {
        match self {
            Self::Tx(tx) => tx.hash(),
            Self::Bundle(bundle) => bundle.original_bundle.hash,
            Self::SBundle(sbundle) => sbundle.hash,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tx(tx) => write!(f, "tx:{}", tx.hash()),
            Self::Bundle(bundle) => write!(f, "bundle:{}", bundle.original_bundle.uuid),
            Self::SBundle(sbundle) => write!(f, "sbundle:{}", sbundle.hash),
        }
    }
}

/// An [`Order`] with its cached priority.
///
/// The priority is the effective tip per gas for transactions and the simulated MEV
/// gas price for bundles. Wrappers order by priority, see the [`Ord`] impl.
#[derive(Clone, Debug)]
pub struct OrderWrapper {
    order: Order,
    price: U256,
}

impl OrderWrapper {
    /// Wraps a transaction, pricing it at its effective tip for `base_fee`.
    ///
    /// Fails if the fee cap does not cover the base fee.
    pub fn from_tx(tx: Arc<Transaction>, base_fee: Option<u64>) -> Result<Self, FeeError> {
        // non-negative once the fee cap covers the base fee
        let price = tx.effective_gas_tip(base_fee)?.max(I256::ZERO).into_raw();
        Ok(Self { order: Order::Tx(tx), price })
    }

    /// Wraps a bundle at its simulated MEV gas price.
    pub fn from_bundle(bundle: Arc<SimulatedBundle>) -> Self {
        let price = bundle.mev_gas_price;
        Self { order: Order::Bundle(bundle), price }
    }

    /// Wraps a share bundle at its simulated MEV gas price.
    pub fn from_sbundle(sbundle: Arc<SimSBundle>) -> Self {
        let price = sbundle.mev_gas_price;
        Self { order: Order::SBundle(sbundle), price }
    }

    pub const fn order(&self) -> &Order {
        &self.order
    }

    pub const fn tx(&self) -> Option<&Arc<Transaction>> {
        match &self.order {
            Order::Tx(tx) => Some(tx),
            _ => None,
        }
    }

    pub const fn bundle(&self) -> Option<&Arc<SimulatedBundle>> {
        match &self.order {
            Order::Bundle(bundle) => Some(bundle),
            _ => None,
        }
    }

    pub const fn sbundle(&self) -> Option<&Arc<SimSBundle>> {
        match &self.order {
            Order::SBundle(sbundle) => Some(sbundle),
            _ => None,
        }
    }

    /// Priority of this order.
    pub const fn price(&self) -> U256 {
        self.price
    }

    pub const fn set_price(&mut self, price: U256) {
        self.price = price;
    }

    /// Value this order pays the block producer.
    ///
    /// For a transaction this is `(gas_price - base_fee) * gas`, where `gas` is
    /// `gas_used` or the gas limit when `gas_used` is zero. Bundles report the value
    /// sent to the coinbase and share bundles their simulated profit.
    pub fn profit(&self, base_fee: Option<u64>, gas_used: u64) -> I256 {
        match &self.order {
            Order::Tx(tx) => {
                let gas = if gas_used != 0 { gas_used } else { tx.gas_limit() };
                signed(U256::from(tx.gas_price()))
                    .saturating_sub(signed(U256::from(base_fee.unwrap_or_default())))
                    .saturating_mul(signed(U256::from(gas)))
            }
            Order::Bundle(bundle) => signed(bundle.eth_sent_to_coinbase),
            Order::SBundle(sbundle) => signed(sbundle.profit),
        }
    }

    /// Overwrites the total value of a bundle or the profit of a share bundle.
    ///
    /// The underlying value is copied on write, so other holders of the bundle,
    /// including wrappers in earlier snapshots, are not affected.
    pub fn set_profit(&mut self, profit: U256) -> Result<(), OrderError> {
        match &mut self.order {
            Order::Tx(_) => Err(OrderError::ImmutableTransaction),
            Order::Bundle(bundle) => {
                Arc::make_mut(bundle).total_eth = profit;
                Ok(())
            }
            Order::SBundle(sbundle) => {
                Arc::make_mut(sbundle).profit = profit;
                Ok(())
            }
        }
    }
}

fn signed(value: U256) -> I256 {
    I256::checked_from_sign_and_abs(Sign::Positive, value).unwrap_or(I256::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, address};
    use mevbuild_primitives::test_utils::{
        dynamic_fee_tx, legacy_tx, sim_sbundle, simulated_bundle,
    };

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");

    #[test]
    fn test_tx_price_is_effective_tip() {
        let wrapper = OrderWrapper::from_tx(dynamic_fee_tx(ALICE, 0, 10, 150), Some(100)).unwrap();
        assert_eq!(wrapper.price(), U256::from(10));

        let wrapper = OrderWrapper::from_tx(dynamic_fee_tx(ALICE, 0, 10, 105), Some(100)).unwrap();
        assert_eq!(wrapper.price(), U256::from(5));

        let wrapper = OrderWrapper::from_tx(dynamic_fee_tx(ALICE, 0, 10, 105), None).unwrap();
        assert_eq!(wrapper.price(), U256::from(10));
    }

    #[test]
    fn test_tx_wrap_fails_below_base_fee() {
        let err = OrderWrapper::from_tx(dynamic_fee_tx(ALICE, 0, 10, 90), Some(100)).unwrap_err();
        let tip = I256::try_from(-10i64).unwrap();
        assert_eq!(err, FeeError::FeeCapTooLow { fee_cap: 90, base_fee: 100, tip });
    }

    #[test]
    fn test_tx_price_keeps_full_width_tips() {
        let wrapper =
            OrderWrapper::from_tx(dynamic_fee_tx(ALICE, 0, u128::MAX, u128::MAX), None).unwrap();
        assert_eq!(wrapper.price(), U256::from(u128::MAX));

        let wrapper =
            OrderWrapper::from_tx(dynamic_fee_tx(ALICE, 0, u128::MAX, u128::MAX), Some(7)).unwrap();
        assert_eq!(wrapper.price(), U256::from(u128::MAX - 7));
    }

    #[test]
    fn test_bundle_price_is_mev_gas_price() {
        let wrapper = OrderWrapper::from_bundle(Arc::new(simulated_bundle(7, 1_000, 500)));
        assert_eq!(wrapper.price(), U256::from(7));
        assert!(wrapper.bundle().is_some());
        assert!(wrapper.tx().is_none());

        let wrapper = OrderWrapper::from_sbundle(Arc::new(sim_sbundle(9, 1_000, 500)));
        assert_eq!(wrapper.price(), U256::from(9));
        assert!(wrapper.sbundle().is_some());
    }

    #[test]
    fn test_set_price() {
        let mut wrapper = OrderWrapper::from_bundle(Arc::new(simulated_bundle(7, 1_000, 500)));
        wrapper.set_price(U256::from(3));
        assert_eq!(wrapper.price(), U256::from(3));
    }

    #[test]
    fn test_tx_profit() {
        // dynamic fee transactions report their fee cap as gas price
        let wrapper = OrderWrapper::from_tx(dynamic_fee_tx(ALICE, 0, 10, 150), Some(100)).unwrap();
        assert_eq!(wrapper.profit(Some(100), 50_000), I256::try_from(50 * 50_000).unwrap());
        // falls back to the gas limit
        assert_eq!(wrapper.profit(Some(100), 0), I256::try_from(50 * 21_000).unwrap());

        let wrapper = OrderWrapper::from_tx(legacy_tx(ALICE, 0, 90), None).unwrap();
        assert_eq!(wrapper.profit(Some(100), 1), I256::try_from(-10).unwrap());
        assert_eq!(wrapper.profit(None, 1), I256::try_from(90).unwrap());
    }

    #[test]
    fn test_bundle_profit() {
        let wrapper = OrderWrapper::from_bundle(Arc::new(simulated_bundle(1, 1_000, 500)));
        assert_eq!(wrapper.profit(Some(100), 0), I256::try_from(500).unwrap());

        let wrapper = OrderWrapper::from_sbundle(Arc::new(sim_sbundle(1, 1_000, 700)));
        assert_eq!(wrapper.profit(Some(100), 0), I256::try_from(700).unwrap());
    }

    #[test]
    fn test_set_profit_copies_on_write() {
        let bundle = Arc::new(simulated_bundle(1, 1_000, 500));
        let mut wrapper = OrderWrapper::from_bundle(Arc::clone(&bundle));
        let snapshot = wrapper.clone();

        wrapper.set_profit(U256::from(900)).unwrap();
        assert_eq!(wrapper.bundle().unwrap().total_eth, U256::from(900));
        assert_eq!(snapshot.bundle().unwrap().total_eth, U256::from(500));
        assert_eq!(bundle.total_eth, U256::from(500));

        let mut wrapper = OrderWrapper::from_sbundle(Arc::new(sim_sbundle(1, 1_000, 700)));
        wrapper.set_profit(U256::from(10)).unwrap();
        assert_eq!(wrapper.profit(None, 0), I256::try_from(10).unwrap());
    }

    #[test]
    fn test_set_profit_rejects_transactions() {
        let mut wrapper = OrderWrapper::from_tx(dynamic_fee_tx(ALICE, 0, 10, 150), None).unwrap();
        assert_eq!(wrapper.set_profit(U256::from(1)), Err(OrderError::ImmutableTransaction));
    }

    #[test]
    fn test_order_display() {
        let tx = dynamic_fee_tx(ALICE, 0, 10, 150);
        let wrapper = OrderWrapper::from_tx(Arc::clone(&tx), None).unwrap();
        assert_eq!(wrapper.order().to_string(), format!("tx:{}", tx.hash()));
        assert_eq!(wrapper.order().hash(), tx.hash());

        let bundle = Arc::new(simulated_bundle(1, 1_000, 500));
        let wrapper = OrderWrapper::from_bundle(Arc::clone(&bundle));
        assert!(wrapper.order().to_string().starts_with("bundle:"));
        assert_eq!(wrapper.order().hash(), bundle.original_bundle.hash);
    }
}
