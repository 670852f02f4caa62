//! Effective priority fee computation.

use crate::FeeError;
use alloy_primitives::{I256, U256};

/// Lifts a fee value into the signed domain. Every `u128` fits exactly.
fn signed(value: u128) -> I256 {
    I256::from_raw(U256::from(value))
}

/// Computes the per-gas tip paid to the block producer.
///
/// Without a base fee the tip cap is returned unchanged. Otherwise the result is
/// `min(tip_cap, fee_cap - base_fee)`, and [`FeeError::FeeCapTooLow`] is returned
/// whenever `fee_cap < base_fee`. The error carries the (negative) tip.
pub fn effective_gas_tip(
    tip_cap: u128,
    fee_cap: u128,
    base_fee: Option<u64>,
) -> Result<I256, FeeError> {
    let Some(base_fee) = base_fee else {
        return Ok(signed(tip_cap));
    };

    let tip = signed(tip_cap).min(signed(fee_cap) - signed(base_fee as u128));
    if fee_cap < base_fee as u128 {
        return Err(FeeError::FeeCapTooLow { fee_cap, base_fee, tip });
    }
    Ok(tip)
}

/// Same as [`effective_gas_tip`] but ignores the fee-cap condition.
pub fn effective_gas_tip_value(tip_cap: u128, fee_cap: u128, base_fee: Option<u64>) -> I256 {
    effective_gas_tip(tip_cap, fee_cap, base_fee).unwrap_or_else(|err| err.tip())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tip(value: i64) -> I256 {
        I256::try_from(value).unwrap()
    }

    #[test]
    fn test_no_base_fee_returns_tip_cap() {
        assert_eq!(effective_gas_tip(10, 5, None), Ok(tip(10)));
    }

    #[test]
    fn test_tip_capped_by_fee_headroom() {
        // fee_cap - base_fee = 50, tip_cap = 10
        assert_eq!(effective_gas_tip(10, 150, Some(100)), Ok(tip(10)));
        // fee_cap - base_fee = 5, tip_cap = 10
        assert_eq!(effective_gas_tip(10, 105, Some(100)), Ok(tip(5)));
    }

    #[test]
    fn test_fee_cap_equal_to_base_fee_is_not_an_error() {
        assert_eq!(effective_gas_tip(10, 100, Some(100)), Ok(I256::ZERO));
    }

    #[test]
    fn test_fee_cap_below_base_fee() {
        let err = effective_gas_tip(10, 90, Some(100)).unwrap_err();
        assert_eq!(err, FeeError::FeeCapTooLow { fee_cap: 90, base_fee: 100, tip: tip(-10) });
        assert_eq!(effective_gas_tip_value(10, 90, Some(100)), tip(-10));
    }

    #[test]
    fn test_error_iff_fee_cap_below_base_fee() {
        for fee_cap in [0u128, 1, 99, 100, 101, 1_000] {
            for tip_cap in [0u128, 1, 50, 2_000] {
                let result = effective_gas_tip(tip_cap, fee_cap, Some(100));
                assert_eq!(result.is_err(), fee_cap < 100, "fee_cap={fee_cap} tip_cap={tip_cap}");
            }
        }
    }

    #[test]
    fn test_full_width_fee_fields_are_exact() {
        let max = signed(u128::MAX);
        assert_eq!(max.into_raw(), U256::from(u128::MAX));
        assert_eq!(effective_gas_tip(u128::MAX, u128::MAX, None), Ok(max));
        assert_eq!(effective_gas_tip(u128::MAX - 1, u128::MAX, None), Ok(signed(u128::MAX - 1)));
        assert_eq!(effective_gas_tip(u128::MAX, u128::MAX, Some(1)), Ok(signed(u128::MAX - 1)));
        assert!(
            effective_gas_tip_value(u128::MAX, u128::MAX, None) >
                effective_gas_tip_value(u128::MAX - 1, u128::MAX, None)
        );
    }
}
