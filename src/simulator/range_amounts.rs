//! Range Amount Calculator
//!
//! Token amounts represented by a block of liquidity spread uniformly over a
//! tick interval, using the standard concentrated-liquidity relations:
//!
//! - amount0 = L × (√P_upper − √P_lower) / (√P_lower × √P_upper)
//! - amount1 = L × (√P_upper − √P_lower)
//!
//! Both are computed on raw prices, then scaled to human units.

use crate::error::SimulationError;

use super::price_math::tick_to_raw_price;

/// Amounts of (token0, token1) held by `liquidity` across `[tick_lower, tick_upper]`
pub fn amounts_for_range(
    liquidity: u128,
    tick_lower: i32,
    tick_upper: i32,
    decimals0: u8,
    decimals1: u8,
) -> Result<(f64, f64), SimulationError> {
    if tick_upper < tick_lower {
        return Err(SimulationError::InvalidTickRange {
            lower: tick_lower,
            upper: tick_upper,
        });
    }
    if liquidity == 0 || tick_upper == tick_lower {
        return Ok((0.0, 0.0));
    }

    let liquidity = liquidity as f64;
    let sqrt_lower = tick_to_raw_price(tick_lower).sqrt();
    let sqrt_upper = tick_to_raw_price(tick_upper).sqrt();
    let sqrt_diff = sqrt_upper - sqrt_lower;

    let sqrt_product = sqrt_lower * sqrt_upper;
    let amount0_raw = if sqrt_product == 0.0 {
        0.0
    } else {
        liquidity * sqrt_diff / sqrt_product
    };
    let amount1_raw = liquidity * sqrt_diff;

    Ok((
        amount0_raw / 10_f64.powi(i32::from(decimals0)),
        amount1_raw / 10_f64.powi(i32::from(decimals1)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_liquidity_is_empty() {
        assert_eq!(amounts_for_range(0, -600, 600, 18, 6).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_degenerate_range_is_empty() {
        assert_eq!(amounts_for_range(10u128.pow(24), 120, 120, 18, 6).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = amounts_for_range(1_000, 60, 0, 18, 18).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidTickRange { lower: 60, upper: 0 }));
    }

    #[test]
    fn test_single_spacing_at_unit_price() {
        // [0, 60]: √P_lower = 1, √P_upper = 1.0001^30
        let liquidity = 10u128.pow(24);
        let (amount0, amount1) = amounts_for_range(liquidity, 0, 60, 18, 6).unwrap();

        let sqrt_upper = 1.0001_f64.powi(30);
        let expected0 = 1e24 * (sqrt_upper - 1.0) / sqrt_upper / 1e18;
        let expected1 = 1e24 * (sqrt_upper - 1.0) / 1e6;

        assert!((amount0 - expected0).abs() / expected0 < 1e-12);
        assert!((amount1 - expected1).abs() / expected1 < 1e-12);
    }

    #[test]
    fn test_amount_ratio_is_geometric_mean_price() {
        // amount1 / amount0 in raw units equals √(P_lower × P_upper)
        let (amount0, amount1) = amounts_for_range(5_000_000_000, -1200, -1140, 0, 0).unwrap();
        let expected = (tick_to_raw_price(-1200) * tick_to_raw_price(-1140)).sqrt();
        assert!((amount1 / amount0 - expected).abs() / expected < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_amounts_non_negative(
            liquidity in 0u128..10u128.pow(30),
            lower in -400_000i32..400_000,
            width in 0i32..2_000,
        ) {
            let (amount0, amount1) = amounts_for_range(liquidity, lower, lower + width, 18, 6).unwrap();
            prop_assert!(amount0 >= 0.0);
            prop_assert!(amount1 >= 0.0);
        }
    }
}
