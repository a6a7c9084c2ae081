//! Price Math - tick, price and sqrtPriceX96 conversions
//!
//! All prices are `f64`. Raw prices are token1 per token0 in base units;
//! "decimal-adjusted" prices are quote per base in human units.

use alloy_primitives::U256;

use crate::error::SimulationError;

/// Highest tick an int24 pool can reach
pub const MAX_TICK: i32 = 887_272;

/// Price ratio between two adjacent ticks
const TICK_BASE: f64 = 1.0001;

/// 2^96, the fixed-point scale of sqrtPriceX96
const Q96: f64 = 79_228_162_514_264_337_593_543_950_336.0;

/// 2^64, one U256 limb
const LIMB: f64 = 18_446_744_073_709_551_616.0;

/// Relative gap under which two raw prices count as the same tick boundary.
/// Adjacent ticks differ by 1e-4, packing truncation is far below 1e-9.
const PRICE_EPSILON: f64 = 1e-9;

/// Raw price at a tick: `1.0001^tick`
pub fn tick_to_raw_price(tick: i32) -> f64 {
    if tick >= 0 {
        TICK_BASE.powi(tick)
    } else {
        1.0 / TICK_BASE.powi(-tick)
    }
}

/// Scale factor turning a raw price into quote-per-base human units
fn decimal_adjustment(decimals0: u8, decimals1: u8) -> f64 {
    10_f64.powi(i32::from(decimals0) - i32::from(decimals1))
}

/// Decimal-adjusted price at a tick
pub fn tick_to_price(tick: i32, decimals0: u8, decimals1: u8) -> f64 {
    tick_to_raw_price(tick) * decimal_adjustment(decimals0, decimals1)
}

/// Decode a packed sqrtPriceX96 into a decimal-adjusted price
pub fn sqrt_price_x96_to_price(sqrt_price_x96: U256, decimals0: u8, decimals1: u8) -> f64 {
    let sqrt_price = u256_to_f64(sqrt_price_x96) / Q96;
    sqrt_price * sqrt_price * decimal_adjustment(decimals0, decimals1)
}

/// Pack the square root of a tick's raw price as sqrtPriceX96
pub fn tick_to_sqrt_price_x96(tick: i32) -> U256 {
    f64_to_u256(tick_to_raw_price(tick).sqrt() * Q96)
}

/// Highest tick whose raw price does not exceed the packed price.
///
/// Returns `None` for a zero price (no tick maps to it).
pub fn sqrt_price_x96_to_tick(sqrt_price_x96: U256) -> Option<i32> {
    let sqrt_price = u256_to_f64(sqrt_price_x96) / Q96;
    if sqrt_price <= 0.0 {
        return None;
    }

    // log_1.0001(p) = 2 * ln(sqrt p) / ln(1.0001)
    let estimate = (2.0 * sqrt_price.ln() / TICK_BASE.ln()).floor() as i32;
    let bound = sqrt_price * sqrt_price * (1.0 + PRICE_EPSILON);

    // Nudge the float estimate onto the floor boundary
    let mut tick = estimate;
    while tick_to_raw_price(tick) > bound {
        tick -= 1;
    }
    while tick_to_raw_price(tick + 1) <= bound {
        tick += 1;
    }
    Some(tick)
}

/// Floor a tick onto the spacing grid (toward negative infinity)
pub fn align_tick_to_spacing(tick: i32, spacing: i32) -> Result<i32, SimulationError> {
    if spacing <= 0 {
        return Err(SimulationError::InvalidTickSpacing(spacing));
    }
    Ok(tick.div_euclid(spacing) * spacing)
}

/// Lossy U256 -> f64, valid over the full 256-bit range
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * LIMB + *limb as f64)
}

/// Truncating f64 -> U256 for non-negative values below 2^256
fn f64_to_u256(value: f64) -> U256 {
    if !value.is_finite() || value <= 0.0 {
        return U256::ZERO;
    }

    let mut limbs = [0u64; 4];
    let mut remainder = value.floor();
    for (i, limb) in limbs.iter_mut().enumerate().rev() {
        let scale = LIMB.powi(i as i32);
        let digit = (remainder / scale).floor();
        *limb = digit as u64;
        remainder -= digit * scale;
    }
    U256::from_limbs(limbs)
}
