//! The Simulator
//!
//! Responsible for:
//! - Tick and sqrtPriceX96 price conversions
//! - Token amounts held by a liquidity range
//! - Walking ticks upward to estimate the price impact of a buy

pub mod price_math;
pub mod range_amounts;
pub mod tick_walker;

pub use tick_walker::{CompletionReason, LiquidityAnalysis, TickDataQuality, TickWalker, TradeTarget};
