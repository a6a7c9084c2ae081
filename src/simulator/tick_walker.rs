//! Tick Walker - upward swap simulation across initialized ticks
//!
//! Spends a target amount of the quote token (token1) buying the base token
//! (token0), one tick-spacing range at a time, starting from the aligned
//! current tick. Each range is filled from the liquidity active below its
//! upper boundary; crossing the boundary then applies that tick's
//! `liquidity_net`.
//!
//! A partial range fill is split across both tokens by the fraction of the
//! range's quote capacity used, which treats liquidity as uniform inside the
//! range. This is a first-order estimate, not exact curve integration.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use super::price_math::{tick_to_price, MAX_TICK};
use super::range_amounts::amounts_for_range;
use crate::cartographer::{PoolSnapshot, PoolStateProvider, TickInfo};
use crate::error::SimulationError;

// ============================================
// INPUTS
// ============================================

/// What to buy and when to give up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeTarget {
    /// Quote-token amount to spend, in human units
    pub target_quote_amount: f64,
    /// Fractional bound on VWAP slippage (0.002 = 0.2%)
    pub max_slippage: f64,
    /// Hard cap on ranges walked, bounds RPC cost
    pub max_ticks_explored: usize,
}

impl TradeTarget {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.target_quote_amount.is_finite() || self.target_quote_amount <= 0.0 {
            return Err(SimulationError::InvalidTarget(format!(
                "target amount must be positive, got {}",
                self.target_quote_amount
            )));
        }
        if !self.max_slippage.is_finite() || self.max_slippage < 0.0 {
            return Err(SimulationError::InvalidTarget(format!(
                "max slippage must be a non-negative fraction, got {}",
                self.max_slippage
            )));
        }
        if self.max_ticks_explored == 0 {
            return Err(SimulationError::InvalidTarget(
                "max ticks explored must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================
// OUTPUTS
// ============================================

/// Why the walk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionReason {
    TargetFilled,
    SlippageExceeded,
    SafetyCapReached,
}

impl std::fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionReason::TargetFilled => write!(f, "target filled"),
            CompletionReason::SlippageExceeded => write!(f, "max slippage exceeded"),
            CompletionReason::SafetyCapReached => write!(f, "safety tick cap reached"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Running,
    Completed(CompletionReason),
}

/// Whether a step's tick data came from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickDataQuality {
    Fetched,
    /// Read failed; zero liquidity change was assumed at this tick
    Unavailable,
}

/// One range walked, `[tick_lower, tick]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStep {
    pub tick_lower: i32,
    /// Boundary crossed into
    pub tick: i32,
    pub price: f64,
    pub liquidity_gross: u128,
    pub liquidity_net: i128,
    pub initialized: bool,
    pub quality: TickDataQuality,
    /// Liquidity the range was filled from
    pub active_liquidity: u128,
    pub base_available: f64,
    pub quote_available: f64,
    pub base_filled: f64,
    pub quote_filled: f64,
    /// Quote token is USD-denominated, so this equals `quote_filled`
    pub value_usd: f64,
    pub cumulative_quote_filled: f64,
    pub average_price: f64,
    pub slippage: f64,
}

/// Result of one walk. Built once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityAnalysis {
    pub target: TradeTarget,
    pub completion: CompletionReason,
    /// Sum of `liquidity_gross` over crossed ticks
    pub cumulated_liquidity_gross: u128,
    pub start_tick: i32,
    pub end_tick: i32,
    pub start_price: f64,
    pub end_price: f64,
    /// Pool spot price before the trade
    pub reference_price: f64,
    pub steps: Vec<SimulationStep>,
    pub total_quote_filled: f64,
    pub total_base_bought: f64,
    pub average_execution_price: f64,
    pub slippage: f64,
}

impl LiquidityAnalysis {
    pub fn completion_pct(&self) -> f64 {
        self.total_quote_filled / self.target.target_quote_amount * 100.0
    }

    pub fn ticks_crossed(&self) -> usize {
        self.steps.len()
    }

    /// Steps whose tick data was assumed rather than read
    pub fn degraded_steps(&self) -> impl Iterator<Item = &SimulationStep> {
        self.steps
            .iter()
            .filter(|s| s.quality == TickDataQuality::Unavailable)
    }
}

// ============================================
// WALK STATE
// ============================================

/// Mutable state of one walk in progress
#[derive(Debug)]
struct WalkCursor {
    tick: i32,
    price: f64,
    active_liquidity: u128,
    filled: f64,
    base_bought: f64,
    cumulated_liquidity_gross: u128,
    iterations: usize,
    steps: Vec<SimulationStep>,
}

/// Fill of one range, before its upper tick is read
#[derive(Debug, Clone, Copy)]
struct RangeFill {
    tick_next: i32,
    price_next: f64,
    base_available: f64,
    quote_available: f64,
    base_filled: f64,
    quote_filled: f64,
}

impl WalkCursor {
    fn new(tick: i32, price: f64, active_liquidity: u128) -> Self {
        Self {
            tick,
            price,
            active_liquidity,
            filled: 0.0,
            base_bought: 0.0,
            cumulated_liquidity_gross: 0,
            iterations: 0,
            steps: Vec::new(),
        }
    }

    /// Upper boundary of the next range, `None` past the top of the tick domain
    fn next_boundary(&self, spacing: i32) -> Option<i32> {
        self.tick
            .checked_add(spacing)
            .filter(|tick| *tick <= MAX_TICK)
    }

    /// How much of the range below `tick_next` the remaining target consumes
    fn fill_next_range(
        &self,
        tick_next: i32,
        snapshot: &PoolSnapshot,
        target: &TradeTarget,
    ) -> Result<RangeFill, SimulationError> {
        let price_next = tick_to_price(tick_next, snapshot.decimals0, snapshot.decimals1);

        let (base_available, quote_available) = amounts_for_range(
            self.active_liquidity,
            self.tick,
            tick_next,
            snapshot.decimals0,
            snapshot.decimals1,
        )?;

        let remaining = target.target_quote_amount - self.filled;
        let quote_filled = remaining.min(quote_available);
        let fill_ratio = if quote_available > 0.0 {
            quote_filled / quote_available
        } else {
            0.0
        };

        Ok(RangeFill {
            tick_next,
            price_next,
            base_available,
            quote_available,
            base_filled: base_available * fill_ratio,
            quote_filled,
        })
    }

    /// Apply a fill and record the step; returns the running slippage
    fn record(
        &mut self,
        fill: RangeFill,
        tick_info: TickInfo,
        quality: TickDataQuality,
        target: &TradeTarget,
        reference_price: f64,
    ) -> f64 {
        self.iterations += 1;

        let remaining = target.target_quote_amount - self.filled;
        if fill.quote_filled >= remaining {
            // Land exactly on the target instead of an ulp either side
            self.filled = target.target_quote_amount;
        } else {
            self.filled += fill.quote_filled;
        }
        self.base_bought += fill.base_filled;

        let average_price = average_price(self.filled, self.base_bought, reference_price);
        let slippage = slippage(average_price, reference_price);

        self.steps.push(SimulationStep {
            tick_lower: self.tick,
            tick: fill.tick_next,
            price: fill.price_next,
            liquidity_gross: tick_info.liquidity_gross,
            liquidity_net: tick_info.liquidity_net,
            initialized: tick_info.initialized,
            quality,
            active_liquidity: self.active_liquidity,
            base_available: fill.base_available,
            quote_available: fill.quote_available,
            base_filled: fill.base_filled,
            quote_filled: fill.quote_filled,
            value_usd: fill.quote_filled,
            cumulative_quote_filled: self.filled,
            average_price,
            slippage,
        });

        slippage
    }

    /// Stop conditions, in priority order
    fn check_termination(&self, slippage: f64, target: &TradeTarget) -> WalkState {
        if self.filled >= target.target_quote_amount {
            WalkState::Completed(CompletionReason::TargetFilled)
        } else if slippage > target.max_slippage {
            WalkState::Completed(CompletionReason::SlippageExceeded)
        } else if self.iterations >= target.max_ticks_explored {
            WalkState::Completed(CompletionReason::SafetyCapReached)
        } else {
            WalkState::Running
        }
    }

    /// Cross the upper boundary of the range just filled
    fn cross(&mut self, tick_info: TickInfo) {
        self.active_liquidity = apply_liquidity_net(self.active_liquidity, tick_info.liquidity_net);
        self.cumulated_liquidity_gross = self
            .cumulated_liquidity_gross
            .saturating_add(tick_info.liquidity_gross);
    }

    fn advance_to(&mut self, fill: &RangeFill) {
        self.tick = fill.tick_next;
        self.price = fill.price_next;
    }
}

/// Active liquidity after crossing a tick upward, floored at zero
pub fn apply_liquidity_net(active_liquidity: u128, liquidity_net: i128) -> u128 {
    if liquidity_net >= 0 {
        active_liquidity.saturating_add(liquidity_net.unsigned_abs())
    } else {
        active_liquidity.saturating_sub(liquidity_net.unsigned_abs())
    }
}

fn average_price(quote_filled: f64, base_bought: f64, reference_price: f64) -> f64 {
    if base_bought > 0.0 {
        quote_filled / base_bought
    } else {
        reference_price
    }
}

fn slippage(average_price: f64, reference_price: f64) -> f64 {
    if reference_price == 0.0 {
        0.0
    } else {
        (average_price - reference_price) / reference_price
    }
}

// ============================================
// TICK FEED
// ============================================

/// Upcoming boundary reads, optionally fetched a window at a time.
///
/// Boundaries are consumed strictly in walk order, so a window larger than
/// one changes how many reads are issued, never what the walk sees.
struct TickFeed<'a, P: ?Sized> {
    provider: &'a P,
    next_tick: i32,
    spacing: i32,
    window: usize,
    /// Reads still allowed under the safety cap
    budget: usize,
    buffered: VecDeque<(i32, eyre::Result<TickInfo>)>,
}

impl<'a, P: PoolStateProvider + ?Sized> TickFeed<'a, P> {
    fn new(provider: &'a P, start_tick: i32, spacing: i32, window: usize, budget: usize) -> Self {
        Self {
            provider,
            next_tick: start_tick.saturating_add(spacing),
            spacing,
            window: window.max(1),
            budget,
            buffered: VecDeque::new(),
        }
    }

    async fn read(&mut self, tick: i32) -> (TickInfo, TickDataQuality) {
        if self.buffered.is_empty() {
            self.refill().await;
        }

        match self.buffered.pop_front() {
            Some((buffered_tick, Ok(info))) if buffered_tick == tick => {
                (info, TickDataQuality::Fetched)
            }
            Some((buffered_tick, Err(e))) if buffered_tick == tick => {
                warn!(
                    "Failed to read tick {} ({:#}) - assuming no liquidity change",
                    tick, e
                );
                (TickInfo::UNAVAILABLE, TickDataQuality::Unavailable)
            }
            _ => {
                warn!("Tick feed out of step at {} - assuming no liquidity change", tick);
                (TickInfo::UNAVAILABLE, TickDataQuality::Unavailable)
            }
        }
    }

    async fn refill(&mut self) {
        let count = self.window.min(self.budget).max(1);
        let ticks: Vec<i32> = std::iter::successors(Some(self.next_tick), |tick| {
            tick.checked_add(self.spacing)
        })
        .take_while(|tick| *tick <= MAX_TICK)
        .take(count)
        .collect();

        let reads = join_all(ticks.iter().map(|tick| self.provider.tick_info(*tick))).await;

        if let Some(last) = ticks.last() {
            self.next_tick = last.saturating_add(self.spacing);
        }
        self.budget = self.budget.saturating_sub(ticks.len());
        self.buffered.extend(ticks.into_iter().zip(reads));
    }
}

// ============================================
// TICK WALKER
// ============================================

/// Walks one pool snapshot upward until the target, the slippage bound or
/// the safety cap stops it
pub struct TickWalker<'a, P: ?Sized> {
    provider: &'a P,
    snapshot: &'a PoolSnapshot,
    target: TradeTarget,
    prefetch: usize,
}

impl<'a, P: PoolStateProvider + ?Sized> TickWalker<'a, P> {
    pub fn new(provider: &'a P, snapshot: &'a PoolSnapshot, target: TradeTarget) -> Self {
        Self {
            provider,
            snapshot,
            target,
            prefetch: 1,
        }
    }

    /// Read up to `window` upcoming ticks concurrently
    pub fn with_prefetch(mut self, window: usize) -> Self {
        self.prefetch = window.max(1);
        self
    }

    pub async fn run(self) -> Result<LiquidityAnalysis, SimulationError> {
        self.target.validate()?;

        let snapshot = self.snapshot;
        let target = self.target;
        let start_tick = snapshot.aligned_tick()?;
        let start_price = tick_to_price(start_tick, snapshot.decimals0, snapshot.decimals1);
        let reference_price = snapshot.spot_price();

        info!(
            "Simulating purchase of {:.2} {} worth of {} (max slippage {:.3}%)",
            target.target_quote_amount,
            snapshot.symbol1,
            snapshot.symbol0,
            target.max_slippage * 100.0
        );
        debug!(
            "Start tick {} (raw {}), price {:.12}, reference {:.12}, liquidity {}, spacing {}",
            start_tick,
            snapshot.tick,
            start_price,
            reference_price,
            snapshot.liquidity,
            snapshot.tick_spacing
        );

        let mut cursor = WalkCursor::new(start_tick, start_price, snapshot.liquidity);
        let mut feed = TickFeed::new(
            self.provider,
            start_tick,
            snapshot.tick_spacing,
            self.prefetch,
            target.max_ticks_explored,
        );

        let completion = loop {
            let Some(tick_next) = cursor.next_boundary(snapshot.tick_spacing) else {
                warn!(
                    "Walk reached the top of the tick range ({}) at tick {}",
                    MAX_TICK, cursor.tick
                );
                break CompletionReason::SafetyCapReached;
            };
            let fill = cursor.fill_next_range(tick_next, snapshot, &target)?;
            let (tick_info, quality) = feed.read(fill.tick_next).await;
            let slippage = cursor.record(fill, tick_info, quality, &target, reference_price);

            debug!(
                "Tick {} -> {}: liquidity {}, filled {:.2}/{:.2} {} ({:.6} {}), slippage {:.4}%",
                cursor.tick,
                fill.tick_next,
                cursor.active_liquidity,
                fill.quote_filled,
                fill.quote_available,
                snapshot.symbol1,
                fill.base_filled,
                snapshot.symbol0,
                slippage * 100.0
            );

            match cursor.check_termination(slippage, &target) {
                WalkState::Completed(reason) => {
                    cursor.advance_to(&fill);
                    break reason;
                }
                WalkState::Running => {
                    cursor.cross(tick_info);
                    cursor.advance_to(&fill);
                }
            }
        };

        let average_execution_price =
            average_price(cursor.filled, cursor.base_bought, reference_price);
        let slippage = slippage(average_execution_price, reference_price);

        info!(
            "Walk finished ({}): {:.2}/{:.2} {} over {} ticks, slippage {:.4}%",
            completion,
            cursor.filled,
            target.target_quote_amount,
            snapshot.symbol1,
            cursor.steps.len(),
            slippage * 100.0
        );

        Ok(LiquidityAnalysis {
            target,
            completion,
            cumulated_liquidity_gross: cursor.cumulated_liquidity_gross,
            start_tick,
            end_tick: cursor.tick,
            start_price,
            end_price: cursor.price,
            reference_price,
            steps: cursor.steps,
            total_quote_filled: cursor.filled,
            total_base_bought: cursor.base_bought,
            average_execution_price,
            slippage,
        })
    }
}
