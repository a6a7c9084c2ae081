//! In-memory pool for deterministic tests of the snapshot and the walk

use alloy_primitives::{address, Address};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::provider::{PoolStateProvider, SpotState, TickInfo};
use crate::simulator::price_math::tick_to_sqrt_price_x96;

pub const TEST_TOKEN0: Address = address!("5555555555555555555555555555555555555555");
pub const TEST_TOKEN1: Address = address!("b8ce59fc3717ada4c02eadf9682a9e934f625ebb");

/// Pool state held in maps. `None` fields fail their read.
#[derive(Debug)]
pub struct InMemoryPool {
    pub spot: Option<SpotState>,
    pub tick_spacing: Option<i32>,
    pub liquidity: Option<u128>,
    pub token0: Option<Address>,
    pub token1: Option<Address>,
    pub ticks: HashMap<i32, TickInfo>,
    pub failing_ticks: HashSet<i32>,
    pub decimals: HashMap<Address, u8>,
    pub symbols: HashMap<Address, String>,
    tick_reads: AtomicUsize,
}

impl InMemoryPool {
    /// Pool sitting exactly on `tick` with every read succeeding
    pub fn new(tick: i32, tick_spacing: i32, liquidity: u128, decimals0: u8, decimals1: u8) -> Self {
        Self {
            spot: Some(SpotState {
                sqrt_price_x96: tick_to_sqrt_price_x96(tick),
                tick,
            }),
            tick_spacing: Some(tick_spacing),
            liquidity: Some(liquidity),
            token0: Some(TEST_TOKEN0),
            token1: Some(TEST_TOKEN1),
            ticks: HashMap::new(),
            failing_ticks: HashSet::new(),
            decimals: HashMap::from([(TEST_TOKEN0, decimals0), (TEST_TOKEN1, decimals1)]),
            symbols: HashMap::from([
                (TEST_TOKEN0, "HYPE".to_string()),
                (TEST_TOKEN1, "USDT".to_string()),
            ]),
            tick_reads: AtomicUsize::new(0),
        }
    }

    pub fn with_tick(mut self, tick: i32, liquidity_gross: u128, liquidity_net: i128) -> Self {
        self.ticks.insert(
            tick,
            TickInfo {
                liquidity_gross,
                liquidity_net,
                initialized: true,
            },
        );
        self
    }

    pub fn with_failing_tick(mut self, tick: i32) -> Self {
        self.failing_ticks.insert(tick);
        self
    }

    /// Number of `tick_info` calls served so far
    pub fn tick_reads(&self) -> usize {
        self.tick_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolStateProvider for InMemoryPool {
    async fn spot_state(&self) -> Result<SpotState> {
        self.spot.ok_or_else(|| eyre!("slot0 reverted"))
    }

    async fn tick_spacing(&self) -> Result<i32> {
        self.tick_spacing.ok_or_else(|| eyre!("tickSpacing reverted"))
    }

    async fn active_liquidity(&self) -> Result<u128> {
        self.liquidity.ok_or_else(|| eyre!("liquidity reverted"))
    }

    async fn tick_info(&self, tick: i32) -> Result<TickInfo> {
        self.tick_reads.fetch_add(1, Ordering::SeqCst);
        if self.failing_ticks.contains(&tick) {
            return Err(eyre!("ticks({}) timed out", tick));
        }
        Ok(self.ticks.get(&tick).copied().unwrap_or_default())
    }

    async fn token0(&self) -> Result<Address> {
        self.token0.ok_or_else(|| eyre!("token0 reverted"))
    }

    async fn token1(&self) -> Result<Address> {
        self.token1.ok_or_else(|| eyre!("token1 reverted"))
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        self.decimals
            .get(&token)
            .copied()
            .ok_or_else(|| eyre!("decimals reverted for {:?}", token))
    }

    async fn symbol(&self, token: Address) -> Result<String> {
        self.symbols
            .get(&token)
            .cloned()
            .ok_or_else(|| eyre!("symbol reverted for {:?}", token))
    }
}
