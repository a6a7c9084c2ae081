//! Pool State Provider - the walker's only view of the chain
//!
//! One network-backed implementation (`RpcPoolStateProvider`) and one
//! in-memory double for tests. Every read is independent; callers decide
//! which failures are fatal.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use eyre::Result;
use serde::{Deserialize, Serialize};

/// Current pool price as stored in slot0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotState {
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

/// Liquidity bookkeeping for a single initialized (or not) tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInfo {
    /// Total liquidity referencing this tick
    pub liquidity_gross: u128,
    /// Liquidity added when price crosses this tick upward
    pub liquidity_net: i128,
    pub initialized: bool,
}

impl TickInfo {
    /// Stand-in for a tick whose read failed: no liquidity change
    pub const UNAVAILABLE: Self = Self {
        liquidity_gross: 0,
        liquidity_net: 0,
        initialized: false,
    };
}

#[async_trait]
pub trait PoolStateProvider: Send + Sync {
    /// sqrtPriceX96 and current tick
    async fn spot_state(&self) -> Result<SpotState>;

    async fn tick_spacing(&self) -> Result<i32>;

    /// Liquidity active at the current price
    async fn active_liquidity(&self) -> Result<u128>;

    async fn tick_info(&self, tick: i32) -> Result<TickInfo>;

    async fn token0(&self) -> Result<Address>;

    async fn token1(&self) -> Result<Address>;

    async fn decimals(&self, token: Address) -> Result<u8>;

    async fn symbol(&self, token: Address) -> Result<String>;
}
