//! Pool Snapshot - one consistent read of pool state before a walk
//!
//! Only slot0 and the token addresses are required. Everything else falls
//! back to a documented default, and the fallback is recorded on the
//! snapshot so the report can flag it.

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::provider::PoolStateProvider;
use crate::error::SimulationError;
use crate::simulator::price_math::{
    align_tick_to_spacing, sqrt_price_x96_to_price, sqrt_price_x96_to_tick, tick_to_price,
};

/// Defaults used when a non-critical read fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFallbacks {
    pub tick_spacing: i32,
    pub decimals: u8,
    pub symbol0: String,
    pub symbol1: String,
}

impl Default for SnapshotFallbacks {
    fn default() -> Self {
        Self {
            tick_spacing: 60,
            decimals: 18,
            symbol0: "TOKEN0".to_string(),
            symbol1: "TOKEN1".to_string(),
        }
    }
}

/// A provider read that was replaced by its default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotFallback {
    TickSpacing,
    Liquidity,
    Decimals0,
    Decimals1,
    Symbol0,
    Symbol1,
}

impl std::fmt::Display for SnapshotFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotFallback::TickSpacing => write!(f, "tickSpacing"),
            SnapshotFallback::Liquidity => write!(f, "liquidity"),
            SnapshotFallback::Decimals0 => write!(f, "token0.decimals"),
            SnapshotFallback::Decimals1 => write!(f, "token1.decimals"),
            SnapshotFallback::Symbol0 => write!(f, "token0.symbol"),
            SnapshotFallback::Symbol1 => write!(f, "token1.symbol"),
        }
    }
}

/// Immutable pool state captured at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pool: Address,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub tick_spacing: i32,
    pub liquidity: u128,
    pub token0: Address,
    pub token1: Address,
    pub decimals0: u8,
    pub decimals1: u8,
    pub symbol0: String,
    pub symbol1: String,
    pub captured_at: DateTime<Utc>,
    pub fallbacks: Vec<SnapshotFallback>,
}

impl PoolSnapshot {
    /// Read everything the walk needs from `provider`.
    ///
    /// Fails only when slot0 or a token address cannot be read.
    pub async fn capture<P: PoolStateProvider + ?Sized>(
        provider: &P,
        pool: Address,
        defaults: &SnapshotFallbacks,
    ) -> Result<Self, SimulationError> {
        let spot = provider.spot_state().await.map_err(|e| unavailable("slot0", e))?;
        let token0 = provider.token0().await.map_err(|e| unavailable("token0", e))?;
        let token1 = provider.token1().await.map_err(|e| unavailable("token1", e))?;

        let mut fallbacks = Vec::new();

        let tick_spacing = match provider.tick_spacing().await {
            Ok(spacing) if spacing > 0 => spacing,
            Ok(spacing) => {
                warn!("Pool reported tick spacing {}, using {}", spacing, defaults.tick_spacing);
                fallbacks.push(SnapshotFallback::TickSpacing);
                defaults.tick_spacing
            }
            Err(e) => {
                warn!("tickSpacing() failed ({}), using {}", e, defaults.tick_spacing);
                fallbacks.push(SnapshotFallback::TickSpacing);
                defaults.tick_spacing
            }
        };

        let liquidity = match provider.active_liquidity().await {
            Ok(liquidity) => liquidity,
            Err(e) => {
                warn!("liquidity() failed ({}), assuming 0", e);
                fallbacks.push(SnapshotFallback::Liquidity);
                0
            }
        };

        let decimals0 = match provider.decimals(token0).await {
            Ok(d) => d,
            Err(e) => {
                warn!("decimals() failed for {:?} ({}), using {}", token0, e, defaults.decimals);
                fallbacks.push(SnapshotFallback::Decimals0);
                defaults.decimals
            }
        };
        let decimals1 = match provider.decimals(token1).await {
            Ok(d) => d,
            Err(e) => {
                warn!("decimals() failed for {:?} ({}), using {}", token1, e, defaults.decimals);
                fallbacks.push(SnapshotFallback::Decimals1);
                defaults.decimals
            }
        };

        let symbol0 = match provider.symbol(token0).await {
            Ok(s) => s,
            Err(_) => {
                fallbacks.push(SnapshotFallback::Symbol0);
                defaults.symbol0.clone()
            }
        };
        let symbol1 = match provider.symbol(token1).await {
            Ok(s) => s,
            Err(_) => {
                fallbacks.push(SnapshotFallback::Symbol1);
                defaults.symbol1.clone()
            }
        };

        let snapshot = Self {
            pool,
            sqrt_price_x96: spot.sqrt_price_x96,
            tick: spot.tick,
            tick_spacing,
            liquidity,
            token0,
            token1,
            decimals0,
            decimals1,
            symbol0,
            symbol1,
            captured_at: Utc::now(),
            fallbacks,
        };
        snapshot.check_spot_consistency();

        Ok(snapshot)
    }

    /// Spot price from sqrtPriceX96, quote per base
    pub fn spot_price(&self) -> f64 {
        sqrt_price_x96_to_price(self.sqrt_price_x96, self.decimals0, self.decimals1)
    }

    /// Current tick floored onto the spacing grid
    pub fn aligned_tick(&self) -> Result<i32, SimulationError> {
        align_tick_to_spacing(self.tick, self.tick_spacing)
    }

    /// Price at the aligned tick, where the walk starts
    pub fn aligned_price(&self) -> Result<f64, SimulationError> {
        Ok(tick_to_price(self.aligned_tick()?, self.decimals0, self.decimals1))
    }

    pub fn is_degraded(&self) -> bool {
        !self.fallbacks.is_empty()
    }

    /// slot0.tick should be the floor tick of sqrtPriceX96
    fn check_spot_consistency(&self) {
        match sqrt_price_x96_to_tick(self.sqrt_price_x96) {
            Some(implied) if (implied - self.tick).abs() > 1 => warn!(
                "slot0 tick {} disagrees with sqrtPriceX96 (implies tick {})",
                self.tick, implied
            ),
            Some(implied) => debug!("slot0 tick {} consistent (implied {})", self.tick, implied),
            None => warn!("slot0 sqrtPriceX96 is zero - spot price unavailable"),
        }
    }
}

fn unavailable(field: &'static str, e: eyre::Report) -> SimulationError {
    SimulationError::SnapshotUnavailable {
        field,
        reason: format!("{:#}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartographer::memory::{InMemoryPool, TEST_TOKEN0, TEST_TOKEN1};
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_capture_healthy_pool() {
        let pool = InMemoryPool::new(-201_234, 60, 42_000_000, 18, 6);
        let snapshot = assert_ok!(
            PoolSnapshot::capture(&pool, Address::ZERO, &SnapshotFallbacks::default()).await
        );

        assert_eq!(snapshot.tick, -201_234);
        assert_eq!(snapshot.tick_spacing, 60);
        assert_eq!(snapshot.liquidity, 42_000_000);
        assert_eq!(snapshot.token0, TEST_TOKEN0);
        assert_eq!(snapshot.token1, TEST_TOKEN1);
        assert_eq!((snapshot.decimals0, snapshot.decimals1), (18, 6));
        assert_eq!(snapshot.symbol0, "HYPE");
        assert!(!snapshot.is_degraded());
        assert_eq!(snapshot.aligned_tick().unwrap(), -201_240);
    }

    #[tokio::test]
    async fn test_capture_applies_fallbacks() {
        let mut pool = InMemoryPool::new(1_000, 10, 5, 6, 6);
        pool.tick_spacing = None;
        pool.liquidity = None;
        pool.decimals.clear();
        pool.symbols.clear();

        let snapshot = PoolSnapshot::capture(&pool, Address::ZERO, &SnapshotFallbacks::default())
            .await
            .unwrap();

        assert_eq!(snapshot.tick_spacing, 60);
        assert_eq!(snapshot.liquidity, 0);
        assert_eq!((snapshot.decimals0, snapshot.decimals1), (18, 18));
        assert_eq!(snapshot.symbol0, "TOKEN0");
        assert_eq!(snapshot.symbol1, "TOKEN1");
        assert_eq!(
            snapshot.fallbacks,
            vec![
                SnapshotFallback::TickSpacing,
                SnapshotFallback::Liquidity,
                SnapshotFallback::Decimals0,
                SnapshotFallback::Decimals1,
                SnapshotFallback::Symbol0,
                SnapshotFallback::Symbol1,
            ]
        );
    }

    #[tokio::test]
    async fn test_non_positive_spacing_falls_back() {
        let mut pool = InMemoryPool::new(0, 60, 1, 18, 18);
        pool.tick_spacing = Some(0);

        let defaults = SnapshotFallbacks {
            tick_spacing: 200,
            ..SnapshotFallbacks::default()
        };
        let snapshot = PoolSnapshot::capture(&pool, Address::ZERO, &defaults).await.unwrap();
        assert_eq!(snapshot.tick_spacing, 200);
        assert_eq!(snapshot.fallbacks, vec![SnapshotFallback::TickSpacing]);
    }

    #[tokio::test]
    async fn test_spot_failure_is_fatal() {
        let mut pool = InMemoryPool::new(0, 60, 1, 18, 18);
        pool.spot = None;

        let err = PoolSnapshot::capture(&pool, Address::ZERO, &SnapshotFallbacks::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::SnapshotUnavailable { field: "slot0", .. }));
    }

    #[tokio::test]
    async fn test_token_failure_is_fatal() {
        let mut pool = InMemoryPool::new(0, 60, 1, 18, 18);
        pool.token1 = None;

        let err = PoolSnapshot::capture(&pool, Address::ZERO, &SnapshotFallbacks::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::SnapshotUnavailable { field: "token1", .. }));
    }

    #[tokio::test]
    async fn test_spot_price_matches_tick_price() {
        let pool = InMemoryPool::new(-201_240, 60, 1, 18, 6);
        let snapshot = PoolSnapshot::capture(&pool, Address::ZERO, &SnapshotFallbacks::default())
            .await
            .unwrap();

        let spot = snapshot.spot_price();
        let aligned = snapshot.aligned_price().unwrap();
        assert!((spot - aligned).abs() / aligned < 1e-9);
    }
}
