//! Pool State Fetcher - eth_call reads against a live pool
//!
//! Each read is a single `eth_call` decoded with the `sol!` bindings below.
//! Nothing is cached: every walk sees the chain as it is when the call lands.

use alloy_primitives::{aliases::I24, Address, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use eyre::{eyre, Result};
use tracing::{debug, trace};

use super::provider::{PoolStateProvider, SpotState, TickInfo};

// ============================================
// CONTRACT INTERFACES
// ============================================

sol! {
    interface IUniswapV3Pool {
        function slot0() external view returns (
            uint160 sqrtPriceX96, int24 tick, uint16 observationIndex,
            uint16 observationCardinality, uint16 observationCardinalityNext,
            uint8 feeProtocol, bool unlocked
        );
        function ticks(int24 tick) external view returns (
            uint128 liquidityGross, int128 liquidityNet,
            uint256 feeGrowthOutside0X128, uint256 feeGrowthOutside1X128,
            int56 tickCumulativeOutside, uint160 secondsPerLiquidityOutsideX128,
            uint32 secondsOutside, bool initialized
        );
        function tickSpacing() external view returns (int24);
        function liquidity() external view returns (uint128);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }

    interface IERC20 {
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
}

// ============================================
// RPC POOL STATE PROVIDER
// ============================================

/// Reads a single concentrated-liquidity pool over JSON-RPC
pub struct RpcPoolStateProvider {
    rpc_url: String,
    pool: Address,
}

impl RpcPoolStateProvider {
    pub fn new(rpc_url: String, pool: Address) -> Self {
        Self { rpc_url, pool }
    }

    pub fn pool(&self) -> Address {
        self.pool
    }

    async fn call_contract(&self, to: Address, calldata: Vec<u8>) -> Result<Vec<u8>> {
        let provider = ProviderBuilder::new()
            .connect_http(self.rpc_url.parse()?);

        let tx = TransactionRequest::default()
            .to(to)
            .input(calldata.into());

        let result = provider.call(tx).await
            .map_err(|e| eyre!("eth_call to {:?} failed: {}", to, e))?;

        Ok(result.to_vec())
    }

    /// Current gas price in wei
    pub async fn gas_price(&self) -> Result<u128> {
        let provider = ProviderBuilder::new()
            .connect_http(self.rpc_url.parse()?);
        Ok(provider.get_gas_price().await?)
    }

    pub async fn block_number(&self) -> Result<u64> {
        let provider = ProviderBuilder::new()
            .connect_http(self.rpc_url.parse()?);
        Ok(provider.get_block_number().await?)
    }
}

#[async_trait]
impl PoolStateProvider for RpcPoolStateProvider {
    async fn spot_state(&self) -> Result<SpotState> {
        let output = self
            .call_contract(self.pool, IUniswapV3Pool::slot0Call {}.abi_encode())
            .await?;
        let slot0 = IUniswapV3Pool::slot0Call::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode slot0: {}", e))?;

        let spot = SpotState {
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick: slot0.tick.as_i32(),
        };
        debug!("slot0 for {:?}: tick {}, sqrtPriceX96 {}", self.pool, spot.tick, spot.sqrt_price_x96);
        Ok(spot)
    }

    async fn tick_spacing(&self) -> Result<i32> {
        let output = self
            .call_contract(self.pool, IUniswapV3Pool::tickSpacingCall {}.abi_encode())
            .await?;
        let spacing = IUniswapV3Pool::tickSpacingCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode tickSpacing: {}", e))?;
        Ok(spacing.as_i32())
    }

    async fn active_liquidity(&self) -> Result<u128> {
        let output = self
            .call_contract(self.pool, IUniswapV3Pool::liquidityCall {}.abi_encode())
            .await?;
        IUniswapV3Pool::liquidityCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode liquidity: {}", e))
    }

    async fn tick_info(&self, tick: i32) -> Result<TickInfo> {
        let tick_arg = I24::try_from(tick)
            .map_err(|_| eyre!("Tick {} does not fit in int24", tick))?;
        let output = self
            .call_contract(self.pool, IUniswapV3Pool::ticksCall { tick: tick_arg }.abi_encode())
            .await?;
        let decoded = IUniswapV3Pool::ticksCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode ticks({}): {}", tick, e))?;

        trace!(
            "ticks({}): gross {} net {} initialized {}",
            tick, decoded.liquidityGross, decoded.liquidityNet, decoded.initialized
        );
        Ok(TickInfo {
            liquidity_gross: decoded.liquidityGross,
            liquidity_net: decoded.liquidityNet,
            initialized: decoded.initialized,
        })
    }

    async fn token0(&self) -> Result<Address> {
        let output = self
            .call_contract(self.pool, IUniswapV3Pool::token0Call {}.abi_encode())
            .await?;
        IUniswapV3Pool::token0Call::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode token0: {}", e))
    }

    async fn token1(&self) -> Result<Address> {
        let output = self
            .call_contract(self.pool, IUniswapV3Pool::token1Call {}.abi_encode())
            .await?;
        IUniswapV3Pool::token1Call::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode token1: {}", e))
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        let output = self
            .call_contract(token, IERC20::decimalsCall {}.abi_encode())
            .await?;
        IERC20::decimalsCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode decimals for {:?}: {}", token, e))
    }

    async fn symbol(&self, token: Address) -> Result<String> {
        let output = self
            .call_contract(token, IERC20::symbolCall {}.abi_encode())
            .await?;
        IERC20::symbolCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode symbol for {:?}: {}", token, e))
    }
}
