//! Configuration for Liquidity Scout
//!
//! Values come from the environment (and `.env`), or from a TOML file, then
//! get overridden by command-line flags in `main`.

use alloy_primitives::Address;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::cartographer::SnapshotFallbacks;
use crate::simulator::TradeTarget;

/// HyperEVM public endpoint
pub const DEFAULT_RPC_URL: &str = "https://rpc.hyperliquid.xyz/evm";

/// WHYPE/USDT0 pool on HyperEVM
pub const DEFAULT_POOL_ADDRESS: &str = "0x3603ffebb994cc110b4186040cac3005b2cf4465";

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ========== Network Settings ==========
    pub rpc_url: String,

    /// Pool to walk
    pub pool_address: String,

    /// Symbol of the chain's gas token, for the gas line of the report
    pub native_symbol: String,

    // ========== Trade Settings ==========
    /// Quote-token amount to buy with, in human units
    pub trade_amount: f64,

    /// Stop once VWAP slippage exceeds this (0.002 = 0.2%)
    pub max_slippage: f64,

    /// Hard cap on tick ranges walked
    pub max_ticks: usize,

    /// Upcoming ticks read concurrently (1 = strictly sequential)
    pub tick_prefetch: usize,

    // ========== Fallbacks ==========
    /// Used when tickSpacing() fails or reports a non-positive value
    pub fallback_tick_spacing: i32,

    /// Used when decimals() fails
    pub fallback_decimals: u8,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            rpc_url: env::var("RPC_URL").unwrap_or(defaults.rpc_url),
            pool_address: env::var("POOL_ADDRESS").unwrap_or(defaults.pool_address),
            native_symbol: env::var("NATIVE_SYMBOL").unwrap_or(defaults.native_symbol),
            trade_amount: parse_env("TRADE_AMOUNT", defaults.trade_amount)?,
            max_slippage: parse_env("MAX_SLIPPAGE", defaults.max_slippage)?,
            max_ticks: parse_env("MAX_TICKS", defaults.max_ticks)?,
            tick_prefetch: parse_env("TICK_PREFETCH", defaults.tick_prefetch)?,
            fallback_tick_spacing: parse_env("FALLBACK_TICK_SPACING", defaults.fallback_tick_spacing)?,
            fallback_decimals: parse_env("FALLBACK_DECIMALS", defaults.fallback_decimals)?,
        })
    }

    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn pool(&self) -> Result<Address> {
        Address::from_str(&self.pool_address)
            .map_err(|e| eyre!("Invalid POOL_ADDRESS {}: {}", self.pool_address, e))
    }

    pub fn trade_target(&self) -> TradeTarget {
        TradeTarget {
            target_quote_amount: self.trade_amount,
            max_slippage: self.max_slippage,
            max_ticks_explored: self.max_ticks,
        }
    }

    pub fn fallbacks(&self) -> SnapshotFallbacks {
        SnapshotFallbacks {
            tick_spacing: self.fallback_tick_spacing,
            decimals: self.fallback_decimals,
            ..SnapshotFallbacks::default()
        }
    }

    /// Validate configuration before any RPC call is made
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() || self.rpc_url.contains("YOUR_API_KEY") {
            return Err(eyre!("Invalid RPC_URL - please set a reachable JSON-RPC endpoint"));
        }
        self.pool()?;

        self.trade_target()
            .validate()
            .map_err(|e| eyre!("Invalid trade settings: {}", e))?;

        if self.tick_prefetch == 0 {
            return Err(eyre!("TICK_PREFETCH must be at least 1"));
        }
        if self.fallback_tick_spacing <= 0 {
            return Err(eyre!(
                "FALLBACK_TICK_SPACING must be positive (currently {})",
                self.fallback_tick_spacing
            ));
        }
        if self.fallback_decimals > 36 {
            return Err(eyre!(
                "FALLBACK_DECIMALS above 36 is not a real token (currently {})",
                self.fallback_decimals
            ));
        }

        Ok(())
    }

    /// Every key `from_env` reads, with this config's value rendered as a string
    pub fn env_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("RPC_URL", self.rpc_url.clone()),
            ("POOL_ADDRESS", self.pool_address.clone()),
            ("TRADE_AMOUNT", self.trade_amount.to_string()),
            ("MAX_SLIPPAGE", self.max_slippage.to_string()),
            ("MAX_TICKS", self.max_ticks.to_string()),
            ("TICK_PREFETCH", self.tick_prefetch.to_string()),
            ("FALLBACK_TICK_SPACING", self.fallback_tick_spacing.to_string()),
            ("FALLBACK_DECIMALS", self.fallback_decimals.to_string()),
            ("NATIVE_SYMBOL", self.native_symbol.clone()),
        ]
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              LIQUIDITY SCOUT - CONFIGURATION               ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ NETWORK                                                    ║");
        println!("║ • RPC:             {:<40} ║", truncate(&self.rpc_url, 40));
        println!("║ • Pool:            {:<40} ║", truncate(&self.pool_address, 40));
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ TRADE                                                      ║");
        println!("║ • Amount:          {:<40.2} ║", self.trade_amount);
        println!("║ • Max Slippage:    {:>39.3}% ║", self.max_slippage * 100.0);
        println!("║ • Max Ticks:       {:<40} ║", self.max_ticks);
        println!("║ • Tick Prefetch:   {:<40} ║", self.tick_prefetch);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ FALLBACKS                                                  ║");
        println!("║ • Tick Spacing:    {:<40} ║", self.fallback_tick_spacing);
        println!("║ • Decimals:        {:<40} ║", self.fallback_decimals);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            pool_address: DEFAULT_POOL_ADDRESS.to_string(),
            native_symbol: "HYPE".to_string(),
            trade_amount: 150_000.0,
            max_slippage: 0.002,
            max_ticks: 1000,
            tick_prefetch: 1,
            fallback_tick_spacing: 60,
            fallback_decimals: 18,
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when unset.
/// A set but malformed value is an error rather than a silent default.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre!("Invalid {}={:?}: {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

/// Whether `value` parses the way `from_env` would parse `key`
pub fn env_value_parses(key: &str, value: &str) -> bool {
    let value = value.trim();
    match key {
        "TRADE_AMOUNT" | "MAX_SLIPPAGE" => value.parse::<f64>().is_ok(),
        "MAX_TICKS" | "TICK_PREFETCH" => value.parse::<usize>().is_ok(),
        "FALLBACK_TICK_SPACING" => value.parse::<i32>().is_ok(),
        "FALLBACK_DECIMALS" => value.parse::<u8>().is_ok(),
        "POOL_ADDRESS" => Address::from_str(value).is_ok(),
        _ => true,
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let head: String = value.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.trade_amount, 150_000.0);
        assert_eq!(config.max_slippage, 0.002);
        assert_eq!(config.max_ticks, 1000);
        assert_eq!(config.tick_prefetch, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trade_target_and_fallbacks() {
        let config = Config {
            trade_amount: 500.0,
            max_slippage: 0.01,
            max_ticks: 20,
            fallback_tick_spacing: 10,
            fallback_decimals: 6,
            ..Config::default()
        };

        let target = config.trade_target();
        assert_eq!(target.target_quote_amount, 500.0);
        assert_eq!(target.max_slippage, 0.01);
        assert_eq!(target.max_ticks_explored, 20);

        let fallbacks = config.fallbacks();
        assert_eq!(fallbacks.tick_spacing, 10);
        assert_eq!(fallbacks.decimals, 6);
        assert_eq!(fallbacks.symbol0, "TOKEN0");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            Config { pool_address: "0x1234".to_string(), ..Config::default() },
            Config { rpc_url: String::new(), ..Config::default() },
            Config { trade_amount: 0.0, ..Config::default() },
            Config { max_slippage: -0.5, ..Config::default() },
            Config { max_ticks: 0, ..Config::default() },
            Config { tick_prefetch: 0, ..Config::default() },
            Config { fallback_tick_spacing: 0, ..Config::default() },
            Config { fallback_decimals: 77, ..Config::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }
    }

    #[test]
    fn test_toml_round_trip_and_partial_file() {
        let dir = std::env::temp_dir().join(format!("liquidity-scout-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let path = dir.join("scout.toml");
        let config = Config {
            trade_amount: 42_000.0,
            tick_prefetch: 8,
            ..Config::default()
        };
        config.save_to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);

        let partial = dir.join("partial.toml");
        fs::write(&partial, "max_ticks = 50\n").unwrap();
        let loaded = Config::from_file(&partial).unwrap();
        assert_eq!(loaded.max_ticks, 50);
        assert_eq!(loaded.rpc_url, DEFAULT_RPC_URL);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_parse_env_default_when_unset() {
        let value: usize = parse_env("LIQUIDITY_SCOUT_TEST_UNSET_KEY", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_parse_env_rejects_malformed_value() {
        let key = "LIQUIDITY_SCOUT_TEST_MALFORMED_KEY";
        env::set_var(key, "twelve");
        let result: Result<usize> = parse_env(key, 7);
        env::remove_var(key);

        let err = result.unwrap_err().to_string();
        assert!(err.contains(key), "{}", err);
        assert!(err.contains("twelve"), "{}", err);
    }

    #[test]
    fn test_parse_env_trims_set_value() {
        let key = "LIQUIDITY_SCOUT_TEST_PADDED_KEY";
        env::set_var(key, " 0.01 ");
        let result: Result<f64> = parse_env(key, 0.5);
        env::remove_var(key);

        assert_eq!(result.unwrap(), 0.01);
    }

    #[test]
    fn test_default_env_values_parse() {
        for (key, value) in Config::default().env_values() {
            assert!(env_value_parses(key, &value), "default {}={} should parse", key, value);
        }
    }

    #[test]
    fn test_env_value_checks() {
        assert!(env_value_parses("POOL_ADDRESS", DEFAULT_POOL_ADDRESS));
        assert!(!env_value_parses("POOL_ADDRESS", "0x3603ffebb994cc110b4186040cac3005b2cf44zz"));
        assert!(!env_value_parses("POOL_ADDRESS", "0x1234"));
        assert!(!env_value_parses("FALLBACK_DECIMALS", "300"));
        assert!(!env_value_parses("MAX_TICKS", "-1"));
        assert!(env_value_parses("TRADE_AMOUNT", "150000"));
        assert!(env_value_parses("NATIVE_SYMBOL", "anything"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("https://example.com/very/long", 10), "https:/...");
    }
}
