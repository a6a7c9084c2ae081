//! Liquidity Scout - price impact estimation for concentrated-liquidity pools
//!
//! Shared by the `liquidity-scout` and `diagnose` binaries.

pub mod cartographer;
pub mod config;
pub mod error;
pub mod report;
pub mod simulator;
