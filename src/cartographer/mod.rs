//! The Cartographer (Data Ingest)
//!
//! Reads pool state over RPC and freezes it into a snapshot for the walk.

mod fetcher;
mod provider;
mod snapshot;

#[cfg(test)]
pub mod memory;

pub use fetcher::RpcPoolStateProvider;
pub use provider::{PoolStateProvider, TickInfo};
pub use snapshot::{PoolSnapshot, SnapshotFallbacks};
