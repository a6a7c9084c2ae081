use thiserror::Error;

/// Errors raised by the price math and the tick walk.
///
/// Provider-level failures are `eyre` reports; the ones the walk cannot
/// recover from are folded into `SnapshotUnavailable`.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid tick spacing {0} - spacing must be positive")]
    InvalidTickSpacing(i32),

    #[error("Invalid tick range - upper tick {upper} is below lower tick {lower}")]
    InvalidTickRange { lower: i32, upper: i32 },

    #[error("Invalid trade target - {0}")]
    InvalidTarget(String),

    #[error("Pool snapshot unavailable - could not read {field}: {reason}")]
    SnapshotUnavailable { field: &'static str, reason: String },
}
