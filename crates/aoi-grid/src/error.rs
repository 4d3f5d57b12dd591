//! Configuration error types.

use thiserror::Error;

/// Error returned when a [`GridConfig`](crate::GridConfig) cannot be used to
/// build a grid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A dimension is zero, negative, NaN or infinite.
    #[error("{field} must be a positive finite number, got {value}")]
    InvalidDimension {
        /// Config field name.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// A cell is wider or taller than the map.
    #[error("cell {axis} ({cell}) exceeds map {axis} ({map})")]
    CellLargerThanMap {
        /// `"width"` or `"height"`.
        axis: &'static str,
        /// Cell dimension on that axis.
        cell: f32,
        /// Map dimension on that axis.
        map: f32,
    },

    /// The grid would need more cells than can be addressed.
    #[error("grid of {columns} x {rows} cells is too large")]
    TooManyCells {
        /// Cell columns required.
        columns: f64,
        /// Cell rows required.
        rows: f64,
    },

    /// JSON parse error.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
