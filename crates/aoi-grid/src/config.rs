//! Grid configuration.

use core::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// World and cell dimensions of a [`Grid`](crate::Grid).
///
/// Cells may be rectangular. The number of cells along an axis is
/// `ceil(map / cell)`, so the last column/row may extend past the map edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Map width in world units.
    pub map_width: f32,
    /// Map height in world units.
    pub map_height: f32,
    /// Cell width in world units.
    pub cell_width: f32,
    /// Cell height in world units.
    pub cell_height: f32,
    /// Emit per-operation diagnostics. Has no effect on behavior.
    #[serde(default)]
    pub debug: bool,
}

impl GridConfig {
    /// Create a new config with debug output disabled.
    #[must_use]
    pub const fn new(map_width: f32, map_height: f32, cell_width: f32, cell_height: f32) -> Self {
        Self {
            map_width,
            map_height,
            cell_width,
            cell_height,
            debug: false,
        }
    }

    /// Toggle debug diagnostics.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that every dimension is positive and finite, and that cells fit
    /// inside the map.
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("map_width", self.map_width),
            ("map_height", self.map_height),
            ("cell_width", self.cell_width),
            ("cell_height", self.cell_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidDimension { field, value });
            }
        }

        for (axis, cell, map) in [
            ("width", self.cell_width, self.map_width),
            ("height", self.cell_height, self.map_height),
        ] {
            if cell > map {
                return Err(ConfigError::CellLargerThanMap { axis, cell, map });
            }
        }

        let columns = (f64::from(self.map_width) / f64::from(self.cell_width)).ceil();
        let rows = (f64::from(self.map_height) / f64::from(self.cell_height)).ceil();
        if columns * rows > f64::from(u32::MAX) {
            return Err(ConfigError::TooManyCells { columns, rows });
        }

        Ok(())
    }

    /// Number of cell columns and rows. Assumes a validated config.
    #[must_use]
    pub fn grid_size(&self) -> (u32, u32) {
        let columns = (self.map_width / self.cell_width).ceil() as u32;
        let rows = (self.map_height / self.cell_height).ceil() as u32;
        (columns.max(1), rows.max(1))
    }
}

impl fmt::Display for GridConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GridConfig{{width: {:.2}, height: {:.2}, cell.w: {:.2}, cell.h: {:.2}}}",
            self.map_width, self.map_height, self.cell_width, self.cell_height
        )
    }
}
