//! World positions, cell coordinates and query windows.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A point in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position{{x: {:.2}, y: {:.2}}}", self.x, self.y)
    }
}

/// Column/row index of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: u32,
    pub y: u32,
}

impl CellCoord {
    /// Create a new cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inclusive rectangle of cell coordinates.
///
/// Produced by [`Window::around`]: a square of side `2r + 1` that is shifted,
/// never truncated, when it would cross a grid edge. Only a grid narrower than
/// the requested side yields a smaller window.
///
/// ```text
///   max = 9, r = 2
///   c = 0 → [0, 4]     (shifted right)
///   c = 5 → [3, 7]     (centered)
///   c = 9 → [5, 9]     (shifted left)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Window {
    /// Lowest corner (inclusive).
    pub min: CellCoord,
    /// Highest corner (inclusive).
    pub max: CellCoord,
}

impl Window {
    /// Window of radius `radius` around `center`, clamped to `[0, bound]`.
    #[must_use]
    pub fn around(center: CellCoord, radius: u32, bound: CellCoord) -> Self {
        let (min_x, max_x) = axis_range(center.x, radius, bound.x);
        let (min_y, max_y) = axis_range(center.y, radius, bound.y);
        Self {
            min: CellCoord::new(min_x, min_y),
            max: CellCoord::new(max_x, max_y),
        }
    }

    /// Number of columns covered.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.max.x - self.min.x + 1
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.max.y - self.min.y + 1
    }

    /// Number of cells covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Always false: a window covers at least its center cell.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Check whether `coord` lies inside the window.
    #[must_use]
    pub const fn contains(&self, coord: CellCoord) -> bool {
        coord.x >= self.min.x
            && coord.x <= self.max.x
            && coord.y >= self.min.y
            && coord.y <= self.max.y
    }

    /// Iterate column by column over every covered coordinate.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + use<> {
        let Self { min, max } = *self;
        (min.x..=max.x).flat_map(move |x| (min.y..=max.y).map(move |y| CellCoord::new(x, y)))
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// One axis of [`Window::around`].
fn axis_range(center: u32, radius: u32, max: u32) -> (u32, u32) {
    let (c, r, max) = (i64::from(center), i64::from(radius), i64::from(max));

    let (start, end) = if c - r < 0 {
        (0, 2 * r)
    } else if c + r > max {
        (max - 2 * r, max)
    } else {
        (c - r, c + r)
    };

    (start.max(0) as u32, end.min(max) as u32)
}
