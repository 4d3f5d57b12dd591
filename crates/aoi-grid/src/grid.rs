//! Grid manager: coordinate mapping, windows and cross-cell moves.

use core::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::ConfigResult;
use crate::{Cell, CellCoord, Entity, GridConfig, Position, Watcher, Window};

/// A 2D grid of [`Cell`]s covering a bounded world.
///
/// The cell array is built once and never resized, so a `&Grid` can be shared
/// freely across threads; all synchronization lives in the cells.
pub struct Grid<T> {
    config: GridConfig,
    /// Grid width in cells.
    width: u32,
    /// Grid height in cells.
    height: u32,
    /// Highest valid cell coordinate.
    max: CellCoord,
    /// Row-major cells.
    cells: Vec<Cell<T>>,
}

impl<T> Grid<T> {
    /// Create a grid of `ceil(map / cell)` cells per axis.
    pub fn new(config: GridConfig) -> ConfigResult<Self> {
        config.validate()?;

        let (width, height) = config.grid_size();
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new(CellCoord::new(x, y), config.debug));
            }
        }

        let max = CellCoord::new(width - 1, height - 1);
        if config.debug {
            info!(%config, %max, cells = cells.len(), "grid initialized");
        }

        Ok(Self {
            config,
            width,
            height,
            max,
            cells,
        })
    }

    /// Place `entity` in the cell containing `position`.
    ///
    /// Fails (returns false) if the position is outside the map, the entity is
    /// already placed, or the cell already holds an entity with the same id.
    ///
    /// # Panics
    ///
    /// Panics if the entity has no callback.
    pub fn add(&self, entity: &Arc<Entity<T>>, position: Position) -> bool {
        verify_entity(entity);
        if !self.contains(position) {
            warn!(%position, entity = %entity.id(), "add rejected: position out of bounds");
            return false;
        }

        let coord = self.coord_of(position);
        self.cells[self.index(coord)].add(entity)
    }

    /// Remove `entity` from the cell it occupies. No-op if it is unplaced.
    pub fn remove(&self, entity: &Entity<T>) -> bool {
        let Some(coord) = entity.cell() else {
            return false;
        };
        self.cell(coord).is_some_and(|cell| cell.remove(entity))
    }

    /// Move `entity` from the cell containing `from` to the one containing `to`.
    ///
    /// Returns false, without notifications, when either position is outside
    /// the map or both map to the same cell. The move is a remove followed by
    /// an add: in between, the entity is in no cell.
    ///
    /// The source cell must actually hold the entity. An unplaced entity, or
    /// one placed somewhere other than `from`, is rejected and never added at
    /// `to`; use [`Grid::add`] to place it. If the destination add fails, the
    /// entity is left unplaced and false is returned.
    pub fn update(&self, entity: &Arc<Entity<T>>, from: Position, to: Position) -> bool {
        if !self.contains(from) || !self.contains(to) {
            warn!(%from, %to, entity = %entity.id(), "update rejected: position out of bounds");
            return false;
        }

        let source = self.coord_of(from);
        let target = self.coord_of(to);
        if source == target {
            return false;
        }
        self.transfer(entity, source, target)
    }

    /// Move `entity` from its current cell to the one containing `to`.
    ///
    /// Same contract as [`Grid::update`], with the source taken from the
    /// entity's own back-reference. Unplaced entities are rejected.
    pub fn update_to(&self, entity: &Arc<Entity<T>>, to: Position) -> bool {
        let Some(source) = entity.cell() else {
            return false;
        };
        if !self.contains(to) {
            warn!(%to, entity = %entity.id(), "update rejected: position out of bounds");
            return false;
        }

        let target = self.coord_of(to);
        if source == target {
            return false;
        }
        self.transfer(entity, source, target)
    }

    fn transfer(&self, entity: &Arc<Entity<T>>, source: CellCoord, target: CellCoord) -> bool {
        let removed = self.cell(source).is_some_and(|cell| cell.remove(entity));
        if !removed {
            warn!(cell = %source, entity = %entity.id(), "update rejected: entity not in source cell");
            return false;
        }
        // The target may hold the same id, or a concurrent add may have placed
        // the entity during the gap.
        if !self.cells[self.index(target)].add(entity) {
            warn!(cell = %target, entity = %entity.id(), "update failed: entity left unplaced");
            return false;
        }
        true
    }

    /// Bind `watcher` to every cell in the window of `radius` cells around
    /// `position`. Returns how many cells were newly bound.
    ///
    /// Positions outside the map are clamped to the nearest edge cell.
    ///
    /// # Panics
    ///
    /// Panics if the watcher has no callback.
    pub fn add_watcher(&self, watcher: &Arc<Watcher<T>>, position: Position, radius: u32) -> usize {
        verify_watcher(watcher);
        self.window_at(position, radius)
            .iter()
            .filter(|&coord| self.cells[self.index(coord)].add_watcher(watcher))
            .count()
    }

    /// Unbind `watcher` from the same window [`Grid::add_watcher`] would
    /// bind. Returns how many cells were unbound.
    ///
    /// # Panics
    ///
    /// Panics if the watcher has no callback.
    pub fn remove_watcher(&self, watcher: &Watcher<T>, position: Position, radius: u32) -> usize {
        verify_watcher(watcher);
        self.window_at(position, radius)
            .iter()
            .filter(|&coord| self.cells[self.index(coord)].remove_watcher(watcher))
            .count()
    }

    /// Unbind `watcher` from every cell it watches.
    ///
    /// # Panics
    ///
    /// Panics if the watcher has no callback.
    pub fn clear_watcher(&self, watcher: &Watcher<T>) -> usize {
        verify_watcher(watcher);
        watcher
            .watching_snapshot()
            .into_iter()
            .filter(|&coord| match self.cell(coord) {
                Some(cell) => cell.remove_watcher(watcher),
                None => {
                    // Bound by a different grid; drop the stale link.
                    watcher.unlink(coord);
                    false
                }
            })
            .count()
    }

    /// Get the config this grid was built from.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Highest valid cell coordinate.
    #[must_use]
    pub const fn max_coord(&self) -> CellCoord {
        self.max
    }

    /// Grid size in cells as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Get a cell by coordinate.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell<T>> {
        if coord.x > self.max.x || coord.y > self.max.y {
            return None;
        }
        self.cells.get(self.index(coord))
    }

    /// Iterate over all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell<T>> {
        self.cells.iter()
    }

    /// Get the cell coordinate containing `position`, if it is on the map.
    #[must_use]
    pub fn cell_at(&self, position: Position) -> Option<CellCoord> {
        self.contains(position).then(|| self.coord_of(position))
    }

    /// Check whether `position` lies on the map (`0 <= p < size` per axis).
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0.0
            && position.y >= 0.0
            && position.x < self.config.map_width
            && position.y < self.config.map_height
    }

    /// Window of `radius` cells around `center`.
    #[must_use]
    pub fn window(&self, center: CellCoord, radius: u32) -> Window {
        Window::around(center, radius, self.max)
    }

    /// Total number of placed entities. Visits every cell.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.cells.iter().map(Cell::len).sum()
    }

    fn window_at(&self, position: Position, radius: u32) -> Window {
        self.window(self.coord_of(position), radius)
    }

    /// Floor-divide `position` by the cell size, clamped onto the grid.
    fn coord_of(&self, position: Position) -> CellCoord {
        // Float-to-int casts saturate: negatives and NaN become 0.
        let x = (position.x / self.config.cell_width).floor() as u32;
        let y = (position.y / self.config.cell_height).floor() as u32;
        CellCoord::new(x.min(self.max.x), y.min(self.max.y))
    }

    fn index(&self, coord: CellCoord) -> usize {
        coord.y as usize * self.width as usize + coord.x as usize
    }
}

impl<T> fmt::Debug for Grid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("config", &self.config)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

fn verify_entity<T>(entity: &Entity<T>) {
    if !entity.has_callback() {
        error!(entity = %entity.id(), "entity registered without a callback");
        panic!("entity {} registered without a callback", entity.id());
    }
}

fn verify_watcher<T>(watcher: &Watcher<T>) {
    if !watcher.has_callback() {
        error!(watcher = %watcher.id(), "watcher registered without a callback");
        panic!("watcher {} registered without a callback", watcher.id());
    }
}
