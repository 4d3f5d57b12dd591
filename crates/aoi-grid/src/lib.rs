//! AOI Grid
//!
//! Area-of-interest index for a bounded 2D world. The plane is divided into a
//! fixed grid of cells; every entity lives in exactly one cell and every
//! watcher subscribes to a rectangular window of cells.
//!
//! # Notifications
//!
//! Membership changes fan out synchronously while the cell lock is held:
//!
//! ```text
//! add(A)    → every watcher bound to the cell:  on_watching_enter(A)
//!           → every resident E ≠ A:             A.on_entity_enter(E), E.on_entity_enter(A)
//! remove(A) → every watcher bound to the cell:  on_watching_leave(A)
//!           → every remaining R:                A.on_entity_leave(R), R.on_entity_leave(A)
//! ```
//!
//! Callbacks must not mutate the same cell they are called from. Queue the
//! mutation instead (see the `aoi-event` crate).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use aoi_grid::{Entity, EntityId, Grid, GridConfig, Position};
//!
//! let grid = Grid::new(GridConfig::new(100.0, 100.0, 10.0, 10.0))?;
//!
//! let player = Arc::new(Entity::new(EntityId(1), "player").with_callback(callbacks));
//! grid.add(&player, Position::new(5.0, 5.0));
//! grid.update(&player, Position::new(5.0, 5.0), Position::new(30.0, 30.0));
//! grid.remove(&player);
//! ```

mod cell;
mod config;
mod coord;
mod entity;
mod error;
mod grid;

#[cfg(test)]
mod testing;

pub use cell::Cell;
pub use config::GridConfig;
pub use coord::{CellCoord, Position, Window};
pub use entity::{
    Entity, EntityCallback, EntityId, EntityKind, Watcher, WatcherCallback, WatcherId,
};
pub use error::{ConfigError, ConfigResult};
pub use grid::Grid;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CellCoord, Entity, EntityCallback, EntityId, EntityKind, Grid, GridConfig, Position,
        Watcher, WatcherCallback, WatcherId, Window,
    };
}
