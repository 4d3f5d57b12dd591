//! Queued grid operations.

use core::fmt;
use std::sync::Arc;

use aoi_grid::{Entity, Grid, Position, Watcher};

/// A grid operation captured for later execution.
///
/// Each variant carries the arguments of the [`Grid`] method of the same name.
pub enum GridCommand<T> {
    Add {
        entity: Arc<Entity<T>>,
        position: Position,
    },
    Remove {
        entity: Arc<Entity<T>>,
    },
    Update {
        entity: Arc<Entity<T>>,
        from: Position,
        to: Position,
    },
    UpdateTo {
        entity: Arc<Entity<T>>,
        to: Position,
    },
    AddWatcher {
        watcher: Arc<Watcher<T>>,
        position: Position,
        radius: u32,
    },
    RemoveWatcher {
        watcher: Arc<Watcher<T>>,
        position: Position,
        radius: u32,
    },
    ClearWatcher {
        watcher: Arc<Watcher<T>>,
    },
}

impl<T> GridCommand<T> {
    /// Run the command against `grid`.
    ///
    /// Entity commands report the grid's boolean result. Watcher commands
    /// succeed when at least one cell was bound or unbound.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as the underlying [`Grid`] method.
    pub fn apply(&self, grid: &Grid<T>) -> bool {
        match self {
            Self::Add { entity, position } => grid.add(entity, *position),
            Self::Remove { entity } => grid.remove(entity),
            Self::Update { entity, from, to } => grid.update(entity, *from, *to),
            Self::UpdateTo { entity, to } => grid.update_to(entity, *to),
            Self::AddWatcher {
                watcher,
                position,
                radius,
            } => grid.add_watcher(watcher, *position, *radius) > 0,
            Self::RemoveWatcher {
                watcher,
                position,
                radius,
            } => grid.remove_watcher(watcher, *position, *radius) > 0,
            Self::ClearWatcher { watcher } => grid.clear_watcher(watcher) > 0,
        }
    }

    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Update { .. } => "update",
            Self::UpdateTo { .. } => "update_to",
            Self::AddWatcher { .. } => "add_watcher",
            Self::RemoveWatcher { .. } => "remove_watcher",
            Self::ClearWatcher { .. } => "clear_watcher",
        }
    }
}

impl<T> fmt::Debug for GridCommand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("GridCommand");
        s.field("op", &self.name());
        match self {
            Self::Add { entity, .. }
            | Self::Remove { entity }
            | Self::Update { entity, .. }
            | Self::UpdateTo { entity, .. } => s.field("entity", &entity.id()),
            Self::AddWatcher { watcher, .. }
            | Self::RemoveWatcher { watcher, .. }
            | Self::ClearWatcher { watcher } => s.field("watcher", &watcher.id()),
        };
        s.finish_non_exhaustive()
    }
}
