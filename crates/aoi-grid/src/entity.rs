//! Entities, watchers and their notification callbacks.
//!
//! Both types are shared as `Arc`s between the caller and the cells they are
//! bound to. The back-references they carry (current cell, watched cells) are
//! plain coordinates, never handles to the cells themselves.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashSet;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::CellCoord;

/// Identifier of an entity, unique across the whole grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Identifier of a watcher, unique across the whole grid.
///
/// Watcher ids live in their own namespace: `WatcherId(7)` and `EntityId(7)`
/// never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(pub u64);

impl fmt::Display for WatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Caller-defined category of an entity (player, monster, item...).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EntityKind(pub u32);

/// Notifications delivered to an entity about its cell-mates.
///
/// Called inline, with the cell lock held. Implementations must not add,
/// remove or move entities in the same cell.
pub trait EntityCallback<T>: Send + Sync {
    /// `peer` now shares this entity's cell.
    fn on_entity_enter(&self, peer: &Arc<Entity<T>>);

    /// `peer` no longer shares this entity's cell.
    fn on_entity_leave(&self, peer: &Arc<Entity<T>>);
}

/// Notifications delivered to a watcher about entities crossing its cells.
///
/// Same locking rules as [`EntityCallback`].
pub trait WatcherCallback<T>: Send + Sync {
    /// `entity` entered a watched cell.
    fn on_watching_enter(&self, entity: &Arc<Entity<T>>);

    /// `entity` left a watched cell.
    fn on_watching_leave(&self, entity: &Arc<Entity<T>>);
}

/// A point-like occupant of the grid.
pub struct Entity<T> {
    id: EntityId,
    kind: EntityKind,
    value: T,
    callback: Option<Arc<dyn EntityCallback<T>>>,
    /// Current cell, `None` while unplaced.
    cell: Mutex<Option<CellCoord>>,
}

impl<T> Entity<T> {
    /// Create an unplaced entity without a callback.
    ///
    /// A callback must be attached with [`Entity::with_callback`] before the
    /// entity is added to a grid.
    #[must_use]
    pub fn new(id: EntityId, value: T) -> Self {
        Self {
            id,
            kind: EntityKind::default(),
            value,
            callback: None,
            cell: Mutex::new(None),
        }
    }

    /// Set the entity kind.
    #[must_use]
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach the notification callback.
    #[must_use]
    pub fn with_callback(mut self, callback: Arc<dyn EntityCallback<T>>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Get the entity's id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Get the entity's kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Get the payload.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Check whether a callback is attached.
    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Cell the entity currently occupies.
    #[must_use]
    pub fn cell(&self) -> Option<CellCoord> {
        *self.cell.lock()
    }

    /// Check whether the entity occupies a cell.
    #[must_use]
    pub fn is_placed(&self) -> bool {
        self.cell().is_some()
    }

    pub(crate) fn set_cell(&self, cell: Option<CellCoord>) {
        *self.cell.lock() = cell;
    }

    /// Claim `coord` as the entity's cell. Fails if it already holds one.
    pub(crate) fn try_place(&self, coord: CellCoord) -> bool {
        let mut cell = self.cell.lock();
        if cell.is_some() {
            return false;
        }
        *cell = Some(coord);
        true
    }

    pub(crate) fn notify_enter(&self, peer: &Arc<Self>) {
        if let Some(callback) = &self.callback {
            callback.on_entity_enter(peer);
        }
    }

    pub(crate) fn notify_leave(&self, peer: &Arc<Self>) {
        if let Some(callback) = &self.callback {
            callback.on_entity_leave(peer);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("cell", &self.cell())
            .finish_non_exhaustive()
    }
}

impl<T: fmt::Debug> fmt::Display for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity{{id: {}, value: {:?}}}", self.id, self.value)
    }
}

/// A subscriber bound to zero or more cells.
pub struct Watcher<T> {
    id: WatcherId,
    value: T,
    callback: Option<Arc<dyn WatcherCallback<T>>>,
    /// Cells this watcher is registered in. Mirrors the cells' watcher maps.
    watching: Mutex<HashSet<CellCoord>>,
}

impl<T> Watcher<T> {
    /// Create an unbound watcher without a callback.
    #[must_use]
    pub fn new(id: WatcherId, value: T) -> Self {
        Self {
            id,
            value,
            callback: None,
            watching: Mutex::new(HashSet::new()),
        }
    }

    /// Attach the notification callback.
    #[must_use]
    pub fn with_callback(mut self, callback: Arc<dyn WatcherCallback<T>>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Get the watcher's id.
    #[must_use]
    pub const fn id(&self) -> WatcherId {
        self.id
    }

    /// Get the payload.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Check whether a callback is attached.
    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Sorted copy of the watched cells.
    #[must_use]
    pub fn watching(&self) -> Vec<CellCoord> {
        let mut cells: Vec<_> = self.watching.lock().iter().copied().collect();
        cells.sort_unstable();
        cells
    }

    /// Check whether the watcher is bound to `cell`.
    #[must_use]
    pub fn is_watching(&self, cell: CellCoord) -> bool {
        self.watching.lock().contains(&cell)
    }

    /// Number of cells the watcher is bound to.
    #[must_use]
    pub fn watching_count(&self) -> usize {
        self.watching.lock().len()
    }

    /// Copy of the watched set, taken so the lock is not held while unbinding.
    pub(crate) fn watching_snapshot(&self) -> SmallVec<[CellCoord; 16]> {
        self.watching.lock().iter().copied().collect()
    }

    pub(crate) fn link(&self, cell: CellCoord) {
        self.watching.lock().insert(cell);
    }

    pub(crate) fn unlink(&self, cell: CellCoord) {
        self.watching.lock().remove(&cell);
    }

    pub(crate) fn notify_enter(&self, entity: &Arc<Entity<T>>) {
        if let Some(callback) = &self.callback {
            callback.on_watching_enter(entity);
        }
    }

    pub(crate) fn notify_leave(&self, entity: &Arc<Entity<T>>) {
        if let Some(callback) = &self.callback {
            callback.on_watching_leave(entity);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Watcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("watching", &self.watching_count())
            .finish_non_exhaustive()
    }
}

impl<T: fmt::Debug> fmt::Display for Watcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Watcher{{id: {}, value: {:?}}}", self.id, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;

    #[test]
    fn test_entity_builder() {
        let entity = Entity::new(EntityId(3), "orc").with_kind(EntityKind(2));

        assert_eq!(entity.id(), EntityId(3));
        assert_eq!(entity.kind(), EntityKind(2));
        assert_eq!(*entity.value(), "orc");
        assert!(!entity.has_callback());
        assert!(!entity.is_placed());

        let entity = entity.with_callback(Arc::new(Recorder::default()));
        assert!(entity.has_callback());
    }

    #[test]
    fn test_watcher_links_are_a_set() {
        let watcher = Watcher::new(WatcherId(1), ());

        watcher.link(CellCoord::new(1, 0));
        watcher.link(CellCoord::new(0, 0));
        watcher.link(CellCoord::new(1, 0));
        assert_eq!(
            watcher.watching(),
            vec![CellCoord::new(0, 0), CellCoord::new(1, 0)]
        );

        watcher.unlink(CellCoord::new(0, 0));
        watcher.unlink(CellCoord::new(5, 5));
        assert_eq!(watcher.watching_count(), 1);
        assert!(watcher.is_watching(CellCoord::new(1, 0)));
    }

    #[test]
    fn test_try_place_claims_once() {
        let entity = Entity::new(EntityId(1), ());

        assert!(entity.try_place(CellCoord::new(2, 2)));
        assert!(!entity.try_place(CellCoord::new(5, 5)));
        assert_eq!(entity.cell(), Some(CellCoord::new(2, 2)));

        entity.set_cell(None);
        assert!(entity.try_place(CellCoord::new(5, 5)));
    }

    #[test]
    fn test_display_formats() {
        let entity = Entity::new(EntityId(11), 42);
        let watcher = Watcher::new(WatcherId(11), "cam");

        assert_eq!(entity.to_string(), "Entity{id: e11, value: 42}");
        assert_eq!(watcher.to_string(), "Watcher{id: w11, value: \"cam\"}");
    }
}
