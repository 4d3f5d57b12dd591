//! Grid cells: local membership and notification fan-out.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{CellCoord, Entity, EntityId, EntityKind, Watcher, WatcherId};

/// Entities and watchers bound to one cell.
struct Members<T> {
    entities: HashMap<EntityId, Arc<Entity<T>>>,
    watchers: HashMap<WatcherId, Arc<Watcher<T>>>,
}

/// One square of the grid.
///
/// Mutations are only reachable through [`Grid`](crate::Grid). Each one holds
/// the cell lock for its whole duration, fan-out included.
pub struct Cell<T> {
    coord: CellCoord,
    debug: bool,
    members: Mutex<Members<T>>,
}

impl<T> Cell<T> {
    pub(crate) fn new(coord: CellCoord, debug: bool) -> Self {
        Self {
            coord,
            debug,
            members: Mutex::new(Members {
                entities: HashMap::new(),
                watchers: HashMap::new(),
            }),
        }
    }

    /// Get the cell coordinate.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Insert `entity` and announce it to watchers and cell-mates.
    ///
    /// Returns false if an entity with the same id is already here, or if the
    /// entity already occupies a cell. The claim on the entity's
    /// back-reference is taken under the cell lock, so concurrent adds of one
    /// entity place it at most once.
    pub(crate) fn add(&self, entity: &Arc<Entity<T>>) -> bool {
        let mut members = self.members.lock();
        if members.entities.contains_key(&entity.id()) {
            warn!(cell = %self.coord, entity = %entity.id(), "add rejected: id already in cell");
            return false;
        }
        if !entity.try_place(self.coord) {
            warn!(
                cell = %self.coord,
                entity = %entity.id(),
                current = ?entity.cell(),
                "add rejected: entity already placed"
            );
            return false;
        }

        members.entities.insert(entity.id(), Arc::clone(entity));

        if self.debug {
            debug!(cell = %self.coord, entity = %entity.id(), "entity added");
        }

        for watcher in members.watchers.values() {
            watcher.notify_enter(entity);
        }
        for peer in members.entities.values() {
            if peer.id() == entity.id() {
                continue;
            }
            entity.notify_enter(peer);
            peer.notify_enter(entity);
        }
        true
    }

    /// Remove `entity` and announce its departure.
    ///
    /// Returns false if it is not here.
    pub(crate) fn remove(&self, entity: &Entity<T>) -> bool {
        let mut members = self.members.lock();
        let Some(removed) = members.entities.remove(&entity.id()) else {
            return false;
        };
        removed.set_cell(None);

        if self.debug {
            debug!(cell = %self.coord, entity = %removed.id(), "entity removed");
        }

        for watcher in members.watchers.values() {
            watcher.notify_leave(&removed);
        }
        for peer in members.entities.values() {
            removed.notify_leave(peer);
            peer.notify_leave(&removed);
        }
        true
    }

    /// Bind `watcher` to this cell. Returns false if it was already bound.
    pub(crate) fn add_watcher(&self, watcher: &Arc<Watcher<T>>) -> bool {
        let mut members = self.members.lock();
        if members.watchers.contains_key(&watcher.id()) {
            return false;
        }

        members.watchers.insert(watcher.id(), Arc::clone(watcher));
        watcher.link(self.coord);

        if self.debug {
            debug!(cell = %self.coord, watcher = %watcher.id(), "watcher bound");
        }
        true
    }

    /// Unbind `watcher` from this cell. Returns false if it was not bound.
    pub(crate) fn remove_watcher(&self, watcher: &Watcher<T>) -> bool {
        let mut members = self.members.lock();
        // Unlink unconditionally so a stale back-reference cannot survive.
        watcher.unlink(self.coord);
        if members.watchers.remove(&watcher.id()).is_none() {
            return false;
        }

        if self.debug {
            debug!(cell = %self.coord, watcher = %watcher.id(), "watcher unbound");
        }
        true
    }

    /// Number of resident entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.lock().entities.len()
    }

    /// Check whether no entity resides here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.lock().entities.is_empty()
    }

    /// Number of bound watchers.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.members.lock().watchers.len()
    }

    /// Check whether an entity with `id` resides here.
    #[must_use]
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.members.lock().entities.contains_key(&id)
    }

    /// Check whether a watcher with `id` is bound here.
    #[must_use]
    pub fn contains_watcher(&self, id: WatcherId) -> bool {
        self.members.lock().watchers.contains_key(&id)
    }

    /// Ids of resident entities, sorted.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.members.lock().entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of bound watchers, sorted.
    #[must_use]
    pub fn watcher_ids(&self) -> Vec<WatcherId> {
        let mut ids: Vec<_> = self.members.lock().watchers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Resident entities of the given kind.
    #[must_use]
    pub fn entities_of_kind(&self, kind: EntityKind) -> Vec<Arc<Entity<T>>> {
        self.members
            .lock()
            .entities
            .values()
            .filter(|entity| entity.kind() == kind)
            .cloned()
            .collect()
    }
}

impl<T> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Cell");
        s.field("coord", &self.coord);
        // Callbacks run under the lock; never block here.
        match self.members.try_lock() {
            Some(members) => s
                .field("entities", &members.entities.len())
                .field("watchers", &members.watchers.len()),
            None => s.field("members", &"<locked>"),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Note, entity, sorted, watcher};

    fn cell() -> Cell<()> {
        Cell::new(CellCoord::new(2, 3), false)
    }

    #[test]
    fn test_add_sets_back_reference() {
        let cell = cell();
        let (a, _) = entity(1);

        assert!(cell.add(&a));
        assert_eq!(a.cell(), Some(CellCoord::new(2, 3)));
        assert_eq!(cell.len(), 1);
    }

    #[test]
    fn test_add_duplicate_is_rejected() {
        let cell = cell();
        let (a, rec_a) = entity(1);

        assert!(cell.add(&a));
        assert!(!cell.add(&a));
        assert_eq!(cell.len(), 1);
        assert!(rec_a.take().is_empty(), "no self notification");
    }

    #[test]
    fn test_add_duplicate_id_leaves_cell_unchanged() {
        let cell = cell();
        let (a, rec_a) = entity(1);
        let (impostor, rec_impostor) = entity(1);
        let (w, rec_w) = watcher(1);

        cell.add(&a);
        cell.add_watcher(&w);

        assert!(!cell.add(&impostor));
        assert_eq!(cell.entity_ids(), vec![EntityId(1)]);
        assert!(Arc::ptr_eq(&cell.entities_of_kind(EntityKind::default())[0], &a));
        assert_eq!(impostor.cell(), None, "rejected entity stays unplaced");
        assert!(rec_a.take().is_empty());
        assert!(rec_impostor.take().is_empty());
        assert!(rec_w.take().is_empty());
    }

    #[test]
    fn test_add_rejects_entity_placed_elsewhere() {
        let home = cell();
        let other = Cell::new(CellCoord::new(7, 7), false);
        let (a, _) = entity(1);
        let (b, rec_b) = entity(2);

        other.add(&b);
        assert!(home.add(&a));
        assert!(!other.add(&a));
        assert_eq!(a.cell(), Some(CellCoord::new(2, 3)));
        assert!(!other.contains_entity(EntityId(1)));
        assert!(rec_b.take().is_empty());
    }

    #[test]
    fn test_add_notifies_both_sides_once() {
        let cell = cell();
        let (a, rec_a) = entity(1);
        let (b, rec_b) = entity(2);
        let (c, rec_c) = entity(3);

        cell.add(&a);
        cell.add(&b);
        assert_eq!(rec_a.take(), vec![Note::Enter(EntityId(2))]);
        assert_eq!(rec_b.take(), vec![Note::Enter(EntityId(1))]);

        cell.add(&c);
        assert_eq!(rec_a.take(), vec![Note::Enter(EntityId(3))]);
        assert_eq!(rec_b.take(), vec![Note::Enter(EntityId(3))]);
        assert_eq!(
            sorted(rec_c.take()),
            vec![Note::Enter(EntityId(1)), Note::Enter(EntityId(2))]
        );
    }

    #[test]
    fn test_remove_notifies_remaining_members() {
        let cell = cell();
        let (a, rec_a) = entity(1);
        let (b, rec_b) = entity(2);
        let (c, rec_c) = entity(3);
        let (w, rec_w) = watcher(1);

        cell.add(&a);
        cell.add(&b);
        cell.add(&c);
        cell.add_watcher(&w);
        rec_a.take();
        rec_b.take();
        rec_c.take();

        assert!(cell.remove(&b));
        assert_eq!(b.cell(), None);
        assert_eq!(rec_a.take(), vec![Note::Leave(EntityId(2))]);
        assert_eq!(rec_c.take(), vec![Note::Leave(EntityId(2))]);
        assert_eq!(
            sorted(rec_b.take()),
            vec![Note::Leave(EntityId(1)), Note::Leave(EntityId(3))]
        );
        assert_eq!(rec_w.take(), vec![Note::Leave(EntityId(2))]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let cell = cell();
        let (a, _) = entity(1);
        let (b, rec_b) = entity(2);

        cell.add(&b);
        rec_b.take();

        assert!(!cell.remove(&a));
        assert!(rec_b.take().is_empty());
    }

    #[test]
    fn test_watcher_sees_membership_changes_only() {
        let cell = cell();
        let (a, _) = entity(1);
        let (w, rec_w) = watcher(9);

        // Binding to an occupied cell does not replay residents.
        cell.add(&a);
        assert!(cell.add_watcher(&w));
        assert!(rec_w.take().is_empty());

        let (b, _) = entity(2);
        cell.add(&b);
        cell.remove(&a);
        assert_eq!(
            rec_w.take(),
            vec![Note::Enter(EntityId(2)), Note::Leave(EntityId(1))]
        );
    }

    #[test]
    fn test_watcher_bind_is_idempotent_and_symmetric() {
        let cell = cell();
        let (w, _) = watcher(4);

        assert!(cell.add_watcher(&w));
        assert!(!cell.add_watcher(&w));
        assert_eq!(cell.watcher_count(), 1);
        assert!(w.is_watching(cell.coord()));

        assert!(cell.remove_watcher(&w));
        assert!(!cell.remove_watcher(&w));
        assert_eq!(cell.watcher_count(), 0);
        assert!(!w.is_watching(cell.coord()));
    }

    #[test]
    fn test_entities_of_kind() {
        let cell = cell();
        let monster = Arc::new(Entity::new(EntityId(1), ()).with_kind(EntityKind(7)));
        let (player, _) = entity(2);

        // Cell-level add does not verify callbacks; the grid does.
        cell.add(&monster);
        cell.add(&player);

        let found = cell.entities_of_kind(EntityKind(7));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), EntityId(1));
        assert_eq!(cell.entity_ids(), vec![EntityId(1), EntityId(2)]);
    }
}
