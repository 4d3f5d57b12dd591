//! Callbacks that mutate the grid through the command queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use aoi_event::prelude::*;
use aoi_grid::prelude::*;
use parking_lot::Mutex;

const PREY: EntityKind = EntityKind(1);
const SEED: EntityKind = EntityKind(2);

fn grid() -> Grid<()> {
    Grid::new(GridConfig::new(100.0, 100.0, 10.0, 10.0)).unwrap()
}

// ============================================================================
// Test Callbacks
// ============================================================================

#[derive(Default)]
struct Log {
    seen: Mutex<Vec<(bool, EntityId)>>,
}

impl Log {
    fn take(&self) -> Vec<(bool, EntityId)> {
        std::mem::take(&mut *self.seen.lock())
    }
}

impl EntityCallback<()> for Log {
    fn on_entity_enter(&self, peer: &Arc<Entity<()>>) {
        self.seen.lock().push((true, peer.id()));
    }

    fn on_entity_leave(&self, peer: &Arc<Entity<()>>) {
        self.seen.lock().push((false, peer.id()));
    }
}

/// Removes every prey it meets.
struct Predator {
    commands: CommandSender<()>,
}

impl EntityCallback<()> for Predator {
    fn on_entity_enter(&self, peer: &Arc<Entity<()>>) {
        if peer.kind() == PREY {
            self.commands.remove(Arc::clone(peer));
        }
    }

    fn on_entity_leave(&self, _peer: &Arc<Entity<()>>) {}
}

/// Pushes every newcomer into the other of two cells.
struct Kicker {
    commands: CommandSender<()>,
    home: Position,
    away: Position,
    home_cell: CellCoord,
}

impl EntityCallback<()> for Kicker {
    fn on_entity_enter(&self, peer: &Arc<Entity<()>>) {
        let to = if peer.cell() == Some(self.home_cell) {
            self.away
        } else {
            self.home
        };
        self.commands.update_to(Arc::clone(peer), to);
    }

    fn on_entity_leave(&self, _peer: &Arc<Entity<()>>) {}
}

/// Spawns a child entity whenever a seed enters a watched cell.
struct Spawner {
    commands: CommandSender<()>,
    next_id: AtomicU64,
    child_callback: Arc<Log>,
}

impl WatcherCallback<()> for Spawner {
    fn on_watching_enter(&self, entity: &Arc<Entity<()>>) {
        if entity.kind() == SEED {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let child = Entity::new(EntityId(id), ()).with_callback(self.child_callback.clone());
            self.commands.add(Arc::new(child), Position::new(5.0, 5.0));
        }
    }

    fn on_watching_leave(&self, _entity: &Arc<Entity<()>>) {}
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_callback_removes_peer_after_fan_out() {
    let grid = grid();
    let queue = CommandQueue::new();

    let predator = Arc::new(Entity::new(EntityId(1), ()).with_callback(Arc::new(Predator {
        commands: queue.sender(),
    })));
    let prey_log = Arc::new(Log::default());
    let prey = Arc::new(
        Entity::new(EntityId(2), ())
            .with_kind(PREY)
            .with_callback(prey_log.clone()),
    );

    assert!(grid.add(&predator, Position::new(5.0, 5.0)));
    assert!(grid.add(&prey, Position::new(6.0, 6.0)));

    // Removal is deferred until the flush.
    assert!(prey.is_placed());
    assert_eq!(queue.len(), 1);

    let report = queue.flush(&grid);
    assert_eq!(report.succeeded, 1);
    assert!(!prey.is_placed());
    assert_eq!(grid.entity_count(), 1);
    assert_eq!(
        prey_log.take(),
        vec![(true, EntityId(1)), (false, EntityId(1))]
    );
}

#[test]
fn test_commands_sent_during_flush_run_in_same_flush() {
    let grid = grid();
    let queue = CommandQueue::new();
    let child_log = Arc::new(Log::default());

    let spawner = Arc::new(Watcher::new(WatcherId(1), ()).with_callback(Arc::new(Spawner {
        commands: queue.sender(),
        next_id: AtomicU64::new(100),
        child_callback: child_log.clone(),
    })));
    grid.add_watcher(&spawner, Position::new(5.0, 5.0), 0);

    let seed = Arc::new(
        Entity::new(EntityId(1), ())
            .with_kind(SEED)
            .with_callback(Arc::new(Log::default())),
    );
    queue.sender().add(seed, Position::new(1.0, 1.0));

    let report = queue.flush(&grid);
    assert_eq!(report.applied, 2);
    assert_eq!(report.succeeded, 2);
    assert!(queue.is_empty());

    let cell = grid.cell(CellCoord::new(0, 0)).unwrap();
    assert_eq!(cell.entity_ids(), vec![EntityId(1), EntityId(100)]);
    assert_eq!(child_log.take(), vec![(true, EntityId(1))]);
}

#[test]
fn test_flush_limit_bounds_ping_pong() {
    let grid = grid();
    let queue = CommandQueue::new();
    let home = Position::new(5.0, 5.0);
    let away = Position::new(55.0, 55.0);

    let kicker = || {
        Arc::new(Kicker {
            commands: queue.sender(),
            home,
            away,
            home_cell: CellCoord::new(0, 0),
        })
    };
    let a = Arc::new(Entity::new(EntityId(1), ()).with_callback(kicker()));
    let b = Arc::new(Entity::new(EntityId(2), ()).with_callback(kicker()));

    grid.add(&a, home);
    grid.add(&b, home);
    assert_eq!(queue.len(), 2);

    // Each meeting queues two more kicks, forever.
    let report = queue.flush_limit(&grid, 10);
    assert_eq!(report.applied, 10);
    assert_eq!(queue.len(), 2);
    assert_eq!(grid.entity_count(), 2);

    assert_eq!(queue.clear(), 2);
    assert_eq!(a.cell(), b.cell());
}
