//! Deterministic walker simulation on top of the AOI grid.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use aoi_event::{CommandQueue, CommandSender, GridCommand};
use aoi_grid::{
    CellCoord, Entity, EntityCallback, EntityId, EntityKind, Grid, GridConfig, Position, Watcher,
    WatcherCallback, WatcherId,
};
use rayon::prelude::*;
use tracing::debug;

use crate::config::RunnerConfig;

pub const HUNTER: EntityKind = EntityKind(1);
pub const PREY: EntityKind = EntityKind(2);

/// Circular motion path shared by walkers and players.
#[derive(Debug, Clone, Copy)]
pub struct Path {
    center: Position,
    radius: f32,
    phase: f32,
    /// Radians per second.
    speed: f32,
    /// Upper bounds keeping positions strictly inside the map.
    limit: Position,
}

impl Path {
    /// Spread path `index` of `count` over the map.
    fn nth(index: usize, count: usize, config: &GridConfig) -> Self {
        let radius = (config.cell_width.min(config.cell_height) * 3.0)
            .min(config.map_width.min(config.map_height) / 4.0);
        let golden = 0.618_034_f32;
        let fx = (index as f32 * golden).fract();
        let fy = (index as f32 + 0.5) / count.max(1) as f32;

        Self {
            center: Position::new(
                radius + fx * (config.map_width - 2.0 * radius),
                radius + fy * (config.map_height - 2.0 * radius),
            ),
            radius,
            phase: index as f32,
            speed: 0.5 + (index % 7) as f32 * 0.25,
            limit: Position::new(config.map_width * 0.9999, config.map_height * 0.9999),
        }
    }

    /// Position at simulated time `t` seconds.
    pub fn position_at(&self, t: f32) -> Position {
        let angle = self.phase + self.speed * t;
        Position::new(
            (self.center.x + self.radius * angle.cos()).clamp(0.0, self.limit.x),
            (self.center.y + self.radius * angle.sin()).clamp(0.0, self.limit.y),
        )
    }
}

/// Notification counters.
#[derive(Debug, Default)]
pub struct Stats {
    pub entity_enters: AtomicU64,
    pub entity_leaves: AtomicU64,
    pub watch_enters: AtomicU64,
    pub watch_leaves: AtomicU64,
    pub captures: AtomicU64,
}

impl Stats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Callback for ordinary walkers.
struct Walker {
    stats: Arc<Stats>,
}

impl EntityCallback<Path> for Walker {
    fn on_entity_enter(&self, _peer: &Arc<Entity<Path>>) {
        Stats::bump(&self.stats.entity_enters);
    }

    fn on_entity_leave(&self, _peer: &Arc<Entity<Path>>) {
        Stats::bump(&self.stats.entity_leaves);
    }
}

/// Callback for hunters: queues the removal of prey sharing its cell.
struct Hunter {
    stats: Arc<Stats>,
    commands: CommandSender<Path>,
}

impl EntityCallback<Path> for Hunter {
    fn on_entity_enter(&self, peer: &Arc<Entity<Path>>) {
        Stats::bump(&self.stats.entity_enters);
        if peer.kind() == PREY {
            self.commands.remove(Arc::clone(peer));
        }
    }

    fn on_entity_leave(&self, _peer: &Arc<Entity<Path>>) {
        Stats::bump(&self.stats.entity_leaves);
    }
}

/// Callback for players.
struct Viewer {
    stats: Arc<Stats>,
}

impl WatcherCallback<Path> for Viewer {
    fn on_watching_enter(&self, _entity: &Arc<Entity<Path>>) {
        Stats::bump(&self.stats.watch_enters);
    }

    fn on_watching_leave(&self, _entity: &Arc<Entity<Path>>) {
        Stats::bump(&self.stats.watch_leaves);
    }
}

/// A watcher moving along its own path.
struct Player {
    watcher: Arc<Watcher<Path>>,
    cell: Option<CellCoord>,
}

/// Summary of one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickReport {
    pub moved: usize,
    pub rebound: usize,
    pub deferred: usize,
}

pub struct Simulation {
    config: RunnerConfig,
    grid: Grid<Path>,
    queue: CommandQueue<Path>,
    walkers: Vec<Arc<Entity<Path>>>,
    players: Vec<Player>,
    stats: Arc<Stats>,
    tick: u64,
}

impl Simulation {
    pub fn new(config: RunnerConfig) -> eyre::Result<Self> {
        let grid = Grid::new(config.grid)?;
        let queue = CommandQueue::new();
        let stats = Arc::new(Stats::default());

        let walker_callback: Arc<Walker> = Arc::new(Walker {
            stats: stats.clone(),
        });
        let hunter_callback: Arc<Hunter> = Arc::new(Hunter {
            stats: stats.clone(),
            commands: queue.sender(),
        });

        let mut walkers = Vec::with_capacity(config.walkers);
        for index in 0..config.walkers {
            let path = Path::nth(index, config.walkers, &config.grid);
            // Every tenth walker hunts, every third is prey.
            let entity = if index % 10 == 0 {
                Entity::new(EntityId(index as u64), path)
                    .with_kind(HUNTER)
                    .with_callback(hunter_callback.clone())
            } else if index % 3 == 0 {
                Entity::new(EntityId(index as u64), path)
                    .with_kind(PREY)
                    .with_callback(walker_callback.clone())
            } else {
                Entity::new(EntityId(index as u64), path).with_callback(walker_callback.clone())
            };
            let entity = Arc::new(entity);
            grid.add(&entity, path.position_at(0.0));
            walkers.push(entity);
        }

        let viewer: Arc<Viewer> = Arc::new(Viewer {
            stats: stats.clone(),
        });
        let players = (0..config.players)
            .map(|index| {
                let path = Path::nth(index, config.players, &config.grid);
                let watcher =
                    Watcher::new(WatcherId(index as u64), path).with_callback(viewer.clone());
                Player {
                    watcher: Arc::new(watcher),
                    cell: None,
                }
            })
            .collect();

        let mut sim = Self {
            config,
            grid,
            queue,
            walkers,
            players,
            stats,
            tick: 0,
        };
        sim.rebind_players(0.0);
        sim.flush();
        Ok(sim)
    }

    pub const fn grid(&self) -> &Grid<Path> {
        &self.grid
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Advance one tick: move walkers in parallel, apply deferred commands,
    /// then move players.
    pub fn step(&mut self) -> TickReport {
        self.tick += 1;
        let t = self.tick as f32 * self.config.tick_seconds;

        let grid = &self.grid;
        let moved = self
            .walkers
            .par_iter()
            .filter(|walker| grid.update_to(walker, walker.value().position_at(t)))
            .count();

        let deferred = self.flush();
        let rebound = self.rebind_players(t);

        let report = TickReport {
            moved,
            rebound,
            deferred,
        };
        debug!(
            tick = self.tick,
            moved,
            rebound,
            deferred,
            entities = self.grid.entity_count(),
            "tick"
        );
        report
    }

    /// Apply queued commands, counting prey that were actually removed.
    /// Returns how many commands ran.
    fn flush(&self) -> usize {
        let captures = &self.stats.captures;
        self.queue
            .flush_with(&self.grid, usize::MAX, |command, ok| {
                if let GridCommand::Remove { entity } = command {
                    if ok && entity.kind() == PREY {
                        Stats::bump(captures);
                    }
                }
            })
            .applied
    }

    /// Re-center every player whose cell changed. Returns how many moved.
    fn rebind_players(&mut self, t: f32) -> usize {
        let radius = self.config.watch_radius;
        let mut rebound = 0;
        for player in &mut self.players {
            let position = player.watcher.value().position_at(t);
            let cell = self.grid.cell_at(position);
            if cell == player.cell {
                continue;
            }
            self.grid.clear_watcher(&player.watcher);
            self.grid.add_watcher(&player.watcher, position, radius);
            player.cell = cell;
            rebound += 1;
        }
        rebound
    }
}
