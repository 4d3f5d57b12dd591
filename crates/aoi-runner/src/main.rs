//! Headless AOI grid simulation.
//!
//! This binary:
//! 1. Reads the grid and population from the environment (or `AOI_CONFIG`)
//! 2. Scatters walkers on circular paths, every tenth one a hunter
//! 3. Runs fixed ticks, moving walkers in parallel and players in sequence
//! 4. Logs a notification summary
//!
//! Set `RUST_LOG=aoi_runner=debug` for per-tick output, or `AOI_DEBUG=true`
//! together with `RUST_LOG=aoi_grid=debug` for per-cell output.

mod config;
mod sim;

use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::info;

use crate::config::RunnerConfig;
use crate::sim::Simulation;

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("aoi_runner=info".parse()?)
                .add_directive("aoi_grid=info".parse()?),
        )
        .init();

    let config = RunnerConfig::from_env()?;
    info!(
        grid = %config.grid,
        walkers = config.walkers,
        players = config.players,
        ticks = config.ticks,
        "Starting AOI simulation"
    );

    let ticks = config.ticks;
    let mut sim = Simulation::new(config)?;
    let (columns, rows) = sim.grid().dimensions();
    info!(columns, rows, cells = sim.grid().cell_count(), "Grid ready");

    let started = Instant::now();
    let mut moved = 0;
    let mut rebound = 0;
    let mut deferred = 0;
    for _ in 0..ticks {
        let report = sim.step();
        moved += report.moved;
        rebound += report.rebound;
        deferred += report.deferred;
    }
    let elapsed = started.elapsed();

    let stats = sim.stats();
    info!(
        ticks,
        ?elapsed,
        moved,
        rebound,
        deferred,
        entities = sim.grid().entity_count(),
        "Simulation finished"
    );
    info!(
        entity_enters = stats.entity_enters.load(Ordering::Relaxed),
        entity_leaves = stats.entity_leaves.load(Ordering::Relaxed),
        watch_enters = stats.watch_enters.load(Ordering::Relaxed),
        watch_leaves = stats.watch_leaves.load(Ordering::Relaxed),
        captures = stats.captures.load(Ordering::Relaxed),
        "Notifications"
    );

    Ok(())
}
