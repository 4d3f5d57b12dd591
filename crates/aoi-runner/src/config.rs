//! Runner configuration from the environment.

use std::path::PathBuf;

use aoi_grid::GridConfig;
use eyre::WrapErr;

/// Everything the runner needs to start a simulation.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub grid: GridConfig,
    /// Number of mobile entities.
    pub walkers: usize,
    /// Number of moving watchers.
    pub players: usize,
    /// Simulation length.
    pub ticks: u64,
    /// Watch window radius in cells.
    pub watch_radius: u32,
    /// Simulated seconds per tick.
    pub tick_seconds: f32,
}

impl RunnerConfig {
    /// Read the config.
    ///
    /// The grid comes from the JSON file named by `AOI_CONFIG` when set,
    /// otherwise from the `AOI_MAP_*`, `AOI_CELL_*` and `AOI_DEBUG` variables.
    pub fn from_env() -> eyre::Result<Self> {
        let grid = match std::env::var("AOI_CONFIG") {
            Ok(path) => {
                let path = PathBuf::from(path);
                GridConfig::from_json_file(&path)
                    .wrap_err_with(|| format!("failed to load {}", path.display()))?
            }
            Err(_) => {
                let config = GridConfig::new(
                    env_or("AOI_MAP_WIDTH", 1000.0),
                    env_or("AOI_MAP_HEIGHT", 1000.0),
                    env_or("AOI_CELL_WIDTH", 50.0),
                    env_or("AOI_CELL_HEIGHT", 50.0),
                )
                .with_debug(env_or("AOI_DEBUG", false));
                config.validate().wrap_err("invalid grid config")?;
                config
            }
        };

        Ok(Self {
            grid,
            walkers: env_or("AOI_WALKERS", 500),
            players: env_or("AOI_PLAYERS", 8),
            ticks: env_or("AOI_TICKS", 100),
            watch_radius: env_or("AOI_WATCH_RADIUS", 1),
            tick_seconds: env_or("AOI_TICK_SECONDS", 0.05),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
