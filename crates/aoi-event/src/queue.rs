//! Command queue backed by an unbounded channel.

use core::fmt;
use std::sync::Arc;

use aoi_grid::{Entity, Grid, Position, Watcher};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, warn};

use crate::GridCommand;

/// Outcome of one [`CommandQueue::flush`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Commands executed.
    pub applied: usize,
    /// Commands whose grid call returned true.
    pub succeeded: usize,
    /// Commands whose grid call returned false.
    pub failed: usize,
}

/// FIFO queue of deferred grid commands.
///
/// Owned by the game loop. Callbacks hold [`CommandSender`]s.
pub struct CommandQueue<T> {
    tx: Sender<GridCommand<T>>,
    rx: Receiver<GridCommand<T>>,
}

impl<T> CommandQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// Get a cloneable handle for enqueueing commands.
    #[must_use]
    pub fn sender(&self) -> CommandSender<T> {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    /// Enqueue a command.
    pub fn push(&self, command: GridCommand<T>) {
        // The queue owns a receiver, so the channel cannot be disconnected.
        let _ = self.tx.send(command);
    }

    /// Number of pending commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Check whether no command is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Apply pending commands until the queue is empty, including commands
    /// enqueued by callbacks during the flush.
    pub fn flush(&self, grid: &Grid<T>) -> FlushReport {
        self.flush_limit(grid, usize::MAX)
    }

    /// Apply at most `max` commands. The rest stay queued.
    pub fn flush_limit(&self, grid: &Grid<T>, max: usize) -> FlushReport {
        self.flush_with(grid, max, |_, _| {})
    }

    /// Like [`CommandQueue::flush_limit`], calling `on_applied` with each
    /// command and its result right after it ran.
    pub fn flush_with<F>(&self, grid: &Grid<T>, max: usize, mut on_applied: F) -> FlushReport
    where
        F: FnMut(&GridCommand<T>, bool),
    {
        let mut report = FlushReport::default();

        while report.applied < max {
            let Ok(command) = self.rx.try_recv() else {
                break;
            };
            let ok = command.apply(grid);
            on_applied(&command, ok);
            if ok {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            report.applied += 1;
        }

        if report.applied > 0 {
            debug!(
                applied = report.applied,
                succeeded = report.succeeded,
                failed = report.failed,
                pending = self.rx.len(),
                "command queue flushed"
            );
        }
        report
    }

    /// Drop every pending command. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        self.rx.try_iter().count()
    }
}

impl<T> Default for CommandQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for CommandQueue<T> {
    fn drop(&mut self) {
        // Pending commands hold entities whose callbacks may hold senders,
        // which keep the channel buffer alive.
        self.clear();
    }
}

impl<T> fmt::Debug for CommandQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue")
            .field("pending", &self.rx.len())
            .finish()
    }
}

/// Handle for enqueueing commands from callbacks.
pub struct CommandSender<T> {
    tx: Sender<GridCommand<T>>,
}

impl<T> CommandSender<T> {
    /// Enqueue a command. Returns false if the queue was dropped.
    pub fn send(&self, command: GridCommand<T>) -> bool {
        match self.tx.send(command) {
            Ok(()) => true,
            Err(err) => {
                warn!(op = err.0.name(), "command dropped: queue is gone");
                false
            }
        }
    }

    /// Defer [`Grid::add`].
    pub fn add(&self, entity: Arc<Entity<T>>, position: Position) -> bool {
        self.send(GridCommand::Add { entity, position })
    }

    /// Defer [`Grid::remove`].
    pub fn remove(&self, entity: Arc<Entity<T>>) -> bool {
        self.send(GridCommand::Remove { entity })
    }

    /// Defer [`Grid::update`].
    pub fn update(&self, entity: Arc<Entity<T>>, from: Position, to: Position) -> bool {
        self.send(GridCommand::Update { entity, from, to })
    }

    /// Defer [`Grid::update_to`].
    pub fn update_to(&self, entity: Arc<Entity<T>>, to: Position) -> bool {
        self.send(GridCommand::UpdateTo { entity, to })
    }

    /// Defer [`Grid::add_watcher`].
    pub fn add_watcher(&self, watcher: Arc<Watcher<T>>, position: Position, radius: u32) -> bool {
        self.send(GridCommand::AddWatcher {
            watcher,
            position,
            radius,
        })
    }

    /// Defer [`Grid::remove_watcher`].
    pub fn remove_watcher(
        &self,
        watcher: Arc<Watcher<T>>,
        position: Position,
        radius: u32,
    ) -> bool {
        self.send(GridCommand::RemoveWatcher {
            watcher,
            position,
            radius,
        })
    }

    /// Defer [`Grid::clear_watcher`].
    pub fn clear_watcher(&self, watcher: Arc<Watcher<T>>) -> bool {
        self.send(GridCommand::ClearWatcher { watcher })
    }
}

impl<T> Clone for CommandSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> fmt::Debug for CommandSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSender").finish_non_exhaustive()
    }
}
