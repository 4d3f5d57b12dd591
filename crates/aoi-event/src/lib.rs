//! AOI Event Queue
//!
//! Deferred grid mutations for callbacks.
//!
//! Cell callbacks run with the cell lock held, so a callback that adds,
//! removes or moves an entity in the same cell would deadlock. Callbacks
//! capture a [`CommandSender`] instead and the game loop applies the queued
//! commands once the triggering operation has returned.
//!
//! # Ordering
//!
//! - Commands are applied in the order they were sent (FIFO).
//! - Commands sent while a flush is running are applied by that same flush.
//! - [`CommandQueue::flush_limit`] bounds the work of one flush, so callbacks
//!   that keep re-queueing each other cannot stall the loop.
//!
//! # Example
//!
//! ```ignore
//! let queue = CommandQueue::new();
//! let sender = queue.sender();
//!
//! // Inside a callback: defer instead of calling the grid directly
//! sender.remove(Arc::clone(&prey));
//!
//! // In the game loop, after the grid call returned
//! let report = queue.flush(&grid);
//! ```

mod command;
mod queue;

pub use command::GridCommand;
pub use queue::{CommandQueue, CommandSender, FlushReport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{CommandQueue, CommandSender, FlushReport, GridCommand};
}
