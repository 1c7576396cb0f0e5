//! The host-thread worker.
//!
//! This module implements the queue at the heart of the crate:
//! - [`node`]: the linked cells holding pending tasks,
//! - [`state`]: the trampoline deciding who wakes the host,
//! - [`core`]: enqueue, drain and dispose,
//! - [`handle`]: cancellation handles returned to callers.

mod core;
mod handle;
mod node;
mod state;

pub use self::core::Worker;
pub use handle::TaskHandle;

pub(crate) use self::core::WorkerCore;
pub(crate) use node::{Action, QueueNode};
