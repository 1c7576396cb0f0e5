//! # Foreground
//!
//! **Foreground** runs work submitted from any thread on one designated host
//! thread, the way UI toolkits require all widget access to happen on their
//! event loop thread.
//!
//! The heart of the crate is the [`Worker`]: a lock-free multi-producer,
//! single-consumer queue drained on the host thread. Producers never block,
//! tasks from one producer run in submission order, and however many threads
//! schedule concurrently, a worker asks its host for at most one drain at a
//! time.
//!
//! It provides:
//!
//! - **Immediate, delayed and periodic scheduling** through one queue, so
//!   timed tasks stay ordered with everything else on the worker
//! - **Cancellation** through [`TaskHandle`]s and terminal worker disposal
//! - A **pluggable host**: implement [`Host`] over any event loop, or use the
//!   built-in [`HostLoop`] thread
//! - A **process-wide platform** scheduler and the `#[foreground::main]`
//!   entry point
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! #[foreground::main]
//! fn main() {
//!     let worker = foreground::platform().create_worker();
//!
//!     let _ = worker.schedule(|| println!("runs on the host thread"));
//!
//!     let _ = worker.schedule_delayed(foreground::exit, Duration::from_millis(100));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`host`] — The host abstraction and the built-in host loop
//!
//! ## Getting Started
//!
//! Add Foreground to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! foreground = { git = "https://github.com/Nebula-ecosystem/Foreground", package = "foreground" }
//! ```

mod disposable;
mod error;
mod scheduler;
mod time;
mod worker;

pub mod host;

pub use disposable::Disposable;
pub use error::{HostError, ScheduleError};
pub use host::{Host, HostLoop, HostLoopBuilder, HostTimer, LoopHandle};
pub use scheduler::{Scheduler, exit, install, platform, try_platform};
pub use time::MAX_TIMER_MILLIS;
pub use worker::{TaskHandle, Worker};

pub use foreground_macros::{main, test};
