use super::context;
use super::event_loop::EventLoop;
use super::handle::{HostLoop, LoopHandle};
use crate::error::HostError;
use crate::scheduler;

use std::thread;

/// Default name given to host threads.
const DEFAULT_THREAD_NAME: &str = "foreground-host";

/// Builder for configuring and starting a host loop.
///
/// # Examples
///
/// ```rust,ignore
/// let host = HostLoopBuilder::new()
///     .name("ui")
///     .spawn()?;
/// ```
pub struct HostLoopBuilder {
    /// Name given to the host thread.
    name: String,

    /// Stack size of the host thread, platform default when `None`.
    stack_size: Option<usize>,
}

impl HostLoopBuilder {
    /// Creates a new `HostLoopBuilder` with default configuration.
    pub fn new() -> Self {
        Self {
            name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
        }
    }

    /// Sets the name of the host thread.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the stack size of the host thread, in bytes.
    ///
    /// Ignored by [`run_current`](Self::run_current), which keeps the stack
    /// of the calling thread.
    ///
    /// # Panics
    ///
    /// Panics if `bytes == 0`.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        assert!(bytes > 0, "stack_size must be > 0");

        self.stack_size = Some(bytes);
        self
    }

    /// Starts the loop on a new thread.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Spawn`] if the thread cannot be created.
    pub fn spawn(self) -> Result<HostLoop, HostError> {
        let (handle, event_loop) = Self::channel();

        let mut thread = thread::Builder::new().name(self.name);
        if let Some(bytes) = self.stack_size {
            thread = thread.stack_size(bytes);
        }

        let thread = thread.spawn(move || event_loop.run())?;

        Ok(HostLoop::new(handle, thread))
    }

    /// Turns the calling thread into the platform host thread.
    ///
    /// The loop is installed as the process-wide [`platform`](crate::platform)
    /// host, `main` runs on it as the first task, and the loop then serves
    /// work until [`exit`](crate::exit) is called. This is what
    /// `#[foreground::main]` expands to.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::AlreadyInstalled`] if a platform host was already
    /// set up, in which case `main` does not run.
    pub fn run_current(self, main: impl FnOnce()) -> Result<(), HostError> {
        let (handle, event_loop) = Self::channel();

        scheduler::install_loop(handle)?;
        tracing::debug!(thread = %self.name, "running platform host on the current thread");

        event_loop.run_with(main);
        Ok(())
    }

    fn channel() -> (LoopHandle, EventLoop) {
        let id = context::next_loop_id();
        let (sender, receiver) = crossbeam_channel::unbounded();

        (LoopHandle::new(id, sender), EventLoop::new(id, receiver))
    }
}

impl Default for HostLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
