//! The scheduler facade and the process-wide platform host.

use crate::error::HostError;
use crate::host::{Host, HostLoop, HostLoopBuilder, LoopHandle};
use crate::worker::{QueueNode, TaskHandle, Worker};

use std::fmt;
use std::sync::{Arc, OnceLock};

/// Entry point for running work on a host thread.
///
/// A `Scheduler` hands out [`Worker`]s bound to its host, keeps one shared
/// worker for callers that do not need their own queue, and can forward
/// single tasks straight to the host.
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = foreground::platform();
///
/// let handle = scheduler.shared_worker().schedule(|| {
///     println!("on the host thread");
/// });
/// ```
pub struct Scheduler {
    host: Arc<dyn Host>,
    shared: OnceLock<Worker>,
}

impl Scheduler {
    /// Creates a scheduler delivering work to `host`.
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            shared: OnceLock::new(),
        }
    }

    /// Returns the host this scheduler delivers to.
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Creates a new worker with its own queue.
    pub fn create_worker(&self) -> Worker {
        Worker::new(self.host.clone())
    }

    /// Returns the worker shared by every caller of this scheduler.
    ///
    /// It is created on first use and lives as long as the scheduler.
    pub fn shared_worker(&self) -> &Worker {
        self.shared.get_or_init(|| self.create_worker())
    }

    /// Runs `task` once through a dedicated worker.
    ///
    /// Behaves exactly like [`Worker::schedule`] on a fresh worker: inline
    /// when called on an idle host thread, one hand-off otherwise.
    pub fn schedule<F>(&self, task: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.create_worker().schedule(task)
    }

    /// Forwards `task` straight to the host's run-later primitive.
    ///
    /// Unlike a worker, every call costs one hand-off and the task never
    /// runs inline. The handle still cancels the task until it starts.
    pub fn post<F>(&self, task: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let node = QueueNode::new(Box::new(task));

        let run = node.clone();
        self.host.run_later(Box::new(move || run.run()));

        TaskHandle::queued(node)
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("shared_worker", &self.shared.get())
            .finish_non_exhaustive()
    }
}

/// The process-wide scheduler and, when it is a [`HostLoop`], its loop.
struct Platform {
    scheduler: Scheduler,

    /// Set when the platform host is a loop that [`exit`] can stop.
    event_loop: Option<LoopHandle>,

    /// Keeps a lazily spawned loop thread alive for the whole process.
    _owner: Option<HostLoop>,
}

static PLATFORM: OnceLock<Platform> = OnceLock::new();

/// Returns the platform scheduler, starting the platform host on first use.
///
/// # Panics
///
/// Panics if the platform host thread cannot be spawned. Use
/// [`try_platform`] to handle that case.
pub fn platform() -> &'static Scheduler {
    try_platform().expect("failed to start the platform host")
}

/// Returns the platform scheduler, starting the platform host on first use.
///
/// Unless [`install`] or `#[foreground::main]` supplied one first, the
/// platform host is a [`HostLoop`] on a dedicated thread.
///
/// # Errors
///
/// Returns [`HostError::Spawn`] if the platform host thread cannot be
/// spawned.
pub fn try_platform() -> Result<&'static Scheduler, HostError> {
    if let Some(platform) = PLATFORM.get() {
        return Ok(&platform.scheduler);
    }

    let host_loop = HostLoopBuilder::new().spawn()?;
    let handle = host_loop.handle().clone();

    let candidate = Platform {
        scheduler: Scheduler::new(Arc::new(handle.clone())),
        event_loop: Some(handle),
        _owner: Some(host_loop),
    };

    // A racing caller may have won; our loop is then dropped and joined.
    Ok(&PLATFORM.get_or_init(|| candidate).scheduler)
}

/// Installs `host` as the platform host.
///
/// # Errors
///
/// Returns [`HostError::AlreadyInstalled`] if the platform was already
/// started or installed.
pub fn install(host: Arc<dyn Host>) -> Result<&'static Scheduler, HostError> {
    register(Platform {
        scheduler: Scheduler::new(host),
        event_loop: None,
        _owner: None,
    })
}

/// Installs a loop running on the current thread as the platform host.
pub(crate) fn install_loop(handle: LoopHandle) -> Result<&'static Scheduler, HostError> {
    register(Platform {
        scheduler: Scheduler::new(Arc::new(handle.clone())),
        event_loop: Some(handle),
        _owner: None,
    })
}

/// Stops the platform host loop.
///
/// Work still queued on the loop is dropped without running. Has no effect
/// when the platform host was supplied through [`install`] or has not been
/// started.
pub fn exit() {
    if let Some(handle) = PLATFORM.get().and_then(|platform| platform.event_loop.as_ref()) {
        tracing::debug!("platform exit requested");
        handle.shutdown();
    }
}

fn register(platform: Platform) -> Result<&'static Scheduler, HostError> {
    let mut installed = false;

    let current = PLATFORM.get_or_init(|| {
        installed = true;
        platform
    });

    if !installed {
        return Err(HostError::AlreadyInstalled);
    }

    tracing::debug!("platform host installed");
    Ok(&current.scheduler)
}
