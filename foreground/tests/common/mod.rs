#![allow(dead_code)]

use foreground::host::{Callback, Host, HostTimer, TimerCallback};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::thread::{self, ThreadId};

/// Installs a `fmt` subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A host driven by hand.
///
/// Callbacks queue up until [`pump`](ManualHost::pump) runs them, and timers
/// only fire when [`fire_timers`](ManualHost::fire_timers) is called. The
/// thread calling either of those is the host thread for the duration of
/// the call.
#[derive(Default)]
pub struct ManualHost {
    queue: Mutex<VecDeque<Callback>>,
    posts: AtomicUsize,
    host_thread: Mutex<Option<ThreadId>>,
    timers: Mutex<Vec<ManualTimer>>,
}

pub struct ManualTimer {
    pub delay_ms: u64,
    pub period_ms: Option<u64>,
    callback: TimerCallback,
    stopped: Arc<AtomicBool>,
}

struct StopFlag(Arc<AtomicBool>);

impl HostTimer for StopFlag {
    fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl ManualHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Runs queued callbacks, including ones queued meanwhile, until none
    /// are left. Returns how many ran.
    pub fn pump(&self) -> usize {
        self.as_host(|| {
            let mut ran = 0;

            loop {
                let next = self.queue.lock().unwrap().pop_front();
                let Some(callback) = next else {
                    return ran;
                };

                callback();
                ran += 1;
            }
        })
    }

    /// Fires every running timer once, dropping one-shot timers afterwards.
    pub fn fire_timers(&self) {
        let due: Vec<_> = self
            .timers
            .lock()
            .unwrap()
            .iter()
            .filter(|timer| !timer.stopped.load(Ordering::SeqCst))
            .map(|timer| timer.callback.clone())
            .collect();

        self.as_host(|| {
            for callback in due {
                callback();
            }
        });

        self.timers
            .lock()
            .unwrap()
            .retain(|timer| timer.period_ms.is_some());
    }

    /// Number of hand-offs requested through `run_later`.
    pub fn posts(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// `(delay_ms, period_ms)` of every timer started and not yet stopped.
    pub fn running_timers(&self) -> Vec<(u64, Option<u64>)> {
        self.timers
            .lock()
            .unwrap()
            .iter()
            .filter(|timer| !timer.stopped.load(Ordering::SeqCst))
            .map(|timer| (timer.delay_ms, timer.period_ms))
            .collect()
    }

    fn as_host<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous = self
            .host_thread
            .lock()
            .unwrap()
            .replace(thread::current().id());

        let _restore = RestoreHostThread {
            host_thread: &self.host_thread,
            previous,
        };

        f()
    }

    fn start(&self, delay_ms: u64, period_ms: Option<u64>, callback: TimerCallback) -> Box<dyn HostTimer> {
        let stopped = Arc::new(AtomicBool::new(false));

        self.timers.lock().unwrap().push(ManualTimer {
            delay_ms,
            period_ms,
            callback,
            stopped: stopped.clone(),
        });

        Box::new(StopFlag(stopped))
    }
}

impl Host for ManualHost {
    fn run_later(&self, callback: Callback) {
        self.posts.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().unwrap().push_back(callback);
    }

    fn is_host_thread(&self) -> bool {
        *self.host_thread.lock().unwrap() == Some(thread::current().id())
    }

    fn one_shot(&self, delay_ms: u64, on_fire: TimerCallback) -> Box<dyn HostTimer> {
        self.start(delay_ms, None, on_fire)
    }

    fn repeating(
        &self,
        initial_delay_ms: u64,
        period_ms: u64,
        on_fire: TimerCallback,
    ) -> Box<dyn HostTimer> {
        self.start(initial_delay_ms, Some(period_ms), on_fire)
    }
}

/// Puts back the previous host-thread marker, even if a callback panics.
struct RestoreHostThread<'a> {
    host_thread: &'a Mutex<Option<ThreadId>>,
    previous: Option<ThreadId>,
}

impl Drop for RestoreHostThread<'_> {
    fn drop(&mut self) {
        let mut host_thread = self
            .host_thread
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *host_thread = self.previous;
    }
}

/// Counts how many times a value was dropped.
pub struct DropProbe(pub Arc<AtomicUsize>);

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Shared log of values pushed by tasks.
pub fn recorder<T>() -> Arc<Mutex<Vec<T>>> {
    Arc::new(Mutex::new(Vec::new()))
}
