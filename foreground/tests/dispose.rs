mod common;

use common::{DropProbe, ManualHost, recorder};
use foreground::{HostLoop, Worker};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[test]
fn test_pending_tasks_are_dropped_without_running() {
    let host = ManualHost::new();
    let worker = Worker::new(host.clone());
    let ran = Arc::new(AtomicUsize::new(0));
    let drops = Arc::new(AtomicUsize::new(0));

    for _ in 0..10 {
        let counter = ran.clone();
        let probe = DropProbe(drops.clone());
        let _ = worker.schedule(move || {
            let _probe = probe;
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    worker.dispose();

    assert!(worker.is_disposed());
    assert_eq!(drops.load(Ordering::SeqCst), 10, "Dispose should release every pending task");

    host.pump();
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn test_schedule_after_dispose_is_rejected() {
    let host = ManualHost::new();
    let worker = Worker::new(host.clone());
    worker.dispose();

    let drops = Arc::new(AtomicUsize::new(0));
    let probe = DropProbe(drops.clone());
    let handle = worker.schedule(move || drop(probe));

    assert!(handle.is_disposed(), "A rejected task should come back already disposed");
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(host.posts(), 0, "A disposed worker should never wake its host");
}

#[test]
fn test_timed_schedules_after_dispose_are_rejected() {
    let host = ManualHost::new();
    let worker = Worker::new(host.clone());
    worker.dispose();

    let delayed = worker
        .schedule_delayed(|| {}, Duration::from_millis(10))
        .unwrap();
    let periodic = worker
        .schedule_periodically(|| {}, Duration::ZERO, Duration::from_millis(10))
        .unwrap();

    assert!(delayed.is_disposed());
    assert!(periodic.is_disposed());
    assert!(host.running_timers().is_empty());
}

#[test]
fn test_dispose_is_idempotent() {
    let host = ManualHost::new();
    let worker = Worker::new(host.clone());

    worker.dispose();
    worker.dispose();

    assert!(worker.is_disposed());
}

#[test]
fn test_task_disposing_its_worker_stops_the_drain() {
    let host = ManualHost::new();
    let worker = Arc::new(Worker::new(host.clone()));
    let log = recorder();

    let owner = worker.clone();
    let first = log.clone();
    let _ = worker.schedule(move || {
        first.lock().unwrap().push(1);
        owner.dispose();
    });

    for i in 2..5 {
        let log = log.clone();
        let _ = worker.schedule(move || log.lock().unwrap().push(i));
    }

    host.pump();
    assert_eq!(*log.lock().unwrap(), [1]);
}

#[test]
fn test_dispose_from_another_thread_during_a_drain() {
    let host = HostLoop::spawn().unwrap();
    let worker = Worker::new(Arc::new(host.handle().clone()));
    let ran = Arc::new(AtomicUsize::new(0));

    let (started_tx, started_rx) = crossbeam_channel::bounded(1);
    let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);

    let _ = worker.schedule(move || {
        let _ = started_tx.send(());
        let _ = release_rx.recv_timeout(Duration::from_secs(5));
    });

    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    for _ in 0..10 {
        let counter = ran.clone();
        let _ = worker.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    worker.dispose();
    release_tx.send(()).unwrap();

    let seen = host
        .handle()
        .invoke_and_wait(Duration::from_secs(5), {
            let ran = ran.clone();
            move || ran.load(Ordering::SeqCst)
        })
        .unwrap();

    assert_eq!(seen, 0, "Tasks queued behind the running one should be dropped");
}

#[test]
fn test_dropping_a_worker_does_not_dispose_it() {
    let host = ManualHost::new();
    let ran = Arc::new(AtomicUsize::new(0));

    {
        let worker = Worker::new(host.clone());
        let counter = ran.clone();
        let _ = worker.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    host.pump();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}
