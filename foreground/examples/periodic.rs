use foreground::{HostLoop, Worker};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let host = HostLoop::builder().name("ticker").spawn()?;
    let worker = Worker::new(Arc::new(host.handle().clone()));

    let start = Instant::now();
    let ticks = Arc::new(AtomicUsize::new(0));

    let counter = ticks.clone();
    let handle = worker.schedule_periodically(
        move || {
            let tick = counter.fetch_add(1, Ordering::SeqCst);
            tracing::info!(tick, elapsed = ?start.elapsed(), "tick");
        },
        Duration::from_millis(50),
        Duration::from_millis(100),
    )?;

    std::thread::sleep(Duration::from_millis(600));
    handle.dispose();

    let total = host
        .handle()
        .invoke_and_wait(Duration::from_secs(1), move || ticks.load(Ordering::SeqCst))?;
    tracing::info!(total, "periodic task cancelled");

    worker.dispose();
    host.join();

    Ok(())
}
