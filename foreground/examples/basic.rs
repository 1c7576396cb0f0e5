use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[foreground::main(name = "ui")]
fn main() {
    init_tracing();

    let worker = Arc::new(foreground::platform().create_worker());

    let producers: Vec<_> = (0..3)
        .map(|producer| {
            let worker = worker.clone();
            std::thread::spawn(move || {
                for step in 0..3 {
                    let _ = worker.schedule(move || {
                        tracing::info!(producer, step, "running on the ui thread");
                    });
                }
            })
        })
        .collect();

    // The host thread is busy until main's body returns; producers only
    // queue work, so joining them here cannot deadlock.
    for producer in producers {
        let _ = producer.join();
    }

    match worker.schedule_delayed(foreground::exit, Duration::from_millis(100)) {
        Ok(_) => tracing::info!("exiting in 100ms"),
        Err(err) => tracing::error!(%err, "could not schedule exit"),
    }
}
