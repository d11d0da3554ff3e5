use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::error;

use json_log_layout::init::init_tracing;
use json_log_layout::noop_sink::NoopSink;

#[tokio::main]
async fn main() {
    let sink = Arc::new(NoopSink::default());
    if let Err(e) = init_tracing(sink) {
        eprintln!("could not install subscriber: {}", e);
        return;
    }

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!(
        "default config: rendered {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give background task a little time to drain the channel
    sleep(Duration::from_secs(2)).await;
}
