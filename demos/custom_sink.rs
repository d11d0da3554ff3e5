use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use json_log_layout::init::{init_tracing_with_config, LayerConfig};
use json_log_layout::sink::LogSink;
use json_log_layout::{JsonLayout, Level, LogRecord, MessagePayload, Param};
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Example of plugging in a custom destination by implementing `LogSink`
/// directly. Here the lines simply go to stdout.
struct StdoutSink;

#[async_trait]
impl LogSink for StdoutSink {
    async fn send(&self, line: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        print!("{}", line);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let config = LayerConfig {
        include_location: true,
        flush_interval: Duration::from_millis(100),
        ..LayerConfig::default()
    };
    if let Err(e) = init_tracing_with_config(Arc::new(StdoutSink), config) {
        eprintln!("could not install subscriber: {}", e);
        return;
    }

    info!("custom sink example started");
    error!(user = "alice", action = "login", "authentication failed");

    // The layout can also be used directly on hand-built records.
    let layout = JsonLayout::new(true);
    let record = LogRecord::now(
        Level::Warn,
        MessagePayload::ObjectSingle(Param::map([("user", "bob"), ("action", "logout")])),
    );
    print!("{}", layout.format(&record));

    // A parameter that cannot be encoded yields an empty line and a
    // diagnostic event instead of a panic.
    let mut bad = HashMap::new();
    bad.insert((1, 2), "tuple keys are not JSON keys");
    let record = LogRecord::now(Level::Error, MessagePayload::ObjectSingle(Param::object(bad)));
    print!("{:?}", layout.format(&record));

    sleep(Duration::from_millis(300)).await;
}
