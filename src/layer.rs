use crate::field::FieldName;
use crate::layout::{JsonLayout, DIAGNOSTIC_TARGET};
use crate::record::{LogRecord, MapEntries, MessagePayload, SourceLocation, Thrown};
use crate::sink::LogSink;
use chrono::Utc;
use std::error::Error;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s,
/// renders them with a [`JsonLayout`] and forwards the lines to an
/// asynchronous [`LogSink`] via a bounded channel and background task.
///
/// By default only `INFO` and above are captured and no call-site location
/// is written. Sink I/O is fully decoupled from application threads.
pub struct JsonLayoutLayer {
    sender: mpsc::Sender<String>,
    layout: JsonLayout,
    min_level: Level,
    include_location: bool,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full or closed.
    pub dropped_events: Arc<AtomicU64>,
}

impl JsonLayoutLayer {
    /// Create a new layer and spawn a background task that pulls rendered
    /// lines from a bounded channel and sends them to the provided
    /// [`LogSink`]. Must be called from within a Tokio runtime.
    ///
    /// Minimal thresholds are enforced for `buffer`, `batch_size` and
    /// `flush_interval`. The task drains what is left and exits once the
    /// layer is dropped.
    pub fn new(
        layout: JsonLayout,
        sink: Arc<dyn LogSink>,
        buffer: usize,
        batch_size: usize,
        flush_interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let batch_size = batch_size.max(1);
        let flush_interval = flush_interval.max(Duration::from_millis(10));

        let (tx, mut rx) = mpsc::channel::<String>(buffer);

        let total_events = Arc::new(AtomicU64::new(0));
        let enqueued_events = Arc::new(AtomicU64::new(0));
        let dropped_events = Arc::new(AtomicU64::new(0));

        let handle = tokio::spawn(async move {
            let mut batch = Vec::with_capacity(batch_size);
            let backoff = Duration::from_millis(100);
            let max_backoff = Duration::from_secs(10);

            loop {
                tokio::select! {
                    received = rx.recv() => match received {
                        Some(line) => {
                            batch.push(line);
                            if batch.len() >= batch_size {
                                send_batch(&*sink, &mut batch, backoff, max_backoff).await;
                            }
                        }
                        None => {
                            if !batch.is_empty() {
                                send_batch(&*sink, &mut batch, backoff, max_backoff).await;
                            }
                            break;
                        }
                    },
                    _ = sleep(flush_interval) => {
                        if !batch.is_empty() {
                            send_batch(&*sink, &mut batch, backoff, max_backoff).await;
                        }
                    }
                }
            }
        });

        (
            Self {
                sender: tx,
                layout,
                min_level: Level::INFO,
                include_location: false,
                total_events,
                enqueued_events,
                dropped_events,
            },
            handle,
        )
    }

    /// Capture events at `level` and more severe.
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Write `Class`, `File` and `LineNumber` from event metadata.
    pub fn with_location(mut self, include: bool) -> Self {
        self.include_location = include;
        self
    }
}

/// Deliver every line of `batch`, retrying from the first undelivered one
/// with exponential backoff.
async fn send_batch(
    sink: &dyn LogSink,
    batch: &mut Vec<String>,
    mut backoff: Duration,
    max_backoff: Duration,
) {
    loop {
        let mut delivered = 0;
        let mut failure: Option<Box<dyn Error + Send + Sync>> = None;
        for line in batch.iter() {
            match sink.send(line).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        batch.drain(..delivered);

        match failure {
            None => {
                if let Err(e) = sink.flush().await {
                    eprintln!("error flushing log sink: {}", e);
                }
                return;
            }
            Some(e) => {
                eprintln!("log sink send failed ({}), retrying in {:?}", e, backoff);
                sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, max_backoff);
            }
        }
    }
}

impl<S> Layer<S> for JsonLayoutLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target() == DIAGNOSTIC_TARGET {
            return;
        }
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if *meta.level() > self.min_level {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let record = visitor.into_record(meta, self.include_location);

        match self.sender.try_send(self.layout.format(&record)) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("log channel full, dropping log line");
            }
        }
    }
}

/// Collects the message, extra fields and an attached error of one event.
#[derive(Default)]
pub struct EventVisitor {
    message: Option<String>,
    fields: MapEntries,
    thrown: Option<Thrown>,
}

impl EventVisitor {
    fn put(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }

    /// A bare message becomes [`MessagePayload::Simple`]; extra fields turn
    /// the message into a map with `Message` as its first entry.
    pub fn into_record(self, meta: &Metadata<'_>, include_location: bool) -> LogRecord {
        let message = if self.fields.is_empty() {
            MessagePayload::Simple(self.message.unwrap_or_default())
        } else {
            let mut entries = MapEntries::with_capacity(self.fields.len() + 1);
            if let Some(message) = self.message {
                entries.push((FieldName::Message.as_str().to_string(), message));
            }
            entries.extend(self.fields);
            MessagePayload::ObjectMap(entries)
        };

        LogRecord {
            timestamp_millis: Utc::now().timestamp_millis(),
            level: meta.level().into(),
            message,
            thrown: self.thrown,
            include_location,
            source: Some(SourceLocation {
                class_name: Some(meta.target().to_string()),
                file_name: meta.file().map(|s| s.to_string()),
                line_number: meta.line().unwrap_or(0),
                // tracing metadata carries no function name
                method_name: None,
            }),
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn Error + 'static)) {
        self.thrown = Some(Thrown::from_error(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }
}
