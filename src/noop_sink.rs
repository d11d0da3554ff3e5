use crate::sink::LogSink;
use async_trait::async_trait;
use std::error::Error;

/// A sink that simply drops all lines.
///
/// Useful for measuring the cost of encoding and rendering without any
/// external I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn send(&self, _line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
