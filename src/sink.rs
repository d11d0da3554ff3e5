use async_trait::async_trait;
use std::error::Error;

/// Asynchronous destination for rendered JSON log lines.
///
/// Implementations transport lines to a concrete backend (file, socket,
/// stdout, etc). The layer calls `send` from a background task and never
/// awaits it on the application thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Send one rendered line to the underlying backend.
    ///
    /// **Parameters**
    /// - `line`: a single JSON object followed by the line separator, as
    ///   produced by [`JsonLayout::format`](crate::layout::JsonLayout::format).
    ///
    /// **Returns**
    /// - `Ok(())` if the line was accepted by the backend.
    /// - `Err(..)` if the backend failed. The layer treats this as a
    ///   transient failure and retries the rest of the batch with backoff.
    async fn send(&self, line: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered lines, if the backend implements buffering.
    ///
    /// Called after every fully delivered batch. Default implementation is
    /// a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
