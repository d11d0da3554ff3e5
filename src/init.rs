use crate::layer::JsonLayoutLayer;
use crate::layout::JsonLayout;
use crate::sink::LogSink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Конфигурация слоя логирования.
///
/// Управляет размером внутреннего буфера, размером батча при отправке в
/// sink, частотой принудительного flush, минимальным уровнем событий,
/// форматом JSON и тем, нужно ли дополнительно печатать логи в консоль
/// через `fmt`‑слой.
///
/// **Поля**
/// - `channel_buffer`: максимальное число строк в очереди до начала дропа.
/// - `batch_size`: размер батча для отправки в sink.
/// - `flush_interval`: максимальный интервал между flush’ами даже при
///   неполном батче.
/// - `min_level`: самый подробный уровень, который попадает в sink.
/// - `include_location`: писать ли `Class`, `File`, `LineNumber`.
/// - `pretty_print`: многострочный JSON вместо компактного.
/// - `enable_stdout`: если `true`, поверх `JsonLayoutLayer` добавляется
///   `tracing_subscriber::fmt::Layer`.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub min_level: Level,
    pub include_location: bool,
    pub pretty_print: bool,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            min_level: Level::INFO,
            include_location: false,
            pretty_print: false,
            enable_stdout: false,
        }
    }
}

/// Build a [`JsonLayoutLayer`] from a [`LayerConfig`] without installing it.
///
/// Must be called from within a Tokio runtime; the returned handle belongs
/// to the background task that feeds `sink`.
pub fn build_layer(
    sink: Arc<dyn LogSink>,
    config: &LayerConfig,
) -> (JsonLayoutLayer, JoinHandle<()>) {
    let (layer, handle) = JsonLayoutLayer::new(
        JsonLayout::new(config.pretty_print),
        sink,
        config.channel_buffer,
        config.batch_size,
        config.flush_interval,
    );
    (
        layer
            .with_min_level(config.min_level)
            .with_location(config.include_location),
        handle,
    )
}

/// Install a global `tracing` subscriber that renders events as JSON lines
/// and ships them to `sink`.
///
/// **Returns**
/// - the handle of the background sink task, or
/// - `Err(..)` if a global subscriber was already set.
pub fn init_tracing_with_config(
    sink: Arc<dyn LogSink>,
    config: LayerConfig,
) -> Result<JoinHandle<()>, SetGlobalDefaultError> {
    let (layer, handle) = build_layer(sink, &config);

    // Слой с sink подключаем всегда; `fmt`‑слой только при
    // `enable_stdout = true`. Типы subscriber’ов разные, поэтому две ветки.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(handle)
}

/// Initialize tracing with [`LayerConfig::default`]: compact JSON, `INFO`
/// and above, no console output.
pub fn init_tracing(sink: Arc<dyn LogSink>) -> Result<JoinHandle<()>, SetGlobalDefaultError> {
    init_tracing_with_config(sink, LayerConfig::default())
}
