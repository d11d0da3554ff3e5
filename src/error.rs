/// Error type returned when a [`LogRecord`](crate::record::LogRecord)
/// cannot be turned into a JSON object.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("timestamp {0} ms is outside the representable range")]
    TimestampOutOfRange(i64),

    #[error("message parameter {index} could not be encoded: {source}")]
    Parameter {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Error type returned by [`JsonLayout::try_format`](crate::layout::JsonLayout::try_format).
#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("could not render log record: {0}")]
    Render(#[from] serde_json::Error),
}

/// Error type returned by
/// [`EncoderConfig::lenient_decode`](crate::config::EncoderConfig::lenient_decode).
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid relaxed JSON: {0}")]
    Json5(#[from] json5::Error),
}
