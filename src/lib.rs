pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
pub mod layout;
pub mod record;

pub mod init;
pub mod layer;
pub mod noop_sink;
pub mod sink;

pub use config::{EncoderConfig, Inclusion};
pub use encoder::{EncodedRecord, RecordEncoder};
pub use error::{DecodeError, EncodeError, LayoutError};
pub use layout::{JsonLayout, LayoutConfig, LINE_SEPARATOR};
pub use record::{Level, LogRecord, MessagePayload, Param, SourceLocation, Thrown};
