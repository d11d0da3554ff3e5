use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Severity of a [`LogRecord`], written as its uppercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            _ => Level::Trace,
        }
    }
}

/// A message parameter object that knows how to turn itself into JSON.
///
/// Implemented for every `Serialize` type; encoding may fail, e.g. for maps
/// with non-string keys.
pub trait ToJson: fmt::Debug + Send + Sync {
    fn to_json(&self) -> serde_json::Result<Value>;
}

impl<T> ToJson for T
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Key-value entries of a map parameter, in insertion order.
pub type MapEntries = Vec<(String, String)>;

/// One message parameter.
#[derive(Debug, Clone)]
pub enum Param {
    /// A plain JSON value; `Value::Null` stands for a missing parameter.
    Value(Value),
    /// A string key-value map. As the sole parameter its entries become
    /// top-level fields.
    Map(MapEntries),
    /// An arbitrary object encoded at write time.
    Object(Arc<dyn ToJson>),
}

impl Param {
    pub fn null() -> Self {
        Param::Value(Value::Null)
    }

    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Param::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn object<T>(value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Param::Object(Arc::new(value))
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Param::Value(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Value(Value::String(value))
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Value(Value::from(value))
    }
}

/// The shapes a log message can take.
#[derive(Debug, Clone)]
pub enum MessagePayload {
    Simple(String),
    /// Result of an already-interpolated template.
    Parameterized(String),
    ObjectSingle(Param),
    ObjectList(Vec<Param>),
    ObjectMap(MapEntries),
}

impl MessagePayload {
    pub fn list<P: Into<Param>>(params: impl IntoIterator<Item = P>) -> Self {
        MessagePayload::ObjectList(params.into_iter().map(Into::into).collect())
    }

    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        MessagePayload::ObjectMap(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for MessagePayload {
    fn from(text: &str) -> Self {
        MessagePayload::Simple(text.to_string())
    }
}

impl From<String> for MessagePayload {
    fn from(text: String) -> Self {
        MessagePayload::Simple(text)
    }
}

/// Rendered error chain attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thrown {
    trace: String,
}

impl Thrown {
    /// Wrap an already-rendered stack trace.
    pub fn new(trace: impl Into<String>) -> Self {
        Self { trace: trace.into() }
    }

    /// Render an error and its `source()` chain, one cause per line.
    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        let mut trace = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push_str("\nCaused by: ");
            trace.push_str(&cause.to_string());
            source = cause.source();
        }
        Self { trace }
    }

    pub fn trace(&self) -> &str {
        &self.trace
    }
}

/// Call site of a log statement. Empty strings and a zero line number
/// count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub class_name: Option<String>,
    pub file_name: Option<String>,
    pub line_number: u32,
    pub method_name: Option<String>,
}

/// One log event as handed over by the hosting framework.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp_millis: i64,
    pub level: Level,
    pub message: MessagePayload,
    pub thrown: Option<Thrown>,
    pub include_location: bool,
    pub source: Option<SourceLocation>,
}

impl LogRecord {
    pub fn new(timestamp_millis: i64, level: Level, message: impl Into<MessagePayload>) -> Self {
        Self {
            timestamp_millis,
            level,
            message: message.into(),
            thrown: None,
            include_location: false,
            source: None,
        }
    }

    /// Record stamped with the current wall-clock time.
    pub fn now(level: Level, message: impl Into<MessagePayload>) -> Self {
        Self::new(Utc::now().timestamp_millis(), level, message)
    }

    pub fn with_thrown(mut self, thrown: Thrown) -> Self {
        self.thrown = Some(thrown);
        self
    }

    /// Attach a call site and enable location output.
    pub fn with_location(mut self, source: SourceLocation) -> Self {
        self.include_location = true;
        self.source = Some(source);
        self
    }
}
