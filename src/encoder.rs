use crate::config::EncoderConfig;
use crate::error::EncodeError;
use crate::field::FieldName;
use crate::record::{Level, LogRecord, MapEntries, MessagePayload, Param, SourceLocation};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::sync::Arc;

/// JSON object produced for one [`LogRecord`].
///
/// Fields keep the order they were written in and serialize as a single
/// JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedRecord {
    fields: Vec<(String, Value)>,
}

impl EncodedRecord {
    /// First value written under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for EncodedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Accumulates fields, dropping the ones the omission policy rejects.
struct ObjectWriter<'a> {
    config: &'a EncoderConfig,
    fields: Vec<(String, Value)>,
}

impl<'a> ObjectWriter<'a> {
    fn new(config: &'a EncoderConfig) -> Self {
        Self { config, fields: Vec::new() }
    }

    fn field(&mut self, name: impl Into<String>, value: Value) {
        if self.config.should_emit(&value) {
            self.fields.push((name.into(), value));
        }
    }

    fn level(&mut self, level: Level) {
        self.field(FieldName::Level.as_str(), Value::String(level.as_str().to_string()));
    }

    fn finish(self) -> EncodedRecord {
        EncodedRecord { fields: self.fields }
    }
}

/// Turns [`LogRecord`]s into [`EncodedRecord`]s.
///
/// Holds only a shared, read-only [`EncoderConfig`]; cloning is cheap and
/// one encoder can be used from many threads at once.
#[derive(Debug, Clone)]
pub struct RecordEncoder {
    config: Arc<EncoderConfig>,
}

impl Default for RecordEncoder {
    fn default() -> Self {
        Self::new(EncoderConfig::shared())
    }
}

impl RecordEncoder {
    pub fn new(config: Arc<EncoderConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Build the JSON object for one record.
    ///
    /// Field order: `TimeStamp`, level and message fields, `Exception`,
    /// then location fields.
    pub fn encode(&self, record: &LogRecord) -> Result<EncodedRecord, EncodeError> {
        let mut out = ObjectWriter::new(&self.config);

        out.field(
            FieldName::TimeStamp.as_str(),
            Value::String(format_timestamp(record.timestamp_millis)?),
        );

        match &record.message {
            MessagePayload::Simple(text) | MessagePayload::Parameterized(text) => {
                out.level(record.level);
                out.field(FieldName::Message.as_str(), Value::String(text.clone()));
            }
            MessagePayload::ObjectSingle(param) => {
                write_parameters(&mut out, record.level, std::slice::from_ref(param))?
            }
            MessagePayload::ObjectList(params) => write_parameters(&mut out, record.level, params)?,
            MessagePayload::ObjectMap(entries) => write_map(&mut out, record.level, entries),
        }

        if let Some(thrown) = &record.thrown {
            let flattened = thrown.trace().replace(|c: char| c == '\n' || c == '\t', " ");
            out.field(FieldName::Exception.as_str(), Value::String(flattened));
        }

        if record.include_location {
            if let Some(source) = &record.source {
                write_location(&mut out, source);
            }
        }

        Ok(out.finish())
    }
}

/// ISO-8601 UTC, sub-second digits only when non-zero.
fn format_timestamp(millis: i64) -> Result<String, EncodeError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .ok_or(EncodeError::TimestampOutOfRange(millis))
}

/// Dispatch on the shape of the parameter array: its length and whether the
/// sole element is a map.
fn write_parameters(
    out: &mut ObjectWriter<'_>,
    level: Level,
    params: &[Param],
) -> Result<(), EncodeError> {
    match params {
        [] => {}
        [Param::Map(entries)] => write_map(out, level, entries),
        [single] => {
            let value = encode_param(0, single)?;
            if is_not_empty(&value) {
                out.level(level);
                out.field(FieldName::Message.as_str(), value);
            }
        }
        many => {
            let mut items = Vec::with_capacity(many.len());
            for (index, param) in many.iter().enumerate() {
                let value = encode_param(index, param)?;
                if is_not_empty(&value) {
                    items.push(value);
                }
            }
            out.level(level);
            out.field(FieldName::Message.as_str(), Value::Array(items));
        }
    }
    Ok(())
}

fn write_map(out: &mut ObjectWriter<'_>, level: Level, entries: &MapEntries) {
    out.level(level);
    for (key, value) in entries {
        if !key.is_empty() && !value.is_empty() {
            out.field(key.clone(), Value::String(value.clone()));
        }
    }
}

fn write_location(out: &mut ObjectWriter<'_>, source: &SourceLocation) {
    if let Some(class) = non_empty(&source.class_name) {
        out.field(FieldName::Class.as_str(), Value::String(class.to_string()));
    }
    if let Some(file) = non_empty(&source.file_name) {
        out.field(FieldName::File.as_str(), Value::String(file.to_string()));
    }
    if source.line_number != 0 {
        out.field(FieldName::LineNumber.as_str(), Value::from(source.line_number));
    }
    if let Some(function) = non_empty(&source.method_name) {
        out.field(FieldName::Function.as_str(), Value::String(function.to_string()));
    }
}

fn encode_param(index: usize, param: &Param) -> Result<Value, EncodeError> {
    match param {
        Param::Value(value) => Ok(value.clone()),
        Param::Map(entries) => Ok(Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )),
        Param::Object(object) => object
            .to_json()
            .map_err(|source| EncodeError::Parameter { index, source }),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Null and empty strings are empty; everything else has a non-empty
/// textual form.
fn is_not_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
