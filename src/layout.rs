use crate::encoder::RecordEncoder;
use crate::error::LayoutError;
use crate::record::LogRecord;
use serde::Deserialize;

/// Separator appended after every rendered record.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Target of the diagnostic events emitted when a record cannot be rendered.
pub const DIAGNOSTIC_TARGET: &str = "json_log_layout::diagnostics";

/// Layout options, as they appear in host configuration (`prettyPrint`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub pretty_print: bool,
}

/// Renders [`LogRecord`]s as one JSON object per line.
///
/// Compact output by default; with `pretty_print` the object is indented
/// but still followed by a single [`LINE_SEPARATOR`].
#[derive(Debug, Clone, Default)]
pub struct JsonLayout {
    pretty_print: bool,
    encoder: RecordEncoder,
}

impl JsonLayout {
    pub fn new(pretty_print: bool) -> Self {
        Self::with_encoder(pretty_print, RecordEncoder::default())
    }

    pub fn with_encoder(pretty_print: bool, encoder: RecordEncoder) -> Self {
        Self { pretty_print, encoder }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.pretty_print)
    }

    /// Build a layout from a raw `prettyPrint` attribute value.
    ///
    /// `"true"` in any case enables pretty printing; anything else,
    /// including a missing attribute, selects compact output.
    pub fn create_layout(pretty_print: Option<&str>) -> Self {
        let pretty = pretty_print
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self::new(pretty)
    }

    pub fn is_pretty_print(&self) -> bool {
        self.pretty_print
    }

    /// Render one record without the trailing separator.
    pub fn try_format(&self, record: &LogRecord) -> Result<String, LayoutError> {
        let encoded = self.encoder.encode(record)?;
        let text = if self.pretty_print {
            serde_json::to_string_pretty(&encoded)?
        } else {
            serde_json::to_string(&encoded)?
        };
        Ok(text)
    }

    /// Render one record followed by [`LINE_SEPARATOR`].
    ///
    /// Never fails: when the record cannot be encoded a diagnostic event is
    /// emitted on [`DIAGNOSTIC_TARGET`] and an empty line is returned.
    pub fn format(&self, record: &LogRecord) -> String {
        let mut line = match self.try_format(record) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    target: DIAGNOSTIC_TARGET,
                    error = %e,
                    record = ?record,
                    "could not write log event"
                );
                String::new()
            }
        };
        line.push_str(LINE_SEPARATOR);
        line
    }

    /// UTF-8 bytes of [`JsonLayout::format`].
    pub fn format_bytes(&self, record: &LogRecord) -> Vec<u8> {
        self.format(record).into_bytes()
    }
}
