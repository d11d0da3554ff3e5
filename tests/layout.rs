use json_log_layout::layout::DIAGNOSTIC_TARGET;
use json_log_layout::{
    EncoderConfig, JsonLayout, Level, LogRecord, MessagePayload, Param, SourceLocation, Thrown,
    LINE_SEPARATOR,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

const TS: i64 = 1_700_000_000_000;

fn parse(line: &str) -> Value {
    let body = line.strip_suffix(LINE_SEPARATOR).expect("line separator");
    serde_json::from_str(body).unwrap()
}

/// Byte offset of a key in the rendered text; object key order is not
/// preserved once parsed into a `Value`.
fn key_offset(line: &str, key: &str) -> usize {
    line.find(&format!("\"{key}\":")).unwrap()
}

fn sample_records() -> Vec<LogRecord> {
    vec![
        LogRecord::new(TS, Level::Info, "hello"),
        LogRecord::new(TS, Level::Info, ""),
        LogRecord::new(TS, Level::Debug, MessagePayload::Parameterized("n=3".into())),
        LogRecord::new(TS, Level::Warn, MessagePayload::ObjectSingle(Param::null())),
        LogRecord::new(TS, Level::Warn, MessagePayload::list(["", ""])),
        LogRecord::new(TS, Level::Error, MessagePayload::list(["a", "", "b"]))
            .with_thrown(Thrown::new("Error\n\tat foo")),
        LogRecord::new(TS, Level::Info, MessagePayload::map([("k", ""), ("", "v"), ("x", "y")])),
        LogRecord::new(TS, Level::Trace, MessagePayload::ObjectList(Vec::new())).with_location(
            SourceLocation {
                class_name: Some(String::new()),
                file_name: None,
                line_number: 0,
                method_name: Some(String::new()),
            },
        ),
    ]
}

#[test]
fn shared_configuration_is_stable() {
    let first = EncoderConfig::shared();
    for _ in 0..10 {
        let again = EncoderConfig::shared();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.inclusion, again.inclusion);
        assert_eq!(first.leniency, again.leniency);
    }
}

#[test]
fn compact_and_pretty_parse_to_the_same_value() {
    let compact = JsonLayout::new(false);
    let pretty = JsonLayout::new(true);
    for record in sample_records() {
        let a = compact.format(&record);
        let b = pretty.format(&record);
        assert!(!a.trim_end().contains('\n'));
        assert_eq!(parse(&a), parse(&b));
    }
}

#[test]
fn output_never_contains_empty_values() {
    let layout = JsonLayout::default();
    for record in sample_records() {
        let value = parse(&layout.format(&record));
        for (key, field) in value.as_object().unwrap() {
            let empty = field.is_null()
                || field.as_str() == Some("")
                || field.as_array().map_or(false, |a| a.is_empty());
            assert!(!empty, "field {key} is empty in {value}");
        }
    }
}

#[test]
fn timestamp_first_and_exception_before_location() {
    let record = LogRecord::new(TS, Level::Error, "failed")
        .with_thrown(Thrown::new("boom"))
        .with_location(SourceLocation {
            class_name: Some("C".into()),
            file_name: Some("c.rs".into()),
            line_number: 9,
            method_name: Some("m".into()),
        });
    let line = JsonLayout::default().format(&record);
    assert!(line.starts_with("{\"TimeStamp\":"));
    let message = key_offset(&line, "Message");
    let exception = key_offset(&line, "Exception");
    let class = key_offset(&line, "Class");
    assert!(message < exception && exception < class);
}

#[test]
fn simple_message() {
    let value = parse(&JsonLayout::default().format(&LogRecord::new(TS, Level::Info, "hello")));
    assert_eq!(
        value,
        json!({"TimeStamp": "2023-11-14T22:13:20Z", "Level": "INFO", "Message": "hello"})
    );
}

#[test]
fn single_map_parameter_becomes_top_level_fields() {
    let record = LogRecord::new(
        TS,
        Level::Warn,
        MessagePayload::ObjectSingle(Param::map([("user", "alice"), ("action", "login")])),
    );
    let value = parse(&JsonLayout::default().format(&record));
    assert_eq!(value["Level"], "WARN");
    assert_eq!(value["user"], "alice");
    assert_eq!(value["action"], "login");
    assert!(value.get("Message").is_none());
}

#[test]
fn multi_parameter_list_skips_empty_elements() {
    let record = LogRecord::new(TS, Level::Info, MessagePayload::list(["a", "", "b"]));
    let value = parse(&JsonLayout::default().format(&record));
    assert_eq!(value["Level"], "INFO");
    assert_eq!(value["Message"], json!(["a", "b"]));
}

#[test]
fn exception_newlines_and_tabs_become_spaces() {
    let record = LogRecord::new(TS, Level::Error, "failed")
        .with_thrown(Thrown::new("Error\n\tat foo\n\tat bar"));
    let value = parse(&JsonLayout::default().format(&record));
    assert_eq!(value["Exception"], "Error  at foo  at bar");
}

#[test]
fn location_with_zero_line_number() {
    let record = LogRecord::new(TS, Level::Info, "x").with_location(SourceLocation {
        class_name: Some("C".into()),
        file_name: Some(String::new()),
        line_number: 0,
        method_name: Some("m".into()),
    });
    let value = parse(&JsonLayout::default().format(&record));
    assert_eq!(value["Class"], "C");
    assert_eq!(value["Function"], "m");
    assert!(value.get("File").is_none());
    assert!(value.get("LineNumber").is_none());
}

#[derive(Clone, Default)]
struct CapturedTargets(Arc<Mutex<Vec<String>>>);

impl<S: Subscriber> Layer<S> for CapturedTargets {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.0
            .lock()
            .unwrap()
            .push(event.metadata().target().to_string());
    }
}

#[test]
fn encoding_failure_yields_empty_line_and_diagnostic() {
    let mut unencodable = HashMap::new();
    unencodable.insert(vec![1u8], "value");
    let message = MessagePayload::ObjectSingle(Param::object(unencodable));
    let record = LogRecord::new(TS, Level::Error, message);

    let layout = JsonLayout::default();
    assert!(layout.try_format(&record).is_err());

    let captured = CapturedTargets::default();
    let subscriber = Registry::default().with(captured.clone());
    let line = tracing::subscriber::with_default(subscriber, || layout.format(&record));

    assert_eq!(line, LINE_SEPARATOR);
    let targets = captured.0.lock().unwrap();
    assert_eq!(*targets, vec![DIAGNOSTIC_TARGET.to_string()]);
}

#[test]
fn layout_is_shareable_across_threads() {
    let layout = Arc::new(JsonLayout::default());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let layout = Arc::clone(&layout);
            std::thread::spawn(move || {
                let record = LogRecord::new(TS + i, Level::Info, format!("thread {i}"));
                parse(&layout.format(&record))
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap()["Message"], format!("thread {i}"));
    }
}
