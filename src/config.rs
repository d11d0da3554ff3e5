use crate::error::DecodeError;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// Omission policy applied to every field the encoder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// Write every value, including `null`.
    Always,
    /// Drop `null`.
    NonNull,
    /// Drop `null`, empty strings, empty arrays and empty objects.
    NonEmpty,
    /// Like [`Inclusion::NonEmpty`], and also drop `false` and numeric zero.
    NonDefault,
}

impl Inclusion {
    /// Whether a value survives this policy.
    pub fn admits(self, value: &Value) -> bool {
        let non_null = !value.is_null();
        let non_empty = match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Bool(_) | Value::Number(_) => true,
        };

        match self {
            Inclusion::Always => true,
            Inclusion::NonNull => non_null,
            Inclusion::NonEmpty => non_empty,
            Inclusion::NonDefault => {
                non_empty
                    && match value {
                        Value::Bool(b) => *b,
                        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
                        _ => true,
                    }
            }
        }
    }
}

/// Decode-side leniency flags.
///
/// These only matter to code that reads JSON back through
/// [`EncoderConfig::lenient_decode`]; the encoder's own output is unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leniency {
    pub ignore_unknown_fields: bool,
    pub null_for_primitives: bool,
    pub numbers_for_enums: bool,
    pub single_value_as_array: bool,
    pub empty_string_as_null: bool,
    pub backslash_escaping_any_character: bool,
    pub comments: bool,
    pub leading_zeros_for_numbers: bool,
    pub single_quotes: bool,
    pub unquoted_field_names: bool,
    pub arrays_for_json_arrays: bool,
}

impl Leniency {
    /// Every relaxation the JSON5 grammar covers. Leading zeros stay
    /// rejected since JSON5 forbids them too.
    pub fn relaxed() -> Self {
        Self {
            ignore_unknown_fields: true,
            null_for_primitives: true,
            numbers_for_enums: true,
            single_value_as_array: true,
            empty_string_as_null: true,
            backslash_escaping_any_character: true,
            comments: true,
            leading_zeros_for_numbers: false,
            single_quotes: true,
            unquoted_field_names: true,
            arrays_for_json_arrays: true,
        }
    }
}

/// Immutable encoding configuration shared by every encoder in the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub leniency: Leniency,
    /// When `false`, objects without fields are written as `{}` instead of
    /// being treated as an error.
    pub fail_on_empty_objects: bool,
    pub inclusion: Inclusion,
}

static SHARED: OnceLock<Arc<EncoderConfig>> = OnceLock::new();

impl EncoderConfig {
    fn build() -> Self {
        Self {
            leniency: Leniency::relaxed(),
            fail_on_empty_objects: false,
            inclusion: Inclusion::NonEmpty,
        }
    }

    /// The process-wide configuration. Built on first use; every call
    /// returns the same instance.
    pub fn shared() -> Arc<EncoderConfig> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::build())))
    }

    /// Whether a field with this value should be written.
    pub fn should_emit(&self, value: &Value) -> bool {
        self.inclusion.admits(value)
    }

    /// Parse JSON with the leniency this configuration allows.
    ///
    /// Comments, single quotes, unquoted keys or backslash escapes of any
    /// character switch the parser to JSON5; otherwise the input must be
    /// strict JSON. A top-level empty string becomes `null` when
    /// `empty_string_as_null` is set.
    pub fn lenient_decode(&self, text: &str) -> Result<Value, DecodeError> {
        let leniency = &self.leniency;
        if leniency.empty_string_as_null && text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = if leniency.comments
            || leniency.single_quotes
            || leniency.unquoted_field_names
            || leniency.backslash_escaping_any_character
        {
            json5::from_str(text)?
        } else {
            serde_json::from_str(text)?
        };
        match value {
            Value::String(s) if s.is_empty() && leniency.empty_string_as_null => Ok(Value::Null),
            other => Ok(other),
        }
    }

    /// Wrap a lone value into a one-element array when
    /// `single_value_as_array` is set.
    pub fn as_array(&self, value: Value) -> Value {
        match value {
            Value::Array(_) => value,
            Value::Null => Value::Array(Vec::new()),
            other if self.leniency.single_value_as_array => Value::Array(vec![other]),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shared_returns_same_instance() {
        let a = EncoderConfig::shared();
        let b = EncoderConfig::shared();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
        assert_eq!(a.inclusion, Inclusion::NonEmpty);
        assert!(a.leniency.ignore_unknown_fields);
    }

    #[test]
    fn concurrent_first_use_sees_one_instance() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(EncoderConfig::shared))
            .collect();
        let configs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for c in &configs {
            assert!(Arc::ptr_eq(c, &configs[0]));
        }
    }

    #[test]
    fn non_empty_drops_null_and_empty_values() {
        let p = Inclusion::NonEmpty;
        assert!(!p.admits(&Value::Null));
        assert!(!p.admits(&json!("")));
        assert!(!p.admits(&json!([])));
        assert!(!p.admits(&json!({})));
        assert!(p.admits(&json!(0)));
        assert!(p.admits(&json!(false)));
        assert!(p.admits(&json!("x")));
    }

    #[test]
    fn non_default_also_drops_zero_and_false() {
        let p = Inclusion::NonDefault;
        assert!(!p.admits(&json!(0)));
        assert!(!p.admits(&json!(0.0)));
        assert!(!p.admits(&json!(false)));
        assert!(p.admits(&json!(7)));
        assert!(Inclusion::Always.admits(&Value::Null));
        assert!(!Inclusion::NonNull.admits(&Value::Null));
        assert!(Inclusion::NonNull.admits(&json!("")));
    }

    #[test]
    fn lenient_decode_skips_comments() {
        let config = EncoderConfig::shared();
        let text = "{\n  // who\n  \"user\": \"a//b\", /* inline */ \"ok\": true\n}";
        let value = config.lenient_decode(text).unwrap();
        assert_eq!(value, json!({"user": "a//b", "ok": true}));
    }

    #[test]
    fn lenient_decode_accepts_single_quotes_and_bare_keys() {
        let config = EncoderConfig::shared();
        assert!(config.leniency.single_quotes && config.leniency.unquoted_field_names);
        let value = config.lenient_decode("{user: 'alice'}").unwrap();
        assert_eq!(value, json!({"user": "alice"}));
    }

    #[test]
    fn leading_zeros_are_not_claimed() {
        let config = EncoderConfig::shared();
        assert!(!config.leniency.leading_zeros_for_numbers);
        assert!(config.lenient_decode(r#"{"n": 007}"#).is_err());
    }

    #[test]
    fn strict_decode_rejects_relaxed_syntax() {
        let config = EncoderConfig {
            leniency: Leniency {
                comments: false,
                single_quotes: false,
                unquoted_field_names: false,
                backslash_escaping_any_character: false,
                ..Leniency::relaxed()
            },
            ..(*EncoderConfig::shared()).clone()
        };
        assert!(config.lenient_decode("{user: 'alice'}").is_err());
        assert_eq!(
            config.lenient_decode(r#"{"user": "alice"}"#).unwrap(),
            json!({"user": "alice"})
        );
    }

    #[test]
    fn lenient_decode_maps_empty_to_null() {
        let config = EncoderConfig::shared();
        assert_eq!(config.lenient_decode("").unwrap(), Value::Null);
        assert_eq!(config.lenient_decode("\"\"").unwrap(), Value::Null);
    }

    #[test]
    fn as_array_wraps_single_values() {
        let config = EncoderConfig::shared();
        assert_eq!(config.as_array(json!(1)), json!([1]));
        assert_eq!(config.as_array(json!([1, 2])), json!([1, 2]));
        assert_eq!(config.as_array(Value::Null), json!([]));
    }
}
