//! Answer resolution rules shared by the interactive and autosubmit paths.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use interact_spec::FieldSpec;

static CONTROL_SEQUENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-_]|[\x00-\x08\x0b-\x1f\x7f]",
    )
    .expect("control sequence pattern compiles")
});

/// Configured default for the field's name, else the field's own default.
/// A null on either side counts as absent.
pub fn effective_default(defaults: &Map<String, Value>, field: &FieldSpec) -> Option<Value> {
    defaults
        .get(&field.name)
        .filter(|value| !value.is_null())
        .or(field.default.as_ref())
        .filter(|value| !value.is_null())
        .cloned()
}

/// Placeholder text for a default. Falsy defaults (`""`, `false`, `0`,
/// null) show nothing.
pub fn placeholder_text(default: &Value) -> Option<String> {
    let falsy = match default {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    };
    (!falsy).then(|| display_value(default))
}

/// Maps a submitted line onto an option index. Empty, non-numeric and
/// out-of-range input all fall back to the first option.
pub fn select_index(text: &str, len: usize) -> usize {
    text.trim()
        .parse::<usize>()
        .ok()
        .filter(|index| *index < len)
        .unwrap_or(0)
}

/// Typed confirm answers: only `y`/`yes` in any case mean yes.
pub fn is_yes(text: &str) -> bool {
    let text = text.trim();
    text.eq_ignore_ascii_case("y") || text.eq_ignore_ascii_case("yes")
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(value) => *value,
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        Value::String(text) => is_yes(text) || text.eq_ignore_ascii_case("true") || text == "1",
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Resolves a confirm field's submitted line to a boolean.
pub fn confirm_answer(text: &str, default: Option<&Value>) -> bool {
    if text.trim().is_empty() {
        default.is_some_and(truthy)
    } else {
        is_yes(text)
    }
}

pub fn strip_control_sequences(text: &str) -> String {
    CONTROL_SEQUENCES.replace_all(text, "").into_owned()
}

/// Inline text used to show a default as a placeholder.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
