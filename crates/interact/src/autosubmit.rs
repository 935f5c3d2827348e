use interact_spec::{AutosubmitResult, FieldSpec};
use serde_json::{Map, Value};

use crate::resolve::effective_default;

/// Resolves every field to its effective default without reading input.
///
/// Group children are not loaded here: a group field resolves to its own
/// default like any other field.
pub fn autosubmit(fields: &[FieldSpec], defaults: &Map<String, Value>) -> AutosubmitResult {
    let mut result = AutosubmitResult::default();
    for field in fields {
        let value = effective_default(defaults, field).unwrap_or(Value::Null);
        result.fields.insert(field.name.clone(), value);
        if let Some(shave) = field.shave_indices() {
            result.shave.insert(field.name.clone(), shave);
        }
    }
    result
}
