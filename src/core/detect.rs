//! Structural change detection between the working copy and the baseline.
//!
//! Both sides are reduced to a canonical [`serde_json::Value`] before
//! comparison. Canonical form fills every `null` with an empty string, so a
//! snapshot that omitted an optional field compares equal to a working copy
//! that carries it explicitly as `""`. Object comparison is keyed, never
//! positional, so field order can never produce a phantom diff. Array order
//! is significant: collections are user-ordered lists and a reorder is a
//! real change that must be persisted.

use serde::Serialize;
use serde_json::Value;

use crate::core::Result;

/// Serializes a state into its canonical comparison form.
pub fn canonical_value<T: Serialize>(state: &T) -> Result<Value> {
    Ok(fill_defaults(serde_json::to_value(state)?))
}

fn fill_defaults(value: Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Array(items) => Value::Array(items.into_iter().map(fill_defaults).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, field)| (key, fill_defaults(field)))
                .collect(),
        ),
        other => other,
    }
}

/// Whether two states are structurally equal in canonical form.
pub fn states_equal<T: Serialize>(a: &T, b: &T) -> Result<bool> {
    Ok(canonical_value(a)? == canonical_value(b)?)
}

/// The dirty check: does `current` differ from the confirmed `baseline`?
///
/// With no baseline at all there is nothing to diff against; the state is
/// dirty exactly when it carries any content.
pub fn has_changes<T: Serialize>(current: &T, baseline: Option<&T>) -> Result<bool> {
    match baseline {
        Some(baseline) => Ok(canonical_value(current)? != canonical_value(baseline)?),
        None => Ok(!is_empty_value(&canonical_value(current)?)),
    }
}

/// True when a canonical value carries no content: an empty string, an
/// empty array, or an object whose fields are all empty themselves.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.values().all(is_empty_value),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
