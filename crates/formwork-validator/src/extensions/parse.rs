//! # Parse Coercions
//!
//! Coercions for the `Parse` phase, attached to individual models with
//! [`ModelSpec::with_coercion`](formwork_model::ModelSpec::with_coercion).
//! They turn wire shapes that carry structure in text, such as a
//! comma-separated query parameter, into the JSON shape the model expects.

use std::sync::Arc;

use formwork_model::hooks::{self, Coercion};
use serde_json::Value;

/// Split a string on `separator` into an array of trimmed, non-empty parts.
///
/// Non-string values, and strings holding JSON array text such as
/// `"[1, 2]"`, are left for the model's own coercions.
pub fn split_delimited(separator: char) -> Arc<dyn Coercion> {
    hooks::coercion(move |result, _spec| {
        let parts = result
            .value()
            .and_then(Value::as_str)
            .filter(|text| !text.trim_start().starts_with('['))
            .map(|text| {
                text.split(separator)
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect::<Vec<_>>()
            });
        if let Some(parts) = parts {
            result.set_value(Some(Value::Array(parts)));
        }
        Ok(())
    })
}
