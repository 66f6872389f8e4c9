//! # Core Bundle — Primitive Types
//!
//! Declares the built-in types and their lossless coercions. Every coercion
//! here runs for all formats of its type and is skipped for strict models,
//! so a strict model accepts only values already in canonical form.
//!
//! | Type | Canonical form | Also accepted unless strict |
//! |------|----------------|-----------------------------|
//! | boolean | `true`/`false` | `"true"`/`"false"`/`"1"`/`"0"`, `1`/`0` |
//! | number | JSON number | numeric strings, booleans |
//! | string | JSON string | numbers, booleans |
//! | array | JSON array | JSON text of an array |
//! | object | JSON object | JSON text of an object |
//! | date | RFC 3339 instant in UTC or `YYYY-MM-DD` | other offsets, epoch milliseconds |
//!
//! Date strings are canonicalized in both modes: rewriting an offset is not
//! lossy.
//!
//! Bounds (`min`/`max`) are enforced here for every type, together with
//! the unexpected-property check of strict objects.

use std::sync::Arc;

use formwork_core::{
    number_value, AssertionFailure, ConfigError, FormatKey, JsonKind, ModelType, Phase,
    PhaseResult,
};
use formwork_model::hooks::{self, Coercion, TypeHandler, Validation};
use formwork_model::{ModelSpec, ValidationResult};
use serde_json::Value;

use crate::options::ValidatorOptions;
use crate::temporal::Temporal;

/// The type handler shared by every bundle that declares `ty`.
pub(crate) fn handler(ty: &ModelType) -> Arc<dyn TypeHandler> {
    match ty {
        ModelType::Boolean => hooks::type_handler(Value::is_boolean),
        ModelType::Number => hooks::type_handler(Value::is_number),
        ModelType::String => hooks::type_handler(Value::is_string),
        ModelType::Array => hooks::type_handler(Value::is_array),
        ModelType::Object => hooks::type_handler(Value::is_object),
        ModelType::Date => hooks::type_handler(|value: &Value| {
            value.as_str().and_then(Temporal::parse).is_some()
        }),
        ModelType::Custom(_) => hooks::type_handler(|_: &Value| true),
    }
}

/// Build the core bundle.
///
/// # Errors
///
/// Never fails in practice; the signature matches the other bundles.
pub fn bundle() -> Result<ValidatorOptions, ConfigError> {
    let bounds: Arc<dyn Validation> = hooks::validation(check_bounds);
    let coercions: [(ModelType, Arc<dyn Coercion>); 6] = [
        (ModelType::Boolean, hooks::coercion(coerce_boolean)),
        (ModelType::Number, hooks::coercion(coerce_number)),
        (ModelType::String, hooks::coercion(coerce_string)),
        (ModelType::Array, hooks::coercion(|r: &mut ValidationResult, s: &ModelSpec| {
            coerce_json_text(r, s, JsonKind::Array)
        })),
        (ModelType::Object, hooks::coercion(|r: &mut ValidationResult, s: &ModelSpec| {
            coerce_json_text(r, s, JsonKind::Object)
        })),
        (ModelType::Date, hooks::coercion(coerce_date)),
    ];

    let mut builder = ValidatorOptions::builder();
    for (ty, coercion) in coercions {
        builder = builder
            .declare_type(ty.clone(), handler(&ty))
            .coerce(ty.clone(), FormatKey::All, Phase::CoerceType, coercion)
            .validate(ty, FormatKey::All, Arc::clone(&bounds));
    }
    builder
        .validate(
            ModelType::Object,
            FormatKey::All,
            hooks::validation(reject_unexpected_properties),
        )
        .build()
}

// ─── Coercions ───────────────────────────────────────────────────────

fn coerce_boolean(result: &mut ValidationResult, spec: &ModelSpec) -> PhaseResult {
    if spec.is_strict() {
        return Ok(());
    }
    let coerced = match result.value() {
        Some(Value::String(s)) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") || t == "1" => Some(true),
            t if t.eq_ignore_ascii_case("false") || t == "0" => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(true),
            Some(x) if x == 0.0 => Some(false),
            _ => None,
        },
        _ => None,
    };
    if let Some(b) = coerced {
        result.set_value(Some(Value::Bool(b)));
    }
    Ok(())
}

fn coerce_number(result: &mut ValidationResult, spec: &ModelSpec) -> PhaseResult {
    if spec.is_strict() {
        return Ok(());
    }
    let coerced = match result.value() {
        Some(Value::String(s)) => parse_number(s.trim()),
        Some(Value::Bool(b)) => Some(Value::from(u8::from(*b))),
        _ => None,
    };
    if let Some(n) = coerced {
        result.set_value(Some(n));
    }
    Ok(())
}

/// Parse numeric text, keeping integers integral.
fn parse_number(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(Value::from(u));
    }
    match text.parse::<f64>() {
        Ok(x) if x.is_finite() => Some(number_value(x)),
        _ => None,
    }
}

fn coerce_string(result: &mut ValidationResult, spec: &ModelSpec) -> PhaseResult {
    if spec.is_strict() {
        return Ok(());
    }
    let coerced = match result.value() {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    };
    if let Some(s) = coerced {
        result.set_value(Some(Value::String(s)));
    }
    Ok(())
}

fn coerce_json_text(result: &mut ValidationResult, spec: &ModelSpec, kind: JsonKind) -> PhaseResult {
    if spec.is_strict() {
        return Ok(());
    }
    let parsed = match result.value() {
        Some(Value::String(s)) => serde_json::from_str::<Value>(s)
            .ok()
            .filter(|v| JsonKind::of(v) == kind),
        _ => None,
    };
    if let Some(v) = parsed {
        result.set_value(Some(v));
    }
    Ok(())
}

fn coerce_date(result: &mut ValidationResult, spec: &ModelSpec) -> PhaseResult {
    let coerced = match result.value() {
        Some(Value::String(s)) => Temporal::parse(s).map(|t| t.to_canonical()),
        Some(Value::Number(n)) if !spec.is_strict() => n
            .as_i64()
            .and_then(Temporal::from_epoch_millis)
            .map(|t| t.to_canonical()),
        _ => None,
    };
    if let Some(s) = coerced {
        result.set_value(Some(Value::String(s)));
    }
    Ok(())
}

// ─── Validations ─────────────────────────────────────────────────────

/// The quantity bounded by `min`/`max` for each type.
fn measure(ty: &ModelType, value: &Value) -> Option<(&'static str, f64)> {
    match ty {
        ModelType::Number => value.as_f64().map(|n| ("value", n)),
        ModelType::String => value.as_str().map(|s| ("length", s.chars().count() as f64)),
        ModelType::Array => value.as_array().map(|a| ("length", a.len() as f64)),
        ModelType::Object => value.as_object().map(|o| ("property count", o.len() as f64)),
        ModelType::Date => value
            .as_str()
            .and_then(Temporal::parse)
            .and_then(|t| t.epoch_millis())
            .map(|ms| ("timestamp", ms as f64)),
        _ => None,
    }
}

fn check_bounds(value: &Value, spec: &ModelSpec) -> PhaseResult {
    if spec.min().is_none() && spec.max().is_none() {
        return Ok(());
    }
    let Some((what, measured)) = measure(spec.ty(), value) else {
        return Ok(());
    };
    if let Some(min) = spec.min() {
        if measured < min {
            return Err(AssertionFailure::below_minimum(what, min, value).into());
        }
    }
    if let Some(max) = spec.max() {
        if measured > max {
            return Err(AssertionFailure::above_maximum(what, max, value).into());
        }
    }
    Ok(())
}

fn reject_unexpected_properties(value: &Value, spec: &ModelSpec) -> PhaseResult {
    if !spec.is_strict() || spec.children().is_none() {
        return Ok(());
    }
    let Some(map) = value.as_object() else {
        return Ok(());
    };
    let declared = spec.field_paths();
    let unexpected: Vec<String> = map
        .keys()
        .filter(|key| !declared.contains(&key.as_str()))
        .cloned()
        .collect();
    if unexpected.is_empty() {
        Ok(())
    } else {
        Err(AssertionFailure::unexpected_properties(unexpected).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;
    use formwork_core::FailureKind;
    use serde_json::json;

    fn check(spec: &ModelSpec, input: Value) -> (bool, Option<Value>, Vec<FailureKind>) {
        let options = bundle().unwrap();
        let result = Validator::new(spec, &options)
            .unwrap()
            .validate(Some(input))
            .unwrap();
        let kinds = result.errors().iter().map(|v| v.kind).collect();
        (result.conforms(), result.value().cloned(), kinds)
    }

    #[test]
    fn test_boolean_coercion() {
        for (input, expected) in [
            (json!("true"), true),
            (json!("FALSE"), false),
            (json!("1"), true),
            (json!(0), false),
            (json!(true), true),
        ] {
            let (conforms, value, _) = check(&ModelSpec::boolean(), input);
            assert!(conforms);
            assert_eq!(value, Some(json!(expected)));
        }
        let (conforms, _, kinds) = check(&ModelSpec::boolean(), json!("yes"));
        assert!(!conforms);
        assert_eq!(kinds, vec![FailureKind::TypeMismatch]);
    }

    #[test]
    fn test_number_coercion_keeps_integers() {
        assert_eq!(check(&ModelSpec::number(), json!("42")).1, Some(json!(42)));
        assert_eq!(check(&ModelSpec::number(), json!(" -7 ")).1, Some(json!(-7)));
        assert_eq!(check(&ModelSpec::number(), json!("2.5")).1, Some(json!(2.5)));
        assert_eq!(check(&ModelSpec::number(), json!(true)).1, Some(json!(1)));
        assert_eq!(
            check(&ModelSpec::number(), json!("9223372036854775808.0")).1,
            Some(json!(9_223_372_036_854_775_808.0_f64))
        );
        assert!(!check(&ModelSpec::number(), json!("NaN")).0);
        assert!(!check(&ModelSpec::number(), json!("")).0);
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(check(&ModelSpec::string(), json!(42)).1, Some(json!("42")));
        assert_eq!(check(&ModelSpec::string(), json!(false)).1, Some(json!("false")));
        assert!(!check(&ModelSpec::string(), json!([1])).0);
    }

    #[test]
    fn test_strict_rejects_non_canonical() {
        let (conforms, _, kinds) = check(&ModelSpec::number().strict(), json!("42"));
        assert!(!conforms);
        assert_eq!(kinds, vec![FailureKind::TypeMismatch]);
        assert!(!check(&ModelSpec::boolean().strict(), json!("true")).0);
        assert!(!check(&ModelSpec::string().strict(), json!(1)).0);
        assert!(check(&ModelSpec::number().strict(), json!(42)).0);
    }

    #[test]
    fn test_json_text_containers() {
        let spec = ModelSpec::array_of(ModelSpec::number());
        assert_eq!(check(&spec, json!("[1, \"2\"]")).1, Some(json!([1, 2])));
        assert!(!check(&spec, json!("{\"a\": 1}")).0);
        let object = ModelSpec::object([("a", ModelSpec::number())]);
        assert_eq!(check(&object, json!("{\"a\": \"1\"}")).1, Some(json!({"a": 1})));
    }

    #[test]
    fn test_date_coercion() {
        let date = ModelSpec::date();
        assert_eq!(
            check(&date, json!("2026-01-15T14:00:00+02:00")).1,
            Some(json!("2026-01-15T12:00:00Z"))
        );
        assert_eq!(check(&date, json!("2026-01-15")).1, Some(json!("2026-01-15")));
        assert_eq!(check(&date, json!(0)).1, Some(json!("1970-01-01T00:00:00Z")));
        assert!(!check(&date.clone().strict(), json!(0)).0);
        assert!(!check(&date, json!("soon")).0);
    }

    #[test]
    fn test_bounds_per_type() {
        let (conforms, _, kinds) = check(&ModelSpec::number().with_min(10.0), json!(5));
        assert!(!conforms);
        assert_eq!(kinds, vec![FailureKind::BelowMinimum]);
        assert!(check(&ModelSpec::number().with_min(10.0).with_max(20.0), json!(15)).0);

        let (_, _, kinds) = check(&ModelSpec::string().with_min(3.0).with_max(4.0), json!("abcde"));
        assert_eq!(kinds, vec![FailureKind::AboveMaximum]);

        let array = ModelSpec::new(ModelType::Array).with_max(1.0);
        assert!(!check(&array, json!([1, 2])).0);

        let date = ModelSpec::date().with_min(86_400_000.0);
        assert!(!check(&date, json!("1970-01-01")).0);
        assert!(check(&date, json!("1970-01-02")).0);
    }

    #[test]
    fn test_strict_object_rejects_unexpected_properties() {
        let spec = ModelSpec::object([("a", ModelSpec::number()), ("b", ModelSpec::number())]);
        let input = json!({"a": 1, "b": 2, "extra": 3});
        let (conforms, value, _) = check(&spec, input.clone());
        assert!(conforms);
        assert_eq!(value, Some(input.clone()));

        let (conforms, _, kinds) = check(&spec.strict(), input);
        assert!(!conforms);
        assert_eq!(kinds, vec![FailureKind::UnexpectedProperties]);
    }

    #[test]
    fn test_open_object_without_children_accepts_anything() {
        assert!(check(&ModelSpec::new(ModelType::Object).strict(), json!({"x": 1})).0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::validator::Validator;
    use proptest::prelude::*;

    fn run(spec: &ModelSpec, input: Value) -> (bool, Option<Value>, usize) {
        let options = bundle().unwrap();
        let result = Validator::new(spec, &options)
            .unwrap()
            .validate(Some(input))
            .unwrap();
        (result.conforms(), result.value().cloned(), result.errors().len())
    }

    fn finite_float() -> impl Strategy<Value = f64> {
        (-1.0e12f64..1.0e12).prop_filter("finite", |x| x.is_finite())
    }

    proptest! {
        /// Integers survive a trip through their decimal text.
        #[test]
        fn integer_text_round_trips(x in any::<i64>()) {
            let (conforms, value, _) = run(&ModelSpec::number(), Value::String(x.to_string()));
            prop_assert!(conforms);
            prop_assert_eq!(value, Some(Value::from(x)));
        }

        /// Floats survive a trip through their shortest text.
        #[test]
        fn float_text_round_trips(x in finite_float()) {
            let (conforms, value, _) = run(&ModelSpec::number(), Value::String(x.to_string()));
            prop_assert!(conforms);
            prop_assert_eq!(value, Some(number_value(x)));
        }

        /// Booleans survive a trip through their text.
        #[test]
        fn boolean_text_round_trips(b in any::<bool>()) {
            let (conforms, value, _) = run(&ModelSpec::boolean(), Value::String(b.to_string()));
            prop_assert!(conforms);
            prop_assert_eq!(value, Some(Value::Bool(b)));
        }

        /// Strict models reject text instead of passing it through.
        #[test]
        fn strict_rejects_text(x in any::<i64>(), b in any::<bool>()) {
            let (conforms, _, errors) =
                run(&ModelSpec::number().strict(), Value::String(x.to_string()));
            prop_assert!(!conforms);
            prop_assert_eq!(errors, 1);
            let (conforms, _, _) = run(&ModelSpec::boolean().strict(), Value::String(b.to_string()));
            prop_assert!(!conforms);
            let (conforms, _, _) = run(&ModelSpec::string().strict(), Value::from(x));
            prop_assert!(!conforms);
        }

        /// Validating a coerced value again changes nothing.
        #[test]
        fn coercion_is_idempotent(x in finite_float(), text in "[a-z0-9 ]{0,12}") {
            let spec = ModelSpec::object([
                ("n", ModelSpec::number()),
                ("s", ModelSpec::string()),
                ("b", ModelSpec::boolean()),
                ("d", ModelSpec::date()),
            ]);
            let input = serde_json::json!({
                "n": x.to_string(),
                "s": x,
                "b": "1",
                "d": "2026-01-15T14:00:00+02:00",
                "t": text,
            });
            let first = run(&spec, input);
            prop_assert!(first.0);
            let second = run(&spec, first.1.clone().unwrap());
            prop_assert_eq!(first, second);
        }
    }
}
