//! # Date Formats
//!
//! - `date-time`: an instant. A bare `YYYY-MM-DD` is widened to midnight UTC
//!   unless the model is strict.
//! - `date`: a calendar day. An instant is narrowed to its UTC day unless
//!   the model is strict.
//!
//! These coercions run after the core date coercion, so epoch milliseconds
//! and foreign offsets are already canonical instants by the time they run.

use formwork_core::{AssertionFailure, ConfigError, FormatKey, ModelType, Phase};
use formwork_model::hooks;
use formwork_model::{ModelSpec, ValidationResult};
use serde_json::Value;

use super::primitives;
use super::strings::format_check;
use crate::options::ValidatorOptions;
use crate::temporal::Temporal;

pub const DATE_TIME: &str = "date-time";
pub const DATE: &str = "date";

/// Rewrite the candidate date with `convert` unless the model is strict.
fn reshape<F>(result: &mut ValidationResult, spec: &ModelSpec, convert: F)
where
    F: Fn(&Temporal) -> Option<String>,
{
    if spec.is_strict() {
        return;
    }
    let reshaped = result
        .value()
        .and_then(Value::as_str)
        .and_then(Temporal::parse)
        .and_then(|t| convert(&t));
    if let Some(text) = reshaped {
        result.set_value(Some(Value::String(text)));
    }
}

/// Build the date-formats bundle.
///
/// # Errors
///
/// Never fails in practice; the signature matches the other bundles.
pub fn bundle() -> Result<ValidatorOptions, ConfigError> {
    let ty = ModelType::Date;
    ValidatorOptions::builder()
        .declare_type(ty.clone(), primitives::handler(&ty))
        .declare_formats(ty.clone(), [DATE_TIME, DATE])
        .coerce(
            ty.clone(),
            FormatKey::named(DATE_TIME),
            Phase::CoerceType,
            hooks::coercion(|result, spec| {
                reshape(result, spec, Temporal::to_instant_string);
                Ok(())
            }),
        )
        .validate(
            ty.clone(),
            FormatKey::named(DATE_TIME),
            format_check(DATE_TIME, |s| matches!(Temporal::parse(s), Some(Temporal::Instant(_)))),
        )
        .coerce(
            ty.clone(),
            FormatKey::named(DATE),
            Phase::CoerceType,
            hooks::coercion(|result, spec| {
                reshape(result, spec, |t| Some(t.to_day_string()));
                Ok(())
            }),
        )
        .validate(
            ty,
            FormatKey::named(DATE),
            hooks::validation(|value, _spec| match value.as_str().and_then(Temporal::parse) {
                Some(Temporal::Day(_)) => Ok(()),
                _ => Err(AssertionFailure::invalid_format(DATE, value).into()),
            }),
        )
        .build()
}
