//! # Number Formats
//!
//! `integer`, `int32` and `int64` require an integral value within range;
//! `float` accepts any number and only exists so models can say so.

use std::sync::Arc;

use formwork_core::{AssertionFailure, ConfigError, FormatKey, ModelType};
use formwork_model::hooks::{self, Validation};
use serde_json::{Number, Value};

use super::primitives;
use crate::options::ValidatorOptions;

pub const INTEGER: &str = "integer";
pub const INT32: &str = "int32";
pub const INT64: &str = "int64";
pub const FLOAT: &str = "float";

/// Whether `n` denotes an integer.
fn is_integral(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|x| x.fract() == 0.0)
}

/// The exact integer `n` denotes, widened so that every `i64` and `u64` fits.
fn exact_integer(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(i128::from(u));
    }
    n.as_f64()
        .filter(|x| x.fract() == 0.0 && x.abs() < 1.0e38)
        .map(|x| x as i128)
}

/// An integral number check, bounded to `[min, max]` when `bounds` is set.
fn integral_within(format: &'static str, bounds: Option<(i64, i64)>) -> Arc<dyn Validation> {
    hooks::validation(move |value, _spec| {
        let accepted = match (value, bounds) {
            (Value::Number(n), None) => is_integral(n),
            (Value::Number(n), Some((min, max))) => exact_integer(n)
                .is_some_and(|i| i >= i128::from(min) && i <= i128::from(max)),
            _ => false,
        };
        if accepted {
            Ok(())
        } else {
            Err(AssertionFailure::invalid_format(format, value).into())
        }
    })
}

/// Build the number-formats bundle.
///
/// # Errors
///
/// Never fails in practice; the signature matches the other bundles.
pub fn bundle() -> Result<ValidatorOptions, ConfigError> {
    let ty = ModelType::Number;
    ValidatorOptions::builder()
        .declare_type(ty.clone(), primitives::handler(&ty))
        .declare_formats(ty.clone(), [INTEGER, INT32, INT64, FLOAT])
        .validate(
            ty.clone(),
            FormatKey::named(INTEGER),
            integral_within(INTEGER, None),
        )
        .validate(
            ty.clone(),
            FormatKey::named(INT32),
            integral_within(INT32, Some((i64::from(i32::MIN), i64::from(i32::MAX)))),
        )
        .validate(
            ty,
            FormatKey::named(INT64),
            integral_within(INT64, Some((i64::MIN, i64::MAX))),
        )
        .build()
}
