//! # Hook Traits
//!
//! The extension seams of the validator. Registries map types and formats
//! to these trait objects, and models carry them as instance overrides.
//!
//! All hooks are `Send + Sync` so that a registry or a model can be shared
//! by concurrent validations.

use std::fmt;
use std::sync::Arc;

use formwork_core::PhaseResult;
use serde_json::Value;

use crate::result::ValidationResult;
use crate::spec::ModelSpec;

/// A pipeline hook that may rewrite the candidate value.
///
/// A coercion may replace the value, finish the result early, or reject the
/// value by returning an assertion failure.
pub trait Coercion: Send + Sync {
    fn coerce(&self, result: &mut ValidationResult, spec: &ModelSpec) -> PhaseResult;
}

impl<F> Coercion for F
where
    F: Fn(&mut ValidationResult, &ModelSpec) -> PhaseResult + Send + Sync,
{
    fn coerce(&self, result: &mut ValidationResult, spec: &ModelSpec) -> PhaseResult {
        self(result, spec)
    }
}

impl fmt::Debug for dyn Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<coercion>")
    }
}

/// An assertion over a coerced value. Returns `Ok(())` to accept it.
pub trait Validation: Send + Sync {
    fn validate(&self, value: &Value, spec: &ModelSpec) -> PhaseResult;
}

impl<F> Validation for F
where
    F: Fn(&Value, &ModelSpec) -> PhaseResult + Send + Sync,
{
    fn validate(&self, value: &Value, spec: &ModelSpec) -> PhaseResult {
        self(value, spec)
    }
}

impl fmt::Debug for dyn Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<validation>")
    }
}

/// Decides whether a runtime value is in a type's canonical representation.
///
/// Consulted at the end of the coerce-type phase.
pub trait TypeHandler: Send + Sync {
    fn accepts(&self, value: &Value) -> bool;
}

impl<F> TypeHandler for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn accepts(&self, value: &Value) -> bool {
        self(value)
    }
}

impl fmt::Debug for dyn TypeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<type handler>")
    }
}

/// Wrap a closure as a shared coercion hook.
pub fn coercion<F>(f: F) -> Arc<dyn Coercion>
where
    F: Fn(&mut ValidationResult, &ModelSpec) -> PhaseResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a shared validation hook.
pub fn validation<F>(f: F) -> Arc<dyn Validation>
where
    F: Fn(&Value, &ModelSpec) -> PhaseResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a predicate as a shared type handler.
pub fn type_handler<F>(f: F) -> Arc<dyn TypeHandler>
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}
