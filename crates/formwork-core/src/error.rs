//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout Formwork. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Taxonomy
//!
//! - **Configuration errors** (`ConfigError`) describe a malformed model or
//!   registry. They are programmer errors, raised at construction time and
//!   never reported through a validation result.
//! - **Assertion failures** (`AssertionFailure`) are the typed outcome of a
//!   coercion or validation hook rejecting a value. The validator converts
//!   each one into a violation on the node being validated.
//! - **Faults** (`PhaseError::Fault`) are anything a hook reports that is not
//!   an assertion. They escape `validate()` unchanged as `FormworkError`.

use serde_json::Value;
use thiserror::Error;

/// Top-level error type for Formwork.
#[derive(Error, Debug)]
pub enum FormworkError {
    /// The model or the registry is malformed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A value failed validation and the caller asked to fail loudly.
    #[error("validation failed at {path}: {failure}")]
    Validation {
        /// Dotted path of the first failing node.
        path: String,
        /// The first recorded failure.
        failure: AssertionFailure,
    },

    /// A hook reported an error that is not a validation assertion.
    #[error("unexpected fault at {path}: {reason}")]
    Fault {
        /// Dotted path of the node whose hook faulted.
        path: String,
        /// The fault description.
        reason: String,
    },

    /// Child results could not be folded into their parent.
    #[error("coalesce error: {0}")]
    Coalesce(#[from] CoalesceError),

    /// Model nesting exceeded the configured recursion limit.
    #[error("model nesting exceeded depth {limit} at {path}")]
    DepthExceeded {
        /// Dotted path where the limit was hit.
        path: String,
        /// The configured limit.
        limit: usize,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A malformed model specification or validator registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A type is referenced but was never declared in the registry.
    #[error("type '{0}' is not declared")]
    UndeclaredType(String),

    /// A format is referenced but was never declared for its type.
    #[error("format '{format}' is not declared for type '{ty}'")]
    UndeclaredFormat {
        /// The owning type.
        ty: String,
        /// The undeclared format name.
        format: String,
    },

    /// A format name is empty.
    #[error("empty format name declared for type '{0}'")]
    EmptyFormatName(String),

    /// A coercion hook was attached to a phase that does not accept hooks.
    #[error("phase '{0}' does not accept coercion hooks")]
    InvalidHookPhase(String),

    /// `children` does not match the model type.
    #[error("children of kind '{children}' are not valid for type '{ty}'")]
    ChildrenShape {
        /// The model type.
        ty: String,
        /// The kind of children supplied ("element" or "fields").
        children: String,
    },

    /// Two object children share the same path.
    #[error("duplicate child path '{0}'")]
    DuplicateField(String),

    /// An object child has an empty path.
    #[error("object child path must not be empty")]
    EmptyFieldPath,

    /// The enum is empty or its literal options are not homogeneous.
    #[error("invalid enum: {0}")]
    EnumShape(String),

    /// A pattern validation was attached to a non-string model.
    #[error("pattern validations require a string model, found '{0}'")]
    PatternOnNonString(String),

    /// `min` is greater than `max`.
    #[error("min {min} is greater than max {max}")]
    InvalidBounds {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// A regular expression failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A model descriptor could not be turned into a model.
    #[error("invalid model descriptor: {0}")]
    InvalidDescriptor(String),
}

/// The reason an assertion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A required value is absent.
    MissingValue,
    /// An explicit null on a non-nullable model.
    NullNotAllowed,
    /// The runtime type does not match the model type.
    TypeMismatch,
    /// The value is below the model's `min`.
    BelowMinimum,
    /// The value is above the model's `max`.
    AboveMaximum,
    /// A string does not match a pattern validation.
    PatternMismatch,
    /// A value is not one of the literal enum options.
    NotInEnum,
    /// No enum sub-model accepted the value.
    NoEnumMatch,
    /// A strict object carries undeclared keys.
    UnexpectedProperties,
    /// The value is of the right type but not of the declared format.
    InvalidFormat,
    /// Raised by a user-supplied hook.
    Custom,
}

/// A typed validation assertion failure.
///
/// Hooks return this (wrapped in `PhaseError`) to reject a value. The
/// validator records it as one violation at the current node's path.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct AssertionFailure {
    /// Category of the failure.
    pub kind: FailureKind,
    /// Human-readable description.
    pub message: String,
    /// The offending value, when useful.
    pub actual: Option<Value>,
    /// What was expected, when useful.
    pub expected: Option<Value>,
}

impl AssertionFailure {
    /// Create a failure with no actual/expected context.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            actual: None,
            expected: None,
        }
    }

    /// A failure raised by a user hook.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Custom, message)
    }

    /// Attach the offending value.
    pub fn with_actual(mut self, actual: Value) -> Self {
        self.actual = Some(actual);
        self
    }

    /// Attach the expected value or description.
    pub fn with_expected(mut self, expected: impl Into<Value>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn missing_value() -> Self {
        Self::new(FailureKind::MissingValue, "missing value: a value is required")
    }

    pub fn null_not_allowed() -> Self {
        Self::new(FailureKind::NullNotAllowed, "null not allowed").with_actual(Value::Null)
    }

    /// The runtime value is not of the expected model type.
    pub fn type_mismatch(expected: &str, actual: &Value) -> Self {
        Self::new(
            FailureKind::TypeMismatch,
            format!(
                "expected a value of type {expected}, got {}",
                crate::value::JsonKind::of(actual)
            ),
        )
        .with_actual(actual.clone())
        .with_expected(expected)
    }

    pub fn below_minimum(what: &str, min: f64, actual: &Value) -> Self {
        Self::new(
            FailureKind::BelowMinimum,
            format!("{what} must be at least {min}"),
        )
        .with_actual(actual.clone())
        .with_expected(crate::value::number_value(min))
    }

    pub fn above_maximum(what: &str, max: f64, actual: &Value) -> Self {
        Self::new(
            FailureKind::AboveMaximum,
            format!("{what} must be at most {max}"),
        )
        .with_actual(actual.clone())
        .with_expected(crate::value::number_value(max))
    }

    pub fn pattern_mismatch(pattern: &str, actual: &Value) -> Self {
        Self::new(
            FailureKind::PatternMismatch,
            format!("value does not match pattern {pattern:?}"),
        )
        .with_actual(actual.clone())
        .with_expected(pattern)
    }

    pub fn not_in_enum(options: &[Value], actual: &Value) -> Self {
        Self::new(FailureKind::NotInEnum, "value is not one of the enum options")
            .with_actual(actual.clone())
            .with_expected(Value::Array(options.to_vec()))
    }

    /// A strict object carries keys that are not declared as children.
    pub fn unexpected_properties(keys: Vec<String>) -> Self {
        let listed = keys.join(", ");
        Self::new(
            FailureKind::UnexpectedProperties,
            format!("unexpected properties: {listed}"),
        )
        .with_actual(Value::Array(keys.into_iter().map(Value::String).collect()))
    }

    pub fn invalid_format(format: &str, actual: &Value) -> Self {
        Self::new(
            FailureKind::InvalidFormat,
            format!("value is not a valid {format}"),
        )
        .with_actual(actual.clone())
        .with_expected(format)
    }
}

/// Error returned by a pipeline hook.
#[derive(Error, Debug)]
pub enum PhaseError {
    /// The value was rejected; recorded as a violation.
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    /// Anything else; escapes validation unchanged.
    #[error("fault: {0}")]
    Fault(String),
}

/// Result type for pipeline hooks.
pub type PhaseResult = Result<(), PhaseError>;

/// Precondition violations of the coalesce algebra.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoalesceError {
    /// The base result was already finished.
    #[error("cannot coalesce into the finished result at {path}")]
    BaseFinished {
        /// Dotted path of the base.
        path: String,
    },

    /// A child path does not extend the base path the way the base value requires.
    #[error("child at {child} does not extend {base} by {expected}")]
    PathShape {
        /// Dotted path of the base.
        base: String,
        /// Dotted path of the offending child.
        child: String,
        /// The required extension.
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assertion_failure_converts_into_phase_error() {
        fn hook() -> PhaseResult {
            Err(AssertionFailure::custom("nope"))?;
            Ok(())
        }
        match hook() {
            Err(PhaseError::Assertion(f)) => {
                assert_eq!(f.kind, FailureKind::Custom);
                assert_eq!(f.to_string(), "nope");
            }
            other => panic!("expected assertion, got {other:?}"),
        }
    }

    #[test]
    fn test_type_mismatch_carries_context() {
        let f = AssertionFailure::type_mismatch("number", &json!("abc"));
        assert_eq!(f.kind, FailureKind::TypeMismatch);
        assert_eq!(f.actual, Some(json!("abc")));
        assert_eq!(f.expected, Some(json!("number")));
        assert!(f.message.contains("string"));
    }

    #[test]
    fn test_bounds_report_integral_limits_as_integers() {
        let f = AssertionFailure::below_minimum("value", 10.0, &json!(5));
        assert_eq!(f.expected, Some(json!(10)));
        assert!(f.message.contains("at least 10"));
    }

    #[test]
    fn test_unexpected_properties_lists_keys() {
        let f = AssertionFailure::unexpected_properties(vec!["extra".into(), "more".into()]);
        assert_eq!(f.message, "unexpected properties: extra, more");
        assert_eq!(f.actual, Some(json!(["extra", "more"])));
    }

    #[test]
    fn test_config_error_display() {
        let e = ConfigError::UndeclaredFormat {
            ty: "string".into(),
            format: "zip".into(),
        };
        assert_eq!(e.to_string(), "format 'zip' is not declared for type 'string'");
        let top: FormworkError = e.into();
        assert!(top.to_string().starts_with("configuration error"));
    }
}
