//! # Validator — the Phase Pipeline
//!
//! A `Validator` binds one [`ModelSpec`] node to a [`ValidatorOptions`]
//! registry and drives a [`ValidationResult`] through the fixed phases:
//!
//! ```text
//! Parse → ValidateDefinition → CoerceType → ValidateChildren → ValidateEnum → ValidateValue
//! ```
//!
//! Every phase except `ValidateDefinition` first runs its coercion hook
//! (the model's own override, else the registry's). The phase's built-in
//! behavior then runs unless the hook finished the result. The driver stops
//! at the first finished phase and always finishes the result on exit.
//!
//! ## Failures
//!
//! An assertion failure raised by a phase becomes one violation at the
//! node's path and finishes the node. Siblings and parents keep going, so a
//! single validation reports every failing field. Faults, coalesce
//! precondition errors and depth overruns abort the whole validation as a
//! [`FormworkError`].

use std::collections::BTreeSet;

use formwork_core::{
    loose_eq, AssertionFailure, CoalesceError, ConfigError, FailureKind, FormworkError, ModelType,
    Phase, PhaseError,
};
use formwork_model::{
    coalesce, Children, EnumOptions, ModelSpec, ValidationResult, ValidationRule, Violation,
};
use serde_json::Value;

use crate::options::ValidatorOptions;

/// Default bound on model nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Why a phase stopped early.
enum Interrupt {
    /// A hook or built-in behavior reported a failure.
    Phase(PhaseError),
    /// A nested validation aborted.
    Abort(FormworkError),
}

impl From<PhaseError> for Interrupt {
    fn from(e: PhaseError) -> Self {
        Interrupt::Phase(e)
    }
}

impl From<AssertionFailure> for Interrupt {
    fn from(e: AssertionFailure) -> Self {
        Interrupt::Phase(PhaseError::Assertion(e))
    }
}

impl From<FormworkError> for Interrupt {
    fn from(e: FormworkError) -> Self {
        Interrupt::Abort(e)
    }
}

impl From<CoalesceError> for Interrupt {
    fn from(e: CoalesceError) -> Self {
        Interrupt::Abort(FormworkError::Coalesce(e))
    }
}

/// Validates values against one model node.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    spec: &'a ModelSpec,
    options: &'a ValidatorOptions,
    max_depth: usize,
    depth: usize,
}

impl<'a> Validator<'a> {
    /// Bind `spec` to `options`, checking the whole model tree.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the model is malformed or references a
    /// type or format the registry does not declare.
    pub fn new(spec: &'a ModelSpec, options: &'a ValidatorOptions) -> Result<Self, ConfigError> {
        spec.check_shape()?;
        check_declared(spec, options)?;
        Ok(Self {
            spec,
            options,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        })
    }

    /// Bound model nesting at `max_depth` levels below this node.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn spec(&self) -> &'a ModelSpec {
        self.spec
    }

    /// Validate a top-level input. `None` is an absent value.
    ///
    /// # Errors
    ///
    /// Validation failures are reported in the returned result. `Err` means
    /// a hook faulted, coalescing broke its preconditions, or the nesting
    /// limit was exceeded.
    pub fn validate(&self, input: Option<Value>) -> Result<ValidationResult, FormworkError> {
        self.run(ValidationResult::new_root(input))
    }

    /// Drive `result` through every phase.
    ///
    /// # Errors
    ///
    /// See [`Validator::validate`].
    pub fn run(&self, mut result: ValidationResult) -> Result<ValidationResult, FormworkError> {
        if self.depth > self.max_depth {
            return Err(FormworkError::DepthExceeded {
                path: result.path().to_string(),
                limit: self.max_depth,
            });
        }

        let span = tracing::debug_span!("validate", path = %result.path(), ty = %self.spec.ty());
        let _guard = span.enter();

        for phase in Phase::ORDER {
            if result.is_finished() {
                break;
            }
            tracing::trace!(%phase, "running phase");
            match self.run_phase(phase, &mut result) {
                Ok(()) => {}
                Err(Interrupt::Phase(PhaseError::Assertion(failure))) => {
                    tracing::debug!(%phase, failure = %failure, "value rejected");
                    result.reject(failure);
                }
                Err(Interrupt::Phase(PhaseError::Fault(reason))) => {
                    return Err(FormworkError::Fault {
                        path: result.path().to_string(),
                        reason,
                    });
                }
                Err(Interrupt::Abort(error)) => return Err(error),
            }
        }

        result.set_is_finished(true);
        Ok(result)
    }

    fn run_phase(&self, phase: Phase, result: &mut ValidationResult) -> Result<(), Interrupt> {
        if phase.is_hookable() {
            let hook = self.spec.coercion(phase).cloned().or_else(|| {
                self.options
                    .resolve_coercion(self.spec.ty(), self.spec.format(), phase)
            });
            if let Some(hook) = hook {
                hook.coerce(result, self.spec)?;
                if result.is_finished() {
                    return Ok(());
                }
            }
        }

        match phase {
            Phase::Parse => Ok(()),
            Phase::ValidateDefinition => self.validate_definition(result),
            Phase::CoerceType => self.assert_type(result),
            Phase::ValidateChildren => self.validate_children(result),
            Phase::ValidateEnum => self.validate_enum(result),
            Phase::ValidateValue => self.validate_value(result),
        }
    }

    fn descend(&self, spec: &'a ModelSpec) -> Validator<'a> {
        Validator {
            spec,
            options: self.options,
            max_depth: self.max_depth,
            depth: self.depth + 1,
        }
    }

    // ─── Built-in phase behavior ─────────────────────────────────────

    fn validate_definition(&self, result: &mut ValidationResult) -> Result<(), Interrupt> {
        if result.value().is_none() {
            if self.spec.is_required() {
                return Err(AssertionFailure::missing_value().into());
            }
            if let Some(default) = self.spec.default_value() {
                result.set_value(Some(default.clone()));
            }
        }
        match result.value() {
            Some(Value::Null) if !self.spec.is_nullable() => {
                Err(AssertionFailure::null_not_allowed().into())
            }
            None | Some(Value::Null) => {
                result.set_is_finished(true);
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }

    fn assert_type(&self, result: &mut ValidationResult) -> Result<(), Interrupt> {
        let ty = self.spec.ty();
        match result.value() {
            Some(value) if self.options.accepts(ty, value) => Ok(()),
            Some(value) => Err(AssertionFailure::type_mismatch(ty.name(), value).into()),
            None => Err(AssertionFailure::missing_value().into()),
        }
    }

    fn validate_children(&self, result: &mut ValidationResult) -> Result<(), Interrupt> {
        match self.spec.children() {
            Some(Children::Element(element)) => {
                let items = match result.value() {
                    Some(Value::Array(items)) => items.clone(),
                    _ => return Ok(()),
                };
                let element = self.descend(element);
                let children = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| element.run(result.child(i, Some(item))))
                    .collect::<Result<Vec<_>, _>>()?;
                fold_children(result, children)?;
                Ok(())
            }
            Some(Children::Fields(fields)) => {
                let input = match result.value() {
                    Some(Value::Object(map)) => map.clone(),
                    _ => return Ok(()),
                };
                let mut children = Vec::with_capacity(fields.len());
                for field in fields {
                    let value = input.get(&field.path).cloned();
                    let child = result.child(field.path.as_str(), value);
                    children.push(self.descend(&field.model).run(child)?);
                }
                fold_children(result, children)?;

                let declared: BTreeSet<&str> = fields.iter().map(|f| f.path.as_str()).collect();
                if let Some(Value::Object(mut merged)) = result.take_value() {
                    for (key, value) in input {
                        if !declared.contains(key.as_str()) {
                            merged.entry(key).or_insert(value);
                        }
                    }
                    result.set_value(Some(Value::Object(merged)));
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn validate_enum(&self, result: &mut ValidationResult) -> Result<(), Interrupt> {
        match self.spec.enumeration() {
            None => Ok(()),
            Some(EnumOptions::Literals(options)) => match result.value() {
                Some(value) if options.iter().any(|option| loose_eq(option, value)) => Ok(()),
                Some(value) => Err(AssertionFailure::not_in_enum(options, value).into()),
                None => Err(AssertionFailure::missing_value().into()),
            },
            Some(EnumOptions::Models(options)) => {
                let current = result.value().cloned();
                let mut failures = Vec::new();
                for (i, option) in options.iter().enumerate() {
                    let attempt = self.descend(option).run(result.sibling(current.clone()))?;
                    if attempt.conforms() {
                        tracing::trace!(option = i, "enum option matched");
                        result.set_value(attempt.into_outcome().value);
                        return Ok(());
                    }
                    failures.extend(enum_option_failures(i, result, attempt));
                }
                result.push_violations(failures);
                Ok(())
            }
        }
    }

    fn validate_value(&self, result: &mut ValidationResult) -> Result<(), Interrupt> {
        let Some(value) = result.value() else {
            return Ok(());
        };
        for hook in self
            .options
            .resolve_validations(self.spec.ty(), self.spec.format())
        {
            hook.validate(value, self.spec)?;
        }
        for rule in self.spec.validations() {
            match rule {
                ValidationRule::Check(hook) => hook.validate(value, self.spec)?,
                ValidationRule::Pattern(pattern) => {
                    let text = value
                        .as_str()
                        .ok_or_else(|| AssertionFailure::type_mismatch("string", value))?;
                    if !pattern.is_match(text) {
                        return Err(AssertionFailure::pattern_mismatch(pattern.as_str(), value).into());
                    }
                }
            }
        }
        Ok(())
    }
}

/// Replace `result` with the coalesced result of its children.
fn fold_children(
    result: &mut ValidationResult,
    children: Vec<ValidationResult>,
) -> Result<(), CoalesceError> {
    let placeholder = result.sibling(None);
    let base = std::mem::replace(result, placeholder);
    *result = coalesce(base, children)?;
    Ok(())
}

/// The violations reported for enum option `index` that rejected the value.
fn enum_option_failures(
    index: usize,
    result: &ValidationResult,
    attempt: ValidationResult,
) -> Vec<Violation> {
    let prefix = format!("no enum option matched (option {index})");
    let errors = attempt.into_outcome().errors;
    if errors.is_empty() {
        let failure = AssertionFailure::new(FailureKind::NoEnumMatch, prefix);
        return vec![Violation::from_failure(failure, result.path().clone())];
    }
    errors
        .into_iter()
        .map(|mut violation| {
            violation.message = format!("{prefix}: {}", violation.message);
            violation.kind = FailureKind::NoEnumMatch;
            violation
        })
        .collect()
}

/// Check that every type and format in the tree is declared in `options`.
fn check_declared(spec: &ModelSpec, options: &ValidatorOptions) -> Result<(), ConfigError> {
    let ty: &ModelType = spec.ty();
    if !options.is_declared(ty) {
        return Err(ConfigError::UndeclaredType(ty.to_string()));
    }
    if let Some(format) = spec.format() {
        if !options.has_format(ty, format) {
            return Err(ConfigError::UndeclaredFormat {
                ty: ty.to_string(),
                format: format.to_string(),
            });
        }
    }
    match spec.children() {
        Some(Children::Element(element)) => check_declared(element, options)?,
        Some(Children::Fields(fields)) => {
            for field in fields {
                check_declared(&field.model, options)?;
            }
        }
        None => {}
    }
    if let Some(EnumOptions::Models(models)) = spec.enumeration() {
        for model in models {
            check_declared(model, options)?;
        }
    }
    Ok(())
}
