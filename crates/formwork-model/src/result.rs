//! # Validation Results and the Coalesce Algebra
//!
//! A `ValidationResult` is the per-node record of a value moving through the
//! validation pipeline. It is mutable while the pipeline runs and frozen once
//! finished.
//!
//! ## Invariants
//!
//! - `conforms` starts true and, once false, stays false.
//! - Becoming non-conforming always finishes the result.
//! - A finished result ignores further changes to its value and errors,
//!   except for [`ValidationResult::reject`], which records the failure of
//!   the phase that finished it.
//! - `root_value` is the original top-level input, shared by every node of
//!   one validation and never modified.
//!
//! ## Coalesce
//!
//! [`coalesce`] folds ordered child results into a new parent result. The
//! shape of the base value decides how child paths must relate to the base
//! path:
//!
//! | Base value | Child path must be | Child value goes to |
//! |------------|--------------------|---------------------|
//! | array | base + one index | that index of a fresh array |
//! | object | base + one key | that key of a fresh map |
//! | anything else | exactly base | nowhere |
//!
//! Any other relationship is a `CoalesceError`, never a silent mis-write.

use std::fmt;
use std::sync::Arc;

use formwork_core::{AssertionFailure, CoalesceError, FailureKind, PathSegment, ValuePath};
use serde::Serialize;
use serde_json::{Map, Value};

/// One recorded validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Human-readable description.
    pub message: String,
    /// Location of the failing value.
    pub path: ValuePath,
    /// The offending value, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    /// What was expected, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    /// Category of the failure.
    #[serde(skip)]
    pub kind: FailureKind,
}

impl Violation {
    /// Locate an assertion failure at `path`.
    pub fn from_failure(failure: AssertionFailure, path: ValuePath) -> Self {
        Self {
            message: failure.message,
            path,
            actual: failure.actual,
            expected: failure.expected,
            kind: failure.kind,
        }
    }

    /// Dotted form of the path, `(root)` for the top-level value.
    pub fn path_string(&self) -> String {
        self.path.to_string()
    }

    /// The failure this violation was recorded from.
    pub fn to_failure(&self) -> AssertionFailure {
        AssertionFailure {
            kind: self.kind,
            message: self.message.clone(),
            actual: self.actual.clone(),
            expected: self.expected.clone(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The externally visible projection of a finished result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    /// The coerced value. Not trustworthy when `conforms` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub conforms: bool,
    pub errors: Vec<Violation>,
}

/// Per-node validation state.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    value: Option<Value>,
    conforms: bool,
    errors: Vec<Violation>,
    is_finished: bool,
    root_value: Arc<Option<Value>>,
    path: ValuePath,
}

impl ValidationResult {
    /// A fresh result for the top-level input of a validation.
    pub fn new_root(input: Option<Value>) -> Self {
        Self {
            root_value: Arc::new(input.clone()),
            value: input,
            conforms: true,
            errors: Vec::new(),
            is_finished: false,
            path: ValuePath::root(),
        }
    }

    /// A fresh result for a nested value one segment below this node.
    pub fn child(&self, segment: impl Into<PathSegment>, value: Option<Value>) -> Self {
        self.at(self.path.child(segment), value)
    }

    /// A fresh result for an alternative value at this node's own path.
    pub fn sibling(&self, value: Option<Value>) -> Self {
        self.at(self.path.clone(), value)
    }

    fn at(&self, path: ValuePath, value: Option<Value>) -> Self {
        Self {
            value,
            conforms: true,
            errors: Vec::new(),
            is_finished: false,
            root_value: Arc::clone(&self.root_value),
            path,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn conforms(&self) -> bool {
        self.conforms
    }

    pub fn errors(&self) -> &[Violation] {
        &self.errors
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    /// The original top-level input of this validation.
    pub fn root_value(&self) -> Option<&Value> {
        (*self.root_value).as_ref()
    }

    pub fn path(&self) -> &ValuePath {
        &self.path
    }

    // ─── Mutators ────────────────────────────────────────────────────

    /// Replace the candidate value. Ignored once finished.
    pub fn set_value(&mut self, value: Option<Value>) {
        if !self.is_finished {
            self.value = value;
        }
    }

    /// Take the candidate value out, leaving it absent. Ignored once finished.
    pub fn take_value(&mut self) -> Option<Value> {
        if self.is_finished {
            return None;
        }
        self.value.take()
    }

    /// Finish or reopen the result. A non-conforming result stays finished.
    pub fn set_is_finished(&mut self, finished: bool) {
        self.is_finished = finished || !self.conforms;
    }

    /// Record conformance. `false` finishes the result; `true` cannot undo
    /// a recorded error.
    pub fn set_conforms(&mut self, conforms: bool) {
        if conforms {
            self.conforms = self.errors.is_empty() && self.conforms;
        } else {
            self.conforms = false;
            self.is_finished = true;
        }
    }

    /// Record an assertion failure at this node's path and finish.
    pub fn mark_as_errored(&mut self, failure: AssertionFailure) {
        let violation = Violation::from_failure(failure, self.path.clone());
        self.push_violation(violation);
    }

    /// Record an already-located violation and finish.
    pub fn push_violation(&mut self, violation: Violation) {
        self.push_violations(vec![violation]);
    }

    /// Record a failure raised by the running phase, even if that phase
    /// already finished the result.
    pub fn reject(&mut self, failure: AssertionFailure) {
        self.errors
            .push(Violation::from_failure(failure, self.path.clone()));
        self.conforms = false;
        self.is_finished = true;
    }

    /// Record several violations at once and finish. An empty batch is a no-op.
    pub fn push_violations(&mut self, violations: Vec<Violation>) {
        if self.is_finished || violations.is_empty() {
            return;
        }
        self.errors.extend(violations);
        self.set_conforms(false);
    }

    /// The projection handed to callers.
    pub fn into_outcome(self) -> ValidationOutcome {
        ValidationOutcome {
            value: self.value,
            conforms: self.conforms,
            errors: self.errors,
        }
    }
}

/// Fold ordered child results into a new result for their container.
///
/// The new result conforms only if every child conforms, carries the
/// children's errors in child order, and is finished exactly when it does
/// not conform, so that later phases can still run on a conforming
/// container.
///
/// # Errors
///
/// Returns `CoalesceError::BaseFinished` if `base` is finished, and
/// `CoalesceError::PathShape` if a child path does not relate to the base
/// path as the base value's shape requires.
pub fn coalesce(
    base: ValidationResult,
    children: Vec<ValidationResult>,
) -> Result<ValidationResult, CoalesceError> {
    if base.is_finished {
        return Err(CoalesceError::BaseFinished {
            path: base.path.to_string(),
        });
    }

    let shape_error = |child: &ValidationResult, expected: &'static str| CoalesceError::PathShape {
        base: base.path.to_string(),
        child: child.path.to_string(),
        expected,
    };

    let value = match &base.value {
        Some(Value::Array(_)) => {
            let mut slots: Vec<(usize, Option<Value>)> = Vec::with_capacity(children.len());
            for child in &children {
                match base.path.extension_of_one(&child.path) {
                    Some(PathSegment::Index(i)) => slots.push((*i, child.value.clone())),
                    _ => return Err(shape_error(child, "exactly one index")),
                }
            }
            let len = slots.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
            let mut items = vec![Value::Null; len];
            for (i, value) in slots {
                items[i] = value.unwrap_or(Value::Null);
            }
            Some(Value::Array(items))
        }
        Some(Value::Object(_)) => {
            let mut map = Map::new();
            for child in &children {
                match base.path.extension_of_one(&child.path) {
                    Some(PathSegment::Key(k)) => {
                        if let Some(value) = &child.value {
                            map.insert(k.clone(), value.clone());
                        }
                    }
                    _ => return Err(shape_error(child, "exactly one key")),
                }
            }
            Some(Value::Object(map))
        }
        other => {
            if let Some(child) = children.iter().find(|c| c.path != base.path) {
                return Err(shape_error(child, "nothing"));
            }
            other.clone()
        }
    };

    let conforms = children.iter().all(|c| c.conforms);
    let mut errors = base.errors;
    errors.extend(children.into_iter().flat_map(|c| c.errors));

    Ok(ValidationResult {
        value,
        conforms,
        errors,
        is_finished: !conforms,
        root_value: base.root_value,
        path: base.path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failed(mut result: ValidationResult, message: &str) -> ValidationResult {
        result.mark_as_errored(AssertionFailure::custom(message));
        result
    }

    #[test]
    fn test_new_root_shares_root_value() {
        let root = ValidationResult::new_root(Some(json!({"a": [1]})));
        let child = root.child("a", Some(json!([1])));
        let grandchild = child.child(0, Some(json!(1)));
        assert_eq!(grandchild.root_value(), Some(&json!({"a": [1]})));
        assert_eq!(grandchild.path().to_string(), "a.0");
    }

    #[test]
    fn test_non_conformance_is_terminal() {
        let mut result = ValidationResult::new_root(Some(json!(1)));
        result.set_conforms(false);
        assert!(result.is_finished());
        result.set_is_finished(false);
        assert!(result.is_finished());
        result.set_conforms(true);
        assert!(!result.conforms());
    }

    #[test]
    fn test_finished_result_is_frozen() {
        let mut result = ValidationResult::new_root(Some(json!(1)));
        result.set_is_finished(true);
        result.set_value(Some(json!(2)));
        result.mark_as_errored(AssertionFailure::custom("late"));
        assert_eq!(result.value(), Some(&json!(1)));
        assert!(result.errors().is_empty());
        assert!(result.conforms());
    }

    #[test]
    fn test_reject_records_after_finish() {
        let mut result = ValidationResult::new_root(Some(json!("x")));
        result.set_is_finished(true);
        result.reject(AssertionFailure::custom("rejected"));
        assert!(!result.conforms());
        assert!(result.is_finished());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].message, "rejected");
    }

    #[test]
    fn test_mark_as_errored_records_path() {
        let root = ValidationResult::new_root(Some(json!({"x": 1})));
        let child = failed(root.child("x", Some(json!(1))), "too small");
        assert!(!child.conforms());
        assert!(child.is_finished());
        assert_eq!(child.errors()[0].path_string(), "x");
        assert_eq!(child.errors()[0].to_string(), "x: too small");
    }

    #[test]
    fn test_coalesce_array_writes_children_in_order() {
        let base = ValidationResult::new_root(Some(json!(["1", "2"])));
        let children = vec![
            base.child(0, Some(json!(1))),
            base.child(1, Some(json!(2))),
        ];
        let merged = coalesce(base, children).unwrap();
        assert_eq!(merged.value(), Some(&json!([1, 2])));
        assert!(merged.conforms());
        assert!(!merged.is_finished());
    }

    #[test]
    fn test_coalesce_object_omits_absent_children() {
        let base = ValidationResult::new_root(Some(json!({"a": "1"})));
        let children = vec![base.child("a", Some(json!(1))), base.child("b", None)];
        let merged = coalesce(base, children).unwrap();
        assert_eq!(merged.value(), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_coalesce_collects_errors_in_child_order() {
        let base = ValidationResult::new_root(Some(json!([0, 0, 0])));
        let children = vec![
            failed(base.child(0, Some(json!(0))), "first"),
            base.child(1, Some(json!(0))),
            failed(base.child(2, Some(json!(0))), "third"),
        ];
        let merged = coalesce(base, children).unwrap();
        assert!(!merged.conforms());
        assert!(merged.is_finished());
        let messages: Vec<_> = merged.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "third"]);
    }

    #[test]
    fn test_coalesce_scalar_requires_same_path() {
        let base = ValidationResult::new_root(Some(json!("x")));
        let same = base.sibling(Some(json!("y")));
        let merged = coalesce(base.clone(), vec![same]).unwrap();
        assert_eq!(merged.value(), Some(&json!("x")));

        let deeper = base.child("k", None);
        assert!(matches!(
            coalesce(base, vec![deeper]),
            Err(CoalesceError::PathShape { expected: "nothing", .. })
        ));
    }

    #[test]
    fn test_coalesce_rejects_multi_segment_extension() {
        let base = ValidationResult::new_root(Some(json!([[1]])));
        let skipped = base.child(0, None).child(0, Some(json!(1)));
        assert!(matches!(
            coalesce(base, vec![skipped]),
            Err(CoalesceError::PathShape { .. })
        ));
    }

    #[test]
    fn test_coalesce_rejects_key_into_array() {
        let base = ValidationResult::new_root(Some(json!([1])));
        let child = base.child("zero", Some(json!(1)));
        assert!(coalesce(base, vec![child]).is_err());
    }

    #[test]
    fn test_coalesce_rejects_finished_base() {
        let mut base = ValidationResult::new_root(Some(json!([])));
        base.set_is_finished(true);
        assert!(matches!(
            coalesce(base, vec![]),
            Err(CoalesceError::BaseFinished { .. })
        ));
    }

    #[test]
    fn test_outcome_serialization_shape() {
        let base = ValidationResult::new_root(Some(json!({"n": "x"})));
        let mut child = base.child("n", Some(json!("x")));
        child.mark_as_errored(AssertionFailure::type_mismatch("number", &json!("x")));
        let outcome = coalesce(base, vec![child]).unwrap().into_outcome();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["conforms"], json!(false));
        assert_eq!(json["errors"][0]["path"], json!(["n"]));
        assert_eq!(json["errors"][0]["expected"], json!("number"));
        assert!(json["errors"][0].get("kind").is_none());
    }
}
