//! # formwork-model — Model Specifications and Validation Results
//!
//! The data layer of Formwork. A [`ModelSpec`] is a declarative description
//! of a value: its type, optional format, required/nullable/strict flags,
//! default, bounds, enum options, children, and per-instance hook overrides.
//! A [`ValidationResult`] records one node's progress through the validation
//! pipeline and [`coalesce`] folds child results into their parent.
//!
//! ## Hooks
//!
//! Behavior plugs in through three object-safe traits in [`hooks`]:
//!
//! - [`Coercion`] rewrites or finishes a result during a pipeline phase.
//! - [`Validation`] asserts something about a fully coerced value.
//! - [`TypeHandler`] decides whether a runtime value belongs to a type.
//!
//! Closures implement all three, so `hooks::coercion(|result, spec| ...)`
//! is usually all an extension needs.
//!
//! ## Descriptors
//!
//! [`ModelDescriptor`] is the serde shape of a model without code hooks, so
//! models can live in YAML or JSON files next to the code that uses them.
//!
//! ## Crate Policy
//!
//! - Depends only on `formwork-core` internally.
//! - Models are value data: `Clone` is cheap and validators never mutate
//!   the model they validate against.

pub mod descriptor;
pub mod hooks;
pub mod result;
pub mod spec;

pub use descriptor::{ChildrenDescriptor, EnumDescriptor, FieldDescriptor, ModelDescriptor};
pub use hooks::{Coercion, TypeHandler, Validation};
pub use result::{coalesce, ValidationOutcome, ValidationResult, Violation};
pub use spec::{Children, EnumOptions, FieldSpec, ModelSpec, ValidationRule};
