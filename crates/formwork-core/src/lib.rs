//! # formwork-core — Foundational Types for Formwork
//!
//! The leaf of the Formwork crate graph. Everything that the model layer and
//! the validator layer must agree on lives here: the error hierarchy, the
//! keys used to index the validator registry, the ordered pipeline phases,
//! and the path type that locates a value inside a root document.
//!
//! ## Key Design Principles
//!
//! 1. **Typed registry keys.** `ModelType` and `FormatKey` replace runtime
//!    string lookups. Built-in types are enum variants; extension types use
//!    `ModelType::Custom`.
//!
//! 2. **Absent is not null.** Input values are `Option<serde_json::Value>`.
//!    `None` means the value is absent, `Some(Value::Null)` means an explicit
//!    null. The two are never conflated.
//!
//! 3. **Assertions are values.** Validation failures are `AssertionFailure`
//!    values carried in `Result`, never unwinding. Configuration mistakes are
//!    `ConfigError`s and surface at construction time.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `formwork-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod path;
pub mod phase;
pub mod types;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use error::{
    AssertionFailure, CoalesceError, ConfigError, FailureKind, FormworkError, PhaseError, PhaseResult,
};
pub use path::{PathSegment, ValuePath};
pub use phase::Phase;
pub use types::{FormatKey, ModelType};
pub use value::{loose_eq, number_value, JsonKind};
