//! # formwork-validator — the Validation Engine
//!
//! Turns a [`ModelSpec`](formwork_model::ModelSpec) and an arbitrary JSON
//! input into a coerced value, or a list of violations saying where and why
//! the input does not fit.
//!
//! ## Layers
//!
//! - [`options`]: the [`ValidatorOptions`] registry mapping types and
//!   formats to coercions and validations, with the bundle builder and the
//!   associative merge.
//! - [`validator`]: the [`Validator`] running the six-phase pipeline over
//!   one model node, recursing into children and enum options.
//! - [`context`]: the [`ValidatorContext`] entry point owning a merged
//!   registry, loadable from a YAML [`ContextConfig`].
//! - [`extensions`]: the standard bundles (primitives and the string,
//!   number and date formats) and reusable parse coercions.
//!
//! ## Example
//!
//! ```
//! use formwork_model::ModelSpec;
//! use formwork_validator::ValidatorContext;
//! use serde_json::json;
//!
//! let context = ValidatorContext::standard()?;
//! let spec = ModelSpec::array_of(ModelSpec::number());
//! let outcome = context.validate(&spec, Some(json!([1, "2", 3])))?;
//! assert!(outcome.conforms);
//! assert_eq!(outcome.value, Some(json!([1, 2, 3])));
//! # Ok::<(), formwork_core::FormworkError>(())
//! ```
//!
//! ## Logging
//!
//! Each validated node opens a `validate` span at `DEBUG` carrying its path
//! and type. Phases are traced at `TRACE`; rejected values at `DEBUG`. The
//! library installs no subscriber.

pub mod context;
pub mod extensions;
pub mod options;
pub mod temporal;
pub mod validator;

pub use context::{ContextConfig, ValidateOptions, ValidatorContext};
pub use extensions::Extension;
pub use options::{ValidatorOptions, ValidatorOptionsBuilder};
pub use validator::{Validator, DEFAULT_MAX_DEPTH};
