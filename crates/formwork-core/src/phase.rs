//! # Pipeline Phases
//!
//! The validator drives every node through the same fixed sequence of
//! phases. Each phase except `ValidateDefinition` accepts a coercion hook,
//! supplied by the registry or overridden per model instance.
//!
//! ```text
//! Parse ─▶ ValidateDefinition ─▶ CoerceType ─▶ ValidateChildren ─▶ ValidateEnum ─▶ ValidateValue
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// One stage of the validation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Free-form pre-processing before any type assumption.
    Parse,
    /// Required/default/nullable handling. Built in, never hookable.
    ValidateDefinition,
    /// Normalize the value into the type's canonical representation.
    CoerceType,
    /// Recurse into array elements or declared object fields.
    ValidateChildren,
    /// Check literal enum membership or try enum sub-models.
    ValidateEnum,
    /// Run registry and instance validations.
    ValidateValue,
}

impl Phase {
    /// All phases in execution order.
    pub const ORDER: [Phase; 6] = [
        Phase::Parse,
        Phase::ValidateDefinition,
        Phase::CoerceType,
        Phase::ValidateChildren,
        Phase::ValidateEnum,
        Phase::ValidateValue,
    ];

    /// Whether coercion hooks may be attached to this phase.
    pub fn is_hookable(self) -> bool {
        !matches!(self, Phase::ValidateDefinition)
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Parse => "parse",
            Phase::ValidateDefinition => "validateDefinition",
            Phase::CoerceType => "coerceType",
            Phase::ValidateChildren => "validateChildren",
            Phase::ValidateEnum => "validateEnum",
            Phase::ValidateValue => "validateValue",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
