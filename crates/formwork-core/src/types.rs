//! # Model Types and Format Keys
//!
//! `ModelType` names the semantic type of a model node and is the first key
//! of every registry lookup. `FormatKey` is the second key: a concrete
//! declared format, or one of the two sentinels.
//!
//! ## Sentinels
//!
//! - `FormatKey::All`: behavior that applies to every format of a type and
//!   runs before any format-specific behavior.
//! - `FormatKey::Fallback`: behavior that applies only when the model sets
//!   no format, or sets a format the registry does not recognize.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The semantic type of a model node.
///
/// Built-in types are variants; extension bundles introduce new types with
/// `Custom`. Serializes as its lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelType {
    Boolean,
    Number,
    String,
    Array,
    Object,
    Date,
    /// A type contributed by an extension bundle.
    Custom(String),
}

impl ModelType {
    /// The canonical lowercase name of this type.
    pub fn name(&self) -> &str {
        match self {
            ModelType::Boolean => "boolean",
            ModelType::Number => "number",
            ModelType::String => "string",
            ModelType::Array => "array",
            ModelType::Object => "object",
            ModelType::Date => "date",
            ModelType::Custom(name) => name,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for ModelType {
    fn from(s: &str) -> Self {
        match s {
            "boolean" => ModelType::Boolean,
            "number" => ModelType::Number,
            "string" => ModelType::String,
            "array" => ModelType::Array,
            "object" => ModelType::Object,
            "date" => ModelType::Date,
            other => ModelType::Custom(other.to_string()),
        }
    }
}

impl From<String> for ModelType {
    fn from(s: String) -> Self {
        ModelType::from(s.as_str())
    }
}

impl From<ModelType> for String {
    fn from(ty: ModelType) -> Self {
        ty.name().to_string()
    }
}

impl FromStr for ModelType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ModelType::from(s))
    }
}

/// Second-level registry key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatKey {
    /// Applies to every format, before format-specific behavior.
    All,
    /// Applies when no recognized format is set.
    Fallback,
    /// A concrete declared format.
    Named(String),
}

impl FormatKey {
    pub fn named(format: impl Into<String>) -> Self {
        FormatKey::Named(format.into())
    }
}

impl fmt::Display for FormatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKey::All => f.write_str("<all formats>"),
            FormatKey::Fallback => f.write_str("<fallback>"),
            FormatKey::Named(name) => f.write_str(name),
        }
    }
}
