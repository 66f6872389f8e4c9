//! # Model Descriptors
//!
//! The serializable form of a [`ModelSpec`]. A descriptor carries everything
//! a model can express as data: type, format, flags, default, bounds, enum
//! options, children, and regular-expression validations. Code hooks
//! (coercions and validation functions) are attached to the resulting model
//! in Rust.
//!
//! ## Format
//!
//! ```yaml
//! type: object
//! strict: true
//! children:
//!   - path: name
//!     model: { type: string, required: true, min: 1 }
//!   - path: tags
//!     model:
//!       type: array
//!       children: { type: string, patterns: ["^[a-z]+$"] }
//!   - path: status
//!     model: { type: string, enum: [draft, active] }
//! ```
//!
//! Array children are a single descriptor; object children are an ordered
//! list of `{path, model}` entries. `enum` holds either literals or nested
//! descriptors.

use formwork_core::{ConfigError, FormworkError, ModelType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::{Children, FieldSpec, ModelSpec};

/// Serializable description of a model node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescriptor {
    #[serde(rename = "type")]
    pub ty: ModelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub strict: bool,
    /// Value substituted for an absent input. A `null` default is read as
    /// "no default".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<EnumDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<ChildrenDescriptor>,
    /// Regular expressions the (string) value must match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
}

/// Enum options of a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumDescriptor {
    Models(Vec<ModelDescriptor>),
    Literals(Vec<Value>),
}

/// Children of a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildrenDescriptor {
    Fields(Vec<FieldDescriptor>),
    Element(Box<ModelDescriptor>),
}

/// One declared object field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescriptor {
    pub path: String,
    pub model: ModelDescriptor,
}

impl ModelDescriptor {
    /// Build the model this descriptor describes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if a pattern does not compile
    /// and `ConfigError::InvalidDescriptor` for a non-finite bound. Shape
    /// invariants are not checked here; validators check them.
    pub fn to_spec(&self) -> Result<ModelSpec, ConfigError> {
        for (name, bound) in [("min", self.min), ("max", self.max)] {
            if bound.is_some_and(|b| !b.is_finite()) {
                return Err(ConfigError::InvalidDescriptor(format!(
                    "{name} must be a finite number"
                )));
            }
        }
        let mut spec = ModelSpec::new(self.ty.clone());
        if let Some(format) = &self.format {
            spec = spec.with_format(format.clone());
        }
        if self.required {
            spec = spec.required();
        }
        if self.nullable {
            spec = spec.nullable();
        }
        if self.strict {
            spec = spec.strict();
        }
        if let Some(default) = &self.default {
            spec = spec.with_default(default.clone());
        }
        if let Some(min) = self.min {
            spec = spec.with_min(min);
        }
        if let Some(max) = self.max {
            spec = spec.with_max(max);
        }
        match &self.enumeration {
            Some(EnumDescriptor::Literals(options)) => {
                spec = spec.with_enum_literals(options.clone());
            }
            Some(EnumDescriptor::Models(options)) => {
                let models = options
                    .iter()
                    .map(ModelDescriptor::to_spec)
                    .collect::<Result<Vec<_>, _>>()?;
                spec = spec.with_enum_models(models);
            }
            None => {}
        }
        match &self.children {
            Some(ChildrenDescriptor::Element(element)) => {
                spec = spec.with_element(element.to_spec()?);
            }
            Some(ChildrenDescriptor::Fields(fields)) => {
                let fields = fields
                    .iter()
                    .map(|f| f.model.to_spec().map(|model| FieldSpec::new(f.path.clone(), model)))
                    .collect::<Result<Vec<_>, _>>()?;
                spec = spec.with_children(Children::Fields(fields));
            }
            None => {}
        }
        for pattern in &self.patterns {
            let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            spec = spec.with_pattern(regex);
        }
        Ok(spec)
    }
}

impl TryFrom<&ModelDescriptor> for ModelSpec {
    type Error = ConfigError;

    fn try_from(descriptor: &ModelDescriptor) -> Result<Self, Self::Error> {
        descriptor.to_spec()
    }
}

impl ModelSpec {
    /// Parse a model from a YAML descriptor.
    ///
    /// # Errors
    ///
    /// Returns `FormworkError::Serialization` for malformed YAML and
    /// `FormworkError::Config` for an invalid pattern or bound.
    pub fn from_yaml_str(source: &str) -> Result<Self, FormworkError> {
        let descriptor: ModelDescriptor = serde_yaml::from_str(source)
            .map_err(|e| FormworkError::Serialization(format!("invalid YAML model: {e}")))?;
        Ok(descriptor.to_spec()?)
    }

    /// Parse a model from a JSON descriptor.
    ///
    /// # Errors
    ///
    /// Returns `FormworkError::Serialization` for malformed JSON and
    /// `FormworkError::Config` for an invalid pattern or bound.
    pub fn from_json_str(source: &str) -> Result<Self, FormworkError> {
        let descriptor: ModelDescriptor = serde_json::from_str(source)
            .map_err(|e| FormworkError::Serialization(format!("invalid JSON model: {e}")))?;
        Ok(descriptor.to_spec()?)
    }
}
