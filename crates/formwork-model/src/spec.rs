//! # Model Specification
//!
//! `ModelSpec` is one node of a declarative schema tree. It is value data:
//! cloning is cheap (hooks are shared through `Arc`) and every structural
//! operation (`pick`, `omit`, `merge`) returns a new model, so a validator
//! recursing into children never observes a model changing underneath it.
//!
//! ## Shape Invariants
//!
//! [`ModelSpec::check_shape`] enforces the invariants that do not depend on
//! a registry:
//!
//! - `Children::Element` only on arrays, `Children::Fields` only on objects.
//! - Object field paths are non-empty and unique.
//! - Enums are non-empty; literal options share one JSON kind.
//! - Pattern validations only on string models.
//! - `min <= max`.
//! - No instance coercion on `Phase::ValidateDefinition`.
//!
//! Registry-dependent checks (declared types and formats) live with the
//! validator.

use std::collections::BTreeMap;
use std::sync::Arc;

use formwork_core::{ConfigError, JsonKind, ModelType, Phase};
use regex::Regex;
use serde_json::Value;

use crate::hooks::{Coercion, Validation};

/// A declared child of an object model.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Key of the child within the object.
    pub path: String,
    /// Model the child value must satisfy.
    pub model: ModelSpec,
}

impl FieldSpec {
    pub fn new(path: impl Into<String>, model: ModelSpec) -> Self {
        Self {
            path: path.into(),
            model,
        }
    }
}

/// Children of a container model.
#[derive(Debug, Clone)]
pub enum Children {
    /// Every array element must satisfy this model.
    Element(Box<ModelSpec>),
    /// Declared object fields, in declaration order.
    Fields(Vec<FieldSpec>),
}

impl Children {
    fn kind(&self) -> &'static str {
        match self {
            Children::Element(_) => "element",
            Children::Fields(_) => "fields",
        }
    }
}

/// Allowed values of a model.
#[derive(Debug, Clone)]
pub enum EnumOptions {
    /// The value must equal one of these literals.
    Literals(Vec<Value>),
    /// The value must satisfy one of these models; the first match wins.
    Models(Vec<ModelSpec>),
}

/// An instance-level validation.
#[derive(Debug, Clone)]
pub enum ValidationRule {
    /// Arbitrary assertion hook.
    Check(Arc<dyn Validation>),
    /// The value must be a string matching this pattern.
    Pattern(Regex),
}

/// One node of a schema tree.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    ty: ModelType,
    format: Option<String>,
    required: bool,
    nullable: bool,
    strict: bool,
    default: Option<Value>,
    min: Option<f64>,
    max: Option<f64>,
    enumeration: Option<EnumOptions>,
    children: Option<Children>,
    coerce: BTreeMap<Phase, Arc<dyn Coercion>>,
    validations: Vec<ValidationRule>,
}

impl ModelSpec {
    /// A model of the given type with every constraint unset.
    pub fn new(ty: ModelType) -> Self {
        Self {
            ty,
            format: None,
            required: false,
            nullable: false,
            strict: false,
            default: None,
            min: None,
            max: None,
            enumeration: None,
            children: None,
            coerce: BTreeMap::new(),
            validations: Vec::new(),
        }
    }

    pub fn boolean() -> Self {
        Self::new(ModelType::Boolean)
    }

    pub fn number() -> Self {
        Self::new(ModelType::Number)
    }

    pub fn string() -> Self {
        Self::new(ModelType::String)
    }

    pub fn date() -> Self {
        Self::new(ModelType::Date)
    }

    /// An array model whose elements must satisfy `element`.
    pub fn array_of(element: ModelSpec) -> Self {
        Self::new(ModelType::Array).with_element(element)
    }

    /// An object model with the given declared fields.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, ModelSpec)>,
        K: Into<String>,
    {
        Self::new(ModelType::Object).with_children(Children::Fields(
            fields
                .into_iter()
                .map(|(path, model)| FieldSpec::new(path, model))
                .collect(),
        ))
    }

    // ─── Fluent setters ──────────────────────────────────────────────

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_enum_literals(mut self, options: Vec<Value>) -> Self {
        self.enumeration = Some(EnumOptions::Literals(options));
        self
    }

    pub fn with_enum_models(mut self, options: Vec<ModelSpec>) -> Self {
        self.enumeration = Some(EnumOptions::Models(options));
        self
    }

    pub fn with_children(mut self, children: Children) -> Self {
        self.children = Some(children);
        self
    }

    pub fn with_element(self, element: ModelSpec) -> Self {
        self.with_children(Children::Element(Box::new(element)))
    }

    /// Append a declared field, turning the children into a field list.
    pub fn with_field(mut self, path: impl Into<String>, model: ModelSpec) -> Self {
        let field = FieldSpec::new(path, model);
        match &mut self.children {
            Some(Children::Fields(fields)) => fields.push(field),
            _ => self.children = Some(Children::Fields(vec![field])),
        }
        self
    }

    /// Override the registry coercion for `phase` on this model only.
    pub fn with_coercion(mut self, phase: Phase, hook: Arc<dyn Coercion>) -> Self {
        self.coerce.insert(phase, hook);
        self
    }

    pub fn with_validation(mut self, hook: Arc<dyn Validation>) -> Self {
        self.validations.push(ValidationRule::Check(hook));
        self
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.validations.push(ValidationRule::Pattern(pattern));
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────

    pub fn ty(&self) -> &ModelType {
        &self.ty
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn enumeration(&self) -> Option<&EnumOptions> {
        self.enumeration.as_ref()
    }

    pub fn children(&self) -> Option<&Children> {
        self.children.as_ref()
    }

    /// The instance-level coercion for `phase`, if any.
    pub fn coercion(&self, phase: Phase) -> Option<&Arc<dyn Coercion>> {
        self.coerce.get(&phase)
    }

    pub fn validations(&self) -> &[ValidationRule] {
        &self.validations
    }

    /// Declared field paths of an object model, in declaration order.
    pub fn field_paths(&self) -> Vec<&str> {
        match &self.children {
            Some(Children::Fields(fields)) => fields.iter().map(|f| f.path.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// The declared field at `path`, if any.
    pub fn field(&self, path: &str) -> Option<&ModelSpec> {
        match &self.children {
            Some(Children::Fields(fields)) => {
                fields.iter().find(|f| f.path == path).map(|f| &f.model)
            }
            _ => None,
        }
    }

    // ─── Clone-on-write operations ───────────────────────────────────

    /// A copy keeping only the declared fields listed in `paths`.
    ///
    /// Non-object models are returned unchanged.
    pub fn pick(&self, paths: &[&str]) -> ModelSpec {
        self.retain_fields(|path| paths.contains(&path))
    }

    /// A copy without the declared fields listed in `paths`.
    pub fn omit(&self, paths: &[&str]) -> ModelSpec {
        self.retain_fields(|path| !paths.contains(&path))
    }

    fn retain_fields(&self, keep: impl Fn(&str) -> bool) -> ModelSpec {
        let mut copy = self.clone();
        if let Some(Children::Fields(fields)) = &mut copy.children {
            fields.retain(|f| keep(&f.path));
        }
        copy
    }

    /// Combine two models into a new one.
    ///
    /// Scalar attributes (type, format, flags, default, bounds, enum) come
    /// from `other`. Object fields are unioned in order, with `other`
    /// replacing same-path fields of `self`. Coercion overrides merge with
    /// `other` winning per phase. Validations accumulate, `self` first.
    pub fn merge(&self, other: &ModelSpec) -> ModelSpec {
        let mut merged = other.clone();

        merged.children = match (&self.children, &other.children) {
            (Some(Children::Fields(left)), Some(Children::Fields(right))) => {
                let mut fields = left.clone();
                for field in right {
                    match fields.iter_mut().find(|f| f.path == field.path) {
                        Some(existing) => *existing = field.clone(),
                        None => fields.push(field.clone()),
                    }
                }
                Some(Children::Fields(fields))
            }
            (left, None) => left.clone(),
            (_, right) => right.clone(),
        };

        let mut coerce = self.coerce.clone();
        coerce.extend(other.coerce.iter().map(|(p, h)| (*p, Arc::clone(h))));
        merged.coerce = coerce;

        let mut validations = self.validations.clone();
        validations.extend(other.validations.iter().cloned());
        merged.validations = validations;

        merged
    }

    // ─── Shape checks ────────────────────────────────────────────────

    /// Check the registry-independent invariants, recursively.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found, depth first.
    pub fn check_shape(&self) -> Result<(), ConfigError> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(ConfigError::InvalidBounds { min, max });
            }
        }

        if self.coerce.contains_key(&Phase::ValidateDefinition) {
            return Err(ConfigError::InvalidHookPhase(
                Phase::ValidateDefinition.to_string(),
            ));
        }

        if self.ty != ModelType::String
            && self
                .validations
                .iter()
                .any(|v| matches!(v, ValidationRule::Pattern(_)))
        {
            return Err(ConfigError::PatternOnNonString(self.ty.to_string()));
        }

        if let Some(children) = &self.children {
            let shape_ok = matches!(
                (&self.ty, children),
                (ModelType::Array, Children::Element(_)) | (ModelType::Object, Children::Fields(_))
            );
            if !shape_ok {
                return Err(ConfigError::ChildrenShape {
                    ty: self.ty.to_string(),
                    children: children.kind().to_string(),
                });
            }
            match children {
                Children::Element(element) => element.check_shape()?,
                Children::Fields(fields) => {
                    let mut seen = std::collections::BTreeSet::new();
                    for field in fields {
                        if field.path.is_empty() {
                            return Err(ConfigError::EmptyFieldPath);
                        }
                        if !seen.insert(field.path.as_str()) {
                            return Err(ConfigError::DuplicateField(field.path.clone()));
                        }
                        field.model.check_shape()?;
                    }
                }
            }
        }

        match &self.enumeration {
            Some(EnumOptions::Literals(options)) => {
                let first = options
                    .first()
                    .ok_or_else(|| ConfigError::EnumShape("enum has no options".into()))?;
                let kind = JsonKind::of(first);
                if let Some(odd) = options.iter().find(|o| JsonKind::of(o) != kind) {
                    return Err(ConfigError::EnumShape(format!(
                        "option {odd} is a {}, expected {kind}",
                        JsonKind::of(odd)
                    )));
                }
            }
            Some(EnumOptions::Models(options)) => {
                if options.is_empty() {
                    return Err(ConfigError::EnumShape("enum has no options".into()));
                }
                for option in options {
                    option.check_shape()?;
                }
            }
            None => {}
        }

        Ok(())
    }
}
