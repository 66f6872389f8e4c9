//! # Validator Context — the Entry Point
//!
//! A `ValidatorContext` owns one merged registry and validates any number
//! of values against any number of models. Build it once and share it; it
//! is `Send + Sync` and cheap to clone.
//!
//! ```yaml
//! # formwork.yaml
//! extensions: [core, string-formats, number-formats, date-formats]
//! fail_loudly: false
//! max_depth: 64
//! ```

use std::path::Path;
use std::sync::Arc;

use formwork_core::{ConfigError, FormworkError};
use formwork_model::{ModelSpec, ValidationOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extensions::Extension;
use crate::options::ValidatorOptions;
use crate::validator::{Validator, DEFAULT_MAX_DEPTH};

/// Context configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    /// Standard bundles to merge, in order.
    pub extensions: Vec<Extension>,
    /// Default for [`ValidateOptions::fail_loudly`].
    pub fail_loudly: bool,
    /// Maximum model nesting depth.
    pub max_depth: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            extensions: Extension::ALL.to_vec(),
            fail_loudly: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ContextConfig {
    /// Parse a configuration from YAML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `FormworkError::Serialization` for malformed YAML or an
    /// unknown key or extension name.
    pub fn from_yaml_str(source: &str) -> Result<Self, FormworkError> {
        serde_yaml::from_str(source)
            .map_err(|e| FormworkError::Serialization(format!("invalid context config: {e}")))
    }

    /// Read a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `FormworkError::Serialization` if the file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, FormworkError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FormworkError::Serialization(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }
}

/// Per-call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Return the first violation as `Err(FormworkError::Validation)`
    /// instead of a non-conforming outcome.
    pub fail_loudly: bool,
}

/// Merged registry plus configuration.
#[derive(Debug, Clone)]
pub struct ValidatorContext {
    options: Arc<ValidatorOptions>,
    config: ContextConfig,
}

impl ValidatorContext {
    /// A context over every standard bundle with default settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the standard bundles fail to merge.
    pub fn standard() -> Result<Self, ConfigError> {
        Self::from_config(&ContextConfig::default())
    }

    /// A context over the bundles named in `config`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the bundles fail to merge.
    pub fn from_config(config: &ContextConfig) -> Result<Self, ConfigError> {
        let bundles = config
            .extensions
            .iter()
            .map(|extension| extension.bundle())
            .collect::<Result<Vec<_>, _>>()?;
        Self::with_config(bundles, config.clone())
    }

    /// A context over arbitrary bundles with default settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the bundles fail to merge.
    pub fn new<I>(bundles: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = ValidatorOptions>,
    {
        let config = ContextConfig {
            extensions: Vec::new(),
            ..ContextConfig::default()
        };
        Self::with_config(bundles, config)
    }

    fn with_config<I>(bundles: I, config: ContextConfig) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = ValidatorOptions>,
    {
        let bundles: Vec<ValidatorOptions> = bundles.into_iter().collect();
        let options = ValidatorOptions::merge_all(&bundles)?;
        tracing::debug!(
            types = ?options.types(),
            bundles = bundles.len(),
            "validator context ready"
        );
        Ok(Self {
            options: Arc::new(options),
            config,
        })
    }

    /// A new context with `bundle` merged on top of this one.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the merged registry is inconsistent.
    pub fn extend(&self, bundle: &ValidatorOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            options: Arc::new(self.options.merge(bundle)?),
            config: self.config.clone(),
        })
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// A validator for `spec` bound to this context.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `spec` is malformed for this registry.
    pub fn validator<'a>(&'a self, spec: &'a ModelSpec) -> Result<Validator<'a>, ConfigError> {
        Ok(Validator::new(spec, &self.options)?.with_max_depth(self.config.max_depth))
    }

    /// Validate `input` with the configured defaults. `None` is an absent
    /// value.
    ///
    /// # Errors
    ///
    /// See [`ValidatorContext::validate_with`].
    pub fn validate(
        &self,
        spec: &ModelSpec,
        input: Option<Value>,
    ) -> Result<ValidationOutcome, FormworkError> {
        let options = ValidateOptions {
            fail_loudly: self.config.fail_loudly,
        };
        self.validate_with(spec, input, options)
    }

    /// Validate `input` against `spec`.
    ///
    /// # Errors
    ///
    /// - `FormworkError::Config` if `spec` is malformed for this registry.
    /// - `FormworkError::Validation` for the first violation, only when
    ///   `options.fail_loudly` is set.
    /// - `FormworkError::Fault`, `Coalesce` or `DepthExceeded` when
    ///   validation aborts.
    pub fn validate_with(
        &self,
        spec: &ModelSpec,
        input: Option<Value>,
        options: ValidateOptions,
    ) -> Result<ValidationOutcome, FormworkError> {
        let outcome = self.validator(spec)?.validate(input)?.into_outcome();
        if options.fail_loudly {
            if let Some(first) = outcome.errors.first() {
                return Err(FormworkError::Validation {
                    path: first.path_string(),
                    failure: first.to_failure(),
                });
            }
        }
        Ok(outcome)
    }
}
