//! # Validator Options — the Behavior Registry
//!
//! `ValidatorOptions` maps each declared type, and each format of that type,
//! to the coercion hooks that run at each pipeline phase and to the list of
//! validations that run on the coerced value.
//!
//! ## Resolution
//!
//! For a model of type `T` with optional format `F`:
//!
//! 1. The `FormatKey::All` entry applies first, whatever the format.
//! 2. Then the `FormatKey::Named(F)` entry if `F` is set and declared for
//!    `T`, otherwise the `FormatKey::Fallback` entry.
//!
//! Two coercions resolved for the same phase compose: the all-formats hook
//! runs first and the second is skipped if the first finished the result.
//! Validations concatenate in the same order.
//!
//! ## Bundles and Merging
//!
//! An extension bundle is itself a `ValidatorOptions`, written with
//! [`ValidatorOptions::builder`]. Bundles merge right-biased: ordered lists
//! (types, formats, validations) are unioned without duplicates, coercion
//! maps deep-merge with the right side winning per phase. A merged registry
//! must reference only declared types and formats. Merging is associative.
//!
//! ## Thread Safety
//!
//! A built registry is immutable and `Send + Sync`.

use std::collections::BTreeMap;
use std::sync::Arc;

use formwork_core::{ConfigError, FormatKey, ModelType, Phase};
use formwork_model::hooks::{self, Coercion, TypeHandler, Validation};
use serde_json::Value;

type CoercionTable = BTreeMap<FormatKey, BTreeMap<Phase, Arc<dyn Coercion>>>;
type ValidationTable = BTreeMap<FormatKey, Vec<Arc<dyn Validation>>>;

/// Immutable registry of per-type and per-format behavior.
#[derive(Debug, Clone, Default)]
pub struct ValidatorOptions {
    types: Vec<ModelType>,
    handlers: BTreeMap<ModelType, Arc<dyn TypeHandler>>,
    formats: BTreeMap<ModelType, Vec<String>>,
    coerce: BTreeMap<ModelType, CoercionTable>,
    validations: BTreeMap<ModelType, ValidationTable>,
}

impl ValidatorOptions {
    /// Start writing an extension bundle.
    pub fn builder() -> ValidatorOptionsBuilder {
        ValidatorOptionsBuilder::default()
    }

    // ─── Introspection ───────────────────────────────────────────────

    /// Declared types, in declaration order.
    pub fn types(&self) -> &[ModelType] {
        &self.types
    }

    pub fn is_declared(&self, ty: &ModelType) -> bool {
        self.types.contains(ty)
    }

    /// Declared formats of `ty`, in declaration order.
    pub fn formats(&self, ty: &ModelType) -> &[String] {
        self.formats.get(ty).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_format(&self, ty: &ModelType, format: &str) -> bool {
        self.formats(ty).iter().any(|f| f == format)
    }

    /// The coercion registered at exactly `(ty, key, phase)`.
    pub fn coercion_at(
        &self,
        ty: &ModelType,
        key: &FormatKey,
        phase: Phase,
    ) -> Option<&Arc<dyn Coercion>> {
        self.coerce.get(ty)?.get(key)?.get(&phase)
    }

    /// The validations registered at exactly `(ty, key)`.
    pub fn validations_at(&self, ty: &ModelType, key: &FormatKey) -> &[Arc<dyn Validation>] {
        self.validations
            .get(ty)
            .and_then(|table| table.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `value` is in the canonical representation of `ty`.
    ///
    /// Types without a handler accept everything.
    pub fn accepts(&self, ty: &ModelType, value: &Value) -> bool {
        self.handlers.get(ty).map_or(true, |h| h.accepts(value))
    }

    // ─── Resolution ──────────────────────────────────────────────────

    /// The format-specific key for a model: its format if declared,
    /// otherwise the fallback sentinel.
    pub fn format_key(&self, ty: &ModelType, format: Option<&str>) -> FormatKey {
        match format {
            Some(f) if self.has_format(ty, f) => FormatKey::named(f),
            _ => FormatKey::Fallback,
        }
    }

    /// The coercion to run at `phase` for a model of `ty`/`format`.
    pub fn resolve_coercion(
        &self,
        ty: &ModelType,
        format: Option<&str>,
        phase: Phase,
    ) -> Option<Arc<dyn Coercion>> {
        let universal = self.coercion_at(ty, &FormatKey::All, phase).cloned();
        let specific = self
            .coercion_at(ty, &self.format_key(ty, format), phase)
            .cloned();
        match (universal, specific) {
            (Some(first), Some(second)) => Some(hooks::coercion(move |result, spec| {
                first.coerce(result, spec)?;
                if result.is_finished() {
                    return Ok(());
                }
                second.coerce(result, spec)
            })),
            (first, second) => first.or(second),
        }
    }

    /// The validations to run for a model of `ty`/`format`, in order.
    pub fn resolve_validations(
        &self,
        ty: &ModelType,
        format: Option<&str>,
    ) -> Vec<Arc<dyn Validation>> {
        let mut resolved = self.validations_at(ty, &FormatKey::All).to_vec();
        resolved.extend_from_slice(self.validations_at(ty, &self.format_key(ty, format)));
        resolved
    }

    // ─── Merging ─────────────────────────────────────────────────────

    /// Merge `other` on top of `self`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the merged registry references an
    /// undeclared type or format, or hooks a non-hookable phase.
    pub fn merge(&self, other: &ValidatorOptions) -> Result<ValidatorOptions, ConfigError> {
        let merged = self.merge_unchecked(other);
        merged.check_consistency()?;
        Ok(merged)
    }

    /// Merge bundles left to right.
    ///
    /// # Errors
    ///
    /// See [`ValidatorOptions::merge`].
    pub fn merge_all<'a, I>(bundles: I) -> Result<ValidatorOptions, ConfigError>
    where
        I: IntoIterator<Item = &'a ValidatorOptions>,
    {
        let merged = bundles
            .into_iter()
            .fold(ValidatorOptions::default(), |acc, bundle| acc.merge_unchecked(bundle));
        merged.check_consistency()?;
        Ok(merged)
    }

    fn merge_unchecked(&self, other: &ValidatorOptions) -> ValidatorOptions {
        let mut merged = self.clone();

        union_into(&mut merged.types, &other.types, |a, b| a == b);
        merged
            .handlers
            .extend(other.handlers.iter().map(|(t, h)| (t.clone(), Arc::clone(h))));

        for (ty, formats) in &other.formats {
            union_into(merged.formats.entry(ty.clone()).or_default(), formats, |a, b| a == b);
        }

        for (ty, table) in &other.coerce {
            let target = merged.coerce.entry(ty.clone()).or_default();
            for (key, phases) in table {
                target
                    .entry(key.clone())
                    .or_default()
                    .extend(phases.iter().map(|(p, h)| (*p, Arc::clone(h))));
            }
        }

        for (ty, table) in &other.validations {
            let target = merged.validations.entry(ty.clone()).or_default();
            for (key, list) in table {
                union_into(target.entry(key.clone()).or_default(), list, |a, b| {
                    Arc::ptr_eq(a, b)
                });
            }
        }

        merged
    }

    /// Check that every referenced type and format is declared.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn check_consistency(&self) -> Result<(), ConfigError> {
        let declared = |ty: &ModelType| -> Result<(), ConfigError> {
            if self.is_declared(ty) {
                Ok(())
            } else {
                Err(ConfigError::UndeclaredType(ty.to_string()))
            }
        };
        let known_key = |ty: &ModelType, key: &FormatKey| -> Result<(), ConfigError> {
            match key {
                FormatKey::Named(format) if !self.has_format(ty, format) => {
                    Err(ConfigError::UndeclaredFormat {
                        ty: ty.to_string(),
                        format: format.clone(),
                    })
                }
                _ => Ok(()),
            }
        };

        for ty in self.handlers.keys().chain(self.formats.keys()) {
            declared(ty)?;
        }
        for (ty, table) in &self.coerce {
            declared(ty)?;
            for (key, phases) in table {
                known_key(ty, key)?;
                if let Some(phase) = phases.keys().find(|p| !p.is_hookable()) {
                    return Err(ConfigError::InvalidHookPhase(phase.to_string()));
                }
            }
        }
        for (ty, table) in &self.validations {
            declared(ty)?;
            for key in table.keys() {
                known_key(ty, key)?;
            }
        }
        Ok(())
    }
}

/// Append the items of `extra` missing from `target`, keeping order.
fn union_into<T: Clone>(target: &mut Vec<T>, extra: &[T], same: impl Fn(&T, &T) -> bool) {
    for item in extra {
        if !target.iter().any(|existing| same(existing, item)) {
            target.push(item.clone());
        }
    }
}

/// Writes one extension bundle.
#[derive(Debug, Default)]
pub struct ValidatorOptionsBuilder {
    options: ValidatorOptions,
}

impl ValidatorOptionsBuilder {
    /// Declare `ty`, answered by `handler` at the end of type coercion.
    pub fn declare_type(mut self, ty: ModelType, handler: Arc<dyn TypeHandler>) -> Self {
        union_into(&mut self.options.types, std::slice::from_ref(&ty), |a, b| a == b);
        self.options.handlers.insert(ty, handler);
        self
    }

    /// Declare formats for `ty`.
    pub fn declare_formats<I, S>(mut self, ty: ModelType, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let formats: Vec<String> = formats.into_iter().map(Into::into).collect();
        union_into(self.options.formats.entry(ty).or_default(), &formats, |a, b| a == b);
        self
    }

    /// Register the coercion for `(ty, key, phase)`, replacing any earlier one.
    pub fn coerce(
        mut self,
        ty: ModelType,
        key: FormatKey,
        phase: Phase,
        hook: Arc<dyn Coercion>,
    ) -> Self {
        self.options
            .coerce
            .entry(ty)
            .or_default()
            .entry(key)
            .or_default()
            .insert(phase, hook);
        self
    }

    /// Append a validation for `(ty, key)`.
    pub fn validate(mut self, ty: ModelType, key: FormatKey, hook: Arc<dyn Validation>) -> Self {
        self.options
            .validations
            .entry(ty)
            .or_default()
            .entry(key)
            .or_default()
            .push(hook);
        self
    }

    /// Finish the bundle.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyFormatName` for a blank format and
    /// `ConfigError::InvalidHookPhase` for a coercion on a closed phase.
    /// Cross-bundle references are checked when bundles are merged.
    pub fn build(self) -> Result<ValidatorOptions, ConfigError> {
        for (ty, formats) in &self.options.formats {
            if formats.iter().any(|f| f.trim().is_empty()) {
                return Err(ConfigError::EmptyFormatName(ty.to_string()));
            }
        }
        for table in self.options.coerce.values() {
            for phases in table.values() {
                if let Some(phase) = phases.keys().find(|p| !p.is_hookable()) {
                    return Err(ConfigError::InvalidHookPhase(phase.to_string()));
                }
            }
        }
        Ok(self.options)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const FORMATS: [&str; 4] = ["a", "b", "c", "d"];
    const HOOKED_PHASES: [Phase; 4] = [
        Phase::Parse,
        Phase::CoerceType,
        Phase::ValidateEnum,
        Phase::ValidateValue,
    ];

    type Fingerprint = (
        Vec<ModelType>,
        Vec<String>,
        Vec<(FormatKey, Vec<usize>)>,
        Vec<(Phase, usize)>,
    );

    /// Hooks shared by every generated bundle, so identity survives merging.
    struct Pool {
        validations: Vec<Arc<dyn Validation>>,
        coercions: Vec<Arc<dyn Coercion>>,
    }

    impl Pool {
        fn new() -> Self {
            Self {
                validations: (0..4).map(|_| hooks::validation(|_, _| Ok(()))).collect(),
                coercions: (0..4).map(|_| hooks::coercion(|_, _| Ok(()))).collect(),
            }
        }

        /// A bundle over `string` selecting formats, validations and
        /// coercions from the pool by bit mask.
        fn bundle(&self, formats: u8, validations: u8, coercions: u8) -> ValidatorOptions {
            let mut builder = ValidatorOptions::builder()
                .declare_type(ModelType::String, hooks::type_handler(Value::is_string));
            let declared: Vec<&str> = FORMATS
                .iter()
                .enumerate()
                .filter(|(i, _)| formats & (1u8 << i) != 0)
                .map(|(_, f)| *f)
                .collect();
            builder = builder.declare_formats(ModelType::String, declared.clone());
            for (i, hook) in self.validations.iter().enumerate() {
                if validations & (1u8 << i) != 0 {
                    let key = match declared.get(i) {
                        Some(f) => FormatKey::named(*f),
                        None => FormatKey::All,
                    };
                    builder = builder.validate(ModelType::String, key, Arc::clone(hook));
                }
            }
            for (i, hook) in self.coercions.iter().enumerate() {
                if coercions & (1u8 << i) != 0 {
                    let phase = HOOKED_PHASES[i];
                    builder = builder.coerce(
                        ModelType::String,
                        FormatKey::Fallback,
                        phase,
                        Arc::clone(hook),
                    );
                }
            }
            builder.build().unwrap()
        }
    }

    /// Pointer identity of every slot, in order.
    fn fingerprint(options: &ValidatorOptions) -> Fingerprint {
        let ty = ModelType::String;
        let mut keys = vec![FormatKey::All, FormatKey::Fallback];
        keys.extend(FORMATS.iter().map(|f| FormatKey::named(*f)));
        let validations = keys
            .into_iter()
            .map(|key| {
                let ptrs = options
                    .validations_at(&ty, &key)
                    .iter()
                    .map(|h| Arc::as_ptr(h) as *const () as usize)
                    .collect();
                (key, ptrs)
            })
            .collect();
        let coercions = Phase::ORDER
            .into_iter()
            .filter_map(|phase| {
                options
                    .coercion_at(&ty, &FormatKey::Fallback, phase)
                    .map(|h| (phase, Arc::as_ptr(h) as *const () as usize))
            })
            .collect();
        (
            options.types().to_vec(),
            options.formats(&ty).to_vec(),
            validations,
            coercions,
        )
    }

    proptest! {
        /// merge(merge(A, B), C) has the same slots as merge(A, merge(B, C)).
        #[test]
        fn merge_is_associative(masks in prop::array::uniform9(0u8..16)) {
            let pool = Pool::new();
            let a = pool.bundle(masks[0], masks[1], masks[2]);
            let b = pool.bundle(masks[3], masks[4], masks[5]);
            let c = pool.bundle(masks[6], masks[7], masks[8]);
            let left = a.merge(&b).unwrap().merge(&c).unwrap();
            let right = a.merge(&b.merge(&c).unwrap()).unwrap();
            prop_assert_eq!(fingerprint(&left), fingerprint(&right));
        }

        /// Merging a bundle with itself changes nothing.
        #[test]
        fn merge_is_idempotent(formats in 0u8..16, validations in 0u8..16, coercions in 0u8..16) {
            let pool = Pool::new();
            let a = pool.bundle(formats, validations, coercions);
            prop_assert_eq!(fingerprint(&a.merge(&a).unwrap()), fingerprint(&a));
        }
    }
}
