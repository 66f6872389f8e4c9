//! # Standard Extension Bundles
//!
//! Each bundle is a self-contained [`ValidatorOptions`] value: it declares
//! every type it attaches behavior to, so any subset of bundles merges
//! cleanly.
//!
//! | Bundle | Types | Formats |
//! |--------|-------|---------|
//! | [`primitives`] | boolean, number, string, array, object, date | none |
//! | [`strings`] | string | email, uuid, uri, ipv4, ipv6, hostname |
//! | [`numbers`] | number | integer, int32, int64, float |
//! | [`dates`] | date | date-time, date |
//!
//! [`parse`] holds reusable coercions meant for instance overrides.

use serde::{Deserialize, Serialize};

use formwork_core::ConfigError;

use crate::options::ValidatorOptions;

pub mod dates;
pub mod numbers;
pub mod parse;
pub mod primitives;
pub mod strings;

/// Names of the standard bundles, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Extension {
    Core,
    StringFormats,
    NumberFormats,
    DateFormats,
}

impl Extension {
    /// Every standard bundle, in merge order.
    pub const ALL: [Extension; 4] = [
        Extension::Core,
        Extension::StringFormats,
        Extension::NumberFormats,
        Extension::DateFormats,
    ];

    /// Build this bundle.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the bundle fails its own shape check.
    pub fn bundle(self) -> Result<ValidatorOptions, ConfigError> {
        match self {
            Extension::Core => primitives::bundle(),
            Extension::StringFormats => strings::bundle(),
            Extension::NumberFormats => numbers::bundle(),
            Extension::DateFormats => dates::bundle(),
        }
    }
}

impl std::fmt::Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Extension::Core => "core",
            Extension::StringFormats => "string-formats",
            Extension::NumberFormats => "number-formats",
            Extension::DateFormats => "date-formats",
        })
    }
}

/// All standard bundles, in merge order.
///
/// # Errors
///
/// See [`Extension::bundle`].
pub fn standard() -> Result<Vec<ValidatorOptions>, ConfigError> {
    Extension::ALL.into_iter().map(Extension::bundle).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_core::ModelType;

    #[test]
    fn test_every_bundle_merges_alone() {
        for extension in Extension::ALL {
            let bundle = extension.bundle().unwrap();
            assert!(bundle.check_consistency().is_ok(), "{extension}");
        }
    }

    #[test]
    fn test_standard_registry_shape() {
        let bundles = standard().unwrap();
        let merged = ValidatorOptions::merge_all(&bundles).unwrap();
        assert_eq!(
            merged.types(),
            &[
                ModelType::Boolean,
                ModelType::Number,
                ModelType::String,
                ModelType::Array,
                ModelType::Object,
                ModelType::Date,
            ]
        );
        assert!(merged.has_format(&ModelType::String, "email"));
        assert!(merged.has_format(&ModelType::Number, "int32"));
        assert!(merged.has_format(&ModelType::Date, "date-time"));
    }

    #[test]
    fn test_extension_names() {
        let parsed: Vec<Extension> =
            serde_yaml::from_str("[core, string-formats, number-formats, date-formats]").unwrap();
        assert_eq!(parsed, Extension::ALL.to_vec());
        assert_eq!(Extension::NumberFormats.to_string(), "number-formats");
    }
}
