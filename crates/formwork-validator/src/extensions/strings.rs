//! # String Formats
//!
//! Formats of the `string` type. Each format adds one validation; `uuid`
//! also canonicalizes its input to the lowercase hyphenated form unless the
//! model is strict.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use formwork_core::{AssertionFailure, ConfigError, FormatKey, ModelType, Phase};
use formwork_model::hooks::{self, Validation};
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use super::primitives;
use crate::options::ValidatorOptions;

pub const EMAIL: &str = "email";
pub const UUID: &str = "uuid";
pub const URI: &str = "uri";
pub const IPV4: &str = "ipv4";
pub const IPV6: &str = "ipv6";
pub const HOSTNAME: &str = "hostname";

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Reject strings `accepts` does not accept as `format`.
pub(crate) fn format_check<F>(format: &'static str, accepts: F) -> Arc<dyn Validation>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    hooks::validation(move |value, _spec| match value.as_str() {
        Some(text) if accepts(text) => Ok(()),
        _ => Err(AssertionFailure::invalid_format(format, value).into()),
    })
}

/// Build the string-formats bundle.
///
/// # Errors
///
/// Returns `ConfigError::InvalidPattern` if the e-mail pattern fails to
/// compile.
pub fn bundle() -> Result<ValidatorOptions, ConfigError> {
    let email = Regex::new(EMAIL_PATTERN).map_err(|e| ConfigError::InvalidPattern {
        pattern: EMAIL_PATTERN.to_string(),
        reason: e.to_string(),
    })?;

    let ty = ModelType::String;
    ValidatorOptions::builder()
        .declare_type(ty.clone(), primitives::handler(&ty))
        .declare_formats(ty.clone(), [EMAIL, UUID, URI, IPV4, IPV6, HOSTNAME])
        .validate(
            ty.clone(),
            FormatKey::named(EMAIL),
            format_check(EMAIL, move |s| email.is_match(s)),
        )
        .coerce(
            ty.clone(),
            FormatKey::named(UUID),
            Phase::CoerceType,
            hooks::coercion(|result, spec| {
                if spec.is_strict() {
                    return Ok(());
                }
                let canonical = result
                    .value()
                    .and_then(Value::as_str)
                    .and_then(|s| Uuid::parse_str(s.trim()).ok())
                    .map(|u| u.hyphenated().to_string());
                if let Some(canonical) = canonical {
                    result.set_value(Some(Value::String(canonical)));
                }
                Ok(())
            }),
        )
        .validate(
            ty.clone(),
            FormatKey::named(UUID),
            format_check(UUID, |s| Uuid::parse_str(s).is_ok()),
        )
        .validate(
            ty.clone(),
            FormatKey::named(URI),
            format_check(URI, |s| url::Url::parse(s).is_ok()),
        )
        .validate(
            ty.clone(),
            FormatKey::named(IPV4),
            format_check(IPV4, |s| s.parse::<Ipv4Addr>().is_ok()),
        )
        .validate(
            ty.clone(),
            FormatKey::named(IPV6),
            format_check(IPV6, |s| s.parse::<Ipv6Addr>().is_ok()),
        )
        .validate(ty, FormatKey::named(HOSTNAME), format_check(HOSTNAME, is_hostname))
        .build()
}

/// RFC 1123 host name: dot-separated labels of letters, digits and inner
/// hyphens, each 1–63 bytes, 253 bytes in total.
fn is_hostname(text: &str) -> bool {
    let text = text.strip_suffix('.').unwrap_or(text);
    if text.is_empty() || text.len() > 253 {
        return false;
    }
    text.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;
    use formwork_core::FailureKind;
    use formwork_model::ModelSpec;
    use serde_json::json;

    fn options() -> ValidatorOptions {
        ValidatorOptions::merge_all(&[primitives::bundle().unwrap(), bundle().unwrap()]).unwrap()
    }

    fn outcome(format: &str, input: Value) -> (bool, Option<Value>) {
        let options = options();
        let spec = ModelSpec::string().with_format(format);
        let result = Validator::new(&spec, &options)
            .unwrap()
            .validate(Some(input))
            .unwrap();
        (result.conforms(), result.value().cloned())
    }

    #[test]
    fn test_email() {
        assert!(outcome(EMAIL, json!("ada@example.org")).0);
        assert!(!outcome(EMAIL, json!("ada@localhost")).0);
        assert!(!outcome(EMAIL, json!("not an email")).0);
    }

    #[test]
    fn test_uuid_canonicalized() {
        let (conforms, value) = outcome(UUID, json!("{67E55044-10B1-426F-9247-BB680E5FE0C8}"));
        assert!(conforms);
        assert_eq!(value, Some(json!("67e55044-10b1-426f-9247-bb680e5fe0c8")));
        assert!(!outcome(UUID, json!("67e55044")).0);
    }

    #[test]
    fn test_uuid_strict_keeps_input() {
        let options = options();
        let spec = ModelSpec::string().with_format(UUID).strict();
        let input = json!("67E55044-10B1-426F-9247-BB680E5FE0C8");
        let result = Validator::new(&spec, &options)
            .unwrap()
            .validate(Some(input.clone()))
            .unwrap();
        assert!(result.conforms());
        assert_eq!(result.value(), Some(&input));
    }

    #[test]
    fn test_uri() {
        assert!(outcome(URI, json!("https://example.org/a?b=c")).0);
        assert!(!outcome(URI, json!("example.org")).0);
    }

    #[test]
    fn test_ip_addresses() {
        assert!(outcome(IPV4, json!("192.168.0.1")).0);
        assert!(!outcome(IPV4, json!("256.0.0.1")).0);
        assert!(outcome(IPV6, json!("::1")).0);
        assert!(!outcome(IPV6, json!("192.168.0.1")).0);
    }

    #[test]
    fn test_hostname() {
        assert!(is_hostname("example.org"));
        assert!(is_hostname("a-b.example.org."));
        assert!(!is_hostname("-a.example.org"));
        assert!(!is_hostname("a..b"));
        assert!(!is_hostname(&"a".repeat(64)));
    }

    #[test]
    fn test_invalid_format_violation() {
        let options = options();
        let spec = ModelSpec::string().with_format(IPV4);
        let result = Validator::new(&spec, &options)
            .unwrap()
            .validate(Some(json!("x")))
            .unwrap();
        let violation = &result.errors()[0];
        assert_eq!(violation.kind, FailureKind::InvalidFormat);
        assert_eq!(violation.message, "value is not a valid ipv4");
        assert_eq!(violation.expected, Some(json!("ipv4")));
    }

    #[test]
    fn test_format_applies_after_core_coercion() {
        let (conforms, value) = outcome(IPV4, json!(7));
        assert!(!conforms);
        assert_eq!(value, Some(json!("7")));
    }
}
