//! # JSON Value Helpers
//!
//! Small utilities over `serde_json::Value` shared by coercions and
//! validations: runtime kind names, numeric extraction, integral-preserving
//! number construction, and the loose equality used by literal enums.

use std::fmt;

use serde_json::{Number, Value};

/// Runtime kind of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Boolean,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JsonKind::Null => "null",
            JsonKind::Boolean => "boolean",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        })
    }
}

/// Build a JSON number from an `f64`, keeping integral values integral.
///
/// `10.0` becomes `10`, so that `"10"` coerced to a number and `10` parsed
/// from JSON compare equal. Non-finite input becomes `null`.
pub fn number_value(n: f64) -> Value {
    // 2^63 is the first integral f64 an i64 cannot hold.
    if n.fract() == 0.0 && n >= -9_223_372_036_854_775_808.0 && n < 9_223_372_036_854_775_808.0 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Equality that compares numbers by numeric value.
///
/// `serde_json` treats `1` and `1.0` as different values; literal enum
/// membership should not. Two integers compare exactly; only a float on
/// either side moves the comparison to `f64`.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                x.as_f64() == y.as_f64()
            } else {
                x == y
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| loose_eq(x, y)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names() {
        assert_eq!(JsonKind::of(&json!(null)).to_string(), "null");
        assert_eq!(JsonKind::of(&json!([1])).to_string(), "array");
        assert_eq!(JsonKind::of(&json!({})), JsonKind::Object);
    }

    #[test]
    fn test_number_value_keeps_integers_integral() {
        assert_eq!(number_value(42.0), json!(42));
        assert_eq!(number_value(-3.0), json!(-3));
        assert_eq!(number_value(1.5), json!(1.5));
        assert_eq!(number_value(f64::NAN), Value::Null);
    }

    #[test]
    fn test_number_value_does_not_saturate_at_two_pow_63() {
        let two_pow_63 = 9_223_372_036_854_775_808.0_f64;
        let value = number_value(two_pow_63);
        assert!(value.is_f64());
        assert_eq!(value.as_f64(), Some(two_pow_63));
        assert_eq!(number_value(-two_pow_63), json!(i64::MIN));
    }

    #[test]
    fn test_loose_eq_numbers() {
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(!loose_eq(&json!(1), &json!(2)));
        assert!(!loose_eq(&json!(1), &json!("1")));
    }

    #[test]
    fn test_loose_eq_large_integers_are_exact() {
        assert!(!loose_eq(&json!(9_007_199_254_740_993_u64), &json!(9_007_199_254_740_992_u64)));
        assert!(loose_eq(&json!(9_007_199_254_740_993_u64), &json!(9_007_199_254_740_993_i64)));
        assert!(!loose_eq(&json!(u64::MAX), &json!(u64::MAX - 1)));
        assert!(!loose_eq(&json!(-1), &json!(u64::MAX)));
    }

    #[test]
    fn test_loose_eq_nested() {
        assert!(loose_eq(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!loose_eq(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            (-1.0e9f64..1.0e9).prop_map(number_value),
            "[a-z0-9]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// Loose equality is reflexive.
        #[test]
        fn loose_eq_reflexive(value in json_value()) {
            prop_assert!(loose_eq(&value, &value));
        }

        /// Loose equality is symmetric.
        #[test]
        fn loose_eq_symmetric(a in json_value(), b in json_value()) {
            prop_assert_eq!(loose_eq(&a, &b), loose_eq(&b, &a));
        }

        /// Integral floats become integers equal to their source.
        #[test]
        fn number_value_integral(n in any::<i32>()) {
            prop_assert_eq!(number_value(f64::from(n)), Value::from(n));
        }
    }
}
