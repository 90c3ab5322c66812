//! Shared field-extraction helpers for upstream JSON responses.
//!
//! The provider is loose with types — numbers arrive as numbers or as
//! numeric strings depending on the endpoint — so the lenient helpers
//! accept both. The `required_*` variants produce a
//! [`ProviderError::Parse`] naming the missing field.

use serde_json::Value;

use crate::ProviderError;

/// Reads a number that may be encoded as a JSON number or a numeric
/// string.
#[must_use]
pub fn num_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Reads a non-negative integer that may be encoded as a JSON number or
/// a numeric string.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn num_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<u64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        }
        _ => None,
    }
}

/// Reads a value as a string, stringifying bare numbers (identifiers
/// are sometimes numeric in one endpoint and strings in another).
#[must_use]
pub fn string_like(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extracts a required string field from an object.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] naming the field when it is absent
/// or not string-like.
pub fn required_string(object: &Value, field: &str) -> Result<String, ProviderError> {
    string_like(&object[field]).ok_or_else(|| ProviderError::Parse {
        message: format!("missing field `{field}`"),
    })
}

/// Extracts a required numeric field from an object.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] naming the field when it is absent
/// or not numeric.
pub fn required_f64(object: &Value, field: &str) -> Result<f64, ProviderError> {
    num_f64(&object[field]).ok_or_else(|| ProviderError::Parse {
        message: format!("missing field `{field}`"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_numbers_and_numeric_strings() {
        assert_eq!(num_f64(&json!(37.5)), Some(37.5));
        assert_eq!(num_f64(&json!("37.5")), Some(37.5));
        assert_eq!(num_f64(&json!(" 37.5 ")), Some(37.5));
        assert_eq!(num_f64(&json!(null)), None);
        assert_eq!(num_f64(&json!("abc")), None);
    }

    #[test]
    fn reads_integers_with_float_fallback() {
        assert_eq!(num_u64(&json!(2650)), Some(2650));
        assert_eq!(num_u64(&json!("2650")), Some(2650));
        assert_eq!(num_u64(&json!(2650.0)), Some(2650));
        assert_eq!(num_u64(&json!(-1)), None);
    }

    #[test]
    fn string_like_stringifies_numbers() {
        assert_eq!(string_like(&json!("1168010600")), Some("1168010600".into()));
        assert_eq!(string_like(&json!(1_168_010_600_u64)), Some("1168010600".into()));
        assert_eq!(string_like(&json!([])), None);
    }

    #[test]
    fn required_fields_name_the_missing_field() {
        let object = json!({ "present": "x" });
        let err = required_string(&object, "absent").unwrap_err();
        assert!(err.to_string().contains("absent"));
    }
}
