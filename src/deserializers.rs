//! Custom deserializers for flexible survey parsing.
//!
//! Survey answers arrive from forms and JSON clients, so a Likert value may be
//! a JSON number or a numeric string.

use serde::{Deserialize, Deserializer};

/// Deserializes an optional number that may also be sent as a string.
///
/// # Accepted Formats
///
/// * **Numeric**: any finite JSON number, e.g. `4` or `2.5`
/// * **String numeric**: `"4"` → 4.0 (surrounding whitespace ignored)
/// * **Absent**: `null` or `""` → `None` (the caller applies its neutral default)
///
/// # Examples
///
/// ```json
/// { "hyperfocus": 5 }
/// { "hyperfocus": "5" }
/// { "hyperfocus": null }
/// ```
///
/// # Errors
///
/// Returns an error if a string cannot be parsed as a number or the value is
/// not finite. Range is not checked: out-of-range answers flow
/// through to the scorer, which clamps its outputs.
pub fn de_option_f64_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let opt = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(v) = opt else { return Ok(None) };
    let val = match v {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("invalid numeric survey value"))?,
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>().map_err(|_| {
                D::Error::custom(format!("survey value '{}' is not a number", s))
            })?
        }
        serde_json::Value::Bool(_) => {
            return Err(D::Error::custom("survey value must be a number, got bool"));
        }
        _ => {
            return Err(D::Error::custom(
                "survey value must be a number or numeric string",
            ));
        }
    };
    if !val.is_finite() {
        return Err(D::Error::custom("survey value must be finite"));
    }
    Ok(Some(val))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "de_option_f64_lenient")]
        v: Option<f64>,
    }

    fn parse(json: &str) -> Result<Option<f64>, serde_json::Error> {
        serde_json::from_str::<Probe>(json).map(|p| p.v)
    }

    #[test]
    fn test_numbers_and_strings() {
        assert_eq!(parse(r#"{"v": 4}"#).unwrap(), Some(4.0));
        assert_eq!(parse(r#"{"v": 2.5}"#).unwrap(), Some(2.5));
        assert_eq!(parse(r#"{"v": " 5 "}"#).unwrap(), Some(5.0));
        assert_eq!(parse(r#"{"v": -50}"#).unwrap(), Some(-50.0));
    }

    #[test]
    fn test_absent_forms() {
        assert_eq!(parse(r#"{}"#).unwrap(), None);
        assert_eq!(parse(r#"{"v": null}"#).unwrap(), None);
        assert_eq!(parse(r#"{"v": ""}"#).unwrap(), None);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse(r#"{"v": "lots"}"#).is_err());
        assert!(parse(r#"{"v": true}"#).is_err());
        assert!(parse(r#"{"v": [1]}"#).is_err());
    }
}
