//! Optional-path helpers over loosely typed carrier JSON.
//!
//! Carrier payloads mix numbers and numeric strings, nest equivalent fields
//! under different parents and omit absent fields entirely. Every accessor
//! here tolerates all three and reports absence as `None`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Walks a dotted path (`"Costs.TotalCharges"`) through nested objects.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
        .filter(|found| !found.is_null())
}

/// First path that resolves to a non-null value.
pub fn first_present<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| lookup(value, path))
}

/// Interprets a JSON number or numeric string as a finite `f64`.
pub fn as_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_numeric_text(text),
        _ => None,
    };
    parsed.filter(|number| number.is_finite())
}

pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim().trim_start_matches('$').replace(',', "");
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Interprets strings, numbers and booleans as text; empty strings count as absent.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "y" | "yes" | "1" => Some(true),
            "false" | "n" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

pub fn number_at(value: &Value, paths: &[&str]) -> Option<f64> {
    paths
        .iter()
        .find_map(|path| lookup(value, path).and_then(as_number))
}

pub fn text_at(value: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| lookup(value, path).and_then(as_text))
}

pub fn bool_at(value: &Value, paths: &[&str]) -> Option<bool> {
    paths
        .iter()
        .find_map(|path| lookup(value, path).and_then(as_bool))
}

/// Accepts a single object or an array of objects and always yields a list.
pub fn one_or_many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    }
}

/// Serde helper: strings, numbers, booleans and `null` all deserialize into a `String`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_text(&value).unwrap_or_default())
}

/// Serde helper for optional text fields with the same leniency as [`lenient_string`].
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_text(&value))
}

/// Serde helper for optional whole-number codes sent as numbers or numeric strings.
///
/// `null` and blank text are absent; anything else that is not a whole number
/// within `u32` fails deserialization.
pub fn lenient_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => return Ok(None),
        Value::String(text) if text.trim().is_empty() => return Ok(None),
        _ => {}
    }

    as_number(&value)
        .filter(|number| {
            number.fract() == 0.0 && *number >= 0.0 && *number <= f64::from(u32::MAX)
        })
        .map(|number| Some(number as u32))
        .ok_or_else(|| serde::de::Error::custom(format!("expected a whole number, found {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_walks_nested_objects_and_skips_nulls() {
        let payload = json!({"Costs": {"TotalCharges": "12.50", "Fuel": null}});
        assert_eq!(number_at(&payload, &["TotalCharges", "Costs.TotalCharges"]), Some(12.5));
        assert_eq!(lookup(&payload, "Costs.Fuel"), None);
        assert_eq!(lookup(&payload, "Costs.Missing.Deeper"), None);
    }

    #[test]
    fn numeric_text_tolerates_currency_formatting() {
        assert_eq!(parse_numeric_text(" $1,204.75 "), Some(1204.75));
        assert_eq!(parse_numeric_text("abc"), None);
        assert_eq!(parse_numeric_text(""), None);
    }

    #[test]
    fn one_or_many_normalizes_single_objects() {
        let single = json!({"Charge": 5});
        let many = json!([{"Charge": 5}, {"Charge": 6}]);
        assert_eq!(one_or_many(Some(&single)).len(), 1);
        assert_eq!(one_or_many(Some(&many)).len(), 2);
        assert!(one_or_many(None).is_empty());
    }

    #[test]
    fn bool_accepts_carrier_flag_spellings() {
        assert_eq!(as_bool(&json!("Y")), Some(true));
        assert_eq!(as_bool(&json!("N")), Some(false));
        assert_eq!(as_bool(&json!(true)), Some(true));
        assert_eq!(as_bool(&json!("maybe")), None);
    }
}
