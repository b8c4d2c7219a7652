//! Tolerant lookup combinators for semi-structured JSON trees.
//!
//! Upstream payloads nest optional modules several levels deep, and any
//! ancestor may be absent. These combinators walk a path of object keys and
//! default instead of erroring, so field extraction stays one expression per
//! field at the call site.

use serde_json::Value;

const EMPTY_SEQ: &[Value] = &[];

/// Walk `path` through nested objects, returning the value if every
/// ancestor exists.
pub fn value_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// String at `path`, or `""` when the path or value is missing.
pub fn str_at<'a>(root: &'a Value, path: &[&str]) -> &'a str {
    value_at(root, path).and_then(Value::as_str).unwrap_or("")
}

/// Unsigned integer at `path`, if present and numeric.
pub fn u64_at(root: &Value, path: &[&str]) -> Option<u64> {
    value_at(root, path).and_then(Value::as_u64)
}

/// Array at `path`, or an empty slice when the path is missing or not an
/// array.
pub fn seq_at<'a>(root: &'a Value, path: &[&str]) -> &'a [Value] {
    value_at(root, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(EMPTY_SEQ)
}

/// Array of strings at `path`; non-string elements are skipped.
pub fn string_list_at(root: &Value, path: &[&str]) -> Vec<String> {
    seq_at(root, path)
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": "NCT01234567",
                    "briefTitle": "A Study"
                },
                "conditionsModule": {
                    "conditions": ["Melanoma", "Carcinoma", 42]
                }
            },
            "totalCount": 128
        })
    }

    #[test]
    fn test_str_at_present() {
        let v = sample();
        assert_eq!(
            str_at(&v, &["protocolSection", "identificationModule", "nctId"]),
            "NCT01234567"
        );
    }

    #[test]
    fn test_str_at_missing_ancestor() {
        let v = sample();
        assert_eq!(str_at(&v, &["protocolSection", "statusModule", "overallStatus"]), "");
    }

    #[test]
    fn test_str_at_wrong_type() {
        let v = sample();
        assert_eq!(str_at(&v, &["totalCount"]), "");
    }

    #[test]
    fn test_u64_at() {
        let v = sample();
        assert_eq!(u64_at(&v, &["totalCount"]), Some(128));
        assert_eq!(u64_at(&v, &["missing"]), None);
    }

    #[test]
    fn test_seq_at_missing_is_empty() {
        let v = sample();
        assert!(seq_at(&v, &["protocolSection", "armsInterventionsModule", "interventions"]).is_empty());
    }

    #[test]
    fn test_string_list_skips_non_strings() {
        let v = sample();
        assert_eq!(
            string_list_at(&v, &["protocolSection", "conditionsModule", "conditions"]),
            vec!["Melanoma".to_string(), "Carcinoma".to_string()]
        );
    }
}
