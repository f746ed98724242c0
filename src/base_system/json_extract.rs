//! Loosely typed JSON field pickers.
//!
//! Catalog documents carry optional fields of unknown presence and shape. These
//! helpers read one field at a time and return `None` / an empty `Vec` whenever
//! the value is missing or has an unexpected shape, instead of failing the
//! whole document.

use serde_json::Value;

pub type JsonMap = serde_json::Map<String, Value>;

/// Non-empty string. Numbers are stringified, everything else is absent.
pub fn pick_string(map: &JsonMap, key: &str) -> Option<String> {
    let val = map.get(key)?;
    if let Some(s) = val.as_str() {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        return Some(trimmed.to_string());
    }
    if let Some(n) = val.as_i64() {
        return Some(n.to_string());
    }
    if let Some(n) = val.as_u64() {
        return Some(n.to_string());
    }
    if let Some(n) = val.as_f64()
        && n.is_finite()
    {
        return Some(n.to_string());
    }
    None
}

/// String entries of an array, in order. Non-string and blank entries are skipped.
pub fn pick_string_list(map: &JsonMap, key: &str) -> Vec<String> {
    let Some(arr) = map.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Integer field; numeric strings are accepted, fractional numbers are truncated.
pub fn pick_i64(map: &JsonMap, key: &str) -> Option<i64> {
    let val = map.get(key)?;
    if let Some(n) = val.as_i64() {
        return Some(n);
    }
    if let Some(n) = val.as_f64()
        && n.is_finite()
        && n.abs() < i64::MAX as f64
    {
        return Some(n as i64);
    }
    val.as_str().and_then(|s| s.trim().parse::<i64>().ok())
}

/// Finite float field; numeric strings are accepted.
pub fn pick_f64(map: &JsonMap, key: &str) -> Option<f64> {
    let val = map.get(key)?;
    let n = match val.as_f64() {
        Some(n) => n,
        None => val.as_str()?.trim().parse::<f64>().ok()?,
    };
    n.is_finite().then_some(n)
}

/// Like [`pick_i64`], but zero and negative values count as absent.
pub fn pick_positive(map: &JsonMap, key: &str) -> Option<u64> {
    pick_i64(map, key)
        .filter(|n| *n > 0)
        .and_then(|n| u64::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn pick_string_trims_and_skips_blank() {
        let m = map(json!({"a": "  Dune ", "b": "   ", "c": 42, "d": null, "e": [1]}));
        assert_eq!(pick_string(&m, "a").as_deref(), Some("Dune"));
        assert_eq!(pick_string(&m, "b"), None);
        assert_eq!(pick_string(&m, "c").as_deref(), Some("42"));
        assert_eq!(pick_string(&m, "d"), None);
        assert_eq!(pick_string(&m, "e"), None);
        assert_eq!(pick_string(&m, "missing"), None);
    }

    #[test]
    fn pick_string_list_keeps_order_and_drops_junk() {
        let m = map(json!({"names": ["Terry Pratchett", 7, "", "Neil Gaiman", null]}));
        assert_eq!(
            pick_string_list(&m, "names"),
            vec!["Terry Pratchett".to_string(), "Neil Gaiman".to_string()]
        );
        let m = map(json!({"names": "not a list"}));
        assert!(pick_string_list(&m, "names").is_empty());
    }

    #[test]
    fn pick_numbers_accept_numeric_strings() {
        let m = map(json!({"year": "1965", "pages": 412.0, "rating": "4.25", "bad": "soon"}));
        assert_eq!(pick_i64(&m, "year"), Some(1965));
        assert_eq!(pick_i64(&m, "pages"), Some(412));
        assert_eq!(pick_f64(&m, "rating"), Some(4.25));
        assert_eq!(pick_i64(&m, "bad"), None);
        assert_eq!(pick_f64(&m, "bad"), None);
    }

    #[test]
    fn pick_positive_treats_zero_as_absent() {
        let m = map(json!({"zero": 0, "neg": -3, "id": 8231856}));
        assert_eq!(pick_positive(&m, "zero"), None);
        assert_eq!(pick_positive(&m, "neg"), None);
        assert_eq!(pick_positive(&m, "id"), Some(8231856));
    }
}
