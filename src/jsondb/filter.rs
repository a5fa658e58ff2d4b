//! Query-string filtering of arrays.
//!
//! Query values are strings, so comparisons against JSON values are loose:
//! numbers and booleans compare by their textual form.

use serde_json::Value;

use crate::routing::Params;

/// Compare a JSON value with a raw string from the URL.
pub fn loose_eq(value: &Value, raw: &str) -> bool {
    match value {
        Value::String(text) => text == raw,
        Value::Number(number) => {
            number.to_string() == raw
                || match (number.as_f64(), raw.parse::<f64>()) {
                    (Some(left), Ok(right)) => left == right,
                    _ => false,
                }
        }
        Value::Bool(flag) => raw == if *flag { "true" } else { "false" },
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// True when `item` is an object carrying every query pair.
pub fn matches(item: &Value, query: &Params) -> bool {
    let Value::Object(fields) = item else {
        return false;
    };
    query.iter().all(|(key, expected)| {
        fields
            .get(key)
            .is_some_and(|value| loose_eq(value, expected))
    })
}

/// Elements matching every query pair.
pub fn select(items: &[Value], query: &Params) -> Vec<Value> {
    items
        .iter()
        .filter(|item| matches(item, query))
        .cloned()
        .collect()
}

/// Drop the elements matching every query pair, returning how many went.
pub fn remove_matching(items: &mut Vec<Value>, query: &Params) -> usize {
    let before = items.len();
    items.retain(|item| !matches(item, query));
    before - items.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_loose_eq() {
        assert!(loose_eq(&json!("dell"), "dell"));
        assert!(loose_eq(&json!(123), "123"));
        assert!(loose_eq(&json!(1.5), "1.50"));
        assert!(loose_eq(&json!(true), "true"));
        assert!(!loose_eq(&json!(false), "0"));
        assert!(!loose_eq(&json!(null), "null"));
        assert!(!loose_eq(&json!({"id": 1}), "1"));
    }

    #[test]
    fn test_select_requires_every_pair() {
        let items = vec![
            json!({"id": 1, "brand": "dell", "year": 2020}),
            json!({"id": 2, "brand": "dell", "year": 2021}),
            json!("not an object"),
        ];
        let selected = select(&items, &query(&[("brand", "dell"), ("year", "2021")]));
        assert_eq!(selected, vec![json!({"id": 2, "brand": "dell", "year": 2021})]);
        assert!(select(&items, &query(&[("brand", "hp")])).is_empty());
    }

    #[test]
    fn test_remove_matching() {
        let mut items = vec![json!({"brand": "dell"}), json!({"brand": "hp"}), json!(3)];
        assert_eq!(remove_matching(&mut items, &query(&[("brand", "dell")])), 1);
        assert_eq!(items, vec![json!({"brand": "hp"}), json!(3)]);
    }
}
