//! In-process filtering, sorting and paging of records.
//!
//! Used where a listing is assembled locally: admin objects fetched whole from
//! the search engine, and the in-memory backends.

use std::cmp::Ordering;

use serde_json::Value;

use super::params::{Filter, Pagination, QUERY_KEY, Record, SortDirective, SortOrder};

/// Returns `true` if any string or number in `record` contains `q`,
/// case-insensitively. Nested objects and arrays are searched too.
pub fn contains_text(record: &Record, q: &str) -> bool {
    let needle = q.to_lowercase();
    record.values().any(|value| value_contains(value, &needle))
}

/// Returns `true` if `value`, or anything nested in it, contains `q`,
/// case-insensitively.
pub fn value_contains_text(value: &Value, q: &str) -> bool {
    value_contains(value, &q.to_lowercase())
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Array(items) => items.iter().any(|item| value_contains(item, needle)),
        Value::Object(map) => map.values().any(|item| value_contains(item, needle)),
        _ => false,
    }
}

/// Returns `true` if `actual` satisfies the filter value `expected`.
///
/// - Arrays match when `actual` equals any element.
/// - Objects with `gte`/`gt`/`lte`/`lt` keys are ranges.
/// - `null` matches a missing or null field.
/// - Scalars compare loosely: `"7"` equals `7`.
pub fn value_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match expected {
        Value::Null => actual.is_none_or(Value::is_null),
        Value::Array(options) => options.iter().any(|option| value_matches(actual, option)),
        Value::Object(range) => {
            let Some(actual) = actual else {
                return false;
            };
            range.iter().all(|(op, bound)| {
                let ordering = compare_values(Some(actual), Some(bound));
                match op.as_str() {
                    "gte" => ordering != Ordering::Less,
                    "gt" => ordering == Ordering::Greater,
                    "lte" => ordering != Ordering::Greater,
                    "lt" => ordering == Ordering::Less,
                    _ => false,
                }
            })
        }
        scalar => match actual {
            Some(Value::Array(items)) => items.iter().any(|item| scalar_eq(item, scalar)),
            Some(actual) => scalar_eq(actual, scalar),
            None => false,
        },
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s == &n.to_string()
        }
        _ => a == b,
    }
}

/// Returns `true` if `record` satisfies every entry of `filter`.
///
/// The `q` key is matched with [`contains_text`]. Keys in `skip` are ignored.
pub fn record_matches(record: &Record, filter: &Filter, skip: &[&str]) -> bool {
    filter.iter().all(|(key, expected)| {
        if skip.contains(&key.as_str()) {
            return true;
        }
        if key == QUERY_KEY {
            return match expected.as_str().map(str::trim) {
                Some(q) if !q.is_empty() => contains_text(record, q),
                _ => true,
            };
        }
        value_matches(record.get(key), expected)
    })
}

/// Total order over optional JSON values: missing and null first, then
/// booleans, numbers, strings, and everything else by its JSON text.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::String(y))) => compare_numeric_text(x, y),
        (Some(Value::String(x)), Some(Value::Number(y))) => compare_numeric_text(y, x).reverse(),
        (Some(x @ (Value::Array(_) | Value::Object(_))), Some(y))
            if rank(Some(x)) == rank(Some(y)) =>
        {
            x.to_string().cmp(&y.to_string())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

fn compare_numeric_text(n: &serde_json::Number, s: &str) -> Ordering {
    match (n.as_f64(), s.parse::<f64>()) {
        (Some(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => Ordering::Less,
    }
}

/// Sorts records by one field. The sort is stable.
pub fn sort_records(records: &mut [Record], sort: &SortDirective) {
    records.sort_by(|a, b| {
        let ordering = compare_values(a.get(&sort.field), b.get(&sort.field));
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Returns one page of `records`.
pub fn paginate(records: Vec<Record>, pagination: Pagination) -> Vec<Record> {
    let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
    records
        .into_iter()
        .skip(offset)
        .take(pagination.per_page as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_contains_text_is_case_insensitive() {
        let r = record(json!({"title": "Quarterly Invoice", "tags": ["Finance"]}));
        assert!(contains_text(&r, "invoice"));
        assert!(contains_text(&r, "finance"));
        assert!(!contains_text(&r, "receipt"));
    }

    #[test]
    fn test_value_matches_shapes() {
        assert!(value_matches(Some(&json!("paid")), &json!("paid")));
        assert!(value_matches(Some(&json!(7)), &json!("7")));
        assert!(value_matches(Some(&json!("b")), &json!(["a", "b"])));
        assert!(value_matches(Some(&json!(["x", "y"])), &json!("y")));
        assert!(value_matches(Some(&json!(15)), &json!({"gte": 10, "lt": 20})));
        assert!(!value_matches(Some(&json!(20)), &json!({"gte": 10, "lt": 20})));
        assert!(value_matches(None, &json!(null)));
        assert!(!value_matches(None, &json!("paid")));
        assert!(!value_matches(Some(&json!(1)), &json!({"between": 1})));
    }

    #[test]
    fn test_record_matches_skips_keys() {
        let r = record(json!({"name": "products", "num_documents": 3}));
        let mut filter = Filter::new();
        filter.insert("q".to_string(), json!("prod"));
        filter.insert("collection".to_string(), json!("other"));
        assert!(record_matches(&r, &filter, &["collection"]));
        assert!(!record_matches(&r, &filter, &[]));
    }

    #[test]
    fn test_sort_and_paginate() {
        let mut records = vec![
            record(json!({"id": "b", "n": 2})),
            record(json!({"id": "a", "n": 10})),
            record(json!({"id": "c"})),
        ];
        sort_records(&mut records, &SortDirective::desc("n"));
        let ids: Vec<_> = records.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!("a"), json!("b"), json!("c")]);

        let page = paginate(records, Pagination::new(2, 2));
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["id"], json!("c"));
    }
}
