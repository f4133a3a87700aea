//! Helpers over the JSON projection of an entity.
//!
//! The in-memory backends sort and match against entities through their
//! serialized form, the same projection the index mirror stores. Keeping
//! the field access and ordering rules here means the memory record
//! store and the memory search index paginate identically.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use crate::page::{SortClause, SortDirection};

/// Look up a field in a JSON object, following `.`-separated segments
/// (`user.login`).
#[must_use]
pub fn field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Total order over JSON scalars: null < bool < number < string; arrays
/// and objects compare as unordered (equal) since they are not sortable
/// fields.
#[must_use]
pub fn compare(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Sort rows by the given clauses, evaluated over each row's JSON
/// projection. With no clauses the input order is kept; the sort is
/// stable, so equal keys keep their relative order.
#[must_use]
pub fn sort_rows<E: Serialize>(rows: Vec<E>, clauses: &[SortClause]) -> Vec<E> {
    if clauses.is_empty() {
        return rows;
    }
    let mut keyed: Vec<(Value, E)> = rows
        .into_iter()
        .map(|row| (serde_json::to_value(&row).unwrap_or(Value::Null), row))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare_by_clauses(a, b, clauses));
    keyed.into_iter().map(|(_, row)| row).collect()
}

/// Compare two projections by successive sort clauses.
#[must_use]
pub fn compare_by_clauses(a: &Value, b: &Value, clauses: &[SortClause]) -> Ordering {
    for clause in clauses {
        let null = Value::Null;
        let av = field(a, &clause.field).unwrap_or(&null);
        let bv = field(b, &clause.field).unwrap_or(&null);
        let ord = match clause.direction {
            SortDirection::Asc => compare(av, bv),
            SortDirection::Desc => compare(bv, av),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_follows_dotted_paths() {
        let v = json!({"user": {"login": "alice"}});
        assert_eq!(field(&v, "user.login"), Some(&json!("alice")));
        assert_eq!(field(&v, "user.missing"), None);
    }

    #[test]
    fn numbers_and_strings_order() {
        assert_eq!(compare(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(compare(&json!("a"), &json!("b")), Ordering::Less);
        assert_eq!(compare(&json!(null), &json!(0)), Ordering::Less);
    }

    #[test]
    fn sort_rows_applies_direction_and_is_stable() {
        let rows = vec![
            json!({"n": 2, "tie": 1}),
            json!({"n": 1, "tie": 1}),
            json!({"n": 2, "tie": 0}),
        ];
        let rows = sort_rows(rows, &[SortClause::desc("n")]);
        assert_eq!(rows[0]["tie"], json!(1), "equal keys keep input order");
        assert_eq!(rows[1]["tie"], json!(0));
        assert_eq!(rows[2]["n"], json!(1));
    }
}
