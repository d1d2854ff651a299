//! Column value coercion and comparison.

use std::cmp::Ordering;

use ormgraph_model::{Column, SqlType, TypeClass};
use ormgraph_storage::{Comparator, StorageError, StorageResult};
use regex::Regex;
use serde_json::{Number, Value};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Coerces a value to the storage representation of `column`.
///
/// GraphQL `ID`s arrive as strings, so integer, float and boolean columns
/// accept their string spellings.
pub(crate) fn coerce(column: &Column, value: Value) -> StorageResult<Value> {
    if value.is_null() {
        return Ok(value);
    }

    let invalid = |value: &Value| {
        StorageError::invalid_row(format!(
            "Value {value} is not valid for column {} of type {}",
            column.name, column.sql_type
        ))
    };

    let storage_type = column.sql_type.storage_type();
    match storage_type.class() {
        Some(
            TypeClass::Int8Like
            | TypeClass::Int16Like
            | TypeClass::Int24Like
            | TypeClass::Int32Like,
        ) => as_integer(&value).map(Value::from).ok_or_else(|| invalid(&value)),
        Some(TypeClass::FloatLike) => match &value {
            Value::Number(_) => Ok(value),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid(&value)),
            _ => Err(invalid(&value)),
        },
        Some(TypeClass::BoolLike) => match &value {
            Value::Bool(_) => Ok(value),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(invalid(&value)),
            },
            Value::String(s) => match s.as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid(&value)),
            },
            _ => Err(invalid(&value)),
        },
        _ if *storage_type == SqlType::DateTime => value
            .as_str()
            .and_then(canonical_date_time)
            .map(Value::String)
            .ok_or_else(|| invalid(&value)),
        _ if *storage_type == SqlType::BigInteger => match &value {
            Value::Number(_) => Ok(value),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid(&value)),
            _ => Err(invalid(&value)),
        },
        _ => Ok(value),
    }
}

/// Normalizes a date-time to UTC with microsecond precision.
///
/// The fixed-width form makes string order equal time order. Values without
/// an offset are taken as UTC.
pub(crate) fn canonical_date_time(text: &str) -> Option<String> {
    let text = text.trim();
    let minute_offset = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][offset_hour sign:mandatory]:[offset_minute]"
    );
    let parsed = OffsetDateTime::parse(text, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(text, minute_offset))
        .or_else(|_| {
            PrimitiveDateTime::parse(
                text,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
            )
            .map(PrimitiveDateTime::assume_utc)
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                text,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            )
            .map(PrimitiveDateTime::assume_utc)
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                text,
                format_description!("[year]-[month]-[day]T[hour]:[minute]"),
            )
            .map(PrimitiveDateTime::assume_utc)
        })
        .ok()?;

    parsed
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
        ))
        .ok()
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Total order used for sorting: NULL, booleans, numbers, strings, then
/// everything else by its JSON text.
pub(crate) fn order(left: &Value, right: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => rank(left)
            .cmp(&rank(right))
            .then_with(|| left.to_string().cmp(&right.to_string())),
    }
}

fn same_kind(left: &Value, right: &Value) -> bool {
    matches!(
        (left, right),
        (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
    )
}

/// Evaluates `left <op> right` with SQL NULL semantics: any comparison
/// against NULL is false, except `IsNull`.
pub(crate) fn compare(op: Comparator, left: &Value, right: &Value) -> StorageResult<bool> {
    if op == Comparator::IsNull {
        let expected = right.as_bool().ok_or_else(|| {
            StorageError::invalid_row(format!("isNull expects a boolean, got {right}"))
        })?;
        return Ok(left.is_null() == expected);
    }
    if left.is_null() {
        return Ok(false);
    }

    let ordered = |accept: fn(Ordering) -> bool| {
        !right.is_null() && same_kind(left, right) && accept(order(left, right))
    };

    Ok(match op {
        Comparator::Eq => ordered(|o| o == Ordering::Equal),
        Comparator::Ne => !right.is_null() && order(left, right) != Ordering::Equal,
        Comparator::Gt => ordered(|o| o == Ordering::Greater),
        Comparator::Ge => ordered(|o| o != Ordering::Less),
        Comparator::Lt => ordered(|o| o == Ordering::Less),
        Comparator::Le => ordered(|o| o != Ordering::Greater),
        Comparator::In => {
            let candidates = right.as_array().ok_or_else(|| {
                StorageError::invalid_row(format!("inList expects a list, got {right}"))
            })?;
            candidates
                .iter()
                .any(|c| same_kind(left, c) && order(left, c) == Ordering::Equal)
        }
        Comparator::Like => {
            let pattern = right.as_str().ok_or_else(|| {
                StorageError::invalid_row(format!("isLike expects a string, got {right}"))
            })?;
            let text = match left {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            like_regex(pattern)?.is_match(&text)
        }
        Comparator::IsNull => false,
    })
}

/// Translates a SQL `LIKE` pattern into an anchored regex.
///
/// `%` matches any run of characters, `_` exactly one. Matching is case
/// sensitive.
pub(crate) fn like_regex(pattern: &str) -> StorageResult<Regex> {
    let mut source = String::with_capacity(pattern.len() + 2);
    source.push('^');
    let mut literal = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut literal))),
        }
    }
    source.push('$');

    Regex::new(&source)
        .map_err(|e| StorageError::invalid_row(format!("Invalid LIKE pattern '{pattern}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer_from_id_string() {
        let column = Column::new("id", SqlType::Integer).primary_key();
        assert_eq!(coerce(&column, json!("42")).unwrap(), json!(42));
        assert_eq!(coerce(&column, json!(7.0)).unwrap(), json!(7));
        assert!(coerce(&column, json!("forty")).is_err());
        assert_eq!(coerce(&column, Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_coerce_date_time_to_utc() {
        let column = Column::new("at", SqlType::DateTime);
        assert_eq!(
            coerce(&column, json!("2024-01-01T05:00:00+05:00")).unwrap(),
            json!("2024-01-01T00:00:00.000000Z")
        );
        assert_eq!(
            coerce(&column, json!("2024-06-01T12:00:00.5Z")).unwrap(),
            json!("2024-06-01T12:00:00.500000Z")
        );
        assert_eq!(
            coerce(&column, json!("2024-01-15T10:30:00")).unwrap(),
            json!("2024-01-15T10:30:00.000000Z")
        );
        assert_eq!(
            coerce(&column, json!("2024-01-01T00:00+05:00")).unwrap(),
            json!("2023-12-31T19:00:00.000000Z")
        );
        assert!(coerce(&column, json!("yesterday")).is_err());
        assert!(coerce(&column, json!(17)).is_err());
    }

    #[test]
    fn test_compare_date_times_across_offsets() {
        let column = Column::new("at", SqlType::DateTime);
        let at = |s: &str| coerce(&column, json!(s)).unwrap();

        // 20:00Z on Dec 31 is 01:00 on Jan 1 at +05:00.
        let new_year = at("2024-01-01T00:00+05:00");
        assert!(compare(Comparator::Gt, &at("2023-12-31T20:00:00Z"), &new_year).unwrap());
        let noon = at("2024-06-01T12:00:00Z");
        assert!(compare(Comparator::Gt, &at("2024-06-01T12:00:00.5Z"), &noon).unwrap());
        assert!(
            compare(
                Comparator::In,
                &at("2024-06-01T14:00:00+02:00"),
                &json!([at("2024-06-01T12:00:00Z")])
            )
            .unwrap()
        );
        assert_eq!(
            order(&at("2024-06-01T12:00:00Z"), &at("2024-06-01T12:00:00.000001Z")),
            Ordering::Less
        );
    }

    #[test]
    fn test_coerce_boolean() {
        let column = Column::new("active", SqlType::Bit);
        assert_eq!(coerce(&column, json!(1)).unwrap(), json!(true));
        assert_eq!(coerce(&column, json!("false")).unwrap(), json!(false));
    }

    #[test]
    fn test_compare_null_semantics() {
        assert!(!compare(Comparator::Eq, &Value::Null, &Value::Null).unwrap());
        assert!(!compare(Comparator::Ne, &Value::Null, &json!(1)).unwrap());
        assert!(compare(Comparator::IsNull, &Value::Null, &json!(true)).unwrap());
        assert!(compare(Comparator::IsNull, &json!(3), &json!(false)).unwrap());
    }

    #[test]
    fn test_compare_ordering() {
        assert!(compare(Comparator::Gt, &json!(5), &json!(3)).unwrap());
        assert!(compare(Comparator::Le, &json!(3), &json!(3)).unwrap());
        assert!(compare(Comparator::Lt, &json!("apple"), &json!("banana")).unwrap());
        assert!(!compare(Comparator::Gt, &json!("5"), &json!(3)).unwrap());
        assert!(compare(Comparator::In, &json!(2), &json!([1, 2, 3])).unwrap());
        assert!(compare(Comparator::Eq, &json!(1.5), &json!(1.5)).unwrap());
    }

    #[test]
    fn test_like() {
        assert!(compare(Comparator::Like, &json!("Alice"), &json!("A%")).unwrap());
        assert!(compare(Comparator::Like, &json!("Bob"), &json!("B_b")).unwrap());
        assert!(!compare(Comparator::Like, &json!("alice"), &json!("A%")).unwrap());
        assert!(compare(Comparator::Like, &json!("a.c"), &json!("a.c")).unwrap());
        assert!(!compare(Comparator::Like, &json!("abc"), &json!("a.c")).unwrap());
    }
}
