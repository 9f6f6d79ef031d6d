//! Total conversion of JSON values to declared attribute types.
//!
//! Every value converts to every type. Numbers that cannot be represented
//! (NaN, infinities) become `null`, and `null` stays `null` for numeric types.

use crate::attribute::AttributeType;
use serde_json::{Map, Number, Value};
use std::sync::LazyLock;

use regex::Regex;

static NUMERIC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("Invalid numeric regex")
});

/// Converts `value` to `kind`.
///
/// # Example
/// ```
/// use serde_json::json;
/// use block_model::{AttributeType, coerce};
///
/// assert_eq!(coerce(json!("42"), AttributeType::Number), json!(42));
/// assert_eq!(coerce(json!(0), AttributeType::Boolean), json!(false));
/// assert_eq!(coerce(json!([1, "a"]), AttributeType::String), json!("1,a"));
/// ```
pub fn coerce(value: Value, kind: AttributeType) -> Value {
    match kind {
        AttributeType::String => match value {
            Value::String(_) => value,
            other => Value::String(stringify(&other)),
        },
        AttributeType::Boolean => Value::Bool(is_truthy(&value)),
        AttributeType::Integer | AttributeType::Number => match value {
            Value::Number(_) | Value::Null => value,
            other => number_value(to_number(&other)),
        },
        AttributeType::Null => Value::Null,
        AttributeType::Array => match value {
            Value::Array(_) => value,
            Value::String(s) => Value::Array(s.chars().map(|c| Value::String(c.into())).collect()),
            _ => Value::Array(Vec::new()),
        },
        AttributeType::Object => match value {
            Value::Object(_) | Value::Array(_) => value,
            _ => Value::Object(Map::new()),
        },
    }
}

/// Whether `value` already has the shape of `kind`.
pub fn is_of_type(value: &Value, kind: AttributeType) -> bool {
    match kind {
        AttributeType::String => value.is_string(),
        AttributeType::Boolean => value.is_boolean(),
        AttributeType::Integer => value.as_f64().is_some_and(|n| n.fract() == 0.0),
        AttributeType::Number => value.is_number(),
        AttributeType::Null => value.is_null(),
        AttributeType::Array => value.is_array(),
        AttributeType::Object => value.is_object(),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => stringify(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_number(s),
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => match single {
                Value::Array(_) | Value::Object(_) => to_number(&Value::String(stringify(single))),
                other => to_number(other),
            },
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if NUMERIC_REGEX.is_match(trimmed) {
        return trimmed.parse().unwrap_or(f64::NAN);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => f64::NAN,
    }
}

fn number_value(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}
