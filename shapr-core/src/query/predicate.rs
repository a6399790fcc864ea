//! Predicate tree consumed by the document store.
//!
//! This is the target of the query translator: a composed tree the engine
//! evaluates against documents. Dotted field paths are pre-split into
//! segments; `Like` patterns use `%`/`_` wildcards with `\` escapes and
//! match case-insensitively.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Comparison operator for ordered predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Ge,
    Lt,
    Le,
}

/// One sort key; fields are applied in listed sequence (stable multi-key
/// sort).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub descending: bool,
}

/// Composed predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Eq { path: Vec<String>, value: Value },
    Like { path: Vec<String>, pattern: String },
    NumberCmp { path: Vec<String>, op: CmpOp, operand: f64 },
    InstantCmp { path: Vec<String>, op: CmpOp, operand: DateTime<Utc> },
    In { path: Vec<String>, values: Vec<Value> },
    IsNull { path: Vec<String> },
    NotNull { path: Vec<String> },
}

impl Predicate {
    /// Evaluate against a document. Missing paths behave as null.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Predicate::And(children) => children.iter().all(|child| child.matches(doc)),
            Predicate::Or(children) => children.iter().any(|child| child.matches(doc)),
            Predicate::Not(inner) => !inner.matches(doc),
            Predicate::Eq { path, value } => {
                resolve_path(doc, path).map(|found| value_eq(found, value)).unwrap_or(false)
            }
            Predicate::Like { path, pattern } => resolve_path(doc, path)
                .and_then(Value::as_str)
                .map(|text| like_match(pattern, text))
                .unwrap_or(false),
            Predicate::NumberCmp { path, op, operand } => resolve_path(doc, path)
                .and_then(Value::as_f64)
                .map(|found| compare(*op, found, *operand))
                .unwrap_or(false),
            Predicate::InstantCmp { path, op, operand } => resolve_path(doc, path)
                .and_then(value_as_instant)
                .map(|found| compare_instants(*op, found, *operand))
                .unwrap_or(false),
            Predicate::In { path, values } => resolve_path(doc, path)
                .map(|found| values.iter().any(|candidate| value_eq(found, candidate)))
                .unwrap_or(false),
            Predicate::IsNull { path } => {
                resolve_path(doc, path).map(Value::is_null).unwrap_or(true)
            }
            Predicate::NotNull { path } => {
                resolve_path(doc, path).map(|found| !found.is_null()).unwrap_or(false)
            }
        }
    }
}

/// Navigate a document along path segments, traversing nested objects for
/// relationship paths.
pub fn resolve_path<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Equality with numeric normalization: `1` and `1.0` compare equal.
pub fn value_eq(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn compare(op: CmpOp, left: f64, right: f64) -> bool {
    match op {
        CmpOp::Gt => left > right,
        CmpOp::Ge => left >= right,
        CmpOp::Lt => left < right,
        CmpOp::Le => left <= right,
    }
}

fn compare_instants(op: CmpOp, left: DateTime<Utc>, right: DateTime<Utc>) -> bool {
    match op {
        CmpOp::Gt => left > right,
        CmpOp::Ge => left >= right,
        CmpOp::Lt => left < right,
        CmpOp::Le => left <= right,
    }
}

/// Interpret a stored value as an instant: RFC 3339 strings and
/// epoch-millisecond numbers both qualify.
pub fn value_as_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64))
            .and_then(|millis| DateTime::<Utc>::from_timestamp_millis(millis)),
        _ => None,
    }
}

/// Escape the engine's wildcard/escape metacharacters in a literal before it
/// is embedded in a like pattern.
pub fn escape_like(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for ch in literal.chars() {
        if ch == '\\' || ch == '%' || ch == '_' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Case-insensitive like matching: `%` matches any run, `_` one character,
/// `\` escapes the next pattern character.
pub fn like_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();
    match_at(&pattern, 0, &text, 0)
}

fn match_at(pattern: &[char], pi: usize, text: &[char], ti: usize) -> bool {
    if pi == pattern.len() {
        return ti == text.len();
    }
    match pattern[pi] {
        '%' => (ti..=text.len()).any(|next| match_at(pattern, pi + 1, text, next)),
        '\\' if pi + 1 < pattern.len() => {
            ti < text.len() && text[ti] == pattern[pi + 1] && match_at(pattern, pi + 2, text, ti + 1)
        }
        '_' => ti < text.len() && match_at(pattern, pi + 1, text, ti + 1),
        ch => ti < text.len() && text[ti] == ch && match_at(pattern, pi + 1, text, ti + 1),
    }
}

/// Compare two JSON values for sorting: nulls first, then numbers, strings,
/// booleans; mixed kinds fall back to a stable kind ordering.
pub fn compare_values(left: &Value, right: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    fn kind_rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => kind_rank(left).cmp(&kind_rank(right)),
    }
}
