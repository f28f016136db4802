//! Value model for the SQL engine
//!
//! A cell is one of three cases: NULL, a double-precision number, or text.
//! Coercions between them are explicit functions on [`Value`], one per
//! context (equality, ordering, sorting, aggregation), so every rule can be
//! tested in isolation.

mod row;
mod table;

pub use row::Row;
pub use table::{Column, normalize_type};

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Largest integer an f64 carries exactly (2^53)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Unified cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

/// Hashable identity of a value, used for GROUP BY partitions and DISTINCT
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Number(u64),
    Text(String),
}

impl Value {
    /// Classify a raw literal: `NULL` keyword, a fully numeric token, or text
    pub fn from_literal(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("null") {
            Value::Null
        } else if let Some(n) = parse_number(trimmed) {
            Value::Number(n)
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view: numbers as-is, text only when it parses fully as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s),
            Value::Null => None,
        }
    }

    /// SUM/AVG coercion: anything non-numeric counts as zero
    pub fn to_number_or_zero(&self) -> f64 {
        self.as_number().filter(|n| !n.is_nan()).unwrap_or(0.0)
    }

    /// Text view used by string functions and LIKE
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Loose equality for `=`, `<>`, IN and joins.
    ///
    /// NULL is neither equal nor unequal to anything, so callers get `None`.
    /// A number and a numeric text compare numerically.
    pub fn loose_eq(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Number(a), Value::Number(b)) => Some(a == b),
            (Value::Text(a), Value::Text(b)) => Some(a == b),
            (Value::Number(n), Value::Text(s)) | (Value::Text(s), Value::Number(n)) => {
                Some(parse_number(s).map_or(false, |parsed| parsed == *n))
            }
        }
    }

    /// Ordering for `<`, `>`, `<=`, `>=` and BETWEEN.
    ///
    /// Numeric when both sides are numbers, lexical when both are text, and
    /// numeric after coercion for mixed operands. `None` means the comparison
    /// is false (NULL involved, or text that is not a number).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => {
                let a = self.as_number()?;
                let b = other.as_number()?;
                a.partial_cmp(&b)
            }
        }
    }

    /// ORDER BY comparison: NULLs before everything, numbers numerically,
    /// anything else by its text (case-folded first, then exact)
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            _ => {
                let a = self.to_text();
                let b = other.to_text();
                a.to_lowercase()
                    .cmp(&b.to_lowercase())
                    .then_with(|| a.cmp(&b))
            }
        }
    }

    /// Identity used when partitioning rows; NULLs share one key
    pub fn group_key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            // -0.0 and 0.0 group together
            Value::Number(n) if *n == 0.0 => ValueKey::Number(0f64.to_bits()),
            Value::Number(n) => ValueKey::Number(n.to_bits()),
            Value::Text(s) => ValueKey::Text(s.clone()),
        }
    }
}

/// Parse a token that is numeric in its entirety.
///
/// Accepts integers, decimals and exponents; rejects empty input and the
/// words `inf`/`nan` that `f64::from_str` would otherwise take.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let numeric_chars = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric_chars || !s.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) if n.is_nan() => write!(f, "NaN"),
            Value::Number(n) if n.is_infinite() => {
                write!(f, "{}", if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Number(n) if *n == 0.0 => write!(f, "0"),
            Value::Number(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
