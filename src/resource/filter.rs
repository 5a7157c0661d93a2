//! Typed filter predicates
//!
//! A predicate is an equality check on one JSON field of a decoded item. The
//! same predicate list renders the server-side `filter` expression and
//! re-checks every item locally, since the API silently ignores clauses it
//! does not support.

use super::fetcher::extract_json_value;
use serde_json::Value;
use std::fmt;

/// Right-hand side of a predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Str(String),
    Bool(bool),
}

impl FilterValue {
    /// Raw form for a query parameter
    pub fn to_param(&self) -> String {
        match self {
            FilterValue::Str(s) => s.clone(),
            FilterValue::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for FilterValue {
    /// Filter-expression literal: quoted and escaped strings, bare booleans
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Str(s) => write!(f, "\"{}\"", escape(s)),
            FilterValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// `field = value` against an item's JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// camelCase field path, dot-separated for nested values
    pub field: String,
    pub value: FilterValue,
}

impl Predicate {
    pub fn eq_str(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: FilterValue::Str(value.into()),
        }
    }

    pub fn eq_bool(field: &str, value: bool) -> Self {
        Self {
            field: field.to_string(),
            value: FilterValue::Bool(value),
        }
    }

    /// Evaluate against a decoded item; absent fields hold their zero value
    pub fn matches(&self, item: &Value) -> bool {
        let actual = extract_json_value(item, &self.field);
        match &self.value {
            FilterValue::Str(expected) => match actual {
                Some(Value::String(s)) => s == expected,
                Some(Value::Number(n)) => n.to_string() == *expected,
                Some(Value::Bool(b)) => b.to_string() == *expected,
                None | Some(Value::Null) => expected.is_empty(),
                Some(_) => false,
            },
            FilterValue::Bool(expected) => match actual {
                Some(Value::Bool(b)) => b == expected,
                None | Some(Value::Null) => !expected,
                Some(_) => false,
            },
        }
    }

    /// `(field = "value")`
    pub fn to_clause(&self) -> String {
        format!("({} = {})", self.field, self.value)
    }
}

/// True when every predicate holds
pub fn matches_all(predicates: &[Predicate], item: &Value) -> bool {
    predicates.iter().all(|p| p.matches(item))
}

/// AND-joined server filter, `None` when there is nothing to send
pub fn build_filter(predicates: &[Predicate]) -> Option<String> {
    if predicates.is_empty() {
        return None;
    }
    Some(
        predicates
            .iter()
            .map(Predicate::to_clause)
            .collect::<Vec<_>>()
            .join(" AND "),
    )
}

/// Escape backslashes and double quotes inside a string literal
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
