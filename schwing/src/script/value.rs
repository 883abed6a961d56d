//! Runtime value type for the control language.
//!
//! Tokens carry no type; a value's kind is decided once, when the evaluator
//! reads a literal, a variable, or an operator result.

use std::fmt;

/// A runtime value: the language only knows integers and booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl Value {
    /// Parse a literal token.  Integers are strict base-10 (`12abc` is not a
    /// literal); booleans are exactly `true` / `false`.
    pub fn parse_literal(token: &str) -> Option<Value> {
        match token {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => token.parse::<i64>().ok().map(Value::Int),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(_) => None,
        }
    }

    /// `true` only for `Value::Bool(true)`; conditions use this.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn literals() {
        assert_eq!(Value::parse_literal("17"), Some(Value::Int(17)));
        assert_eq!(Value::parse_literal("-3"), Some(Value::Int(-3)));
        assert_eq!(Value::parse_literal("false"), Some(Value::Bool(false)));
    }

    #[test]
    fn ambiguous_literals_rejected() {
        assert_eq!(Value::parse_literal("12abc"), None);
        assert_eq!(Value::parse_literal("True"), None);
        assert_eq!(Value::parse_literal("1.5"), None);
        assert_eq!(Value::parse_literal(""), None);
    }

    #[test]
    fn coercions_are_exact() {
        assert_eq!(Value::Int(5).as_int(), Some(5));
        assert_eq!(Value::Bool(true).as_int(), None);
        assert_eq!(Value::Int(1).as_bool(), None);
        assert!(Value::Bool(true).is_true());
        assert!(!Value::Int(1).is_true());
    }

    #[test]
    fn from_impls() {
        let v: Value = 3i64.into();
        assert_eq!(v, Value::Int(3));
        let v: Value = false.into();
        assert_eq!(v, Value::Bool(false));
    }
}
