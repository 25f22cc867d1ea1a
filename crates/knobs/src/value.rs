use std::fmt;

use derive_more::{From, TryInto};
use knobs_syntax::ast::Literal;
use serde::{Deserialize, Serialize};

/// One resolved configuration value. Properties hold `Option<Value>`;
/// `None` means the node has not resolved yet.
#[derive(Clone, Debug, PartialEq, Eq, From, TryInto, Serialize, Deserialize)]
#[serde(untagged)]
#[try_into(owned, ref)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Str,
    Int,
    Bool,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Str(_) => ValueKind::Str,
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Str(s) => !s.is_empty(),
            Value::Int(i) => *i != 0,
            Value::Bool(b) => *b,
        }
    }

    /// Diagnostic rendering: strings are quoted, everything else is as-is.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("{s:?}"),
            other => other.to_string(),
        }
    }
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Str => "str",
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
        }
    }

    pub fn from_name(name: &str) -> Option<ValueKind> {
        match name {
            "str" => Some(ValueKind::Str),
            "int" => Some(ValueKind::Int),
            "bool" => Some(ValueKind::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Str(s) => Value::Str(s.clone()),
            Literal::Int(i) => Value::Int(*i),
            Literal::Bool(b) => Value::Bool(*b),
        }
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        match self {
            Value::Str(s) => s == other,
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(Value::from("x").truthy());
        assert!(!Value::from("").truthy());
        assert!(Value::Int(-1).truthy());
        assert!(!Value::Int(0).truthy());
        assert!(!Value::Bool(false).truthy());
    }

    #[test]
    fn json_round_trip() {
        for v in [Value::from("a"), Value::Int(7), Value::Bool(true)] {
            let json = serde_json::to_string(&v).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(back, v);
        }
    }

    #[test]
    fn conversions() {
        let v: Value = 7i64.into();
        let i: i64 = v.try_into().unwrap();
        assert_eq!(i, 7);
    }
}
