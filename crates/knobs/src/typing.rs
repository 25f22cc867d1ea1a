use std::fmt;

use itertools::Itertools;
use knobs_syntax::ast::{TypeAtom, TypeExpr};

use crate::errors::NodeErrorKind;
use crate::value::{Value, ValueKind};

#[derive(Debug, Clone, PartialEq)]
pub enum TypeMatcher {
    Exact(Value),
    Kind(ValueKind),
}

/// Immutable matcher compiled from a declaration's type expression: an
/// exact literal, a primitive kind, or an order-irrelevant union.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeConstraint {
    matchers: Vec<TypeMatcher>,
}

impl TypeConstraint {
    pub fn compile(type_expr: &TypeExpr) -> Result<Self, NodeErrorKind> {
        let mut matchers = Vec::with_capacity(type_expr.alternatives.len());

        for atom in &type_expr.alternatives {
            let matcher = match atom {
                TypeAtom::Literal(lit) => TypeMatcher::Exact(Value::from(lit)),
                TypeAtom::Kind(name) => ValueKind::from_name(name)
                    .map(TypeMatcher::Kind)
                    .ok_or_else(|| NodeErrorKind::UnknownType(name.clone()))?,
            };
            matchers.push(matcher);
        }

        Ok(TypeConstraint { matchers })
    }

    pub fn matches(&self, value: &Value) -> bool {
        self.matchers.iter().any(|m| match m {
            TypeMatcher::Exact(expected) => expected == value,
            TypeMatcher::Kind(kind) => value.kind() == *kind,
        })
    }

    /// The post-refresh sanity check: a resolved Value must satisfy its
    /// declared constraint.
    pub fn ensure(&self, value: Option<&Value>) -> Result<(), NodeErrorKind> {
        match value {
            Some(v) if self.matches(v) => Ok(()),
            _ => Err(NodeErrorKind::TypeMismatch {
                expected: self.to_string(),
                got: value
                    .map(|v| format!("{} ({})", v.repr(), v.kind()))
                    .unwrap_or_else(|| "none".into()),
            }),
        }
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .matchers
            .iter()
            .map(|m| match m {
                TypeMatcher::Exact(v) => v.repr(),
                TypeMatcher::Kind(k) => k.name().to_string(),
            })
            .join(" | ");
        f.write_str(&rendered)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use knobs_syntax::parse_source;
    use knobs_syntax::ast::Item;

    fn constraint(type_src: &str) -> TypeConstraint {
        let src = format!("t() -> {type_src}:\n    return 0\n");
        let file = parse_source(&src).unwrap();
        let Item::Declaration(decl) = &file.items[0] else {
            panic!()
        };
        TypeConstraint::compile(decl.type_expr.as_ref().unwrap()).unwrap()
    }

    #[test]
    fn primitive_kinds() {
        let c = constraint("int");
        assert!(c.matches(&Value::Int(3)));
        assert!(!c.matches(&Value::Bool(true)));
        assert_eq!(c.to_string(), "int");
    }

    #[test]
    fn literal_unions_are_order_irrelevant() {
        let c = constraint("\"a\" | \"b\"");
        assert!(c.matches(&Value::from("b")));
        assert!(c.matches(&Value::from("a")));
        assert!(!c.matches(&Value::from("c")));
    }

    #[test]
    fn mixed_union() {
        let c = constraint("\"auto\" | int");
        assert!(c.matches(&Value::from("auto")));
        assert!(c.matches(&Value::Int(9)));
        assert!(!c.matches(&Value::from("manual")));
    }

    #[test]
    fn unresolved_value_fails_the_sanity_check() {
        let c = constraint("bool");
        let err = c.ensure(None).unwrap_err();
        assert!(err.to_string().contains("got: none"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let src = "t() -> float:\n    return 0\n";
        let file = parse_source(src).unwrap();
        let Item::Declaration(decl) = &file.items[0] else {
            panic!()
        };
        let err = TypeConstraint::compile(decl.type_expr.as_ref().unwrap()).unwrap_err();
        assert!(matches!(err, NodeErrorKind::UnknownType(name) if name == "float"));
    }
}
