use indexmap::IndexMap;
use knobs_syntax::ast::{BoolOp, Expr, ExprKind, UnaryOp};

/// A node's accumulated dependency predicate: the conjunction of every
/// `require(...)` in its body, kept in un-rewritten form. Fixed at build
/// time; evaluated only at refresh, over the enablement of the nodes it
/// references.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    expr: Expr,
    names: Vec<String>,
}

impl Dependency {
    pub fn new(expr: Expr) -> Self {
        let mut names: Vec<String> = Vec::new();
        expr.walk(&mut |e| {
            let name = match &e.kind {
                ExprKind::Name(n) => n,
                ExprKind::Attr { target, .. } => target,
                _ => return,
            };
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        });

        Dependency { expr, names }
    }

    pub fn conjoin(self, other: Expr) -> Self {
        let span = self.expr.span.start..other.span.end;
        Dependency::new(Expr {
            kind: ExprKind::Bool {
                op: BoolOp::And,
                operands: vec![self.expr, other],
            },
            span,
        })
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Names of every node this predicate mentions.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn display_text(&self) -> String {
        self.expr.to_string()
    }

    /// Evaluate the predicate with every node reference substituted by the
    /// given boolean (the referenced node's enablement).
    pub fn evaluate(&self, values: &IndexMap<String, bool>) -> Result<bool, String> {
        eval_predicate(&self.expr, values)
    }
}

fn eval_predicate(expr: &Expr, values: &IndexMap<String, bool>) -> Result<bool, String> {
    match &expr.kind {
        ExprKind::Literal(lit) => Ok(crate::value::Value::from(lit).truthy()),
        ExprKind::Name(name) | ExprKind::Attr { target: name, .. } => values
            .get(name)
            .copied()
            .ok_or_else(|| format!("'{name}' missing from dependency valuation")),
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => Ok(!eval_predicate(operand, values)?),
        ExprKind::Bool { op, operands } => {
            let mut result = eval_predicate(&operands[0], values)?;
            for operand in &operands[1..] {
                match op {
                    BoolOp::And if !result => break,
                    BoolOp::Or if result => break,
                    _ => result = eval_predicate(operand, values)?,
                }
            }
            Ok(result)
        }
        ExprKind::Compare { op, lhs, rhs } => {
            use knobs_syntax::ast::CompareOp;
            let l = eval_predicate(lhs, values)?;
            let r = eval_predicate(rhs, values)?;
            match op {
                CompareOp::Eq => Ok(l == r),
                CompareOp::Ne => Ok(l != r),
                _ => Err("ordering comparisons are not supported in dependency predicates".into()),
            }
        }
        other => Err(format!(
            "unsupported construct in dependency predicate: {other}"
        )),
    }
}
