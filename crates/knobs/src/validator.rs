use knobs_lexer::Span;
use knobs_syntax::ast::{Expr, ExprKind, Stmt, StmtKind, UnaryOp};

use crate::diagnostics::{DiagnosticSink, FileContext};
use crate::nodes::ConfigNode;

/// One lint rule: a construct a node body must not rely on, because it
/// would make dependency extraction or repeated re-evaluation unsound.
pub struct Rule {
    pub name: &'static str,
    pub help: &'static str,
}

pub const DYNAMIC_LOGIC: Rule = Rule {
    name: "dynamic-logic",
    help: "conditional branching interferes with dependency resolving",
};
pub const WHILE_LOOP: Rule = Rule {
    name: "while-loop",
    help: "loop constructs are not allowed in node bodies",
};
pub const FOR_LOOP: Rule = Rule {
    name: "for-loop",
    help: "loop constructs are not allowed in node bodies",
};
pub const STRUCT_DEF: Rule = Rule {
    name: "struct-def",
    help: "custom composite types are not recommended",
};
pub const COMPLEX_STRUCT: Rule = Rule {
    name: "complex-struct",
    help: "use of complex data structures is not recommended",
};
pub const SIDE_EFFECT_OPTION: Rule = Rule {
    name: "side-effect-option",
    help: "an option modifying other options has unpredictable behaviour",
};
pub const NON_TRIVIAL_VALUE: Rule = Rule {
    name: "non-trivial-value",
    help: "use of non-trivial value as default value",
};
pub const NON_TRIVIAL_DEPENDENCY: Rule = Rule {
    name: "non-trivial-dependency",
    help: "dependency predicates should only combine node references and literals",
};

/// Static linter over a node body. A violation is a warning, not a hard
/// gate; the rewriter strips statements the evaluator has no semantics
/// for.
pub struct NodeValidator<'a> {
    node: &'a ConfigNode,
    fc: &'a FileContext,
    sink: &'a DiagnosticSink,
}

impl<'a> NodeValidator<'a> {
    pub fn new(node: &'a ConfigNode, fc: &'a FileContext, sink: &'a DiagnosticSink) -> Self {
        NodeValidator { node, fc, sink }
    }

    pub fn validate(&self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::If {
                then_body,
                else_body,
                test,
            } => {
                self.violation(&DYNAMIC_LOGIC, &stmt.span);
                self.check_expr(test);
                self.validate(then_body);
                self.validate(else_body);
            }
            StmtKind::While { test, body } => {
                self.violation(&WHILE_LOOP, &stmt.span);
                self.check_expr(test);
                self.validate(body);
            }
            StmtKind::For { iter, body, .. } => {
                self.violation(&FOR_LOOP, &stmt.span);
                self.check_expr(iter);
                self.validate(body);
            }
            StmtKind::Struct { body, .. } => {
                self.violation(&STRUCT_DEF, &stmt.span);
                self.validate(body);
            }
            StmtKind::Assign { target, value } => {
                if matches!(
                    target.kind,
                    ExprKind::Attr { .. } | ExprKind::Accessor { .. }
                ) {
                    self.violation(&SIDE_EFFECT_OPTION, &stmt.span);
                }
                self.check_expr(value);
            }
            StmtKind::Return(Some(expr)) => {
                if !is_trivial(expr) {
                    self.violation(&NON_TRIVIAL_VALUE, &stmt.span);
                }
                self.check_expr(expr);
            }
            StmtKind::Return(None) => {}
            StmtKind::Expr(expr) => {
                if let ExprKind::Call { func, args } = &expr.kind {
                    if func == "require" {
                        for arg in args {
                            self.check_dependency_expr(arg);
                        }
                        return;
                    }
                }
                self.check_expr(expr);
            }
        }
    }

    fn check_expr(&self, expr: &Expr) {
        expr.walk(&mut |e| {
            if matches!(e.kind, ExprKind::Map(_)) {
                self.violation(&COMPLEX_STRUCT, &e.span);
            }
        });
    }

    fn check_dependency_expr(&self, expr: &Expr) {
        expr.walk(&mut |e| match &e.kind {
            ExprKind::Call { .. } | ExprKind::Map(_) | ExprKind::Interp(_) => {
                self.violation(&NON_TRIVIAL_DEPENDENCY, &e.span);
            }
            _ => {}
        });
    }

    fn violation(&self, rule: &Rule, span: &Span) {
        self.sink.warn(
            self.fc.location(span),
            self.node.name(),
            format!("rule violation: {}: {}", rule.name, rule.help),
        );
    }
}

/// Trivial means safe to re-run and serialize: a literal, a name or node
/// reference, an interpolated string, or a boolean/comparison expression
/// composed only of those.
fn is_trivial(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Literal(_)
        | ExprKind::Interp(_)
        | ExprKind::Name(_)
        | ExprKind::Attr { .. }
        | ExprKind::Accessor { .. } => true,
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => is_trivial(operand),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => matches!(operand.kind, ExprKind::Literal(_)),
        ExprKind::Bool { operands, .. } => operands.iter().all(is_trivial),
        ExprKind::Compare { lhs, rhs, .. } => is_trivial(lhs) && is_trivial(rhs),
        ExprKind::Call { .. } | ExprKind::Map(_) => false,
    }
}
