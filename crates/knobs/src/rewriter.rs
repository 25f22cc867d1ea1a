use knobs_lexer::Span;
use knobs_syntax::ast::{Expr, ExprKind, InterpPart, Stmt, StmtKind};

use crate::depend::Dependency;
use crate::diagnostics::{DiagnosticSink, FileContext};
use crate::lazy::{AccessorKind, LazyBinding};
use crate::nodes::ConfigNode;

pub struct RewrittenBody {
    pub stmts: Vec<Stmt>,
    pub dependency: Option<Dependency>,
}

/// Transforms a validated body into its executable form:
///
/// - cross-node value references become indexed reads against the node's
///   lazy accessor table, keyed by `(accessor-kind, target-name)`;
/// - `require(...)` calls leave the statement stream and AND onto the
///   node's accumulated dependency predicate;
/// - a term whose dependency implies its value gets a synthetic return.
pub struct NodeBodyRewriter<'a> {
    node: &'a ConfigNode,
    fc: &'a FileContext,
    sink: &'a DiagnosticSink,
}

impl<'a> NodeBodyRewriter<'a> {
    pub fn new(node: &'a ConfigNode, fc: &'a FileContext, sink: &'a DiagnosticSink) -> Self {
        NodeBodyRewriter { node, fc, sink }
    }

    pub fn rewrite(&self, stmts: Vec<Stmt>) -> RewrittenBody {
        let mut dependency: Option<Dependency> = None;
        let mut out: Vec<Stmt> = Vec::new();
        let mut returns = 0usize;

        for stmt in stmts {
            let span = stmt.span.clone();
            match stmt.kind {
                StmtKind::Expr(expr) if is_require_call(&expr) => {
                    let ExprKind::Call { args, .. } = expr.kind else {
                        unreachable!()
                    };
                    if args.len() != 1 {
                        self.warn(&span, "require() takes exactly one argument; ignored");
                        continue;
                    }

                    // The predicate stays un-rewritten: enablement
                    // evaluation substitutes booleans for its references.
                    let arg = args.into_iter().next().unwrap();
                    dependency = Some(match dependency {
                        None => Dependency::new(arg),
                        Some(dep) => dep.conjoin(arg),
                    });
                }
                StmtKind::If { .. }
                | StmtKind::While { .. }
                | StmtKind::For { .. }
                | StmtKind::Struct { .. } => {
                    // Rejected by the validator; nothing executable remains.
                }
                StmtKind::Return(expr) => {
                    returns += 1;
                    out.push(Stmt {
                        kind: StmtKind::Return(expr.map(|e| self.rewrite_expr(e))),
                        span,
                    });
                }
                StmtKind::Expr(expr) => out.push(Stmt {
                    kind: StmtKind::Expr(self.rewrite_expr(expr)),
                    span,
                }),
                StmtKind::Assign { target, value } => out.push(Stmt {
                    kind: StmtKind::Assign {
                        target: self.rewrite_expr(target),
                        value: self.rewrite_expr(value),
                    },
                    span,
                }),
            }
        }

        if self.node.is_group() {
            if returns > 0 {
                self.warn_decl("return has no effect in a group body; ignored");
                out.retain(|s| !matches!(s.kind, StmtKind::Return(_)));
            }
        } else if let Some(dep) = &dependency {
            if returns > 0 {
                // Mixing both is ambiguous; the explicit return wins so a
                // typed term keeps producing a value of its own type.
                self.warn_decl(
                    "ambiguous return: explicit return takes precedence over \
                     the dependency-implied value",
                );
            } else {
                let span = dep.expr().span.clone();
                let implied = self.rewrite_expr(promote_names(dep.expr().clone()));
                out.push(Stmt {
                    kind: StmtKind::Return(Some(implied)),
                    span,
                });
            }
        } else if returns > 1 {
            self.warn_decl("more than one return in node body; statements after the first are unreachable");
        }

        RewrittenBody {
            stmts: out,
            dependency,
        }
    }

    fn rewrite_expr(&self, expr: Expr) -> Expr {
        let span = expr.span.clone();
        let kind = match expr.kind {
            ExprKind::Attr { target, attr } => match AccessorKind::from_attr(&attr) {
                Some(kind) => {
                    let key = self.node.lazy().intern(LazyBinding::new(kind, target));
                    ExprKind::Accessor { key }
                }
                None => ExprKind::Attr { target, attr },
            },
            ExprKind::Interp(parts) => ExprKind::Interp(
                parts
                    .into_iter()
                    .map(|part| match part {
                        InterpPart::Text(t) => InterpPart::Text(t),
                        InterpPart::Expr(e) => InterpPart::Expr(self.rewrite_expr(e)),
                    })
                    .collect(),
            ),
            ExprKind::Call { func, args } => ExprKind::Call {
                func,
                args: args.into_iter().map(|a| self.rewrite_expr(a)).collect(),
            },
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op,
                operand: Box::new(self.rewrite_expr(*operand)),
            },
            ExprKind::Bool { op, operands } => ExprKind::Bool {
                op,
                operands: operands.into_iter().map(|o| self.rewrite_expr(o)).collect(),
            },
            ExprKind::Compare { op, lhs, rhs } => ExprKind::Compare {
                op,
                lhs: Box::new(self.rewrite_expr(*lhs)),
                rhs: Box::new(self.rewrite_expr(*rhs)),
            },
            ExprKind::Map(entries) => ExprKind::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (self.rewrite_expr(k), self.rewrite_expr(v)))
                    .collect(),
            ),
            other @ (ExprKind::Literal(_) | ExprKind::Name(_) | ExprKind::Accessor { .. }) => other,
        };

        Expr { kind, span }
    }

    fn warn(&self, span: &Span, message: &str) {
        self.sink
            .warn(self.fc.location(span), self.node.name(), message);
    }

    fn warn_decl(&self, message: &str) {
        self.sink
            .warn(self.node.location().clone(), self.node.name(), message);
    }
}

fn is_require_call(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::Call { func, .. } if func == "require")
}

/// In a dependency predicate a bare node name stands for the node itself;
/// the dependency-implied return reads it as its value.
fn promote_names(expr: Expr) -> Expr {
    let span = expr.span.clone();
    let kind = match expr.kind {
        ExprKind::Name(target) => ExprKind::Attr {
            target,
            attr: "val".to_string(),
        },
        ExprKind::Unary { op, operand } => ExprKind::Unary {
            op,
            operand: Box::new(promote_names(*operand)),
        },
        ExprKind::Bool { op, operands } => ExprKind::Bool {
            op,
            operands: operands.into_iter().map(promote_names).collect(),
        },
        ExprKind::Compare { op, lhs, rhs } => ExprKind::Compare {
            op,
            lhs: Box::new(promote_names(*lhs)),
            rhs: Box::new(promote_names(*rhs)),
        },
        other => other,
    };

    Expr { kind, span }
}
