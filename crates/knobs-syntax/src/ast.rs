//! Declaration and expression trees produced by the parser.
//!
//! Expressions are a closed set of tagged variants; there is deliberately
//! no arithmetic, no user-defined functions and no composite data beyond
//! what a node body needs to compute one value or one predicate. The
//! parser still accepts branching, loops, `struct` blocks and map
//! literals so that later passes can diagnose them instead of failing at
//! the grammar level.

use std::fmt;

use itertools::Itertools;

pub use knobs_lexer::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Declaration(Declaration),
    Include(Include),
    Statement(Stmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub path: String,
    pub span: Span,
}

/// A neutral declaration record. Modifier classification and body
/// compilation happen in a later phase; the parser only captures shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub modifiers: Vec<ModifierExpr>,
    pub name: String,
    pub type_expr: Option<TypeExpr>,
    pub body: Vec<BodyItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyItem {
    Statement(Stmt),
    Declaration(Declaration),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModifierExpr {
    /// `@ "Human readable label"`
    Text { value: String, span: Span },
    /// `@ readonly`
    Marker { name: String, span: Span },
    /// `@ key := value`
    Binding {
        key: String,
        value: String,
        span: Span,
    },
    /// Anything else; kept verbatim so the build phase can warn.
    Unknown { text: String, span: Span },
}

impl ModifierExpr {
    pub fn span(&self) -> &Span {
        match self {
            ModifierExpr::Text { span, .. }
            | ModifierExpr::Marker { span, .. }
            | ModifierExpr::Binding { span, .. }
            | ModifierExpr::Unknown { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub alternatives: Vec<TypeAtom>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeAtom {
    Literal(Literal),
    /// A bare identifier naming a primitive kind; resolved by the engine.
    Kind(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Assign { target: Expr, value: Expr },
    Return(Option<Expr>),
    If {
        test: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    For {
        var: String,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Struct {
        name: String,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// A string with `${...}` segments.
    Interp(Vec<InterpPart>),
    Name(String),
    /// `target.attr` — a cross-node reference before rewriting.
    Attr { target: String, attr: String },
    /// An indexed read against the enclosing node's lazy accessor table.
    /// Inserted by body rewriting; never produced by the parser.
    Accessor { key: String },
    Call { func: String, args: Vec<Expr> },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Bool {
        op: BoolOp,
        operands: Vec<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Map(Vec<(Expr, Expr)>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpPart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "{s:?}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Unparser used by diagnostics and the dependency reverse-index.
impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprKind::Literal(lit) => write!(f, "{lit}"),
            ExprKind::Interp(parts) => {
                write!(f, "\"")?;
                for part in parts {
                    match part {
                        InterpPart::Text(t) => write!(f, "{t}")?,
                        InterpPart::Expr(e) => write!(f, "${{{e}}}")?,
                    }
                }
                write!(f, "\"")
            }
            ExprKind::Name(n) => write!(f, "{n}"),
            ExprKind::Attr { target, attr } => write!(f, "{target}.{attr}"),
            ExprKind::Accessor { key } => write!(f, "[{key}]"),
            ExprKind::Call { func, args } => {
                write!(f, "{func}({})", args.iter().map(|a| a.to_string()).join(", "))
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "not {operand}"),
                UnaryOp::Neg => write!(f, "-{operand}"),
            },
            ExprKind::Bool { op, operands } => {
                let sep = match op {
                    BoolOp::And => " and ",
                    BoolOp::Or => " or ",
                };
                write!(f, "{}", operands.iter().map(|o| o.to_string()).join(sep))
            }
            ExprKind::Compare { op, lhs, rhs } => write!(f, "{lhs} {op} {rhs}"),
            ExprKind::Map(entries) => {
                write!(
                    f,
                    "{{{}}}",
                    entries
                        .iter()
                        .map(|(k, v)| format!("{k}: {v}"))
                        .join(", ")
                )
            }
        }
    }
}

impl TypeExpr {
    pub fn is_union(&self) -> bool {
        self.alternatives.len() > 1
    }
}

impl Expr {
    /// Visit this expression and all sub-expressions, depth first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Expr)) {
        visit(self);
        match &self.kind {
            ExprKind::Interp(parts) => {
                for part in parts {
                    if let InterpPart::Expr(e) = part {
                        e.walk(visit);
                    }
                }
            }
            ExprKind::Call { args, .. } => {
                for a in args {
                    a.walk(visit);
                }
            }
            ExprKind::Unary { operand, .. } => operand.walk(visit),
            ExprKind::Bool { operands, .. } => {
                for o in operands {
                    o.walk(visit);
                }
            }
            ExprKind::Compare { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            ExprKind::Map(entries) => {
                for (k, v) in entries {
                    k.walk(visit);
                    v.walk(visit);
                }
            }
            ExprKind::Literal(_)
            | ExprKind::Name(_)
            | ExprKind::Attr { .. }
            | ExprKind::Accessor { .. } => {}
        }
    }
}
