use anyhow::anyhow;
use indexmap::IndexMap;
use knobs_syntax::ast::{BoolOp, CompareOp, Expr, ExprKind, InterpPart, Stmt, StmtKind, UnaryOp};

use crate::environment::ConfigEnvironment;
use crate::errors::{KnobsResult, NodeErrorKind};
use crate::nodes::ConfigNode;
use crate::value::Value;

/// Everything a body evaluation may reach: the environment (for the lazy
/// accessor table and builtins) and the shared globals rebuilt by each
/// refresh.
pub struct EvaluationContext<'a> {
    env: &'a ConfigEnvironment,
    globals: &'a IndexMap<String, Value>,
}

impl<'a> EvaluationContext<'a> {
    pub(crate) fn new(env: &'a ConfigEnvironment, globals: &'a IndexMap<String, Value>) -> Self {
        EvaluationContext { env, globals }
    }

    pub fn env(&self) -> &ConfigEnvironment {
        self.env
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).cloned()
    }
}

/// Tree-walking evaluator over the compiled statement list. Evaluation
/// works in the `Option<Value>` domain: an unresolved read is falsy and
/// propagates through boolean operators, which is what lets the cycle
/// guard hand back an empty cache without aborting the refresh.
pub(crate) struct Evaluator<'a, 'e> {
    node: Option<&'a ConfigNode>,
    ctx: &'a EvaluationContext<'e>,
    locals: IndexMap<String, Option<Value>>,
}

impl<'a, 'e> Evaluator<'a, 'e> {
    pub fn new(node: Option<&'a ConfigNode>, ctx: &'a EvaluationContext<'e>) -> Self {
        Evaluator {
            node,
            ctx,
            locals: IndexMap::new(),
        }
    }

    pub fn into_locals(self) -> IndexMap<String, Option<Value>> {
        self.locals
    }

    pub fn run(&mut self, stmts: &[Stmt]) -> KnobsResult<Option<Value>> {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Return(expr) => {
                    return match expr {
                        Some(e) => self.eval(e),
                        None => Ok(None),
                    };
                }
                StmtKind::Expr(e) => {
                    self.eval(e)?;
                }
                StmtKind::Assign { target, value } => {
                    let v = self.eval(value)?;
                    self.assign(target, v)?;
                }
                StmtKind::If { .. }
                | StmtKind::While { .. }
                | StmtKind::For { .. }
                | StmtKind::Struct { .. } => {
                    return Err(self.error("unsupported construct in node body"));
                }
            }
        }

        Ok(None)
    }

    fn assign(&mut self, target: &Expr, value: Option<Value>) -> KnobsResult<()> {
        match &target.kind {
            ExprKind::Name(name) => {
                self.locals.insert(name.clone(), value);
                Ok(())
            }
            ExprKind::Accessor { key } => {
                let Some(value) = value else {
                    return Err(self.error("cannot assign an unresolved value"));
                };
                let node = self
                    .node
                    .ok_or_else(|| self.error("node reference outside of a node body"))?;
                let binding = node
                    .lazy()
                    .get(key)
                    .ok_or_else(|| self.error(format!("no accessor registered for '{key}'")))?;
                binding.resolve_set(node, self.ctx, value)
            }
            ExprKind::Attr { target, attr } => {
                Err(self.error(format!("unknown accessor '{target}.{attr}'")))
            }
            _ => Err(self.error("invalid assignment target")),
        }
    }

    fn eval(&mut self, expr: &Expr) -> KnobsResult<Option<Value>> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(Some(Value::from(lit))),
            ExprKind::Interp(parts) => self.eval_interp(parts),
            ExprKind::Name(name) => {
                if let Some(v) = self.locals.get(name) {
                    return Ok(v.clone());
                }
                if let Some(v) = self.ctx.global(name) {
                    return Ok(Some(v));
                }
                Err(self.error(format!("undefined name '{name}'")))
            }
            ExprKind::Attr { target, attr } => {
                Err(self.error(format!("unknown accessor '{target}.{attr}'")))
            }
            ExprKind::Accessor { key } => {
                let node = self
                    .node
                    .ok_or_else(|| self.error("node reference outside of a node body"))?;
                let binding = node
                    .lazy()
                    .get(key)
                    .ok_or_else(|| self.error(format!("no accessor registered for '{key}'")))?;
                binding.resolve_get(node, self.ctx)
            }
            ExprKind::Call { func, args } => self.eval_call(func, args),
            ExprKind::Unary { op, operand } => {
                let v = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Some(Value::Bool(!truthy(&v)))),
                    UnaryOp::Neg => match v {
                        Some(Value::Int(i)) => Ok(Some(Value::Int(-i))),
                        _ => Err(self.error("unary minus requires an integer")),
                    },
                }
            }
            ExprKind::Bool { op, operands } => {
                let mut result = self.eval(&operands[0])?;
                for operand in &operands[1..] {
                    let keep_going = match op {
                        BoolOp::And => truthy(&result),
                        BoolOp::Or => !truthy(&result),
                    };
                    if !keep_going {
                        break;
                    }
                    result = self.eval(operand)?;
                }
                Ok(result)
            }
            ExprKind::Compare { op, lhs, rhs } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                self.compare(*op, l, r)
            }
            ExprKind::Map(_) => Err(self.error("unsupported construct in node body")),
        }
    }

    fn eval_interp(&mut self, parts: &[InterpPart]) -> KnobsResult<Option<Value>> {
        let mut out = String::new();
        for part in parts {
            match part {
                InterpPart::Text(t) => out.push_str(t),
                InterpPart::Expr(e) => match self.eval(e)? {
                    Some(v) => out.push_str(&v.to_string()),
                    None => {
                        return Err(
                            self.error(format!("cannot interpolate unresolved value of '{e}'"))
                        );
                    }
                },
            }
        }
        Ok(Some(Value::Str(out)))
    }

    fn eval_call(&mut self, func: &str, args: &[Expr]) -> KnobsResult<Option<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            match self.eval(arg)? {
                Some(v) => values.push(v),
                None => {
                    return Err(
                        self.error(format!("argument {} of {func}() is unresolved", i + 1))
                    );
                }
            }
        }

        match self.ctx.env().call_builtin(func, &values) {
            Some(result) => result,
            None => Err(self.error(format!("unknown function '{func}'"))),
        }
    }

    fn compare(
        &self,
        op: CompareOp,
        lhs: Option<Value>,
        rhs: Option<Value>,
    ) -> KnobsResult<Option<Value>> {
        let result = match op {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            _ => {
                let ordering = match (&lhs, &rhs) {
                    (Some(Value::Int(l)), Some(Value::Int(r))) => l.cmp(r),
                    (Some(Value::Str(l)), Some(Value::Str(r))) => l.cmp(r),
                    _ => {
                        return Err(self.error(format!(
                            "cannot order {} and {}",
                            describe(&lhs),
                            describe(&rhs)
                        )));
                    }
                };
                match op {
                    CompareOp::Lt => ordering.is_lt(),
                    CompareOp::Le => ordering.is_le(),
                    CompareOp::Gt => ordering.is_gt(),
                    CompareOp::Ge => ordering.is_ge(),
                    CompareOp::Eq | CompareOp::Ne => unreachable!(),
                }
            }
        };

        Ok(Some(Value::Bool(result)))
    }

    fn error(&self, message: impl Into<String>) -> anyhow::Error {
        let message = message.into();
        match self.node {
            Some(node) => node.config_error(NodeErrorKind::Evaluation(message)),
            None => anyhow!(message),
        }
    }
}

pub(crate) fn truthy(value: &Option<Value>) -> bool {
    value.as_ref().map(Value::truthy).unwrap_or(false)
}

fn describe(value: &Option<Value>) -> String {
    match value {
        Some(v) => format!("{} ({})", v.repr(), v.kind()),
        None => "none".into(),
    }
}
