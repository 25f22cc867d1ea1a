use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use indexmap::{IndexMap, IndexSet};
use knobs_syntax::ast::Stmt;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::errors::{EnvironmentError, KnobsResult, NodeErrorKind};
use crate::eval::{EvaluationContext, Evaluator};
use crate::nodes::ConfigNode;
use crate::value::Value;

pub type BuiltinFn = Box<dyn Fn(&[Value]) -> KnobsResult<Option<Value>>>;

/// Owns the node graph and the shared execution context; the engine's
/// single public entry point. Single-threaded by design: bodies recurse
/// through the environment via the lazy accessor table.
pub struct ConfigEnvironment {
    table: RefCell<IndexMap<String, Rc<ConfigNode>>>,
    context_stmts: RefCell<Vec<Stmt>>,
    globals: RefCell<IndexMap<String, Value>>,
    builtins: RefCell<IndexMap<String, BuiltinFn>>,
    diagnostics: DiagnosticSink,
    refresh_fence: RefCell<()>,
}

impl Default for ConfigEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigEnvironment {
    pub fn new() -> Self {
        let env = ConfigEnvironment {
            table: RefCell::new(IndexMap::new()),
            context_stmts: RefCell::new(Vec::new()),
            globals: RefCell::new(IndexMap::new()),
            builtins: RefCell::new(IndexMap::new()),
            diagnostics: DiagnosticSink::default(),
            refresh_fence: RefCell::new(()),
        };

        env.register_builtin("env", |args| {
            let Some(Value::Str(name)) = args.first() else {
                anyhow::bail!("env() expects a variable name");
            };
            match std::env::var(name) {
                Ok(v) => Ok(Some(Value::Str(v))),
                Err(_) => Ok(args.get(1).cloned()),
            }
        });

        env
    }

    // ---- registration -----------------------------------------------------

    /// Add a node to the flat table. The namespace is flat despite
    /// nesting; a name collision anywhere is fatal.
    pub fn register_node(&self, node: Rc<ConfigNode>) -> KnobsResult<()> {
        let mut table = self.table.borrow_mut();
        if table.contains_key(node.name()) {
            return Err(node.config_error(NodeErrorKind::Redefinition(node.name().to_string())));
        }
        table.insert(node.name().to_string(), node);
        Ok(())
    }

    pub fn register_builtin(
        &self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> KnobsResult<Option<Value>> + 'static,
    ) {
        self.builtins.borrow_mut().insert(name.into(), Box::new(f));
    }

    pub(crate) fn call_builtin(
        &self,
        name: &str,
        args: &[Value],
    ) -> Option<KnobsResult<Option<Value>>> {
        let builtins = self.builtins.borrow();
        builtins.get(name).map(|f| f(args))
    }

    pub(crate) fn set_exec_context(&self, stmts: Vec<Stmt>) {
        *self.context_stmts.borrow_mut() = stmts;
    }

    // ---- lookup -----------------------------------------------------------

    pub fn get_node(&self, name: &str) -> Option<Rc<ConfigNode>> {
        self.table.borrow().get(name).cloned()
    }

    pub fn nodes(&self) -> Vec<Rc<ConfigNode>> {
        self.table.borrow().values().cloned().collect()
    }

    pub fn terms(&self) -> Vec<Rc<ConfigNode>> {
        self.table
            .borrow()
            .values()
            .filter(|n| n.is_term())
            .cloned()
            .collect()
    }

    pub fn top_levels(&self) -> Vec<Rc<ConfigNode>> {
        self.table
            .borrow()
            .values()
            .filter(|n| !n.has_parent_link())
            .cloned()
            .collect()
    }

    pub fn diagnostics_sink(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.entries()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    // ---- structure --------------------------------------------------------

    /// Resolve by-name parent links recorded at build time. Lexical
    /// containment already linked its children; only `parent :=` markers
    /// remain named here.
    pub fn relocate_children(&self) -> KnobsResult<()> {
        for node in self.nodes() {
            let Some(parent_name) = node.parent_name() else {
                continue;
            };

            let Some(parent) = self.get_node(&parent_name) else {
                return Err(node.config_error(NodeErrorKind::UnknownParent(parent_name)));
            };
            if !parent.is_group() {
                return Err(node.config_error(NodeErrorKind::InvalidParent(parent_name)));
            }
            parent.add_child(&node);
        }

        Ok(())
    }

    /// Rebuild the dependency reverse-index. Unknown targets are skipped
    /// here; refresh reports them fatally.
    pub(crate) fn link_dependencies(&self) {
        let nodes = self.nodes();
        for node in &nodes {
            node.clear_linkage();
        }
        for node in &nodes {
            let Some(dep) = node.dependency() else {
                continue;
            };
            let text = dep.display_text();
            for name in dep.names() {
                if let Some(target) = self.get_node(name) {
                    target.add_linkage(node.name(), text.clone());
                }
            }
        }
    }

    // ---- refresh ----------------------------------------------------------

    /// One full re-evaluation pass: rebuild the shared globals, re-run
    /// every node body, then type-check and recompute enablement.
    /// Re-entrant calls (from inside a node body) are rejected.
    pub fn refresh(&self) -> KnobsResult<()> {
        let _fence = self
            .refresh_fence
            .try_borrow_mut()
            .map_err(|_| EnvironmentError::ReentrantRefresh)?;

        self.rebuild_globals()?;

        let nodes = self.nodes();
        {
            let globals = self.globals.borrow();
            let ctx = EvaluationContext::new(self, &globals);
            for node in &nodes {
                node.update(&ctx)?;
            }
        }

        for node in &nodes {
            node.sanity_check()?;
            let mut stack = IndexSet::new();
            let active = self.effective_enabled(node, &mut stack)?;
            node.set_active(active);
        }

        Ok(())
    }

    /// Build-time pass: execute every body once so declaration errors
    /// surface before the first refresh.
    pub(crate) fn prime(&self) -> KnobsResult<()> {
        let _fence = self
            .refresh_fence
            .try_borrow_mut()
            .map_err(|_| EnvironmentError::ReentrantRefresh)?;

        self.rebuild_globals()?;

        let globals = self.globals.borrow();
        let ctx = EvaluationContext::new(self, &globals);
        for node in self.nodes() {
            node.update(&ctx)?;
        }

        Ok(())
    }

    fn rebuild_globals(&self) -> KnobsResult<()> {
        let stmts = self.context_stmts.borrow().clone();

        let empty = IndexMap::new();
        let ctx = EvaluationContext::new(self, &empty);
        let mut evaluator = Evaluator::new(None, &ctx);
        evaluator
            .run(&stmts)
            .context("error in shared configuration context")?;

        *self.globals.borrow_mut() = evaluator
            .into_locals()
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect();

        Ok(())
    }

    /// `enabled(node)`: the node's raw flag and boolean value, its
    /// parent's enablement, and its dependency predicate evaluated over
    /// the enablement of every referenced node — so disabling one node
    /// transitively disables everything conditioned on it.
    fn effective_enabled(
        &self,
        node: &Rc<ConfigNode>,
        stack: &mut IndexSet<String>,
    ) -> KnobsResult<bool> {
        if !stack.insert(node.name().to_string()) {
            self.diagnostics.warn(
                node.location().clone(),
                node.name(),
                format!(
                    "cyclic enablement dependency involving '{}'; using its own state",
                    node.name()
                ),
            );
            return Ok(node.raw_enabled());
        }

        let result = self.effective_enabled_inner(node, stack);
        stack.pop();
        result
    }

    fn effective_enabled_inner(
        &self,
        node: &Rc<ConfigNode>,
        stack: &mut IndexSet<String>,
    ) -> KnobsResult<bool> {
        let mut enabled = node.raw_enabled();

        if enabled {
            if let Some(parent) = node.parent() {
                enabled = self.effective_enabled(&parent, stack)?;
            }
        }

        if enabled {
            if let Some(dep) = node.dependency() {
                let mut values = IndexMap::new();
                for name in dep.names() {
                    let Some(target) = self.get_node(name) else {
                        return Err(
                            node.config_error(NodeErrorKind::UndeclaredReference(name.clone()))
                        );
                    };
                    let target_enabled = self.effective_enabled(&target, stack)?;
                    values.insert(name.clone(), target_enabled);
                }

                enabled = dep
                    .evaluate(&values)
                    .map_err(|msg| node.config_error(NodeErrorKind::Evaluation(msg)))?;
            }
        }

        Ok(enabled)
    }

    // ---- lifecycle --------------------------------------------------------

    /// Full graph reset before a rebuild.
    pub fn reset(&self) {
        self.table.borrow_mut().clear();
        self.context_stmts.borrow_mut().clear();
        self.globals.borrow_mut().clear();
    }

    /// Reset every term to its body-computed default by dropping
    /// externally-set values.
    pub fn clear_values(&self) {
        for node in self.terms() {
            node.set_value_raw(None);
        }
    }
}
