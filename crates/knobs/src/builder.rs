use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context};
use indexmap::IndexSet;
use knobs_syntax::ast::{
    BodyItem, Declaration, ExprKind, Item, Literal, ModifierExpr, Stmt, StmtKind,
};
use knobs_syntax::{parse_source, LineIndex};

use crate::diagnostics::FileContext;
use crate::environment::ConfigEnvironment;
use crate::errors::{KnobsResult, NodeError, NodeErrorKind};
use crate::nodes::ConfigNode;
use crate::rewriter::NodeBodyRewriter;
use crate::typing::TypeConstraint;
use crate::utils::dedent;
use crate::validator::NodeValidator;

/// The declaration compiler: turns parsed files into a fully-populated
/// node graph, registering every node exactly once. Containment comes
/// from lexical nesting; `parent :=` markers relocate out-of-scope nodes
/// after every node exists.
pub struct NodeBuilder<'e> {
    env: &'e ConfigEnvironment,
    context_stmts: Vec<Stmt>,
    loaded: IndexSet<PathBuf>,
}

impl<'e> NodeBuilder<'e> {
    /// Rebuild the graph from a declaration file on disk, following
    /// `include` directives relative to the including file.
    pub fn build_root(env: &'e ConfigEnvironment, root: impl AsRef<Path>) -> KnobsResult<()> {
        env.reset();
        let mut builder = NodeBuilder {
            env,
            context_stmts: Vec::new(),
            loaded: IndexSet::new(),
        };
        builder.load_file(root.as_ref())?;
        builder.finish()
    }

    /// Rebuild the graph from an in-memory source, e.g. a test fixture.
    pub fn build_source(env: &'e ConfigEnvironment, file: &str, source: &str) -> KnobsResult<()> {
        env.reset();
        let mut builder = NodeBuilder {
            env,
            context_stmts: Vec::new(),
            loaded: IndexSet::new(),
        };
        builder.process_source(file, source, None)?;
        builder.finish()
    }

    fn load_file(&mut self, path: &Path) -> KnobsResult<()> {
        let canonical = path
            .canonicalize()
            .with_context(|| format!("unable to resolve {}", path.display()))?;

        // Each file loads once; a second include is a no-op, which also
        // breaks include cycles.
        if !self.loaded.insert(canonical.clone()) {
            return Ok(());
        }

        let source = fs::read_to_string(&canonical)
            .with_context(|| format!("unable to read {}", canonical.display()))?;
        let dir = canonical.parent().map(Path::to_path_buf);

        self.process_source(&path.display().to_string(), &source, dir.as_deref())
    }

    fn process_source(&mut self, file: &str, source: &str, dir: Option<&Path>) -> KnobsResult<()> {
        let parsed = parse_source(source).map_err(|e| {
            let (line, col) = LineIndex::new(source).line_col(e.span.start);
            anyhow::anyhow!("{file}:{line}:{col}: fatal error: {}", e.message)
        })?;

        let fc = FileContext::new(file, source);

        for item in parsed.items {
            match item {
                Item::Declaration(decl) => {
                    self.build_node(decl, &fc)?;
                }
                Item::Include(include) => {
                    let Some(dir) = dir else {
                        bail!("{file}: include is not available for in-memory sources");
                    };
                    self.load_file(&dir.join(&include.path))
                        .with_context(|| format!("failure including file {:?}", include.path))?;
                }
                Item::Statement(stmt) => match stmt.kind {
                    StmtKind::Expr(_) | StmtKind::Assign { .. } => self.context_stmts.push(stmt),
                    _ => {
                        self.env.diagnostics_sink().warn(
                            fc.location(&stmt.span),
                            "<context>",
                            "unsupported statement in shared context; ignored",
                        );
                    }
                },
            }
        }

        Ok(())
    }

    fn build_node(&mut self, decl: Declaration, fc: &FileContext) -> KnobsResult<Rc<ConfigNode>> {
        let location = fc.location(&decl.span);

        let node = match &decl.type_expr {
            Some(type_expr) => {
                let constraint = TypeConstraint::compile(type_expr).map_err(|kind| {
                    NodeError::new(decl.name.clone(), location.clone(), kind)
                })?;
                Rc::new(ConfigNode::new_term(
                    decl.name.clone(),
                    location.clone(),
                    constraint,
                ))
            }
            None => Rc::new(ConfigNode::new_group(decl.name.clone(), location.clone())),
        };

        self.apply_modifiers(&node, &decl.modifiers, fc);

        let mut help = String::new();
        let mut stmts = Vec::new();
        let mut children = Vec::new();

        for item in decl.body {
            match item {
                BodyItem::Declaration(child_decl) => {
                    if node.is_term() {
                        return Err(
                            node.config_error(NodeErrorKind::NestedInTerm(child_decl.name))
                        );
                    }
                    children.push(self.build_node(child_decl, fc)?);
                }
                BodyItem::Statement(stmt) => {
                    if let StmtKind::Expr(expr) = &stmt.kind {
                        if let ExprKind::Literal(Literal::Str(text)) = &expr.kind {
                            help.push_str(text);
                            help.push('\n');
                            continue;
                        }
                    }
                    stmts.push(stmt);
                }
            }
        }

        if !help.is_empty() {
            node.set_help_text(dedent(&help).trim().to_string());
        }

        NodeValidator::new(&node, fc, self.env.diagnostics_sink()).validate(&stmts);
        let rewritten = NodeBodyRewriter::new(&node, fc, self.env.diagnostics_sink()).rewrite(stmts);
        node.set_dependency(rewritten.dependency);
        node.set_body(rewritten.stmts);

        self.env.register_node(Rc::clone(&node))?;

        for child in &children {
            node.add_child(child);
        }

        Ok(node)
    }

    fn apply_modifiers(&self, node: &ConfigNode, modifiers: &[ModifierExpr], fc: &FileContext) {
        for modifier in modifiers {
            match modifier {
                ModifierExpr::Text { value, .. } => node.set_label(value.clone()),
                ModifierExpr::Marker { name, span } => match name.as_str() {
                    "readonly" => node.set_readonly(true),
                    "hidden" => node.set_hidden(true),
                    "flag" => {
                        node.set_hidden(true);
                        node.set_readonly(true);
                    }
                    other => self.env.diagnostics_sink().warn(
                        fc.location(span),
                        node.name(),
                        format!("unknown modifier: @ {other}"),
                    ),
                },
                ModifierExpr::Binding { key, value, .. } => {
                    if key == "parent" {
                        node.set_parent_name(value.clone());
                    } else {
                        node.set_property(key.clone(), Some(value.clone()));
                    }
                }
                ModifierExpr::Unknown { text, span } => {
                    self.env.diagnostics_sink().warn(
                        fc.location(span),
                        node.name(),
                        format!("unknown modifier: {text}"),
                    );
                }
            }
        }
    }

    fn finish(mut self) -> KnobsResult<()> {
        self.env
            .set_exec_context(std::mem::take(&mut self.context_stmts));
        self.env.relocate_children()?;
        self.env.link_dependencies();
        self.env.prime()
    }
}
