use std::cell::RefCell;

use indexmap::IndexMap;

use crate::errors::{KnobsResult, NodeErrorKind};
use crate::eval::EvaluationContext;
use crate::nodes::ConfigNode;
use crate::properties::NodeStatus;
use crate::value::Value;

/// What a cross-node reference reads or writes. Only the resolved value
/// is exposed today; the key scheme leaves room for more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Value,
}

impl AccessorKind {
    pub fn from_attr(attr: &str) -> Option<AccessorKind> {
        match attr {
            "val" => Some(AccessorKind::Value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessorKind::Value => "val",
        }
    }
}

/// One rewritten cross-node reference: reading forces the target to
/// re-evaluate (unless it is mid-update), writing enforces read-only
/// protection.
#[derive(Debug, Clone)]
pub struct LazyBinding {
    kind: AccessorKind,
    target: String,
}

impl LazyBinding {
    pub fn new(kind: AccessorKind, target: impl Into<String>) -> Self {
        LazyBinding {
            kind,
            target: target.into(),
        }
    }

    pub fn key(&self) -> String {
        Self::key_for(self.kind, &self.target)
    }

    pub fn key_for(kind: AccessorKind, target: &str) -> String {
        format!("{}${}", kind.as_str(), target)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub(crate) fn resolve_get(
        &self,
        source: &ConfigNode,
        ctx: &EvaluationContext,
    ) -> KnobsResult<Option<Value>> {
        let Some(node) = ctx.env().get_node(&self.target) else {
            return Err(
                source.config_error(NodeErrorKind::UndeclaredReference(self.target.clone()))
            );
        };

        if node.status() == NodeStatus::Updating {
            // Cycle guard: hand back the last cached value so the refresh
            // terminates in one pass. Mutually-referencing nodes see one
            // refresh of staleness.
            ctx.env().diagnostics_sink().warn(
                source.location().clone(),
                source.name(),
                format!(
                    "cyclic dependency detected: {} <-> {}. Reusing cached value, maybe stale",
                    source.name(),
                    self.target
                ),
            );
        } else {
            node.update(ctx)?;
        }

        Ok(node.value())
    }

    pub(crate) fn resolve_set(
        &self,
        source: &ConfigNode,
        ctx: &EvaluationContext,
        value: Value,
    ) -> KnobsResult<()> {
        let Some(node) = ctx.env().get_node(&self.target) else {
            return Err(
                source.config_error(NodeErrorKind::UndeclaredReference(self.target.clone()))
            );
        };

        if node.is_readonly() {
            return Err(source.config_error(NodeErrorKind::ReadonlyWrite(self.target.clone())));
        }

        node.set_value_raw(Some(value));
        Ok(())
    }
}

/// The per-node accessor table the rewriter populates and the evaluator
/// indexes into.
#[derive(Debug, Default)]
pub struct LazyLookup {
    table: RefCell<IndexMap<String, LazyBinding>>,
}

impl LazyLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding, returning its key. Idempotent per key.
    pub fn intern(&self, binding: LazyBinding) -> String {
        let key = binding.key();
        self.table
            .borrow_mut()
            .entry(key.clone())
            .or_insert(binding);
        key
    }

    pub fn get(&self, key: &str) -> Option<LazyBinding> {
        self.table.borrow().get(key).cloned()
    }
}
