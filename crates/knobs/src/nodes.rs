use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use knobs_syntax::ast::Stmt;
use knobs_syntax::SourceLocation;
use scopeguard::ScopeGuard;

use crate::depend::Dependency;
use crate::errors::{KnobsResult, NodeError, NodeErrorKind};
use crate::eval::{EvaluationContext, Evaluator};
use crate::lazy::LazyLookup;
use crate::properties::{NodeStatus, ParentLink, PropertyStore};
use crate::typing::TypeConstraint;
use crate::value::Value;

/// One declared configuration unit. Kind decides the semantics: a group
/// gates its descendants, a term resolves one typed value.
#[derive(Debug)]
pub struct ConfigNode {
    name: String,
    location: SourceLocation,
    kind: NodeKind,
    body: RefCell<Vec<Stmt>>,
    lazy: LazyLookup,
    store: RefCell<PropertyStore>,
}

#[derive(Debug)]
pub enum NodeKind {
    Group {
        children: RefCell<IndexMap<String, Weak<ConfigNode>>>,
    },
    Term {
        constraint: TypeConstraint,
    },
}

impl ConfigNode {
    pub fn new_group(name: impl Into<String>, location: SourceLocation) -> Self {
        ConfigNode {
            name: name.into(),
            location,
            kind: NodeKind::Group {
                children: RefCell::new(IndexMap::new()),
            },
            body: RefCell::new(Vec::new()),
            lazy: LazyLookup::new(),
            store: RefCell::new(PropertyStore::new()),
        }
    }

    pub fn new_term(
        name: impl Into<String>,
        location: SourceLocation,
        constraint: TypeConstraint,
    ) -> Self {
        ConfigNode {
            name: name.into(),
            location,
            kind: NodeKind::Term { constraint },
            body: RefCell::new(Vec::new()),
            lazy: LazyLookup::new(),
            store: RefCell::new(PropertyStore::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn is_term(&self) -> bool {
        matches!(self.kind, NodeKind::Term { .. })
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }

    pub fn constraint(&self) -> Option<&TypeConstraint> {
        match &self.kind {
            NodeKind::Term { constraint } => Some(constraint),
            NodeKind::Group { .. } => None,
        }
    }

    pub fn config_error(&self, kind: NodeErrorKind) -> anyhow::Error {
        NodeError::new(self.name.clone(), self.location.clone(), kind).into()
    }

    pub(crate) fn lazy(&self) -> &LazyLookup {
        &self.lazy
    }

    pub(crate) fn set_body(&self, stmts: Vec<Stmt>) {
        *self.body.borrow_mut() = stmts;
    }

    pub(crate) fn store(&self) -> Ref<'_, PropertyStore> {
        self.store.borrow()
    }

    pub(crate) fn store_mut(&self) -> RefMut<'_, PropertyStore> {
        self.store.borrow_mut()
    }

    // ---- property surface -------------------------------------------------

    pub fn value(&self) -> Option<Value> {
        self.store().value.clone()
    }

    /// External write. Readonly terms reject it; see `set_value_raw` for
    /// the restore path that bypasses the check.
    pub fn set_value(&self, value: Option<Value>) -> KnobsResult<()> {
        if self.is_readonly() {
            return Err(self.config_error(NodeErrorKind::ReadonlyWrite(self.name.clone())));
        }
        self.set_value_raw(value);
        Ok(())
    }

    pub(crate) fn set_value_raw(&self, value: Option<Value>) {
        self.store_mut().value = value;
    }

    /// Drop an externally-set value so the body's result takes over at
    /// the next refresh.
    pub fn clear_value(&self) {
        self.set_value_raw(None);
    }

    pub fn status(&self) -> NodeStatus {
        self.store().status
    }

    pub(crate) fn set_status(&self, status: NodeStatus) {
        self.store_mut().status = status;
    }

    pub fn is_readonly(&self) -> bool {
        self.store().readonly
    }

    pub fn set_readonly(&self, readonly: bool) {
        self.store_mut().readonly = readonly;
    }

    pub fn is_hidden(&self) -> bool {
        self.store().hidden
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.store_mut().hidden = hidden;
    }

    pub fn label(&self) -> Option<String> {
        self.store().label.clone()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        self.store_mut().label = Some(label.into());
    }

    pub fn help_text(&self) -> Option<String> {
        self.store().help_text.clone()
    }

    pub(crate) fn set_help_text(&self, help: impl Into<String>) {
        self.store_mut().help_text = Some(help.into());
    }

    pub fn property(&self, key: &str) -> Option<String> {
        self.store().extra.get(key).cloned()
    }

    pub fn set_property(&self, key: impl Into<String>, value: Option<String>) {
        let mut store = self.store_mut();
        match value {
            Some(v) => {
                store.extra.insert(key.into(), v);
            }
            None => {
                store.extra.shift_remove(&key.into());
            }
        }
    }

    pub fn dependency(&self) -> Option<Dependency> {
        self.store().dependency.clone()
    }

    pub(crate) fn set_dependency(&self, dependency: Option<Dependency>) {
        self.store_mut().dependency = dependency;
    }

    pub fn linkage(&self) -> Vec<(String, String)> {
        self.store().linkage.clone()
    }

    pub(crate) fn clear_linkage(&self) {
        self.store_mut().linkage.clear();
    }

    pub(crate) fn add_linkage(&self, dependent: impl Into<String>, predicate: impl Into<String>) {
        self.store_mut()
            .linkage
            .push((dependent.into(), predicate.into()));
    }

    /// The externally toggleable enabled flag; one input to the computed
    /// enablement, not the result of it.
    pub fn set_enabled(&self, enabled: bool) {
        self.store_mut().enabled = enabled;
    }

    /// Enablement as of the last refresh.
    pub fn enabled(&self) -> bool {
        let store = self.store();
        store.active.unwrap_or(store.enabled)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.store_mut().active = Some(active);
    }

    /// The node's own contribution to enablement: the raw flag, and its
    /// own value when that value is boolean. Parent and dependency terms
    /// are conjoined by the environment.
    pub(crate) fn raw_enabled(&self) -> bool {
        let store = self.store();
        let mut enabled = store.enabled;
        if let Some(Value::Bool(b)) = store.value {
            enabled = enabled && b;
        }
        enabled
    }

    // ---- structure --------------------------------------------------------

    pub fn parent(&self) -> Option<Rc<ConfigNode>> {
        match &self.store().parent {
            Some(ParentLink::Linked(weak)) => weak.upgrade(),
            _ => None,
        }
    }

    pub(crate) fn has_parent_link(&self) -> bool {
        self.store().parent.is_some()
    }

    pub(crate) fn parent_name(&self) -> Option<String> {
        match &self.store().parent {
            Some(ParentLink::Named(name)) => Some(name.clone()),
            _ => None,
        }
    }

    pub(crate) fn set_parent_name(&self, name: impl Into<String>) {
        self.store_mut().parent = Some(ParentLink::Named(name.into()));
    }

    /// Attach a child. First declaration of a name wins; a duplicate is
    /// ignored and keeps its previous parent link.
    pub fn add_child(self: &Rc<Self>, child: &Rc<ConfigNode>) -> bool {
        let NodeKind::Group { children } = &self.kind else {
            return false;
        };

        let mut children = children.borrow_mut();
        if children.contains_key(child.name()) {
            return false;
        }

        children.insert(child.name().to_string(), Rc::downgrade(child));
        child.store_mut().parent = Some(ParentLink::Linked(Rc::downgrade(self)));
        true
    }

    pub fn children(&self) -> Vec<Rc<ConfigNode>> {
        match &self.kind {
            NodeKind::Group { children } => children
                .borrow()
                .values()
                .filter_map(Weak::upgrade)
                .collect(),
            NodeKind::Term { .. } => Vec::new(),
        }
    }

    // ---- evaluation -------------------------------------------------------

    /// Re-run the compiled body. `Empty/Latest/Error -> Updating`, then
    /// `Latest` on success or `Error` on failure; the error is re-raised
    /// wrapped with this node's identity.
    pub(crate) fn update(&self, ctx: &EvaluationContext) -> KnobsResult<Option<Value>> {
        self.set_status(NodeStatus::Updating);
        let error_state = scopeguard::guard((), |()| {
            self.set_status(NodeStatus::Error);
        });

        let body = self.body.borrow();
        let result = Evaluator::new(Some(self), ctx)
            .run(&body)
            .map_err(|e| self.wrap_error(e))?;
        drop(body);

        ScopeGuard::into_inner(error_state);
        self.set_status(NodeStatus::Latest);

        if self.is_term() {
            let mut store = self.store_mut();
            if store.readonly || store.value.is_none() {
                store.value = result.clone();
            }
        }

        Ok(result)
    }

    /// Post-refresh type-constraint check.
    pub(crate) fn sanity_check(&self) -> KnobsResult<()> {
        let NodeKind::Term { constraint } = &self.kind else {
            return Ok(());
        };

        let value = self.value();
        constraint
            .ensure(value.as_ref())
            .map_err(|kind| self.config_error(kind))
    }

    fn wrap_error(&self, error: anyhow::Error) -> anyhow::Error {
        if error.downcast_ref::<NodeError>().is_some() {
            return error;
        }
        self.config_error(NodeErrorKind::Evaluation(error.to_string()))
    }
}
