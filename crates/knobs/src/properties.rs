use std::fmt;
use std::rc::Weak;

use indexmap::IndexMap;

use crate::depend::Dependency;
use crate::nodes::ConfigNode;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Empty,
    Updating,
    Latest,
    Error,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Empty => "Empty",
            NodeStatus::Updating => "Updating",
            NodeStatus::Latest => "Latest",
            NodeStatus::Error => "Error",
        };
        f.write_str(s)
    }
}

/// Structural parent link. Declared as a name (the `parent :=` modifier)
/// until relocation resolves it to the owning group.
#[derive(Clone)]
pub enum ParentLink {
    Named(String),
    Linked(Weak<ConfigNode>),
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentLink::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ParentLink::Linked(_) => f.write_str("Linked(..)"),
        }
    }
}

/// Per-node metadata, decoupled from node identity so the node itself
/// stays immutable after compilation. `extra` holds arbitrary
/// named-property modifiers.
#[derive(Debug, Default)]
pub struct PropertyStore {
    pub value: Option<Value>,
    /// Externally toggleable flag; one input to the computed enablement.
    pub enabled: bool,
    /// Enablement computed by the last refresh.
    pub active: Option<bool>,
    pub status: NodeStatus,
    pub hidden: bool,
    pub readonly: bool,
    pub label: Option<String>,
    pub help_text: Option<String>,
    pub parent: Option<ParentLink>,
    pub dependency: Option<Dependency>,
    /// Reverse index: (dependent node, predicate text) pairs mentioning
    /// this node. Introspection only; refresh never reads it.
    pub linkage: Vec<(String, String)>,
    pub extra: IndexMap<String, String>,
}

impl Default for NodeStatus {
    fn default() -> Self {
        NodeStatus::Empty
    }
}

impl PropertyStore {
    pub fn new() -> Self {
        PropertyStore {
            enabled: true,
            ..Default::default()
        }
    }
}
