use knobs_syntax::SourceLocation;
use thiserror::Error;

pub type KnobsResult<T> = anyhow::Result<T>;

/// A fatal error attributed to one configuration node. Diagnostics always
/// carry the node's declaration site.
#[derive(Error, Debug)]
#[error("{location}: fatal error: {node}: {kind}")]
pub struct NodeError {
    pub node: String,
    pub location: SourceLocation,
    pub kind: NodeErrorKind,
}

impl NodeError {
    pub fn new(node: impl Into<String>, location: SourceLocation, kind: NodeErrorKind) -> Self {
        NodeError {
            node: node.into(),
            location,
            kind,
        }
    }
}

#[derive(Error, Debug)]
pub enum NodeErrorKind {
    #[error("redefinition of '{0}'")]
    Redefinition(String),

    #[error("unknown parent: {0}")]
    UnknownParent(String),

    #[error("not a valid parent: {0}")]
    InvalidParent(String),

    #[error("config: '{0}' does not exist")]
    UndeclaredReference(String),

    #[error("unmatched type: expect: '{expected}', got: {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("{0} is readonly")]
    ReadonlyWrite(String),

    #[error("cannot nest '{0}' inside a term")]
    NestedInTerm(String),

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("{0}")]
    Evaluation(String),
}

#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("refresh re-entered while a refresh is already running")]
    ReentrantRefresh,
}
