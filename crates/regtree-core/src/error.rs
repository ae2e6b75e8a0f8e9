//! Error taxonomy for tree operations.

use regtree_path::PathError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("invalid node name {0:?}")]
    InvalidName(String),
    #[error("node is disposed")]
    Disposed,
    #[error("node is read-only")]
    ReadOnly,
    #[error("child {0:?} already exists")]
    ChildExists(String),
    #[error("value override is forbidden")]
    OverrideForbidden,
    #[error("a value may not reference a node")]
    ValueIsNode,
    #[error("child creation vetoed: {0}")]
    CreateVetoed(String),
    #[error("operation vetoed: {0}")]
    Vetoed(String),
    /// Raised by [`NodeFactory`](crate::tree::NodeFactory) implementations
    /// to abort a creation with their own message.
    #[error("node factory failed: {0}")]
    Factory(String),
    #[error("node cannot be attached beneath its own subtree")]
    Cycle,
    #[error("the root node cannot be moved")]
    RootImmovable,
    #[error("the disposed flag cannot be toggled directly")]
    FlagImmutable,
    #[error(transparent)]
    Path(#[from] PathError),
}
