//! In-process hierarchical registry: an arena tree of named nodes with
//! inheritable flags, per-node change listeners and optional typed values.
//!
//! The entry point for most callers is [`ValueTree`]; [`Tree`] is the
//! structural layer underneath, generic over a [`NodeData`] payload.
//!
//! # Example
//!
//! ```
//! use regtree_core::ValueTree;
//!
//! let tree: ValueTree<String> = ValueTree::new();
//! let cache = tree.child_find_or_create(tree.root(), "srv.eu.cache")?;
//! tree.set_value(cache, Some("hot".to_string()))?;
//!
//! assert_eq!(tree.node_count(tree.root()), 3);
//! assert_eq!(tree.effective_path(cache), "srv.eu.cache");
//! assert_eq!(tree.get_value(cache)?, Some("hot".to_string()));
//! # Ok::<(), regtree_core::TreeError>(())
//! ```

mod dispatch;
pub mod error;
pub mod event;
pub mod flag;
pub mod tree;
pub mod value;

pub use error::TreeError;
pub use event::{Event, EventKind, ListenerCallback, ListenerFlags, Veto};
pub use flag::{Flag, Flags};
pub use tree::{ConflictStrategy, CreateGuard, NodeData, NodeFactory, NodeId, Tree};
pub use value::{TreeValue, ValueCell, ValueTree};
