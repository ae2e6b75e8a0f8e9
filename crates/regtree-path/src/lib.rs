//! Path addressing for the regtree registry.
//!
//! Three flavors of the same idea, leaves first:
//! - [`PathSegments`]: an ordered sequence of non-empty segments plus a
//!   separator ("glue") string, with slicing, prefix scoring and wildcard
//!   pattern compilation.
//! - [`Namespace`]: the dot-glued flavor used for tree addressing, with
//!   domain/TLD splitting.
//! - [`NodePath`]: the filesystem-like flavor with an absolute/relative
//!   flag and a choice of separator character.
//!
//! # Example
//!
//! ```
//! use regtree_path::Namespace;
//!
//! let ns = Namespace::parse("a.b");
//! assert_eq!(ns.len(), 2);
//! assert_eq!(ns.match_percentage(&Namespace::parse("a.b.c")), 110);
//! ```

pub mod namespace;
pub mod node_path;
pub mod segments;

pub use namespace::{DomainSplit, Namespace, DEFAULT_TLDS, NAMESPACE_GLUE};
pub use node_path::{NodePath, PathSeparator};
pub use segments::{PathError, PathSegments};
