//! Valued tree: one optional value slot per node.

use crate::error::TreeError;
use crate::event::EventKind;
use crate::flag::Flag;
use crate::tree::{CreateGuard, NodeData, NodeFactory, NodeId, Tree};
use std::ops::Deref;
use std::sync::Arc;

/// Marker bound for storable values. `is_node_ref` guards against values
/// that smuggle a node handle into a value slot; such values are rejected
/// by [`ValueTree::set_value`].
pub trait TreeValue: Clone + Send + Sync + 'static {
    fn is_node_ref(&self) -> bool {
        false
    }
}

impl TreeValue for serde_json::Value {}
impl TreeValue for String {}
impl TreeValue for bool {}
impl TreeValue for i64 {}
impl TreeValue for u64 {}
impl TreeValue for f64 {}

/// The per-node payload of a [`ValueTree`].
#[derive(Debug, Clone)]
pub struct ValueCell<V> {
    value: Option<V>,
}

impl<V> ValueCell<V> {
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

impl<V> Default for ValueCell<V> {
    fn default() -> Self {
        ValueCell { value: None }
    }
}

impl<V: TreeValue> NodeData for ValueCell<V> {
    /// A present incoming value replaces the current one; an absent one
    /// leaves it alone.
    fn merge_from(&mut self, other: Self) {
        if other.value.is_some() {
            self.value = other.value;
        }
    }

    fn is_trimmable(&self) -> bool {
        self.value.is_none()
    }

    fn duplicate(&self) -> Self {
        self.clone()
    }
}

/// A [`Tree`] whose nodes each carry an optional value of type `V`.
///
/// All structural operations are available through `Deref`; this type adds
/// the value discipline: store/remove/change events, the `NO_OVERRIDE`
/// write-once rule and the `VALUES_ONLY` leaf rule.
pub struct ValueTree<V: TreeValue> {
    tree: Tree<ValueCell<V>>,
}

impl<V: TreeValue> ValueTree<V> {
    pub fn new() -> Self {
        let factory: NodeFactory<ValueCell<V>> = Arc::new(|_, _| Ok(ValueCell::default()));
        let guard: CreateGuard<ValueCell<V>> = Arc::new(|cell, ancestor_flags, name| {
            if ancestor_flags.contains(Flag::VALUES_ONLY) && cell.has_value() {
                return Err(TreeError::CreateVetoed(format!(
                    "cannot create {name:?} under a value-holding node"
                )));
            }
            Ok(())
        });
        ValueTree {
            tree: Tree::with_guard(ValueCell::default(), factory, guard),
        }
    }

    pub fn tree(&self) -> &Tree<ValueCell<V>> {
        &self.tree
    }

    /// Stores (`Some`) or clears (`None`) the node's value and returns the
    /// previous one.
    ///
    /// Rejected for disposed or (inherited) read-only nodes, for values
    /// answering [`TreeValue::is_node_ref`], and under an effective
    /// `NO_OVERRIDE` once a value is present (write-once, clearing
    /// included). Fires value-store on empty-to-present, value-remove on
    /// present-to-empty, then value-change on every call.
    pub fn set_value(&self, node: NodeId, value: Option<V>) -> Result<Option<V>, TreeError> {
        if let Some(v) = &value {
            if v.is_node_ref() {
                return Err(TreeError::ValueIsNode);
            }
        }
        self.tree.mutation_gate(node)?;
        if self.tree.has_flag(node, Flag::NO_OVERRIDE) && self.has_value(node) {
            return Err(TreeError::OverrideForbidden);
        }
        let storing = value.is_some();
        let previous = self
            .tree
            .with_data_mut(node, |cell| std::mem::replace(&mut cell.value, value));
        let had = previous.is_some();
        self.tree.mark_dirty(node)?;
        if storing && !had {
            self.tree.dispatch(node, EventKind::ValueStore, None, None, false)?;
        } else if had && !storing {
            self.tree.dispatch(node, EventKind::ValueRemove, None, None, false)?;
        }
        self.tree.dispatch(node, EventKind::ValueChange, None, None, false)?;
        Ok(previous)
    }

    pub fn get_value(&self, node: NodeId) -> Result<Option<V>, TreeError> {
        if self.tree.is_disposed(node) {
            return Err(TreeError::Disposed);
        }
        Ok(self.tree.with_data(node, |cell| cell.value.clone()))
    }

    pub fn has_value(&self, node: NodeId) -> bool {
        self.tree.with_data(node, |cell| cell.value.is_some())
    }

    /// Returns the stored value, or stores and returns `supplier()`'s.
    /// The store goes through [`ValueTree::set_value`], so flag and
    /// listener rules apply.
    pub fn get_or_insert_with(
        &self,
        node: NodeId,
        supplier: impl FnOnce() -> V,
    ) -> Result<V, TreeError> {
        if let Some(v) = self.get_value(node)? {
            return Ok(v);
        }
        let v = supplier();
        self.set_value(node, Some(v.clone()))?;
        Ok(v)
    }

    /// Reads the current value, feeds it through `f` and writes the result
    /// back through [`ValueTree::set_value`]. Returns the previous value.
    pub fn update_value(
        &self,
        node: NodeId,
        f: impl FnOnce(Option<V>) -> Option<V>,
    ) -> Result<Option<V>, TreeError> {
        let current = self.get_value(node)?;
        self.set_value(node, f(current))
    }

    /// Present values of `node`'s direct children, in child order.
    pub fn values(&self, node: NodeId) -> Vec<V> {
        self.tree
            .children(node)
            .into_iter()
            .filter_map(|c| self.tree.with_data(c, |cell| cell.value.clone()))
            .collect()
    }

    /// Present values of the whole subtree, depth-first, each node before
    /// its descendants.
    pub fn flat_values(&self, node: NodeId) -> Vec<V> {
        let mut out = Vec::new();
        self.collect_flat(node, &mut out);
        out
    }

    fn collect_flat(&self, node: NodeId, out: &mut Vec<V>) {
        if let Some(v) = self.tree.with_data(node, |cell| cell.value.clone()) {
            out.push(v);
        }
        for c in self.tree.children(node) {
            self.collect_flat(c, out);
        }
    }
}

impl<V: TreeValue> Default for ValueTree<V> {
    fn default() -> Self {
        ValueTree::new()
    }
}

impl<V: TreeValue> Deref for ValueTree<V> {
    type Target = Tree<ValueCell<V>>;

    fn deref(&self) -> &Self::Target {
        &self.tree
    }
}
