//! Arena node tree.
//!
//! Nodes live in a `Vec` of slots addressed by [`NodeId`] (a stable `u32`
//! index). Slots are never reused: a destroyed node keeps its slot and
//! answers [`Flag::DISPOSED`] forever, so stale ids can never alias a new
//! node.
//!
//! All operations take `&self`; the arena sits behind a `parking_lot`
//! `RwLock`. Listener callbacks are never invoked while the lock is held.

use crate::dispatch::{self, FirePlan};
use crate::error::TreeError;
use crate::event::{EventKind, ListenerCallback, ListenerEntry, ListenerFlags, ListenerTable};
use crate::flag::{Flag, Flags};
use parking_lot::RwLock;
use regtree_path::PathSegments;
use std::sync::Arc;

/// Stable handle to a node slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-node payload seam. Specializations attach their state here instead
/// of subclassing the tree.
pub trait NodeData: Send + Sync + 'static {
    /// Folds `other` into `self` when two same-named nodes are merged.
    fn merge_from(&mut self, other: Self);

    /// Whether a node holding this payload may be trimmed away.
    fn is_trimmable(&self) -> bool {
        true
    }

    /// Payload for a structural copy of the node.
    fn duplicate(&self) -> Self;
}

impl NodeData for () {
    fn merge_from(&mut self, _other: Self) {}

    fn duplicate(&self) -> Self {}
}

/// Builds the payload for a node about to be created under `parent` with
/// the given name. An error aborts the creation.
pub type NodeFactory<D> =
    Arc<dyn Fn(Option<NodeId>, &str) -> Result<D, TreeError> + Send + Sync>;

/// Consulted before child creation, once per ancestor: receives the
/// prospective parent's payload, the ancestor's local flags and the child
/// name. Must be pure; it runs with the tree lock held.
pub type CreateGuard<D> = Arc<dyn Fn(&D, Flags, &str) -> Result<(), TreeError> + Send + Sync>;

/// What to do when `add_child` meets an existing child of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictStrategy {
    /// Keep the existing child; the incoming node stays detached.
    Ignore,
    /// Destroy the existing child, then attach the incoming node.
    Overwrite,
    /// Fold the incoming node into the existing child and destroy it.
    Merge,
    /// Destroy every current child, then attach the incoming node.
    Clear,
}

struct Slot<D> {
    name: String,
    flags: Flags,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: ListenerTable,
    separator: Option<char>,
    data: D,
}

/// The registry tree.
pub struct Tree<D: NodeData> {
    slots: RwLock<Vec<Slot<D>>>,
    root: NodeId,
    factory: NodeFactory<D>,
    guard: Option<CreateGuard<D>>,
}

impl<D: NodeData> Tree<D> {
    /// Creates a tree whose root carries `root_data`. The factory builds
    /// payloads for nodes created through the tree itself.
    pub fn new(root_data: D, factory: NodeFactory<D>) -> Self {
        Self::build(root_data, factory, None)
    }

    /// Like [`Tree::new`], with a creation guard consulted against every
    /// unblocked ancestor before a child may be created.
    pub fn with_guard(root_data: D, factory: NodeFactory<D>, guard: CreateGuard<D>) -> Self {
        Self::build(root_data, factory, Some(guard))
    }

    fn build(root_data: D, factory: NodeFactory<D>, guard: Option<CreateGuard<D>>) -> Self {
        let root_slot = Slot {
            name: String::new(),
            flags: Flags::empty(),
            parent: None,
            children: Vec::new(),
            listeners: ListenerTable::default(),
            separator: None,
            data: root_data,
        };
        Tree {
            slots: RwLock::new(vec![root_slot]),
            root: NodeId(0),
            factory,
            guard,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node's local name. Empty only for the root.
    pub fn name(&self, node: NodeId) -> String {
        self.slots.read()[node.index()].name.clone()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slots.read()[node.index()].parent
    }

    /// Snapshot of the node's children, in insertion order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.slots.read()[node.index()].children.clone()
    }

    pub fn is_disposed(&self, node: NodeId) -> bool {
        self.has_local_flag(node, Flag::DISPOSED)
    }

    // ---- flags -----------------------------------------------------------

    /// Inherited flag query: walks toward the root until the flag is found
    /// or a parent carrying `NO_FLAG_RECURSION` blocks the walk. A blocked
    /// parent is not consulted at all, while the blocking node itself still
    /// reports its own local flags.
    pub fn has_flag(&self, node: NodeId, flag: Flag) -> bool {
        let slots = self.slots.read();
        Self::flag_set_locked(&slots, node, flag)
    }

    pub fn has_local_flag(&self, node: NodeId, flag: Flag) -> bool {
        self.slots.read()[node.index()].flags.contains(flag)
    }

    pub fn local_flags(&self, node: NodeId) -> Flags {
        self.slots.read()[node.index()].flags
    }

    /// Sets a local flag. `DISPOSED` is owned by [`Tree::destroy`] and
    /// cannot be toggled here.
    pub fn set_flag(&self, node: NodeId, flag: Flag) -> Result<(), TreeError> {
        if flag == Flag::DISPOSED {
            return Err(TreeError::FlagImmutable);
        }
        let mut slots = self.slots.write();
        let slot = &mut slots[node.index()];
        if slot.flags.contains(Flag::DISPOSED) {
            return Err(TreeError::Disposed);
        }
        slot.flags.set(flag);
        Ok(())
    }

    pub fn clear_flag(&self, node: NodeId, flag: Flag) -> Result<(), TreeError> {
        if flag == Flag::DISPOSED {
            return Err(TreeError::FlagImmutable);
        }
        let mut slots = self.slots.write();
        let slot = &mut slots[node.index()];
        if slot.flags.contains(Flag::DISPOSED) {
            return Err(TreeError::Disposed);
        }
        slot.flags.clear(flag);
        Ok(())
    }

    pub fn mark_dirty(&self, node: NodeId) -> Result<(), TreeError> {
        self.set_flag(node, Flag::DIRTY)
    }

    pub fn clear_dirty(&self, node: NodeId) -> Result<(), TreeError> {
        self.clear_flag(node, Flag::DIRTY)
    }

    pub fn is_dirty(&self, node: NodeId) -> bool {
        self.has_local_flag(node, Flag::DIRTY)
    }

    fn flag_set_locked(slots: &[Slot<D>], node: NodeId, flag: Flag) -> bool {
        let mut cur = node;
        loop {
            let slot = &slots[cur.index()];
            if slot.flags.contains(flag) {
                return true;
            }
            let parent = match slot.parent {
                Some(p) => p,
                None => return false,
            };
            if slots[parent.index()].flags.contains(Flag::NO_FLAG_RECURSION) {
                return false;
            }
            cur = parent;
        }
    }

    // ---- listeners -------------------------------------------------------

    /// Registers a listener on `node`. The handle is unique per node and
    /// never reused.
    pub fn listen(
        &self,
        node: NodeId,
        kind: EventKind,
        flags: ListenerFlags,
        callback: ListenerCallback,
    ) -> Result<u64, TreeError> {
        let mut slots = self.slots.write();
        let slot = &mut slots[node.index()];
        if slot.flags.contains(Flag::DISPOSED) {
            return Err(TreeError::Disposed);
        }
        Ok(slot.listeners.insert(ListenerEntry {
            kind,
            flags,
            callback,
        }))
    }

    /// Removes a listener by handle; `false` when the handle is unknown.
    pub fn unlisten(&self, node: NodeId, handle: u64) -> bool {
        self.slots.write()[node.index()].listeners.remove(handle)
    }

    /// Raises an event at `origin` and delivers it along the root-to-origin
    /// chain. Plans are snapshotted under the write lock (which is where
    /// `FIRE_ONCE` entries are consumed), then the lock is dropped before
    /// any callback runs.
    pub(crate) fn dispatch(
        &self,
        origin: NodeId,
        kind: EventKind,
        name: Option<String>,
        subject: Option<NodeId>,
        veto: bool,
    ) -> Result<(), TreeError> {
        let plans = {
            let mut slots = self.slots.write();
            let mut chain = Vec::new();
            let mut cur = Some(origin);
            while let Some(id) = cur {
                chain.push(id);
                cur = slots[id.index()].parent;
            }
            chain.reverse();
            chain
                .into_iter()
                .map(|id| FirePlan {
                    node: id,
                    local: id == origin,
                    entries: slots[id.index()].listeners.snapshot_matching(kind),
                })
                .collect::<Vec<_>>()
        };
        dispatch::fire(plans, origin, kind, name, subject, veto)
    }

    // ---- creation --------------------------------------------------------

    fn validate_name(name: &str) -> Result<(), TreeError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | '_' | '.'))
        {
            return Err(TreeError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn find_child_locked(slots: &[Slot<D>], parent: NodeId, name: &str) -> Option<NodeId> {
        slots[parent.index()]
            .children
            .iter()
            .copied()
            .find(|c| slots[c.index()].name == name)
    }

    fn guard_check_locked(
        &self,
        slots: &[Slot<D>],
        parent: NodeId,
        name: &str,
    ) -> Result<(), TreeError> {
        let guard = match &self.guard {
            Some(g) => g,
            None => return Ok(()),
        };
        let data = &slots[parent.index()].data;
        let mut cur = parent;
        loop {
            guard(data, slots[cur.index()].flags, name)?;
            let up = match slots[cur.index()].parent {
                Some(p) => p,
                None => return Ok(()),
            };
            if slots[up.index()].flags.contains(Flag::NO_FLAG_RECURSION) {
                return Ok(());
            }
            cur = up;
        }
    }

    /// Creates a fresh child named `name` under `parent`, building its
    /// payload through the factory. Fires child-add before (vetoable) and
    /// after events at the parent.
    pub fn create_child(&self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        Self::validate_name(name)?;
        {
            let slots = self.slots.read();
            if slots[parent.index()].flags.contains(Flag::DISPOSED) {
                return Err(TreeError::Disposed);
            }
            if Self::flag_set_locked(&slots, parent, Flag::READ_ONLY) {
                return Err(TreeError::ReadOnly);
            }
            if Self::find_child_locked(&slots, parent, name).is_some() {
                return Err(TreeError::ChildExists(name.to_string()));
            }
            self.guard_check_locked(&slots, parent, name)?;
        }
        self.dispatch(
            parent,
            EventKind::ChildAddBefore,
            Some(name.to_string()),
            None,
            true,
        )?;
        let data = (self.factory)(Some(parent), name)?;
        let id = {
            let mut slots = self.slots.write();
            if slots[parent.index()].flags.contains(Flag::DISPOSED) {
                return Err(TreeError::Disposed);
            }
            if Self::find_child_locked(&slots, parent, name).is_some() {
                return Err(TreeError::ChildExists(name.to_string()));
            }
            let id = NodeId(slots.len() as u32);
            slots.push(Slot {
                name: name.to_string(),
                flags: Flags::empty(),
                parent: Some(parent),
                children: Vec::new(),
                listeners: ListenerTable::default(),
                separator: None,
                data,
            });
            slots[parent.index()].children.push(id);
            slots[parent.index()].flags.set(Flag::DIRTY);
            id
        };
        self.dispatch(
            parent,
            EventKind::ChildAddAfter,
            Some(name.to_string()),
            Some(id),
            false,
        )?;
        Ok(id)
    }

    // ---- attachment ------------------------------------------------------

    /// Attaches an existing node under `parent`, detaching it from its
    /// current parent first. `name` defaults to the node's current name.
    /// A same-named sibling is resolved per `strategy`; note the detach
    /// happens before resolution, so an [`ConflictStrategy::Ignore`]
    /// conflict leaves `child` parentless.
    pub fn add_child(
        &self,
        parent: NodeId,
        name: Option<&str>,
        child: NodeId,
        strategy: ConflictStrategy,
    ) -> Result<NodeId, TreeError> {
        let name = match name {
            Some(n) => n.to_string(),
            None => self.name(child),
        };
        Self::validate_name(&name)?;
        {
            let slots = self.slots.read();
            if slots[parent.index()].flags.contains(Flag::DISPOSED)
                || slots[child.index()].flags.contains(Flag::DISPOSED)
            {
                return Err(TreeError::Disposed);
            }
            if Self::flag_set_locked(&slots, parent, Flag::READ_ONLY) {
                return Err(TreeError::ReadOnly);
            }
            let mut cur = Some(parent);
            while let Some(id) = cur {
                if id == child {
                    return Err(TreeError::Cycle);
                }
                cur = slots[id.index()].parent;
            }
        }
        self.dispatch(
            parent,
            EventKind::ChildAddBefore,
            Some(name.clone()),
            Some(child),
            true,
        )?;
        self.remove_from_parent(child)?;
        let existing = {
            let slots = self.slots.read();
            Self::find_child_locked(&slots, parent, &name)
        };
        let attached = match (strategy, existing) {
            (ConflictStrategy::Ignore, Some(existing)) => return Ok(existing),
            (ConflictStrategy::Overwrite, Some(existing)) => {
                self.destroy(existing)?;
                self.attach(parent, &name, child)?;
                child
            }
            (ConflictStrategy::Merge, Some(existing)) => {
                self.merge(existing, child)?;
                existing
            }
            (ConflictStrategy::Clear, _) => {
                for c in self.children(parent) {
                    self.destroy(c)?;
                }
                self.attach(parent, &name, child)?;
                child
            }
            (_, None) => {
                self.attach(parent, &name, child)?;
                child
            }
        };
        self.dispatch(
            parent,
            EventKind::ChildAddAfter,
            Some(name),
            Some(attached),
            false,
        )?;
        Ok(attached)
    }

    fn attach(&self, parent: NodeId, name: &str, child: NodeId) -> Result<(), TreeError> {
        let mut slots = self.slots.write();
        if slots[parent.index()].flags.contains(Flag::DISPOSED)
            || slots[child.index()].flags.contains(Flag::DISPOSED)
        {
            return Err(TreeError::Disposed);
        }
        if Self::find_child_locked(&slots, parent, name).is_some() {
            return Err(TreeError::ChildExists(name.to_string()));
        }
        slots[child.index()].name = name.to_string();
        slots[child.index()].parent = Some(parent);
        slots[parent.index()].children.push(child);
        slots[parent.index()].flags.set(Flag::DIRTY);
        Ok(())
    }

    // ---- lookup ----------------------------------------------------------

    /// Walks `path` (split on the node's effective separator) with a
    /// linear child scan per hop.
    pub fn child_find(&self, node: NodeId, path: &str) -> Option<NodeId> {
        let slots = self.slots.read();
        if slots[node.index()].flags.contains(Flag::DISPOSED) {
            return None;
        }
        let sep = Self::effective_separator_locked(&slots, node);
        let segments = PathSegments::parse(path, &sep.to_string()).ok()?;
        let mut cur = node;
        for token in segments.iter() {
            cur = Self::find_child_locked(&slots, cur, token)?;
        }
        Some(cur)
    }

    /// Like [`Tree::child_find`], creating every missing hop through the
    /// full creation path (guard, factory, events).
    pub fn child_find_or_create(&self, node: NodeId, path: &str) -> Result<NodeId, TreeError> {
        let sep = self.effective_separator(node);
        let segments = PathSegments::parse(path, &sep.to_string())?;
        let mut cur = node;
        for token in segments.iter() {
            cur = self.hop_find_or_create(cur, token)?;
        }
        Ok(cur)
    }

    fn hop_find_or_create(&self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        let found = {
            let slots = self.slots.read();
            Self::find_child_locked(&slots, parent, name)
        };
        match found {
            Some(c) => Ok(c),
            None => self.create_child(parent, name),
        }
    }

    // ---- detachment & teardown -------------------------------------------

    /// Detaches `node` from its parent, firing child-remove before
    /// (vetoable) and after events at the parent. A node with no parent is
    /// left alone.
    pub fn remove_from_parent(&self, node: NodeId) -> Result<(), TreeError> {
        let (parent, name) = {
            let slots = self.slots.read();
            let slot = &slots[node.index()];
            match slot.parent {
                Some(p) => (p, slot.name.clone()),
                None => return Ok(()),
            }
        };
        self.dispatch(
            parent,
            EventKind::ChildRemoveBefore,
            Some(name.clone()),
            Some(node),
            true,
        )?;
        {
            let mut slots = self.slots.write();
            if slots[node.index()].parent == Some(parent) {
                slots[parent.index()].children.retain(|&c| c != node);
                slots[node.index()].parent = None;
                slots[parent.index()].flags.set(Flag::DIRTY);
            }
        }
        self.dispatch(
            parent,
            EventKind::ChildRemoveAfter,
            Some(name),
            Some(node),
            false,
        )?;
        Ok(())
    }

    /// Destroys `node` and its whole subtree: detaches it, clears every
    /// slot's listeners and links, and stamps `DISPOSED`. Idempotent; the
    /// slots stay allocated so stale ids answer disposed instead of
    /// aliasing.
    pub fn destroy(&self, node: NodeId) -> Result<(), TreeError> {
        let (parent, name) = {
            let slots = self.slots.read();
            let slot = &slots[node.index()];
            if slot.flags.contains(Flag::DISPOSED) {
                return Ok(());
            }
            (slot.parent, slot.name.clone())
        };
        if let Some(parent) = parent {
            self.dispatch(
                parent,
                EventKind::ChildRemoveBefore,
                Some(name.clone()),
                Some(node),
                true,
            )?;
        }
        {
            let mut slots = self.slots.write();
            if let Some(p) = slots[node.index()].parent {
                slots[p.index()].children.retain(|&c| c != node);
                slots[p.index()].flags.set(Flag::DIRTY);
                slots[node.index()].parent = None;
            }
            Self::dispose_subtree_locked(&mut slots, node);
        }
        if let Some(parent) = parent {
            self.dispatch(
                parent,
                EventKind::ChildRemoveAfter,
                Some(name),
                Some(node),
                false,
            )?;
        }
        Ok(())
    }

    fn dispose_subtree_locked(slots: &mut Vec<Slot<D>>, node: NodeId) {
        let children = std::mem::take(&mut slots[node.index()].children);
        for c in children {
            Self::dispose_subtree_locked(slots, c);
        }
        let slot = &mut slots[node.index()];
        slot.listeners.clear();
        slot.parent = None;
        slot.flags = Flag::DISPOSED.into();
    }

    // ---- copy & merge ----------------------------------------------------

    /// Deep copy of `node`'s subtree: fresh ids, names, flags and listener
    /// registrations (callbacks are shared `Arc`s), payloads via
    /// [`NodeData::duplicate`]. The copy's top node has no parent and no
    /// events are fired.
    pub fn duplicate(&self, node: NodeId) -> Result<NodeId, TreeError> {
        let mut slots = self.slots.write();
        if slots[node.index()].flags.contains(Flag::DISPOSED) {
            return Err(TreeError::Disposed);
        }
        Ok(Self::duplicate_locked(&mut slots, node, None))
    }

    fn duplicate_locked(
        slots: &mut Vec<Slot<D>>,
        node: NodeId,
        parent: Option<NodeId>,
    ) -> NodeId {
        let (name, flags, separator, listeners, data, children) = {
            let slot = &slots[node.index()];
            (
                slot.name.clone(),
                slot.flags,
                slot.separator,
                slot.listeners.clone(),
                slot.data.duplicate(),
                slot.children.clone(),
            )
        };
        let id = NodeId(slots.len() as u32);
        slots.push(Slot {
            name,
            flags,
            parent,
            children: Vec::new(),
            listeners,
            separator,
            data,
        });
        for c in children {
            let dup = Self::duplicate_locked(slots, c, Some(id));
            slots[id.index()].children.push(dup);
        }
        id
    }

    /// Folds `src` into `dst`: children are matched by name (moved when
    /// the name is free, merged recursively when it collides), flags are
    /// ORed (except `DISPOSED`) and payloads combined via
    /// [`NodeData::merge_from`]. `src` ends up parentless and destroyed.
    pub fn merge(&self, dst: NodeId, src: NodeId) -> Result<NodeId, TreeError> {
        if dst == src {
            return Ok(dst);
        }
        {
            let mut slots = self.slots.write();
            if slots[dst.index()].flags.contains(Flag::DISPOSED)
                || slots[src.index()].flags.contains(Flag::DISPOSED)
            {
                return Err(TreeError::Disposed);
            }
            if Self::flag_set_locked(&slots, dst, Flag::READ_ONLY) {
                return Err(TreeError::ReadOnly);
            }
            let mut cur = Some(dst);
            while let Some(id) = cur {
                if id == src {
                    return Err(TreeError::Cycle);
                }
                cur = slots[id.index()].parent;
            }
            Self::merge_locked(&mut slots, dst, src);
        }
        self.destroy(src)?;
        Ok(dst)
    }

    fn merge_locked(slots: &mut Vec<Slot<D>>, dst: NodeId, src: NodeId) {
        let mut incoming = slots[src.index()].flags;
        incoming.clear(Flag::DISPOSED);
        slots[dst.index()].flags.merge(incoming);

        let data = slots[src.index()].data.duplicate();
        slots[dst.index()].data.merge_from(data);

        let src_children = std::mem::take(&mut slots[src.index()].children);
        for c in src_children {
            let name = slots[c.index()].name.clone();
            match Self::find_child_locked(slots, dst, &name) {
                Some(existing) => {
                    Self::merge_locked(slots, existing, c);
                    Self::dispose_subtree_locked(slots, c);
                }
                None => {
                    slots[c.index()].parent = Some(dst);
                    slots[dst.index()].children.push(c);
                }
            }
        }
        slots[dst.index()].flags.set(Flag::DIRTY);
    }

    // ---- moves -----------------------------------------------------------

    /// Moves `node` along a path resolved from the tree root.
    pub fn move_absolute(&self, node: NodeId, path: &str) -> Result<NodeId, TreeError> {
        self.move_node(node, path, true)
    }

    /// Moves `node` along a path resolved from its current parent.
    pub fn move_relative(&self, node: NodeId, path: &str) -> Result<NodeId, TreeError> {
        self.move_node(node, path, false)
    }

    /// Path grammar: `.` stays, `..` climbs (capped at the root), an
    /// intermediate name resolves-or-creates a hop, and the final name
    /// token becomes the node's new local name. Resolving to the current
    /// parent and name is a no-op.
    fn move_node(&self, node: NodeId, path: &str, absolute: bool) -> Result<NodeId, TreeError> {
        if node == self.root {
            return Err(TreeError::RootImmovable);
        }
        let (current_parent, current_name, sep) = {
            let slots = self.slots.read();
            let slot = &slots[node.index()];
            if slot.flags.contains(Flag::DISPOSED) {
                return Err(TreeError::Disposed);
            }
            (
                slot.parent,
                slot.name.clone(),
                Self::effective_separator_locked(&slots, node),
            )
        };
        let segments = PathSegments::parse(path, &sep.to_string())?;
        if segments.is_empty() {
            return Err(TreeError::InvalidName(path.to_string()));
        }
        let mut target = if absolute {
            self.root
        } else {
            current_parent.unwrap_or(self.root)
        };
        let mut new_name = current_name.clone();
        let count = segments.len();
        for (i, token) in segments.iter().enumerate() {
            match token {
                "." => {}
                ".." => {
                    if let Some(up) = self.parent(target) {
                        target = up;
                    }
                }
                name if i + 1 == count => new_name = name.to_string(),
                name => target = self.hop_find_or_create(target, name)?,
            }
        }
        Self::validate_name(&new_name)?;
        if current_parent == Some(target) && new_name == current_name {
            return Ok(node);
        }
        {
            let slots = self.slots.read();
            if let Some(existing) = Self::find_child_locked(&slots, target, &new_name) {
                if existing != node {
                    return Err(TreeError::ChildExists(new_name));
                }
            }
        }
        self.add_child(target, Some(&new_name), node, ConflictStrategy::Ignore)?;
        Ok(node)
    }

    // ---- trimming & accounting -------------------------------------------

    /// Destroys every child subtree that is trimmable end to end (payload
    /// and all descendants), and recurses into the survivors.
    pub fn trim_children(&self, node: NodeId) -> Result<(), TreeError> {
        for child in self.children(node) {
            let trimmable = {
                let slots = self.slots.read();
                Self::trimmable_locked(&slots, child)
            };
            if trimmable {
                self.destroy(child)?;
            } else {
                self.trim_children(child)?;
            }
        }
        Ok(())
    }

    fn trimmable_locked(slots: &[Slot<D>], node: NodeId) -> bool {
        let slot = &slots[node.index()];
        if slot.flags.contains(Flag::DISPOSED) {
            return false;
        }
        slot.data.is_trimmable()
            && slot
                .children
                .iter()
                .all(|&c| Self::trimmable_locked(slots, c))
    }

    /// Number of descendants, excluding `node` itself.
    pub fn node_count(&self, node: NodeId) -> usize {
        let slots = self.slots.read();
        Self::count_locked(&slots, node)
    }

    fn count_locked(slots: &[Slot<D>], node: NodeId) -> usize {
        slots[node.index()]
            .children
            .iter()
            .map(|&c| 1 + Self::count_locked(slots, c))
            .sum()
    }

    // ---- separators & paths ----------------------------------------------

    /// Sets or clears the node's separator override.
    pub fn set_separator(&self, node: NodeId, separator: Option<char>) -> Result<(), TreeError> {
        let mut slots = self.slots.write();
        let slot = &mut slots[node.index()];
        if slot.flags.contains(Flag::DISPOSED) {
            return Err(TreeError::Disposed);
        }
        slot.separator = separator;
        Ok(())
    }

    /// The separator in effect at `node`: the nearest ancestor override,
    /// defaulting to `.`.
    pub fn effective_separator(&self, node: NodeId) -> char {
        let slots = self.slots.read();
        Self::effective_separator_locked(&slots, node)
    }

    fn effective_separator_locked(slots: &[Slot<D>], node: NodeId) -> char {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if let Some(sep) = slots[id.index()].separator {
                return sep;
            }
            cur = slots[id.index()].parent;
        }
        '.'
    }

    /// A sibling separator usable for escaping inside names glued by
    /// `separator`.
    pub fn separator_complement(separator: char) -> char {
        match separator {
            '.' => '/',
            '/' => '.',
            '_' => '.',
            _ => '/',
        }
    }

    /// Root-to-node join of local names on the root's effective separator.
    /// Empty names (the root's) contribute nothing.
    pub fn effective_path(&self, node: NodeId) -> String {
        let slots = self.slots.read();
        let sep = Self::effective_separator_locked(&slots, self.root);
        let mut names = Vec::new();
        let mut cur = Some(node);
        while let Some(id) = cur {
            let slot = &slots[id.index()];
            if !slot.name.is_empty() {
                names.push(slot.name.clone());
            }
            cur = slot.parent;
        }
        names.reverse();
        names.join(&sep.to_string())
    }

    // ---- payload access (for specializations) ----------------------------

    pub(crate) fn with_data<R>(&self, node: NodeId, f: impl FnOnce(&D) -> R) -> R {
        let slots = self.slots.read();
        f(&slots[node.index()].data)
    }

    pub(crate) fn with_data_mut<R>(&self, node: NodeId, f: impl FnOnce(&mut D) -> R) -> R {
        let mut slots = self.slots.write();
        f(&mut slots[node.index()].data)
    }

    /// Disposed/read-only gate shared by every mutation.
    pub(crate) fn mutation_gate(&self, node: NodeId) -> Result<(), TreeError> {
        let slots = self.slots.read();
        if slots[node.index()].flags.contains(Flag::DISPOSED) {
            return Err(TreeError::Disposed);
        }
        if Self::flag_set_locked(&slots, node, Flag::READ_ONLY) {
            return Err(TreeError::ReadOnly);
        }
        Ok(())
    }
}
