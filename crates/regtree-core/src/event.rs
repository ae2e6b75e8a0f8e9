//! Listener registry: per-node tables of callbacks keyed by `u64` handles.

use crate::tree::NodeId;
use std::collections::BTreeMap;
use std::ops::BitOr;
use std::sync::Arc;
use thiserror::Error;

/// The kinds of change a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ChildAddBefore,
    ChildAddAfter,
    ChildRemoveBefore,
    ChildRemoveAfter,
    ValueStore,
    ValueRemove,
    ValueChange,
}

/// Behavior modifiers attached to a listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerFlags(u8);

impl ListenerFlags {
    pub const NONE: ListenerFlags = ListenerFlags(0);
    /// The entry is removed from its table the first time its kind fires.
    pub const FIRE_ONCE: ListenerFlags = ListenerFlags(1 << 0);
    /// The entry only fires for events raised at its own node.
    pub const NO_RECURSIVE: ListenerFlags = ListenerFlags(1 << 1);
    /// The callback runs on the mutating thread; for before-events its
    /// error vetoes the mutation.
    pub const SYNCHRONIZED: ListenerFlags = ListenerFlags(1 << 2);

    pub const fn contains(self, other: ListenerFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ListenerFlags {
    type Output = ListenerFlags;

    fn bitor(self, rhs: ListenerFlags) -> ListenerFlags {
        ListenerFlags(self.0 | rhs.0)
    }
}

/// Returned by a synchronous listener to abort the pending mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct Veto {
    pub reason: String,
}

impl Veto {
    pub fn new(reason: impl Into<String>) -> Veto {
        Veto {
            reason: reason.into(),
        }
    }
}

/// What a callback receives. Values are not carried in the event; a
/// listener reads them back through the tree.
#[derive(Debug, Clone)]
pub struct Event {
    /// The node whose table this delivery came from.
    pub node: NodeId,
    /// The node the event was raised at.
    pub origin: NodeId,
    pub kind: EventKind,
    /// `true` when `node == origin`, `false` on ancestor deliveries.
    pub local: bool,
    /// Child name for structural events.
    pub name: Option<String>,
    /// The child node for structural events, when already known.
    pub subject: Option<NodeId>,
}

pub type ListenerCallback = Arc<dyn Fn(&Event) -> Result<(), Veto> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct ListenerEntry {
    pub(crate) kind: EventKind,
    pub(crate) flags: ListenerFlags,
    pub(crate) callback: ListenerCallback,
}

/// Per-node listener table. Handles are monotonic and never reused, so a
/// stale handle unsubscribes nothing.
#[derive(Clone, Default)]
pub(crate) struct ListenerTable {
    next: u64,
    entries: BTreeMap<u64, ListenerEntry>,
}

impl ListenerTable {
    pub(crate) fn insert(&mut self, entry: ListenerEntry) -> u64 {
        let id = self.next;
        self.next += 1;
        self.entries.insert(id, entry);
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Clones the entries matching `kind` in registration order, removing
    /// `FIRE_ONCE` entries from the table as they are picked up. Removal
    /// happens at snapshot time, so a fire-once entry is consumed even when
    /// a later filter (such as `NO_RECURSIVE`) stops it from running.
    pub(crate) fn snapshot_matching(&mut self, kind: EventKind) -> Vec<ListenerEntry> {
        let mut out = Vec::new();
        let mut consumed = Vec::new();
        for (&id, entry) in &self.entries {
            if entry.kind != kind {
                continue;
            }
            out.push(entry.clone());
            if entry.flags.contains(ListenerFlags::FIRE_ONCE) {
                consumed.push(id);
            }
        }
        for id in consumed {
            self.entries.remove(&id);
        }
        out
    }
}
