//! Shared worker pool and the fire loop for listener delivery.
//!
//! Callbacks never run while a tree lock is held: the tree collects
//! [`FirePlan`]s under its lock, drops it, and hands the plans to
//! [`fire`].

use crate::error::TreeError;
use crate::event::{Event, EventKind, ListenerEntry, ListenerFlags};
use crate::tree::NodeId;
use crossbeam_channel::Sender;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;
use std::thread;

type Job = Box<dyn FnOnce() + Send>;

struct Pool {
    tx: Sender<Job>,
}

fn pool() -> &'static Pool {
    static POOL: OnceLock<Pool> = OnceLock::new();
    POOL.get_or_init(|| {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let workers = thread::available_parallelism()
            .map(|n| n.get().min(4))
            .unwrap_or(2);
        for i in 0..workers {
            let rx = rx.clone();
            let builder = thread::Builder::new().name(format!("regtree-dispatch-{i}"));
            let spawned = builder.spawn(move || {
                while let Ok(job) = rx.recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::warn!("listener panicked");
                    }
                }
            });
            if let Err(err) = spawned {
                tracing::error!(error = %err, "failed to spawn dispatch worker");
            }
        }
        Pool { tx }
    })
}

fn submit(job: Job) {
    if pool().tx.send(job).is_err() {
        tracing::warn!("dispatch pool unavailable, listener dropped");
    }
}

/// The listeners one node contributes to a dispatch, snapshotted under
/// the tree lock. `FIRE_ONCE` entries are already consumed from their
/// tables by the time a plan exists.
pub(crate) struct FirePlan {
    pub(crate) node: NodeId,
    pub(crate) local: bool,
    pub(crate) entries: Vec<ListenerEntry>,
}

/// Delivers one event to the plans in order (root first, origin last).
///
/// `SYNCHRONIZED` entries run inline; when `veto` is set their error
/// aborts the whole dispatch as [`TreeError::Vetoed`]. Everything else is
/// queued on the shared pool, where failures are logged and swallowed.
pub(crate) fn fire(
    plans: Vec<FirePlan>,
    origin: NodeId,
    kind: EventKind,
    name: Option<String>,
    subject: Option<NodeId>,
    veto: bool,
) -> Result<(), TreeError> {
    for plan in plans {
        for entry in plan.entries {
            if !plan.local && entry.flags.contains(ListenerFlags::NO_RECURSIVE) {
                continue;
            }
            let event = Event {
                node: plan.node,
                origin,
                kind,
                local: plan.local,
                name: name.clone(),
                subject,
            };
            if entry.flags.contains(ListenerFlags::SYNCHRONIZED) {
                if let Err(err) = (entry.callback)(&event) {
                    if veto {
                        return Err(TreeError::Vetoed(err.reason));
                    }
                    tracing::warn!(listener_error = %err, ?kind, "synchronous listener failed");
                }
            } else {
                let callback = entry.callback.clone();
                submit(Box::new(move || {
                    if let Err(err) = callback(&event) {
                        tracing::warn!(listener_error = %err, kind = ?event.kind, "listener failed");
                    }
                }));
            }
        }
    }
    Ok(())
}
