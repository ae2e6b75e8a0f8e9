use regtree_core::{EventKind, Flag, ListenerFlags, TreeError, ValueTree};
use std::sync::{Arc, Mutex};

fn kind_log(
    tree: &ValueTree<i64>,
    node: regtree_core::NodeId,
) -> Arc<Mutex<Vec<EventKind>>> {
    let log: Arc<Mutex<Vec<EventKind>>> = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        EventKind::ValueStore,
        EventKind::ValueRemove,
        EventKind::ValueChange,
    ] {
        let log = log.clone();
        tree.listen(
            node,
            kind,
            ListenerFlags::SYNCHRONIZED,
            Arc::new(move |event| {
                log.lock().unwrap().push(event.kind);
                Ok(())
            }),
        )
        .unwrap();
    }
    log
}

#[test]
fn value_event_sequences() {
    let tree: ValueTree<i64> = ValueTree::new();
    let node = tree.child_find_or_create(tree.root(), "n").unwrap();
    let log = kind_log(&tree, node);

    // Empty -> present: store, then change.
    tree.set_value(node, Some(1)).unwrap();
    assert_eq!(
        log.lock().unwrap().as_slice(),
        [EventKind::ValueStore, EventKind::ValueChange]
    );
    log.lock().unwrap().clear();

    // Present -> present: change only.
    tree.set_value(node, Some(2)).unwrap();
    assert_eq!(log.lock().unwrap().as_slice(), [EventKind::ValueChange]);
    log.lock().unwrap().clear();

    // Present -> empty: remove, then change.
    tree.set_value(node, None).unwrap();
    assert_eq!(
        log.lock().unwrap().as_slice(),
        [EventKind::ValueRemove, EventKind::ValueChange]
    );
    log.lock().unwrap().clear();

    // Empty -> empty: change only.
    tree.set_value(node, None).unwrap();
    assert_eq!(log.lock().unwrap().as_slice(), [EventKind::ValueChange]);
}

#[test]
fn values_and_flat_values() {
    let tree: ValueTree<i64> = ValueTree::new();
    let root = tree.root();
    tree.set_value(root, Some(0)).unwrap();

    let a = tree.child_find_or_create(root, "a").unwrap();
    tree.set_value(a, Some(1)).unwrap();
    let _hollow = tree.child_find_or_create(root, "hollow").unwrap();
    let b = tree.child_find_or_create(root, "b").unwrap();
    tree.set_value(b, Some(2)).unwrap();
    let a_deep = tree.child_find_or_create(a, "deep").unwrap();
    tree.set_value(a_deep, Some(11)).unwrap();

    // Direct children only, child order, holes skipped.
    assert_eq!(tree.values(root), vec![1, 2]);
    // Depth-first, each node before its descendants.
    assert_eq!(tree.flat_values(root), vec![0, 1, 11, 2]);
    assert_eq!(tree.flat_values(a), vec![1, 11]);
}

#[test]
fn write_once_under_inherited_no_override() {
    let tree: ValueTree<i64> = ValueTree::new();
    let branch = tree.child_find_or_create(tree.root(), "branch").unwrap();
    let leaf = tree.child_find_or_create(branch, "leaf").unwrap();
    tree.set_flag(branch, Flag::NO_OVERRIDE).unwrap();

    // First store is fine even under the flag.
    assert_eq!(tree.set_value(leaf, Some(1)), Ok(None));
    assert_eq!(tree.set_value(leaf, Some(2)), Err(TreeError::OverrideForbidden));
    assert_eq!(tree.set_value(leaf, None), Err(TreeError::OverrideForbidden));

    // Blocking flag recursion at the branch frees the leaf again.
    tree.set_flag(branch, Flag::NO_FLAG_RECURSION).unwrap();
    assert_eq!(tree.set_value(leaf, Some(2)), Ok(Some(1)));
}

#[test]
fn values_only_policy_is_inherited() {
    let tree: ValueTree<i64> = ValueTree::new();
    let root = tree.root();
    tree.set_flag(root, Flag::VALUES_ONLY).unwrap();

    let holder = tree.child_find_or_create(root, "zone.holder").unwrap();
    tree.set_value(holder, Some(1)).unwrap();
    assert!(matches!(
        tree.create_child(holder, "blocked"),
        Err(TreeError::CreateVetoed(_))
    ));
    assert!(matches!(
        tree.child_find_or_create(holder, "also.blocked"),
        Err(TreeError::CreateVetoed(_))
    ));

    // Clearing the value reopens the node.
    tree.set_value(holder, None).unwrap();
    assert!(tree.create_child(holder, "open").is_ok());
}

#[test]
fn trim_respects_subtree_values() {
    let tree: ValueTree<i64> = ValueTree::new();
    let root = tree.root();
    // A valueless chain whose leaf holds a value must survive whole.
    let leaf = tree.child_find_or_create(root, "a.b.c").unwrap();
    tree.set_value(leaf, Some(1)).unwrap();
    tree.trim_children(root).unwrap();
    assert_eq!(tree.child_find(root, "a.b.c"), Some(leaf));

    tree.set_value(leaf, None).unwrap();
    tree.trim_children(root).unwrap();
    assert_eq!(tree.child_find(root, "a"), None);
    assert!(tree.is_disposed(leaf));
}

#[test]
fn json_values() {
    let tree: ValueTree<serde_json::Value> = ValueTree::new();
    let node = tree.child_find_or_create(tree.root(), "doc").unwrap();
    let doc = serde_json::json!({"kind": "config", "ttl": 30});
    tree.set_value(node, Some(doc.clone())).unwrap();
    assert_eq!(tree.get_value(node).unwrap(), Some(doc));
    let prev = tree
        .update_value(node, |v| {
            v.map(|mut doc| {
                doc["ttl"] = serde_json::json!(60);
                doc
            })
        })
        .unwrap();
    assert_eq!(prev.and_then(|d| d["ttl"].as_i64()), Some(30));
    assert_eq!(
        tree.get_value(node).unwrap().and_then(|d| d["ttl"].as_i64()),
        Some(60)
    );
}

#[test]
fn concurrent_readers_and_writer() {
    let tree: Arc<ValueTree<i64>> = Arc::new(ValueTree::new());
    let node = tree.child_find_or_create(tree.root(), "hot").unwrap();

    let writer = {
        let tree = tree.clone();
        std::thread::spawn(move || {
            for i in 0..200 {
                tree.set_value(node, Some(i)).unwrap();
                tree.create_child(node, &format!("c{i}")).unwrap();
            }
        })
    };
    let reader = {
        let tree = tree.clone();
        std::thread::spawn(move || {
            for _ in 0..200 {
                // Snapshots stay internally consistent while the writer runs.
                for child in tree.children(node) {
                    assert_eq!(tree.parent(child), Some(node));
                }
                let _ = tree.flat_values(node);
            }
        })
    };
    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(tree.node_count(node), 200);
    assert_eq!(tree.get_value(node).unwrap(), Some(199));
}
