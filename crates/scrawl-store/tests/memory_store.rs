//! Integration tests for the in-process state store.

use std::sync::Arc;

use scrawl_store::{ChangeKind, MemoryStore, StateStore, StoreError};
use serde_json::{Map, Value, json};

fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// =========================================================================
// Reads and writes
// =========================================================================

#[tokio::test]
async fn test_set_then_get_round_trip() {
    let store = MemoryStore::new();
    store.set("drawing", json!({ "stroke": 1 })).await.unwrap();
    let value = store.get("drawing").await.unwrap();
    assert_eq!(value, Some(json!({ "stroke": 1 })));
}

#[tokio::test]
async fn test_get_absent_path_is_none() {
    let store = MemoryStore::new();
    assert_eq!(store.get("users/nobody").await.unwrap(), None);
}

#[tokio::test]
async fn test_set_creates_intermediate_objects() {
    let store = MemoryStore::new();
    store.set("users/u1", json!({ "name": "User 1" })).await.unwrap();
    let users = store.get("users").await.unwrap().unwrap();
    assert_eq!(users["u1"]["name"], "User 1");
}

#[tokio::test]
async fn test_set_overwrites_previous_value() {
    let store = MemoryStore::new();
    store.set("drawing", json!("first")).await.unwrap();
    store.set("drawing", json!("second")).await.unwrap();
    assert_eq!(store.get("drawing").await.unwrap(), Some(json!("second")));
}

#[tokio::test]
async fn test_set_through_scalar_is_rejected() {
    let store = MemoryStore::new();
    store.set("drawing", json!(42)).await.unwrap();
    let err = store.set("drawing/nested", json!(1)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotAnObject(_)));
}

#[tokio::test]
async fn test_invalid_paths_are_rejected() {
    let store = MemoryStore::new();
    assert!(matches!(
        store.get("").await.unwrap_err(),
        StoreError::InvalidPath(_)
    ));
    assert!(matches!(
        store.set("users//u1", json!(1)).await.unwrap_err(),
        StoreError::InvalidPath(_)
    ));
}

// =========================================================================
// Partial update
// =========================================================================

#[tokio::test]
async fn test_update_merges_without_touching_other_fields() {
    let store = MemoryStore::new();
    store
        .set("users/u1", json!({ "name": "User 1", "color": "#fff" }))
        .await
        .unwrap();
    store
        .update("users/u1", fields(&[("name", json!("Ada"))]))
        .await
        .unwrap();
    let user = store.get("users/u1").await.unwrap().unwrap();
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["color"], "#fff");
}

#[tokio::test]
async fn test_update_creates_object_when_absent() {
    let store = MemoryStore::new();
    store
        .update("users/u2", fields(&[("name", json!("Bo"))]))
        .await
        .unwrap();
    assert_eq!(
        store.get("users/u2").await.unwrap(),
        Some(json!({ "name": "Bo" }))
    );
}

#[tokio::test]
async fn test_update_on_scalar_is_rejected() {
    let store = MemoryStore::new();
    store.set("drawing", json!("scalar")).await.unwrap();
    let err = store
        .update("drawing", fields(&[("x", json!(1))]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotAnObject(_)));
}

// =========================================================================
// Push and iteration order
// =========================================================================

#[tokio::test]
async fn test_push_keys_iterate_in_insertion_order() {
    let store = MemoryStore::new();
    let k1 = store.push("food", json!({ "x": 1.0 })).await.unwrap();
    let k2 = store.push("food", json!({ "x": 2.0 })).await.unwrap();
    let k3 = store.push("food", json!({ "x": 3.0 })).await.unwrap();

    let food = store.get("food").await.unwrap().unwrap();
    let keys: Vec<&String> = food.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec![&k1, &k2, &k3]);
}

#[tokio::test]
async fn test_push_into_scalar_is_rejected() {
    let store = MemoryStore::new();
    store.set("food", json!(7)).await.unwrap();
    let err = store.push("food", json!({})).await.unwrap_err();
    assert!(matches!(err, StoreError::NotAnObject(_)));
}

// =========================================================================
// Remove
// =========================================================================

#[tokio::test]
async fn test_remove_deletes_child() {
    let store = MemoryStore::new();
    store.set("users/u1", json!({ "name": "User 1" })).await.unwrap();
    store.remove("users/u1").await.unwrap();
    assert_eq!(store.get("users/u1").await.unwrap(), None);
}

#[tokio::test]
async fn test_remove_absent_path_is_noop() {
    let store = MemoryStore::new();
    store.remove("users/ghost").await.unwrap();
    store.remove("no/such/tree").await.unwrap();
}

// =========================================================================
// Watch: child-added
// =========================================================================

#[tokio::test]
async fn test_child_added_replays_existing_children() {
    let store = MemoryStore::new();
    store.set("users/u1", json!({ "name": "User 1" })).await.unwrap();
    store.set("users/u2", json!({ "name": "User 2" })).await.unwrap();

    let mut watcher = store.watch("users", ChangeKind::ChildAdded).unwrap();
    let first = watcher.recv().await.unwrap();
    let second = watcher.recv().await.unwrap();
    assert_eq!(first.key.as_deref(), Some("u1"));
    assert_eq!(second.key.as_deref(), Some("u2"));
    assert!(watcher.try_recv().is_none());
}

#[tokio::test]
async fn test_child_added_fires_for_new_children_only() {
    let store = MemoryStore::new();
    let mut watcher = store.watch("users", ChangeKind::ChildAdded).unwrap();

    store.set("users/u1", json!({ "name": "User 1" })).await.unwrap();
    // Overwriting an existing child is not a child-added.
    store.set("users/u1", json!({ "name": "Renamed" })).await.unwrap();
    // A write in a sibling subtree is not either.
    store.set("food/k1", json!({ "x": 0.0 })).await.unwrap();

    let change = watcher.recv().await.unwrap();
    assert_eq!(change.key.as_deref(), Some("u1"));
    assert_eq!(change.value["name"], "User 1");
    assert!(watcher.try_recv().is_none());
}

// =========================================================================
// Watch: child-removed
// =========================================================================

#[tokio::test]
async fn test_child_removed_carries_key_and_last_value() {
    let store = MemoryStore::new();
    store.set("users/u1", json!({ "name": "User 1" })).await.unwrap();

    let mut watcher = store.watch("users", ChangeKind::ChildRemoved).unwrap();
    // No replay for removals.
    assert!(watcher.try_recv().is_none());

    store.remove("users/u1").await.unwrap();
    let change = watcher.recv().await.unwrap();
    assert_eq!(change.key.as_deref(), Some("u1"));
    assert_eq!(change.value["name"], "User 1");
}

#[tokio::test]
async fn test_remove_of_absent_child_fires_nothing() {
    let store = MemoryStore::new();
    let mut watcher = store.watch("users", ChangeKind::ChildRemoved).unwrap();
    store.remove("users/ghost").await.unwrap();
    assert!(watcher.try_recv().is_none());
}

// =========================================================================
// Watch: value-changed
// =========================================================================

#[tokio::test]
async fn test_value_changed_fires_immediately_with_current_value() {
    let store = MemoryStore::new();
    store.set("drawing", json!("stroke")).await.unwrap();

    let mut watcher = store.watch("drawing", ChangeKind::ValueChanged).unwrap();
    let initial = watcher.recv().await.unwrap();
    assert_eq!(initial.value, json!("stroke"));
}

#[tokio::test]
async fn test_value_changed_initial_value_is_null_when_absent() {
    let store = MemoryStore::new();
    let mut watcher = store.watch("drawing", ChangeKind::ValueChanged).unwrap();
    assert_eq!(watcher.recv().await.unwrap().value, Value::Null);
}

#[tokio::test]
async fn test_value_changed_fires_on_descendant_writes() {
    let store = MemoryStore::new();
    let mut watcher = store.watch("food", ChangeKind::ValueChanged).unwrap();
    watcher.recv().await.unwrap(); // initial null

    let key = store.push("food", json!({ "x": 5.0, "y": 6.0 })).await.unwrap();
    let change = watcher.recv().await.unwrap();
    // The watcher receives the whole subtree, not the changed leaf.
    assert_eq!(change.value[&key]["x"], 5.0);
    assert!(change.key.is_none());
}

#[tokio::test]
async fn test_value_changed_fires_null_after_removal() {
    let store = MemoryStore::new();
    store.set("drawing", json!("stroke")).await.unwrap();
    let mut watcher = store.watch("drawing", ChangeKind::ValueChanged).unwrap();
    watcher.recv().await.unwrap(); // initial

    store.remove("drawing").await.unwrap();
    assert_eq!(watcher.recv().await.unwrap().value, Value::Null);
}

#[tokio::test]
async fn test_value_changed_ignores_unrelated_subtrees() {
    let store = MemoryStore::new();
    let mut watcher = store.watch("drawing", ChangeKind::ValueChanged).unwrap();
    watcher.recv().await.unwrap(); // initial

    store.set("users/u1", json!({ "name": "User 1" })).await.unwrap();
    assert!(watcher.try_recv().is_none());
}

// =========================================================================
// Multi-handle behavior
// =========================================================================

#[tokio::test]
async fn test_clones_share_the_same_tree() {
    let store = MemoryStore::new();
    let other = store.clone();
    store.set("drawing", json!("from-a")).await.unwrap();
    assert_eq!(other.get("drawing").await.unwrap(), Some(json!("from-a")));
}

#[tokio::test]
async fn test_dropped_watcher_does_not_break_delivery() {
    let store = MemoryStore::new();
    let dropped = store.watch("users", ChangeKind::ChildAdded).unwrap();
    drop(dropped);

    let mut live = store.watch("users", ChangeKind::ChildAdded).unwrap();
    store.set("users/u1", json!({ "name": "User 1" })).await.unwrap();
    assert_eq!(live.recv().await.unwrap().key.as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_store_futures_are_awaitable_from_spawned_tasks() {
    // The trait promises Send futures; relay and spawner tasks rely on
    // that to await store calls inside `tokio::spawn` over a generic
    // store type, not just `MemoryStore`.
    async fn count_in_task<S: StateStore>(store: Arc<S>) -> usize {
        tokio::spawn(async move {
            let key = store.push("food", json!({ "x": 1.0, "y": 2.0 })).await.unwrap();
            store.remove(&format!("food/{key}")).await.unwrap();
            store
                .get("users")
                .await
                .unwrap()
                .and_then(|v| v.as_object().map(|m| m.len()))
                .unwrap_or(0)
        })
        .await
        .unwrap()
    }

    let store = MemoryStore::new();
    store.set("users/u1", json!({ "name": "User 1" })).await.unwrap();
    assert_eq!(count_in_task(Arc::new(store)).await, 1);
}
