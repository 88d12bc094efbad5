//! In-process [`StateStore`] over a JSON tree behind a mutex.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::trace;

use crate::{ChangeKind, StateStore, StoreChange, StoreError, Watcher};

/// An in-process shared state store.
///
/// Cloning is cheap and every clone addresses the same tree, so a single
/// `MemoryStore` can back several service instances in one process —
/// which is exactly how the multi-writer store races get exercised in
/// tests. Iteration order of any subtree is the key order of the backing
/// JSON object (lexicographic); generated push keys are constructed to
/// sort in insertion order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    root: Map<String, Value>,
    watchers: Vec<WatcherEntry>,
    next_push: u64,
}

struct WatcherEntry {
    path: Vec<String>,
    kind: ChangeKind,
    tx: mpsc::UnboundedSender<StoreChange>,
}

/// What a mutation did, for deciding which watchers to notify.
enum Mutation {
    /// A new node appeared at the path (carries the new value).
    Created(Value),
    /// An existing node's value changed.
    Changed,
    /// The node at the path was removed (carries its last value).
    Removed(Value),
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // A poisoned lock only means another thread panicked mid-write;
        // the tree itself is still a valid JSON object.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segs = split_path(path)?;
        let inner = self.lock();
        Ok(node(&inner.root, &segs).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segs = split_path(path)?;
        let mut inner = self.lock();
        let (leaf, parents) = segs.split_last().expect("split_path yields >= 1 segment");
        let existed = {
            let parent = parent_object_mut(&mut inner.root, parents, path)?;
            parent.insert(leaf.clone(), value.clone()).is_some()
        };
        let mutation = if existed {
            Mutation::Changed
        } else {
            Mutation::Created(value)
        };
        inner.notify(&segs, &mutation);
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let segs = split_path(path)?;
        let mut inner = self.lock();
        let (leaf, parents) = segs.split_last().expect("split_path yields >= 1 segment");
        let (existed, merged) = {
            let parent = parent_object_mut(&mut inner.root, parents, path)?;
            let existed = parent.contains_key(leaf);
            let slot = parent
                .entry(leaf.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            let obj = slot
                .as_object_mut()
                .ok_or_else(|| StoreError::NotAnObject(path.to_string()))?;
            for (k, v) in fields {
                obj.insert(k, v);
            }
            (existed, slot.clone())
        };
        let mutation = if existed {
            Mutation::Changed
        } else {
            Mutation::Created(merged)
        };
        inner.notify(&segs, &mutation);
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let segs = split_path(path)?;
        let mut inner = self.lock();
        let key = inner.generate_key();
        {
            let collection = parent_object_mut(&mut inner.root, &segs, path)?;
            collection.insert(key.clone(), value.clone());
        }
        let mut child = segs;
        child.push(key.clone());
        inner.notify(&child, &Mutation::Created(value));
        Ok(key)
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let segs = split_path(path)?;
        let mut inner = self.lock();
        let (leaf, parents) = segs.split_last().expect("split_path yields >= 1 segment");
        let removed = match existing_object_mut(&mut inner.root, parents) {
            Some(parent) => parent.remove(leaf),
            None => None,
        };
        if let Some(value) = removed {
            inner.notify(&segs, &Mutation::Removed(value));
        }
        Ok(())
    }

    fn watch(&self, path: &str, kind: ChangeKind) -> Result<Watcher, StoreError> {
        let segs = split_path(path)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();

        // Replay semantics: child-added sees the current children,
        // value-changed sees the current value straight away.
        match kind {
            ChangeKind::ChildAdded => {
                if let Some(Value::Object(children)) = node(&inner.root, &segs) {
                    for (key, value) in children {
                        let _ = tx.send(StoreChange {
                            kind,
                            key: Some(key.clone()),
                            value: value.clone(),
                        });
                    }
                }
            }
            ChangeKind::ValueChanged => {
                let current = node(&inner.root, &segs).cloned().unwrap_or(Value::Null);
                let _ = tx.send(StoreChange {
                    kind,
                    key: None,
                    value: current,
                });
            }
            ChangeKind::ChildRemoved => {}
        }

        trace!(path, ?kind, "watcher registered");
        inner.watchers.push(WatcherEntry {
            path: segs,
            kind,
            tx,
        });
        Ok(Watcher::new(rx))
    }
}

impl StoreInner {
    /// Generates a push key that sorts after every previously generated
    /// key: fixed-width hex of (unix millis, per-store counter).
    fn generate_key(&mut self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let n = self.next_push;
        self.next_push += 1;
        format!("{millis:012x}{n:06x}")
    }

    /// Fans a mutation at `segs` out to the interested watchers.
    ///
    /// Watchers whose receiver has been dropped are pruned here.
    fn notify(&mut self, segs: &[String], mutation: &Mutation) {
        trace!(
            path = %segs.join("/"),
            watchers = self.watchers.len(),
            "fanning out change"
        );
        let StoreInner { root, watchers, .. } = self;
        watchers.retain(|w| {
            let change = match w.kind {
                ChangeKind::ChildAdded => match mutation {
                    Mutation::Created(value) if is_parent(&w.path, segs) => StoreChange {
                        kind: w.kind,
                        key: segs.last().cloned(),
                        value: value.clone(),
                    },
                    _ => return true,
                },
                ChangeKind::ChildRemoved => match mutation {
                    Mutation::Removed(value) if is_parent(&w.path, segs) => StoreChange {
                        kind: w.kind,
                        key: segs.last().cloned(),
                        value: value.clone(),
                    },
                    _ => return true,
                },
                ChangeKind::ValueChanged => {
                    if !overlaps(&w.path, segs) {
                        return true;
                    }
                    StoreChange {
                        kind: w.kind,
                        key: None,
                        value: node(root, &w.path).cloned().unwrap_or(Value::Null),
                    }
                }
            };
            // A closed receiver means the subscriber is gone.
            w.tx.send(change).is_ok()
        });
    }
}

/// Splits and validates a store path.
fn split_path(path: &str) -> Result<Vec<String>, StoreError> {
    if path.is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    let segs: Vec<String> = path.split('/').map(str::to_string).collect();
    if segs.iter().any(String::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segs)
}

/// Reads the node at `segs`, without creating anything.
fn node<'a>(root: &'a Map<String, Value>, segs: &[String]) -> Option<&'a Value> {
    let (first, rest) = segs.split_first()?;
    let mut current = root.get(first)?;
    for seg in rest {
        current = current.as_object()?.get(seg)?;
    }
    Some(current)
}

/// Navigates to the object at `segs`, creating intermediate objects.
/// Fails if an existing intermediate node is not an object.
fn parent_object_mut<'a>(
    root: &'a mut Map<String, Value>,
    segs: &[String],
    full_path: &str,
) -> Result<&'a mut Map<String, Value>, StoreError> {
    let mut current = root;
    for seg in segs {
        current = current
            .entry(seg.clone())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| StoreError::NotAnObject(full_path.to_string()))?;
    }
    Ok(current)
}

/// Navigates to the object at `segs` without creating anything.
fn existing_object_mut<'a>(
    root: &'a mut Map<String, Value>,
    segs: &[String],
) -> Option<&'a mut Map<String, Value>> {
    let mut current = root;
    for seg in segs {
        current = current.get_mut(seg)?.as_object_mut()?;
    }
    Some(current)
}

/// `watch_path` is the direct parent of `changed`.
fn is_parent(watch_path: &[String], changed: &[String]) -> bool {
    changed.len() == watch_path.len() + 1 && changed.starts_with(watch_path)
}

/// One path is an ancestor of (or equal to) the other.
fn overlaps(a: &[String], b: &[String]) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(path: &str) -> Vec<String> {
        split_path(path).unwrap()
    }

    #[test]
    fn test_split_path_rejects_empty() {
        assert!(split_path("").is_err());
        assert!(split_path("users//x").is_err());
        assert!(split_path("/users").is_err());
        assert!(split_path("users/").is_err());
    }

    #[test]
    fn test_split_path_accepts_nested() {
        assert_eq!(segs("users/u1"), vec!["users", "u1"]);
        assert_eq!(segs("drawing"), vec!["drawing"]);
    }

    #[test]
    fn test_is_parent() {
        assert!(is_parent(&segs("users"), &segs("users/u1")));
        assert!(!is_parent(&segs("users"), &segs("users/u1/name")));
        assert!(!is_parent(&segs("users"), &segs("food/u1")));
    }

    #[test]
    fn test_overlaps() {
        assert!(overlaps(&segs("food"), &segs("food/k1")));
        assert!(overlaps(&segs("food/k1"), &segs("food")));
        assert!(overlaps(&segs("food"), &segs("food")));
        assert!(!overlaps(&segs("food"), &segs("users/u1")));
    }

    #[test]
    fn test_generated_keys_sort_in_insertion_order() {
        let mut inner = StoreInner::default();
        let keys: Vec<String> = (0..64).map(|_| inner.generate_key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
