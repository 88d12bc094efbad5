//! Shared state store abstraction for Scrawl.
//!
//! Provides the [`StateStore`] trait — a hierarchical key-value store with
//! push-based change notification — and [`MemoryStore`], an in-process
//! implementation backing tests and single-machine deployments.
//!
//! The store is the sole source of truth for all shared entities. It is a
//! multi-writer resource: other service instances may mutate any subtree
//! between a read and a subsequent write issued by this process. Change
//! notifications are delivered at least once, ordered per subtree by write
//! order; there is no cross-subtree ordering guarantee.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use std::future::Future;

use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// The kind of change a watcher is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new direct child appeared under the watched path.
    ///
    /// Watchers of this kind are replayed the existing children at watch
    /// time, so a late subscriber observes the current population.
    ChildAdded,
    /// A direct child was removed from under the watched path.
    ChildRemoved,
    /// Anything at or under the watched path changed.
    ///
    /// Fires once immediately with the current value (possibly null),
    /// then on every subsequent change, always carrying the current value
    /// at the watched path — not a diff.
    ValueChanged,
}

/// A single change notification delivered to a watcher.
#[derive(Debug, Clone)]
pub struct StoreChange {
    /// Which kind of watcher this was delivered to.
    pub kind: ChangeKind,
    /// The affected child key, for child-added / child-removed.
    pub key: Option<String>,
    /// Child-added: the new child's value. Child-removed: the removed
    /// child's last value. Value-changed: the current value at the
    /// watched path (`Value::Null` when absent).
    pub value: Value,
}

/// Receiving end of a subtree subscription.
///
/// Dropping the watcher ends the subscription; the store prunes the
/// registration on its next delivery attempt.
pub struct Watcher {
    rx: mpsc::UnboundedReceiver<StoreChange>,
}

impl Watcher {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<StoreChange>) -> Self {
        Self { rx }
    }

    /// Waits for the next change. Returns `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<StoreChange> {
        self.rx.recv().await
    }

    /// Returns the next already-delivered change without waiting.
    pub fn try_recv(&mut self) -> Option<StoreChange> {
        self.rx.try_recv().ok()
    }
}

/// A hierarchical key-value store with change notification.
///
/// Paths are `/`-separated, non-empty segments (`users/user_1_abc`).
/// All writes are atomic at the level of a single operation; the store
/// offers no transaction spanning a read and a later write.
///
/// The methods are spelled as `impl Future + Send` rather than bare
/// `async fn` because relay and spawner tasks await them inside
/// `tokio::spawn`, which requires `Send` futures. Implementations can
/// still use `async fn`.
pub trait StateStore: Send + Sync + 'static {
    /// Point read of the value at `path`, or `None` when absent.
    fn get(&self, path: &str) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Writes `value` at `path`, replacing whatever was there and
    /// creating intermediate objects as needed.
    fn set(&self, path: &str, value: Value) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Merges `fields` into the object at `path`, leaving other fields
    /// untouched. Creates the object if absent.
    fn update(
        &self,
        path: &str,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Appends `value` under `path` with a store-generated key and
    /// returns the key. Generated keys sort in insertion order.
    fn push(
        &self,
        path: &str,
        value: Value,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Deletes the value at `path`. Removing an absent path is a no-op.
    fn remove(&self, path: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Subscribes to changes of the given kind at `path`.
    fn watch(&self, path: &str, kind: ChangeKind) -> Result<Watcher, StoreError>;
}
