//! Error types for the arena service.

use scrawl_store::StoreError;

/// Errors surfaced by [`RealtimeService`](crate::RealtimeService).
///
/// Expected races (full arena, stale food index, already-eaten key) are
/// NOT errors — those degrade to silent no-ops. What remains is store
/// failures, which propagate untranslated and without retry, and record
/// encoding failures.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The underlying store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A record could not be encoded for the store.
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}
