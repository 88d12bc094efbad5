//! Player position relay: fire-and-forget writes of movement state.

use std::sync::Arc;

use scrawl_store::StateStore;
use scrawl_types::{ParticipantId, PlayerState, paths};

use crate::ArenaError;

/// Write-only: the core arms no subscription for position slots.
/// Consumers that want another participant's movement watch
/// `players/{id}` directly through the store.
pub(crate) struct PositionRelay<S: StateStore> {
    store: Arc<S>,
}

impl<S: StateStore> PositionRelay<S> {
    pub(crate) fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Unconditionally overwrites the participant's position slot.
    pub(crate) async fn update(
        &self,
        id: &ParticipantId,
        state: &PlayerState,
    ) -> Result<(), ArenaError> {
        self.store
            .set(&paths::player(id), serde_json::to_value(state)?)
            .await?;
        Ok(())
    }
}
