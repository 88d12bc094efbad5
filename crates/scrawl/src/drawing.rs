//! Drawing relay: stateless pass-through for the single shared drawing
//! slot.

use std::sync::Arc;

use scrawl_bus::EventBus;
use scrawl_store::{ChangeKind, StateStore};
use scrawl_types::{DrawEvent, paths};
use tokio::task::JoinHandle;

use crate::{ArenaError, ArenaEvent};

pub(crate) struct DrawingRelay<S: StateStore> {
    store: Arc<S>,
    bus: EventBus<ArenaEvent>,
}

impl<S: StateStore> DrawingRelay<S> {
    pub(crate) fn new(store: Arc<S>, bus: EventBus<ArenaEvent>) -> Self {
        Self { store, bus }
    }

    /// Overwrites the shared drawing slot. Last write wins; the payload
    /// is not validated.
    pub(crate) async fn draw(&self, event: &DrawEvent) -> Result<(), ArenaError> {
        self.store
            .set(paths::DRAWING, serde_json::to_value(event)?)
            .await?;
        Ok(())
    }

    /// Arms the inbound side: every non-null value of the drawing slot
    /// is re-emitted as [`ArenaEvent::DrawingData`]. A cleared slot is
    /// silently ignored — there is no "drawing cleared" event.
    pub(crate) fn spawn_relay(&self) -> Result<JoinHandle<()>, ArenaError> {
        let mut watcher = self.store.watch(paths::DRAWING, ChangeKind::ValueChanged)?;
        let bus = self.bus.clone();
        Ok(tokio::spawn(async move {
            while let Some(change) = watcher.recv().await {
                if change.value.is_null() {
                    continue;
                }
                bus.emit(&ArenaEvent::DrawingData(DrawEvent(change.value)));
            }
        }))
    }
}
