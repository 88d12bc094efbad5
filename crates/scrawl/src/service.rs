//! The `RealtimeService` facade: composes presence, drawing, positions,
//! and food over one store and one event bus.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scrawl_bus::{EventBus, Subscription};
use scrawl_store::StateStore;
use scrawl_types::{DrawEvent, FoodKey, Participant, ParticipantId, PlayerState};
use tokio::task::JoinHandle;

use crate::drawing::DrawingRelay;
use crate::food::FoodManager;
use crate::players::PositionRelay;
use crate::presence::PresenceManager;
use crate::{ArenaConfig, ArenaError, ArenaEvent};

/// One participant's handle on the shared arena.
///
/// An explicit context object: construct it with the store it should
/// coordinate through, call [`join`](Self::join) to enter the arena, and
/// drop it (or call [`leave`](Self::leave)) to tear everything down.
/// Each instance owns at most one participant identity.
///
/// Mutators other than `leave` and `update_user_name` do not require a
/// prior join — they write to shared slots that exist independently of
/// presence.
pub struct RealtimeService<S: StateStore> {
    bus: EventBus<ArenaEvent>,
    presence: PresenceManager<S>,
    drawing: DrawingRelay<S>,
    positions: PositionRelay<S>,
    food: FoodManager<S>,
    relays: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: StateStore> RealtimeService<S> {
    /// Creates a service over `store`. The config is validated first;
    /// degenerate values are clamped with a warning.
    pub fn new(store: Arc<S>, config: ArenaConfig) -> Self {
        let config = config.validated();
        let bus = EventBus::new();
        Self {
            presence: PresenceManager::new(Arc::clone(&store), config.clone(), bus.clone()),
            drawing: DrawingRelay::new(Arc::clone(&store), bus.clone()),
            positions: PositionRelay::new(Arc::clone(&store)),
            food: FoodManager::new(store, config, bus.clone()),
            bus,
            relays: Mutex::new(Vec::new()),
        }
    }

    fn relays(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.relays.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Joins the arena.
    ///
    /// On success, registers the participant, arms the presence, drawing,
    /// and food relays, and starts the food spawner. Returns `Ok(None)`
    /// without any side effect when the arena is full or this instance
    /// is already joined.
    pub async fn join(&self) -> Result<Option<Participant>, ArenaError> {
        let Some(participant) = self.presence.join().await? else {
            return Ok(None);
        };

        {
            let mut relays = self.relays();
            relays.extend(self.presence.spawn_relays()?);
            relays.push(self.drawing.spawn_relay()?);
            relays.push(self.food.spawn_relay()?);
        }
        self.food.start_spawner();

        Ok(Some(participant))
    }

    /// Leaves the arena: stops the spawner, tears down the relays, and
    /// removes the presence record. No-op if not joined.
    ///
    /// Teardown happens before the record is removed, so the local
    /// subscriber does not observe its own departure; other instances
    /// see the `UserLeft` through their own relays.
    pub async fn leave(&self) -> Result<(), ArenaError> {
        self.food.stop_spawner();
        for handle in self.relays().drain(..) {
            handle.abort();
        }
        self.presence.leave().await
    }

    /// Updates the local participant's display name only. No-op if not
    /// joined.
    pub async fn update_user_name(&self, name: &str) -> Result<(), ArenaError> {
        self.presence.rename(name).await
    }

    /// Overwrites the single shared drawing slot with `event`.
    pub async fn draw(&self, event: &DrawEvent) -> Result<(), ArenaError> {
        self.drawing.draw(event).await
    }

    /// Overwrites `id`'s position slot with `state`.
    pub async fn update_player_position(
        &self,
        id: &ParticipantId,
        state: &PlayerState,
    ) -> Result<(), ArenaError> {
        self.positions.update(id, state).await
    }

    /// Consumes the food item with the given store key. Silently does
    /// nothing if the item is already gone.
    pub async fn eat_food(&self, key: &FoodKey) -> Result<(), ArenaError> {
        self.food.eat(key).await
    }

    /// Consumes the food item at `index` of a fresh pool snapshot.
    /// Prefer [`eat_food`](Self::eat_food) — positional addressing is
    /// racy under concurrent consumers. Out of range is a silent no-op.
    pub async fn eat_food_at(&self, index: usize) -> Result<(), ArenaError> {
        self.food.eat_at(index).await
    }

    /// Registers a callback for every [`ArenaEvent`] this instance
    /// re-emits. Callbacks run synchronously in registration order; a
    /// late subscriber misses earlier events.
    pub fn on(
        &self,
        callback: impl Fn(&ArenaEvent) + Send + Sync + 'static,
    ) -> Subscription<ArenaEvent> {
        self.bus.subscribe(callback)
    }

    /// The local participant identity, if joined.
    pub fn local_id(&self) -> Option<ParticipantId> {
        self.presence.local_id()
    }
}

impl<S: StateStore> Drop for RealtimeService<S> {
    fn drop(&mut self) {
        // The relay tasks and the spawner borrow nothing from `self`,
        // but leaving them running would keep watching the store after
        // the handle is gone.
        self.food.stop_spawner();
        for handle in self.relays().drain(..) {
            handle.abort();
        }
    }
}
