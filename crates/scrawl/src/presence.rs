//! Presence: join/leave lifecycle, identity and color assignment, and
//! the relays that republish presence changes on the event bus.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scrawl_bus::EventBus;
use scrawl_store::{ChangeKind, StateStore};
use scrawl_types::{Participant, ParticipantId, paths};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{ArenaConfig, ArenaError, ArenaEvent};

/// Owns the local participant identity for the service's lifetime.
/// One participant per service instance.
pub(crate) struct PresenceManager<S: StateStore> {
    store: Arc<S>,
    config: ArenaConfig,
    bus: EventBus<ArenaEvent>,
    local: Mutex<Option<ParticipantId>>,
}

impl<S: StateStore> PresenceManager<S> {
    pub(crate) fn new(store: Arc<S>, config: ArenaConfig, bus: EventBus<ArenaEvent>) -> Self {
        Self {
            store,
            config,
            bus,
            local: Mutex::new(None),
        }
    }

    fn local(&self) -> MutexGuard<'_, Option<ParticipantId>> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new participant.
    ///
    /// Returns `Ok(None)` when the arena is full or this instance has
    /// already joined — neither performs any write. The capacity check
    /// is read-then-decide: two instances racing for the last slot can
    /// both observe it and transiently exceed `max_users`.
    pub(crate) async fn join(&self) -> Result<Option<Participant>, ArenaError> {
        if self.local().is_some() {
            debug!("join while already joined — ignoring");
            return Ok(None);
        }

        let users = self.store.get(paths::USERS).await?;
        let count = users
            .as_ref()
            .and_then(Value::as_object)
            .map_or(0, serde_json::Map::len);
        if count >= self.config.max_users {
            debug!(count, max = self.config.max_users, "arena full — join refused");
            return Ok(None);
        }

        let id = ParticipantId::generate();
        let participant = Participant {
            id: id.clone(),
            name: format!("User {}", count + 1),
            color: self.config.user_colors[count % self.config.user_colors.len()].clone(),
        };
        self.store
            .set(&paths::user(&id), serde_json::to_value(&participant)?)
            .await?;
        *self.local() = Some(id.clone());

        info!(%id, name = %participant.name, participants = count + 1, "joined arena");
        Ok(Some(participant))
    }

    /// Removes the local participant's record. No-op if not joined.
    pub(crate) async fn leave(&self) -> Result<(), ArenaError> {
        let Some(id) = self.local().take() else {
            return Ok(());
        };
        self.store.remove(&paths::user(&id)).await?;
        info!(%id, "left arena");
        Ok(())
    }

    /// Partial update of the display name only. No-op if not joined.
    pub(crate) async fn rename(&self, name: &str) -> Result<(), ArenaError> {
        let Some(id) = self.local_id() else {
            return Ok(());
        };
        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), Value::String(name.to_string()));
        self.store.update(&paths::user(&id), fields).await?;
        Ok(())
    }

    pub(crate) fn local_id(&self) -> Option<ParticipantId> {
        self.local().clone()
    }

    /// Arms the presence relays: child-added republished as
    /// [`ArenaEvent::UserJoined`], child-removed as
    /// [`ArenaEvent::UserLeft`]. The child-added watcher replays the
    /// current roster, so the local subscriber immediately observes
    /// every present participant, itself included.
    pub(crate) fn spawn_relays(&self) -> Result<Vec<JoinHandle<()>>, ArenaError> {
        let mut added = self.store.watch(paths::USERS, ChangeKind::ChildAdded)?;
        let bus = self.bus.clone();
        let joined = tokio::spawn(async move {
            while let Some(change) = added.recv().await {
                match serde_json::from_value::<Participant>(change.value) {
                    Ok(participant) => bus.emit(&ArenaEvent::UserJoined(participant)),
                    Err(e) => warn!(error = %e, "malformed participant record — skipping"),
                }
            }
        });

        let mut removed = self.store.watch(paths::USERS, ChangeKind::ChildRemoved)?;
        let bus = self.bus.clone();
        let left = tokio::spawn(async move {
            while let Some(change) = removed.recv().await {
                match change.key {
                    Some(key) => bus.emit(&ArenaEvent::UserLeft(ParticipantId(key))),
                    None => warn!("presence removal without a key — skipping"),
                }
            }
        });

        Ok(vec![joined, left])
    }
}
