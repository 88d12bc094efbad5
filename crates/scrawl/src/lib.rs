//! Realtime coordination for a shared canvas/arena.
//!
//! A [`RealtimeService`] registers one participant in a shared state
//! store, relays drawing, movement, and food state through it, and fans
//! incoming change notifications out to local subscribers as
//! [`ArenaEvent`]s.
//!
//! # Key types
//!
//! - [`RealtimeService`] — the facade: `join`, `leave`, `draw`,
//!   `update_player_position`, `eat_food`, `on`
//! - [`ArenaConfig`] — capacities, palette, spawn cadence
//! - [`ArenaEvent`] — everything the service re-emits locally
//!
//! The store is the sole source of truth; the service keeps no durable
//! local copy of any shared entity, only its own participant identity.

mod config;
mod drawing;
mod error;
mod event;
mod food;
mod players;
mod presence;
mod service;

pub use config::ArenaConfig;
pub use error::ArenaError;
pub use event::{ArenaEvent, FoodDot};
pub use service::RealtimeService;

/// Convenient single import for consumers.
pub mod prelude {
    pub use crate::{ArenaConfig, ArenaError, ArenaEvent, FoodDot, RealtimeService};
    pub use scrawl_bus::Subscription;
    pub use scrawl_store::{MemoryStore, StateStore};
    pub use scrawl_types::{
        DrawEvent, FoodItem, FoodKey, Participant, ParticipantId, PlayerState, Point,
    };
}
