//! Logical paths in the shared state store.
//!
//! The store is a hierarchy addressed by `/`-separated paths. These
//! helpers are the single place the layout is spelled out:
//!
//! ```text
//! users/{id}       → Participant
//! drawing          → DrawEvent (single slot, overwritten)
//! players/{id}     → PlayerState (single slot per participant)
//! food/{key}       → FoodItem (store-generated keys)
//! ```

use crate::{FoodKey, ParticipantId};

/// Presence subtree: one child per joined participant.
pub const USERS: &str = "users";

/// The single shared drawing slot.
pub const DRAWING: &str = "drawing";

/// Movement state subtree: one child per participant.
pub const PLAYERS: &str = "players";

/// Food pool subtree: one child per live food item.
pub const FOOD: &str = "food";

/// Path of a participant's presence record.
pub fn user(id: &ParticipantId) -> String {
    format!("{USERS}/{id}")
}

/// Path of a participant's movement state slot.
pub fn player(id: &ParticipantId) -> String {
    format!("{PLAYERS}/{id}")
}

/// Path of a single food item.
pub fn food(key: &FoodKey) -> String {
    format!("{FOOD}/{key}")
}
