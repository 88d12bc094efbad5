//! Shared data model for the Scrawl realtime canvas.
//!
//! Every record that lives in the shared state store is defined here, plus
//! the logical paths those records are stored under. The service and the
//! store crate both speak in these types; the store itself only ever sees
//! `serde_json::Value`.

mod types;

pub mod paths;

pub use types::{DrawEvent, FoodItem, FoodKey, Participant, ParticipantId, PlayerState, Point};
