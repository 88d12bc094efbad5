//! Records stored in (and relayed from) the shared state store.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Length of the random suffix appended to generated participant ids.
const ID_SUFFIX_LEN: usize = 10;

/// An opaque identifier for a joined participant.
///
/// Generated client-side at join time as `user_{unix_millis}_{suffix}`.
/// Uniqueness is probabilistic — the store does not enforce it, a
/// collision would need two participants to join in the same millisecond
/// with the same random suffix.
///
/// `#[serde(transparent)]` keeps the JSON representation a plain string,
/// which is also what the store uses as the child key under `users/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Synthesizes a fresh, collision-resistant identity.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let mut rng = rand::rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| (rng.sample(Alphanumeric) as char).to_ascii_lowercase())
            .collect();
        Self(format!("user_{millis}_{suffix}"))
    }

    /// The raw identity token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A joined participant, as stored under `users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Self-assigned identity, repeated inside the record.
    pub id: ParticipantId,
    /// Display name. Assigned as `"User {n}"` at join, mutable afterwards.
    pub name: String,
    /// Color drawn from the configured palette at join.
    pub color: String,
}

/// A 2D point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single drawing action.
///
/// Opaque to the coordination layer — collaborators agree on the payload
/// shape, the service only transports it. The store holds exactly one
/// `DrawEvent` at a time (last write wins); this is a slot, not a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawEvent(pub serde_json::Value);

/// Per-participant movement state, stored under `players/{id}`.
///
/// One slot per participant, overwritten on every update; no history.
/// Fields beyond `position` are carried through untouched so collaborators
/// can extend the state without a core change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Point,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PlayerState {
    /// A state holding only a position.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            extra: serde_json::Map::new(),
        }
    }
}

/// The store-generated key of a spawned food item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodKey(pub String);

impl FoodKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FoodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FoodKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FoodKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A consumable food dot, stored under `food/{key}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub x: f64,
    pub y: f64,
}
