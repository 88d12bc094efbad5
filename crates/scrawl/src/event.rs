//! Events re-emitted locally from store change notifications.

use scrawl_types::{DrawEvent, FoodItem, FoodKey, Participant, ParticipantId};

/// Everything a [`RealtimeService`](crate::RealtimeService) emits to its
/// local subscribers.
///
/// Delivery is synchronous and in subscriber registration order; a
/// subscriber registered after an emission does not see it.
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaEvent {
    /// A participant appeared in the presence subtree. Fired once per
    /// existing participant when the relays are armed (including the
    /// local one), then for each later joiner.
    UserJoined(Participant),

    /// A participant's record was removed. Carries the identity only;
    /// the record itself is already gone.
    UserLeft(ParticipantId),

    /// The shared drawing slot changed to a non-null value. Cleared
    /// slots are not announced.
    DrawingData(DrawEvent),

    /// The food pool changed. Carries the full current pool in store
    /// iteration order, which is not guaranteed stable across snapshots.
    FoodStateUpdated(Vec<FoodDot>),
}

/// One live food item together with its store key, which is what
/// [`eat_food`](crate::RealtimeService::eat_food) consumes by.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodDot {
    pub key: FoodKey,
    pub item: FoodItem,
}
