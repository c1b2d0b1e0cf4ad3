//! Trigger matcher trait.
//!
//! Each trigger kind (ETB, dies, attacks, upkeep) implements
//! [`TriggerMatcher`] with its own matching logic.

use crate::game_state::GameState;
use crate::ids::{ObjectId, PlayerId};

use super::trigger_event::TriggerEvent;

/// What a matcher knows about the ability it belongs to.
#[derive(Debug, Clone)]
pub struct TriggerContext<'a> {
    /// The permanent that has this triggered ability.
    pub source_id: ObjectId,
    /// Controller of the source when the listener was registered.
    pub controller: PlayerId,
    pub game: &'a GameState,
}

impl<'a> TriggerContext<'a> {
    pub fn new(source_id: ObjectId, controller: PlayerId, game: &'a GameState) -> Self {
        Self {
            source_id,
            controller,
            game,
        }
    }
}

/// Trait for matching game events to trigger conditions.
pub trait TriggerMatcher: std::fmt::Debug {
    /// Check if this trigger matches the given event.
    fn matches(&self, event: &TriggerEvent, ctx: &TriggerContext) -> bool;

    /// Human-readable display text for this trigger.
    fn display(&self) -> String;

    /// Clone this trigger into a boxed trait object.
    fn clone_box(&self) -> Box<dyn TriggerMatcher>;
}

impl Clone for Box<dyn TriggerMatcher> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
