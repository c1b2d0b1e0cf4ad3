//! Trigger checking and queue management.
//!
//! [`check_triggers`] runs registered listeners against one event; matches
//! become [`TriggeredAbilityEntry`]s waiting in the FIFO [`TriggerQueue`].

use std::collections::VecDeque;

use crate::ability::TriggeredAbility;
use crate::game_state::GameState;
use crate::ids::{ObjectId, PlayerId};
use crate::stack::AbilityInstance;

use super::Trigger;
use super::matcher_trait::TriggerContext;
use super::trigger_event::TriggerEvent;

/// A triggered ability registered while its source is on the battlefield.
#[derive(Debug, Clone)]
pub struct TriggerListener {
    pub source: ObjectId,
    pub source_name: String,
    /// Controller at registration; used once the source has left.
    pub controller: PlayerId,
    /// Index into the source card's ability list.
    pub ability_index: usize,
    pub ability: TriggeredAbility,
    pub trigger: Trigger,
}

impl TriggerListener {
    pub fn new(
        source: ObjectId,
        source_name: impl Into<String>,
        controller: PlayerId,
        ability_index: usize,
        ability: TriggeredAbility,
    ) -> Self {
        let trigger = Trigger::for_ability(&ability);
        Self {
            source,
            source_name: source_name.into(),
            controller,
            ability_index,
            ability,
            trigger,
        }
    }

    /// "When this creature dies" is checked after the source is gone.
    pub fn fires_after_leaving(&self) -> bool {
        self.ability.category.is_leaves_battlefield() && !self.ability.excludes_source()
    }
}

/// A triggered ability that needs to go on the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredAbilityEntry {
    pub source: ObjectId,
    pub source_name: String,
    pub controller: PlayerId,
    pub ability_index: usize,
    pub ability: TriggeredAbility,
    /// The event that triggered this ability.
    pub triggering_event: TriggerEvent,
}

impl TriggeredAbilityEntry {
    pub fn to_instance(&self) -> AbilityInstance {
        AbilityInstance::new(
            self.source,
            self.source_name.clone(),
            self.controller,
            self.ability_index,
            self.ability.effect_text.clone(),
        )
    }
}

/// Queue of triggered abilities waiting to resolve, oldest first.
#[derive(Debug, Clone, Default)]
pub struct TriggerQueue {
    entries: VecDeque<TriggeredAbilityEntry>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: TriggeredAbilityEntry) {
        self.entries.push_back(entry);
    }

    /// Removes the oldest entry.
    pub fn pop(&mut self) -> Option<TriggeredAbilityEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &TriggeredAbilityEntry> {
        self.entries.iter()
    }
}

/// Returns every listener that fires for `event`, in registration order.
///
/// A listener only fires while its source is on the battlefield, except for
/// the source's own dies trigger.
pub fn check_triggers(
    game: &GameState,
    event: &TriggerEvent,
    listeners: &[TriggerListener],
) -> Vec<TriggeredAbilityEntry> {
    let mut fired = Vec::new();
    for listener in listeners {
        let controller = match game.permanent(listener.source) {
            Some(permanent) => permanent.controller(),
            None if listener.fires_after_leaving() => listener.controller,
            None => continue,
        };
        let ctx = TriggerContext::new(listener.source, controller, game);
        if listener.trigger.matches(event, &ctx) {
            fired.push(TriggeredAbilityEntry {
                source: listener.source,
                source_name: listener.source_name.clone(),
                controller,
                ability_index: listener.ability_index,
                ability: listener.ability.clone(),
                triggering_event: event.clone(),
            });
        }
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::TriggerCategory;
    use crate::config::GameConfig;

    fn test_game() -> GameState {
        GameState::new(
            GameConfig::default(),
            vec!["Alice".to_string(), "Bob".to_string()],
        )
    }

    fn entry(source: u64) -> TriggeredAbilityEntry {
        TriggeredAbilityEntry {
            source: ObjectId(source),
            source_name: "Test".to_string(),
            controller: PlayerId(0),
            ability_index: 0,
            ability: TriggeredAbility {
                category: TriggerCategory::BeginningOfUpkeep,
                effect_text: "draw a card.".to_string(),
                raw_text: "At the beginning of your upkeep, draw a card.".to_string(),
            },
            triggering_event: TriggerEvent::BeginningOfUpkeep {
                active_player: PlayerId(0),
            },
        }
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = TriggerQueue::new();
        queue.add(entry(1));
        queue.add(entry(2));
        queue.add(entry(3));
        let order: Vec<u64> = std::iter::from_fn(|| queue.pop())
            .map(|e| e.source.0)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_dies_listener_fires_after_source_left() {
        let game = test_game();
        let ability = TriggeredAbility {
            category: TriggerCategory::Dies,
            effect_text: "you gain 2 life.".to_string(),
            raw_text: "When this creature dies, you gain 2 life.".to_string(),
        };
        let listener = TriggerListener::new(ObjectId(7), "Doomed", PlayerId(1), 0, ability);
        let event = TriggerEvent::Dies {
            object: ObjectId(7),
            controller: PlayerId(1),
        };

        let fired = check_triggers(&game, &event, &[listener]);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].controller, PlayerId(1));
    }

    #[test]
    fn test_etb_listener_needs_source_on_battlefield() {
        let game = test_game();
        let ability = TriggeredAbility {
            category: TriggerCategory::EntersBattlefield,
            effect_text: "draw a card.".to_string(),
            raw_text: "When this creature enters the battlefield, draw a card.".to_string(),
        };
        let listener = TriggerListener::new(ObjectId(7), "Gone", PlayerId(0), 0, ability);
        let event = TriggerEvent::EntersBattlefield {
            object: ObjectId(7),
            controller: PlayerId(0),
            is_creature: true,
        };
        assert!(check_triggers(&game, &event, &[listener]).is_empty());
    }
}
