//! Events that triggered abilities can listen for.
//!
//! A [`TriggerEvent`] is the narrow view of a [`GameEvent`] that trigger
//! matching needs. Game events with no trigger category map to `None`.

use crate::ability::TriggerCategory;
use crate::events::GameEvent;
use crate::game_state::Step;
use crate::ids::{ObjectId, PlayerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    EntersBattlefield {
        object: ObjectId,
        controller: PlayerId,
        is_creature: bool,
    },
    Attacks {
        attacker: ObjectId,
        controller: PlayerId,
        defender: PlayerId,
    },
    Dies {
        object: ObjectId,
        controller: PlayerId,
    },
    BeginningOfUpkeep {
        active_player: PlayerId,
    },
}

impl TriggerEvent {
    pub fn from_game_event(event: &GameEvent) -> Option<Self> {
        match *event {
            GameEvent::EnteredBattlefield {
                object,
                controller,
                is_creature,
            } => Some(TriggerEvent::EntersBattlefield {
                object,
                controller,
                is_creature,
            }),
            GameEvent::AttackDeclared {
                attacker,
                controller,
                defender,
            } => Some(TriggerEvent::Attacks {
                attacker,
                controller,
                defender,
            }),
            GameEvent::Died { object, controller } => {
                Some(TriggerEvent::Dies { object, controller })
            }
            GameEvent::PhaseChanged {
                active_player,
                step: Some(Step::Upkeep),
                ..
            } => Some(TriggerEvent::BeginningOfUpkeep { active_player }),
            _ => None,
        }
    }

    /// Categories of listener this event can wake.
    ///
    /// A creature entering wakes both self-ETB listeners and "creature
    /// enters under your control" listeners.
    pub fn categories(&self) -> &'static [TriggerCategory] {
        match self {
            TriggerEvent::EntersBattlefield {
                is_creature: true, ..
            } => &[
                TriggerCategory::EntersBattlefield,
                TriggerCategory::CreatureEntersUnderYourControl,
            ],
            TriggerEvent::EntersBattlefield { .. } => &[TriggerCategory::EntersBattlefield],
            TriggerEvent::Attacks { .. } => &[TriggerCategory::Attacks],
            TriggerEvent::Dies { .. } => &[TriggerCategory::Dies],
            TriggerEvent::BeginningOfUpkeep { .. } => &[TriggerCategory::BeginningOfUpkeep],
        }
    }

    /// The object the event is about, if any.
    pub fn object(&self) -> Option<ObjectId> {
        match self {
            TriggerEvent::EntersBattlefield { object, .. } | TriggerEvent::Dies { object, .. } => {
                Some(*object)
            }
            TriggerEvent::Attacks { attacker, .. } => Some(*attacker),
            TriggerEvent::BeginningOfUpkeep { .. } => None,
        }
    }
}
