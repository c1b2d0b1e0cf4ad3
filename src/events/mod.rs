//! Game events emitted by the core for triggers, presentation and logging.
//!
//! The game state records events as they happen; the session forwards them
//! to the ability engine (trigger matching) and to the [`EventBus`]
//! (subscribers outside the rules core).

mod bus;

pub use bus::{EventBus, EventListener, ListenerError};

use crate::ability::TriggerCategory;
use crate::game_state::{Phase, Step};
use crate::ids::{ObjectId, PlayerId};
use crate::zone::Zone;

/// Fast dispatch enum for event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ZoneChange,
    EnterBattlefield,
    LeaveBattlefield,
    Dies,
    CardFlip,
    TriggerFired,
    PhaseChange,
    LifeChange,
    AttackDeclared,
    SpellCast,
    PlayerLost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    ZoneChanged {
        object: ObjectId,
        name: String,
        owner: PlayerId,
        from: Zone,
        to: Zone,
    },
    EnteredBattlefield {
        object: ObjectId,
        controller: PlayerId,
        is_creature: bool,
    },
    LeftBattlefield {
        object: ObjectId,
        controller: PlayerId,
        was_creature: bool,
    },
    /// A creature went from the battlefield to a graveyard.
    Died {
        object: ObjectId,
        controller: PlayerId,
    },
    /// A card moved between a hidden and a public zone.
    CardFlipped { object: ObjectId, face_up: bool },
    TriggerFired {
        source: ObjectId,
        controller: PlayerId,
        category: TriggerCategory,
    },
    PhaseChanged {
        active_player: PlayerId,
        turn_number: u32,
        phase: Phase,
        step: Option<Step>,
    },
    LifeChanged {
        player: PlayerId,
        old: i32,
        new: i32,
    },
    AttackDeclared {
        attacker: ObjectId,
        controller: PlayerId,
        defender: PlayerId,
    },
    SpellCast {
        card: ObjectId,
        controller: PlayerId,
    },
    PlayerLost { player: PlayerId, reason: String },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::ZoneChanged { .. } => EventKind::ZoneChange,
            GameEvent::EnteredBattlefield { .. } => EventKind::EnterBattlefield,
            GameEvent::LeftBattlefield { .. } => EventKind::LeaveBattlefield,
            GameEvent::Died { .. } => EventKind::Dies,
            GameEvent::CardFlipped { .. } => EventKind::CardFlip,
            GameEvent::TriggerFired { .. } => EventKind::TriggerFired,
            GameEvent::PhaseChanged { .. } => EventKind::PhaseChange,
            GameEvent::LifeChanged { .. } => EventKind::LifeChange,
            GameEvent::AttackDeclared { .. } => EventKind::AttackDeclared,
            GameEvent::SpellCast { .. } => EventKind::SpellCast,
            GameEvent::PlayerLost { .. } => EventKind::PlayerLost,
        }
    }

    /// Key/value payload for logs and front-ends.
    pub fn context(&self) -> Vec<(&'static str, String)> {
        match self {
            GameEvent::ZoneChanged {
                object,
                name,
                owner,
                from,
                to,
            } => vec![
                ("object", object.to_string()),
                ("name", name.clone()),
                ("owner", owner.to_string()),
                ("from", from.to_string()),
                ("to", to.to_string()),
            ],
            GameEvent::EnteredBattlefield {
                object, controller, ..
            }
            | GameEvent::LeftBattlefield {
                object, controller, ..
            }
            | GameEvent::Died { object, controller } => vec![
                ("object", object.to_string()),
                ("controller", controller.to_string()),
            ],
            GameEvent::CardFlipped { object, face_up } => vec![
                ("object", object.to_string()),
                ("face_up", face_up.to_string()),
            ],
            GameEvent::TriggerFired {
                source,
                controller,
                category,
            } => vec![
                ("source", source.to_string()),
                ("controller", controller.to_string()),
                ("category", format!("{category:?}")),
            ],
            GameEvent::PhaseChanged {
                active_player,
                turn_number,
                phase,
                step,
            } => vec![
                ("active_player", active_player.to_string()),
                ("turn", turn_number.to_string()),
                ("phase", format!("{phase:?}")),
                ("step", step.map(|s| format!("{s:?}")).unwrap_or_default()),
            ],
            GameEvent::LifeChanged { player, old, new } => vec![
                ("player", player.to_string()),
                ("old", old.to_string()),
                ("new", new.to_string()),
            ],
            GameEvent::AttackDeclared {
                attacker,
                controller,
                defender,
            } => vec![
                ("attacker", attacker.to_string()),
                ("controller", controller.to_string()),
                ("defender", defender.to_string()),
            ],
            GameEvent::SpellCast { card, controller } => vec![
                ("card", card.to_string()),
                ("controller", controller.to_string()),
            ],
            GameEvent::PlayerLost { player, reason } => {
                vec![("player", player.to_string()), ("reason", reason.clone())]
            }
        }
    }
}
