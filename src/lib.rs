//! Rules engine for Commander games of Magic: The Gathering.
//!
//! A [`Game`] owns one match: the [`GameState`], the [`AbilityEngine`] that
//! watches it for triggers, and the [`EventBus`] that reports what happened
//! to front-ends. Players act through [`Action`] intents; every action is
//! followed by trigger draining and state-based actions before the next
//! player gets a chance to act.

pub mod ability;
pub mod ability_engine;
pub mod card;
#[cfg(feature = "serialization")]
pub mod card_db;
pub mod color;
pub mod combat;
pub mod commander;
pub mod config;
pub mod continuous;
pub mod effects;
pub mod error;
pub mod events;
pub mod game;
pub mod game_state;
pub mod ids;
pub mod mana;
pub mod permanent;
pub mod player;
pub mod rules;
pub mod stack;
pub mod static_ability_processor;
pub mod triggers;
pub mod turn;
pub mod types;
pub mod zone;

pub use ability::{
    Ability, ActivatedAbility, Keyword, StaticBuff, TargetHint, TriggerCategory, TriggeredAbility,
    parse_abilities,
};
pub use ability_engine::{ActivationOutcome, AbilityEngine, PendingActivation};
pub use card::{Card, CardBuilder, PowerToughness, PtValue};
#[cfg(feature = "serialization")]
pub use card_db::{
    CardDatabase, CardRecord, DeckIssue, DeckList, DeckReport, validate_commander_deck,
};
pub use color::{Color, ColorSet};
pub use combat::{CombatDamage, CombatState};
pub use commander::CommanderTracker;
pub use config::GameConfig;
pub use continuous::{ContinuousEffect, ContinuousEffectManager, Duration, Layer, Modification};
#[cfg(feature = "serialization")]
pub use error::CardDbError;
pub use error::{ActionError, PaymentError, ResolutionError};
pub use events::{EventBus, EventKind, GameEvent};
pub use game::{Action, ActionResult, Game, PlayerDeck};
pub use game_state::{GameState, Phase, Step, Target, TurnState};
pub use ids::{CardId, ObjectId, PlayerId};
pub use mana::{ManaCost, ManaPool, ManaSymbol, parse_cost};
pub use permanent::Permanent;
pub use player::Player;
pub use rules::{StateBasedAction, Timing};
pub use stack::{AbilityInstance, Stack, StackItem};
pub use turn::{PriorityResult, TurnError};
pub use types::{CardType, Supertype, TypeLine};
pub use zone::Zone;
