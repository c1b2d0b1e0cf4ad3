//! Error taxonomy shared across the engine.
//!
//! None of these abort a match: illegal actions are reported back to the
//! caller, and resolution faults are logged and the offending item dropped.

use thiserror::Error;

use crate::combat::CombatError;
use crate::ids::{ObjectId, PlayerId};
use crate::turn::TurnError;
use crate::zone::Zone;

/// A cost could not be paid. Payment is atomic, so nothing was deducted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("insufficient mana to pay {cost}")]
    Insufficient { cost: String },

    #[error("not enough untapped mana sources for {cost}")]
    NoSources { cost: String },

    #[error("source {0} is already tapped")]
    AlreadyTapped(ObjectId),

    #[error("source {0} is summoning sick")]
    SummoningSick(ObjectId),

    #[error("{permanent} has {have} loyalty, needs {need}")]
    NotEnoughLoyalty { permanent: ObjectId, have: i32, need: i32 },
}

/// An attempted play, cast, activation or declaration broke a timing or
/// legality rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("the game is over")]
    GameOver,

    #[error("{0} does not hold priority")]
    NoPriority(PlayerId),

    #[error("{0} is not the active player")]
    NotActivePlayer(PlayerId),

    #[error("{action} is only legal during a main phase with an empty stack")]
    SorcerySpeed { action: &'static str },

    #[error("card {card} is not in {player}'s {zone}")]
    NotInZone {
        card: ObjectId,
        player: PlayerId,
        zone: Zone,
    },

    #[error("card {0} is not a land")]
    NotALand(ObjectId),

    #[error("lands are played, not cast")]
    CannotCastLand,

    #[error("{0} already played a land this turn")]
    LandAlreadyPlayed(PlayerId),

    #[error("card {card} has no ability at index {index}")]
    NoSuchAbility { card: ObjectId, index: usize },

    #[error("ability {index} of {card} is not an activated ability")]
    NotActivated { card: ObjectId, index: usize },

    #[error("an activation is waiting for a target")]
    TargetPending,

    #[error("no activation is waiting for a target")]
    NoPendingTarget,

    #[error("illegal target: {0}")]
    IllegalTarget(String),

    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Combat(#[from] CombatError),
}

/// A stack item or trigger failed while resolving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("source {0} no longer exists")]
    MissingSource(ObjectId),

    #[error("player {0} is not in the game")]
    MissingPlayer(PlayerId),

    #[error("target {0} is no longer legal")]
    IllegalTarget(String),

    #[error("effect failed: {0}")]
    Effect(String),
}

/// The card database or a deck list could not be loaded.
#[cfg(feature = "serialization")]
#[derive(Debug, Error)]
pub enum CardDbError {
    #[error("could not read card database: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed card database: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown card: {0}")]
    UnknownCard(String),
}
