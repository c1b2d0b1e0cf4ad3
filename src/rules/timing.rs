//! When lands may be played, spells cast and abilities activated.

use crate::ability::{Ability, Keyword};
use crate::card::Card;
use crate::error::ActionError;
use crate::game_state::GameState;
use crate::ids::{ObjectId, PlayerId};
use crate::turn::{has_priority, is_sorcery_timing};
use crate::zone::Zone;

/// Speed at which a card or ability may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Any time the player holds priority.
    Instant,
    /// Active player, main phase, empty stack.
    Sorcery,
}

impl Timing {
    pub fn of_card(card: &Card) -> Self {
        let has_flash = card
            .abilities
            .iter()
            .any(|a| matches!(a, Ability::Keyword(Keyword::Flash)));
        if card.is_instant() || has_flash {
            Timing::Instant
        } else {
            Timing::Sorcery
        }
    }
}

/// Priority holder check shared by every action.
pub fn require_priority(game: &GameState, player: PlayerId) -> Result<(), ActionError> {
    if game.is_game_over() {
        return Err(ActionError::GameOver);
    }
    if !has_priority(game, player) {
        return Err(ActionError::NoPriority(player));
    }
    Ok(())
}

/// Sorcery-speed check: active player, main phase, empty stack.
pub fn require_sorcery_timing(
    game: &GameState,
    player: PlayerId,
    action: &'static str,
) -> Result<(), ActionError> {
    if game.turn.active_player != player {
        return Err(ActionError::NotActivePlayer(player));
    }
    if !is_sorcery_timing(game) {
        return Err(ActionError::SorcerySpeed { action });
    }
    Ok(())
}

pub fn require_timing(
    game: &GameState,
    player: PlayerId,
    timing: Timing,
    action: &'static str,
) -> Result<(), ActionError> {
    require_priority(game, player)?;
    match timing {
        Timing::Instant => Ok(()),
        Timing::Sorcery => require_sorcery_timing(game, player, action),
    }
}

/// Checks a land play: the land is in the player's hand, the player holds
/// priority at sorcery speed, and has land plays left this turn.
pub fn can_play_land(game: &GameState, player: PlayerId, card: ObjectId) -> Result<(), ActionError> {
    require_timing(game, player, Timing::Sorcery, "playing a land")?;

    let player_state = game.player(player).ok_or(ActionError::NoPriority(player))?;
    let land = player_state
        .card_in(Zone::Hand, card)
        .ok_or(ActionError::NotInZone {
            card,
            player,
            zone: Zone::Hand,
        })?;
    if !land.is_land() {
        return Err(ActionError::NotALand(card));
    }
    if !player_state.can_play_land() {
        return Err(ActionError::LandAlreadyPlayed(player));
    }
    Ok(())
}

/// Finds a castable card: in the player's hand, or a commander in their
/// command zone. Returns the zone it is cast from.
pub fn castable_zone(game: &GameState, player: PlayerId, card: ObjectId) -> Result<Zone, ActionError> {
    let player_state = game.player(player).ok_or(ActionError::NoPriority(player))?;
    if player_state.card_in(Zone::Hand, card).is_some() {
        return Ok(Zone::Hand);
    }
    if player_state
        .card_in(Zone::Command, card)
        .is_some_and(|c| c.is_commander)
    {
        return Ok(Zone::Command);
    }
    Err(ActionError::NotInZone {
        card,
        player,
        zone: Zone::Hand,
    })
}

/// Checks whether `player` may cast `card` right now. Returns the zone it
/// would be cast from.
pub fn can_cast(game: &GameState, player: PlayerId, card: ObjectId) -> Result<Zone, ActionError> {
    require_priority(game, player)?;
    let zone = castable_zone(game, player, card)?;
    let card_ref = game
        .player(player)
        .and_then(|p| p.card_in(zone, card))
        .ok_or(ActionError::NotInZone { card, player, zone })?;
    if card_ref.is_land() {
        return Err(ActionError::CannotCastLand);
    }
    require_timing(game, player, Timing::of_card(card_ref), "casting this spell")?;
    Ok(zone)
}
