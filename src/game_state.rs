use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::card::{Card, CardBuilder};
use crate::combat::CombatState;
use crate::config::GameConfig;
use crate::continuous::ContinuousEffectManager;
use crate::events::GameEvent;
use crate::ids::{IdAllocator, ObjectId, PlayerId};
use crate::permanent::Permanent;
use crate::player::Player;
use crate::stack::{Stack, StackItem, StackPayload};
use crate::turn::PriorityTracker;
use crate::zone::{Location, Zone, ZoneObject};

/// Phases of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Phase {
    Beginning,
    FirstMain,
    Combat,
    NextMain,
    Ending,
}

/// Steps within phases. Main phases have no steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Step {
    // Beginning phase
    Untap,
    Upkeep,
    Draw,
    // Combat phase
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndCombat,
    // Ending phase
    End,
    Cleanup,
}

/// Turn state tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnState {
    pub active_player: PlayerId,
    pub priority_player: Option<PlayerId>,
    pub turn_number: u32,
    pub phase: Phase,
    pub step: Option<Step>,
}

impl TurnState {
    pub fn new(active_player: PlayerId) -> Self {
        Self {
            active_player,
            priority_player: None,
            turn_number: 1,
            phase: Phase::Beginning,
            step: Some(Step::Untap),
        }
    }
}

/// A chosen target: a player or an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Target {
    Object(ObjectId),
    Player(PlayerId),
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Object(id) => write!(f, "{id}"),
            Target::Player(player) => write!(f, "{player}"),
        }
    }
}

/// Complete state of one match.
///
/// Cards live in exactly one container at a time: a player's zone vectors,
/// a player's battlefield (wrapped as [`Permanent`]s), or the shared stack.
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: GameConfig,
    pub players: Vec<Player>,
    pub turn: TurnState,
    pub priority: PriorityTracker,
    pub stack: Stack,
    pub combat: CombatState,
    pub continuous_effects: ContinuousEffectManager,
    ids: IdAllocator,
    rng: StdRng,
    pending_events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(config: GameConfig, player_names: Vec<String>) -> Self {
        let players = player_names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let mut player = Player::new(PlayerId::from_index(index), name, config.starting_life);
                player.land_plays_allowed = config.lands_per_turn;
                player
            })
            .collect();
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            players,
            turn: TurnState::new(PlayerId::from_index(0)),
            priority: PriorityTracker::new(),
            stack: Stack::new(),
            combat: CombatState::new(),
            continuous_effects: ContinuousEffectManager::new(),
            ids: IdAllocator::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn new_object_id(&mut self) -> ObjectId {
        self.ids.next_object_id()
    }

    pub fn next_timestamp(&mut self) -> u64 {
        self.ids.next_timestamp()
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.index())
    }

    pub fn players_in_game(&self) -> usize {
        self.players.iter().filter(|p| p.is_in_game()).count()
    }

    /// Players still in the game, in turn order.
    pub fn in_game_players(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_in_game())
            .map(|p| p.id)
            .collect()
    }

    /// The next player after `from` in turn order who is still in the game.
    pub fn next_player_in_game(&self, from: PlayerId) -> Option<PlayerId> {
        let count = self.players.len();
        (1..=count)
            .map(|offset| PlayerId::from_index((from.index() + offset) % count))
            .find(|id| self.player(*id).is_some_and(Player::is_in_game))
    }

    /// Opponents still in the game, in turn order starting after `player`.
    pub fn opponents(&self, player: PlayerId) -> Vec<PlayerId> {
        let count = self.players.len();
        (1..count)
            .map(|offset| PlayerId::from_index((player.index() + offset) % count))
            .filter(|id| self.player(*id).is_some_and(Player::is_in_game))
            .collect()
    }

    pub fn is_game_over(&self) -> bool {
        self.players_in_game() <= 1
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    /// Finds the container holding an object.
    pub fn locate(&self, id: ObjectId) -> Option<Location> {
        for player in &self.players {
            if let Some(zone) = player.zone_of(id) {
                return Some(Location {
                    player: player.id,
                    zone,
                });
            }
        }
        self.stack
            .iter()
            .find(|item| matches!(&item.payload, StackPayload::Spell { card, .. } if card.id == id))
            .map(|item| Location {
                player: item.controller,
                zone: Zone::Stack,
            })
    }

    pub fn object(&self, id: ObjectId) -> Option<ZoneObject<'_>> {
        let location = self.locate(id)?;
        match location.zone {
            Zone::Battlefield => self
                .player(location.player)?
                .permanent(id)
                .map(ZoneObject::Permanent),
            Zone::Stack => self.stack.card(id).map(ZoneObject::Card),
            zone => self
                .player(location.player)?
                .card_in(zone, id)
                .map(ZoneObject::Card),
        }
    }

    pub fn card(&self, id: ObjectId) -> Option<&Card> {
        self.object(id).map(|object| object.card())
    }

    pub fn permanent(&self, id: ObjectId) -> Option<&Permanent> {
        self.players.iter().find_map(|p| p.permanent(id))
    }

    pub fn permanent_mut(&mut self, id: ObjectId) -> Option<&mut Permanent> {
        self.players.iter_mut().find_map(|p| p.permanent_mut(id))
    }

    pub fn permanents(&self) -> impl Iterator<Item = &Permanent> {
        self.players.iter().flat_map(|p| p.battlefield.iter())
    }

    pub fn permanents_mut(&mut self) -> impl Iterator<Item = &mut Permanent> {
        self.players.iter_mut().flat_map(|p| p.battlefield.iter_mut())
    }

    pub fn permanent_ids(&self) -> Vec<ObjectId> {
        self.permanents().map(Permanent::id).collect()
    }

    pub fn is_on_battlefield(&self, id: ObjectId) -> bool {
        self.permanent(id).is_some()
    }

    /// Creates a card for `owner` in `zone` and returns its id.
    ///
    /// Cards created on the stack become spells with no targets.
    pub fn add_card(&mut self, owner: PlayerId, zone: Zone, builder: CardBuilder) -> ObjectId {
        let id = self.new_object_id();
        let card = builder.id(id).owner(owner).build();
        match zone {
            Zone::Battlefield => {
                self.enter_battlefield(card, owner);
            }
            Zone::Stack => self.stack.push(StackItem::spell(owner, card, Vec::new(), 0)),
            zone => {
                if let Some(cards) = self.player_mut(owner).and_then(|p| p.cards_mut(zone)) {
                    cards.push(card);
                }
            }
        }
        id
    }

    /// Creates a token permanent under `controller`'s control.
    pub fn create_token(&mut self, controller: PlayerId, builder: CardBuilder) -> ObjectId {
        let id = self.new_object_id();
        let card = builder.id(id).owner(controller).token().build();
        self.enter_battlefield(card, controller);
        id
    }

    /// Moves an object to `to`, returning the zone it actually ended up in.
    ///
    /// Commanders headed to a graveyard or exile go to the command zone
    /// instead. Leaving the battlefield discards all permanent state.
    pub fn move_object(&mut self, id: ObjectId, to: Zone) -> Option<Zone> {
        let location = self.locate(id)?;
        let from = location.zone;
        if from == to {
            return Some(to);
        }

        let mut was_creature = false;
        let mut battlefield_controller = location.player;
        let mut card = match from {
            Zone::Battlefield => {
                let permanent = self.player_mut(location.player)?.take_permanent(id)?;
                was_creature = permanent.is_creature();
                battlefield_controller = permanent.controller();
                self.combat.remove_creature(id);
                permanent.card
            }
            Zone::Stack => self.stack.remove_spell(id)?,
            zone => self.player_mut(location.player)?.take_card(zone, id)?,
        };

        let to = if card.is_commander && matches!(to, Zone::Graveyard | Zone::Exile) {
            tracing::debug!(commander = %card.name, "commander returns to the command zone");
            Zone::Command
        } else {
            to
        };

        let owner = card.owner;
        self.pending_events.push(GameEvent::ZoneChanged {
            object: id,
            name: card.name.clone(),
            owner,
            from,
            to,
        });
        if from.is_public() != to.is_public() {
            self.pending_events.push(GameEvent::CardFlipped {
                object: id,
                face_up: to.is_public(),
            });
        }
        if from == Zone::Battlefield {
            if was_creature && to == Zone::Graveyard {
                self.pending_events.push(GameEvent::Died {
                    object: id,
                    controller: battlefield_controller,
                });
            }
            self.pending_events.push(GameEvent::LeftBattlefield {
                object: id,
                controller: battlefield_controller,
                was_creature,
            });
        }

        match to {
            Zone::Battlefield => {
                let controller = card.controller;
                self.enter_battlefield(card, controller);
            }
            Zone::Stack => {
                let controller = card.controller;
                self.stack
                    .push(StackItem::spell(controller, card, Vec::new(), 0));
            }
            zone => {
                card.controller = owner;
                self.player_mut(owner)?.cards_mut(zone)?.push(card);
            }
        }

        self.debug_assert_zone_consistency();
        Some(to)
    }

    /// Puts a card onto the battlefield under `controller`'s control.
    pub fn put_onto_battlefield(&mut self, card: Card, controller: PlayerId) -> ObjectId {
        let id = card.id;
        self.enter_battlefield(card, controller);
        id
    }

    fn enter_battlefield(&mut self, mut card: Card, controller: PlayerId) {
        card.controller = controller;
        let timestamp = self.next_timestamp();
        let permanent = Permanent::new(card, timestamp);
        let event = GameEvent::EnteredBattlefield {
            object: permanent.id(),
            controller,
            is_creature: permanent.is_creature(),
        };
        tracing::debug!(card = %permanent.name(), %controller, "enters the battlefield");
        if let Some(player) = self.player_mut(controller) {
            player.battlefield.push(permanent);
            self.pending_events.push(event);
        }
    }

    /// Moves a permanent to its owner's graveyard.
    pub fn destroy(&mut self, id: ObjectId) -> bool {
        self.is_on_battlefield(id) && self.move_object(id, Zone::Graveyard).is_some()
    }

    /// Attaches an aura or equipment to another permanent.
    pub fn attach(&mut self, attachment: ObjectId, target: ObjectId) -> bool {
        if attachment == target || !self.is_on_battlefield(target) {
            return false;
        }
        match self.permanent_mut(attachment) {
            Some(permanent) => {
                permanent.attached_to = Some(target);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Player actions that touch several containers
    // ------------------------------------------------------------------

    /// Draws from the top of the library. Drawing from an empty library
    /// flags the player for the state-based loss.
    pub fn draw_cards(&mut self, player: PlayerId, count: usize) -> Vec<ObjectId> {
        let mut drawn = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(player_state) = self.players.get_mut(player.index()) else {
                break;
            };
            let Some(card) = player_state.library.pop() else {
                player_state.drew_from_empty_library = true;
                break;
            };
            let id = card.id;
            self.pending_events.push(GameEvent::ZoneChanged {
                object: id,
                name: card.name.clone(),
                owner: card.owner,
                from: Zone::Library,
                to: Zone::Hand,
            });
            player_state.hand.push(card);
            drawn.push(id);
        }
        drawn
    }

    pub fn shuffle_library(&mut self, player: PlayerId) {
        if let Some(player_state) = self.players.get_mut(player.index()) {
            player_state.library.shuffle(&mut self.rng);
        }
    }

    /// Changes a life total and records the change.
    pub fn adjust_life(&mut self, player: PlayerId, delta: i32) {
        if delta == 0 {
            return;
        }
        let Some(player_state) = self.player_mut(player) else {
            return;
        };
        let old = player_state.life;
        player_state.life += delta;
        let new = player_state.life;
        self.pending_events
            .push(GameEvent::LifeChanged { player, old, new });
    }

    pub fn gain_life(&mut self, player: PlayerId, amount: u32) {
        self.adjust_life(player, amount as i32);
    }

    pub fn lose_life(&mut self, player: PlayerId, amount: u32) {
        self.adjust_life(player, -(amount as i32));
    }

    pub fn empty_mana_pools(&mut self) {
        for player in &mut self.players {
            player.mana_pool.empty();
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn debug_assert_zone_consistency(&self) {
        if cfg!(debug_assertions)
            && let Err(message) = self.validate_zone_consistency()
        {
            tracing::error!(%message, "zone consistency violated");
        }
    }

    /// Checks that no object id appears in more than one container.
    pub fn validate_zone_consistency(&self) -> Result<(), String> {
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut check = |id: ObjectId, place: String| {
            if seen.insert(id) {
                Ok(())
            } else {
                Err(format!("object {id} appears again in {place}"))
            }
        };
        for player in &self.players {
            for permanent in &player.battlefield {
                check(permanent.id(), format!("{}'s battlefield", player.id))?;
            }
            for zone in [
                Zone::Library,
                Zone::Hand,
                Zone::Graveyard,
                Zone::Exile,
                Zone::Command,
            ] {
                for card in player.cards(zone).into_iter().flatten() {
                    check(card.id, format!("{}'s {zone}", player.id))?;
                }
            }
        }
        for item in self.stack.iter() {
            if let StackPayload::Spell { card, .. } = &item.payload {
                check(card.id, "the stack".to_string())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CardType;

    fn test_game() -> GameState {
        GameState::new(
            GameConfig::default(),
            vec!["Alice".to_string(), "Bob".to_string()],
        )
    }

    fn bears() -> CardBuilder {
        CardBuilder::new("Grizzly Bears")
            .cost("{1}{G}")
            .card_types(vec![CardType::Creature])
            .power_toughness(2, 2)
    }

    #[test]
    fn test_new_game_players() {
        let game = test_game();
        assert_eq!(game.players.len(), 2);
        assert_eq!(game.player(PlayerId(1)).map(|p| p.life), Some(40));
        assert_eq!(game.opponents(PlayerId(0)), vec![PlayerId(1)]);
        assert_eq!(game.next_player_in_game(PlayerId(1)), Some(PlayerId(0)));
    }

    #[test]
    fn test_move_hand_to_battlefield_wraps_card() {
        let mut game = test_game();
        let id = game.add_card(PlayerId(0), Zone::Hand, bears());

        assert_eq!(game.move_object(id, Zone::Battlefield), Some(Zone::Battlefield));

        let permanent = game.permanent(id).unwrap();
        assert!(permanent.summoning_sick);
        assert!(game.player(PlayerId(0)).unwrap().hand.is_empty());
        assert!(game.object(id).unwrap().is_permanent());
        assert!(game.validate_zone_consistency().is_ok());
    }

    #[test]
    fn test_creature_dying_emits_died_and_left() {
        let mut game = test_game();
        let id = game.add_card(PlayerId(0), Zone::Battlefield, bears());
        game.take_events();

        assert!(game.destroy(id));

        let events = game.take_events();
        assert!(events.contains(&GameEvent::Died {
            object: id,
            controller: PlayerId(0)
        }));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::LeftBattlefield {
                was_creature: true,
                ..
            }
        )));
        assert_eq!(game.locate(id).map(|l| l.zone), Some(Zone::Graveyard));
    }

    #[test]
    fn test_leaving_battlefield_resets_state() {
        // Tapped, damaged bears bounce to hand and come back fresh
        let mut game = test_game();
        let id = game.add_card(PlayerId(0), Zone::Battlefield, bears());
        {
            let permanent = game.permanent_mut(id).unwrap();
            permanent.tap();
            permanent.mark_damage(1, false);
        }
        game.move_object(id, Zone::Hand);
        game.move_object(id, Zone::Battlefield);

        let permanent = game.permanent(id).unwrap();
        assert!(!permanent.tapped);
        assert_eq!(permanent.damage, 0);
    }

    #[test]
    fn test_commander_redirects_to_command_zone() {
        let mut game = test_game();
        let id = game.add_card(PlayerId(1), Zone::Battlefield, bears().commander());

        assert_eq!(game.move_object(id, Zone::Graveyard), Some(Zone::Command));
        assert_eq!(game.player(PlayerId(1)).unwrap().command.len(), 1);
    }

    #[test]
    fn test_controller_resets_to_owner_off_battlefield() {
        let mut game = test_game();
        let id = game.add_card(PlayerId(0), Zone::Hand, bears());
        let card = game.player_mut(PlayerId(0)).unwrap().take_card(Zone::Hand, id).unwrap();
        game.put_onto_battlefield(card, PlayerId(1));
        assert_eq!(game.permanent(id).unwrap().controller(), PlayerId(1));

        game.move_object(id, Zone::Graveyard);
        let owner = game.player(PlayerId(0)).unwrap();
        assert_eq!(owner.graveyard[0].controller, PlayerId(0));
    }

    #[test]
    fn test_draw_from_empty_library_flags_player() {
        let mut game = test_game();
        game.add_card(PlayerId(0), Zone::Library, bears());

        let drawn = game.draw_cards(PlayerId(0), 2);

        assert_eq!(drawn.len(), 1);
        assert!(game.player(PlayerId(0)).unwrap().drew_from_empty_library);
    }

    #[test]
    fn test_card_flip_between_hidden_and_public() {
        let mut game = test_game();
        let id = game.add_card(PlayerId(0), Zone::Hand, bears());
        game.move_object(id, Zone::Graveyard);
        assert!(game.take_events().contains(&GameEvent::CardFlipped {
            object: id,
            face_up: true
        }));
    }

    #[test]
    fn test_adjust_life_records_change() {
        let mut game = test_game();
        game.lose_life(PlayerId(1), 3);
        assert_eq!(
            game.take_events(),
            vec![GameEvent::LifeChanged {
                player: PlayerId(1),
                old: 40,
                new: 37
            }]
        );
    }

    #[test]
    fn test_seeded_shuffle_is_deterministic() {
        let build = || {
            let mut game = test_game();
            for i in 0..20 {
                game.add_card(PlayerId(0), Zone::Library, CardBuilder::new(format!("Card {i}")));
            }
            game.shuffle_library(PlayerId(0));
            game.player(PlayerId(0))
                .unwrap()
                .library
                .iter()
                .map(|c| c.name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }
}
