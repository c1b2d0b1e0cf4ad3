//! The match session.
//!
//! [`Game`] owns the [`GameState`], the [`AbilityEngine`] and the
//! [`EventBus`]. Every action intent goes through one cycle: check and apply
//! the action, then settle (feed events to the trigger listeners, drain the
//! trigger queue, recompute continuous effects, run state-based actions)
//! until nothing changes.

use crate::ability::TargetHint;
use crate::ability_engine::{AbilityEngine, ActivationOutcome, pay_cost, tap_for_mana, validate_target};
use crate::card::{Card, CardBuilder};
use crate::combat;
use crate::config::GameConfig;
use crate::continuous;
use crate::effects::resolve_effect_text;
use crate::error::ActionError;
use crate::events::{EventBus, GameEvent};
use crate::game_state::{GameState, Step, Target};
use crate::ids::{ObjectId, PlayerId};
use crate::mana::ManaSymbol;
use crate::rules::state_based::run_state_based_actions;
use crate::rules::timing::{can_cast, can_play_land, require_priority};
use crate::stack::{AbilityInstance, StackPayload};
use crate::turn::{self, PriorityResult};
use crate::zone::Zone;

/// One player's cards at match setup.
#[derive(Debug, Clone, Default)]
pub struct PlayerDeck {
    pub name: String,
    pub cards: Vec<CardBuilder>,
    pub commander: Option<CardBuilder>,
}

impl PlayerDeck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_cards(mut self, cards: Vec<CardBuilder>) -> Self {
        self.cards = cards;
        self
    }

    pub fn with_commander(mut self, commander: CardBuilder) -> Self {
        self.commander = Some(commander);
        self
    }
}

/// An action intent from a player, an AI or a network relay.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Action {
    PlayLand {
        player: PlayerId,
        card: ObjectId,
    },
    CastSpell {
        player: PlayerId,
        card: ObjectId,
        targets: Vec<Target>,
        x_value: u32,
    },
    ActivateAbility {
        player: PlayerId,
        card: ObjectId,
        ability_index: usize,
        targets: Vec<Target>,
    },
    ProvideTarget {
        player: PlayerId,
        target: Target,
    },
    CancelActivation {
        player: PlayerId,
    },
    TapForMana {
        player: PlayerId,
        card: ObjectId,
        option: usize,
    },
    ToggleAttacker {
        player: PlayerId,
        creature: ObjectId,
    },
    ToggleBlocker {
        player: PlayerId,
        blocker: ObjectId,
        attacker: ObjectId,
    },
    PassPriority {
        player: PlayerId,
    },
    AdvancePhase,
}

/// Outcome of [`Game::apply`]. Illegal actions change nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum ActionResult {
    Ok,
    Illegal { reason: String },
}

impl ActionResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ActionResult::Ok)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ActionResult::Ok => None,
            ActionResult::Illegal { reason } => Some(reason),
        }
    }
}

#[derive(Debug)]
pub struct Game {
    state: GameState,
    engine: AbilityEngine,
    events: EventBus,
    finished: bool,
}

impl Game {
    /// Sets up a match: libraries loaded and shuffled, commanders placed in
    /// the command zone, opening hands drawn, and turn 1 advanced to the
    /// first priority step.
    pub fn new(config: GameConfig, decks: Vec<PlayerDeck>) -> Self {
        let names = decks.iter().map(|deck| deck.name.clone()).collect();
        let mut state = GameState::new(config, names);

        for (index, deck) in decks.into_iter().enumerate() {
            let owner = PlayerId::from_index(index);
            for builder in deck.cards {
                state.add_card(owner, Zone::Library, builder);
            }
            if let Some(commander) = deck.commander {
                state.add_card(owner, Zone::Command, commander.commander());
            }
            state.shuffle_library(owner);
        }

        let hand_size = state.config.opening_hand_size;
        for player in state.in_game_players() {
            state.draw_cards(player, hand_size);
        }
        // Setup moves are not game events.
        state.take_events();

        let mut game = Self::from_state(state);
        if let Err(err) = turn::advance_step(&mut game.state) {
            tracing::warn!(%err, "could not start the first turn");
        }
        game.settle();
        tracing::debug!(
            players = game.state.players.len(),
            phase = %turn::current_phase_description(&game.state),
            "match started"
        );
        game
    }

    /// Wraps an existing state. Permanents already on the battlefield get
    /// their triggers registered.
    pub fn from_state(state: GameState) -> Self {
        let mut engine = AbilityEngine::new();
        engine.register_battlefield(&state);
        let events = EventBus::new(state.config.event_drain_limit);
        Self {
            state,
            engine,
            events,
            finished: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access for setup and tests. Call [`Game::settle`] after
    /// changing anything the rules watch.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn engine(&self) -> &AbilityEngine {
        &self.engine
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn active_player(&self) -> PlayerId {
        self.state.turn.active_player
    }

    pub fn priority_holder(&self) -> Option<PlayerId> {
        turn::priority_holder(&self.state)
    }

    pub fn is_over(&self) -> bool {
        self.state.is_game_over()
    }

    /// The last player standing, once the game is over.
    pub fn winner(&self) -> Option<PlayerId> {
        if !self.is_over() {
            return None;
        }
        match self.state.in_game_players().as_slice() {
            [survivor] => Some(*survivor),
            _ => None,
        }
    }

    /// Applies one action intent. Never fails: an illegal action is
    /// reported with its reason and leaves the state untouched.
    pub fn apply(&mut self, action: Action) -> ActionResult {
        let result = match action.clone() {
            Action::PlayLand { player, card } => self.play_land(player, card),
            Action::CastSpell {
                player,
                card,
                targets,
                x_value,
            } => self.cast_spell(player, card, targets, x_value),
            Action::ActivateAbility {
                player,
                card,
                ability_index,
                targets,
            } => self
                .activate_ability(player, card, ability_index, targets)
                .map(|_| ()),
            Action::ProvideTarget { player, target } => {
                self.provide_target(player, target).map(|_| ())
            }
            Action::CancelActivation { player } => self.cancel_activation(player),
            Action::TapForMana {
                player,
                card,
                option,
            } => self.tap_for_mana(player, card, option).map(|_| ()),
            Action::ToggleAttacker { player, creature } => {
                self.toggle_attacker(player, creature).map(|_| ())
            }
            Action::ToggleBlocker {
                player,
                blocker,
                attacker,
            } => self.toggle_blocker(player, blocker, attacker).map(|_| ()),
            Action::PassPriority { player } => self.pass_priority(player).map(|_| ()),
            Action::AdvancePhase => self.advance_phase(),
        };
        match result {
            Ok(()) => ActionResult::Ok,
            Err(err) => {
                tracing::debug!(?action, %err, "illegal action");
                ActionResult::Illegal {
                    reason: err.to_string(),
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Action intents
    // ------------------------------------------------------------------

    pub fn play_land(&mut self, player: PlayerId, card: ObjectId) -> Result<(), ActionError> {
        self.require_no_pending_activation()?;
        can_play_land(&self.state, player, card)?;
        self.state.move_object(card, Zone::Battlefield);
        if let Some(player_state) = self.state.player_mut(player) {
            player_state.record_land_play();
        }
        tracing::debug!(%player, %card, "land played");
        self.settle();
        Ok(())
    }

    /// Casts a spell from hand, or a commander from the command zone.
    ///
    /// Instants, sorceries and auras that target need their targets up
    /// front. The cost (plus commander tax) is paid before the card moves,
    /// so a failed payment leaves the card where it was.
    pub fn cast_spell(
        &mut self,
        player: PlayerId,
        card: ObjectId,
        targets: Vec<Target>,
        x_value: u32,
    ) -> Result<(), ActionError> {
        self.require_no_pending_activation()?;
        let zone = can_cast(&self.state, player, card)?;
        let spell = self
            .state
            .player(player)
            .and_then(|p| p.card_in(zone, card))
            .cloned()
            .ok_or(ActionError::NotInZone { card, player, zone })?;

        if let Some(hint) = spell_target_hint(&spell) {
            if targets.is_empty() {
                return Err(ActionError::IllegalTarget(format!(
                    "{} needs a {hint:?} target",
                    spell.name
                )));
            }
            for target in &targets {
                validate_target(&self.state, player, hint, *target)?;
            }
        }

        let cost = if zone == Zone::Command {
            let tax = self.state.player(player).map_or(0, |p| {
                p.commander
                    .tax_for(card, self.state.config.commander_tax_step)
            });
            spell.mana_cost.with_additional_generic(tax)
        } else {
            spell.mana_cost.clone()
        };
        pay_cost(&mut self.state, player, &cost, x_value)?;

        if zone == Zone::Command
            && let Some(player_state) = self.state.player_mut(player)
        {
            player_state.commander.note_cast(card);
        }
        self.state.move_object(card, Zone::Stack);
        if let Some(item) = self.state.stack.peek_mut()
            && let StackPayload::Spell {
                card: on_stack,
                targets: chosen,
                x_value: chosen_x,
            } = &mut item.payload
            && on_stack.id == card
        {
            *chosen = targets;
            *chosen_x = x_value;
        }
        self.state.push_event(GameEvent::SpellCast {
            card,
            controller: player,
        });
        self.state.priority.on_stack_push();
        tracing::debug!(%player, spell = %spell.name, cost = %cost.to_oracle(), "spell cast");
        self.settle();
        Ok(())
    }

    pub fn activate_ability(
        &mut self,
        player: PlayerId,
        card: ObjectId,
        ability_index: usize,
        targets: Vec<Target>,
    ) -> Result<ActivationOutcome, ActionError> {
        let outcome = self
            .engine
            .activate(&mut self.state, player, card, ability_index, targets)?;
        self.settle();
        Ok(outcome)
    }

    pub fn provide_target(
        &mut self,
        player: PlayerId,
        target: Target,
    ) -> Result<ActivationOutcome, ActionError> {
        let outcome = self.engine.provide_target(&mut self.state, player, target)?;
        self.settle();
        Ok(outcome)
    }

    pub fn cancel_activation(&mut self, player: PlayerId) -> Result<(), ActionError> {
        match self.engine.pending_activation() {
            Some(pending) if pending.player == player => {
                self.engine.cancel_pending();
                Ok(())
            }
            _ => Err(ActionError::NoPendingTarget),
        }
    }

    pub fn tap_for_mana(
        &mut self,
        player: PlayerId,
        card: ObjectId,
        option: usize,
    ) -> Result<Vec<ManaSymbol>, ActionError> {
        if self.state.is_game_over() {
            return Err(ActionError::GameOver);
        }
        let mana = tap_for_mana(&mut self.state, player, card, option)?;
        self.settle();
        Ok(mana)
    }

    pub fn toggle_attacker(&mut self, player: PlayerId, creature: ObjectId) -> Result<bool, ActionError> {
        if self.state.is_game_over() {
            return Err(ActionError::GameOver);
        }
        Ok(combat::toggle_attacker(&mut self.state, player, creature)?)
    }

    pub fn toggle_blocker(
        &mut self,
        player: PlayerId,
        blocker: ObjectId,
        attacker: ObjectId,
    ) -> Result<bool, ActionError> {
        if self.state.is_game_over() {
            return Err(ActionError::GameOver);
        }
        Ok(combat::toggle_blocker(&mut self.state, player, blocker, attacker)?)
    }

    /// Passes priority. When everyone has passed, the top of the stack
    /// resolves or, with an empty stack, the game moves to the next step.
    ///
    /// The active player's first pass in the declare attackers step locks
    /// in the attackers, so attack triggers go on before anyone responds.
    pub fn pass_priority(&mut self, player: PlayerId) -> Result<PriorityResult, ActionError> {
        self.require_no_pending_activation()?;
        require_priority(&self.state, player)?;

        if self.state.turn.step == Some(Step::DeclareAttackers)
            && player == self.state.turn.active_player
            && !self.state.combat.attackers_committed
        {
            combat::commit_attackers(&mut self.state);
            self.settle();
        }

        let result = turn::pass_priority(&mut self.state, player)?;
        match result {
            PriorityResult::Continue => {}
            PriorityResult::StackResolves => self.resolve_top(),
            PriorityResult::StepEnds => turn::advance_step(&mut self.state)?,
        }
        self.settle();
        Ok(result)
    }

    /// Moves straight to the next priority step. The stack must be empty.
    pub fn advance_phase(&mut self) -> Result<(), ActionError> {
        if self.state.is_game_over() {
            return Err(ActionError::GameOver);
        }
        self.require_no_pending_activation()?;
        turn::advance_step(&mut self.state)?;
        self.settle();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Resolution and settling
    // ------------------------------------------------------------------

    /// Resolves the top stack item, then hands priority to the active
    /// player. A failing resolution is logged and the item is abandoned.
    fn resolve_top(&mut self) {
        let Some(item) = self.state.stack.peek().cloned() else {
            return;
        };
        tracing::debug!(item = %item.describe(), "resolving");

        match item.payload {
            StackPayload::Spell {
                card,
                targets,
                x_value,
            } => self.resolve_spell(card, targets, x_value),
            StackPayload::Ability(instance) => {
                self.state.stack.pop();
                if let Err(err) = resolve_effect_text(&mut self.state, &instance) {
                    tracing::warn!(source = %instance.source_name, %err, "ability failed to resolve");
                }
            }
        }
        turn::reset_priority(&mut self.state);
    }

    fn resolve_spell(&mut self, card: Card, targets: Vec<Target>, x_value: u32) {
        let id = card.id;
        if card.is_permanent_card() {
            let enchanted = if card.is_aura() {
                match targets.first() {
                    Some(Target::Object(target)) if self.state.is_on_battlefield(*target) => {
                        Some(*target)
                    }
                    _ => {
                        tracing::debug!(spell = %card.name, "aura target gone; spell fizzles");
                        self.state.move_object(id, Zone::Graveyard);
                        return;
                    }
                }
            } else {
                None
            };
            self.state.move_object(id, Zone::Battlefield);
            if let Some(target) = enchanted {
                self.state.attach(id, target);
            }
            return;
        }

        let mut instance = AbilityInstance::new(id, card.name.clone(), card.controller, 0, card.oracle_text.clone())
            .with_target_hint(TargetHint::infer(&card.oracle_text))
            .with_targets(targets);
        instance.x_value = x_value;
        match resolve_effect_text(&mut self.state, &instance) {
            Ok(effects) => tracing::debug!(spell = %card.name, effects, "spell resolved"),
            Err(err) => tracing::warn!(spell = %card.name, %err, "spell failed to resolve"),
        }
        self.state.move_object(id, Zone::Graveyard);
    }

    /// Runs the settle loop until no events, triggers or state-based actions
    /// remain, then delivers queued events to bus subscribers.
    pub fn settle(&mut self) {
        let limit = self.state.config.trigger_drain_limit;
        for _ in 0..self.state.config.max_sba_passes.max(1) {
            let events = self.state.take_events();
            for event in &events {
                self.engine.observe(&mut self.state, event);
                self.events.publish(event.clone());
            }
            let drained = self.engine.drain(&mut self.state, limit);
            continuous::recompute(&mut self.state);
            let actions = run_state_based_actions(&mut self.state);
            if events.is_empty() && drained == 0 && actions == 0 && !self.state.has_pending_events() {
                break;
            }
        }
        self.pass_priority_from_lost_player();
        self.events.process();

        if self.state.is_game_over() && !self.finished {
            self.finished = true;
            match self.winner() {
                Some(winner) => tracing::info!(%winner, "game over"),
                None => tracing::info!("game over with no survivor"),
            }
        }
    }

    fn pass_priority_from_lost_player(&mut self) {
        let Some(holder) = self.state.turn.priority_player else {
            return;
        };
        if self.state.player(holder).is_some_and(|p| p.is_in_game()) {
            return;
        }
        self.state.turn.priority_player = self.state.next_player_in_game(holder);
    }

    fn require_no_pending_activation(&self) -> Result<(), ActionError> {
        if self.engine.pending_activation().is_some() {
            return Err(ActionError::TargetPending);
        }
        Ok(())
    }
}

/// The target a spell needs when cast: the effect's target for instants
/// and sorceries, the enchanted object for auras.
fn spell_target_hint(card: &Card) -> Option<TargetHint> {
    if card.is_aura() {
        let lower = card.oracle_text.to_ascii_lowercase();
        return Some(if lower.contains("enchant creature") {
            TargetHint::Creature
        } else {
            TargetHint::Permanent
        });
    }
    if card.is_instant() || card.is_sorcery() {
        return TargetHint::infer(&card.oracle_text);
    }
    None
}
