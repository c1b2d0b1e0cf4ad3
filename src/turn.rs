//! Turn structure and priority system.
//!
//! This module handles:
//! - Turn and phase progression (untap, upkeep, draw, main, combat, etc.)
//! - Priority passing and the passed-set bookkeeping
//! - Step-entry actions (untapping, drawing, combat damage, cleanup)

use std::collections::BTreeSet;

use thiserror::Error;

use crate::combat;
use crate::continuous;
use crate::error::ActionError;
use crate::events::GameEvent;
use crate::game_state::{GameState, Phase, Step};
use crate::ids::PlayerId;

/// Errors that can occur during turn progression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("no players left in the game")]
    NoPlayersRemaining,

    #[error("the stack must be empty to leave a step")]
    StackNotEmpty,
}

/// Where the current priority round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityState {
    /// A step just began; the active player is about to act.
    #[default]
    WaitingForPriority,
    /// The holder did something (cast, activated) and keeps priority.
    HoldingPriority,
    /// At least one player passed and priority moved on.
    Passed,
    /// Everyone passed with an empty stack.
    StepEnding,
}

/// Result of passing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityResult {
    /// More players need to pass priority.
    Continue,
    /// All players passed in succession; resolve the top of the stack.
    StackResolves,
    /// All players passed with an empty stack; the step ends.
    StepEnds,
}

/// Tracks which players have passed since the last stack change.
#[derive(Debug, Clone, Default)]
pub struct PriorityTracker {
    pub state: PriorityState,
    pub passed: BTreeSet<PlayerId>,
}

impl PriorityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the passed-set at the start of a priority round.
    pub fn reset(&mut self) {
        self.passed.clear();
        self.state = PriorityState::WaitingForPriority;
    }

    /// Something went on the stack: everyone gets another chance.
    pub fn on_stack_push(&mut self) {
        self.passed.clear();
        self.state = PriorityState::HoldingPriority;
    }

    pub fn has_passed(&self, player: PlayerId) -> bool {
        self.passed.contains(&player)
    }
}

/// Returns the next step within a phase, or None if the phase is over.
pub fn next_step(phase: Phase, current_step: Option<Step>) -> Option<Step> {
    match (phase, current_step) {
        // Beginning phase
        (Phase::Beginning, Some(Step::Untap)) => Some(Step::Upkeep),
        (Phase::Beginning, Some(Step::Upkeep)) => Some(Step::Draw),
        (Phase::Beginning, Some(Step::Draw)) => None,
        (Phase::Beginning, None) => Some(Step::Untap),

        // Main phases have no steps
        (Phase::FirstMain, _) => None,
        (Phase::NextMain, _) => None,

        // Combat phase
        (Phase::Combat, Some(Step::BeginCombat)) => Some(Step::DeclareAttackers),
        (Phase::Combat, Some(Step::DeclareAttackers)) => Some(Step::DeclareBlockers),
        (Phase::Combat, Some(Step::DeclareBlockers)) => Some(Step::CombatDamage),
        (Phase::Combat, Some(Step::CombatDamage)) => Some(Step::EndCombat),
        (Phase::Combat, Some(Step::EndCombat)) => None,
        (Phase::Combat, None) => Some(Step::BeginCombat),

        // Ending phase
        (Phase::Ending, Some(Step::End)) => Some(Step::Cleanup),
        (Phase::Ending, Some(Step::Cleanup)) => None,
        (Phase::Ending, None) => Some(Step::End),

        _ => None,
    }
}

/// Returns the next phase after the given phase.
pub fn next_phase(phase: Phase) -> Option<Phase> {
    match phase {
        Phase::Beginning => Some(Phase::FirstMain),
        Phase::FirstMain => Some(Phase::Combat),
        Phase::Combat => Some(Phase::NextMain),
        Phase::NextMain => Some(Phase::Ending),
        Phase::Ending => None, // Turn ends
    }
}

/// Returns the first step of a phase, if any.
pub fn first_step_of_phase(phase: Phase) -> Option<Step> {
    match phase {
        Phase::Beginning => Some(Step::Untap),
        Phase::FirstMain => None,
        Phase::Combat => Some(Step::BeginCombat),
        Phase::NextMain => None,
        Phase::Ending => Some(Step::End),
    }
}

/// Advances to the next step that grants priority.
///
/// Untap and cleanup run their actions and are passed through
/// automatically. Mana pools empty on every transition.
pub fn advance_step(game: &mut GameState) -> Result<(), TurnError> {
    if game.players_in_game() == 0 {
        return Err(TurnError::NoPlayersRemaining);
    }
    if !game.stack.is_empty() {
        return Err(TurnError::StackNotEmpty);
    }

    loop {
        leave_current_step(game);
        move_to_next_step(game)?;
        game.empty_mana_pools();
        game.push_event(GameEvent::PhaseChanged {
            active_player: game.turn.active_player,
            turn_number: game.turn.turn_number,
            phase: game.turn.phase,
            step: game.turn.step,
        });
        tracing::debug!(phase = %current_phase_description(game), "step begins");
        enter_current_step(game);

        if !is_no_priority_step(game) {
            reset_priority(game);
            return Ok(());
        }
    }
}

fn move_to_next_step(game: &mut GameState) -> Result<(), TurnError> {
    if let Some(next) = next_step(game.turn.phase, game.turn.step) {
        game.turn.step = Some(next);
        return Ok(());
    }
    match next_phase(game.turn.phase) {
        Some(phase) => {
            game.turn.phase = phase;
            game.turn.step = first_step_of_phase(phase);
        }
        None => next_turn(game)?,
    }
    Ok(())
}

fn next_turn(game: &mut GameState) -> Result<(), TurnError> {
    let next = game
        .next_player_in_game(game.turn.active_player)
        .ok_or(TurnError::NoPlayersRemaining)?;
    game.turn.turn_number += 1;
    game.turn.active_player = next;
    game.turn.phase = Phase::Beginning;
    game.turn.step = Some(Step::Untap);
    tracing::debug!(turn = game.turn.turn_number, active = %next, "turn begins");
    Ok(())
}

fn leave_current_step(game: &mut GameState) {
    match game.turn.step {
        Some(Step::DeclareAttackers) => combat::commit_attackers(game),
        Some(Step::EndCombat) => combat::end_combat(&mut game.combat),
        _ => {}
    }
}

fn enter_current_step(game: &mut GameState) {
    match game.turn.step {
        Some(Step::Untap) => execute_untap_step(game),
        Some(Step::Draw) => execute_draw_step(game),
        Some(Step::CombatDamage) => {
            combat::deal_combat_damage(game);
        }
        Some(Step::Cleanup) => execute_cleanup_step(game),
        _ => {}
    }
}

/// Returns true if the given player currently has priority.
pub fn has_priority(game: &GameState, player: PlayerId) -> bool {
    game.turn.priority_player == Some(player)
}

/// Returns the current priority holder, if any.
pub fn priority_holder(game: &GameState) -> Option<PlayerId> {
    game.turn.priority_player
}

/// Passes priority for `player`, who must be holding it.
///
/// When every player still in the game has passed, the top of the stack
/// resolves or, with an empty stack, the step ends. Otherwise priority moves
/// to the next player; if that player already passed while the stack holds
/// something, the passed-set is cleared so everyone gets another chance.
pub fn pass_priority(game: &mut GameState, player: PlayerId) -> Result<PriorityResult, ActionError> {
    if game.is_game_over() {
        return Err(ActionError::GameOver);
    }
    if !has_priority(game, player) {
        return Err(ActionError::NoPriority(player));
    }

    game.priority.passed.insert(player);
    tracing::debug!(%player, "passes priority");

    let all_passed = game
        .in_game_players()
        .iter()
        .all(|p| game.priority.has_passed(*p));
    if all_passed {
        if game.stack.is_empty() {
            game.priority.state = PriorityState::StepEnding;
            return Ok(PriorityResult::StepEnds);
        }
        return Ok(PriorityResult::StackResolves);
    }

    let Some(next) = game.next_player_in_game(player) else {
        game.priority.state = PriorityState::StepEnding;
        return Ok(PriorityResult::StepEnds);
    };
    if game.priority.has_passed(next) && !game.stack.is_empty() {
        game.priority.passed.clear();
    }
    game.priority.state = PriorityState::Passed;
    game.turn.priority_player = Some(next);
    Ok(PriorityResult::Continue)
}

/// Gives priority to the active player with a fresh passed-set. Called when
/// a step begins and after each stack resolution.
pub fn reset_priority(game: &mut GameState) {
    game.priority.reset();
    game.turn.priority_player = Some(game.turn.active_player);
}

/// Returns true if it's currently "sorcery timing": main phase, empty stack.
pub fn is_sorcery_timing(game: &GameState) -> bool {
    is_main_phase(game) && game.stack.is_empty()
}

/// Returns true if the current step doesn't grant priority (untap, cleanup).
pub fn is_no_priority_step(game: &GameState) -> bool {
    matches!(game.turn.step, Some(Step::Untap) | Some(Step::Cleanup))
}

/// Untaps the active player's permanents and clears their summoning
/// sickness. Nobody else's permanents are touched.
pub fn execute_untap_step(game: &mut GameState) {
    let active_player = game.turn.active_player;

    if let Some(player) = game.player_mut(active_player) {
        player.begin_turn();
        for permanent in &mut player.battlefield {
            permanent.untap();
            permanent.summoning_sick = false;
        }
    }

    game.turn.priority_player = None;
}

/// The active player draws a card.
pub fn execute_draw_step(game: &mut GameState) {
    let active_player = game.turn.active_player;
    game.draw_cards(active_player, 1);
}

/// Removes marked damage and ends "until end of turn" effects.
pub fn execute_cleanup_step(game: &mut GameState) {
    for permanent in game.permanents_mut() {
        permanent.clear_damage();
    }

    let pruned = game.continuous_effects.prune_end_of_turn();
    if pruned > 0 {
        tracing::debug!(pruned, "end of turn effects removed");
    }
    continuous::recompute(game);

    game.turn.priority_player = None;
}

/// Returns a human-readable description of the current phase/step.
pub fn current_phase_description(game: &GameState) -> String {
    let phase_name = match game.turn.phase {
        Phase::Beginning => "Beginning",
        Phase::FirstMain => "Precombat Main",
        Phase::Combat => "Combat",
        Phase::NextMain => "Postcombat Main",
        Phase::Ending => "Ending",
    };

    if let Some(step) = game.turn.step {
        let step_name = match step {
            Step::Untap => "Untap",
            Step::Upkeep => "Upkeep",
            Step::Draw => "Draw",
            Step::BeginCombat => "Beginning of Combat",
            Step::DeclareAttackers => "Declare Attackers",
            Step::DeclareBlockers => "Declare Blockers",
            Step::CombatDamage => "Combat Damage",
            Step::EndCombat => "End of Combat",
            Step::End => "End Step",
            Step::Cleanup => "Cleanup",
        };
        format!("{} Phase - {} Step", phase_name, step_name)
    } else {
        format!("{} Phase", phase_name)
    }
}

/// Checks if the game is in a main phase (pre or post combat).
pub fn is_main_phase(game: &GameState) -> bool {
    matches!(game.turn.phase, Phase::FirstMain | Phase::NextMain)
}

/// Checks if the game is in the combat phase.
pub fn is_combat_phase(game: &GameState) -> bool {
    game.turn.phase == Phase::Combat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardBuilder;
    use crate::config::GameConfig;
    use crate::continuous::{ContinuousEffect, Duration, EffectTarget, Modification};
    use crate::stack::{AbilityInstance, StackItem};
    use crate::zone::Zone;

    const ALICE: PlayerId = PlayerId(0);
    const BOB: PlayerId = PlayerId(1);

    fn test_game() -> GameState {
        let mut game = GameState::new(
            GameConfig::default(),
            vec!["Alice".to_string(), "Bob".to_string()],
        );
        game.turn.priority_player = Some(ALICE);
        game
    }

    fn fill_libraries(game: &mut GameState) {
        for player in [ALICE, BOB] {
            for i in 0..10 {
                game.add_card(
                    player,
                    Zone::Library,
                    CardBuilder::new(format!("Forest {i}")).type_line("Basic Land — Forest"),
                );
            }
        }
    }

    fn push_ability(game: &mut GameState) {
        game.stack.push(StackItem::ability(AbilityInstance::new(
            crate::ids::ObjectId(99),
            "Test",
            ALICE,
            0,
            "draw a card",
        )));
        game.priority.on_stack_push();
    }

    #[test]
    fn test_next_step_beginning_phase() {
        assert_eq!(next_step(Phase::Beginning, Some(Step::Untap)), Some(Step::Upkeep));
        assert_eq!(next_step(Phase::Beginning, Some(Step::Upkeep)), Some(Step::Draw));
        assert_eq!(next_step(Phase::Beginning, Some(Step::Draw)), None);
    }

    #[test]
    fn test_next_step_combat_phase() {
        assert_eq!(
            next_step(Phase::Combat, Some(Step::BeginCombat)),
            Some(Step::DeclareAttackers)
        );
        assert_eq!(
            next_step(Phase::Combat, Some(Step::DeclareBlockers)),
            Some(Step::CombatDamage)
        );
        assert_eq!(next_step(Phase::Combat, Some(Step::EndCombat)), None);
    }

    #[test]
    fn test_main_phases_have_no_steps() {
        assert_eq!(next_step(Phase::FirstMain, None), None);
        assert_eq!(first_step_of_phase(Phase::NextMain), None);
    }

    #[test]
    fn test_next_phase() {
        assert_eq!(next_phase(Phase::Beginning), Some(Phase::FirstMain));
        assert_eq!(next_phase(Phase::Combat), Some(Phase::NextMain));
        assert_eq!(next_phase(Phase::Ending), None);
    }

    #[test]
    fn test_advance_skips_untap_into_upkeep() {
        let mut game = test_game();
        fill_libraries(&mut game);
        game.turn.step = Some(Step::Untap);

        advance_step(&mut game).unwrap();

        assert_eq!(game.turn.step, Some(Step::Upkeep));
        assert_eq!(game.turn.priority_player, Some(ALICE));
    }

    #[test]
    fn test_advance_through_turn_wraps_to_next_player() {
        let mut game = test_game();
        fill_libraries(&mut game);
        game.turn.step = Some(Step::Upkeep);

        // Draw, main 1, 5 combat steps, main 2, end; cleanup and untap are skipped.
        for _ in 0..9 {
            advance_step(&mut game).unwrap();
        }
        assert_eq!(game.turn.step, Some(Step::End));
        assert_eq!(game.turn.turn_number, 1);

        advance_step(&mut game).unwrap();
        assert_eq!(game.turn.turn_number, 2);
        assert_eq!(game.turn.active_player, BOB);
        assert_eq!(game.turn.phase, Phase::Beginning);
        assert_eq!(game.turn.step, Some(Step::Upkeep));
        assert_eq!(game.turn.priority_player, Some(BOB));
    }

    #[test]
    fn test_advance_with_stack_rejected() {
        let mut game = test_game();
        push_ability(&mut game);
        assert_eq!(advance_step(&mut game), Err(TurnError::StackNotEmpty));
    }

    #[test]
    fn test_draw_step_draws_one() {
        let mut game = test_game();
        fill_libraries(&mut game);
        game.turn.step = Some(Step::Upkeep);

        advance_step(&mut game).unwrap();

        assert_eq!(game.turn.step, Some(Step::Draw));
        assert_eq!(game.player(ALICE).unwrap().hand_size(), 1);
        assert_eq!(game.player(BOB).unwrap().hand_size(), 0);
    }

    #[test]
    fn test_mana_pools_empty_between_steps() {
        let mut game = test_game();
        fill_libraries(&mut game);
        game.turn.step = Some(Step::Upkeep);
        game.player_mut(ALICE)
            .unwrap()
            .mana_pool
            .add(crate::mana::ManaSymbol::Green, 3, None);

        advance_step(&mut game).unwrap();

        assert!(game.player(ALICE).unwrap().mana_pool.is_empty());
    }

    #[test]
    fn test_phase_changed_event_emitted() {
        let mut game = test_game();
        fill_libraries(&mut game);
        game.turn.step = Some(Step::Untap);
        advance_step(&mut game).unwrap();

        let events = game.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::PhaseChanged {
                step: Some(Step::Upkeep),
                ..
            }
        )));
    }

    /// Both players pass with nothing on the stack: the step ends.
    #[test]
    fn test_pass_priority_empty_stack() {
        let mut game = test_game();

        assert_eq!(pass_priority(&mut game, ALICE), Ok(PriorityResult::Continue));
        assert_eq!(game.turn.priority_player, Some(BOB));
        assert_eq!(pass_priority(&mut game, BOB), Ok(PriorityResult::StepEnds));
        assert_eq!(game.priority.state, PriorityState::StepEnding);
    }

    #[test]
    fn test_pass_priority_with_stack() {
        let mut game = test_game();
        push_ability(&mut game);

        assert_eq!(pass_priority(&mut game, ALICE), Ok(PriorityResult::Continue));
        assert_eq!(pass_priority(&mut game, BOB), Ok(PriorityResult::StackResolves));
    }

    #[test]
    fn test_pass_without_priority_rejected() {
        let mut game = test_game();
        assert_eq!(
            pass_priority(&mut game, BOB),
            Err(ActionError::NoPriority(BOB))
        );
    }

    /// Alice passes, then Bob casts something: Alice's earlier pass no
    /// longer counts.
    #[test]
    fn test_stack_push_clears_passes() {
        let mut game = test_game();
        pass_priority(&mut game, ALICE).unwrap();
        push_ability(&mut game);
        assert!(!game.priority.has_passed(ALICE));

        assert_eq!(pass_priority(&mut game, BOB), Ok(PriorityResult::Continue));
        assert_eq!(pass_priority(&mut game, ALICE), Ok(PriorityResult::StackResolves));
    }

    #[test]
    fn test_reset_priority() {
        let mut game = test_game();
        pass_priority(&mut game, ALICE).unwrap();

        reset_priority(&mut game);

        assert!(game.priority.passed.is_empty());
        assert_eq!(game.turn.priority_player, Some(ALICE));
    }

    #[test]
    fn test_is_sorcery_timing() {
        let mut game = test_game();
        game.turn.phase = Phase::FirstMain;
        game.turn.step = None;
        assert!(is_sorcery_timing(&game));

        push_ability(&mut game);
        assert!(!is_sorcery_timing(&game));

        game.turn.phase = Phase::Combat;
        game.turn.step = Some(Step::BeginCombat);
        assert!(!is_sorcery_timing(&game));
    }

    /// Alice's untap step untaps her permanents and cures their sickness;
    /// Bob's tapped land stays tapped.
    #[test]
    fn test_execute_untap_step() {
        let mut game = test_game();
        let mine = game.add_card(
            ALICE,
            Zone::Battlefield,
            CardBuilder::new("Bears").type_line("Creature — Bear").power_toughness(2, 2),
        );
        let theirs = game.add_card(
            BOB,
            Zone::Battlefield,
            CardBuilder::new("Forest").type_line("Basic Land — Forest"),
        );
        game.permanent_mut(mine).unwrap().tapped = true;
        game.permanent_mut(theirs).unwrap().tapped = true;

        execute_untap_step(&mut game);

        let mine = game.permanent(mine).unwrap();
        assert!(!mine.tapped);
        assert!(!mine.summoning_sick);
        let theirs = game.permanent(theirs).unwrap();
        assert!(theirs.tapped);
        assert!(theirs.summoning_sick);
        assert_eq!(game.turn.priority_player, None);
    }

    #[test]
    fn test_execute_cleanup_step() {
        let mut game = test_game();
        let bears = game.add_card(
            ALICE,
            Zone::Battlefield,
            CardBuilder::new("Bears").type_line("Creature — Bear").power_toughness(2, 2),
        );
        game.permanent_mut(bears).unwrap().mark_damage(1, false);
        let timestamp = game.next_timestamp();
        game.continuous_effects.add(
            ContinuousEffect::new(
                ALICE,
                EffectTarget::Object(bears),
                Modification::ModifyPowerToughness {
                    power: 3,
                    toughness: 3,
                },
                Duration::EndOfTurn,
            ),
            timestamp,
        );
        continuous::recompute(&mut game);
        assert_eq!(game.permanent(bears).unwrap().power(), 5);

        execute_cleanup_step(&mut game);

        let bears = game.permanent(bears).unwrap();
        assert_eq!(bears.damage, 0);
        assert_eq!(bears.power(), 2);
        assert!(game.continuous_effects.is_empty());
    }

    #[test]
    fn test_current_phase_description() {
        let mut game = test_game();
        game.turn.phase = Phase::Combat;
        game.turn.step = Some(Step::DeclareAttackers);
        assert_eq!(
            current_phase_description(&game),
            "Combat Phase - Declare Attackers Step"
        );
        game.turn.phase = Phase::NextMain;
        game.turn.step = None;
        assert_eq!(current_phase_description(&game), "Postcombat Main Phase");
    }

    #[test]
    fn test_is_combat_phase() {
        let mut game = test_game();
        game.turn.phase = Phase::Combat;
        game.turn.step = Some(Step::CombatDamage);
        assert!(is_combat_phase(&game));
        assert!(!is_main_phase(&game));
    }
}
