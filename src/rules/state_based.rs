//! State-based actions.
//!
//! State-based actions are checked whenever a player would receive priority.
//! They don't use the stack; every action found in one pass is applied
//! simultaneously, then the check runs again until a pass finds nothing.

use std::collections::HashMap;

use crate::events::GameEvent;
use crate::game_state::GameState;
use crate::ids::{ObjectId, PlayerId};
use crate::zone::Zone;

/// A state-based action that needs to be performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateBasedAction {
    /// A creature with toughness 0 or less, or lethal damage, goes to the graveyard.
    ObjectDies(ObjectId),

    /// A planeswalker has 0 or less loyalty and is put into the graveyard.
    PlaneswalkerDies(ObjectId),

    /// A player loses the game.
    PlayerLoses {
        player: PlayerId,
        reason: LoseReason,
    },

    /// Two or more legendary permanents with the same name under one
    /// controller. All but `keep` go to the graveyard.
    LegendRuleViolation {
        player: PlayerId,
        name: String,
        keep: ObjectId,
        others: Vec<ObjectId>,
    },

    /// An Aura whose enchanted object is gone.
    AuraFallsOff(ObjectId),

    /// An Equipment attached to a non-creature or a missing object.
    EquipmentFallsOff(ObjectId),

    /// A token not on the battlefield ceases to exist.
    TokenCeasesToExist { owner: PlayerId, token: ObjectId },
}

/// Reason why a player loses the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoseReason {
    /// Life total is 0 or less.
    ZeroLife,
    /// Poison counters at or above the configured threshold.
    Poison,
    /// Attempted to draw from an empty library.
    DrewFromEmptyLibrary,
    /// Combat damage from a single commander at or above the threshold.
    CommanderDamage,
}

impl LoseReason {
    pub fn describe(self) -> &'static str {
        match self {
            LoseReason::ZeroLife => "life total reached 0",
            LoseReason::Poison => "too many poison counters",
            LoseReason::DrewFromEmptyLibrary => "drew from an empty library",
            LoseReason::CommanderDamage => "lethal commander damage",
        }
    }
}

/// Collects every state-based action that currently applies.
pub fn check_state_based_actions(game: &GameState) -> Vec<StateBasedAction> {
    let mut actions = Vec::new();
    check_player_sbas(game, &mut actions);
    check_permanent_sbas(game, &mut actions);
    check_token_cleanup(game, &mut actions);
    check_legend_rule(game, &mut actions);
    actions
}

/// Players already out of the game are skipped, so a second pass never
/// repeats a loss.
fn check_player_sbas(game: &GameState, actions: &mut Vec<StateBasedAction>) {
    let config = &game.config;
    for player in game.players.iter().filter(|p| p.is_in_game()) {
        let reason = if player.has_lethal_life() {
            Some(LoseReason::ZeroLife)
        } else if player.drew_from_empty_library {
            Some(LoseReason::DrewFromEmptyLibrary)
        } else if player.has_lethal_poison(config.poison_threshold) {
            Some(LoseReason::Poison)
        } else if player
            .commander
            .lethal_for(player.id, config.commander_damage_threshold)
        {
            Some(LoseReason::CommanderDamage)
        } else {
            None
        };
        if let Some(reason) = reason {
            actions.push(StateBasedAction::PlayerLoses {
                player: player.id,
                reason,
            });
        }
    }
}

fn check_permanent_sbas(game: &GameState, actions: &mut Vec<StateBasedAction>) {
    for permanent in game.permanents() {
        let id = permanent.id();

        if permanent.is_creature() && (permanent.toughness() <= 0 || permanent.has_lethal_damage())
        {
            actions.push(StateBasedAction::ObjectDies(id));
            continue;
        }

        if permanent.is_planeswalker() && permanent.loyalty.is_some_and(|l| l <= 0) {
            actions.push(StateBasedAction::PlaneswalkerDies(id));
            continue;
        }

        if permanent.card.is_aura()
            && let Some(attached) = permanent.attached_to
            && !game.is_on_battlefield(attached)
        {
            actions.push(StateBasedAction::AuraFallsOff(id));
            continue;
        }

        if permanent.card.is_equipment()
            && let Some(attached) = permanent.attached_to
            && !game.permanent(attached).is_some_and(|p| p.is_creature())
        {
            actions.push(StateBasedAction::EquipmentFallsOff(id));
        }
    }
}

fn check_token_cleanup(game: &GameState, actions: &mut Vec<StateBasedAction>) {
    for player in &game.players {
        for zone in [
            Zone::Hand,
            Zone::Library,
            Zone::Graveyard,
            Zone::Exile,
            Zone::Command,
        ] {
            for card in player.cards(zone).into_iter().flatten() {
                if card.is_token {
                    actions.push(StateBasedAction::TokenCeasesToExist {
                        owner: player.id,
                        token: card.id,
                    });
                }
            }
        }
    }
}

/// The newest legend (highest timestamp) stays.
fn check_legend_rule(game: &GameState, actions: &mut Vec<StateBasedAction>) {
    let mut legends: HashMap<(PlayerId, &str), Vec<(u64, ObjectId)>> = HashMap::new();
    for permanent in game.permanents().filter(|p| p.card.is_legendary()) {
        legends
            .entry((permanent.controller(), permanent.name()))
            .or_default()
            .push((permanent.timestamp, permanent.id()));
    }

    let mut violations: Vec<StateBasedAction> = legends
        .into_iter()
        .filter(|(_, permanents)| permanents.len() > 1)
        .filter_map(|((player, name), mut permanents)| {
            permanents.sort();
            let (_, keep) = permanents.pop()?;
            Some(StateBasedAction::LegendRuleViolation {
                player,
                name: name.to_string(),
                keep,
                others: permanents.into_iter().map(|(_, id)| id).collect(),
            })
        })
        .collect();
    // HashMap order is unstable; keep the output deterministic.
    violations.sort_by_key(|action| match action {
        StateBasedAction::LegendRuleViolation { keep, .. } => *keep,
        _ => ObjectId(0),
    });
    actions.extend(violations);
}

/// Applies one pass of state-based actions.
///
/// Returns true if any state-based actions were applied. Should be called
/// repeatedly until it returns false; [`run_state_based_actions`] does that.
pub fn apply_state_based_actions(game: &mut GameState) -> bool {
    let actions = check_state_based_actions(game);
    if actions.is_empty() {
        return false;
    }
    for action in actions {
        apply_single_sba(game, action);
    }
    true
}

fn apply_single_sba(game: &mut GameState, action: StateBasedAction) {
    tracing::debug!(?action, "state-based action");
    match action {
        StateBasedAction::ObjectDies(id)
        | StateBasedAction::PlaneswalkerDies(id)
        | StateBasedAction::AuraFallsOff(id) => {
            game.move_object(id, Zone::Graveyard);
        }
        StateBasedAction::EquipmentFallsOff(id) => {
            if let Some(permanent) = game.permanent_mut(id) {
                permanent.attached_to = None;
            }
        }
        StateBasedAction::PlayerLoses { player, reason } => {
            let Some(state) = game.player_mut(player) else {
                return;
            };
            if state.has_lost {
                return;
            }
            state.has_lost = true;
            tracing::info!(%player, reason = reason.describe(), "player loses the game");
            game.push_event(GameEvent::PlayerLost {
                player,
                reason: reason.describe().to_string(),
            });
        }
        StateBasedAction::LegendRuleViolation { others, .. } => {
            for id in others {
                game.move_object(id, Zone::Graveyard);
            }
        }
        StateBasedAction::TokenCeasesToExist { owner, token } => {
            if let Some(player) = game.player_mut(owner) {
                let zone = player.zone_of(token);
                if let Some(zone) = zone {
                    player.take_card(zone, token);
                }
            }
        }
    }
}

/// Runs state-based actions to a fixed point, bounded by
/// `config.max_sba_passes`. Returns the number of passes that did something.
pub fn run_state_based_actions(game: &mut GameState) -> usize {
    let limit = game.config.max_sba_passes;
    let mut passes = 0;
    while passes < limit {
        if !apply_state_based_actions(game) {
            return passes;
        }
        passes += 1;
    }
    tracing::warn!(limit, "state-based actions did not settle");
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardBuilder;
    use crate::config::GameConfig;

    const ALICE: PlayerId = PlayerId(0);
    const BOB: PlayerId = PlayerId(1);

    fn test_game() -> GameState {
        GameState::new(
            GameConfig::default(),
            vec!["Alice".to_string(), "Bob".to_string()],
        )
    }

    fn creature(name: &str, power: i32, toughness: i32) -> CardBuilder {
        CardBuilder::new(name)
            .type_line("Creature — Bear")
            .power_toughness(power, toughness)
    }

    /// Scenario: Alice's Grizzly Bears (2/2) has taken 2 damage. The
    /// state-based check puts it into the graveyard.
    #[test]
    fn test_creature_lethal_damage_dies() {
        let mut game = test_game();
        let bears = game.add_card(ALICE, Zone::Battlefield, creature("Grizzly Bears", 2, 2));
        game.permanent_mut(bears).unwrap().mark_damage(2, false);

        let actions = check_state_based_actions(&game);
        assert_eq!(actions, vec![StateBasedAction::ObjectDies(bears)]);

        run_state_based_actions(&mut game);
        assert_eq!(game.locate(bears).map(|l| l.zone), Some(Zone::Graveyard));
    }

    /// Scenario: a 0/0 creature dies without any damage marked.
    #[test]
    fn test_creature_zero_toughness_dies() {
        let mut game = test_game();
        let husk = game.add_card(ALICE, Zone::Battlefield, creature("Empty Husk", 0, 0));

        assert!(
            check_state_based_actions(&game).contains(&StateBasedAction::ObjectDies(husk))
        );
    }

    /// Scenario: one point of deathtouch damage kills a 6/6.
    #[test]
    fn test_deathtouch_damage_is_lethal() {
        let mut game = test_game();
        let wurm = game.add_card(BOB, Zone::Battlefield, creature("Craw Wurm", 6, 6));
        game.permanent_mut(wurm).unwrap().mark_damage(1, true);

        assert!(
            check_state_based_actions(&game).contains(&StateBasedAction::ObjectDies(wurm))
        );
    }

    /// Scenario: Alice's life hits 0. The first pass marks her as having
    /// lost; the second pass does nothing more for her.
    #[test]
    fn test_player_zero_life_loses_once() {
        let mut game = test_game();
        game.player_mut(ALICE).unwrap().life = 0;

        assert!(apply_state_based_actions(&mut game));
        assert!(game.player(ALICE).unwrap().has_lost);
        let lost: Vec<GameEvent> = game
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PlayerLost { .. }))
            .collect();
        assert_eq!(lost.len(), 1);

        assert!(check_state_based_actions(&game).is_empty());
        assert!(!apply_state_based_actions(&mut game));
    }

    #[test]
    fn test_player_poison_loses() {
        let mut game = test_game();
        game.player_mut(BOB).unwrap().poison_counters = 10;

        assert_eq!(
            check_state_based_actions(&game),
            vec![StateBasedAction::PlayerLoses {
                player: BOB,
                reason: LoseReason::Poison
            }]
        );
    }

    #[test]
    fn test_empty_library_draw_loses() {
        let mut game = test_game();
        game.draw_cards(BOB, 1);

        assert_eq!(
            check_state_based_actions(&game),
            vec![StateBasedAction::PlayerLoses {
                player: BOB,
                reason: LoseReason::DrewFromEmptyLibrary
            }]
        );
    }

    /// Scenario: Bob has taken 21 combat damage from Alice's commander.
    #[test]
    fn test_commander_damage_loses() {
        let mut game = test_game();
        game.player_mut(BOB)
            .unwrap()
            .commander
            .add_damage(BOB, ALICE, ObjectId(99), 21);

        assert!(check_state_based_actions(&game).contains(&StateBasedAction::PlayerLoses {
            player: BOB,
            reason: LoseReason::CommanderDamage
        }));
    }

    /// Scenario: a planeswalker whose loyalty was reduced to 0 goes to the graveyard.
    #[test]
    fn test_planeswalker_zero_loyalty() {
        let mut game = test_game();
        let walker = game.add_card(
            ALICE,
            Zone::Battlefield,
            CardBuilder::new("Jace Beleren")
                .type_line("Legendary Planeswalker — Jace")
                .loyalty(3),
        );
        game.permanent_mut(walker).unwrap().loyalty = Some(0);

        assert!(
            check_state_based_actions(&game).contains(&StateBasedAction::PlaneswalkerDies(walker))
        );
    }

    /// Scenario: Alice controls two copies of Isamaru. The older one goes
    /// to the graveyard.
    #[test]
    fn test_legend_rule_keeps_newest() {
        let mut game = test_game();
        let legend = || {
            CardBuilder::new("Isamaru, Hound of Konda")
                .type_line("Legendary Creature — Dog")
                .power_toughness(2, 2)
        };
        let first = game.add_card(ALICE, Zone::Battlefield, legend());
        let second = game.add_card(ALICE, Zone::Battlefield, legend());

        run_state_based_actions(&mut game);

        assert!(game.is_on_battlefield(second));
        assert_eq!(game.locate(first).map(|l| l.zone), Some(Zone::Graveyard));
    }

    #[test]
    fn test_legends_under_different_controllers_coexist() {
        let mut game = test_game();
        let legend = || {
            CardBuilder::new("Isamaru, Hound of Konda")
                .type_line("Legendary Creature — Dog")
                .power_toughness(2, 2)
        };
        game.add_card(ALICE, Zone::Battlefield, legend());
        game.add_card(BOB, Zone::Battlefield, legend());

        assert!(check_state_based_actions(&game).is_empty());
    }

    /// Scenario: Pacifism's creature is exiled, so Pacifism goes to the graveyard.
    #[test]
    fn test_aura_without_object_is_destroyed() {
        let mut game = test_game();
        let bears = game.add_card(BOB, Zone::Battlefield, creature("Grizzly Bears", 2, 2));
        let aura = game.add_card(
            ALICE,
            Zone::Battlefield,
            CardBuilder::new("Pacifism").type_line("Enchantment — Aura"),
        );
        assert!(game.attach(aura, bears));
        game.move_object(bears, Zone::Exile);

        run_state_based_actions(&mut game);
        assert_eq!(game.locate(aura).map(|l| l.zone), Some(Zone::Graveyard));
    }

    /// Scenario: the creature wearing Bonesplitter leaves; the equipment
    /// stays on the battlefield unattached.
    #[test]
    fn test_equipment_without_creature_unattaches() {
        let mut game = test_game();
        let bears = game.add_card(ALICE, Zone::Battlefield, creature("Grizzly Bears", 2, 2));
        let sword = game.add_card(
            ALICE,
            Zone::Battlefield,
            CardBuilder::new("Bonesplitter").type_line("Artifact — Equipment"),
        );
        game.attach(sword, bears);
        game.move_object(bears, Zone::Hand);

        run_state_based_actions(&mut game);
        let sword = game.permanent(sword).unwrap();
        assert_eq!(sword.attached_to, None);
    }

    /// Scenario: a Soldier token dies and then ceases to exist.
    #[test]
    fn test_token_ceases_to_exist_off_battlefield() {
        let mut game = test_game();
        let token = game.create_token(ALICE, creature("Soldier", 1, 1));
        game.destroy(token);
        assert_eq!(game.locate(token).map(|l| l.zone), Some(Zone::Graveyard));

        run_state_based_actions(&mut game);
        assert_eq!(game.locate(token), None);
        assert!(game.player(ALICE).unwrap().graveyard.is_empty());
    }

    /// Scenario: with nothing new happening, the second run does nothing.
    #[test]
    fn test_fixed_point_second_run_is_idle() {
        let mut game = test_game();
        let bears = game.add_card(ALICE, Zone::Battlefield, creature("Grizzly Bears", 2, 2));
        game.permanent_mut(bears).unwrap().mark_damage(3, false);
        game.player_mut(BOB).unwrap().life = -2;

        assert!(run_state_based_actions(&mut game) > 0);
        assert_eq!(run_state_based_actions(&mut game), 0);
    }
}
