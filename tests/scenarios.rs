//! End-to-end scenarios played through the public `Game` API.

use commander_engine::ability::{Ability, TriggerCategory, parse_abilities};
use commander_engine::rules::{check_state_based_actions, run_state_based_actions};
use commander_engine::stack::AbilityInstance;
use commander_engine::turn::PriorityResult;
use commander_engine::{
    Action, CardBuilder, Game, GameConfig, GameState, ManaCost, ManaPool, ManaSymbol, ObjectId,
    Phase, PlayerId, Stack, StackItem, Step, Target, Zone,
};

const ALICE: PlayerId = PlayerId(0);
const BOB: PlayerId = PlayerId(1);

fn test_state() -> GameState {
    let mut state = GameState::new(
        GameConfig::default(),
        vec!["Alice".to_string(), "Bob".to_string()],
    );
    for player in [ALICE, BOB] {
        for _ in 0..10 {
            state.add_card(player, Zone::Library, forest());
        }
    }
    state.turn.phase = Phase::FirstMain;
    state.turn.step = None;
    state.turn.priority_player = Some(ALICE);
    state
}

fn forest() -> CardBuilder {
    CardBuilder::new("Forest").type_line("Basic Land — Forest")
}

fn creature(name: &str, power: i32, toughness: i32, text: &str) -> CardBuilder {
    CardBuilder::new(name)
        .type_line("Creature — Test")
        .oracle_text(text)
        .power_toughness(power, toughness)
}

/// Puts a creature onto the battlefield that has been there since last turn.
fn ready_creature(state: &mut GameState, controller: PlayerId, builder: CardBuilder) -> ObjectId {
    let id = state.add_card(controller, Zone::Battlefield, builder);
    if let Some(permanent) = state.permanent_mut(id) {
        permanent.summoning_sick = false;
    }
    id
}

fn start(mut state: GameState) -> Game {
    state.take_events();
    Game::from_state(state)
}

fn pass_round(game: &mut Game) -> PriorityResult {
    let first = game.priority_holder().expect("someone holds priority");
    assert!(game.apply(Action::PassPriority { player: first }).is_ok());
    let second = game.priority_holder().expect("someone holds priority");
    game.pass_priority(second).expect("pass is legal")
}

fn advance_to(game: &mut Game, active: PlayerId, step: Option<Step>, phase: Phase) {
    for _ in 0..64 {
        let turn = &game.state().turn;
        if turn.active_player == active && turn.step == step && turn.phase == phase {
            return;
        }
        let result = game.apply(Action::AdvancePhase);
        assert!(result.is_ok(), "{result:?}");
    }
    panic!("never reached {phase:?} {step:?} for {active}");
}

/// Scenario: a pool of {R}{R}{G}{C}{C}{C} pays {2}{R}{R}, spending colorless
/// on the generic part and keeping the green.
#[test]
fn test_mana_payment_prefers_colorless_for_generic() {
    let mut pool = ManaPool::new();
    pool.add(ManaSymbol::Red, 2, None);
    pool.add(ManaSymbol::Green, 1, None);
    pool.add(ManaSymbol::Colorless, 3, None);
    let cost = ManaCost::parse("{2}{R}{R}");

    assert!(pool.can_pay(&cost));
    let payment = pool.pay(&cost).expect("payable");
    assert_eq!(payment.mana_spent(), 4);
    assert_eq!(pool.amount(ManaSymbol::Red), 0);
    assert_eq!(pool.amount(ManaSymbol::Green), 1);
    assert_eq!(pool.amount(ManaSymbol::Colorless), 1);
}

/// Scenario: a 5/5 trampler is blocked by a 2/2. The blocker takes 2 and
/// dies, Bob takes the other 3.
#[test]
fn test_trample_over_a_chump_blocker() {
    let mut state = test_state();
    let wurm = ready_creature(&mut state, ALICE, creature("Craw Wurm", 5, 5, "Trample"));
    let bears = ready_creature(&mut state, BOB, creature("Grizzly Bears", 2, 2, ""));
    let mut game = start(state);

    advance_to(&mut game, ALICE, Some(Step::DeclareAttackers), Phase::Combat);
    assert!(game.apply(Action::ToggleAttacker { player: ALICE, creature: wurm }).is_ok());
    pass_round(&mut game);
    assert_eq!(game.state().turn.step, Some(Step::DeclareBlockers));

    let block = Action::ToggleBlocker {
        player: BOB,
        blocker: bears,
        attacker: wurm,
    };
    assert!(game.apply(block).is_ok());
    pass_round(&mut game);

    assert_eq!(game.state().turn.step, Some(Step::CombatDamage));
    assert_eq!(game.state().players[1].life, 37);
    assert!(!game.state().is_on_battlefield(bears));
    assert_eq!(game.state().players[1].graveyard.len(), 1);
    assert!(game.state().is_on_battlefield(wurm));
}

/// Scenario: Elvish Visionary's enters trigger draws exactly one card once
/// the trigger queue drains.
#[test]
fn test_enters_trigger_draws_a_card() {
    let text = "When this creature enters the battlefield, draw a card.";
    let abilities = parse_abilities(text);
    assert_eq!(abilities.len(), 1);
    let Ability::Triggered(trigger) = &abilities[0] else {
        panic!("expected a triggered ability, got {abilities:?}");
    };
    assert_eq!(trigger.category, TriggerCategory::EntersBattlefield);
    assert_eq!(trigger.effect_text, "draw a card.");

    let mut state = test_state();
    let visionary = state.add_card(ALICE, Zone::Hand, creature("Elvish Visionary", 1, 1, text));
    let mut game = start(state);

    assert!(game
        .apply(Action::CastSpell {
            player: ALICE,
            card: visionary,
            targets: vec![],
            x_value: 0,
        })
        .is_ok());
    let hand_after_cast = game.state().players[0].hand.len();
    assert_eq!(pass_round(&mut game), PriorityResult::StackResolves);

    assert!(game.state().is_on_battlefield(visionary));
    assert_eq!(game.state().players[0].hand.len(), hand_after_cast + 1);
    assert_eq!(game.engine().pending_triggers(), 0);
}

/// Scenario: toggling the same attacker on and off leaves no attackers.
#[test]
fn test_attacker_toggle_round_trip() {
    let mut state = test_state();
    let bears = ready_creature(&mut state, ALICE, creature("Grizzly Bears", 2, 2, ""));
    let mut game = start(state);
    advance_to(&mut game, ALICE, Some(Step::DeclareAttackers), Phase::Combat);

    let toggle = Action::ToggleAttacker { player: ALICE, creature: bears };
    assert!(game.apply(toggle.clone()).is_ok());
    assert!(game.apply(toggle).is_ok());
    assert!(game.state().combat.attackers.is_empty());
}

/// Scenario: Bob drops to 0 life. The first state-based pass marks his loss;
/// a second pass finds nothing to do.
#[test]
fn test_zero_life_loses_once() {
    let mut state = GameState::new(
        GameConfig::default(),
        vec!["Alice".into(), "Bob".into(), "Carol".into()],
    );
    state.players[1].life = 0;

    assert_eq!(run_state_based_actions(&mut state), 1);
    assert!(state.players[1].has_lost);
    assert!(check_state_based_actions(&state).is_empty());
    assert_eq!(run_state_based_actions(&mut state), 0);
}

#[test]
fn test_stack_resolves_last_in_first_out() {
    let mut stack = Stack::new();
    for source in 1..=3 {
        stack.push(StackItem::ability(AbilityInstance::new(
            ObjectId(source),
            "Source",
            ALICE,
            0,
            "gain 1 life",
        )));
    }
    let order: Vec<ObjectId> = std::iter::from_fn(|| stack.pop())
        .map(|item| item.source())
        .collect();
    assert_eq!(order, vec![ObjectId(3), ObjectId(2), ObjectId(1)]);
}

/// Scenario: the stack resolves in reverse cast order through real priority
/// passes. Alice gains life, Bob responds with damage; Bob's spell resolves
/// first.
#[test]
fn test_spells_resolve_in_reverse_order() {
    let mut state = test_state();
    let mountain = CardBuilder::new("Mountain").type_line("Basic Land — Mountain");
    state.add_card(ALICE, Zone::Battlefield, forest());
    state.add_card(BOB, Zone::Battlefield, mountain);
    let salve = state.add_card(
        ALICE,
        Zone::Hand,
        CardBuilder::new("Healing Salve")
            .cost("{G}")
            .type_line("Instant")
            .oracle_text("You gain 3 life."),
    );
    let shock = state.add_card(
        BOB,
        Zone::Hand,
        CardBuilder::new("Shock")
            .cost("{R}")
            .type_line("Instant")
            .oracle_text("Shock deals 2 damage to any target."),
    );
    let mut game = start(state);

    assert!(game
        .apply(Action::CastSpell { player: ALICE, card: salve, targets: vec![], x_value: 0 })
        .is_ok());
    assert!(game.apply(Action::PassPriority { player: ALICE }).is_ok());
    let response = Action::CastSpell {
        player: BOB,
        card: shock,
        targets: vec![Target::Player(ALICE)],
        x_value: 0,
    };
    assert!(game.apply(response).is_ok());
    assert_eq!(game.state().stack.len(), 2);

    // Bob passes, Alice passes: Shock resolves first.
    assert!(game.apply(Action::PassPriority { player: BOB }).is_ok());
    assert!(game.apply(Action::PassPriority { player: ALICE }).is_ok());
    assert_eq!(game.state().players[0].life, 38);
    assert_eq!(game.state().stack.len(), 1);
    assert_eq!(game.priority_holder(), Some(ALICE));

    pass_round(&mut game);
    assert_eq!(game.state().players[0].life, 41);
    assert!(game.state().stack.is_empty());
}

/// Scenario: with an empty stack both players pass and the step ends.
#[test]
fn test_consecutive_passes_end_the_step() {
    let mut game = start(test_state());
    assert_eq!(pass_round(&mut game), PriorityResult::StepEnds);
    assert_eq!(game.state().turn.step, Some(Step::BeginCombat));
    assert_eq!(game.priority_holder(), Some(ALICE));
}

/// Scenario: Alice's fresh Grizzly Bears can't attack this turn but can on
/// her next turn, after her untap step.
#[test]
fn test_summoning_sickness_wears_off_after_untap() {
    let mut state = test_state();
    state.add_card(ALICE, Zone::Battlefield, forest());
    state.add_card(ALICE, Zone::Battlefield, forest());
    let bears = state.add_card(
        ALICE,
        Zone::Hand,
        CardBuilder::new("Grizzly Bears")
            .cost("{1}{G}")
            .type_line("Creature — Bear")
            .power_toughness(2, 2),
    );
    let mut game = start(state);

    assert!(game
        .apply(Action::CastSpell { player: ALICE, card: bears, targets: vec![], x_value: 0 })
        .is_ok());
    pass_round(&mut game);
    assert!(game.state().is_on_battlefield(bears));

    advance_to(&mut game, ALICE, Some(Step::DeclareAttackers), Phase::Combat);
    let toggle = Action::ToggleAttacker { player: ALICE, creature: bears };
    assert!(!game.apply(toggle.clone()).is_ok());

    advance_to(&mut game, BOB, Some(Step::Upkeep), Phase::Beginning);
    advance_to(&mut game, ALICE, Some(Step::DeclareAttackers), Phase::Combat);
    assert_eq!(game.state().turn.turn_number, 3);
    assert!(game.apply(toggle).is_ok());
}

/// Scenario: lethal damage is handled in one settle; running the
/// state-based loop again does nothing.
#[test]
fn test_state_based_actions_reach_fixed_point() {
    let mut state = test_state();
    let bears = ready_creature(&mut state, BOB, creature("Grizzly Bears", 2, 2, ""));
    state.permanent_mut(bears).expect("on battlefield").damage = 2;
    let mut game = start(state);

    game.settle();
    assert!(!game.state().is_on_battlefield(bears));
    assert_eq!(run_state_based_actions(game.state_mut()), 0);
}

/// Scenario: Alice casts her commander, it dies and returns to the command
/// zone, and the recast costs two more.
#[test]
fn test_commander_recast_pays_tax() {
    let mut state = test_state();
    for _ in 0..4 {
        state.add_card(ALICE, Zone::Battlefield, forest());
    }
    let marwyn = state.add_card(
        ALICE,
        Zone::Command,
        CardBuilder::new("Marwyn, the Nurturer")
            .cost("{G}")
            .type_line("Legendary Creature — Elf Druid")
            .power_toughness(1, 1)
            .commander(),
    );
    let mut game = start(state);
    let cast = Action::CastSpell { player: ALICE, card: marwyn, targets: vec![], x_value: 0 };

    assert!(game.apply(cast.clone()).is_ok());
    pass_round(&mut game);
    game.state_mut().destroy(marwyn);
    game.settle();
    assert_eq!(game.state().players[0].command.len(), 1);

    // {G} plus 2 tax: three of the remaining three Forests.
    assert!(game.apply(cast.clone()).is_ok());
    pass_round(&mut game);
    game.state_mut().destroy(marwyn);
    game.settle();

    // {G} plus 4 tax with no untapped Forests left.
    let result = game.apply(cast);
    assert!(!result.is_ok());
    assert!(result.reason().is_some());
    assert_eq!(game.state().players[0].commander.casts(marwyn), 2);
}

/// Scenario: Bob's library is empty when his draw step comes; he loses and
/// Alice wins.
#[test]
fn test_drawing_from_empty_library_loses() {
    let mut state = GameState::new(
        GameConfig::default(),
        vec!["Alice".to_string(), "Bob".to_string()],
    );
    state.add_card(ALICE, Zone::Library, forest());
    state.turn.phase = Phase::NextMain;
    state.turn.step = None;
    state.turn.priority_player = Some(ALICE);
    let mut game = start(state);

    for _ in 0..8 {
        if game.is_over() {
            break;
        }
        game.apply(Action::AdvancePhase);
    }
    assert!(game.is_over());
    assert_eq!(game.winner(), Some(ALICE));
}
