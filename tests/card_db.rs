//! Card database loading, deck lists and a match built from them.

use commander_engine::card_db::{
    COMMANDER_BANLIST, CardDatabase, DeckIssue, DeckList, validate_commander_deck,
};
use commander_engine::{CardDbError, Game, GameConfig, Step};

const CARDS_ARRAY: &str = r#"[
    {"id": "c1", "name": "Marwyn, the Nurturer", "type_line": "Legendary Creature — Elf Druid",
     "mana_cost": "{2}{G}", "oracle_text": "Whenever another Elf enters the battlefield under your control, put a +1/+1 counter on Marwyn.",
     "power": "1", "toughness": 1, "color_identity": ["G"]},
    {"id": "l1", "name": "Forest", "type_line": "Basic Land — Forest"},
    {"id": "e1", "name": "Llanowar Elves", "type_line": "Creature — Elf Druid",
     "mana_cost": "{G}", "text": "{T}: Add {G}.", "power": 1, "toughness": 1},
    {"id": "p1", "name": "Garruk Wildspeaker", "type_line": "Legendary Planeswalker — Garruk",
     "mana_cost": "{2}{G}{G}", "loyalty": "3"},
    {"name": "No Id"}
]"#;

const CARDS_OBJECT: &str = r#"{
    "c1": {"id": "c1", "name": "Marwyn, the Nurturer", "type_line": "Legendary Creature — Elf Druid", "mana_cost": "{2}{G}"},
    "l1": {"id": "l1", "name": "Forest", "type_line": "Basic Land — Forest"}
}"#;

#[test]
fn test_array_database_skips_incomplete_records() {
    let db = CardDatabase::from_json_str(CARDS_ARRAY).expect("valid json");
    assert_eq!(db.len(), 4);

    let elves = db.by_name("LLANOWAR ELVES").expect("case-insensitive");
    assert_eq!(elves.oracle_text, "{T}: Add {G}.");
    assert_eq!(elves.power.as_deref(), Some("1"));

    let garruk = db.get("p1").expect("by id").to_builder().build();
    assert_eq!(garruk.loyalty, Some(3));
    assert!(garruk.is_planeswalker());
}

#[test]
fn test_object_database_loads_values() {
    let db = CardDatabase::from_json_str(CARDS_OBJECT).expect("valid json");
    assert_eq!(db.len(), 2);
    assert!(db.by_name("marwyn the nurturer").is_some());
}

#[test]
fn test_malformed_database_is_an_error() {
    assert!(matches!(
        CardDatabase::from_json_str("{not json"),
        Err(CardDbError::Json(_))
    ));
    assert!(matches!(
        CardDatabase::from_path("/nonexistent/cards.json"),
        Err(CardDbError::Io(_))
    ));
}

#[test]
fn test_unknown_card_in_deck_list() {
    let db = CardDatabase::from_json_str(CARDS_ARRAY).expect("valid json");
    let list = DeckList::parse("1 Black Lotus\n");
    assert!(matches!(
        db.deck_for("Alice", &list),
        Err(CardDbError::UnknownCard(name)) if name == "Black Lotus"
    ));
}

#[test]
fn test_validation_of_a_loaded_deck() {
    let db = CardDatabase::from_json_str(CARDS_ARRAY).expect("valid json");
    let legal = DeckList::parse("Commander: Marwyn, the Nurturer\n97 Forest\n1 Llanowar Elves\n1 Garruk Wildspeaker\n");
    assert!(validate_commander_deck(&db, &legal, COMMANDER_BANLIST).is_legal());

    let short = DeckList::parse("Commander: Marwyn, the Nurturer\n2 Llanowar Elves\n");
    let report = validate_commander_deck(&db, &short, COMMANDER_BANLIST);
    assert!(report.issues.contains(&DeckIssue::WrongSize { found: 3 }));
    assert!(report
        .issues
        .contains(&DeckIssue::NotSingleton(vec!["Llanowar Elves".to_string()])));
}

/// Scenario: two players sit down with Marwyn decks built from the database.
/// Each has a commander in the command zone and a seven-card hand.
#[test]
fn test_match_from_deck_lists() {
    let db = CardDatabase::from_json_str(CARDS_ARRAY).expect("valid json");
    let list = DeckList::parse("Commander: Marwyn, the Nurturer\n60 Forest\n39 Llanowar Elves\n");
    let decks = vec![
        db.deck_for("Alice", &list).expect("known cards"),
        db.deck_for("Bob", &list).expect("known cards"),
    ];

    let game = Game::new(GameConfig::with_seed(3), decks);
    for player in &game.state().players {
        assert_eq!(player.hand.len(), 7);
        assert_eq!(player.library.len(), 92);
        assert_eq!(player.command.len(), 1);
        assert_eq!(player.command[0].name, "Marwyn, the Nurturer");
    }
    assert_eq!(game.state().turn.step, Some(Step::Upkeep));
}

#[test]
fn test_config_overrides_keep_other_defaults() {
    let config = GameConfig::from_json_str(r#"{"starting_life": 20, "seed": 9}"#).expect("valid json");
    assert_eq!(config.starting_life, 20);
    assert_eq!(config.seed, 9);
    assert_eq!(config.opening_hand_size, GameConfig::DEFAULT_OPENING_HAND_SIZE);
    assert_eq!(
        config.commander_damage_threshold,
        GameConfig::DEFAULT_COMMANDER_DAMAGE_THRESHOLD
    );
}
