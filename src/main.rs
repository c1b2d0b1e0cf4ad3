//! Commander - scripted match runner.
//!
//! Loads decks, plays a match with a simple autopilot for every seat and
//! prints what happened.
//!
//! ## Usage
//!
//! ```text
//! commander [OPTIONS]
//!
//! Options:
//!   --cards <file>    Card database (JSON array or object of records)
//!   --deck <file>     Deck list, repeat once per player
//!   --config <file>   GameConfig overrides as JSON
//!   --seed <n>        Shuffle seed
//!   --turns <n>       Stop after this many turns (default 10)
//!   --validate        Print Commander legality for each deck list
//! ```
//!
//! Without `--deck`, two built-in decks of basic lands and vanilla creatures
//! are used. Set `RUST_LOG=debug` to see every step.

use std::env;
use std::fs;

use anyhow::{Context, Result, bail};
use commander_engine::card_db::{COMMANDER_BANLIST, CardDatabase, DeckList, validate_commander_deck};
use commander_engine::{
    Action, ActionResult, CardBuilder, EventKind, Game, GameConfig, GameEvent, ObjectId, Phase,
    PlayerDeck, PlayerId, Step, Zone,
};

#[derive(Debug, Default)]
struct Args {
    cards: Option<String>,
    decks: Vec<String>,
    config: Option<String>,
    seed: Option<u64>,
    turns: Option<u32>,
    validate: bool,
}

const DEFAULT_TURNS: u32 = 10;

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .with_context(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--cards" => args.cards = Some(value("--cards")?),
            "--deck" => args.decks.push(value("--deck")?),
            "--config" => args.config = Some(value("--config")?),
            "--seed" => {
                args.seed = Some(value("--seed")?.parse().context("--seed must be a number")?)
            }
            "--turns" => {
                args.turns = Some(value("--turns")?.parse().context("--turns must be a number")?)
            }
            "--validate" => args.validate = true,
            "--help" | "-h" => {
                println!("Usage: commander [--cards FILE] [--deck FILE]... [--config FILE] [--seed N] [--turns N] [--validate]");
                std::process::exit(0);
            }
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            GameConfig::from_json_str(&text).with_context(|| format!("parsing {path}"))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn load_decks(args: &Args) -> Result<Vec<PlayerDeck>> {
    if args.decks.is_empty() {
        return Ok(vec![
            sample_deck("Alice", "Forest", "Grizzly Bears", "{1}{G}"),
            sample_deck("Bob", "Mountain", "Hill Giant", "{3}{R}"),
        ]);
    }

    let path = args
        .cards
        .as_deref()
        .context("--deck needs a card database (--cards)")?;
    let db = CardDatabase::from_path(path).with_context(|| format!("loading {path}"))?;

    let mut decks = Vec::with_capacity(args.decks.len());
    for (seat, deck_path) in args.decks.iter().enumerate() {
        let text = fs::read_to_string(deck_path).with_context(|| format!("reading {deck_path}"))?;
        let list = DeckList::parse(&text);
        if args.validate {
            let report = validate_commander_deck(&db, &list, COMMANDER_BANLIST);
            if report.is_legal() {
                println!("{deck_path}: legal");
            }
            for issue in &report.issues {
                println!("{deck_path}: {issue}");
            }
        }
        let name = format!("Player {}", seat + 1);
        decks.push(db.deck_for(&name, &list).with_context(|| format!("building {deck_path}"))?);
    }
    Ok(decks)
}

fn sample_deck(name: &str, land: &str, creature: &str, cost: &str) -> PlayerDeck {
    let land = CardBuilder::new(land).type_line(&format!("Basic Land — {land}"));
    let creature = CardBuilder::new(creature)
        .cost(cost)
        .type_line("Creature — Giant")
        .power_toughness(3, 3);
    let mut cards = vec![land; 40];
    cards.extend(std::iter::repeat_n(creature, 60));
    PlayerDeck::new(name).with_cards(cards)
}

/// Cards in `player`'s hand matching `pred`.
fn find_in_hand(game: &Game, player: PlayerId, pred: impl Fn(&commander_engine::Card) -> bool) -> Vec<ObjectId> {
    game.state()
        .player(player)
        .map(|p| p.hand.iter().filter(|c| pred(c)).map(|c| c.id).collect())
        .unwrap_or_default()
}

/// One decision for the priority holder: play a land, cast what it can,
/// attack with everything able, otherwise pass.
fn autopilot_step(game: &mut Game, player: PlayerId) -> ActionResult {
    let state = game.state();
    let main_phase = matches!(state.turn.phase, Phase::FirstMain | Phase::NextMain);
    let active = state.turn.active_player == player;

    if active && main_phase && state.stack.is_empty() {
        for card in find_in_hand(game, player, |c| c.is_land()) {
            if game.apply(Action::PlayLand { player, card }).is_ok() {
                return ActionResult::Ok;
            }
        }
        let mut castable = find_in_hand(game, player, |c| !c.is_land());
        if let Some(commander) = game
            .state()
            .player(player)
            .and_then(|p| p.command.first().map(|c| c.id))
        {
            castable.insert(0, commander);
        }
        for card in castable {
            let cast = Action::CastSpell {
                player,
                card,
                targets: vec![],
                x_value: 0,
            };
            if game.apply(cast).is_ok() {
                return ActionResult::Ok;
            }
        }
    }

    if active
        && game.state().turn.step == Some(Step::DeclareAttackers)
        && !game.state().combat.attackers_committed
        && game.state().combat.attackers.is_empty()
    {
        let creatures: Vec<ObjectId> = game
            .state()
            .player(player)
            .map(|p| p.battlefield.iter().filter(|c| c.is_creature()).map(|c| c.id()).collect())
            .unwrap_or_default();
        for creature in creatures {
            game.apply(Action::ToggleAttacker { player, creature });
        }
    }

    game.apply(Action::PassPriority { player })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;
    let config = load_config(&args)?;
    let decks = load_decks(&args)?;
    if decks.len() < 2 {
        bail!("a match needs at least two decks");
    }
    let turns = args.turns.unwrap_or(DEFAULT_TURNS);

    let mut game = Game::new(config, decks);
    for kind in [EventKind::LifeChange, EventKind::PlayerLost, EventKind::SpellCast] {
        game.events_mut().subscribe(
            kind,
            Box::new(|event: &GameEvent| {
                let fields: Vec<String> = event
                    .context()
                    .into_iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect();
                println!("{:?}: {}", event.kind(), fields.join(" "));
                Ok(())
            }),
        );
    }

    let mut stalls = 0;
    while !game.is_over() && game.state().turn.turn_number <= turns {
        let Some(player) = game.priority_holder() else {
            bail!("no player holds priority");
        };
        match autopilot_step(&mut game, player) {
            ActionResult::Ok => stalls = 0,
            ActionResult::Illegal { reason } => {
                stalls += 1;
                tracing::warn!(%player, %reason, "autopilot action rejected");
                if stalls > 8 {
                    bail!("autopilot is stuck: {reason}");
                }
            }
        }
    }

    println!();
    println!("After turn {}:", game.state().turn.turn_number.min(turns));
    for player in &game.state().players {
        let board = player.battlefield.len();
        let graveyard = player.cards(Zone::Graveyard).map_or(0, Vec::len);
        println!(
            "  {} - life {}, hand {}, battlefield {board}, graveyard {graveyard}{}",
            player.name,
            player.life,
            player.hand.len(),
            if player.has_lost { " (lost)" } else { "" }
        );
    }
    if let Some(winner) = game.winner() {
        println!("Winner: {winner}");
    }
    Ok(())
}
