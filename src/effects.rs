//! Effect-text handlers.
//!
//! Effect text left over after ability parsing ("draw two cards", "deals 3
//! damage to any target") is matched sentence by sentence against a small
//! registry of handlers. Each handler recognizes one phrase family and
//! produces an [`Effect`]; text no handler recognizes does nothing.

use crate::ability::{Keyword, parse_keyword_list, parse_mana_output, parse_pt_delta};
use crate::card::CardBuilder;
use crate::continuous::{self, ContinuousEffect, Duration, EffectTarget, Modification};
use crate::error::ResolutionError;
use crate::game_state::{GameState, Target};
use crate::ids::{ObjectId, PlayerId};
use crate::mana::ManaSymbol;
use crate::stack::AbilityInstance;
use crate::zone::Zone;

/// A number in effect text: a literal or the spell's X.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    Fixed(u32),
    X,
}

impl Amount {
    fn parse(word: &str) -> Option<Self> {
        let word = word.trim().to_ascii_lowercase();
        let n = match word.as_str() {
            "x" => return Some(Amount::X),
            "a" | "an" | "one" => 1,
            "two" => 2,
            "three" => 3,
            "four" => 4,
            "five" => 5,
            "six" => 6,
            "seven" => 7,
            "eight" => 8,
            "nine" => 9,
            "ten" => 10,
            digits => digits.parse().ok()?,
        };
        Some(Amount::Fixed(n))
    }

    pub fn value(self, x_value: u32) -> u32 {
        match self {
            Amount::Fixed(n) => n,
            Amount::X => x_value,
        }
    }
}

/// Which players an effect applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Players {
    You,
    EachPlayer,
    EachOpponent,
    /// The chosen player target, or the controller if none was chosen.
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageTo {
    /// The chosen target; with no target, the first opponent.
    Target,
    EachOpponent,
    EachCreature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpScope {
    Target,
    Source,
    CreaturesYouControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Draw {
        count: Amount,
        players: Players,
    },
    GainLife {
        amount: Amount,
        players: Players,
    },
    LoseLife {
        amount: Amount,
        players: Players,
    },
    DealDamage {
        amount: Amount,
        to: DamageTo,
    },
    AddMana(Vec<ManaSymbol>),
    /// "gets +N/+N and gains flying until end of turn".
    Pump {
        power: i32,
        toughness: i32,
        keywords: Vec<Keyword>,
        scope: PumpScope,
    },
    /// Attach the source to the targeted creature.
    Attach,
    Destroy,
    Exile,
    CreateToken {
        count: Amount,
        subtype: String,
        power: i32,
        toughness: i32,
        keywords: Vec<Keyword>,
    },
}

type Handler = fn(&str) -> Option<Effect>;

/// Handlers in matching order. Each may match once per sentence.
const HANDLERS: &[(&str, Handler)] = &[
    ("draw", parse_draw),
    ("gain life", parse_gain_life),
    ("lose life", parse_lose_life),
    ("damage", parse_damage),
    ("add mana", parse_add_mana),
    ("pump", parse_pump),
    ("attach", parse_attach),
    ("destroy", parse_destroy),
    ("exile", parse_exile),
    ("create token", parse_create_token),
];

/// Parses effect text into the effects the handlers recognize.
pub fn parse_effects(text: &str) -> Vec<Effect> {
    let mut effects = Vec::new();
    for sentence in text.split(". ").map(str::trim).filter(|s| !s.is_empty()) {
        let lower = sentence.trim_end_matches('.').to_ascii_lowercase();
        let before = effects.len();
        for (_, handler) in HANDLERS {
            if let Some(effect) = handler(&lower) {
                effects.push(effect);
            }
        }
        if effects.len() == before {
            tracing::debug!(text = %sentence, "no effect handler matched");
        }
    }
    effects
}

/// Resolves an ability or spell's effect text. Returns how many effects ran.
///
/// A targeted effect whose object target left the battlefield fails the
/// whole resolution.
pub fn resolve_effect_text(
    game: &mut GameState,
    instance: &AbilityInstance,
) -> Result<usize, ResolutionError> {
    let effects = parse_effects(&instance.effect_text);
    for effect in &effects {
        execute(game, instance, effect)?;
    }
    if !effects.is_empty() {
        continuous::recompute(game);
    }
    Ok(effects.len())
}

/// Runs one effect for `instance`.
pub fn execute(
    game: &mut GameState,
    instance: &AbilityInstance,
    effect: &Effect,
) -> Result<(), ResolutionError> {
    let controller = instance.controller;
    let x = instance.x_value;

    match effect {
        Effect::Draw { count, players } => {
            for player in select_players(game, instance, *players)? {
                game.draw_cards(player, count.value(x) as usize);
            }
        }
        Effect::GainLife { amount, players } => {
            for player in select_players(game, instance, *players)? {
                game.gain_life(player, amount.value(x));
            }
        }
        Effect::LoseLife { amount, players } => {
            for player in select_players(game, instance, *players)? {
                game.lose_life(player, amount.value(x));
            }
        }
        Effect::DealDamage { amount, to } => {
            let amount = amount.value(x);
            match to {
                DamageTo::Target => match first_target(instance) {
                    Some(Target::Object(id)) => {
                        require_on_battlefield(game, id)?;
                        damage_permanent(game, instance.source, id, amount);
                    }
                    Some(Target::Player(player)) => damage_player(game, player, amount)?,
                    None if instance.target_hint == Some(crate::ability::TargetHint::Creature) => {
                        return Err(ResolutionError::IllegalTarget(
                            "a creature target is required".to_string(),
                        ));
                    }
                    None => {
                        let opponent = game
                            .opponents(controller)
                            .first()
                            .copied()
                            .ok_or(ResolutionError::MissingPlayer(controller))?;
                        damage_player(game, opponent, amount)?;
                    }
                },
                DamageTo::EachOpponent => {
                    for opponent in game.opponents(controller) {
                        damage_player(game, opponent, amount)?;
                    }
                }
                DamageTo::EachCreature => {
                    let creatures: Vec<ObjectId> = game
                        .permanents()
                        .filter(|p| p.is_creature())
                        .map(|p| p.id())
                        .collect();
                    for creature in creatures {
                        damage_permanent(game, instance.source, creature, amount);
                    }
                }
            }
        }
        Effect::AddMana(symbols) => {
            let player = game
                .player_mut(controller)
                .ok_or(ResolutionError::MissingPlayer(controller))?;
            for symbol in symbols {
                player.mana_pool.add(*symbol, 1, Some(instance.source));
            }
        }
        Effect::Pump {
            power,
            toughness,
            keywords,
            scope,
        } => {
            let affected = match scope {
                PumpScope::Target => {
                    let id = target_object(instance)?;
                    require_on_battlefield(game, id)?;
                    EffectTarget::Object(id)
                }
                PumpScope::Source => {
                    require_on_battlefield(game, instance.source)?;
                    EffectTarget::Object(instance.source)
                }
                PumpScope::CreaturesYouControl => EffectTarget::CreaturesControlledBy {
                    player: controller,
                    except: None,
                },
            };
            let mut modifications = Vec::new();
            if *power != 0 || *toughness != 0 {
                modifications.push(Modification::ModifyPowerToughness {
                    power: *power,
                    toughness: *toughness,
                });
            }
            modifications.extend(keywords.iter().copied().map(Modification::AddKeyword));
            for modification in modifications {
                let timestamp = game.next_timestamp();
                game.continuous_effects.add(
                    ContinuousEffect::new(controller, affected, modification, Duration::EndOfTurn),
                    timestamp,
                );
            }
        }
        Effect::Attach => {
            let target = target_object(instance)?;
            let target_controller = game
                .permanent(target)
                .map(|p| p.controller())
                .ok_or_else(|| ResolutionError::IllegalTarget(target.to_string()))?;
            if target_controller != controller {
                return Err(ResolutionError::IllegalTarget(format!(
                    "{target} is not controlled by {controller}"
                )));
            }
            if !game.attach(instance.source, target) {
                return Err(ResolutionError::MissingSource(instance.source));
            }
        }
        Effect::Destroy => {
            let target = target_object(instance)?;
            require_on_battlefield(game, target)?;
            game.destroy(target);
        }
        Effect::Exile => {
            let target = target_object(instance)?;
            require_on_battlefield(game, target)?;
            game.move_object(target, Zone::Exile);
        }
        Effect::CreateToken {
            count,
            subtype,
            power,
            toughness,
            keywords,
        } => {
            let text = keywords
                .iter()
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(", ");
            for _ in 0..count.value(x) {
                game.create_token(
                    controller,
                    CardBuilder::new(subtype.clone())
                        .type_line(&format!("Creature — {subtype}"))
                        .power_toughness(*power, *toughness)
                        .oracle_text(text.clone()),
                );
            }
        }
    }
    Ok(())
}

fn first_target(instance: &AbilityInstance) -> Option<Target> {
    instance.targets.first().copied()
}

fn target_object(instance: &AbilityInstance) -> Result<ObjectId, ResolutionError> {
    match first_target(instance) {
        Some(Target::Object(id)) => Ok(id),
        Some(Target::Player(player)) => Err(ResolutionError::IllegalTarget(format!(
            "{player} is not a permanent"
        ))),
        None => Err(ResolutionError::IllegalTarget("no target chosen".to_string())),
    }
}

fn require_on_battlefield(game: &GameState, id: ObjectId) -> Result<(), ResolutionError> {
    if game.is_on_battlefield(id) {
        Ok(())
    } else {
        Err(ResolutionError::IllegalTarget(format!(
            "{id} is no longer on the battlefield"
        )))
    }
}

fn select_players(
    game: &GameState,
    instance: &AbilityInstance,
    players: Players,
) -> Result<Vec<PlayerId>, ResolutionError> {
    let controller = instance.controller;
    Ok(match players {
        Players::You => vec![controller],
        Players::EachPlayer => game.in_game_players(),
        Players::EachOpponent => game.opponents(controller),
        Players::Target => match first_target(instance) {
            Some(Target::Player(player)) => {
                if game.player(player).is_none() {
                    return Err(ResolutionError::MissingPlayer(player));
                }
                vec![player]
            }
            Some(Target::Object(id)) => {
                return Err(ResolutionError::IllegalTarget(format!("{id} is not a player")));
            }
            None => vec![controller],
        },
    })
}

fn damage_player(game: &mut GameState, player: PlayerId, amount: u32) -> Result<(), ResolutionError> {
    if game.player(player).is_none() {
        return Err(ResolutionError::MissingPlayer(player));
    }
    game.lose_life(player, amount);
    Ok(())
}

/// Creatures get marked damage; planeswalkers lose loyalty.
fn damage_permanent(game: &mut GameState, source: ObjectId, target: ObjectId, amount: u32) {
    let deathtouch = game
        .permanent(source)
        .is_some_and(|p| p.has_keyword(Keyword::Deathtouch));
    let Some(permanent) = game.permanent_mut(target) else {
        return;
    };
    if permanent.is_planeswalker()
        && let Some(loyalty) = permanent.loyalty.as_mut()
    {
        *loyalty -= amount as i32;
    }
    if permanent.is_creature() {
        permanent.mark_damage(amount, deathtouch);
    }
}

/// The word directly before `marker`, e.g. "two" in "draw two cards".
fn word_before<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let end = text.find(marker)?;
    text[..end].split_whitespace().last()
}

fn players_for(subject: &str) -> Players {
    if subject.contains("each opponent") {
        Players::EachOpponent
    } else if subject.contains("each player") {
        Players::EachPlayer
    } else if subject.contains("target player") || subject.contains("target opponent") {
        Players::Target
    } else {
        Players::You
    }
}

fn parse_draw(text: &str) -> Option<Effect> {
    let verb = text.find("draw")?;
    let marker = if text[verb..].contains(" cards") {
        " cards"
    } else {
        " card"
    };
    let count = Amount::parse(word_before(&text[verb..], marker)?)?;
    Some(Effect::Draw {
        count,
        players: players_for(&text[..verb]),
    })
}

fn parse_gain_life(text: &str) -> Option<Effect> {
    let verb = text.find("gain").filter(|_| text.contains(" life"))?;
    let amount = Amount::parse(word_before(&text[verb..], " life")?)?;
    Some(Effect::GainLife {
        amount,
        players: players_for(&text[..verb]),
    })
}

fn parse_lose_life(text: &str) -> Option<Effect> {
    let verb = text.find("lose").filter(|_| text.contains(" life"))?;
    let amount = Amount::parse(word_before(&text[verb..], " life")?)?;
    Some(Effect::LoseLife {
        amount,
        players: players_for(&text[..verb]),
    })
}

fn parse_damage(text: &str) -> Option<Effect> {
    let verb = text.find("deals ").or_else(|| text.find("deal "))?;
    let amount = Amount::parse(word_before(&text[verb..], " damage")?)?;
    let rest = &text[verb..];
    let to = if rest.contains("to each opponent") {
        DamageTo::EachOpponent
    } else if rest.contains("to each creature") {
        DamageTo::EachCreature
    } else {
        DamageTo::Target
    };
    Some(Effect::DealDamage { amount, to })
}

fn parse_add_mana(text: &str) -> Option<Effect> {
    if !text.starts_with("add ") {
        return None;
    }
    let bundle = parse_mana_output(text).into_iter().next()?;
    Some(Effect::AddMana(bundle))
}

fn parse_pump(text: &str) -> Option<Effect> {
    if !text.contains("until end of turn") {
        return None;
    }
    let (subject, rest) = text
        .split_once(" gets ")
        .or_else(|| text.split_once(" get "))
        .or_else(|| text.split_once(" gains "))
        .or_else(|| text.split_once(" gain "))?;
    let rest = rest.trim_end_matches("until end of turn").trim();

    let scope = if subject.contains("target creature") {
        PumpScope::Target
    } else if subject.contains("creatures you control") {
        PumpScope::CreaturesYouControl
    } else {
        PumpScope::Source
    };

    let (power, toughness, keyword_text) = match rest.split_once(' ') {
        Some((delta, tail)) if delta.contains('/') => {
            let (power, toughness) = parse_pt_delta(delta)?;
            let tail = tail
                .strip_prefix("and gains ")
                .or_else(|| tail.strip_prefix("and gain "))
                .unwrap_or("");
            (power, toughness, tail)
        }
        None if rest.contains('/') => {
            let (power, toughness) = parse_pt_delta(rest)?;
            (power, toughness, "")
        }
        _ => (0, 0, rest),
    };
    let keywords = if keyword_text.is_empty() {
        Vec::new()
    } else {
        parse_keyword_list(keyword_text)?
    };

    Some(Effect::Pump {
        power,
        toughness,
        keywords,
        scope,
    })
}

fn parse_attach(text: &str) -> Option<Effect> {
    text.starts_with("attach")
        .then_some(())
        .filter(|_| text.contains("target creature"))
        .map(|_| Effect::Attach)
}

fn parse_destroy(text: &str) -> Option<Effect> {
    text.contains("destroy target").then_some(Effect::Destroy)
}

fn parse_exile(text: &str) -> Option<Effect> {
    text.contains("exile target").then_some(Effect::Exile)
}

/// "create two 1/1 white soldier creature tokens with flying".
fn parse_create_token(text: &str) -> Option<Effect> {
    let start = text.find("create ")?;
    let rest = &text[start + "create ".len()..];
    let creature = rest.find(" creature token")?;
    let words: Vec<&str> = rest[..creature].split_whitespace().collect();
    let (count_word, descriptors) = words.split_first()?;
    let count = Amount::parse(count_word)?;

    let pt_index = descriptors.iter().position(|w| w.contains('/'))?;
    let (power, toughness) = descriptors[pt_index].split_once('/')?;
    let (power, toughness) = (power.parse().ok()?, toughness.parse().ok()?);
    let subtype = descriptors.last().filter(|_| descriptors.len() > pt_index + 1)?;
    let subtype = capitalize(subtype);

    let keywords = match rest.split_once(" with ") {
        Some((_, keyword_text)) => parse_keyword_list(keyword_text).unwrap_or_default(),
        None => Vec::new(),
    };

    Some(Effect::CreateToken {
        count,
        subtype,
        power,
        toughness,
        keywords,
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
