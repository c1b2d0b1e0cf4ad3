//! Static ability processor.
//!
//! Turns the static buffs printed on permanents ("Creatures you control get
//! +1/+1", "Equipped creature gets +2/+0") into continuous effects for the
//! recompute pass.
//!
//! Keywords a card has on its own (Flying, Trample, ...) never become effects:
//! they are part of the printed characteristics the recompute starts from.
//! Only abilities that affect other objects are generated here.
//!
//! Generated effects are transient: they are rebuilt on every recompute and
//! never stored in the [`ContinuousEffectManager`](crate::continuous::ContinuousEffectManager),
//! so a buff disappears the moment its source leaves the battlefield.

use crate::ability::{Ability, BuffScope, StaticBuff};
use crate::continuous::{ContinuousEffect, Duration, EffectTarget, Modification};
use crate::game_state::GameState;
use crate::permanent::Permanent;

/// Generate all continuous effects from static abilities on the battlefield.
///
/// Each effect takes its timestamp from the source permanent's battlefield
/// entry, so older buffs apply first within a layer.
pub fn generate_continuous_effects_from_static_abilities(
    game: &GameState,
) -> Vec<ContinuousEffect> {
    let mut effects = Vec::new();
    for permanent in game.permanents() {
        for ability in &permanent.card.abilities {
            if let Ability::StaticBuff(buff) = ability {
                effects.extend(effects_for_buff(permanent, buff));
            }
        }
    }
    effects
}

fn effects_for_buff(source: &Permanent, buff: &StaticBuff) -> Vec<ContinuousEffect> {
    let affected = match buff.scope {
        BuffScope::CreaturesYouControl { other_only } => EffectTarget::CreaturesControlledBy {
            player: source.controller(),
            except: other_only.then(|| source.id()),
        },
        BuffScope::AttachedCreature => match source.attached_to {
            Some(target) => EffectTarget::Object(target),
            None => return Vec::new(),
        },
    };

    let mut modifications = Vec::new();
    if buff.power != 0 || buff.toughness != 0 {
        modifications.push(Modification::ModifyPowerToughness {
            power: buff.power,
            toughness: buff.toughness,
        });
    }
    modifications.extend(buff.keywords.iter().copied().map(Modification::AddKeyword));

    modifications
        .into_iter()
        .map(|modification| {
            let mut effect = ContinuousEffect::new(
                source.controller(),
                affected,
                modification,
                Duration::WhileSourceOnBattlefield,
            )
            .from_source(source.id());
            effect.timestamp = source.timestamp;
            effect
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Keyword;
    use crate::card::CardBuilder;
    use crate::config::GameConfig;
    use crate::ids::PlayerId;
    use crate::zone::Zone;

    fn test_game() -> GameState {
        GameState::new(
            GameConfig::default(),
            vec!["Alice".to_string(), "Bob".to_string()],
        )
    }

    #[test]
    fn test_anthem_generates_effect() {
        let mut game = test_game();
        let source = game.add_card(
            PlayerId(0),
            Zone::Battlefield,
            CardBuilder::new("Glorious Anthem")
                .type_line("Enchantment")
                .oracle_text("Creatures you control get +1/+1."),
        );

        let effects = generate_continuous_effects_from_static_abilities(&game);

        assert_eq!(effects.len(), 1);
        let effect = &effects[0];
        assert_eq!(effect.source, Some(source));
        assert!(matches!(
            effect.modification,
            Modification::ModifyPowerToughness {
                power: 1,
                toughness: 1
            }
        ));
        assert_eq!(
            effect.timestamp,
            game.permanent(source).unwrap().timestamp
        );
    }

    #[test]
    fn test_self_granting_keywords_no_effect() {
        let mut game = test_game();
        game.add_card(
            PlayerId(0),
            Zone::Battlefield,
            CardBuilder::new("Serra Angel")
                .type_line("Creature — Angel")
                .oracle_text("Flying, vigilance")
                .power_toughness(4, 4),
        );
        assert!(generate_continuous_effects_from_static_abilities(&game).is_empty());
    }

    #[test]
    fn test_unattached_equipment_generates_nothing() {
        let mut game = test_game();
        let sword = game.add_card(
            PlayerId(0),
            Zone::Battlefield,
            CardBuilder::new("Test Blade")
                .type_line("Artifact — Equipment")
                .oracle_text("Equipped creature gets +1/+0 and has first strike."),
        );
        assert!(generate_continuous_effects_from_static_abilities(&game).is_empty());

        let bears = game.add_card(
            PlayerId(0),
            Zone::Battlefield,
            CardBuilder::new("Bears")
                .type_line("Creature — Bear")
                .power_toughness(2, 2),
        );
        assert!(game.attach(sword, bears));

        let effects = generate_continuous_effects_from_static_abilities(&game);
        assert_eq!(effects.len(), 2);
        assert!(effects
            .iter()
            .all(|e| e.affected == EffectTarget::Object(bears)));
        assert!(effects
            .iter()
            .any(|e| e.modification == Modification::AddKeyword(Keyword::FirstStrike)));
    }
}
