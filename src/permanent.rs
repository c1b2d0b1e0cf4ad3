use std::collections::BTreeSet;

use crate::ability::{Ability, Keyword};
use crate::card::Card;
use crate::ids::{ObjectId, PlayerId};
use crate::mana::ManaSymbol;
use crate::types::CardType;

/// Characteristics after continuous effects are applied.
///
/// Rebuilt from the printed card on every recompute, so nothing here is
/// ever the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Characteristics {
    pub power: Option<i32>,
    pub toughness: Option<i32>,
    pub keywords: BTreeSet<Keyword>,
    pub card_types: Vec<CardType>,
}

impl Characteristics {
    pub fn from_card(card: &Card) -> Self {
        Self {
            power: card.base_power(),
            toughness: card.base_toughness(),
            keywords: card
                .abilities
                .iter()
                .filter_map(|ability| match ability {
                    Ability::Keyword(keyword) => Some(*keyword),
                    _ => None,
                })
                .collect(),
            card_types: card.type_line.card_types.clone(),
        }
    }
}

/// A card on the battlefield plus its battlefield-only state.
#[derive(Debug, Clone, PartialEq)]
pub struct Permanent {
    pub card: Card,
    pub tapped: bool,
    pub summoning_sick: bool,
    /// Damage marked this turn; cleared during cleanup.
    pub damage: u32,
    /// Set when any marked damage came from a deathtouch source.
    pub deathtouch_damage: bool,
    pub loyalty: Option<i32>,
    /// The permanent an aura or equipment is attached to.
    pub attached_to: Option<ObjectId>,
    /// Controller before control-changing effects.
    pub base_controller: PlayerId,
    /// When this object entered the battlefield.
    pub timestamp: u64,
    pub effective: Characteristics,
}

impl Permanent {
    pub fn new(card: Card, timestamp: u64) -> Self {
        let effective = Characteristics::from_card(&card);
        Self {
            tapped: false,
            summoning_sick: true,
            damage: 0,
            deathtouch_damage: false,
            loyalty: card.loyalty.map(|l| l as i32),
            attached_to: None,
            base_controller: card.controller,
            timestamp,
            effective,
            card,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.card.id
    }

    pub fn controller(&self) -> PlayerId {
        self.card.controller
    }

    pub fn owner(&self) -> PlayerId {
        self.card.owner
    }

    pub fn name(&self) -> &str {
        &self.card.name
    }

    pub fn is_creature(&self) -> bool {
        self.effective.card_types.contains(&CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.effective.card_types.contains(&CardType::Land)
    }

    pub fn is_planeswalker(&self) -> bool {
        self.effective.card_types.contains(&CardType::Planeswalker)
    }

    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.effective.keywords.contains(&keyword)
    }

    pub fn power(&self) -> i32 {
        self.effective.power.unwrap_or(0)
    }

    pub fn toughness(&self) -> i32 {
        self.effective.toughness.unwrap_or(0)
    }

    /// Taps the permanent. Returns false if it was already tapped.
    pub fn tap(&mut self) -> bool {
        if self.tapped {
            return false;
        }
        self.tapped = true;
        true
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    /// Haste lets a creature ignore summoning sickness.
    pub fn is_sick(&self) -> bool {
        self.summoning_sick && !self.has_keyword(Keyword::Haste)
    }

    pub fn can_attack(&self) -> bool {
        self.is_creature() && !self.tapped && !self.is_sick() && !self.has_keyword(Keyword::Defender)
    }

    pub fn can_block(&self) -> bool {
        self.is_creature() && !self.tapped
    }

    /// Lethal damage: toughness or more, or any deathtouch damage.
    pub fn has_lethal_damage(&self) -> bool {
        if !self.is_creature() || self.damage == 0 {
            return false;
        }
        self.deathtouch_damage || self.damage as i64 >= self.toughness() as i64
    }

    /// Damage still needed to destroy this creature in combat.
    pub fn lethal_damage_remaining(&self, from_deathtouch: bool) -> u32 {
        if from_deathtouch {
            return 1;
        }
        (self.toughness() - self.damage as i32).max(1) as u32
    }

    pub fn mark_damage(&mut self, amount: u32, deathtouch: bool) {
        if amount == 0 {
            return;
        }
        self.damage += amount;
        if deathtouch {
            self.deathtouch_damage = true;
        }
    }

    pub fn clear_damage(&mut self) {
        self.damage = 0;
        self.deathtouch_damage = false;
    }

    /// Mana bundles this permanent can produce by tapping.
    ///
    /// A "{T}: Add ..." ability wins; otherwise basic land types imply their
    /// color, and any other land falls back to {C}.
    pub fn mana_options(&self) -> Vec<Vec<ManaSymbol>> {
        let mut options: Vec<Vec<ManaSymbol>> = self
            .card
            .abilities
            .iter()
            .filter_map(Ability::as_activated)
            .filter(|ability| ability.is_mana_ability() && ability.tap_cost && ability.mana_cost.is_empty())
            .flat_map(|ability| ability.mana_output())
            .collect();
        if !options.is_empty() || !self.is_land() {
            return options;
        }

        for (subtype, symbol) in [
            ("Plains", ManaSymbol::White),
            ("Island", ManaSymbol::Blue),
            ("Swamp", ManaSymbol::Black),
            ("Mountain", ManaSymbol::Red),
            ("Forest", ManaSymbol::Green),
        ] {
            if self.card.has_subtype(subtype) {
                options.push(vec![symbol]);
            }
        }
        if options.is_empty() {
            options.push(vec![ManaSymbol::Colorless]);
        }
        options
    }

    /// Untapped, able to pay a {T} cost, and produces something.
    pub fn can_tap_for_mana(&self) -> bool {
        if self.tapped {
            return false;
        }
        if self.is_creature() && self.is_sick() {
            return false;
        }
        !self.mana_options().is_empty()
    }

    /// Rebuilds effective characteristics from the printed card.
    pub fn reset_characteristics(&mut self) {
        self.effective = Characteristics::from_card(&self.card);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardBuilder;

    fn creature(name: &str, text: &str, power: i32, toughness: i32) -> Permanent {
        let card = CardBuilder::new(name)
            .id(ObjectId(1))
            .type_line("Creature — Test")
            .oracle_text(text)
            .power_toughness(power, toughness)
            .build();
        Permanent::new(card, 1)
    }

    #[test]
    fn test_new_permanent_is_sick_and_untapped() {
        let bears = creature("Grizzly Bears", "", 2, 2);
        assert!(bears.summoning_sick);
        assert!(!bears.tapped);
        assert!(!bears.can_attack());
        assert!(bears.can_block());
        assert_eq!((bears.power(), bears.toughness()), (2, 2));
    }

    #[test]
    fn test_haste_ignores_sickness() {
        let goblin = creature("Raging Goblin", "Haste", 1, 1);
        assert!(goblin.can_attack());
    }

    #[test]
    fn test_tap_reports_state_change() {
        let mut bears = creature("Grizzly Bears", "", 2, 2);
        assert!(bears.tap());
        assert!(!bears.tap());
        bears.untap();
        assert!(!bears.tapped);
    }

    #[test]
    fn test_lethal_damage_and_deathtouch() {
        let mut giant = creature("Hill Giant", "", 3, 3);
        giant.mark_damage(2, false);
        assert!(!giant.has_lethal_damage());
        assert_eq!(giant.lethal_damage_remaining(false), 1);
        giant.mark_damage(1, true);
        assert!(giant.has_lethal_damage());
        giant.clear_damage();
        assert!(!giant.has_lethal_damage());
    }

    #[test]
    fn test_mana_options_from_ability_and_subtypes() {
        let mut elves = creature("Llanowar Elves", "{T}: Add {G}.", 1, 1);
        assert_eq!(elves.mana_options(), vec![vec![ManaSymbol::Green]]);
        assert!(!elves.can_tap_for_mana());
        elves.summoning_sick = false;
        assert!(elves.can_tap_for_mana());

        let wastes = Permanent::new(
            CardBuilder::new("Wastes").type_line("Basic Land").build(),
            2,
        );
        assert_eq!(wastes.mana_options(), vec![vec![ManaSymbol::Colorless]]);

        let savannah = Permanent::new(
            CardBuilder::new("Savannah")
                .type_line("Land — Forest Plains")
                .build(),
            3,
        );
        assert_eq!(savannah.mana_options().len(), 2);
        assert!(savannah.can_tap_for_mana());
    }

    #[test]
    fn test_planeswalker_starts_with_printed_loyalty() {
        let card = CardBuilder::new("Test Walker")
            .type_line("Legendary Planeswalker — Test")
            .loyalty(3)
            .build();
        let walker = Permanent::new(card, 4);
        assert_eq!(walker.loyalty, Some(3));
        assert!(walker.is_planeswalker());
    }
}
