use crate::ability::{Ability, parse_abilities};
use crate::color::ColorSet;
use crate::ids::{CardId, ObjectId, PlayerId};
use crate::mana::ManaCost;
use crate::types::{CardType, Supertype, TypeLine};

/// Represents power or toughness values that may be variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtValue {
    /// Fixed numeric value (e.g., 4)
    Fixed(i32),
    /// Star value, determined by some characteristic (e.g., *)
    Star,
    /// Star plus a number (e.g., *+1)
    StarPlus(i32),
}

impl PtValue {
    /// Returns the base numeric value, treating Star as 0.
    pub fn base_value(self) -> i32 {
        match self {
            PtValue::Fixed(n) => n,
            PtValue::Star => 0,
            PtValue::StarPlus(n) => n,
        }
    }

    /// Parses printed values like "3", "*", "1+*" or "*+1".
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text == "*" {
            return Some(PtValue::Star);
        }
        if let Ok(n) = text.parse::<i32>() {
            return Some(PtValue::Fixed(n));
        }
        let stripped = text
            .strip_prefix("*+")
            .or_else(|| text.strip_suffix("+*"))?;
        stripped.trim().parse::<i32>().ok().map(PtValue::StarPlus)
    }
}

/// Power and toughness pair for creatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerToughness {
    pub power: PtValue,
    pub toughness: PtValue,
}

impl PowerToughness {
    pub fn fixed(power: i32, toughness: i32) -> Self {
        Self {
            power: PtValue::Fixed(power),
            toughness: PtValue::Fixed(toughness),
        }
    }
}

/// One card object: printed characteristics plus match bookkeeping.
///
/// Created once per match when a deck is loaded; it moves between zones but
/// is never destroyed while a zone container holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: ObjectId,
    /// Card database record this object was built from.
    pub card_id: CardId,
    pub name: String,
    pub type_line: TypeLine,
    pub mana_cost: ManaCost,
    pub oracle_text: String,
    pub power_toughness: Option<PowerToughness>,
    pub loyalty: Option<u32>,
    pub owner: PlayerId,
    pub controller: PlayerId,
    pub color_identity: ColorSet,
    pub is_token: bool,
    pub is_commander: bool,
    /// Parsed once from `oracle_text`.
    pub abilities: Vec<Ability>,
}

impl Card {
    pub fn colors(&self) -> ColorSet {
        self.mana_cost.colors()
    }

    pub fn mana_value(&self) -> u32 {
        self.mana_cost.mana_value()
    }

    pub fn has_card_type(&self, card_type: CardType) -> bool {
        self.type_line.has_type(card_type)
    }

    pub fn has_subtype(&self, subtype: &str) -> bool {
        self.type_line.has_subtype(subtype)
    }

    pub fn is_creature(&self) -> bool {
        self.has_card_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.has_card_type(CardType::Land)
    }

    pub fn is_instant(&self) -> bool {
        self.has_card_type(CardType::Instant)
    }

    pub fn is_sorcery(&self) -> bool {
        self.has_card_type(CardType::Sorcery)
    }

    pub fn is_planeswalker(&self) -> bool {
        self.has_card_type(CardType::Planeswalker)
    }

    pub fn is_legendary(&self) -> bool {
        self.type_line.has_supertype(Supertype::Legendary)
    }

    pub fn is_basic_land(&self) -> bool {
        self.is_land() && self.type_line.has_supertype(Supertype::Basic)
    }

    pub fn is_aura(&self) -> bool {
        self.has_card_type(CardType::Enchantment) && self.has_subtype("Aura")
    }

    pub fn is_equipment(&self) -> bool {
        self.has_card_type(CardType::Artifact) && self.has_subtype("Equipment")
    }

    /// Cards that stay on the battlefield when they resolve.
    pub fn is_permanent_card(&self) -> bool {
        self.type_line
            .card_types
            .iter()
            .any(|t| t.is_permanent_type())
    }

    pub fn base_power(&self) -> Option<i32> {
        self.power_toughness.map(|pt| pt.power.base_value())
    }

    pub fn base_toughness(&self) -> Option<i32> {
        self.power_toughness.map(|pt| pt.toughness.base_value())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CardBuilder {
    id: Option<ObjectId>,
    card_id: CardId,
    name: String,
    type_line: TypeLine,
    mana_cost: ManaCost,
    oracle_text: String,
    power_toughness: Option<PowerToughness>,
    loyalty: Option<u32>,
    owner: Option<PlayerId>,
    color_identity: Option<ColorSet>,
    is_token: bool,
    is_commander: bool,
}

impl CardBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: ObjectId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn card_id(mut self, card_id: CardId) -> Self {
        self.card_id = card_id;
        self
    }

    pub fn owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn mana_cost(mut self, cost: ManaCost) -> Self {
        self.mana_cost = cost;
        self
    }

    /// Parses and sets a printed cost such as `{1}{G}`.
    pub fn cost(self, text: &str) -> Self {
        self.mana_cost(ManaCost::parse(text))
    }

    /// Parses and sets a printed type line.
    pub fn type_line(mut self, text: &str) -> Self {
        self.type_line = TypeLine::parse(text);
        self
    }

    pub fn supertypes(mut self, supertypes: Vec<Supertype>) -> Self {
        self.type_line.supertypes = supertypes;
        self
    }

    pub fn card_types(mut self, types: Vec<CardType>) -> Self {
        self.type_line.card_types = types;
        self
    }

    pub fn subtypes(mut self, subtypes: Vec<String>) -> Self {
        self.type_line.subtypes = subtypes;
        self
    }

    pub fn oracle_text(mut self, text: impl Into<String>) -> Self {
        self.oracle_text = text.into();
        self
    }

    pub fn power_toughness(mut self, power: i32, toughness: i32) -> Self {
        self.power_toughness = Some(PowerToughness::fixed(power, toughness));
        self
    }

    pub fn printed_pt(mut self, pt: PowerToughness) -> Self {
        self.power_toughness = Some(pt);
        self
    }

    pub fn loyalty(mut self, loyalty: u32) -> Self {
        self.loyalty = Some(loyalty);
        self
    }

    /// Overrides the computed color identity (database-provided identity).
    pub fn color_identity(mut self, identity: ColorSet) -> Self {
        self.color_identity = Some(identity);
        self
    }

    pub fn token(mut self) -> Self {
        self.is_token = true;
        self
    }

    pub fn commander(mut self) -> Self {
        self.is_commander = true;
        self
    }

    pub fn name_ref(&self) -> &str {
        &self.name
    }

    pub fn type_line_ref(&self) -> &TypeLine {
        &self.type_line
    }

    pub fn is_commander_ref(&self) -> bool {
        self.is_commander
    }

    /// Color identity: cost colors plus any mana symbols in the rules text,
    /// unless an explicit identity was supplied.
    pub fn computed_identity(&self) -> ColorSet {
        self.color_identity.unwrap_or_else(|| {
            self.mana_cost
                .colors()
                .union(ManaCost::parse(&self.oracle_text).colors())
        })
    }

    pub fn build(self) -> Card {
        let owner = self.owner.unwrap_or(PlayerId(0));
        let color_identity = self.computed_identity();
        Card {
            id: self.id.unwrap_or(ObjectId(0)),
            card_id: self.card_id,
            abilities: parse_abilities(&self.oracle_text),
            name: self.name,
            type_line: self.type_line,
            mana_cost: self.mana_cost,
            oracle_text: self.oracle_text,
            power_toughness: self.power_toughness,
            loyalty: self.loyalty,
            owner,
            controller: owner,
            color_identity,
            is_token: self.is_token,
            is_commander: self.is_commander,
        }
    }
}
