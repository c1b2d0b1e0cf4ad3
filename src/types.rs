#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Supertype {
    Basic,
    Legendary,
    Snow,
    World,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CardType {
    Land,
    Creature,
    Artifact,
    Enchantment,
    Planeswalker,
    Instant,
    Sorcery,
    Battle,
    Kindred, // Formerly Tribal
}

impl Supertype {
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "basic" => Some(Supertype::Basic),
            "legendary" => Some(Supertype::Legendary),
            "snow" => Some(Supertype::Snow),
            "world" => Some(Supertype::World),
            _ => None,
        }
    }
}

impl CardType {
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "land" => Some(CardType::Land),
            "creature" => Some(CardType::Creature),
            "artifact" => Some(CardType::Artifact),
            "enchantment" => Some(CardType::Enchantment),
            "planeswalker" => Some(CardType::Planeswalker),
            "instant" => Some(CardType::Instant),
            "sorcery" => Some(CardType::Sorcery),
            "battle" => Some(CardType::Battle),
            "kindred" | "tribal" => Some(CardType::Kindred),
            _ => None,
        }
    }

    /// Permanent card types stay on the battlefield after resolving.
    pub fn is_permanent_type(self) -> bool {
        !matches!(self, CardType::Instant | CardType::Sorcery | CardType::Kindred)
    }
}

/// Parsed type line, e.g. "Legendary Creature — Elf Druid".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeLine {
    pub supertypes: Vec<Supertype>,
    pub card_types: Vec<CardType>,
    /// Subtypes keep their printed spelling ("Elf", "Aura", "Forest").
    pub subtypes: Vec<String>,
}

impl TypeLine {
    /// Parses a printed type line.
    ///
    /// Both the em dash and a plain hyphen separate types from subtypes.
    /// Unknown words left of the separator are ignored.
    pub fn parse(text: &str) -> Self {
        let normalized = text.replace('—', "-");
        let (left, right) = match normalized.split_once(" - ") {
            Some((l, r)) => (l.to_string(), r.to_string()),
            None => match normalized.split_once('-') {
                Some((l, r)) => (l.to_string(), r.to_string()),
                None => (normalized.clone(), String::new()),
            },
        };

        let mut line = TypeLine::default();
        for word in left.split_whitespace() {
            if let Some(supertype) = Supertype::parse(word) {
                line.supertypes.push(supertype);
            } else if let Some(card_type) = CardType::parse(word) {
                line.card_types.push(card_type);
            }
        }
        line.subtypes = right.split_whitespace().map(str::to_string).collect();
        line
    }

    pub fn has_type(&self, card_type: CardType) -> bool {
        self.card_types.contains(&card_type)
    }

    pub fn has_supertype(&self, supertype: Supertype) -> bool {
        self.supertypes.contains(&supertype)
    }

    pub fn has_subtype(&self, subtype: &str) -> bool {
        self.subtypes.iter().any(|s| s.eq_ignore_ascii_case(subtype))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legendary_creature() {
        let line = TypeLine::parse("Legendary Creature — Elf Druid");
        assert!(line.has_supertype(Supertype::Legendary));
        assert!(line.has_type(CardType::Creature));
        assert!(line.has_subtype("elf"));
        assert!(line.has_subtype("Druid"));
    }

    #[test]
    fn test_parse_basic_land_with_hyphen() {
        let line = TypeLine::parse("Basic Land - Forest");
        assert!(line.has_supertype(Supertype::Basic));
        assert!(line.has_type(CardType::Land));
        assert_eq!(line.subtypes, vec!["Forest".to_string()]);
    }

    #[test]
    fn test_parse_artifact_creature_without_subtypes() {
        let line = TypeLine::parse("Artifact Creature");
        assert!(line.has_type(CardType::Artifact));
        assert!(line.has_type(CardType::Creature));
        assert!(line.subtypes.is_empty());
    }

    #[test]
    fn test_permanent_types() {
        assert!(CardType::Enchantment.is_permanent_type());
        assert!(!CardType::Instant.is_permanent_type());
    }
}
