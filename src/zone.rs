use crate::card::Card;
use crate::ids::{ObjectId, PlayerId};
use crate::permanent::Permanent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Zone {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Stack,
    Exile,
    Command,
}

impl Zone {
    /// Returns true if objects in this zone are public (visible to all players).
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Zone::Battlefield | Zone::Graveyard | Zone::Stack | Zone::Exile | Zone::Command
        )
    }

    /// Returns true if cards in this zone are ordered (order matters).
    pub fn is_ordered(&self) -> bool {
        matches!(self, Zone::Library | Zone::Stack)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Zone::Library => "library",
            Zone::Hand => "hand",
            Zone::Battlefield => "battlefield",
            Zone::Graveyard => "graveyard",
            Zone::Stack => "stack",
            Zone::Exile => "exile",
            Zone::Command => "command",
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an object currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// Player whose container holds the object (the controller for the battlefield).
    pub player: PlayerId,
    pub zone: Zone,
}

/// A borrowed view of an object in some zone.
///
/// The battlefield holds [`Permanent`]s, every other zone holds bare [`Card`]s;
/// this is the one place callers branch on which of the two they got.
#[derive(Debug, Clone, Copy)]
pub enum ZoneObject<'a> {
    Card(&'a Card),
    Permanent(&'a Permanent),
}

impl<'a> ZoneObject<'a> {
    /// The underlying card, wrapped or not.
    pub fn card(&self) -> &'a Card {
        match self {
            ZoneObject::Card(card) => card,
            ZoneObject::Permanent(permanent) => &permanent.card,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.card().id
    }

    pub fn as_permanent(&self) -> Option<&'a Permanent> {
        match self {
            ZoneObject::Permanent(permanent) => Some(permanent),
            ZoneObject::Card(_) => None,
        }
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, ZoneObject::Permanent(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardBuilder;
    use crate::types::CardType;

    #[test]
    fn test_zone_visibility_and_order() {
        assert!(Zone::Battlefield.is_public());
        assert!(Zone::Command.is_public());
        assert!(!Zone::Hand.is_public());
        assert!(Zone::Library.is_ordered());
        assert!(!Zone::Graveyard.is_ordered());
    }

    #[test]
    fn test_zone_object_unwraps_card() {
        let card = CardBuilder::new("Grizzly Bears")
            .id(ObjectId(7))
            .card_types(vec![CardType::Creature])
            .power_toughness(2, 2)
            .build();
        let permanent = Permanent::new(card.clone(), 1);

        let raw = ZoneObject::Card(&card);
        let wrapped = ZoneObject::Permanent(&permanent);

        assert_eq!(raw.id(), wrapped.id());
        assert!(!raw.is_permanent());
        assert!(wrapped.as_permanent().is_some());
        assert_eq!(wrapped.card().name, "Grizzly Bears");
    }
}
