use crate::card::Card;
use crate::commander::CommanderTracker;
use crate::ids::{ObjectId, PlayerId};
use crate::mana::ManaPool;
use crate::permanent::Permanent;
use crate::zone::Zone;

/// Complete player state.
///
/// Each zone is a container owned by the player; the battlefield container
/// holds the permanents this player currently controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,

    // Life and resources
    pub life: i32,
    pub mana_pool: ManaPool,
    pub poison_counters: u32,

    // Per-turn tracking
    pub lands_played_this_turn: u32,
    pub land_plays_allowed: u32,

    // Game status
    pub has_lost: bool,
    /// Set when a draw was attempted with an empty library.
    pub drew_from_empty_library: bool,

    // Zones; the top of the library is the end of the vector.
    pub library: Vec<Card>,
    pub hand: Vec<Card>,
    pub graveyard: Vec<Card>,
    pub exile: Vec<Card>,
    pub command: Vec<Card>,
    pub battlefield: Vec<Permanent>,

    pub commander: CommanderTracker,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, starting_life: i32) -> Self {
        Self {
            id,
            name: name.into(),
            life: starting_life,
            mana_pool: ManaPool::new(),
            poison_counters: 0,
            lands_played_this_turn: 0,
            land_plays_allowed: 1,
            has_lost: false,
            drew_from_empty_library: false,
            library: Vec::new(),
            hand: Vec::new(),
            graveyard: Vec::new(),
            exile: Vec::new(),
            command: Vec::new(),
            battlefield: Vec::new(),
            commander: CommanderTracker::new(),
        }
    }

    /// Returns true if this player can play a land this turn.
    pub fn can_play_land(&self) -> bool {
        self.lands_played_this_turn < self.land_plays_allowed
    }

    pub fn record_land_play(&mut self) {
        self.lands_played_this_turn += 1;
    }

    /// Called at the beginning of this player's turn.
    pub fn begin_turn(&mut self) {
        self.lands_played_this_turn = 0;
    }

    pub fn is_in_game(&self) -> bool {
        !self.has_lost
    }

    pub fn has_lethal_life(&self) -> bool {
        self.life <= 0
    }

    pub fn has_lethal_poison(&self, threshold: u32) -> bool {
        self.poison_counters >= threshold
    }

    pub fn hand_size(&self) -> usize {
        self.hand.len()
    }

    pub fn library_size(&self) -> usize {
        self.library.len()
    }

    /// The card container for a non-battlefield zone.
    ///
    /// The battlefield holds permanents and the stack is shared, so both
    /// return `None`.
    pub fn cards(&self, zone: Zone) -> Option<&Vec<Card>> {
        match zone {
            Zone::Library => Some(&self.library),
            Zone::Hand => Some(&self.hand),
            Zone::Graveyard => Some(&self.graveyard),
            Zone::Exile => Some(&self.exile),
            Zone::Command => Some(&self.command),
            Zone::Battlefield | Zone::Stack => None,
        }
    }

    pub fn cards_mut(&mut self, zone: Zone) -> Option<&mut Vec<Card>> {
        match zone {
            Zone::Library => Some(&mut self.library),
            Zone::Hand => Some(&mut self.hand),
            Zone::Graveyard => Some(&mut self.graveyard),
            Zone::Exile => Some(&mut self.exile),
            Zone::Command => Some(&mut self.command),
            Zone::Battlefield | Zone::Stack => None,
        }
    }

    /// Zone of a card held by this player, if any.
    pub fn zone_of(&self, id: ObjectId) -> Option<Zone> {
        if self.battlefield.iter().any(|p| p.id() == id) {
            return Some(Zone::Battlefield);
        }
        [
            Zone::Hand,
            Zone::Library,
            Zone::Graveyard,
            Zone::Exile,
            Zone::Command,
        ]
        .into_iter()
        .find(|zone| {
            self.cards(*zone)
                .is_some_and(|cards| cards.iter().any(|c| c.id == id))
        })
    }

    pub fn permanent(&self, id: ObjectId) -> Option<&Permanent> {
        self.battlefield.iter().find(|p| p.id() == id)
    }

    pub fn permanent_mut(&mut self, id: ObjectId) -> Option<&mut Permanent> {
        self.battlefield.iter_mut().find(|p| p.id() == id)
    }

    pub fn card_in(&self, zone: Zone, id: ObjectId) -> Option<&Card> {
        self.cards(zone)?.iter().find(|c| c.id == id)
    }

    /// Removes a card from a non-battlefield zone.
    pub fn take_card(&mut self, zone: Zone, id: ObjectId) -> Option<Card> {
        let cards = self.cards_mut(zone)?;
        let index = cards.iter().position(|c| c.id == id)?;
        Some(cards.remove(index))
    }

    pub fn take_permanent(&mut self, id: ObjectId) -> Option<Permanent> {
        let index = self.battlefield.iter().position(|p| p.id() == id)?;
        Some(self.battlefield.remove(index))
    }
}
