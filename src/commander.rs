//! Commander-format bookkeeping: tax from repeated casts and combat damage
//! dealt by each commander.

use std::collections::HashMap;

use crate::ids::{ObjectId, PlayerId};

/// One per player; tracks that player's commanders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommanderTracker {
    /// Casts from the command zone, per commander.
    casts: HashMap<ObjectId, u32>,
    /// Combat damage keyed by (defending player, commander owner, commander).
    damage: HashMap<(PlayerId, PlayerId, ObjectId), u32>,
}

impl CommanderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn casts(&self, commander: ObjectId) -> u32 {
        self.casts.get(&commander).copied().unwrap_or(0)
    }

    /// Extra generic mana owed for the next cast.
    pub fn tax_for(&self, commander: ObjectId, step: u32) -> u32 {
        self.casts(commander) * step
    }

    pub fn note_cast(&mut self, commander: ObjectId) {
        *self.casts.entry(commander).or_insert(0) += 1;
    }

    /// Records combat damage and returns the running total for that commander.
    pub fn add_damage(
        &mut self,
        defender: PlayerId,
        owner: PlayerId,
        commander: ObjectId,
        amount: u32,
    ) -> u32 {
        let total = self.damage.entry((defender, owner, commander)).or_insert(0);
        *total += amount;
        *total
    }

    pub fn damage_from(&self, defender: PlayerId, owner: PlayerId, commander: ObjectId) -> u32 {
        self.damage
            .get(&(defender, owner, commander))
            .copied()
            .unwrap_or(0)
    }

    /// True if `defender` took at least `threshold` from any single commander.
    pub fn lethal_for(&self, defender: PlayerId, threshold: u32) -> bool {
        self.damage
            .iter()
            .any(|((d, _, _), amount)| *d == defender && *amount >= threshold)
    }
}
