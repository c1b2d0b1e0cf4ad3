//! The stack: spells and abilities waiting to resolve, strictly LIFO.

use crate::ability::TargetHint;
use crate::card::Card;
use crate::game_state::Target;
use crate::ids::{ObjectId, PlayerId};

/// One concrete ability bound to its source and controller.
///
/// The parsed [`Ability`](crate::ability::Ability) is the shared definition;
/// an instance carries the choices made for this particular use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityInstance {
    pub source: ObjectId,
    pub source_name: String,
    pub controller: PlayerId,
    /// Index into the source card's ability list.
    pub ability_index: usize,
    pub effect_text: String,
    pub target_hint: Option<TargetHint>,
    pub targets: Vec<Target>,
    pub x_value: u32,
    pub resolved: bool,
}

impl AbilityInstance {
    pub fn new(
        source: ObjectId,
        source_name: impl Into<String>,
        controller: PlayerId,
        ability_index: usize,
        effect_text: impl Into<String>,
    ) -> Self {
        Self {
            source,
            source_name: source_name.into(),
            controller,
            ability_index,
            effect_text: effect_text.into(),
            target_hint: None,
            targets: Vec::new(),
            x_value: 0,
            resolved: false,
        }
    }

    pub fn with_targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_target_hint(mut self, hint: Option<TargetHint>) -> Self {
        self.target_hint = hint;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StackPayload {
    /// A spell; the card itself lives here while on the stack.
    Spell {
        card: Card,
        targets: Vec<Target>,
        x_value: u32,
    },
    Ability(AbilityInstance),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackItem {
    pub controller: PlayerId,
    pub payload: StackPayload,
}

impl StackItem {
    pub fn spell(controller: PlayerId, card: Card, targets: Vec<Target>, x_value: u32) -> Self {
        Self {
            controller,
            payload: StackPayload::Spell {
                card,
                targets,
                x_value,
            },
        }
    }

    pub fn ability(instance: AbilityInstance) -> Self {
        Self {
            controller: instance.controller,
            payload: StackPayload::Ability(instance),
        }
    }

    /// The spell card, or the ability's source.
    pub fn source(&self) -> ObjectId {
        match &self.payload {
            StackPayload::Spell { card, .. } => card.id,
            StackPayload::Ability(instance) => instance.source,
        }
    }

    pub fn describe(&self) -> String {
        match &self.payload {
            StackPayload::Spell { card, .. } => card.name.clone(),
            StackPayload::Ability(instance) => {
                format!("{} ability of {}", instance.ability_index, instance.source_name)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stack {
    items: Vec<StackItem>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: StackItem) {
        self.items.push(item);
    }

    /// Removes the most recently pushed item.
    pub fn pop(&mut self) -> Option<StackItem> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&StackItem> {
        self.items.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut StackItem> {
        self.items.last_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &StackItem> {
        self.items.iter()
    }

    pub fn contains_card(&self, id: ObjectId) -> bool {
        self.items.iter().any(|item| {
            matches!(&item.payload, StackPayload::Spell { card, .. } if card.id == id)
        })
    }

    /// Takes a spell's card off the stack wherever it sits (countering, moving).
    pub fn remove_spell(&mut self, id: ObjectId) -> Option<Card> {
        let index = self.items.iter().position(|item| {
            matches!(&item.payload, StackPayload::Spell { card, .. } if card.id == id)
        })?;
        match self.items.remove(index).payload {
            StackPayload::Spell { card, .. } => Some(card),
            StackPayload::Ability(_) => None,
        }
    }

    pub fn card(&self, id: ObjectId) -> Option<&Card> {
        self.items.iter().find_map(|item| match &item.payload {
            StackPayload::Spell { card, .. } if card.id == id => Some(card),
            _ => None,
        })
    }
}
