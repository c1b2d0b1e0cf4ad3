//! Trigger system.
//!
//! Each trigger kind implements the `TriggerMatcher` trait. Parsed
//! [`TriggeredAbility`] values are turned into a [`Trigger`] when their source
//! enters the battlefield.
//!
//! ```text
//! triggers/
//!   mod.rs            - This file, Trigger wrapper
//!   matcher_trait.rs  - TriggerMatcher trait and TriggerContext
//!   trigger_event.rs  - TriggerEvent
//!   check.rs          - listener matching and the FIFO TriggerQueue
//!   zone_changes.rs   - ETB and dies triggers
//!   combat.rs         - attack triggers
//!   phase_step.rs     - upkeep triggers
//! ```

pub mod check;
pub mod combat;
pub mod matcher_trait;
pub mod phase_step;
pub mod trigger_event;
pub mod zone_changes;

pub use check::{TriggerListener, TriggerQueue, TriggeredAbilityEntry, check_triggers};
pub use matcher_trait::{TriggerContext, TriggerMatcher};
pub use trigger_event::TriggerEvent;

use crate::ability::{TriggerCategory, TriggeredAbility};

use combat::AttacksTrigger;
use phase_step::BeginningOfUpkeepTrigger;
use zone_changes::{CreatureEntersUnderYourControlTrigger, DiesTrigger, EntersBattlefieldTrigger};

/// A boxed trigger matcher.
#[derive(Debug, Clone)]
pub struct Trigger(pub Box<dyn TriggerMatcher>);

impl Trigger {
    pub fn new(matcher: impl TriggerMatcher + 'static) -> Self {
        Self(Box::new(matcher))
    }

    /// Picks the matcher for a parsed triggered ability.
    pub fn for_ability(ability: &TriggeredAbility) -> Self {
        let lower = ability.raw_text.to_ascii_lowercase();
        let you_control = lower.contains("you control");
        let about_a_creature = lower.starts_with("whenever a creature")
            || lower.starts_with("whenever another creature");

        match ability.category {
            TriggerCategory::EntersBattlefield if ability.excludes_source() || about_a_creature => {
                Trigger::new(EntersBattlefieldTrigger::another_creature(you_control))
            }
            TriggerCategory::EntersBattlefield => Trigger::new(EntersBattlefieldTrigger::this()),
            TriggerCategory::CreatureEntersUnderYourControl => {
                Trigger::new(CreatureEntersUnderYourControlTrigger {
                    excludes_source: ability.excludes_source(),
                })
            }
            TriggerCategory::Attacks => Trigger::new(AttacksTrigger {
                any_you_control: about_a_creature && you_control,
            }),
            TriggerCategory::Dies if ability.excludes_source() || about_a_creature => {
                Trigger::new(DiesTrigger::another_creature(you_control))
            }
            TriggerCategory::Dies => Trigger::new(DiesTrigger::this()),
            TriggerCategory::BeginningOfUpkeep => Trigger::new(BeginningOfUpkeepTrigger {
                each_player: ability.any_player_upkeep(),
            }),
        }
    }

    pub fn matches(&self, event: &TriggerEvent, ctx: &TriggerContext) -> bool {
        self.0.matches(event, ctx)
    }

    pub fn display(&self) -> String {
        self.0.display()
    }
}
