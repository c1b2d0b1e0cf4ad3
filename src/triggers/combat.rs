//! "Whenever this creature attacks" triggers.

use crate::triggers::TriggerEvent;
use crate::triggers::matcher_trait::{TriggerContext, TriggerMatcher};

/// Fires when the source attacks, or with `any_you_control` when any
/// creature its controller controls attacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttacksTrigger {
    pub any_you_control: bool,
}

impl AttacksTrigger {
    pub fn this() -> Self {
        Self {
            any_you_control: false,
        }
    }
}

impl TriggerMatcher for AttacksTrigger {
    fn matches(&self, event: &TriggerEvent, ctx: &TriggerContext) -> bool {
        let TriggerEvent::Attacks {
            attacker,
            controller,
            ..
        } = *event
        else {
            return false;
        };
        if self.any_you_control {
            controller == ctx.controller
        } else {
            attacker == ctx.source_id
        }
    }

    fn display(&self) -> String {
        if self.any_you_control {
            "Whenever a creature you control attacks".to_string()
        } else {
            "Whenever this creature attacks".to_string()
        }
    }

    fn clone_box(&self) -> Box<dyn TriggerMatcher> {
        Box::new(self.clone())
    }
}
