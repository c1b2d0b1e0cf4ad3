//! Beginning-of-step triggers.

use crate::triggers::TriggerEvent;
use crate::triggers::matcher_trait::{TriggerContext, TriggerMatcher};

/// "At the beginning of your upkeep" / "At the beginning of each upkeep".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginningOfUpkeepTrigger {
    pub each_player: bool,
}

impl TriggerMatcher for BeginningOfUpkeepTrigger {
    fn matches(&self, event: &TriggerEvent, ctx: &TriggerContext) -> bool {
        match event {
            TriggerEvent::BeginningOfUpkeep { active_player } => {
                self.each_player || *active_player == ctx.controller
            }
            _ => false,
        }
    }

    fn display(&self) -> String {
        if self.each_player {
            "At the beginning of each upkeep".to_string()
        } else {
            "At the beginning of your upkeep".to_string()
        }
    }

    fn clone_box(&self) -> Box<dyn TriggerMatcher> {
        Box::new(self.clone())
    }
}
