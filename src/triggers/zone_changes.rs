//! Enters-the-battlefield and dies triggers.

use crate::triggers::TriggerEvent;
use crate::triggers::matcher_trait::{TriggerContext, TriggerMatcher};

/// Which objects a zone-change trigger watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watched {
    /// Only the source itself ("When this creature enters").
    This,
    /// Any creature but the source ("Whenever another creature dies").
    AnotherCreature { you_control: bool },
}

/// "When this permanent enters the battlefield" and
/// "Whenever another creature enters the battlefield".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntersBattlefieldTrigger {
    pub watched: Watched,
}

impl EntersBattlefieldTrigger {
    pub fn this() -> Self {
        Self {
            watched: Watched::This,
        }
    }

    pub fn another_creature(you_control: bool) -> Self {
        Self {
            watched: Watched::AnotherCreature { you_control },
        }
    }
}

impl TriggerMatcher for EntersBattlefieldTrigger {
    fn matches(&self, event: &TriggerEvent, ctx: &TriggerContext) -> bool {
        let TriggerEvent::EntersBattlefield {
            object,
            controller,
            is_creature,
        } = *event
        else {
            return false;
        };
        match self.watched {
            Watched::This => object == ctx.source_id,
            Watched::AnotherCreature { you_control } => {
                is_creature
                    && object != ctx.source_id
                    && (!you_control || controller == ctx.controller)
            }
        }
    }

    fn display(&self) -> String {
        match self.watched {
            Watched::This => "When this permanent enters the battlefield".to_string(),
            Watched::AnotherCreature { you_control: true } => {
                "Whenever another creature enters the battlefield under your control".to_string()
            }
            Watched::AnotherCreature { you_control: false } => {
                "Whenever another creature enters the battlefield".to_string()
            }
        }
    }

    fn clone_box(&self) -> Box<dyn TriggerMatcher> {
        Box::new(self.clone())
    }
}

/// "Whenever a creature enters the battlefield under your control".
///
/// Fires for the source too unless the text says "another".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureEntersUnderYourControlTrigger {
    pub excludes_source: bool,
}

impl TriggerMatcher for CreatureEntersUnderYourControlTrigger {
    fn matches(&self, event: &TriggerEvent, ctx: &TriggerContext) -> bool {
        let TriggerEvent::EntersBattlefield {
            object,
            controller,
            is_creature,
        } = *event
        else {
            return false;
        };
        is_creature
            && controller == ctx.controller
            && !(self.excludes_source && object == ctx.source_id)
    }

    fn display(&self) -> String {
        if self.excludes_source {
            "Whenever another creature enters the battlefield under your control".to_string()
        } else {
            "Whenever a creature enters the battlefield under your control".to_string()
        }
    }

    fn clone_box(&self) -> Box<dyn TriggerMatcher> {
        Box::new(self.clone())
    }
}

/// "When this creature dies" and "Whenever another creature dies".
///
/// Matching happens after the source has left the battlefield, against the
/// controller recorded on the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiesTrigger {
    pub watched: Watched,
}

impl DiesTrigger {
    pub fn this() -> Self {
        Self {
            watched: Watched::This,
        }
    }

    pub fn another_creature(you_control: bool) -> Self {
        Self {
            watched: Watched::AnotherCreature { you_control },
        }
    }
}

impl TriggerMatcher for DiesTrigger {
    fn matches(&self, event: &TriggerEvent, ctx: &TriggerContext) -> bool {
        let TriggerEvent::Dies { object, controller } = *event else {
            return false;
        };
        match self.watched {
            Watched::This => object == ctx.source_id,
            Watched::AnotherCreature { you_control } => {
                object != ctx.source_id && (!you_control || controller == ctx.controller)
            }
        }
    }

    fn display(&self) -> String {
        match self.watched {
            Watched::This => "When this creature dies".to_string(),
            Watched::AnotherCreature { you_control: true } => {
                "Whenever another creature you control dies".to_string()
            }
            Watched::AnotherCreature { you_control: false } => {
                "Whenever another creature dies".to_string()
            }
        }
    }

    fn clone_box(&self) -> Box<dyn TriggerMatcher> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game_state::GameState;
    use crate::ids::{ObjectId, PlayerId};

    fn test_game() -> GameState {
        GameState::new(
            GameConfig::default(),
            vec!["Alice".to_string(), "Bob".to_string()],
        )
    }

    fn enters(object: u64, controller: u8, is_creature: bool) -> TriggerEvent {
        TriggerEvent::EntersBattlefield {
            object: ObjectId(object),
            controller: PlayerId(controller),
            is_creature,
        }
    }

    #[test]
    fn test_self_etb_matches_only_source() {
        let game = test_game();
        let ctx = TriggerContext::new(ObjectId(1), PlayerId(0), &game);
        let trigger = EntersBattlefieldTrigger::this();

        assert!(trigger.matches(&enters(1, 0, true), &ctx));
        assert!(!trigger.matches(&enters(2, 0, true), &ctx));
    }

    /// Soul Warden style: another creature entering under anyone's control.
    #[test]
    fn test_another_creature_etb() {
        let game = test_game();
        let ctx = TriggerContext::new(ObjectId(1), PlayerId(0), &game);
        let trigger = EntersBattlefieldTrigger::another_creature(false);

        assert!(trigger.matches(&enters(2, 1, true), &ctx));
        assert!(!trigger.matches(&enters(1, 0, true), &ctx));
        assert!(!trigger.matches(&enters(3, 1, false), &ctx));
    }

    #[test]
    fn test_creature_enters_under_your_control() {
        let game = test_game();
        let ctx = TriggerContext::new(ObjectId(1), PlayerId(0), &game);
        let trigger = CreatureEntersUnderYourControlTrigger {
            excludes_source: true,
        };

        assert!(trigger.matches(&enters(2, 0, true), &ctx));
        assert!(!trigger.matches(&enters(2, 1, true), &ctx));
        assert!(!trigger.matches(&enters(1, 0, true), &ctx));
    }

    #[test]
    fn test_dies_trigger() {
        let game = test_game();
        let ctx = TriggerContext::new(ObjectId(1), PlayerId(0), &game);
        let died = |object| TriggerEvent::Dies {
            object: ObjectId(object),
            controller: PlayerId(0),
        };

        assert!(DiesTrigger::this().matches(&died(1), &ctx));
        assert!(!DiesTrigger::this().matches(&died(2), &ctx));
        assert!(DiesTrigger::another_creature(true).matches(&died(2), &ctx));
        assert!(!DiesTrigger::another_creature(true).matches(&died(1), &ctx));
    }
}
