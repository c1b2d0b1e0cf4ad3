/// Match configuration and tunable rules parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct GameConfig {
    pub starting_life: i32,
    pub opening_hand_size: usize,
    pub lands_per_turn: u32,
    /// Triggers resolved per drain before the rest wait for the next one.
    pub trigger_drain_limit: usize,
    /// Events delivered per bus drain.
    pub event_drain_limit: usize,
    /// Combat damage from a single commander that loses the game.
    pub commander_damage_threshold: u32,
    /// Generic mana added per previous cast from the command zone.
    pub commander_tax_step: u32,
    pub poison_threshold: u32,
    /// Safety bound on the state-based action loop.
    pub max_sba_passes: usize,
    /// Library shuffle seed.
    pub seed: u64,
}

impl GameConfig {
    pub const DEFAULT_STARTING_LIFE: i32 = 40;
    pub const DEFAULT_OPENING_HAND_SIZE: usize = 7;
    pub const DEFAULT_LANDS_PER_TURN: u32 = 1;
    pub const DEFAULT_TRIGGER_DRAIN_LIMIT: usize = 16;
    pub const DEFAULT_EVENT_DRAIN_LIMIT: usize = 256;
    pub const DEFAULT_COMMANDER_DAMAGE_THRESHOLD: u32 = 21;
    pub const DEFAULT_COMMANDER_TAX_STEP: u32 = 2;
    pub const DEFAULT_POISON_THRESHOLD: u32 = 10;
    pub const DEFAULT_MAX_SBA_PASSES: usize = 64;

    pub fn new() -> Self {
        Self {
            starting_life: Self::DEFAULT_STARTING_LIFE,
            opening_hand_size: Self::DEFAULT_OPENING_HAND_SIZE,
            lands_per_turn: Self::DEFAULT_LANDS_PER_TURN,
            trigger_drain_limit: Self::DEFAULT_TRIGGER_DRAIN_LIMIT,
            event_drain_limit: Self::DEFAULT_EVENT_DRAIN_LIMIT,
            commander_damage_threshold: Self::DEFAULT_COMMANDER_DAMAGE_THRESHOLD,
            commander_tax_step: Self::DEFAULT_COMMANDER_TAX_STEP,
            poison_threshold: Self::DEFAULT_POISON_THRESHOLD,
            max_sba_passes: Self::DEFAULT_MAX_SBA_PASSES,
            seed: 0,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::new()
        }
    }

    /// Loads overrides from JSON; fields left out keep their defaults.
    #[cfg(feature = "serialization")]
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commander_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.starting_life, 40);
        assert_eq!(config.commander_damage_threshold, 21);
        assert_eq!(config.commander_tax_step, 2);
        assert_eq!(config.trigger_drain_limit, 16);
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(r#"{"starting_life": 20, "seed": 7}"#).unwrap();
        assert_eq!(config.starting_life, 20);
        assert_eq!(config.seed, 7);
        assert_eq!(config.opening_hand_size, 7);
    }
}
