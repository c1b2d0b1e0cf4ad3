//! Layered continuous effects and the recompute pass that applies them.
//!
//! Effective characteristics are never edited in place by rules code. Each
//! recompute starts from the printed card and re-applies every active effect
//! in layer order, so running it twice with no state change is a no-op.

use crate::ability::Keyword;
use crate::game_state::GameState;
use crate::ids::{ObjectId, PlayerId};
use crate::permanent::Permanent;
use crate::static_ability_processor::generate_continuous_effects_from_static_abilities;
use crate::types::CardType;

/// Interaction layers; lower layers apply first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Copy = 1,
    Control = 2,
    Text = 3,
    Type = 4,
    Color = 5,
    Ability = 6,
    PowerToughness = 7,
}

/// Within layer 7, setting base P/T happens before modifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PtSublayer {
    Set,
    Modify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContinuousEffectId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duration {
    Permanent,
    /// Removed during the cleanup step.
    EndOfTurn,
    /// Removed once the source leaves the battlefield.
    WhileSourceOnBattlefield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTarget {
    Object(ObjectId),
    /// Creatures a player controls, optionally excluding one object.
    CreaturesControlledBy {
        player: PlayerId,
        except: Option<ObjectId>,
    },
    Player(PlayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modification {
    GainControl(PlayerId),
    AddType(CardType),
    RemoveType(CardType),
    AddKeyword(Keyword),
    RemoveKeyword(Keyword),
    SetPowerToughness { power: i32, toughness: i32 },
    ModifyPowerToughness { power: i32, toughness: i32 },
    AdditionalLandPlays(u32),
}

impl Modification {
    pub fn layer(&self) -> Layer {
        match self {
            Modification::GainControl(_) => Layer::Control,
            Modification::AddType(_) | Modification::RemoveType(_) => Layer::Type,
            Modification::AddKeyword(_)
            | Modification::RemoveKeyword(_)
            | Modification::AdditionalLandPlays(_) => Layer::Ability,
            Modification::SetPowerToughness { .. } | Modification::ModifyPowerToughness { .. } => {
                Layer::PowerToughness
            }
        }
    }

    fn sublayer(&self) -> Option<PtSublayer> {
        match self {
            Modification::SetPowerToughness { .. } => Some(PtSublayer::Set),
            Modification::ModifyPowerToughness { .. } => Some(PtSublayer::Modify),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuousEffect {
    pub id: ContinuousEffectId,
    pub source: Option<ObjectId>,
    pub controller: PlayerId,
    pub affected: EffectTarget,
    pub modification: Modification,
    pub duration: Duration,
    pub timestamp: u64,
}

impl ContinuousEffect {
    pub fn new(
        controller: PlayerId,
        affected: EffectTarget,
        modification: Modification,
        duration: Duration,
    ) -> Self {
        Self {
            id: ContinuousEffectId(0),
            source: None,
            controller,
            affected,
            modification,
            duration,
            timestamp: 0,
        }
    }

    pub fn from_source(mut self, source: ObjectId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn layer(&self) -> Layer {
        self.modification.layer()
    }

    fn sort_key(&self) -> (Layer, Option<PtSublayer>, u64) {
        (self.layer(), self.modification.sublayer(), self.timestamp)
    }

    pub fn applies_to(&self, permanent: &Permanent) -> bool {
        match self.affected {
            EffectTarget::Object(id) => permanent.id() == id,
            EffectTarget::CreaturesControlledBy { player, except } => {
                permanent.is_creature()
                    && permanent.controller() == player
                    && except != Some(permanent.id())
            }
            EffectTarget::Player(_) => false,
        }
    }

    fn apply(&self, permanent: &mut Permanent) {
        let effective = &mut permanent.effective;
        match self.modification {
            Modification::AddType(card_type) => {
                if !effective.card_types.contains(&card_type) {
                    effective.card_types.push(card_type);
                }
            }
            Modification::RemoveType(card_type) => {
                effective.card_types.retain(|t| *t != card_type);
            }
            Modification::AddKeyword(keyword) => {
                effective.keywords.insert(keyword);
            }
            Modification::RemoveKeyword(keyword) => {
                effective.keywords.remove(&keyword);
            }
            Modification::SetPowerToughness { power, toughness } => {
                effective.power = Some(power);
                effective.toughness = Some(toughness);
            }
            Modification::ModifyPowerToughness { power, toughness } => {
                effective.power = Some(effective.power.unwrap_or(0) + power);
                effective.toughness = Some(effective.toughness.unwrap_or(0) + toughness);
            }
            // Applied in their own passes.
            Modification::GainControl(_) | Modification::AdditionalLandPlays(_) => {}
        }
    }
}

/// Registered effects from resolved spells and abilities.
///
/// Static abilities are not stored here; they are regenerated from the
/// battlefield on every recompute.
#[derive(Debug, Clone, Default)]
pub struct ContinuousEffectManager {
    effects: Vec<ContinuousEffect>,
    next_id: u64,
}

impl ContinuousEffectManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an effect, stamping it with a fresh id and `timestamp`.
    pub fn add(&mut self, mut effect: ContinuousEffect, timestamp: u64) -> ContinuousEffectId {
        self.next_id += 1;
        effect.id = ContinuousEffectId(self.next_id);
        effect.timestamp = timestamp;
        let id = effect.id;
        self.effects.push(effect);
        id
    }

    pub fn remove(&mut self, id: ContinuousEffectId) -> Option<ContinuousEffect> {
        let index = self.effects.iter().position(|e| e.id == id)?;
        Some(self.effects.remove(index))
    }

    pub fn effects(&self) -> &[ContinuousEffect] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Removes "until end of turn" effects. Returns how many were removed.
    pub fn prune_end_of_turn(&mut self) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| e.duration != Duration::EndOfTurn);
        before - self.effects.len()
    }

    /// Removes source-bound effects whose source is gone.
    pub fn prune_missing_sources(&mut self, on_battlefield: impl Fn(ObjectId) -> bool) {
        self.effects.retain(|e| {
            e.duration != Duration::WhileSourceOnBattlefield
                || e.source.is_some_and(|source| on_battlefield(source))
        });
    }
}

/// Recomputes every permanent's effective characteristics and per-player
/// rule modifiers from scratch.
pub fn recompute(game: &mut GameState) {
    let live: Vec<ObjectId> = game.permanent_ids();
    game.continuous_effects
        .prune_missing_sources(|id| live.contains(&id));

    apply_control_effects(game);

    let mut effects: Vec<ContinuousEffect> = game.continuous_effects.effects().to_vec();
    effects.extend(generate_continuous_effects_from_static_abilities(game));
    effects.sort_by_key(ContinuousEffect::sort_key);

    for permanent in game.permanents_mut() {
        permanent.reset_characteristics();
        for effect in &effects {
            if effect.applies_to(permanent) {
                effect.apply(permanent);
            }
        }
    }

    let base_land_plays = game.config.lands_per_turn;
    for player in &mut game.players {
        let extra: u32 = effects
            .iter()
            .filter_map(|effect| match (effect.affected, effect.modification) {
                (EffectTarget::Player(p), Modification::AdditionalLandPlays(n)) if p == player.id => {
                    Some(n)
                }
                _ => None,
            })
            .sum();
        player.land_plays_allowed = base_land_plays + extra;
    }
}

/// Layer 2: settles who controls each permanent, moving permanents between
/// battlefield containers when control changed.
fn apply_control_effects(game: &mut GameState) {
    let mut control: Vec<&ContinuousEffect> = game
        .continuous_effects
        .effects()
        .iter()
        .filter(|e| matches!(e.modification, Modification::GainControl(_)))
        .collect();
    control.sort_by_key(|e| e.timestamp);

    let mut moves: Vec<(ObjectId, PlayerId)> = Vec::new();
    for permanent in game.permanents() {
        let mut controller = permanent.base_controller;
        for effect in &control {
            if let (EffectTarget::Object(id), Modification::GainControl(new)) =
                (effect.affected, effect.modification)
                && id == permanent.id()
            {
                controller = new;
            }
        }
        if controller != permanent.controller() {
            moves.push((permanent.id(), controller));
        }
    }

    for (id, controller) in moves {
        let Some(from) = game.permanent(id).map(Permanent::controller) else {
            continue;
        };
        if game.player(controller).is_none() {
            continue;
        }
        let Some(mut permanent) = game.player_mut(from).and_then(|p| p.take_permanent(id)) else {
            continue;
        };
        tracing::debug!(card = %permanent.name(), %from, to = %controller, "control changes");
        permanent.card.controller = controller;
        game.combat.remove_creature(id);
        if let Some(player) = game.player_mut(controller) {
            player.battlefield.push(permanent);
        }
    }
}
