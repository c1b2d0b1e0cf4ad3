//! Combat state management.
//!
//! This module handles the three combat states:
//! - Attacker toggles (active player, declare-attackers step)
//! - Blocker toggles (defending players, declare-blockers step)
//! - Simultaneous combat damage, including trample, deathtouch, menace,
//!   lifelink and commander damage
//!
//! First strike and double strike are parsed as keywords but damage is
//! always dealt in a single step.

use std::collections::HashMap;

use thiserror::Error;

use crate::ability::Keyword;
use crate::events::GameEvent;
use crate::game_state::{GameState, Step};
use crate::ids::{ObjectId, PlayerId};

/// Combat state tracking.
#[derive(Debug, Clone, Default)]
pub struct CombatState {
    /// Declared attackers in declaration order.
    pub attackers: Vec<AttackerInfo>,
    /// Mapping from attacker to its blockers, in damage assignment order.
    ///
    /// An attacker whose blockers all left combat keeps its (empty) entry:
    /// it stays blocked.
    pub blockers: HashMap<ObjectId, Vec<ObjectId>>,
    /// Blockers declared per attacker. Creatures leaving combat don't lower it.
    pub declared_blockers: HashMap<ObjectId, usize>,
    /// Set once attackers have been tapped and announced.
    pub attackers_committed: bool,
}

/// Information about an attacking creature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackerInfo {
    pub creature: ObjectId,
    /// The player being attacked.
    pub defender: PlayerId,
}

/// Errors that can occur during combat declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("{action} is only legal during the {expected:?} step")]
    WrongStep { action: &'static str, expected: Step },

    #[error("only the active player may declare attackers")]
    NotAttackingPlayer(PlayerId),

    #[error("the active player cannot declare blockers")]
    ActivePlayerCannotBlock(PlayerId),

    #[error("attackers have already been declared")]
    AttackersAlreadyDeclared,

    #[error("creature {0} is not on the battlefield")]
    NotOnBattlefield(ObjectId),

    #[error("{0} is not a creature")]
    NotACreature(ObjectId),

    #[error("{creature} is not controlled by {expected}")]
    NotControlledBy {
        creature: ObjectId,
        expected: PlayerId,
    },

    #[error("creature {0} is tapped")]
    CreatureTapped(ObjectId),

    #[error("creature {0} has summoning sickness")]
    SummoningSick(ObjectId),

    #[error("creature {0} cannot attack")]
    CreatureCannotAttack(ObjectId),

    #[error("creature {blocker} cannot block {attacker}")]
    CreatureCannotBlock {
        blocker: ObjectId,
        attacker: ObjectId,
    },

    #[error("creature {0} is not attacking")]
    NotAttacking(ObjectId),

    #[error("{attacker} is not attacking {player}")]
    NotAttackingYou { attacker: ObjectId, player: PlayerId },

    #[error("no opponent left to attack")]
    NoDefendingPlayer,
}

/// Where a point of combat damage lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageRecipient {
    Permanent(ObjectId),
    Player(PlayerId),
}

/// One assignment of combat damage, computed before any is dealt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatDamage {
    pub source: ObjectId,
    pub recipient: DamageRecipient,
    pub amount: u32,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a creature from combat entirely (it left the battlefield or
    /// changed controller).
    pub fn remove_creature(&mut self, creature: ObjectId) {
        self.attackers.retain(|info| info.creature != creature);
        self.blockers.remove(&creature);
        self.declared_blockers.remove(&creature);
        for blockers in self.blockers.values_mut() {
            blockers.retain(|blocker| *blocker != creature);
        }
    }

    pub fn clear(&mut self) {
        self.attackers.clear();
        self.blockers.clear();
        self.declared_blockers.clear();
        self.attackers_committed = false;
    }
}

/// Creates a new, empty combat state.
pub fn new_combat() -> CombatState {
    CombatState::default()
}

/// Clears all combat state at end of combat.
pub fn end_combat(combat: &mut CombatState) {
    combat.clear();
}

/// Toggles a creature in or out of the attacker set.
///
/// Declaring the same creature twice leaves the set as it was. The
/// defending player is the next player in turn order still in the game.
pub fn toggle_attacker(
    game: &mut GameState,
    player: PlayerId,
    creature: ObjectId,
) -> Result<bool, CombatError> {
    if game.turn.step != Some(Step::DeclareAttackers) {
        return Err(CombatError::WrongStep {
            action: "declaring attackers",
            expected: Step::DeclareAttackers,
        });
    }
    if player != game.turn.active_player {
        return Err(CombatError::NotAttackingPlayer(player));
    }
    if game.combat.attackers_committed {
        return Err(CombatError::AttackersAlreadyDeclared);
    }

    if is_attacking(&game.combat, creature) {
        game.combat.attackers.retain(|info| info.creature != creature);
        tracing::debug!(%creature, "attacker removed");
        return Ok(false);
    }

    let permanent = game
        .permanent(creature)
        .ok_or(CombatError::NotOnBattlefield(creature))?;
    if permanent.controller() != player {
        return Err(CombatError::NotControlledBy {
            creature,
            expected: player,
        });
    }
    if !permanent.is_creature() {
        return Err(CombatError::NotACreature(creature));
    }
    if permanent.tapped {
        return Err(CombatError::CreatureTapped(creature));
    }
    if permanent.is_sick() {
        return Err(CombatError::SummoningSick(creature));
    }
    if !permanent.can_attack() {
        return Err(CombatError::CreatureCannotAttack(creature));
    }

    let defender = game
        .next_player_in_game(player)
        .filter(|defender| *defender != player)
        .ok_or(CombatError::NoDefendingPlayer)?;
    game.combat.attackers.push(AttackerInfo { creature, defender });
    tracing::debug!(%creature, %defender, "attacker declared");
    Ok(true)
}

/// Taps attackers without vigilance and announces each attack.
///
/// Idempotent: only the first call in a combat has any effect.
pub fn commit_attackers(game: &mut GameState) {
    if game.combat.attackers_committed {
        return;
    }
    game.combat.attackers_committed = true;

    let attackers = game.combat.attackers.clone();
    for info in attackers {
        let Some(permanent) = game.permanent_mut(info.creature) else {
            continue;
        };
        if !permanent.has_keyword(Keyword::Vigilance) {
            permanent.tap();
        }
        let controller = permanent.controller();
        game.push_event(GameEvent::AttackDeclared {
            attacker: info.creature,
            controller,
            defender: info.defender,
        });
    }
}

/// Toggles `blocker` onto `attacker`.
///
/// A blocker blocks at most one attacker: assigning it again moves it, and
/// assigning it to the attacker it already blocks removes it.
pub fn toggle_blocker(
    game: &mut GameState,
    player: PlayerId,
    blocker: ObjectId,
    attacker: ObjectId,
) -> Result<bool, CombatError> {
    if game.turn.step != Some(Step::DeclareBlockers) {
        return Err(CombatError::WrongStep {
            action: "declaring blockers",
            expected: Step::DeclareBlockers,
        });
    }
    if player == game.turn.active_player {
        return Err(CombatError::ActivePlayerCannotBlock(player));
    }

    let defender = get_attack_target(&game.combat, attacker).ok_or(CombatError::NotAttacking(attacker))?;
    if defender != player {
        return Err(CombatError::NotAttackingYou { attacker, player });
    }

    if get_blockers(&game.combat, attacker).contains(&blocker) {
        remove_blocker(&mut game.combat, blocker);
        tracing::debug!(%blocker, %attacker, "blocker removed");
        return Ok(false);
    }

    let blocking = game
        .permanent(blocker)
        .ok_or(CombatError::NotOnBattlefield(blocker))?;
    if blocking.controller() != player {
        return Err(CombatError::NotControlledBy {
            creature: blocker,
            expected: player,
        });
    }
    if !blocking.is_creature() {
        return Err(CombatError::NotACreature(blocker));
    }
    if blocking.tapped {
        return Err(CombatError::CreatureTapped(blocker));
    }
    let attacking = game
        .permanent(attacker)
        .ok_or(CombatError::NotOnBattlefield(attacker))?;
    if attacking.has_keyword(Keyword::Flying)
        && !blocking.has_keyword(Keyword::Flying)
        && !blocking.has_keyword(Keyword::Reach)
    {
        return Err(CombatError::CreatureCannotBlock { blocker, attacker });
    }

    remove_blocker(&mut game.combat, blocker);
    game.combat.blockers.entry(attacker).or_default().push(blocker);
    record_declared_blocks(&mut game.combat);
    tracing::debug!(%blocker, %attacker, "blocker declared");
    Ok(true)
}

fn remove_blocker(combat: &mut CombatState, blocker: ObjectId) {
    for blockers in combat.blockers.values_mut() {
        blockers.retain(|b| *b != blocker);
    }
    combat.blockers.retain(|_, blockers| !blockers.is_empty());
    record_declared_blocks(combat);
}

fn record_declared_blocks(combat: &mut CombatState) {
    combat.declared_blockers = combat
        .blockers
        .iter()
        .map(|(attacker, blockers)| (*attacker, blockers.len()))
        .collect();
}

/// Computes every combat damage assignment from the current state.
///
/// Nothing is dealt here; see [`deal_combat_damage`].
pub fn assign_combat_damage(game: &GameState) -> Vec<CombatDamage> {
    let mut assignments = Vec::new();

    for info in &game.combat.attackers {
        let Some(attacker) = game.permanent(info.creature) else {
            continue;
        };
        let power = attacker.power().max(0) as u32;
        let trample = attacker.has_keyword(Keyword::Trample);
        let deathtouch = attacker.has_keyword(Keyword::Deathtouch);
        let blocked = is_blocked(&game.combat, info.creature);
        let declared = game
            .combat
            .declared_blockers
            .get(&info.creature)
            .copied()
            .unwrap_or(0);
        let menace_evaded = attacker.has_keyword(Keyword::Menace) && declared < 2;
        let blockers: Vec<_> = get_blockers(&game.combat, info.creature)
            .iter()
            .filter_map(|id| game.permanent(*id))
            .collect();
        let to_player = |amount| CombatDamage {
            source: info.creature,
            recipient: DamageRecipient::Player(info.defender),
            amount,
        };

        if !blocked || menace_evaded {
            if power > 0 {
                assignments.push(to_player(power));
            }
            continue;
        }

        if blockers.is_empty() {
            if trample && power > 0 {
                assignments.push(to_player(power));
            }
            continue;
        }

        let mut remaining = power;
        let mut to_blockers: Vec<(ObjectId, u32)> = Vec::with_capacity(blockers.len());
        for blocker in &blockers {
            let lethal = blocker.lethal_damage_remaining(deathtouch);
            let assigned = remaining.min(lethal);
            remaining -= assigned;
            to_blockers.push((blocker.id(), assigned));
        }
        if remaining > 0 {
            if trample {
                assignments.push(to_player(remaining));
            } else if let Some(first) = to_blockers.first_mut() {
                first.1 += remaining;
            }
        }
        assignments.extend(
            to_blockers
                .into_iter()
                .filter(|(_, amount)| *amount > 0)
                .map(|(blocker, amount)| CombatDamage {
                    source: info.creature,
                    recipient: DamageRecipient::Permanent(blocker),
                    amount,
                }),
        );

        for blocker in &blockers {
            let amount = blocker.power().max(0) as u32;
            if amount > 0 {
                assignments.push(CombatDamage {
                    source: blocker.id(),
                    recipient: DamageRecipient::Permanent(info.creature),
                    amount,
                });
            }
        }
    }

    assignments
}

/// Deals all combat damage simultaneously.
///
/// Creatures with lethal damage are left for the state-based actions to
/// destroy.
pub fn deal_combat_damage(game: &mut GameState) -> Vec<CombatDamage> {
    let assignments = assign_combat_damage(game);

    for damage in &assignments {
        let Some(source) = game.permanent(damage.source) else {
            continue;
        };
        let controller = source.controller();
        let lifelink = source.has_keyword(Keyword::Lifelink);
        let deathtouch = source.has_keyword(Keyword::Deathtouch);
        let commander = source.card.is_commander.then(|| source.owner());

        match damage.recipient {
            DamageRecipient::Permanent(target) => {
                if let Some(permanent) = game.permanent_mut(target) {
                    permanent.mark_damage(damage.amount, deathtouch);
                }
            }
            DamageRecipient::Player(defender) => {
                game.lose_life(defender, damage.amount);
                if let Some(owner) = commander
                    && let Some(player) = game.player_mut(defender)
                {
                    let total =
                        player
                            .commander
                            .add_damage(defender, owner, damage.source, damage.amount);
                    tracing::debug!(%defender, commander = %damage.source, total, "commander damage");
                }
            }
        }

        if lifelink {
            game.gain_life(controller, damage.amount);
        }
    }

    assignments
}

/// Returns true if the creature is currently attacking.
pub fn is_attacking(combat: &CombatState, creature: ObjectId) -> bool {
    combat.attackers.iter().any(|info| info.creature == creature)
}

/// Returns true if the creature is currently blocking.
pub fn is_blocking(combat: &CombatState, creature: ObjectId) -> bool {
    combat
        .blockers
        .values()
        .any(|blockers| blockers.contains(&creature))
}

/// Gets the blockers assigned to an attacker.
pub fn get_blockers(combat: &CombatState, attacker: ObjectId) -> &[ObjectId] {
    combat
        .blockers
        .get(&attacker)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Returns true if the attacker was blocked, even if its blockers are gone.
pub fn is_blocked(combat: &CombatState, attacker: ObjectId) -> bool {
    combat.blockers.contains_key(&attacker)
}

pub fn get_attack_target(combat: &CombatState, attacker: ObjectId) -> Option<PlayerId> {
    combat
        .attackers
        .iter()
        .find(|info| info.creature == attacker)
        .map(|info| info.defender)
}

/// Players being attacked, without duplicates.
pub fn defending_players(combat: &CombatState) -> Vec<PlayerId> {
    let mut players: Vec<PlayerId> = Vec::new();
    for info in &combat.attackers {
        if !players.contains(&info.defender) {
            players.push(info.defender);
        }
    }
    players
}
