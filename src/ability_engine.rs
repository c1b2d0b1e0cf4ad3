//! Triggered and activated ability execution.
//!
//! The [`AbilityEngine`] is owned by the match session. It keeps one listener
//! list per [`TriggerCategory`], fed from the triggered abilities of whatever
//! is on the battlefield, and a FIFO [`TriggerQueue`] of abilities that fired
//! and are waiting to resolve.
//!
//! Activated abilities go through [`AbilityEngine::activate`]: costs are
//! checked, an activation that needs a target is parked until
//! [`AbilityEngine::provide_target`], and only then are costs paid, all or
//! nothing. Mana abilities skip the stack.

use std::collections::HashMap;

use crate::ability::{Ability, ActivatedAbility, TargetHint, TriggerCategory};
use crate::effects::resolve_effect_text;
use crate::error::{ActionError, PaymentError};
use crate::events::GameEvent;
use crate::game_state::{GameState, Target};
use crate::ids::{ObjectId, PlayerId};
use crate::mana::{ManaCost, ManaSymbol, Payment, auto_tap_for};
use crate::permanent::Permanent;
use crate::player::Player;
use crate::rules::timing::{Timing, require_timing};
use crate::stack::{AbilityInstance, StackItem};
use crate::triggers::{TriggerEvent, TriggerListener, TriggerQueue, check_triggers};
use crate::zone::Zone;

/// An activation parked until its controller picks a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingActivation {
    pub player: PlayerId,
    pub source: ObjectId,
    pub ability_index: usize,
    pub hint: TargetHint,
}

/// What an activation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// A mana ability resolved immediately.
    ManaAdded(Vec<ManaSymbol>),
    /// Nothing paid yet; call `provide_target`.
    AwaitingTarget(TargetHint),
    /// Costs paid and the ability is on the stack.
    OnStack,
}

#[derive(Debug, Clone, Default)]
pub struct AbilityEngine {
    listeners: HashMap<TriggerCategory, Vec<TriggerListener>>,
    queue: TriggerQueue,
    pending: Option<PendingActivation>,
}

impl AbilityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Triggers
    // ------------------------------------------------------------------

    /// Registers every triggered ability of every permanent. Used when the
    /// engine starts on a state that already has permanents.
    pub fn register_battlefield(&mut self, game: &GameState) {
        for id in game.permanent_ids() {
            self.register_permanent(game, id);
        }
    }

    /// Registers a permanent's triggered abilities, replacing any earlier
    /// registration for the same object.
    pub fn register_permanent(&mut self, game: &GameState, object: ObjectId) {
        self.unregister(object);
        let Some(permanent) = game.permanent(object) else {
            return;
        };
        for (index, ability) in permanent.card.abilities.iter().enumerate() {
            let Ability::Triggered(triggered) = ability else {
                continue;
            };
            let listener = TriggerListener::new(
                object,
                permanent.name(),
                permanent.controller(),
                index,
                triggered.clone(),
            );
            tracing::debug!(
                source = %permanent.name(),
                trigger = %listener.trigger.display(),
                "registered trigger"
            );
            self.listeners
                .entry(triggered.category)
                .or_default()
                .push(listener);
        }
    }

    pub fn unregister(&mut self, source: ObjectId) {
        for listeners in self.listeners.values_mut() {
            listeners.retain(|listener| listener.source != source);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn queue(&self) -> &TriggerQueue {
        &self.queue
    }

    pub fn pending_triggers(&self) -> usize {
        self.queue.len()
    }

    /// Feeds one game event through the listeners.
    ///
    /// A permanent entering is registered before matching so its own
    /// enters-the-battlefield trigger sees the event. A permanent leaving is
    /// unregistered after matching so its own dies trigger still fires.
    pub fn observe(&mut self, game: &mut GameState, event: &GameEvent) {
        if let GameEvent::EnteredBattlefield { object, .. } = event {
            self.register_permanent(game, *object);
        }

        if let Some(trigger_event) = TriggerEvent::from_game_event(event) {
            for category in trigger_event.categories() {
                let Some(listeners) = self.listeners.get(category) else {
                    continue;
                };
                for entry in check_triggers(game, &trigger_event, listeners) {
                    tracing::debug!(
                        source = %entry.source_name,
                        controller = %entry.controller,
                        ?category,
                        "trigger fired"
                    );
                    game.push_event(GameEvent::TriggerFired {
                        source: entry.source,
                        controller: entry.controller,
                        category: *category,
                    });
                    self.queue.add(entry);
                }
            }
        }

        if let GameEvent::LeftBattlefield { object, .. } = event {
            self.unregister(*object);
        }
    }

    /// Resolves queued triggers oldest first, at most `limit` of them.
    ///
    /// A trigger that fails to resolve is logged and dropped. Triggers past
    /// the limit stay queued for the next drain. Returns how many were
    /// taken off the queue.
    pub fn drain(&mut self, game: &mut GameState, limit: usize) -> usize {
        let mut drained = 0;
        while drained < limit {
            let Some(entry) = self.queue.pop() else {
                break;
            };
            drained += 1;

            let hint = TargetHint::infer(&entry.ability.effect_text);
            let instance = entry
                .to_instance()
                .with_target_hint(hint)
                .with_targets(default_targets(game, entry.controller, hint));
            match resolve_effect_text(game, &instance) {
                Ok(effects) => {
                    tracing::debug!(source = %entry.source_name, effects, "trigger resolved");
                }
                Err(err) => {
                    tracing::warn!(source = %entry.source_name, %err, "trigger failed to resolve");
                }
            }
        }
        if !self.queue.is_empty() {
            tracing::warn!(
                remaining = self.queue.len(),
                limit,
                "trigger drain limit reached"
            );
        }
        drained
    }

    // ------------------------------------------------------------------
    // Activated abilities
    // ------------------------------------------------------------------

    pub fn pending_activation(&self) -> Option<PendingActivation> {
        self.pending
    }

    /// Drops a parked activation. Nothing was paid, so nothing is undone.
    pub fn cancel_pending(&mut self) -> Option<PendingActivation> {
        self.pending.take()
    }

    /// Checks timing, tap availability, loyalty and mana affordability
    /// without changing anything.
    pub fn can_activate(
        &self,
        game: &GameState,
        player: PlayerId,
        source: ObjectId,
        index: usize,
    ) -> Result<(), ActionError> {
        let ability = activated_ability(game, player, source, index)?;
        if ability.is_mana_ability() {
            if game.is_game_over() {
                return Err(ActionError::GameOver);
            }
        } else {
            let timing = if ability.sorcery_speed {
                Timing::Sorcery
            } else {
                Timing::Instant
            };
            require_timing(game, player, timing, "activating this ability")?;
        }
        check_costs(game, player, source, ability)?;
        Ok(())
    }

    /// Activates ability `index` of `source`.
    ///
    /// An ability that needs a target and got none is parked and nothing is
    /// paid. Otherwise costs are paid atomically and the ability goes on the
    /// stack, or, for a mana ability, its mana is added right away.
    pub fn activate(
        &mut self,
        game: &mut GameState,
        player: PlayerId,
        source: ObjectId,
        index: usize,
        targets: Vec<Target>,
    ) -> Result<ActivationOutcome, ActionError> {
        if self.pending.is_some() {
            return Err(ActionError::TargetPending);
        }
        self.can_activate(game, player, source, index)?;
        let ability = activated_ability(game, player, source, index)?.clone();

        if ability.is_mana_ability() {
            pay_activation_costs(game, player, source, &ability)?;
            let bundle = ability.mana_output().into_iter().next().unwrap_or_default();
            add_mana(game, player, source, &bundle);
            return Ok(ActivationOutcome::ManaAdded(bundle));
        }

        if let Some(hint) = ability.target_hint {
            if targets.is_empty() {
                tracing::debug!(%source, index, ?hint, "activation waiting for a target");
                self.pending = Some(PendingActivation {
                    player,
                    source,
                    ability_index: index,
                    hint,
                });
                return Ok(ActivationOutcome::AwaitingTarget(hint));
            }
            for target in &targets {
                validate_target(game, player, hint, *target)?;
            }
        }

        pay_activation_costs(game, player, source, &ability)?;
        push_ability(game, player, source, index, &ability, targets);
        Ok(ActivationOutcome::OnStack)
    }

    /// Completes a parked activation with `target`.
    ///
    /// An illegal target keeps the activation parked so another can be
    /// tried. If the activation became illegal meanwhile it is dropped.
    pub fn provide_target(
        &mut self,
        game: &mut GameState,
        player: PlayerId,
        target: Target,
    ) -> Result<ActivationOutcome, ActionError> {
        let pending = self.pending.ok_or(ActionError::NoPendingTarget)?;
        if pending.player != player {
            return Err(ActionError::NoPendingTarget);
        }
        validate_target(game, player, pending.hint, target)?;
        self.pending = None;

        self.can_activate(game, player, pending.source, pending.ability_index)?;
        let ability = activated_ability(game, player, pending.source, pending.ability_index)?.clone();
        pay_activation_costs(game, player, pending.source, &ability)?;
        push_ability(
            game,
            player,
            pending.source,
            pending.ability_index,
            &ability,
            vec![target],
        );
        Ok(ActivationOutcome::OnStack)
    }
}

/// Taps a permanent for one of its mana options: a land's basic type, or a
/// parsed "{T}: Add ..." ability with no other cost.
pub fn tap_for_mana(
    game: &mut GameState,
    player: PlayerId,
    source: ObjectId,
    option: usize,
) -> Result<Vec<ManaSymbol>, ActionError> {
    let permanent = controlled_permanent(game, player, source)?;
    if permanent.tapped {
        return Err(PaymentError::AlreadyTapped(source).into());
    }
    if permanent.is_creature() && permanent.is_sick() {
        return Err(PaymentError::SummoningSick(source).into());
    }
    let bundle = permanent
        .mana_options()
        .into_iter()
        .nth(option)
        .ok_or(ActionError::NoSuchAbility {
            card: source,
            index: option,
        })?;

    if let Some(permanent) = game.permanent_mut(source) {
        permanent.tap();
    }
    add_mana(game, player, source, &bundle);
    Ok(bundle)
}

/// Pays a mana cost for `player`, tapping lands as needed.
///
/// Either the whole cost is paid or nothing changes: lands tapped for a
/// payment that still falls short are untapped and their mana removed.
/// Phyrexian pips the pool can't cover are paid with life.
pub fn pay_cost(
    game: &mut GameState,
    player: PlayerId,
    cost: &ManaCost,
    x_value: u32,
) -> Result<Payment, PaymentError> {
    let insufficient = || PaymentError::Insufficient {
        cost: cost.to_oracle(),
    };
    let state = game.player_mut(player).ok_or_else(insufficient)?;
    let (tapped, life_budget) = tap_lands_for(state, cost, x_value)?;

    match state.mana_pool.pay_with(cost, x_value, life_budget) {
        Ok(payment) => {
            if !tapped.is_empty() {
                tracing::debug!(%player, lands = tapped.len(), "auto-tapped for mana");
            }
            if payment.life_paid > 0 {
                game.lose_life(player, payment.life_paid);
            }
            Ok(payment)
        }
        Err(err) => {
            for id in &tapped {
                state.mana_pool.remove_from_source(*id);
                if let Some(land) = state.permanent_mut(*id) {
                    land.untap();
                }
            }
            Err(err)
        }
    }
}

/// Taps lands so the pool covers `cost`. Life goes to Phyrexian pips only
/// when mana can't cover the cost; the returned budget is what the payment
/// may draw on.
fn tap_lands_for(
    state: &mut Player,
    cost: &ManaCost,
    x_value: u32,
) -> Result<(Vec<ObjectId>, u32), PaymentError> {
    if let Ok(tapped) = auto_tap_for(&mut state.mana_pool, cost, x_value, 0, &mut state.battlefield) {
        return Ok((tapped, 0));
    }
    let life_budget = state.life.max(0) as u32;
    let tapped = auto_tap_for(
        &mut state.mana_pool,
        cost,
        x_value,
        life_budget,
        &mut state.battlefield,
    )?;
    Ok((tapped, life_budget))
}

/// Checks that `target` fits `hint` right now.
pub fn validate_target(
    game: &GameState,
    player: PlayerId,
    hint: TargetHint,
    target: Target,
) -> Result<(), ActionError> {
    let legal = match (hint, target) {
        (TargetHint::Player | TargetHint::Any, Target::Player(p)) => {
            game.player(p).is_some_and(|p| p.is_in_game())
        }
        (TargetHint::Player, Target::Object(_)) => false,
        (_, Target::Player(_)) => false,
        (TargetHint::Creature, Target::Object(id)) => {
            game.permanent(id).is_some_and(|p| p.is_creature())
        }
        (TargetHint::Permanent, Target::Object(id)) => game.is_on_battlefield(id),
        (TargetHint::Any, Target::Object(id)) => game
            .permanent(id)
            .is_some_and(|p| p.is_creature() || p.is_planeswalker()),
    };
    if legal {
        Ok(())
    } else {
        Err(ActionError::IllegalTarget(format!(
            "{target} is not a legal {hint:?} target for {player}"
        )))
    }
}

/// Targets picked for a trigger: the first opponent for player and "any"
/// targets, otherwise the first opposing creature or permanent.
fn default_targets(game: &GameState, controller: PlayerId, hint: Option<TargetHint>) -> Vec<Target> {
    let opposing = |want_creature: bool| {
        game.permanents()
            .find(|p| p.controller() != controller && (!want_creature || p.is_creature()))
            .map(|p| Target::Object(p.id()))
    };
    let target = match hint {
        None => None,
        Some(TargetHint::Player | TargetHint::Any) => game
            .opponents(controller)
            .first()
            .map(|p| Target::Player(*p)),
        Some(TargetHint::Creature) => opposing(true),
        Some(TargetHint::Permanent) => opposing(false),
    };
    target.into_iter().collect()
}

fn controlled_permanent(
    game: &GameState,
    player: PlayerId,
    source: ObjectId,
) -> Result<&Permanent, ActionError> {
    game.permanent(source)
        .filter(|p| p.controller() == player)
        .ok_or(ActionError::NotInZone {
            card: source,
            player,
            zone: Zone::Battlefield,
        })
}

fn activated_ability(
    game: &GameState,
    player: PlayerId,
    source: ObjectId,
    index: usize,
) -> Result<&ActivatedAbility, ActionError> {
    let permanent = controlled_permanent(game, player, source)?;
    permanent
        .card
        .abilities
        .get(index)
        .ok_or(ActionError::NoSuchAbility {
            card: source,
            index,
        })?
        .as_activated()
        .ok_or(ActionError::NotActivated {
            card: source,
            index,
        })
}

/// Cost check on a scratch copy of the player so the real state is untouched.
fn check_costs(
    game: &GameState,
    player: PlayerId,
    source: ObjectId,
    ability: &ActivatedAbility,
) -> Result<(), ActionError> {
    let permanent = controlled_permanent(game, player, source)?;
    if ability.tap_cost {
        if permanent.tapped {
            return Err(PaymentError::AlreadyTapped(source).into());
        }
        if permanent.is_creature() && permanent.is_sick() {
            return Err(PaymentError::SummoningSick(source).into());
        }
    }
    if let Some(cost) = ability.loyalty_cost {
        let have = permanent.loyalty.unwrap_or(0);
        if have + cost < 0 {
            return Err(PaymentError::NotEnoughLoyalty {
                permanent: source,
                have,
                need: -cost,
            }
            .into());
        }
    }
    if ability.mana_cost.is_empty() {
        return Ok(());
    }

    let mut scratch = game
        .player(player)
        .cloned()
        .ok_or(ActionError::NoPriority(player))?;
    if ability.tap_cost
        && let Some(source) = scratch.permanent_mut(source)
    {
        source.tap();
    }
    tap_lands_for(&mut scratch, &ability.mana_cost, 0)?;
    Ok(())
}

/// Pays loyalty, tap and mana costs. On failure the player is restored
/// to how it was before.
fn pay_activation_costs(
    game: &mut GameState,
    player: PlayerId,
    source: ObjectId,
    ability: &ActivatedAbility,
) -> Result<(), ActionError> {
    let snapshot = game
        .player(player)
        .cloned()
        .ok_or(ActionError::NoPriority(player))?;

    let result = (|| -> Result<(), ActionError> {
        let permanent = game
            .permanent_mut(source)
            .ok_or(ActionError::NotInZone {
                card: source,
                player,
                zone: Zone::Battlefield,
            })?;
        if let Some(cost) = ability.loyalty_cost {
            let loyalty = permanent.loyalty.get_or_insert(0);
            *loyalty += cost;
        }
        if ability.tap_cost && !permanent.tap() {
            return Err(PaymentError::AlreadyTapped(source).into());
        }
        if !ability.mana_cost.is_empty() {
            pay_cost(game, player, &ability.mana_cost, 0)?;
        }
        Ok(())
    })();

    if result.is_err()
        && let Some(slot) = game.players.get_mut(player.index())
    {
        *slot = snapshot;
    }
    result
}

fn add_mana(game: &mut GameState, player: PlayerId, source: ObjectId, bundle: &[ManaSymbol]) {
    if let Some(state) = game.player_mut(player) {
        for symbol in bundle {
            state.mana_pool.add(*symbol, 1, Some(source));
        }
    }
    tracing::debug!(%player, %source, ?bundle, "mana added");
}

fn push_ability(
    game: &mut GameState,
    player: PlayerId,
    source: ObjectId,
    index: usize,
    ability: &ActivatedAbility,
    targets: Vec<Target>,
) {
    let name = game
        .permanent(source)
        .map(|p| p.name().to_string())
        .unwrap_or_default();
    let instance = AbilityInstance::new(source, name, player, index, ability.effect_text.clone())
        .with_target_hint(ability.target_hint)
        .with_targets(targets);
    let item = StackItem::ability(instance);
    tracing::debug!(item = %item.describe(), "ability put on the stack");
    game.stack.push(item);
    game.priority.on_stack_push();
}
