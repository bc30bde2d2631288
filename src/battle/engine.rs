//! Turn resolution.
//!
//! A turn validates the player's choice, lets the opponent pick its move, runs both
//! actions in order, applies end-of-turn poison, replaces fainted monsters and checks
//! whether the battle is over. Everything observable is pushed onto an [`EventBus`].

use crate::battle::ai::{Behavior, RandomAI, ScoringAI};
use crate::battle::calculators::{calculate_damage, roll_variance};
use crate::battle::catch::{capture_probability, is_catch_allowed, roll_catch_success, validate_capture};
use crate::battle::flee::{flee_probability, roll_flee};
use crate::battle::state::{
    Battle, BattleEvent, BattleKind, BattleOutcome, BattlePhase, EventBus, PlayerAction,
    PreventionReason, Side,
};
use crate::battle::stats::{move_hits, player_acts_first, ActionPriority};
use crate::catalog::Catalog;
use crate::errors::{ActionError, BattleResult, InvalidStateError};
use crate::monster::{Monster, ProgressEvent, StatusCondition};
use crate::party::{Inventory, Party};
use crate::rng::RandomSource;
use schema::{Item, MoveEffect, StatusKind, POTION_HEAL};

pub const FULL_PARALYSIS_CHANCE: f64 = 0.25;
pub const MAX_SLEEP_TURNS: u32 = 3;

/// Mutable world state a turn works on, outside the battle itself.
struct TurnContext<'a> {
    catalog: &'a Catalog,
    party: &'a mut Party,
    inventory: &'a mut Inventory,
    bus: EventBus,
}

impl Battle {
    /// Start a battle against `opponents`. The party's first able monster leads.
    pub fn start(
        party: &Party,
        opponents: Vec<Monster>,
        kind: BattleKind,
    ) -> Result<Battle, InvalidStateError> {
        let player_active = party.require_able()?;
        let opponent_active = opponents
            .iter()
            .position(|m| !m.is_fainted())
            .ok_or(InvalidStateError::BattleOver)?;

        tracing::debug!(?kind, opponents = opponents.len(), "battle started");
        Ok(Battle {
            kind,
            phase: BattlePhase::Active,
            turn_number: 1,
            player_active,
            opponents,
            opponent_active,
            failed_flee_attempts: 0,
        })
    }

    /// Check a player's choice without changing anything.
    pub fn validate_player_action(
        &self,
        party: &Party,
        inventory: &Inventory,
        action: PlayerAction,
    ) -> BattleResult<()> {
        if self.phase.is_terminal() {
            return Err(InvalidStateError::BattleOver.into());
        }
        let active = party
            .get(self.player_active)
            .ok_or(InvalidStateError::NoAbleMonster)?;

        match action {
            PlayerAction::UseMove { move_index } => {
                active.select_move(move_index)?;
            }
            PlayerAction::UseItem { item } => {
                if item != Item::Potion {
                    return Err(ActionError::WrongItem(item).into());
                }
                if !inventory.has(item) {
                    return Err(ActionError::ItemMissing(item).into());
                }
                if active.current_hp >= active.max_hp() {
                    return Err(ActionError::HealthFull(active.name.clone()).into());
                }
            }
            PlayerAction::Switch { party_index } => {
                let target = party
                    .get(party_index)
                    .ok_or(ActionError::InvalidPartyIndex(party_index))?;
                if party_index == self.player_active {
                    return Err(ActionError::AlreadyActive.into());
                }
                if target.is_fainted() {
                    return Err(InvalidStateError::Fainted(target.name.clone()).into());
                }
            }
            PlayerAction::AttemptCapture { item } => {
                validate_capture(self, party, inventory, item)?;
            }
            PlayerAction::Flee => {
                if self.kind == BattleKind::Trainer {
                    return Err(ActionError::CannotFlee.into());
                }
            }
            PlayerAction::Pass => {
                if !active.usable_move_indices().is_empty() {
                    return Err(ActionError::MovesRemaining(active.name.clone()).into());
                }
            }
        }
        Ok(())
    }

    /// Resolve one full turn. Invalid choices are rejected before anything changes.
    pub fn resolve_turn(
        &mut self,
        catalog: &Catalog,
        party: &mut Party,
        inventory: &mut Inventory,
        action: PlayerAction,
        rng: &mut dyn RandomSource,
    ) -> BattleResult<EventBus> {
        self.validate_player_action(party, inventory, action)?;

        let mut ctx = TurnContext {
            catalog,
            party,
            inventory,
            bus: EventBus::new(),
        };
        ctx.bus.push(BattleEvent::TurnStarted {
            turn_number: self.turn_number,
        });
        tracing::debug!(turn = self.turn_number, ?action, "resolving turn");

        let opponent_choice = self.choose_opponent_move(&ctx, rng)?;

        if self.player_moves_first(&ctx, action, opponent_choice)? {
            self.execute_player_action(&mut ctx, action, rng)?;
            if !self.phase.is_terminal() {
                self.execute_opponent_action(&mut ctx, opponent_choice, rng)?;
            }
        } else {
            self.execute_opponent_action(&mut ctx, opponent_choice, rng)?;
            if !self.phase.is_terminal() {
                self.execute_player_action(&mut ctx, action, rng)?;
            }
        }

        if !self.phase.is_terminal() {
            self.phase = BattlePhase::TurnResolved;
            self.apply_poison_damage(&mut ctx)?;
            self.replace_fainted_and_check_end(&mut ctx);
        }

        self.finalize_turn(&mut ctx);
        Ok(ctx.bus)
    }

    fn opponent_behavior(&self) -> &'static dyn Behavior {
        match self.kind {
            BattleKind::Wild => &RandomAI,
            BattleKind::Trainer => &ScoringAI,
        }
    }

    fn choose_opponent_move(
        &self,
        ctx: &TurnContext<'_>,
        rng: &mut dyn RandomSource,
    ) -> BattleResult<Option<usize>> {
        let (Some(attacker), Some(defender)) = (self.opponent(), ctx.party.get(self.player_active))
        else {
            return Ok(None);
        };
        if attacker.is_fainted() {
            return Ok(None);
        }
        Ok(self
            .opponent_behavior()
            .choose_move(attacker, defender, ctx.catalog, rng)?)
    }

    fn player_moves_first(
        &self,
        ctx: &TurnContext<'_>,
        action: PlayerAction,
        opponent_choice: Option<usize>,
    ) -> BattleResult<bool> {
        let PlayerAction::UseMove { move_index } = action else {
            return Ok(true);
        };
        let Some(opponent_index) = opponent_choice else {
            return Ok(true);
        };
        let player = ctx
            .party
            .get(self.player_active)
            .ok_or(InvalidStateError::NoAbleMonster)?;
        let opponent = self.opponent().ok_or(InvalidStateError::BattleOver)?;

        let player_move = ctx.catalog.lookup_move(&player.moves[move_index].move_id)?;
        let opponent_move = ctx
            .catalog
            .lookup_move(&opponent.moves[opponent_index].move_id)?;

        Ok(player_acts_first(
            ActionPriority::for_move(player, player_move),
            ActionPriority::for_move(opponent, opponent_move),
        ))
    }

    fn execute_player_action(
        &mut self,
        ctx: &mut TurnContext<'_>,
        action: PlayerAction,
        rng: &mut dyn RandomSource,
    ) -> BattleResult<()> {
        match action {
            PlayerAction::UseMove { move_index } => {
                if self.execute_move(ctx, Side::Player, move_index, rng)? {
                    self.report_faint(ctx, Side::Opponent)?;
                }
            }
            PlayerAction::UseItem { item } => {
                ctx.inventory.take(item)?;
                let active = ctx
                    .party
                    .get_mut(self.player_active)
                    .ok_or(InvalidStateError::NoAbleMonster)?;
                let restored = active.heal(POTION_HEAL);
                ctx.bus.push(BattleEvent::ItemUsed {
                    item,
                    target: active.name.clone(),
                    restored,
                });
            }
            PlayerAction::Switch { party_index } => {
                let from = self.player_name(ctx)?;
                self.player_active = party_index;
                let to = self.player_name(ctx)?;
                ctx.bus.push(BattleEvent::Switched { from, to });
            }
            PlayerAction::AttemptCapture { item } => {
                self.attempt_capture(ctx, item, rng)?;
            }
            PlayerAction::Flee => {
                let player = ctx
                    .party
                    .get(self.player_active)
                    .ok_or(InvalidStateError::NoAbleMonster)?;
                let wild = self.opponent().ok_or(InvalidStateError::BattleOver)?;
                let probability = flee_probability(player, wild, self.failed_flee_attempts);
                if roll_flee(probability, rng) {
                    ctx.bus.push(BattleEvent::FleeSucceeded);
                    self.end(ctx, BattleOutcome::Fled);
                } else {
                    self.failed_flee_attempts += 1;
                    ctx.bus.push(BattleEvent::FleeFailed);
                }
            }
            PlayerAction::Pass => {
                let monster = self.player_name(ctx)?;
                ctx.bus.push(BattleEvent::NoUsableMoves {
                    side: Side::Player,
                    monster,
                });
            }
        }
        Ok(())
    }

    fn attempt_capture(
        &mut self,
        ctx: &mut TurnContext<'_>,
        item: Item,
        rng: &mut dyn RandomSource,
    ) -> BattleResult<()> {
        let strength = item
            .capture_strength()
            .ok_or(ActionError::WrongItem(item))?;
        ctx.inventory.take(item)?;
        let target = self.opponent().ok_or(InvalidStateError::BattleOver)?;
        ctx.bus.push(BattleEvent::CaptureAttempted {
            item,
            target: target.name.clone(),
        });

        if !is_catch_allowed(self.kind) {
            ctx.bus.push(BattleEvent::CaptureBlocked);
            return Ok(());
        }

        let probability = capture_probability(ctx.catalog, target, strength)?;
        tracing::debug!(target = %target.name, probability, "capture attempt");
        if !roll_catch_success(probability, rng) {
            ctx.bus.push(BattleEvent::CaptureFailed {
                target: target.name.clone(),
            });
            return Ok(());
        }

        let caught = self.opponents.remove(self.opponent_active);
        ctx.bus.push(BattleEvent::CaptureSucceeded {
            target: caught.name.clone(),
        });
        ctx.party.add(caught)?;
        self.end(ctx, BattleOutcome::Captured);
        Ok(())
    }

    fn execute_opponent_action(
        &mut self,
        ctx: &mut TurnContext<'_>,
        choice: Option<usize>,
        rng: &mut dyn RandomSource,
    ) -> BattleResult<()> {
        let Some(opponent) = self.opponent() else {
            return Ok(());
        };
        if opponent.is_fainted() {
            return Ok(());
        }
        match choice {
            Some(move_index) => {
                if self.execute_move(ctx, Side::Opponent, move_index, rng)? {
                    self.report_faint(ctx, Side::Player)?;
                }
            }
            None => ctx.bus.push(BattleEvent::NoUsableMoves {
                side: Side::Opponent,
                monster: opponent.name.clone(),
            }),
        }
        Ok(())
    }

    /// Run one move. Returns true if the defender fainted from it.
    fn execute_move(
        &mut self,
        ctx: &mut TurnContext<'_>,
        side: Side,
        move_index: usize,
        rng: &mut dyn RandomSource,
    ) -> BattleResult<bool> {
        let catalog = ctx.catalog;
        let (attacker, defender) = combatants(
            &mut self.opponents,
            self.opponent_active,
            ctx.party,
            self.player_active,
            side,
        )?;
        let target_side = opposite(side);

        if attacker.is_fainted() {
            return Ok(false);
        }
        match attacker.status {
            Some(StatusCondition::Sleep(turns)) if turns > 0 => {
                attacker.status = Some(StatusCondition::Sleep(turns - 1));
                ctx.bus.push(BattleEvent::ActionPrevented {
                    side,
                    monster: attacker.name.clone(),
                    reason: PreventionReason::Asleep,
                });
                return Ok(false);
            }
            Some(StatusCondition::Sleep(_)) => {
                attacker.clear_status();
                ctx.bus.push(BattleEvent::WokeUp {
                    side,
                    monster: attacker.name.clone(),
                });
            }
            Some(StatusCondition::Paralysis) => {
                if rng.chance(FULL_PARALYSIS_CHANCE, "full paralysis") {
                    ctx.bus.push(BattleEvent::ActionPrevented {
                        side,
                        monster: attacker.name.clone(),
                        reason: PreventionReason::FullyParalyzed,
                    });
                    return Ok(false);
                }
            }
            Some(StatusCondition::Poison) | None => {}
        }

        let move_id = attacker
            .moves
            .get(move_index)
            .map(|slot| slot.move_id.clone())
            .ok_or(ActionError::InvalidMoveIndex(move_index))?;
        let move_data = catalog.lookup_move(&move_id)?;
        if !attacker.consume_use(move_index) {
            return Err(ActionError::NoUsesLeft(move_id).into());
        }
        ctx.bus.push(BattleEvent::MoveUsed {
            side,
            monster: attacker.name.clone(),
            move_name: move_data.name.clone(),
        });

        if !move_hits(move_data, rng) {
            ctx.bus.push(BattleEvent::MoveMissed {
                side,
                monster: attacker.name.clone(),
            });
            return Ok(false);
        }

        if move_data.is_damaging() {
            let attacker_types = attacker.types(catalog)?;
            let defender_types = defender.types(catalog)?;
            let effectiveness = move_data.move_type.effectiveness_against(defender_types);
            let variance = if effectiveness > 0.0 {
                roll_variance(rng)
            } else {
                1.0
            };
            let breakdown = calculate_damage(
                attacker,
                attacker_types,
                defender,
                defender_types,
                move_data,
                variance,
            );
            tracing::debug!(
                attacker = %attacker.name,
                defender = %defender.name,
                base = breakdown.base,
                effectiveness,
                stab = breakdown.stab,
                variance,
                damage = breakdown.damage,
                "damage roll"
            );

            if effectiveness != 1.0 {
                ctx.bus.push(BattleEvent::AttackTypeEffectiveness {
                    multiplier: effectiveness,
                });
            }
            if breakdown.damage == 0 {
                return Ok(false);
            }
            let dealt = defender.apply_damage(breakdown.damage)?;
            ctx.bus.push(BattleEvent::DamageDealt {
                side: target_side,
                target: defender.name.clone(),
                damage: dealt,
                remaining_hp: defender.current_hp,
            });
            if defender.is_fainted() {
                return Ok(true);
            }
        }

        if let Some(MoveEffect::InflictStatus { status, chance }) = &move_data.effect {
            if defender.status.is_some() {
                if !move_data.is_damaging() {
                    ctx.bus.push(BattleEvent::MoveFailed);
                }
            } else if *chance >= 100 || rng.chance(*chance as f64 / 100.0, "secondary effect") {
                let condition = match status {
                    StatusKind::Poison => StatusCondition::Poison,
                    StatusKind::Paralysis => StatusCondition::Paralysis,
                    StatusKind::Sleep => {
                        StatusCondition::Sleep(rng.range_inclusive(1, MAX_SLEEP_TURNS, "sleep turns") as u8)
                    }
                };
                defender.status = Some(condition);
                ctx.bus.push(BattleEvent::StatusApplied {
                    side: target_side,
                    target: defender.name.clone(),
                    status: condition,
                });
            }
        }

        Ok(false)
    }

    /// Announce a faint. When the opponent's monster goes down the player's active
    /// monster earns its experience.
    fn report_faint(&mut self, ctx: &mut TurnContext<'_>, side: Side) -> BattleResult<()> {
        match side {
            Side::Player => {
                let name = self.player_name(ctx)?;
                ctx.bus.push(BattleEvent::MonsterFainted {
                    side,
                    monster: name,
                });
            }
            Side::Opponent => {
                let fainted = self.opponent().ok_or(InvalidStateError::BattleOver)?;
                ctx.bus.push(BattleEvent::MonsterFainted {
                    side,
                    monster: fainted.name.clone(),
                });
                let amount = fainted.experience_yield(ctx.catalog)?;
                self.award_experience(ctx, amount)?;
            }
        }
        Ok(())
    }

    fn award_experience(&mut self, ctx: &mut TurnContext<'_>, amount: u32) -> BattleResult<()> {
        let catalog = ctx.catalog;
        let Some(winner) = ctx.party.get_mut(self.player_active) else {
            return Ok(());
        };
        if winner.is_fainted() {
            return Ok(());
        }
        ctx.bus.push(BattleEvent::ExperienceGained {
            monster: winner.name.clone(),
            amount,
        });
        for event in winner.gain_experience(catalog, amount)? {
            ctx.bus.push(match event {
                ProgressEvent::LeveledUp { name, level } => BattleEvent::LeveledUp {
                    monster: name,
                    level,
                },
                ProgressEvent::LearnedMove {
                    name,
                    move_id,
                    forgot,
                } => BattleEvent::MoveLearned {
                    monster: name,
                    move_name: catalog.lookup_move(&move_id)?.name.clone(),
                    forgot: match forgot {
                        Some(old) => Some(catalog.lookup_move(&old)?.name.clone()),
                        None => None,
                    },
                },
            });
        }
        Ok(())
    }

    fn apply_poison_damage(&mut self, ctx: &mut TurnContext<'_>) -> BattleResult<()> {
        for side in [Side::Player, Side::Opponent] {
            let monster = match side {
                Side::Player => ctx.party.get_mut(self.player_active),
                Side::Opponent => self.opponents.get_mut(self.opponent_active),
            };
            let Some(monster) = monster else {
                continue;
            };
            if monster.is_fainted() || monster.status != Some(StatusCondition::Poison) {
                continue;
            }
            let damage = (monster.max_hp() / 8).max(1);
            let dealt = monster.apply_damage(damage)?;
            ctx.bus.push(BattleEvent::StatusDamage {
                side,
                target: monster.name.clone(),
                damage: dealt,
                remaining_hp: monster.current_hp,
            });
            if monster.is_fainted() {
                self.report_faint(ctx, side)?;
            }
        }
        Ok(())
    }

    fn replace_fainted_and_check_end(&mut self, ctx: &mut TurnContext<'_>) {
        if !ctx.party.has_able_member() {
            self.end(ctx, BattleOutcome::PlayerLost);
            return;
        }
        let Some(next_opponent) = self.next_able_opponent() else {
            self.end(ctx, BattleOutcome::PlayerWon);
            return;
        };

        let player_down = ctx
            .party
            .get(self.player_active)
            .map_or(true, |m| m.is_fainted());
        if player_down {
            if let Some(next) = ctx.party.next_able_after(self.player_active) {
                self.player_active = next;
                if let Some(monster) = ctx.party.get(next) {
                    ctx.bus.push(BattleEvent::SentOut {
                        side: Side::Player,
                        monster: monster.name.clone(),
                    });
                }
            }
        }

        if next_opponent != self.opponent_active {
            self.opponent_active = next_opponent;
            self.failed_flee_attempts = 0;
            ctx.bus.push(BattleEvent::SentOut {
                side: Side::Opponent,
                monster: self.opponents[next_opponent].name.clone(),
            });
        }
    }

    fn end(&mut self, ctx: &mut TurnContext<'_>, outcome: BattleOutcome) {
        self.phase = match outcome {
            BattleOutcome::PlayerWon => BattlePhase::PlayerWon,
            BattleOutcome::PlayerLost => BattlePhase::PlayerLost,
            BattleOutcome::Fled => BattlePhase::Fled,
            BattleOutcome::Captured => BattlePhase::Captured,
        };
        tracing::debug!(?outcome, turn = self.turn_number, "battle ended");
        ctx.bus.push(BattleEvent::BattleEnded { outcome });
    }

    fn finalize_turn(&mut self, ctx: &mut TurnContext<'_>) {
        if !self.phase.is_terminal() {
            self.turn_number += 1;
            self.phase = BattlePhase::Active;
        }
        ctx.bus.push(BattleEvent::TurnEnded);
    }

    fn player_name(&self, ctx: &TurnContext<'_>) -> BattleResult<String> {
        Ok(ctx
            .party
            .get(self.player_active)
            .ok_or(InvalidStateError::NoAbleMonster)?
            .name
            .clone())
    }
}

fn opposite(side: Side) -> Side {
    match side {
        Side::Player => Side::Opponent,
        Side::Opponent => Side::Player,
    }
}

/// Mutable (attacker, defender) pair for `side` acting.
fn combatants<'b>(
    opponents: &'b mut [Monster],
    opponent_active: usize,
    party: &'b mut Party,
    player_active: usize,
    side: Side,
) -> BattleResult<(&'b mut Monster, &'b mut Monster)> {
    let opponent = opponents
        .get_mut(opponent_active)
        .ok_or(InvalidStateError::BattleOver)?;
    let player = party
        .get_mut(player_active)
        .ok_or(InvalidStateError::NoAbleMonster)?;
    Ok(match side {
        Side::Player => (player, opponent),
        Side::Opponent => (opponent, player),
    })
}
