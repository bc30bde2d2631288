//! A module for defining AI behaviors for battle opponents.

use crate::battle::calculators::stab_multiplier;
use crate::catalog::Catalog;
use crate::errors::NotFoundError;
use crate::monster::Monster;
use crate::rng::RandomSource;
use schema::{MoveCategory, MoveEffect};

/// A trait for any system that can pick an opponent's move.
pub trait Behavior {
    /// Index of the move `attacker` should use against `defender`, or `None` if it has
    /// no move with uses left.
    fn choose_move(
        &self,
        attacker: &Monster,
        defender: &Monster,
        catalog: &Catalog,
        rng: &mut dyn RandomSource,
    ) -> Result<Option<usize>, NotFoundError>;
}

/// Wild monsters pick uniformly among moves that still have uses.
pub struct RandomAI;

impl Behavior for RandomAI {
    fn choose_move(
        &self,
        attacker: &Monster,
        _defender: &Monster,
        _catalog: &Catalog,
        rng: &mut dyn RandomSource,
    ) -> Result<Option<usize>, NotFoundError> {
        let usable = attacker.usable_move_indices();
        if usable.is_empty() {
            return Ok(None);
        }
        Ok(Some(usable[rng.pick_index(usable.len(), "wild move choice")]))
    }
}

/// Trainers score each usable move and pick the best one.
pub struct ScoringAI;

impl ScoringAI {
    /// power * effectiveness * STAB * accuracy for damaging moves; status moves are
    /// worth their inflict chance while the target is healthy and nothing otherwise.
    fn score_move(
        &self,
        move_index: usize,
        attacker: &Monster,
        defender: &Monster,
        catalog: &Catalog,
    ) -> Result<f64, NotFoundError> {
        let slot = &attacker.moves[move_index];
        let move_data = catalog.lookup_move(&slot.move_id)?;
        let accuracy = move_data.accuracy as f64 / 100.0;

        let utility = match &move_data.effect {
            Some(MoveEffect::InflictStatus { chance, .. }) if defender.status.is_none() => {
                45.0 * *chance as f64 / 100.0
            }
            _ => 0.0,
        };

        if move_data.category == MoveCategory::Status {
            if utility < 1.0 {
                return Ok(-1.0);
            }
            return Ok(utility * accuracy);
        }

        let effectiveness = move_data
            .move_type
            .effectiveness_against(defender.types(catalog)?);
        if effectiveness == 0.0 {
            return Ok(-1.0);
        }
        let stab = stab_multiplier(move_data.move_type, attacker.types(catalog)?);

        Ok((move_data.power as f64 * effectiveness * stab + utility) * accuracy)
    }
}

impl Behavior for ScoringAI {
    fn choose_move(
        &self,
        attacker: &Monster,
        defender: &Monster,
        catalog: &Catalog,
        _rng: &mut dyn RandomSource,
    ) -> Result<Option<usize>, NotFoundError> {
        let mut scored = Vec::new();
        for index in attacker.usable_move_indices() {
            scored.push((index, self.score_move(index, attacker, defender, catalog)?));
        }
        // Prefer the earliest slot among equal scores.
        Ok(scored
            .into_iter()
            .rev()
            .max_by_key(|(_, score)| ordered_float::OrderedFloat(*score))
            .map(|(index, _)| index))
    }
}
