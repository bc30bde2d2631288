use crate::catalog::Catalog;
use crate::errors::NotFoundError;
use crate::monster::{Monster, StatusCondition};
use crate::rng::RandomSource;

pub const MAX_CATCH_RATE: f64 = 255.0;

/// Catch rate on the 0-255 scale:
/// `min(255, catch_rate * status_bonus * strength * hp_factor / 3)`
/// with `hp_factor = (3*max_hp - 2*current_hp) / (3*max_hp)`.
pub fn calculate_catch_rate(
    catalog: &Catalog,
    target: &Monster,
    item_strength: f64,
) -> Result<f64, NotFoundError> {
    let base_catch_rate = catalog.lookup_species(&target.species)?.catch_rate as f64;
    let status_bonus = StatusCondition::capture_bonus(target.status.as_ref());

    let max_hp = target.max_hp() as f64;
    let current_hp = target.current_hp as f64;
    let hp_factor = (max_hp * 3.0 - current_hp * 2.0) / (max_hp * 3.0);

    let rate = base_catch_rate * status_bonus * item_strength * hp_factor / 3.0;
    Ok(rate.min(MAX_CATCH_RATE))
}

/// Probability in `[0, 1]` that a capture succeeds.
pub fn capture_probability(
    catalog: &Catalog,
    target: &Monster,
    item_strength: f64,
) -> Result<f64, NotFoundError> {
    Ok(calculate_catch_rate(catalog, target, item_strength)? / MAX_CATCH_RATE)
}

/// Roll for capture. A certain capture draws nothing.
pub fn roll_catch_success(probability: f64, rng: &mut dyn RandomSource) -> bool {
    if probability >= 1.0 {
        return true;
    }
    rng.chance(probability, "catch roll")
}
