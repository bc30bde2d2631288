use crate::battle::stats::effective_speed;
use crate::monster::Monster;
use crate::rng::RandomSource;

/// `min(1, 0.5 * player_speed / wild_speed + 0.1 * failed_attempts)`.
/// A wild monster with zero speed can always be escaped.
pub fn flee_probability(player: &Monster, wild: &Monster, failed_attempts: u32) -> f64 {
    let wild_speed = effective_speed(wild);
    if wild_speed == 0 {
        return 1.0;
    }
    let ratio = effective_speed(player) as f64 / wild_speed as f64;
    (0.5 * ratio + 0.1 * failed_attempts as f64).min(1.0)
}

/// Roll for escape. A certain escape draws nothing.
pub fn roll_flee(probability: f64, rng: &mut dyn RandomSource) -> bool {
    if probability >= 1.0 {
        return true;
    }
    rng.chance(probability, "flee roll")
}
