use crate::monster::Monster;
use crate::rng::RandomSource;
use schema::{ElementType, MoveCategory, MoveData};

pub const STAB_MULTIPLIER: f64 = 1.5;
pub const MIN_VARIANCE: f64 = 0.85;
pub const MAX_VARIANCE: f64 = 1.0;

/// Every factor that went into a damage roll, kept for events and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageBreakdown {
    pub base: u32,
    pub effectiveness: f64,
    pub stab: f64,
    pub variance: f64,
    pub damage: u16,
}

impl DamageBreakdown {
    /// Damage before the random variance is applied.
    pub fn pre_variance(&self) -> f64 {
        self.base as f64 * self.effectiveness * self.stab
    }
}

/// `((2*level/5 + 2) * power * atk/def) / 50 + 2`, all in integer arithmetic.
pub fn base_damage(level: u8, power: u16, attack: u16, defense: u16) -> u32 {
    let level_term = 2 * level as u64 / 5 + 2;
    let defense = defense.max(1) as u64;
    let base = level_term * power as u64 * attack as u64 / defense / 50 + 2;
    base.min(u32::MAX as u64) as u32
}

pub fn stab_multiplier(move_type: ElementType, attacker_types: &[ElementType]) -> f64 {
    if attacker_types.contains(&move_type) {
        STAB_MULTIPLIER
    } else {
        1.0
    }
}

/// Attack and defense stats used by `move_data`'s category.
pub fn attack_and_defense(attacker: &Monster, defender: &Monster, move_data: &MoveData) -> (u16, u16) {
    match move_data.category {
        MoveCategory::Physical => (attacker.stats.attack, defender.stats.defense),
        MoveCategory::Special => (attacker.stats.sp_attack, defender.stats.sp_defense),
        MoveCategory::Status => (0, 1),
    }
}

/// Compute the damage of `move_data` for a given `variance` in `[0.85, 1.0]`.
///
/// Zero effectiveness always yields zero damage; any other hit deals at least 1.
/// Status moves deal nothing.
pub fn calculate_damage(
    attacker: &Monster,
    attacker_types: &[ElementType],
    defender: &Monster,
    defender_types: &[ElementType],
    move_data: &MoveData,
    variance: f64,
) -> DamageBreakdown {
    let effectiveness = move_data.move_type.effectiveness_against(defender_types);
    let stab = stab_multiplier(move_data.move_type, attacker_types);

    if !move_data.is_damaging() {
        return DamageBreakdown {
            base: 0,
            effectiveness,
            stab,
            variance,
            damage: 0,
        };
    }

    let (attack, defense) = attack_and_defense(attacker, defender, move_data);
    let base = base_damage(attacker.level, move_data.power, attack, defense);

    let damage = if effectiveness == 0.0 {
        0
    } else {
        let raw = (base as f64 * effectiveness * stab * variance).floor();
        (raw.min(u16::MAX as f64) as u16).max(1)
    };

    DamageBreakdown {
        base,
        effectiveness,
        stab,
        variance,
        damage,
    }
}

pub fn roll_variance(rng: &mut dyn RandomSource) -> f64 {
    rng.uniform(MIN_VARIANCE, MAX_VARIANCE, "damage variance")
}
