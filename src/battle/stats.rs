use crate::monster::{Monster, StatusCondition};
use crate::rng::RandomSource;
use schema::MoveData;
use std::cmp::Ordering;

/// Speed after status modifiers. Paralysis quarters it.
pub fn effective_speed(monster: &Monster) -> u16 {
    let speed = monster.stats.speed;
    match monster.status {
        Some(StatusCondition::Paralysis) => speed / 4,
        _ => speed,
    }
}

/// Roll accuracy for `move_data`. Moves with 100 accuracy never miss and draw nothing.
pub fn move_hits(move_data: &MoveData, rng: &mut dyn RandomSource) -> bool {
    if move_data.accuracy >= 100 {
        return true;
    }
    rng.next_unit("accuracy") * 100.0 < move_data.accuracy as f64
}

/// Sort key for one side's action this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionPriority {
    /// Non-move actions: 1, moves: 0.
    pub action_priority: i8,
    pub move_priority: i8,
    pub speed: u16,
}

impl ActionPriority {
    pub fn non_move() -> Self {
        ActionPriority {
            action_priority: 1,
            move_priority: 0,
            speed: 0,
        }
    }

    pub fn for_move(monster: &Monster, move_data: &MoveData) -> Self {
        ActionPriority {
            action_priority: 0,
            move_priority: move_data.priority,
            speed: effective_speed(monster),
        }
    }

    fn key(&self) -> (i8, i8, u16) {
        (self.action_priority, self.move_priority, self.speed)
    }
}

/// Non-move actions first, then move priority, then effective speed. Ties go to the player.
pub fn player_acts_first(player: ActionPriority, opponent: ActionPriority) -> bool {
    player.key().cmp(&opponent.key()) != Ordering::Less
}
