pub mod ai;
pub mod calculators;
pub mod catch;
pub mod engine;
pub mod flee;
pub mod state;
pub mod stats;

pub use state::{Battle, BattleEvent, BattleKind, BattleOutcome, BattlePhase, EventBus, PlayerAction, Side};

#[cfg(test)]
mod tests;
