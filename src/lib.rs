//! Dunkemon
//!
//! A turn-based monster collecting game for the terminal: walk an overworld map, meet
//! wild monsters and trainers, battle, capture, level up, and save your progress
//! locally or to an optional remote store.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod game;
pub mod input;
pub mod monster;
pub mod overworld;
pub mod party;
pub mod persistence;
pub mod render;
pub mod rng;
pub mod session;

// --- PUBLIC API RE-EXPORTS ---

// Catalog record types from the `schema` crate.
pub use schema::{
    AreaId, AreaTable, BaseStats, ElementType, Item, MoveCategory, MoveData, MoveId, SpeciesData,
    SpeciesId, StatusKind,
};

// Battle engine.
pub use battle::{Battle, BattleEvent, BattleKind, BattleOutcome, EventBus, PlayerAction, Side};

// Runtime state.
pub use catalog::{Catalog, CatalogPaths};
pub use monster::{Monster, StatusCondition};
pub use overworld::{Direction, Overworld, Position, StepOutcome, TileMap};
pub use party::{Inventory, Party};
pub use rng::{RandomSource, SeededRng};
pub use session::Session;

// Front end.
pub use config::GameConfig;
pub use game::Game;
pub use render::{Renderer, TextRenderer};

// Error and result types.
pub use errors::{
    ActionError, BattleError, BattleResult, DataError, DataResult, GameError, GameResult,
    InvalidStateError, LoadError, NotFoundError, PersistenceError,
};
