use schema::{AreaId, Item, MoveId, SpeciesId};
use std::path::PathBuf;
use thiserror::Error;

/// Malformed or inconsistent catalog or map content. Fatal at startup.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("catalog file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in {}: {details}", path.display())]
    Malformed { path: PathBuf, details: String },

    #[error("duplicate {kind} identifier: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{owner} references undefined {kind} '{id}'")]
    UndefinedReference {
        owner: String,
        kind: &'static str,
        id: String,
    },

    #[error("invalid record {owner}: {details}")]
    InvalidRecord { owner: String, details: String },

    #[error("invalid map '{map_id}': {details}")]
    InvalidMap { map_id: String, details: String },
}

/// An identifier that is not defined in the loaded catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("species not found: {0}")]
    Species(SpeciesId),
    #[error("move not found: {0}")]
    Move(MoveId),
    #[error("area not found: {0}")]
    Area(AreaId),
}

/// An operation attempted in a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidStateError {
    #[error("the party has no monster able to fight")]
    NoAbleMonster,
    #[error("the party is empty")]
    EmptyParty,
    #[error("{0} has fainted")]
    Fainted(String),
    #[error("the battle is already over")]
    BattleOver,
    #[error("no battle is in progress")]
    NoBattle,
    #[error("a battle is already in progress")]
    BattleInProgress,
}

/// A player choice that is not valid right now.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("invalid move slot: {0}")]
    InvalidMoveIndex(usize),
    #[error("no uses left for {0}")]
    NoUsesLeft(MoveId),
    #[error("invalid party slot: {0}")]
    InvalidPartyIndex(usize),
    #[error("that monster is already fighting")]
    AlreadyActive,
    #[error("no {0} left in the bag")]
    ItemMissing(Item),
    #[error("{0} cannot be used here")]
    WrongItem(Item),
    #[error("{0}'s health is already full")]
    HealthFull(String),
    #[error("you can't run from a trainer battle")]
    CannotFlee,
    #[error("the party is full")]
    PartyFull,
    #[error("{0} still has moves it can use")]
    MovesRemaining(String),
}

/// Errors raised while resolving a battle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Failures from a save backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("save record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote store answered with status {0}")]
    RemoteStatus(u16),

    #[error("remote request timed out")]
    Timeout,

    #[error("remote request was aborted")]
    Aborted,

    #[error("invalid remote store URL: {0}")]
    InvalidUrl(String),

    #[error("save record is invalid: {0}")]
    InvalidRecord(String),
}

/// Failures when loading a saved game.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No saved game found.")]
    NoSaveFound,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Umbrella error for the session and front end.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl From<BattleError> for GameError {
    fn from(err: BattleError) -> Self {
        match err {
            BattleError::NotFound(e) => GameError::NotFound(e),
            BattleError::InvalidState(e) => GameError::InvalidState(e),
            BattleError::Action(e) => GameError::Action(e),
        }
    }
}

/// Type alias for Results using DataError
pub type DataResult<T> = Result<T, DataError>;

/// Type alias for Results using BattleError
pub type BattleResult<T> = Result<T, BattleError>;

/// Type alias for Results using GameError
pub type GameResult<T> = Result<T, GameError>;
