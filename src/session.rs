//! The game context: where the player stands, who is in the party, and the battle in
//! progress, if any. Everything the game mutates lives here and is passed explicitly.

use crate::battle::state::{Battle, BattleKind, BattleOutcome, EventBus, PlayerAction};
use crate::catalog::Catalog;
use crate::errors::{ActionError, GameResult, InvalidStateError, PersistenceError};
use crate::monster::Monster;
use crate::overworld::{Overworld, Position};
use crate::party::{Inventory, Party};
use crate::persistence::record::{SaveRecord, SavedPosition, SAVE_FORMAT_VERSION};
use crate::rng::RandomSource;
use chrono::{DateTime, Utc};
use schema::SpeciesId;
use std::collections::BTreeSet;

pub const STARTER_SPECIES: &str = "ignis";
pub const STARTER_LEVEL: u8 = 5;

/// A battle plus the trainer it was started against.
#[derive(Debug, Clone)]
pub struct ActiveBattle {
    pub battle: Battle,
    pub trainer: Option<Position>,
}

/// Everything a front end needs to show after one battle turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub events: EventBus,
    pub messages: Vec<String>,
    /// Set once the battle is over and the session has applied its result.
    pub outcome: Option<BattleOutcome>,
    pub trainer_defeated: Option<Position>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub world: Overworld,
    pub position: Position,
    pub party: Party,
    pub inventory: Inventory,
    pub defeated_trainers: BTreeSet<Position>,
    pub battle: Option<ActiveBattle>,
}

impl Session {
    /// A fresh game at the map's start with the starter monster and default bag.
    pub fn new_game(world: Overworld, catalog: &Catalog) -> GameResult<Session> {
        let starter = Monster::instantiate(catalog, &SpeciesId::new(STARTER_SPECIES), STARTER_LEVEL)?;
        let party = Party::from_members(vec![starter])?;
        Ok(Session {
            position: world.map.start,
            world,
            party,
            inventory: Inventory::default(),
            defeated_trainers: BTreeSet::new(),
            battle: None,
        })
    }

    pub fn battle(&self) -> Option<&Battle> {
        self.battle.as_ref().map(|active| &active.battle)
    }

    pub fn in_battle(&self) -> bool {
        self.battle.is_some()
    }

    pub fn start_wild_battle(&mut self, wild: Monster) -> GameResult<&Battle> {
        self.begin(vec![wild], BattleKind::Wild, None)
    }

    /// Challenge the trainer at `at`. The trainer fights with a fresh copy of its team.
    pub fn start_trainer_battle(&mut self, at: Position) -> GameResult<&Battle> {
        if self.defeated_trainers.contains(&at) {
            return Err(InvalidStateError::BattleOver.into());
        }
        let team = self
            .world
            .trainer_at(at)
            .map(|trainer| trainer.team.clone())
            .ok_or(InvalidStateError::NoBattle)?;
        self.begin(team, BattleKind::Trainer, Some(at))
    }

    fn begin(
        &mut self,
        opponents: Vec<Monster>,
        kind: BattleKind,
        trainer: Option<Position>,
    ) -> GameResult<&Battle> {
        if self.battle.is_some() {
            return Err(InvalidStateError::BattleInProgress.into());
        }
        let battle = Battle::start(&self.party, opponents, kind)?;
        let active = self.battle.insert(ActiveBattle { battle, trainer });
        Ok(&active.battle)
    }

    /// Resolve one turn of the current battle and apply the result if it ended.
    pub fn take_turn(
        &mut self,
        catalog: &Catalog,
        action: PlayerAction,
        rng: &mut dyn RandomSource,
    ) -> GameResult<TurnReport> {
        let active = self.battle.as_mut().ok_or(InvalidStateError::NoBattle)?;
        let events = active
            .battle
            .resolve_turn(catalog, &mut self.party, &mut self.inventory, action, rng)?;
        let messages = events.messages(&active.battle);

        let mut report = TurnReport {
            events,
            messages,
            outcome: None,
            trainer_defeated: None,
        };
        if let Some(outcome) = active.battle.outcome() {
            report.outcome = Some(outcome);
            report.trainer_defeated = self.conclude_battle(outcome);
        }
        Ok(report)
    }

    /// Apply a finished battle to the session. Returns the trainer that was beaten, if any.
    fn conclude_battle(&mut self, outcome: BattleOutcome) -> Option<Position> {
        let active = self.battle.take()?;
        tracing::info!(?outcome, trainer = ?active.trainer, "battle concluded");
        match outcome {
            BattleOutcome::PlayerWon => {
                let trainer = active.trainer?;
                self.defeated_trainers.insert(trainer);
                Some(trainer)
            }
            BattleOutcome::PlayerLost => {
                self.party.heal_all();
                self.position = self.world.map.start;
                None
            }
            BattleOutcome::Fled | BattleOutcome::Captured => None,
        }
    }

    /// Snapshot for saving. Not available mid-battle.
    pub fn to_save_record(&self, saved_at: DateTime<Utc>) -> GameResult<SaveRecord> {
        if self.battle.is_some() {
            return Err(InvalidStateError::BattleInProgress.into());
        }
        Ok(SaveRecord {
            version: SAVE_FORMAT_VERSION,
            position: SavedPosition {
                x: self.position.x,
                y: self.position.y,
                map_id: self.world.map.id.clone(),
            },
            party: self.party.iter().map(Into::into).collect(),
            inventory: self.inventory.counts().clone(),
            defeated_trainers: self.defeated_trainers.iter().copied().collect(),
            saved_at: Some(saved_at),
        })
    }

    /// Rebuild a session from a saved record, validating it against the catalog and map.
    pub fn restore(
        world: Overworld,
        record: SaveRecord,
        catalog: &Catalog,
    ) -> Result<Session, PersistenceError> {
        let restored = record.restore(catalog, &world.map)?;
        let party = Party::from_members(restored.party)
            .map_err(|e: ActionError| PersistenceError::InvalidRecord(e.to_string()))?;
        tracing::info!(members = party.len(), position = %restored.position, "session restored");
        Ok(Session {
            world,
            position: restored.position,
            party,
            inventory: Inventory::from_counts(record.inventory),
            defeated_trainers: restored.defeated_trainers,
            battle: None,
        })
    }
}
