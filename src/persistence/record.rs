//! The on-disk and on-the-wire save format.
//!
//! Records are JSON. Unknown fields are ignored and everything but the species and
//! level of each party member has a default, so older and newer saves keep loading.

use crate::catalog::{Catalog, MAX_LEVEL};
use crate::errors::PersistenceError;
use crate::monster::{exp_for_level, Monster, MoveSlot, StatBlock, StatusCondition, MAX_MOVES};
use crate::overworld::{Position, TileMap};
use crate::party::MAX_PARTY_SIZE;
use chrono::{DateTime, Utc};
use schema::{Item, MoveId, SpeciesId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const SAVE_FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SAVE_FORMAT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub x: usize,
    pub y: usize,
    #[serde(default)]
    pub map_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub move_id: MoveId,
    /// Missing means fully restored.
    #[serde(default)]
    pub remaining_uses: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterRecord {
    pub species: SpeciesId,
    pub level: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub experience: Option<u32>,
    /// Missing means full health.
    #[serde(default)]
    pub current_hp: Option<u16>,
    /// Missing or empty means the moves a fresh monster of this level would know.
    #[serde(default)]
    pub moves: Vec<MoveRecord>,
    #[serde(default)]
    pub status: Option<StatusCondition>,
}

impl From<&Monster> for MonsterRecord {
    fn from(monster: &Monster) -> Self {
        MonsterRecord {
            species: monster.species.clone(),
            level: monster.level,
            name: Some(monster.name.clone()),
            experience: Some(monster.experience),
            current_hp: Some(monster.current_hp),
            moves: monster
                .moves
                .iter()
                .map(|slot| MoveRecord {
                    move_id: slot.move_id.clone(),
                    remaining_uses: Some(slot.remaining_uses),
                })
                .collect(),
            status: monster.status,
        }
    }
}

impl MonsterRecord {
    /// Rebuild a monster. Stats are recomputed from the catalog, never trusted from disk.
    pub fn to_monster(&self, catalog: &Catalog) -> Result<Monster, PersistenceError> {
        if self.level == 0 || self.level > MAX_LEVEL {
            return Err(invalid(format!(
                "{} has level {} outside 1..={MAX_LEVEL}",
                self.species, self.level
            )));
        }
        let species = catalog
            .lookup_species(&self.species)
            .map_err(|e| invalid(e.to_string()))?;
        if self.moves.len() > MAX_MOVES {
            return Err(invalid(format!(
                "{} knows {} moves, at most {MAX_MOVES} allowed",
                self.species,
                self.moves.len()
            )));
        }

        let mut monster = Monster::instantiate(catalog, &self.species, self.level)
            .map_err(|e| invalid(e.to_string()))?;
        if !self.moves.is_empty() {
            monster.moves = self
                .moves
                .iter()
                .map(|saved| {
                    let move_data = catalog
                        .lookup_move(&saved.move_id)
                        .map_err(|e| invalid(e.to_string()))?;
                    let mut slot = MoveSlot::new(move_data);
                    if let Some(uses) = saved.remaining_uses {
                        slot.remaining_uses = uses.min(slot.max_uses);
                    }
                    Ok(slot)
                })
                .collect::<Result<_, PersistenceError>>()?;
        }

        monster.stats = StatBlock::compute(&species.base_stats, self.level);
        monster.name = self.name.clone().unwrap_or_else(|| species.name.clone());
        monster.experience = self
            .experience
            .unwrap_or_else(|| exp_for_level(self.level))
            .max(exp_for_level(self.level));
        let max_hp = monster.max_hp();
        monster.current_hp = self.current_hp.map_or(max_hp, |hp| hp.min(max_hp));
        monster.status = self.status;
        Ok(monster)
    }
}

/// A full snapshot of a session outside battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    pub position: SavedPosition,
    pub party: Vec<MonsterRecord>,
    #[serde(default)]
    pub inventory: BTreeMap<Item, u32>,
    #[serde(default)]
    pub defeated_trainers: Vec<Position>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// The validated pieces of a record, ready to go back into a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredState {
    pub position: Position,
    pub party: Vec<Monster>,
    pub defeated_trainers: BTreeSet<Position>,
}

impl SaveRecord {
    /// Check the record against the catalog and map and rebuild its party.
    pub fn restore(&self, catalog: &Catalog, map: &TileMap) -> Result<RestoredState, PersistenceError> {
        if self.version > SAVE_FORMAT_VERSION {
            return Err(invalid(format!(
                "format version {} is newer than supported version {SAVE_FORMAT_VERSION}",
                self.version
            )));
        }
        if !self.position.map_id.is_empty() && self.position.map_id != map.id {
            return Err(invalid(format!(
                "saved on map '{}' but '{}' is loaded",
                self.position.map_id, map.id
            )));
        }

        let position = Position::new(self.position.x, self.position.y);
        if !map.contains(position) || map.tile_at(position).is_blocking() {
            return Err(invalid(format!("position {position} is not walkable")));
        }

        if self.party.is_empty() {
            return Err(invalid("party is empty"));
        }
        if self.party.len() > MAX_PARTY_SIZE {
            return Err(invalid(format!(
                "party has {} members, at most {MAX_PARTY_SIZE} allowed",
                self.party.len()
            )));
        }
        let party = self
            .party
            .iter()
            .map(|record| record.to_monster(catalog))
            .collect::<Result<Vec<_>, _>>()?;

        let mut defeated_trainers = BTreeSet::new();
        for spot in &self.defeated_trainers {
            if map.trainer_spots.contains(spot) {
                defeated_trainers.insert(*spot);
            } else {
                tracing::warn!(position = %spot, "ignoring defeated trainer not on this map");
            }
        }

        Ok(RestoredState {
            position,
            party,
            defeated_trainers,
        })
    }
}

fn invalid(details: impl Into<String>) -> PersistenceError {
    PersistenceError::InvalidRecord(details.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::shipped_catalog;
    use pretty_assertions::assert_eq;

    fn map() -> TileMap {
        TileMap::parse("test", "#####\n#P.T#\n#####\n").unwrap()
    }

    fn minimal_json(party: &str) -> String {
        format!(r#"{{"position": {{"x": 2, "y": 1}}, "party": {party}}}"#)
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let json = minimal_json(r#"[{"species": "leafkin", "level": 8, "extra": true}]"#);
        let record: SaveRecord = serde_json::from_str(&json).unwrap();

        let restored = record.restore(shipped_catalog(), &map()).unwrap();

        assert_eq!(record.version, SAVE_FORMAT_VERSION);
        assert!(record.inventory.is_empty());
        let fresh = Monster::instantiate(shipped_catalog(), &SpeciesId::new("leafkin"), 8).unwrap();
        assert_eq!(restored.party, vec![fresh]);
        assert_eq!(restored.position, Position::new(2, 1));
    }

    #[test]
    fn test_saved_values_are_clamped() {
        let json = minimal_json(
            r#"[{"species": "ignis", "level": 10, "current_hp": 999,
                "moves": [{"move_id": "ember", "remaining_uses": 200}]}]"#,
        );
        let record: SaveRecord = serde_json::from_str(&json).unwrap();

        let restored = record.restore(shipped_catalog(), &map()).unwrap();

        let ignis = &restored.party[0];
        assert_eq!(ignis.current_hp, 27);
        assert_eq!(ignis.moves.len(), 1);
        assert_eq!(ignis.moves[0].remaining_uses, 25);
    }

    #[rstest::rstest]
    #[case::unknown_species(r#"[{"species": "dragonite", "level": 5}]"#)]
    #[case::unknown_move(r#"[{"species": "ignis", "level": 5, "moves": [{"move_id": "hyper_beam"}]}]"#)]
    #[case::level_zero(r#"[{"species": "ignis", "level": 0}]"#)]
    #[case::empty_party("[]")]
    fn test_invalid_party_is_rejected(#[case] party: &str) {
        let record: SaveRecord = serde_json::from_str(&minimal_json(party)).unwrap();

        let result = record.restore(shipped_catalog(), &map());

        assert!(matches!(result, Err(PersistenceError::InvalidRecord(_))));
    }

    #[test]
    fn test_more_than_six_members_is_rejected() {
        let members = vec![r#"{"species": "ignis", "level": 5}"#; 7].join(",");
        let record: SaveRecord = serde_json::from_str(&minimal_json(&format!("[{members}]"))).unwrap();

        assert!(matches!(
            record.restore(shipped_catalog(), &map()),
            Err(PersistenceError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_position_must_be_walkable() {
        let json = r#"{"position": {"x": 0, "y": 0}, "party": [{"species": "ignis", "level": 5}]}"#;
        let record: SaveRecord = serde_json::from_str(json).unwrap();

        assert!(matches!(
            record.restore(shipped_catalog(), &map()),
            Err(PersistenceError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_unknown_trainer_spots_are_dropped() {
        let json = r#"{"position": {"x": 1, "y": 1}, "party": [{"species": "ignis", "level": 5}],
            "defeated_trainers": [{"x": 3, "y": 1}, {"x": 2, "y": 1}]}"#;
        let record: SaveRecord = serde_json::from_str(json).unwrap();

        let restored = record.restore(shipped_catalog(), &map()).unwrap();

        assert_eq!(restored.defeated_trainers, BTreeSet::from([Position::new(3, 1)]));
    }
}
