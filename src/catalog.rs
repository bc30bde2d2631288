//! Read-only game data: species, moves and area encounter tables.
//!
//! The catalog is loaded once at startup from RON files and validated as a whole, so
//! broken references are reported before the game starts rather than mid-battle.

use crate::errors::{DataError, DataResult, NotFoundError};
use schema::{AreaId, AreaTable, MoveData, MoveId, SpeciesData, SpeciesId};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_LEVEL: u8 = 100;

/// Locations of the three catalog files.
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    pub species: PathBuf,
    pub moves: PathBuf,
    pub areas: PathBuf,
}

impl CatalogPaths {
    /// The standard file names inside a data directory.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            species: dir.join("species.ron"),
            moves: dir.join("moves.ron"),
            areas: dir.join("areas.ron"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    species: HashMap<SpeciesId, SpeciesData>,
    moves: HashMap<MoveId, MoveData>,
    areas: HashMap<AreaId, AreaTable>,
}

impl Catalog {
    /// Load and validate all catalog files.
    pub fn load(paths: &CatalogPaths) -> DataResult<Catalog> {
        let species: Vec<SpeciesData> = read_ron_file(&paths.species)?;
        let moves: Vec<MoveData> = read_ron_file(&paths.moves)?;
        let areas: Vec<AreaTable> = read_ron_file(&paths.areas)?;

        let catalog = Self::from_records(species, moves, areas)?;
        tracing::info!(
            species = catalog.species.len(),
            moves = catalog.moves.len(),
            areas = catalog.areas.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Build a catalog from in-memory records, applying the same validation as [`Catalog::load`].
    pub fn from_records(
        species: Vec<SpeciesData>,
        moves: Vec<MoveData>,
        areas: Vec<AreaTable>,
    ) -> DataResult<Catalog> {
        let catalog = Catalog {
            species: index_unique(species, "species", |s| s.id.clone())?,
            moves: index_unique(moves, "move", |m| m.id.clone())?,
            areas: index_unique(areas, "area", |a| a.id.clone())?,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn lookup_species(&self, id: &SpeciesId) -> Result<&SpeciesData, NotFoundError> {
        self.species
            .get(id)
            .ok_or_else(|| NotFoundError::Species(id.clone()))
    }

    pub fn lookup_move(&self, id: &MoveId) -> Result<&MoveData, NotFoundError> {
        self.moves
            .get(id)
            .ok_or_else(|| NotFoundError::Move(id.clone()))
    }

    pub fn lookup_area(&self, id: &AreaId) -> Result<&AreaTable, NotFoundError> {
        self.areas
            .get(id)
            .ok_or_else(|| NotFoundError::Area(id.clone()))
    }

    pub fn has_area(&self, id: &AreaId) -> bool {
        self.areas.contains_key(id)
    }

    /// Species identifiers in a stable (sorted) order.
    pub fn species_ids(&self) -> Vec<&SpeciesId> {
        let mut ids: Vec<&SpeciesId> = self.species.keys().collect();
        ids.sort();
        ids
    }

    fn validate(&self) -> DataResult<()> {
        if self.species.is_empty() {
            return Err(invalid("catalog", "at least one species is required"));
        }
        for mv in self.moves.values() {
            let owner = format!("move '{}'", mv.id);
            if mv.accuracy == 0 || mv.accuracy > 100 {
                return Err(invalid(&owner, format!("accuracy {} outside 1-100", mv.accuracy)));
            }
            if mv.max_uses == 0 {
                return Err(invalid(&owner, "max_uses must be at least 1"));
            }
            if mv.is_damaging() && mv.power == 0 {
                return Err(invalid(&owner, "damaging move with zero power"));
            }
        }

        for species in self.species.values() {
            let owner = format!("species '{}'", species.id);
            if species.types.is_empty() || species.types.len() > 2 {
                return Err(invalid(
                    &owner,
                    format!("must have one or two types, found {}", species.types.len()),
                ));
            }
            if species.catch_rate == 0 {
                return Err(invalid(&owner, "catch_rate must be at least 1"));
            }
            for entry in &species.learnset {
                if !self.moves.contains_key(&entry.move_id) {
                    return Err(DataError::UndefinedReference {
                        owner,
                        kind: "move",
                        id: entry.move_id.to_string(),
                    });
                }
                if entry.level == 0 || entry.level > MAX_LEVEL {
                    return Err(invalid(&owner, format!("learn level {} out of range", entry.level)));
                }
            }
        }

        for area in self.areas.values() {
            let owner = format!("area '{}'", area.id);
            if area.slots.is_empty() {
                return Err(invalid(&owner, "encounter table is empty"));
            }
            for slot in &area.slots {
                if !self.species.contains_key(&slot.species) {
                    return Err(DataError::UndefinedReference {
                        owner,
                        kind: "species",
                        id: slot.species.to_string(),
                    });
                }
                if slot.weight == 0 {
                    return Err(invalid(&owner, format!("zero weight for '{}'", slot.species)));
                }
                if slot.min_level == 0 || slot.min_level > slot.max_level || slot.max_level > MAX_LEVEL {
                    return Err(invalid(
                        &owner,
                        format!(
                            "bad level range {}-{} for '{}'",
                            slot.min_level, slot.max_level, slot.species
                        ),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn invalid(owner: &str, details: impl Into<String>) -> DataError {
    DataError::InvalidRecord {
        owner: owner.to_string(),
        details: details.into(),
    }
}

fn index_unique<K, V>(
    records: Vec<V>,
    kind: &'static str,
    key_of: impl Fn(&V) -> K,
) -> DataResult<HashMap<K, V>>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        let key = key_of(&record);
        if map.contains_key(&key) {
            return Err(DataError::DuplicateId {
                kind,
                id: key.to_string(),
            });
        }
        map.insert(key, record);
    }
    Ok(map)
}

fn read_ron_file<T: DeserializeOwned>(path: &Path) -> DataResult<T> {
    if !path.exists() {
        return Err(DataError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&content).map_err(|e| DataError::Malformed {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::LazyLock;

    static SHIPPED: LazyLock<Catalog> = LazyLock::new(|| {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        match Catalog::load(&CatalogPaths::in_dir(dir)) {
            Ok(catalog) => catalog,
            Err(err) => panic!("shipped catalog failed to load: {}", err),
        }
    });

    /// The catalog shipped in `data/`, loaded once per test binary.
    pub fn shipped_catalog() -> &'static Catalog {
        &SHIPPED
    }
}
