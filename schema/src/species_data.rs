use crate::{ElementType, MoveId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog key for a species, e.g. `"emberling"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(pub String);

impl SpeciesId {
    pub fn new(id: impl Into<String>) -> Self {
        SpeciesId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

impl BaseStats {
    pub fn total(&self) -> u32 {
        [
            self.hp,
            self.attack,
            self.defense,
            self.sp_attack,
            self.sp_defense,
            self.speed,
        ]
        .iter()
        .map(|&s| s as u32)
        .sum()
    }
}

/// A move the species learns on reaching `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnsetEntry {
    pub level: u8,
    pub move_id: MoveId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesData {
    pub id: SpeciesId,
    pub name: String,
    pub types: Vec<ElementType>,
    pub base_stats: BaseStats,
    #[serde(default)]
    pub learnset: Vec<LearnsetEntry>,
    /// Capture difficulty, 1-255. Higher is easier to catch.
    pub catch_rate: u8,
    pub base_exp: u16,
    #[serde(default)]
    pub description: String,
}

impl SpeciesData {
    /// Moves learned at exactly `level`, in file order.
    pub fn learns_at_level(&self, level: u8) -> impl Iterator<Item = &MoveId> {
        self.learnset
            .iter()
            .filter(move |entry| entry.level == level)
            .map(|entry| &entry.move_id)
    }

    /// All moves learned at or below `level`, ordered by learn level (stable for ties).
    pub fn moves_known_by_level(&self, level: u8) -> Vec<&MoveId> {
        let mut entries: Vec<&LearnsetEntry> =
            self.learnset.iter().filter(|e| e.level <= level).collect();
        entries.sort_by_key(|e| e.level);
        entries.into_iter().map(|e| &e.move_id).collect()
    }

    pub fn has_type(&self, element: ElementType) -> bool {
        self.types.contains(&element)
    }
}
