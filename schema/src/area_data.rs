use crate::SpeciesId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog key for an encounter area, e.g. `"grass"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub String);

impl AreaId {
    pub fn new(id: impl Into<String>) -> Self {
        AreaId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSlot {
    pub species: SpeciesId,
    pub min_level: u8,
    pub max_level: u8,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaTable {
    pub id: AreaId,
    pub slots: Vec<EncounterSlot>,
}

impl AreaTable {
    pub fn total_weight(&self) -> u32 {
        self.slots.iter().map(|s| s.weight).sum()
    }

    /// Pick the slot that owns `roll`, where `roll` is in `0..total_weight()`.
    pub fn slot_for_roll(&self, roll: u32) -> Option<&EncounterSlot> {
        let mut upto = 0;
        for slot in &self.slots {
            upto += slot.weight;
            if roll < upto {
                return Some(slot);
            }
        }
        None
    }
}
