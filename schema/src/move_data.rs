use crate::ElementType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog key for a move, e.g. `"ember"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveId(pub String);

impl MoveId {
    pub fn new(id: impl Into<String>) -> Self {
        MoveId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveCategory::Physical => write!(f, "Physical"),
            MoveCategory::Special => write!(f, "Special"),
            MoveCategory::Status => write!(f, "Status"),
        }
    }
}

/// Non-volatile status a move can inflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Poison,
    Paralysis,
    Sleep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveEffect {
    /// Inflict `status` on the target with `chance` percent, if it has no status yet.
    InflictStatus { status: StatusKind, chance: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveData {
    pub id: MoveId,
    pub name: String,
    pub move_type: ElementType,
    pub category: MoveCategory,
    #[serde(default)]
    pub power: u16,
    /// Hit chance in percent; 100 never misses.
    #[serde(default = "default_accuracy")]
    pub accuracy: u8,
    /// Uses available per battle before a heal.
    pub max_uses: u8,
    #[serde(default)]
    pub priority: i8,
    #[serde(default)]
    pub effect: Option<MoveEffect>,
}

fn default_accuracy() -> u8 {
    100
}

impl MoveData {
    pub fn is_damaging(&self) -> bool {
        !matches!(self.category, MoveCategory::Status)
    }
}
