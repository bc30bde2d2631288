use crate::catalog::{Catalog, MAX_LEVEL};
use crate::errors::{ActionError, BattleResult, InvalidStateError, NotFoundError};
use schema::{BaseStats, ElementType, MoveData, MoveId, SpeciesId, StatusKind};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_MOVES: usize = 4;

/// Stats derived from species base stats and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub max_hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

impl StatBlock {
    /// HP = 2*base*level/100 + level + 10, others = 2*base*level/100 + 5.
    pub fn compute(base: &BaseStats, level: u8) -> Self {
        let level = level as u32;
        let scaled = |b: u16| 2 * b as u32 * level / 100;
        let other = |b: u16| (scaled(b) + 5).min(u16::MAX as u32) as u16;
        StatBlock {
            max_hp: (scaled(base.hp) + level + 10).min(u16::MAX as u32) as u16,
            attack: other(base.attack),
            defense: other(base.defense),
            sp_attack: other(base.sp_attack),
            sp_defense: other(base.sp_defense),
            speed: other(base.speed),
        }
    }
}

/// A known move with its remaining uses for the current battle cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub move_id: MoveId,
    pub remaining_uses: u8,
    pub max_uses: u8,
}

impl MoveSlot {
    pub fn new(move_data: &MoveData) -> Self {
        MoveSlot {
            move_id: move_data.id.clone(),
            remaining_uses: move_data.max_uses,
            max_uses: move_data.max_uses,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.remaining_uses > 0
    }

    pub fn restore(&mut self) {
        self.remaining_uses = self.max_uses;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCondition {
    Poison,
    Paralysis,
    /// Remaining turns of sleep.
    Sleep(u8),
}

impl StatusCondition {
    pub fn kind(&self) -> StatusKind {
        match self {
            StatusCondition::Poison => StatusKind::Poison,
            StatusCondition::Paralysis => StatusKind::Paralysis,
            StatusCondition::Sleep(_) => StatusKind::Sleep,
        }
    }

    /// Multiplier applied to the capture rate.
    pub fn capture_bonus(status: Option<&StatusCondition>) -> f64 {
        match status {
            Some(StatusCondition::Sleep(_)) => 2.0,
            Some(StatusCondition::Poison) | Some(StatusCondition::Paralysis) => 1.5,
            None => 1.0,
        }
    }
}

impl fmt::Display for StatusCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCondition::Poison => write!(f, "PSN"),
            StatusCondition::Paralysis => write!(f, "PAR"),
            StatusCondition::Sleep(_) => write!(f, "SLP"),
        }
    }
}

/// Something that happened while a monster gained experience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    LeveledUp {
        name: String,
        level: u8,
    },
    LearnedMove {
        name: String,
        move_id: MoveId,
        forgot: Option<MoveId>,
    },
}

/// Experience needed to reach `level`.
pub fn exp_for_level(level: u8) -> u32 {
    (level as u32).pow(3)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub species: SpeciesId,
    pub name: String,
    pub level: u8,
    pub experience: u32,
    pub stats: StatBlock,
    pub current_hp: u16,
    pub moves: Vec<MoveSlot>,
    pub status: Option<StatusCondition>,
}

impl Monster {
    /// Create a fresh monster of `species_id` at `level`, knowing its most recent learnset moves.
    pub fn instantiate(
        catalog: &Catalog,
        species_id: &SpeciesId,
        level: u8,
    ) -> Result<Monster, NotFoundError> {
        let species = catalog.lookup_species(species_id)?;
        let level = level.clamp(1, MAX_LEVEL);
        let stats = StatBlock::compute(&species.base_stats, level);

        let known = species.moves_known_by_level(level);
        let skip = known.len().saturating_sub(MAX_MOVES);
        let mut moves = Vec::with_capacity(MAX_MOVES);
        for move_id in known.into_iter().skip(skip) {
            if moves.iter().any(|slot: &MoveSlot| &slot.move_id == move_id) {
                continue;
            }
            moves.push(MoveSlot::new(catalog.lookup_move(move_id)?));
        }

        Ok(Monster {
            species: species.id.clone(),
            name: species.name.clone(),
            level,
            experience: exp_for_level(level),
            stats,
            current_hp: stats.max_hp,
            moves,
            status: None,
        })
    }

    pub fn max_hp(&self) -> u16 {
        self.stats.max_hp
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    pub fn types<'a>(&self, catalog: &'a Catalog) -> Result<&'a [ElementType], NotFoundError> {
        Ok(&catalog.lookup_species(&self.species)?.types)
    }

    /// Subtract `amount` HP, clamping at zero. Returns the HP actually lost.
    pub fn apply_damage(&mut self, amount: u16) -> Result<u16, InvalidStateError> {
        if self.is_fainted() {
            return Err(InvalidStateError::Fainted(self.name.clone()));
        }
        let dealt = amount.min(self.current_hp);
        self.current_hp -= dealt;
        if self.is_fainted() {
            tracing::debug!(monster = %self.name, "fainted");
        }
        Ok(dealt)
    }

    /// Restore up to `amount` HP. Fainted monsters are not revived. Returns the HP restored.
    pub fn heal(&mut self, amount: u16) -> u16 {
        if self.is_fainted() {
            return 0;
        }
        let restored = amount.min(self.max_hp() - self.current_hp);
        self.current_hp += restored;
        restored
    }

    /// Full restore: HP, status and move uses. Revives fainted monsters.
    pub fn heal_full(&mut self) {
        self.current_hp = self.max_hp();
        self.status = None;
        for slot in &mut self.moves {
            slot.restore();
        }
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Validate that the move in `index` can be used right now.
    pub fn select_move(&self, index: usize) -> BattleResult<&MoveSlot> {
        if self.is_fainted() {
            return Err(InvalidStateError::Fainted(self.name.clone()).into());
        }
        let slot = self
            .moves
            .get(index)
            .ok_or(ActionError::InvalidMoveIndex(index))?;
        if !slot.is_usable() {
            return Err(ActionError::NoUsesLeft(slot.move_id.clone()).into());
        }
        Ok(slot)
    }

    /// Spend one use of the move in `index`. Returns false if nothing was left.
    pub fn consume_use(&mut self, index: usize) -> bool {
        match self.moves.get_mut(index) {
            Some(slot) if slot.remaining_uses > 0 => {
                slot.remaining_uses -= 1;
                true
            }
            _ => false,
        }
    }

    /// Indices of moves that still have uses left.
    pub fn usable_move_indices(&self) -> Vec<usize> {
        self.moves
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_usable())
            .map(|(i, _)| i)
            .collect()
    }

    /// Experience granted to whoever defeats this monster.
    pub fn experience_yield(&self, catalog: &Catalog) -> Result<u32, NotFoundError> {
        let species = catalog.lookup_species(&self.species)?;
        Ok((species.base_exp as u32 * self.level as u32 / 7).max(1))
    }

    /// Add experience, levelling up as many times as the thresholds allow.
    pub fn gain_experience(
        &mut self,
        catalog: &Catalog,
        amount: u32,
    ) -> Result<Vec<ProgressEvent>, NotFoundError> {
        let species = catalog.lookup_species(&self.species)?;
        let mut events = Vec::new();
        self.experience = self.experience.saturating_add(amount);

        while self.level < MAX_LEVEL && self.experience >= exp_for_level(self.level + 1) {
            self.level += 1;
            let damage_taken = self.max_hp() - self.current_hp;
            self.stats = StatBlock::compute(&species.base_stats, self.level);
            if !self.is_fainted() {
                self.current_hp = self.max_hp().saturating_sub(damage_taken).max(1);
            }
            tracing::debug!(monster = %self.name, level = self.level, "level up");
            events.push(ProgressEvent::LeveledUp {
                name: self.name.clone(),
                level: self.level,
            });

            for move_id in species.learns_at_level(self.level) {
                if self.moves.iter().any(|slot| &slot.move_id == move_id) {
                    continue;
                }
                let slot = MoveSlot::new(catalog.lookup_move(move_id)?);
                let forgot = if self.moves.len() >= MAX_MOVES {
                    Some(self.moves.remove(0).move_id)
                } else {
                    None
                };
                self.moves.push(slot);
                events.push(ProgressEvent::LearnedMove {
                    name: self.name.clone(),
                    move_id: move_id.clone(),
                    forgot,
                });
            }
        }

        Ok(events)
    }
}
