//! Tile map, movement and encounter rolls.

use crate::catalog::Catalog;
use crate::errors::{DataError, DataResult, GameResult, InvalidStateError, NotFoundError};
use crate::monster::Monster;
use crate::rng::RandomSource;
use crate::session::Session;
use schema::{AreaId, SpeciesId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Chance that stepping onto an encounter tile starts a wild battle.
pub const ENCOUNTER_RATE: f64 = 0.10;
pub const TRAINER_TEAM_SIZE: usize = 2;
pub const TRAINER_MIN_LEVEL: u32 = 3;
pub const TRAINER_MAX_LEVEL: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// The neighbouring position, or `None` past the top or left edge.
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.delta();
        Some(Position {
            x: self.x.checked_add_signed(dx as isize)?,
            y: self.y.checked_add_signed(dy as isize)?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const fn delta(&self) -> (i8, i8) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Wall,
    Grass,
    Path,
    Water,
    Cave,
    Center,
}

impl Tile {
    pub fn glyph(self) -> char {
        match self {
            Tile::Wall => '#',
            Tile::Grass => '.',
            Tile::Path => '=',
            Tile::Water => '~',
            Tile::Cave => '^',
            Tile::Center => 'C',
        }
    }

    pub fn is_blocking(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Encounter table this tile rolls against, if any.
    pub fn area(self) -> Option<AreaId> {
        match self {
            Tile::Grass => Some(AreaId::new("grass")),
            Tile::Water => Some(AreaId::new("water")),
            Tile::Cave => Some(AreaId::new("cave")),
            Tile::Wall | Tile::Path | Tile::Center => None,
        }
    }
}

/// What a glyph places on the map. Start and trainer markers stand on plain ground.
enum Glyph {
    Terrain(Tile),
    Start,
    Trainer,
}

fn parse_glyph(c: char) -> Option<Glyph> {
    Some(match c {
        '#' => Glyph::Terrain(Tile::Wall),
        '.' => Glyph::Terrain(Tile::Grass),
        '=' => Glyph::Terrain(Tile::Path),
        '~' => Glyph::Terrain(Tile::Water),
        '^' => Glyph::Terrain(Tile::Cave),
        'C' => Glyph::Terrain(Tile::Center),
        'P' => Glyph::Start,
        'T' => Glyph::Trainer,
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    pub id: String,
    width: usize,
    height: usize,
    tiles: Vec<Vec<Tile>>,
    pub start: Position,
    pub trainer_spots: Vec<Position>,
}

impl TileMap {
    /// Parse a map, one row per line. Short rows are padded with walls.
    pub fn parse(map_id: &str, text: &str) -> DataResult<TileMap> {
        let invalid = |details: String| DataError::InvalidMap {
            map_id: map_id.to_string(),
            details,
        };

        let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if width == 0 {
            return Err(invalid("map is empty".to_string()));
        }

        let mut start = None;
        let mut trainer_spots = Vec::new();
        let mut tiles = Vec::with_capacity(lines.len());
        for (y, line) in lines.iter().enumerate() {
            let mut row = Vec::with_capacity(width);
            for (x, c) in line.chars().enumerate() {
                let glyph = parse_glyph(c)
                    .ok_or_else(|| invalid(format!("unknown glyph '{}' at ({}, {})", c, x, y)))?;
                row.push(match glyph {
                    Glyph::Terrain(tile) => tile,
                    Glyph::Start => {
                        if start.replace(Position::new(x, y)).is_some() {
                            return Err(invalid("more than one player start".to_string()));
                        }
                        Tile::Path
                    }
                    Glyph::Trainer => {
                        trainer_spots.push(Position::new(x, y));
                        Tile::Path
                    }
                });
            }
            row.resize(width, Tile::Wall);
            tiles.push(row);
        }

        let start = start.ok_or_else(|| invalid("no player start 'P'".to_string()))?;
        Ok(TileMap {
            id: map_id.to_string(),
            width,
            height: tiles.len(),
            tiles,
            start,
            trainer_spots,
        })
    }

    pub fn load(map_id: &str, path: &Path) -> DataResult<TileMap> {
        if !path.exists() {
            return Err(DataError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::parse(map_id, &text)?;
        tracing::info!(map = map_id, width = map.width, height = map.height, "map loaded");
        Ok(map)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Off-map coordinates are walls.
    pub fn tile_at(&self, pos: Position) -> Tile {
        self.tiles
            .get(pos.y)
            .and_then(|row| row.get(pos.x))
            .copied()
            .unwrap_or(Tile::Wall)
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }
}

/// An NPC trainer standing on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Trainer {
    pub position: Position,
    pub team: Vec<Monster>,
}

/// The loaded map plus the trainers placed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Overworld {
    pub map: TileMap,
    pub trainers: BTreeMap<Position, Trainer>,
}

impl Overworld {
    /// Place a trainer with a fixed random team on every trainer spot.
    pub fn populate(
        map: TileMap,
        catalog: &Catalog,
        rng: &mut dyn RandomSource,
    ) -> Result<Overworld, NotFoundError> {
        // Never empty: a catalog without species fails validation.
        let pool: Vec<SpeciesId> = catalog.species_ids().into_iter().cloned().collect();
        let mut trainers = BTreeMap::new();
        for &position in &map.trainer_spots {
            let mut team = Vec::with_capacity(TRAINER_TEAM_SIZE);
            for _ in 0..TRAINER_TEAM_SIZE {
                let species = &pool[rng.pick_index(pool.len(), "trainer species")];
                let level =
                    rng.range_inclusive(TRAINER_MIN_LEVEL, TRAINER_MAX_LEVEL, "trainer level");
                team.push(Monster::instantiate(catalog, species, level as u8)?);
            }
            tracing::debug!(%position, team = ?team.iter().map(|m| &m.name).collect::<Vec<_>>(), "trainer placed");
            trainers.insert(position, Trainer { position, team });
        }
        Ok(Overworld { map, trainers })
    }

    pub fn trainer_at(&self, pos: Position) -> Option<&Trainer> {
        self.trainers.get(&pos)
    }
}

/// Result of one step on the overworld.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Blocked,
    Moved,
    Healed,
    WildEncounter(Monster),
    TrainerChallenge(Position),
}

/// Move the player one tile and resolve whatever the new tile triggers.
pub fn step(
    direction: Direction,
    session: &mut Session,
    catalog: &Catalog,
    rng: &mut dyn RandomSource,
) -> GameResult<StepOutcome> {
    if session.party.is_empty() {
        return Err(InvalidStateError::EmptyParty.into());
    }
    if session.battle.is_some() {
        return Err(InvalidStateError::BattleInProgress.into());
    }

    let Some(target) = session.position.step(direction) else {
        return Ok(StepOutcome::Blocked);
    };
    let tile = session.world.map.tile_at(target);
    if tile.is_blocking() {
        return Ok(StepOutcome::Blocked);
    }
    session.position = target;

    if tile == Tile::Center {
        session.party.heal_all();
        tracing::debug!(position = %target, "party healed");
        return Ok(StepOutcome::Healed);
    }

    if session.world.trainer_at(target).is_some() && !session.defeated_trainers.contains(&target) {
        return Ok(StepOutcome::TrainerChallenge(target));
    }

    if let Some(area) = tile.area() {
        if let Some(wild) = roll_encounter(&area, catalog, rng)? {
            tracing::debug!(position = %target, %area, species = %wild.species, level = wild.level, "wild encounter");
            return Ok(StepOutcome::WildEncounter(wild));
        }
    }

    Ok(StepOutcome::Moved)
}

/// Roll the encounter chance for `area` and pick a monster from its table.
/// Areas without a table never produce encounters.
pub fn roll_encounter(
    area: &AreaId,
    catalog: &Catalog,
    rng: &mut dyn RandomSource,
) -> Result<Option<Monster>, NotFoundError> {
    if !catalog.has_area(area) {
        return Ok(None);
    }
    if !rng.chance(ENCOUNTER_RATE, "encounter roll") {
        return Ok(None);
    }

    let table = catalog.lookup_area(area)?;
    let roll = rng.range_inclusive(0, table.total_weight().saturating_sub(1), "encounter slot");
    let Some(slot) = table.slot_for_roll(roll) else {
        return Ok(None);
    };
    let level = rng.range_inclusive(slot.min_level as u32, slot.max_level as u32, "wild level");
    Monster::instantiate(catalog, &slot.species, level as u8).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::shipped_catalog;
    use crate::party::{Inventory, Party};
    use crate::rng::ScriptedRng;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    const SMALL_MAP: &str = "\
#####
#P.C#
#=~T#
#^
";

    fn session_on(text: &str) -> Session {
        let map = TileMap::parse("test", text).unwrap();
        let mut rng = ScriptedRng::constant(0.0);
        let world = Overworld::populate(map, shipped_catalog(), &mut rng).unwrap();
        let starter = Monster::instantiate(shipped_catalog(), &SpeciesId::new("ignis"), 5).unwrap();
        Session {
            position: world.map.start,
            world,
            party: Party::from_members(vec![starter]).unwrap(),
            inventory: Inventory::default(),
            defeated_trainers: BTreeSet::new(),
            battle: None,
        }
    }

    #[test]
    fn test_parse_pads_short_rows_with_walls() {
        let map = TileMap::parse("test", SMALL_MAP).unwrap();
        assert_eq!(map.width(), 5);
        assert_eq!(map.height(), 4);
        assert_eq!(map.tile_at(Position::new(1, 3)), Tile::Cave);
        assert_eq!(map.tile_at(Position::new(2, 3)), Tile::Wall);
        assert_eq!(map.tile_at(Position::new(4, 3)), Tile::Wall);
    }

    #[test]
    fn test_parse_records_start_and_trainers() {
        let map = TileMap::parse("test", SMALL_MAP).unwrap();
        assert_eq!(map.start, Position::new(1, 1));
        assert_eq!(map.trainer_spots, vec![Position::new(3, 2)]);
        assert_eq!(map.tile_at(map.start), Tile::Path);
    }

    #[test]
    fn test_off_map_is_wall() {
        let map = TileMap::parse("test", SMALL_MAP).unwrap();
        assert_eq!(map.tile_at(Position::new(50, 1)), Tile::Wall);
        assert_eq!(map.tile_at(Position::new(1, 50)), Tile::Wall);
        assert_eq!(Position::new(0, 0).step(Direction::Up), None);
    }

    #[test]
    fn test_unknown_glyph_is_a_data_error() {
        let err = TileMap::parse("bad", "#P?#").unwrap_err();
        assert!(matches!(err, DataError::InvalidMap { ref details, .. } if details.contains('?')));
    }

    #[test]
    fn test_map_needs_a_start() {
        assert!(matches!(
            TileMap::parse("bad", "#..#"),
            Err(DataError::InvalidMap { .. })
        ));
    }

    #[test]
    fn test_shipped_map_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("maps/overworld.txt");
        let map = TileMap::load("overworld", &path).unwrap();
        assert_eq!(map.start, Position::new(1, 1));
        assert_eq!(map.trainer_spots.len(), 3);
    }

    #[test]
    fn test_trainers_get_two_monsters_in_level_range() {
        let session = session_on(SMALL_MAP);
        let trainer = session.world.trainer_at(Position::new(3, 2)).unwrap();
        assert_eq!(trainer.team.len(), TRAINER_TEAM_SIZE);
        for monster in &trainer.team {
            assert!((3..=6).contains(&monster.level));
        }
    }

    #[test]
    fn test_blocked_step_is_a_no_op() {
        let mut session = session_on(SMALL_MAP);
        let before = session.position;
        let mut rng = ScriptedRng::new(vec![]);

        let outcome = step(Direction::Up, &mut session, shipped_catalog(), &mut rng).unwrap();

        assert_eq!(outcome, StepOutcome::Blocked);
        assert_eq!(session.position, before);
    }

    #[test]
    fn test_center_heals_without_a_roll() {
        let mut session = session_on(SMALL_MAP);
        session.position = Position::new(2, 1);
        session.party.get_mut(0).unwrap().current_hp = 1;
        let mut rng = ScriptedRng::new(vec![]);

        let outcome = step(Direction::Right, &mut session, shipped_catalog(), &mut rng).unwrap();

        assert_eq!(outcome, StepOutcome::Healed);
        let starter = session.party.get(0).unwrap();
        assert_eq!(starter.current_hp, starter.max_hp());
    }

    #[test]
    fn test_grass_encounter_rolls() {
        let mut session = session_on(SMALL_MAP);
        // encounter roll hits, first slot (gustwing), lowest level
        let mut rng = ScriptedRng::new(vec![0.05, 0.0, 0.0]);

        let outcome = step(Direction::Right, &mut session, shipped_catalog(), &mut rng).unwrap();

        match outcome {
            StepOutcome::WildEncounter(wild) => {
                assert_eq!(wild.species, SpeciesId::new("gustwing"));
                assert_eq!(wild.level, 2);
            }
            other => panic!("expected an encounter, got {:?}", other),
        }
        assert_eq!(session.position, Position::new(2, 1));
    }

    #[test]
    fn test_grass_without_encounter_just_moves() {
        let mut session = session_on(SMALL_MAP);
        let mut rng = ScriptedRng::new(vec![0.5]);
        let outcome = step(Direction::Right, &mut session, shipped_catalog(), &mut rng).unwrap();
        assert_eq!(outcome, StepOutcome::Moved);
    }

    #[test]
    fn test_path_never_rolls() {
        let mut session = session_on(SMALL_MAP);
        let mut rng = ScriptedRng::new(vec![]);
        let outcome = step(Direction::Down, &mut session, shipped_catalog(), &mut rng).unwrap();
        assert_eq!(outcome, StepOutcome::Moved);
    }

    #[test]
    fn test_undefeated_trainer_challenges() {
        let mut session = session_on(SMALL_MAP);
        session.position = Position::new(2, 2);
        let mut rng = ScriptedRng::new(vec![]);

        let outcome = step(Direction::Right, &mut session, shipped_catalog(), &mut rng).unwrap();
        assert_eq!(outcome, StepOutcome::TrainerChallenge(Position::new(3, 2)));

        session.defeated_trainers.insert(Position::new(3, 2));
        session.position = Position::new(2, 2);
        let outcome = step(Direction::Right, &mut session, shipped_catalog(), &mut rng).unwrap();
        assert_eq!(outcome, StepOutcome::Moved);
    }

    #[test]
    fn test_empty_party_cannot_move() {
        let mut session = session_on(SMALL_MAP);
        session.party = Party::new();
        let mut rng = ScriptedRng::new(vec![]);
        let err = step(Direction::Right, &mut session, shipped_catalog(), &mut rng).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::GameError::InvalidState(InvalidStateError::EmptyParty)
        ));
    }
}
