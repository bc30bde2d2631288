use crate::battle::state::{Battle, BattleEvent, BattleKind, EventBus, Side};
use crate::catalog::test_support::shipped_catalog;
use crate::catalog::Catalog;
use crate::errors::BattleResult;
use crate::monster::{Monster, MoveSlot, StatusCondition};
use crate::party::{Inventory, Party};
use crate::rng::ScriptedRng;
use schema::{MoveId, SpeciesId};

/// A builder for creating test monsters with common defaults.
///
/// # Example
/// ```ignore
/// let leafkin = TestMonsterBuilder::new("leafkin", 10)
///     .with_moves(&["tackle"])
///     .with_status(StatusCondition::Paralysis)
///     .build();
/// ```
pub struct TestMonsterBuilder {
    species: &'static str,
    level: u8,
    moves: Option<Vec<&'static str>>,
    status: Option<StatusCondition>,
    current_hp: Option<u16>,
}

impl TestMonsterBuilder {
    pub fn new(species: &'static str, level: u8) -> Self {
        Self {
            species,
            level,
            moves: None,
            status: None,
            current_hp: None,
        }
    }

    /// Replace the learnset moves with these move ids.
    pub fn with_moves(mut self, moves: &[&'static str]) -> Self {
        self.moves = Some(moves.to_vec());
        self
    }

    pub fn with_status(mut self, status: StatusCondition) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the current HP. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn build(self) -> Monster {
        let catalog = test_catalog();
        let mut monster = match Monster::instantiate(catalog, &SpeciesId::new(self.species), self.level) {
            Ok(m) => m,
            Err(err) => panic!("Failed to build {}: {}", self.species, err),
        };

        if let Some(moves) = self.moves {
            monster.moves = moves
                .iter()
                .map(|id| match catalog.lookup_move(&MoveId::new(*id)) {
                    Ok(data) => MoveSlot::new(data),
                    Err(err) => panic!("Unknown test move {}: {}", id, err),
                })
                .collect();
        }
        monster.status = self.status;
        if let Some(hp) = self.current_hp {
            monster.current_hp = hp.min(monster.max_hp());
        }
        monster
    }
}

pub fn test_catalog() -> &'static Catalog {
    shipped_catalog()
}

pub fn party_of(members: Vec<Monster>) -> Party {
    match Party::from_members(members) {
        Ok(party) => party,
        Err(err) => panic!("bad test party: {}", err),
    }
}

/// A wild battle against one monster.
pub fn wild_battle(party: &Party, wild: Monster) -> Battle {
    match Battle::start(party, vec![wild], BattleKind::Wild) {
        Ok(battle) => battle,
        Err(err) => panic!("battle failed to start: {}", err),
    }
}

pub fn trainer_battle(party: &Party, team: Vec<Monster>) -> Battle {
    match Battle::start(party, team, BattleKind::Trainer) {
        Ok(battle) => battle,
        Err(err) => panic!("battle failed to start: {}", err),
    }
}

/// Player, opponent and bag for a one-on-one fight.
pub struct Arena {
    pub battle: Battle,
    pub party: Party,
    pub inventory: Inventory,
}

impl Arena {
    pub fn wild(player: Monster, wild: Monster) -> Self {
        let party = party_of(vec![player]);
        let battle = wild_battle(&party, wild);
        Arena {
            battle,
            party,
            inventory: Inventory::default(),
        }
    }

    pub fn trainer(player: Monster, team: Vec<Monster>) -> Self {
        let party = party_of(vec![player]);
        let battle = trainer_battle(&party, team);
        Arena {
            battle,
            party,
            inventory: Inventory::default(),
        }
    }

    pub fn turn(
        &mut self,
        action: crate::battle::state::PlayerAction,
        rng: &mut ScriptedRng,
    ) -> BattleResult<EventBus> {
        let result = self.battle.resolve_turn(
            test_catalog(),
            &mut self.party,
            &mut self.inventory,
            action,
            rng,
        );
        if let Ok(bus) = &result {
            bus.print_for_test();
        }
        result
    }

    pub fn player(&self) -> &Monster {
        match self.party.get(self.battle.player_active) {
            Some(m) => m,
            None => panic!("no active player monster"),
        }
    }

    pub fn opponent(&self) -> &Monster {
        match self.battle.opponent() {
            Some(m) => m,
            None => panic!("no active opponent"),
        }
    }
}

impl EventBus {
    fn print_for_test(&self) {
        for event in self.events() {
            println!("  {:?}", event);
        }
    }
}

/// Sides in the order they used a move this turn.
pub fn move_order(bus: &EventBus) -> Vec<Side> {
    bus.events()
        .iter()
        .filter_map(|e| match e {
            BattleEvent::MoveUsed { side, .. } => Some(*side),
            _ => None,
        })
        .collect()
}

/// Damage dealt to `side` this turn, summed.
pub fn damage_to(bus: &EventBus, target_side: Side) -> u16 {
    bus.events()
        .iter()
        .filter_map(|e| match e {
            BattleEvent::DamageDealt { side, damage, .. } if *side == target_side => Some(*damage),
            _ => None,
        })
        .sum()
}

pub fn has_event(bus: &EventBus, pred: impl Fn(&BattleEvent) -> bool) -> bool {
    bus.events().iter().any(pred)
}

/// Helper function to assert that a Result is Ok and return the value.
pub fn assert_ok<T>(result: BattleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
