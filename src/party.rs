use crate::errors::{ActionError, InvalidStateError};
use crate::monster::Monster;
use schema::Item;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_PARTY_SIZE: usize = 6;

/// The player's ordered team. Fainted monsters stay in the party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    members: Vec<Monster>,
}

impl Party {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a party from existing monsters, rejecting more than six.
    pub fn from_members(members: Vec<Monster>) -> Result<Self, ActionError> {
        if members.len() > MAX_PARTY_SIZE {
            return Err(ActionError::PartyFull);
        }
        Ok(Party { members })
    }

    pub fn add(&mut self, monster: Monster) -> Result<usize, ActionError> {
        if self.is_full() {
            return Err(ActionError::PartyFull);
        }
        self.members.push(monster);
        Ok(self.members.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_PARTY_SIZE
    }

    pub fn get(&self, index: usize) -> Option<&Monster> {
        self.members.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Monster> {
        self.members.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monster> {
        self.members.iter()
    }

    pub fn members(&self) -> &[Monster] {
        &self.members
    }

    pub fn first_able_index(&self) -> Option<usize> {
        self.members.iter().position(|m| !m.is_fainted())
    }

    /// Next able member after `current`, wrapping to the front of the party.
    pub fn next_able_after(&self, current: usize) -> Option<usize> {
        let len = self.members.len();
        (1..=len)
            .map(|offset| (current + offset) % len)
            .find(|&i| !self.members[i].is_fainted())
    }

    pub fn has_able_member(&self) -> bool {
        self.first_able_index().is_some()
    }

    /// Ensure the party can start a battle or walk the overworld.
    pub fn require_able(&self) -> Result<usize, InvalidStateError> {
        if self.is_empty() {
            return Err(InvalidStateError::EmptyParty);
        }
        self.first_able_index()
            .ok_or(InvalidStateError::NoAbleMonster)
    }

    pub fn heal_all(&mut self) {
        for monster in &mut self.members {
            monster.heal_full();
        }
    }
}

/// Item counts carried by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<Item, u32>,
}

impl Default for Inventory {
    /// The starting bag: three potions and five nets.
    fn default() -> Self {
        let mut inventory = Inventory::empty();
        inventory.add(Item::Potion, 3);
        inventory.add(Item::NetBall, 5);
        inventory
    }
}

impl Inventory {
    pub fn empty() -> Self {
        Inventory {
            items: BTreeMap::new(),
        }
    }

    pub fn from_counts(counts: BTreeMap<Item, u32>) -> Self {
        let items = counts.into_iter().filter(|(_, n)| *n > 0).collect();
        Inventory { items }
    }

    pub fn add(&mut self, item: Item, count: u32) {
        if count == 0 {
            return;
        }
        *self.items.entry(item).or_insert(0) += count;
    }

    pub fn count(&self, item: Item) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    pub fn has(&self, item: Item) -> bool {
        self.count(item) > 0
    }

    /// Remove one `item`, failing if the bag has none.
    pub fn take(&mut self, item: Item) -> Result<(), ActionError> {
        match self.items.get_mut(&item) {
            Some(n) if *n > 0 => {
                *n -= 1;
                if *n == 0 {
                    self.items.remove(&item);
                }
                Ok(())
            }
            _ => Err(ActionError::ItemMissing(item)),
        }
    }

    pub fn counts(&self) -> &BTreeMap<Item, u32> {
        &self.items
    }
}
