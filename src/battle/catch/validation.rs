use crate::battle::state::{Battle, BattleKind};
use crate::errors::{ActionError, BattleResult, InvalidStateError};
use crate::party::{Inventory, Party};
use schema::Item;

/// Check if catch attempts can succeed in this kind of battle.
pub fn is_catch_allowed(kind: BattleKind) -> bool {
    matches!(kind, BattleKind::Wild)
}

/// Validate a capture attempt and return the net's strength.
///
/// Trainer battles pass validation: the net is thrown and fails.
pub fn validate_capture(
    battle: &Battle,
    party: &Party,
    inventory: &Inventory,
    item: Item,
) -> BattleResult<f64> {
    let strength = item
        .capture_strength()
        .ok_or(ActionError::WrongItem(item))?;
    if !inventory.has(item) {
        return Err(ActionError::ItemMissing(item).into());
    }
    if party.is_full() {
        return Err(ActionError::PartyFull.into());
    }
    match battle.opponent() {
        Some(target) if target.is_fainted() => {
            Err(InvalidStateError::Fainted(target.name.clone()).into())
        }
        Some(_) => Ok(strength),
        None => Err(InvalidStateError::BattleOver.into()),
    }
}
