#[cfg(test)]
mod tests {
    use crate::battle::state::{BattleEvent, BattleOutcome, BattlePhase, PlayerAction, Side};
    use crate::battle::tests::common::{assert_ok, move_order, Arena, TestMonsterBuilder};
    use crate::errors::{ActionError, BattleError};
    use crate::rng::ScriptedRng;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cannot_flee_trainer_battle() {
        // Arrange
        let ignis = TestMonsterBuilder::new("ignis", 10).build();
        let team = vec![TestMonsterBuilder::new("leafkin", 10).build()];
        let mut arena = Arena::trainer(ignis, team);
        let mut rng = ScriptedRng::new(vec![]);

        // Act
        let result = arena.turn(PlayerAction::Flee, &mut rng);

        // Assert: rejected before the turn starts
        assert_eq!(result.map(|_| ()), Err(BattleError::Action(ActionError::CannotFlee)));
        assert_eq!(arena.battle.turn_number, 1);
        assert_eq!(arena.battle.phase, BattlePhase::Active);
        assert_eq!(arena.player().current_hp, arena.player().max_hp());
    }

    #[test]
    fn test_much_faster_monster_always_escapes() {
        // Voltkit 23 vs Pebblit 9: 0.5 * 23 / 9 > 1, nothing drawn
        let voltkit = TestMonsterBuilder::new("voltkit", 10).build();
        let pebblit = TestMonsterBuilder::new("pebblit", 10).with_moves(&["tackle"]).build();
        let mut arena = Arena::wild(voltkit, pebblit);
        let mut rng = ScriptedRng::new(vec![]);

        let bus = assert_ok(arena.turn(PlayerAction::Flee, &mut rng));

        assert!(bus.events().contains(&BattleEvent::FleeSucceeded));
        assert!(bus.events().contains(&BattleEvent::BattleEnded {
            outcome: BattleOutcome::Fled,
        }));
        assert!(move_order(&bus).is_empty());
        assert_eq!(arena.battle.phase, BattlePhase::Fled);
    }

    #[test]
    fn test_failed_flee_raises_the_next_chance() {
        // Arrange: Leafkin 13 vs Voltkit 23, p = 0.2826
        let leafkin = TestMonsterBuilder::new("leafkin", 10).build();
        let voltkit = TestMonsterBuilder::new("voltkit", 10).with_moves(&["tackle"]).build();
        let mut arena = Arena::wild(leafkin, voltkit);
        // flee roll fails, opponent variance, second flee roll under 0.3826
        let mut rng = ScriptedRng::new(vec![0.9, 0.5, 0.35]);

        // Act: first attempt
        let first = assert_ok(arena.turn(PlayerAction::Flee, &mut rng));

        // Assert
        assert!(first.events().contains(&BattleEvent::FleeFailed));
        assert_eq!(move_order(&first), vec![Side::Opponent]);
        assert_eq!(arena.battle.failed_flee_attempts, 1);

        // Act: second attempt would fail at the base chance but succeeds with the bonus
        let second = assert_ok(arena.turn(PlayerAction::Flee, &mut rng));

        // Assert
        assert!(second.events().contains(&BattleEvent::FleeSucceeded));
        assert_eq!(arena.battle.phase, BattlePhase::Fled);
        assert_eq!(rng.remaining(), 0);
    }
}
