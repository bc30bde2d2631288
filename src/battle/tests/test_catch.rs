#[cfg(test)]
mod tests {
    use crate::battle::state::{BattleEvent, BattleOutcome, BattlePhase, PlayerAction, Side};
    use crate::battle::tests::common::{assert_ok, move_order, party_of, Arena, TestMonsterBuilder};
    use crate::errors::{ActionError, BattleError};
    use crate::monster::StatusCondition;
    use crate::rng::ScriptedRng;
    use pretty_assertions::assert_eq;
    use schema::Item;

    #[test]
    fn test_trainer_monsters_cannot_be_captured() {
        // Arrange
        let ignis = TestMonsterBuilder::new("ignis", 10).with_moves(&["scratch"]).build();
        let team = vec![TestMonsterBuilder::new("leafkin", 10).with_moves(&["tackle"]).build()];
        let mut arena = Arena::trainer(ignis, team);
        // Only the opponent's damage variance may be drawn
        let mut rng = ScriptedRng::new(vec![0.5]);

        // Act
        let bus = assert_ok(arena.turn(PlayerAction::AttemptCapture { item: Item::NetBall }, &mut rng));

        // Assert
        assert!(bus.events().contains(&BattleEvent::CaptureBlocked));
        assert!(!bus.events().iter().any(|e| matches!(e, BattleEvent::CaptureSucceeded { .. })));
        assert_eq!(arena.inventory.count(Item::NetBall), 4);
        assert_eq!(arena.party.len(), 1);
        assert_eq!(arena.battle.opponents.len(), 1);
        assert_eq!(arena.battle.phase, BattlePhase::Active);
        assert_eq!(move_order(&bus), vec![Side::Opponent]);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_successful_capture_joins_party() {
        // Arrange: Gustwing at full HP, 255 / 3 / 3 / 255 = 1/9
        let ignis = TestMonsterBuilder::new("ignis", 10).with_moves(&["scratch"]).build();
        let gustwing = TestMonsterBuilder::new("gustwing", 5).with_moves(&["tackle"]).build();
        let mut arena = Arena::wild(ignis, gustwing);
        let mut rng = ScriptedRng::new(vec![0.05]);

        // Act
        let bus = assert_ok(arena.turn(PlayerAction::AttemptCapture { item: Item::NetBall }, &mut rng));

        // Assert
        assert!(bus.events().contains(&BattleEvent::CaptureSucceeded {
            target: "Gustwing".to_string(),
        }));
        assert!(bus.events().contains(&BattleEvent::BattleEnded {
            outcome: BattleOutcome::Captured,
        }));
        assert!(move_order(&bus).is_empty());
        assert_eq!(arena.battle.phase, BattlePhase::Captured);
        assert_eq!(arena.party.len(), 2);
        assert_eq!(arena.party.get(1).unwrap().name, "Gustwing");
        assert_eq!(arena.party.get(1).unwrap().level, 5);
        assert_eq!(arena.inventory.count(Item::NetBall), 4);
        assert!(arena.battle.opponents.is_empty());
    }

    #[test]
    fn test_failed_capture_lets_opponent_act() {
        let ignis = TestMonsterBuilder::new("ignis", 10).with_moves(&["scratch"]).build();
        let gustwing = TestMonsterBuilder::new("gustwing", 5).with_moves(&["tackle"]).build();
        let mut arena = Arena::wild(ignis, gustwing);
        // catch roll above 1/9, then opponent variance
        let mut rng = ScriptedRng::new(vec![0.5, 0.5]);

        let bus = assert_ok(arena.turn(PlayerAction::AttemptCapture { item: Item::NetBall }, &mut rng));

        assert!(bus.events().contains(&BattleEvent::CaptureFailed {
            target: "Gustwing".to_string(),
        }));
        assert_eq!(move_order(&bus), vec![Side::Opponent]);
        assert_eq!(arena.battle.phase, BattlePhase::Active);
        assert_eq!(arena.battle.turn_number, 2);
        assert_eq!(arena.party.len(), 1);
        assert_eq!(arena.inventory.count(Item::NetBall), 4);
    }

    #[test]
    fn test_weakened_sleeping_target_is_a_sure_catch() {
        // 255 * 2.0 (sleep) * 2.0 (ultra) * ~1.0 / 3 caps at 255
        let ignis = TestMonsterBuilder::new("ignis", 10).with_moves(&["scratch"]).build();
        let gustwing = TestMonsterBuilder::new("gustwing", 5)
            .with_moves(&["tackle"])
            .with_hp(1)
            .with_status(StatusCondition::Sleep(2))
            .build();
        let mut arena = Arena::wild(ignis, gustwing);
        arena.inventory.add(Item::UltraNet, 1);
        let mut rng = ScriptedRng::new(vec![]);

        let bus = assert_ok(arena.turn(PlayerAction::AttemptCapture { item: Item::UltraNet }, &mut rng));

        assert!(bus.events().contains(&BattleEvent::CaptureSucceeded {
            target: "Gustwing".to_string(),
        }));
        assert_eq!(arena.inventory.count(Item::UltraNet), 0);
        // Caught as-is
        assert_eq!(arena.party.get(1).unwrap().current_hp, 1);
    }

    #[test]
    fn test_capture_rejected_when_party_full() {
        let members = (0..6)
            .map(|_| TestMonsterBuilder::new("ignis", 10).build())
            .collect();
        let party = party_of(members);
        let gustwing = TestMonsterBuilder::new("gustwing", 5).build();
        let battle = crate::battle::tests::common::wild_battle(&party, gustwing);
        let mut arena = Arena {
            battle,
            party,
            inventory: Default::default(),
        };
        let mut rng = ScriptedRng::new(vec![]);

        let result = arena.turn(PlayerAction::AttemptCapture { item: Item::NetBall }, &mut rng);

        assert_eq!(result.map(|_| ()), Err(BattleError::Action(ActionError::PartyFull)));
        assert_eq!(arena.inventory.count(Item::NetBall), 5);
        assert_eq!(arena.battle.turn_number, 1);
    }

    #[test]
    fn test_capture_without_nets_is_rejected() {
        let ignis = TestMonsterBuilder::new("ignis", 10).build();
        let gustwing = TestMonsterBuilder::new("gustwing", 5).build();
        let mut arena = Arena::wild(ignis, gustwing);
        let mut rng = ScriptedRng::new(vec![]);

        let result = arena.turn(PlayerAction::AttemptCapture { item: Item::GreatNet }, &mut rng);

        assert_eq!(
            result.map(|_| ()),
            Err(BattleError::Action(ActionError::ItemMissing(Item::GreatNet)))
        );
    }
}
