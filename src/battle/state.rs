use crate::monster::{Monster, StatusCondition};
use schema::Item;
use serde::{Deserialize, Serialize};

/// Which side of the field an event concerns.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Player,
    Opponent,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleKind {
    Wild,
    Trainer,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    Active,
    TurnResolved,
    PlayerWon,
    PlayerLost,
    Fled,
    Captured,
}

impl BattlePhase {
    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self {
            BattlePhase::PlayerWon => Some(BattleOutcome::PlayerWon),
            BattlePhase::PlayerLost => Some(BattleOutcome::PlayerLost),
            BattlePhase::Fled => Some(BattleOutcome::Fled),
            BattlePhase::Captured => Some(BattleOutcome::Captured),
            BattlePhase::Active | BattlePhase::TurnResolved => None,
        }
    }
}

/// How a finished battle ended.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    PlayerWon,
    PlayerLost,
    Fled,
    Captured,
}

/// What the player chose to do this turn.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    UseMove { move_index: usize },
    UseItem { item: Item },
    Switch { party_index: usize },
    AttemptCapture { item: Item },
    Flee,
    /// Let the turn go by. Only allowed once every move is out of uses.
    Pass,
}

impl PlayerAction {
    pub fn is_move(&self) -> bool {
        matches!(self, PlayerAction::UseMove { .. })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreventionReason {
    Asleep,
    FullyParalyzed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    TurnStarted {
        turn_number: u32,
    },
    TurnEnded,

    MoveUsed {
        side: Side,
        monster: String,
        move_name: String,
    },
    MoveMissed {
        side: Side,
        monster: String,
    },
    AttackTypeEffectiveness {
        multiplier: f64,
    },
    DamageDealt {
        side: Side,
        target: String,
        damage: u16,
        remaining_hp: u16,
    },
    MoveFailed,
    NoUsableMoves {
        side: Side,
        monster: String,
    },
    ActionPrevented {
        side: Side,
        monster: String,
        reason: PreventionReason,
    },

    StatusApplied {
        side: Side,
        target: String,
        status: StatusCondition,
    },
    StatusDamage {
        side: Side,
        target: String,
        damage: u16,
        remaining_hp: u16,
    },
    WokeUp {
        side: Side,
        monster: String,
    },

    ItemUsed {
        item: Item,
        target: String,
        restored: u16,
    },
    Switched {
        from: String,
        to: String,
    },
    SentOut {
        side: Side,
        monster: String,
    },

    CaptureAttempted {
        item: Item,
        target: String,
    },
    CaptureBlocked,
    CaptureSucceeded {
        target: String,
    },
    CaptureFailed {
        target: String,
    },
    FleeSucceeded,
    FleeFailed,

    MonsterFainted {
        side: Side,
        monster: String,
    },
    ExperienceGained {
        monster: String,
        amount: u32,
    },
    LeveledUp {
        monster: String,
        level: u8,
    },
    MoveLearned {
        monster: String,
        move_name: String,
        forgot: Option<String>,
    },

    BattleEnded {
        outcome: BattleOutcome,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, battle: &Battle) -> Option<String> {
        match self {
            BattleEvent::TurnStarted { turn_number } => Some(format!("=== Turn {} ===", turn_number)),
            BattleEvent::TurnEnded => None,

            BattleEvent::MoveUsed {
                side,
                monster,
                move_name,
            } => Some(format!(
                "{} used {}!",
                Self::label(battle, *side, monster),
                move_name
            )),
            BattleEvent::MoveMissed { side, monster } => Some(format!(
                "{}'s attack missed!",
                Self::label(battle, *side, monster)
            )),
            BattleEvent::AttackTypeEffectiveness { multiplier } => match *multiplier {
                m if m > 1.0 => Some("It's super effective!".to_string()),
                m if m < 1.0 && m > 0.0 => Some("It's not very effective...".to_string()),
                0.0 => Some("It had no effect!".to_string()),
                _ => None,
            },
            BattleEvent::DamageDealt {
                side,
                target,
                damage,
                ..
            } => Some(format!(
                "{} took {} damage!",
                Self::label(battle, *side, target),
                damage
            )),
            BattleEvent::MoveFailed => Some("But it failed!".to_string()),
            BattleEvent::NoUsableMoves { side, monster } => Some(format!(
                "{} has no moves left!",
                Self::label(battle, *side, monster)
            )),
            BattleEvent::ActionPrevented {
                side,
                monster,
                reason,
            } => {
                let who = Self::label(battle, *side, monster);
                match reason {
                    PreventionReason::Asleep => Some(format!("{} is fast asleep.", who)),
                    PreventionReason::FullyParalyzed => {
                        Some(format!("{} is fully paralyzed!", who))
                    }
                }
            }

            BattleEvent::StatusApplied {
                side,
                target,
                status,
            } => {
                let who = Self::label(battle, *side, target);
                Some(match status {
                    StatusCondition::Poison => format!("{} was poisoned!", who),
                    StatusCondition::Paralysis => {
                        format!("{} is paralyzed! It may be unable to move!", who)
                    }
                    StatusCondition::Sleep(_) => format!("{} fell asleep!", who),
                })
            }
            BattleEvent::StatusDamage {
                side,
                target,
                damage,
                ..
            } => Some(format!(
                "{} is hurt by poison! ({} damage)",
                Self::label(battle, *side, target),
                damage
            )),
            BattleEvent::WokeUp { side, monster } => Some(format!(
                "{} woke up!",
                Self::label(battle, *side, monster)
            )),

            BattleEvent::ItemUsed {
                item,
                target,
                restored,
            } => Some(format!(
                "Used {} on {}! Restored {} HP.",
                item, target, restored
            )),
            BattleEvent::Switched { from, to } => {
                Some(format!("Come back, {}! Go, {}!", from, to))
            }
            BattleEvent::SentOut { side, monster } => match side {
                Side::Player => Some(format!("Go, {}!", monster)),
                Side::Opponent => Some(format!("The trainer sent out {}!", monster)),
            },

            BattleEvent::CaptureAttempted { item, .. } => Some(format!("You threw a {}!", item)),
            BattleEvent::CaptureBlocked => Some("You can't capture a trainer's monster!".to_string()),
            BattleEvent::CaptureSucceeded { target } => Some(format!("Gotcha! {} was caught!", target)),
            BattleEvent::CaptureFailed { .. } => Some("Oh no! The monster broke free!".to_string()),
            BattleEvent::FleeSucceeded => Some("Got away safely!".to_string()),
            BattleEvent::FleeFailed => Some("Can't escape!".to_string()),

            BattleEvent::MonsterFainted { side, monster } => Some(format!(
                "{} fainted!",
                Self::label(battle, *side, monster)
            )),
            BattleEvent::ExperienceGained { monster, amount } => {
                Some(format!("{} gained {} experience!", monster, amount))
            }
            BattleEvent::LeveledUp { monster, level } => {
                Some(format!("{} grew to level {}!", monster, level))
            }
            BattleEvent::MoveLearned {
                monster,
                move_name,
                forgot,
            } => Some(match forgot {
                Some(old) => format!("{} forgot {} and learned {}!", monster, old, move_name),
                None => format!("{} learned {}!", monster, move_name),
            }),

            BattleEvent::BattleEnded { outcome } => match outcome {
                BattleOutcome::PlayerWon => Some("You won the battle!".to_string()),
                BattleOutcome::PlayerLost => Some("You blacked out!".to_string()),
                BattleOutcome::Fled | BattleOutcome::Captured => None,
            },
        }
    }

    fn label(battle: &Battle, side: Side, name: &str) -> String {
        match (side, battle.kind) {
            (Side::Player, _) => name.to_string(),
            (Side::Opponent, BattleKind::Wild) => format!("Wild {}", name),
            (Side::Opponent, BattleKind::Trainer) => format!("Foe {}", name),
        }
    }
}

/// Ordered log of everything that happened in a turn.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Formatted text for every event that has any, in order.
    pub fn messages(&self, battle: &Battle) -> Vec<String> {
        self.events.iter().filter_map(|e| e.format(battle)).collect()
    }

    /// Return true if the event bus contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the bus.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// A battle between the player's party and one wild monster or a trainer's team.
///
/// The player's monsters are owned by the party and passed in each turn; the battle
/// only remembers which index is active.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Battle {
    pub kind: BattleKind,
    pub phase: BattlePhase,
    pub turn_number: u32,
    pub player_active: usize,
    pub opponents: Vec<Monster>,
    pub opponent_active: usize,
    pub failed_flee_attempts: u32,
}

impl Battle {
    pub fn opponent(&self) -> Option<&Monster> {
        self.opponents.get(self.opponent_active)
    }

    pub fn opponent_mut(&mut self) -> Option<&mut Monster> {
        self.opponents.get_mut(self.opponent_active)
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.phase.outcome()
    }

    pub(crate) fn next_able_opponent(&self) -> Option<usize> {
        self.opponents.iter().position(|m| !m.is_fainted())
    }
}
