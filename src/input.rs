//! Text commands typed at the prompt.

use crate::battle::state::PlayerAction;
use crate::overworld::Direction;
use schema::Item;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Save,
    Load,
    Party,
    Help,
    Quit,
    Battle(PlayerAction),
}

/// Which set of commands the prompt accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Exploring,
    Battling,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Type a command, or 'help' for the list.")]
    Empty,
    #[error("Unknown command '{0}'. Type 'help' for the list.")]
    Unknown(String),
    #[error("'{0}' needs a number, e.g. '{0} 1'.")]
    MissingNumber(&'static str),
    #[error("'{0}' is not a valid choice.")]
    BadNumber(String),
    #[error("Unknown net '{0}'. Try net, great or ultra.")]
    UnknownNet(String),
    #[error("You can't do that during a battle.")]
    NotWhileBattling,
    #[error("That only works in battle.")]
    OnlyInBattle,
}

pub fn parse_command(line: &str, mode: Mode) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Err(CommandError::Empty);
    };
    let word = word.to_ascii_lowercase();
    let argument = words.next();

    let command = match word.as_str() {
        "w" | "up" => Command::Move(Direction::Up),
        "s" | "down" => Command::Move(Direction::Down),
        "a" | "left" => Command::Move(Direction::Left),
        "d" | "right" => Command::Move(Direction::Right),
        "save" => Command::Save,
        "load" => Command::Load,
        "party" | "p" => Command::Party,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,

        "fight" | "f" => Command::Battle(PlayerAction::UseMove {
            move_index: slot_number("fight", argument)?,
        }),
        "switch" => Command::Battle(PlayerAction::Switch {
            party_index: slot_number("switch", argument)?,
        }),
        "potion" => Command::Battle(PlayerAction::UseItem { item: Item::Potion }),
        "catch" | "c" => Command::Battle(PlayerAction::AttemptCapture {
            item: net(argument)?,
        }),
        "run" | "flee" => Command::Battle(PlayerAction::Flee),
        "pass" | "wait" => Command::Battle(PlayerAction::Pass),
        _ => return Err(CommandError::Unknown(word)),
    };

    match (mode, command) {
        (Mode::Exploring, Command::Battle(_)) => Err(CommandError::OnlyInBattle),
        (Mode::Battling, Command::Move(_) | Command::Save | Command::Load) => {
            Err(CommandError::NotWhileBattling)
        }
        _ => Ok(command),
    }
}

/// One-based on screen, zero-based inside.
fn slot_number(command: &'static str, argument: Option<&str>) -> Result<usize, CommandError> {
    let raw = argument.ok_or(CommandError::MissingNumber(command))?;
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::BadNumber(raw.to_string())),
    }
}

fn net(argument: Option<&str>) -> Result<Item, CommandError> {
    match argument.map(str::to_ascii_lowercase).as_deref() {
        None | Some("net") | Some("netball") => Ok(Item::NetBall),
        Some("great") | Some("greatnet") => Ok(Item::GreatNet),
        Some("ultra") | Some("ultranet") => Ok(Item::UltraNet),
        Some(other) => Err(CommandError::UnknownNet(other.to_string())),
    }
}

pub const EXPLORE_HELP: &str = "\
Move with w/a/s/d or up/down/left/right.
  party   show your monsters
  save    save the game
  load    load the last save
  quit    leave the game";

pub const BATTLE_HELP: &str = "\
  fight N             use move N
  potion              heal the active monster by 20 HP
  catch [net|great|ultra]
  switch N            send out party member N
  run                 try to escape a wild battle
  pass                let the turn go by once no move has uses left
  party               show your monsters";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("w", Command::Move(Direction::Up))]
    #[case("LEFT", Command::Move(Direction::Left))]
    #[case("  d  ", Command::Move(Direction::Right))]
    #[case("down", Command::Move(Direction::Down))]
    #[case("save", Command::Save)]
    #[case("party", Command::Party)]
    #[case("quit", Command::Quit)]
    fn test_exploring_commands(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(parse_command(line, Mode::Exploring), Ok(expected));
    }

    #[rstest]
    #[case("fight 1", PlayerAction::UseMove { move_index: 0 })]
    #[case("fight 4", PlayerAction::UseMove { move_index: 3 })]
    #[case("switch 2", PlayerAction::Switch { party_index: 1 })]
    #[case("potion", PlayerAction::UseItem { item: Item::Potion })]
    #[case("catch", PlayerAction::AttemptCapture { item: Item::NetBall })]
    #[case("catch great", PlayerAction::AttemptCapture { item: Item::GreatNet })]
    #[case("catch Ultra", PlayerAction::AttemptCapture { item: Item::UltraNet })]
    #[case("run", PlayerAction::Flee)]
    #[case("pass", PlayerAction::Pass)]
    fn test_battle_commands(#[case] line: &str, #[case] expected: PlayerAction) {
        assert_eq!(parse_command(line, Mode::Battling), Ok(Command::Battle(expected)));
    }

    #[rstest]
    #[case("", Mode::Exploring, CommandError::Empty)]
    #[case("dance", Mode::Exploring, CommandError::Unknown("dance".to_string()))]
    #[case("fight", Mode::Battling, CommandError::MissingNumber("fight"))]
    #[case("fight 0", Mode::Battling, CommandError::BadNumber("0".to_string()))]
    #[case("switch two", Mode::Battling, CommandError::BadNumber("two".to_string()))]
    #[case("catch master", Mode::Battling, CommandError::UnknownNet("master".to_string()))]
    #[case("run", Mode::Exploring, CommandError::OnlyInBattle)]
    #[case("w", Mode::Battling, CommandError::NotWhileBattling)]
    #[case("save", Mode::Battling, CommandError::NotWhileBattling)]
    fn test_rejected_commands(#[case] line: &str, #[case] mode: Mode, #[case] expected: CommandError) {
        assert_eq!(parse_command(line, mode), Err(expected));
    }
}
