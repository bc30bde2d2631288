//! Output for the game loop. The loop only talks to [`Renderer`], so another front end
//! can replace the plain text one.

use crate::battle::state::Battle;
use crate::catalog::Catalog;
use crate::input::{Mode, BATTLE_HELP, EXPLORE_HELP};
use crate::monster::Monster;
use crate::overworld::Position;
use crate::party::{Inventory, Party};
use crate::session::Session;
use std::io::{self, Write};

pub const PLAYER_GLYPH: char = '@';
pub const TRAINER_GLYPH: char = 'T';
const HP_BAR_WIDTH: usize = 20;

pub trait Renderer {
    fn map(&mut self, session: &Session) -> io::Result<()>;
    fn battle(&mut self, battle: &Battle, party: &Party, catalog: &Catalog) -> io::Result<()>;
    fn party(&mut self, party: &Party, inventory: &Inventory) -> io::Result<()>;
    fn messages(&mut self, lines: &[String]) -> io::Result<()>;
    fn help(&mut self, mode: Mode) -> io::Result<()>;
    fn prompt(&mut self, mode: Mode) -> io::Result<()>;
}

/// Renders everything as plain lines of text.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn monster_line(&mut self, label: &str, monster: &Monster) -> io::Result<()> {
        let status = monster
            .status
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default();
        writeln!(
            self.out,
            "{label}{} Lv{}  {} {}/{}{status}",
            monster.name,
            monster.level,
            hp_bar(monster.current_hp, monster.max_hp()),
            monster.current_hp,
            monster.max_hp()
        )
    }
}

/// `[#######-------------]` scaled to the health fraction.
pub fn hp_bar(current: u16, max: u16) -> String {
    let filled = if max == 0 {
        0
    } else {
        (current as usize * HP_BAR_WIDTH).div_ceil(max as usize).min(HP_BAR_WIDTH)
    };
    format!("[{}{}]", "#".repeat(filled), "-".repeat(HP_BAR_WIDTH - filled))
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn map(&mut self, session: &Session) -> io::Result<()> {
        let map = &session.world.map;
        for y in 0..map.height() {
            let row: String = (0..map.width())
                .map(|x| {
                    let pos = Position::new(x, y);
                    if pos == session.position {
                        PLAYER_GLYPH
                    } else if session.world.trainer_at(pos).is_some()
                        && !session.defeated_trainers.contains(&pos)
                    {
                        TRAINER_GLYPH
                    } else {
                        map.tile_at(pos).glyph()
                    }
                })
                .collect();
            writeln!(self.out, "{row}")?;
        }
        Ok(())
    }

    fn battle(&mut self, battle: &Battle, party: &Party, catalog: &Catalog) -> io::Result<()> {
        if let Some(opponent) = battle.opponent() {
            self.monster_line("Foe: ", opponent)?;
        }
        let Some(active) = party.get(battle.player_active) else {
            return Ok(());
        };
        self.monster_line("You: ", active)?;
        for (i, slot) in active.moves.iter().enumerate() {
            let name = catalog
                .lookup_move(&slot.move_id)
                .map(|m| m.name.clone())
                .unwrap_or_else(|_| slot.move_id.to_string());
            writeln!(
                self.out,
                "  {}. {:<14} {}/{}",
                i + 1,
                name,
                slot.remaining_uses,
                slot.max_uses
            )?;
        }
        Ok(())
    }

    fn party(&mut self, party: &Party, inventory: &Inventory) -> io::Result<()> {
        for (i, monster) in party.iter().enumerate() {
            self.monster_line(&format!("{}. ", i + 1), monster)?;
        }
        let bag: Vec<String> = inventory
            .counts()
            .iter()
            .map(|(item, count)| format!("{item} x{count}"))
            .collect();
        if bag.is_empty() {
            writeln!(self.out, "Bag: empty")
        } else {
            writeln!(self.out, "Bag: {}", bag.join(", "))
        }
    }

    fn messages(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn help(&mut self, mode: Mode) -> io::Result<()> {
        match mode {
            Mode::Exploring => writeln!(self.out, "{EXPLORE_HELP}"),
            Mode::Battling => writeln!(self.out, "{BATTLE_HELP}"),
        }
    }

    fn prompt(&mut self, mode: Mode) -> io::Result<()> {
        match mode {
            Mode::Exploring => write!(self.out, "> ")?,
            Mode::Battling => write!(self.out, "battle> ")?,
        }
        self.out.flush()
    }
}
