//! The interactive loop: read a command, apply it to the session, render the result.

use crate::battle::state::BattleOutcome;
use crate::catalog::Catalog;
use crate::errors::GameResult;
use crate::input::{parse_command, Command, Mode};
use crate::overworld::{self, StepOutcome};
use crate::persistence::{PersistenceGateway, SaveSource, SaveTarget};
use crate::render::Renderer;
use crate::rng::RandomSource;
use crate::session::Session;
use chrono::Utc;
use std::future::{pending, Future};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What a command asks the renderer to show.
enum Reply {
    Messages(Vec<String>),
    Party,
    Help,
    Quit,
}

pub struct Game<R: Renderer> {
    catalog: Catalog,
    session: Session,
    gateway: PersistenceGateway,
    player_key: String,
    rng: Box<dyn RandomSource>,
    renderer: R,
}

impl<R: Renderer> Game<R> {
    pub fn new(
        catalog: Catalog,
        session: Session,
        gateway: PersistenceGateway,
        player_key: impl Into<String>,
        rng: Box<dyn RandomSource>,
        renderer: R,
    ) -> Self {
        Self {
            catalog,
            session,
            gateway,
            player_key: player_key.into(),
            rng,
            renderer,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub fn mode(&self) -> Mode {
        if self.session.in_battle() {
            Mode::Battling
        } else {
            Mode::Exploring
        }
    }

    /// Run until `quit`, end of input or Ctrl-C at the prompt.
    pub async fn run<I>(&mut self, input: I) -> io::Result<()>
    where
        I: AsyncBufRead + Unpin,
    {
        self.run_until(input, interrupted).await
    }

    /// Like [`run`](Self::run), but a fresh `interrupt()` is raced against every line
    /// read; when it wins the game ends as if the player typed `quit`.
    pub async fn run_until<I, F, Fut>(&mut self, input: I, mut interrupt: F) -> io::Result<()>
    where
        I: AsyncBufRead + Unpin,
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut lines = input.lines();
        self.renderer
            .messages(&["Welcome to Dunkemon! Type 'help' for commands.".to_string()])?;
        loop {
            self.show_view()?;
            self.renderer.prompt(self.mode())?;
            let line = tokio::select! {
                biased;
                _ = interrupt() => {
                    tracing::info!("interrupted at the prompt");
                    None
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                break;
            };
            if self.handle_line(&line).await? == Flow::Quit {
                break;
            }
        }
        self.renderer.messages(&["Goodbye!".to_string()])
    }

    fn show_view(&mut self) -> io::Result<()> {
        match self.session.battle() {
            Some(battle) => self
                .renderer
                .battle(battle, &self.session.party, &self.catalog),
            None => self.renderer.map(&self.session),
        }
    }

    /// Parse and apply one line. Bad input and rejected actions are shown, not returned.
    pub async fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let mode = self.mode();
        let command = match parse_command(line, mode) {
            Ok(command) => command,
            Err(err) => {
                self.renderer.messages(&[err.to_string()])?;
                return Ok(Flow::Continue);
            }
        };

        match self.execute(command).await {
            Ok(Reply::Messages(lines)) => self.renderer.messages(&lines)?,
            Ok(Reply::Party) => self
                .renderer
                .party(&self.session.party, &self.session.inventory)?,
            Ok(Reply::Help) => self.renderer.help(mode)?,
            Ok(Reply::Quit) => return Ok(Flow::Quit),
            Err(err) => {
                tracing::debug!(error = %err, ?command, "command rejected");
                self.renderer.messages(&[err.to_string()])?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn execute(&mut self, command: Command) -> GameResult<Reply> {
        match command {
            Command::Move(direction) => self.walk(direction),
            Command::Battle(action) => {
                let report = self
                    .session
                    .take_turn(&self.catalog, action, self.rng.as_mut())?;
                let mut lines = report.messages;
                if report.trainer_defeated.is_some() {
                    lines.push("You defeated the trainer!".to_string());
                }
                if report.outcome == Some(BattleOutcome::PlayerLost) {
                    lines.push("Your party was healed and you returned to the start.".to_string());
                }
                Ok(Reply::Messages(lines))
            }
            Command::Save => self.save().await,
            Command::Load => self.load().await,
            Command::Party => Ok(Reply::Party),
            Command::Help => Ok(Reply::Help),
            Command::Quit => Ok(Reply::Quit),
        }
    }

    fn walk(&mut self, direction: overworld::Direction) -> GameResult<Reply> {
        let outcome = overworld::step(direction, &mut self.session, &self.catalog, self.rng.as_mut())?;
        let lines = match outcome {
            StepOutcome::Blocked => vec!["You can't go that way.".to_string()],
            StepOutcome::Moved => vec![],
            StepOutcome::Healed => vec!["Your party was fully healed!".to_string()],
            StepOutcome::WildEncounter(wild) => {
                let line = format!("A wild {} (Lv{}) appeared!", wild.name, wild.level);
                self.session.start_wild_battle(wild)?;
                vec![line]
            }
            StepOutcome::TrainerChallenge(at) => {
                let battle = self.session.start_trainer_battle(at)?;
                let mut lines = vec!["A trainer challenges you!".to_string()];
                if let Some(first) = battle.opponent() {
                    lines.push(format!("The trainer sent out {}!", first.name));
                }
                lines
            }
        };
        Ok(Reply::Messages(lines))
    }

    async fn save(&mut self) -> GameResult<Reply> {
        let record = self.session.to_save_record(Utc::now())?;
        let target = self
            .gateway
            .save_until(&self.player_key, &record, interrupted())
            .await?;
        let line = match target {
            SaveTarget::Remote => "Game saved to remote server.".to_string(),
            SaveTarget::Local(_) => "Game saved.".to_string(),
            SaveTarget::LocalFallback { reason, .. } => {
                format!("Online save failed: {reason}. Game saved locally.")
            }
        };
        Ok(Reply::Messages(vec![line]))
    }

    async fn load(&mut self) -> GameResult<Reply> {
        let (record, source) = self
            .gateway
            .load_until(&self.player_key, interrupted())
            .await?;
        self.session = Session::restore(self.session.world.clone(), record, &self.catalog)?;
        let line = match source {
            SaveSource::Remote => "Loaded game from remote server.",
            SaveSource::Local => "Loaded game.",
        };
        Ok(Reply::Messages(vec![line.to_string()]))
    }
}

/// Completes when the user presses Ctrl-C. Once listened for, Ctrl-C no longer kills
/// the process, so every wait on player input races this.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        pending::<()>().await;
    }
}
