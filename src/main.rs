use anyhow::{Context, Result};
use clap::Parser;
use dunkemon::catalog::{Catalog, CatalogPaths};
use dunkemon::config::GameConfig;
use dunkemon::game::Game;
use dunkemon::overworld::{Overworld, TileMap};
use dunkemon::render::TextRenderer;
use dunkemon::rng::{RandomSource, SeededRng};
use dunkemon::session::Session;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

const MAP_ID: &str = "overworld";

/// Dunkemon: explore, battle and collect monsters in your terminal.
#[derive(Parser, Debug)]
#[command(name = "dunkemon")]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ./dunkemon.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding species.ron, moves.ron and areas.ron
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Overworld map file
    #[arg(long)]
    map: Option<PathBuf>,

    /// Directory for local save files
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Seed for a reproducible session
    #[arg(long)]
    seed: Option<u64>,

    /// Save slot name, also used as the remote key
    #[arg(short, long)]
    player: Option<String>,
}

impl Args {
    fn apply(self, config: &mut GameConfig) {
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(map) = self.map {
            config.map_path = map;
        }
        if let Some(save_dir) = self.save_dir {
            config.save_dir = save_dir;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(player) = self.player {
            config.player_key = player;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Game text goes to stdout, logs to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dunkemon=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = GameConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut config);

    let catalog = Catalog::load(&CatalogPaths::in_dir(&config.data_dir))
        .with_context(|| format!("failed to load game data from {}", config.data_dir.display()))?;
    let map = TileMap::load(MAP_ID, &config.map_path)
        .with_context(|| format!("failed to load map {}", config.map_path.display()))?;

    let mut rng = match config.seed {
        Some(seed) => SeededRng::from_seed(seed),
        None => SeededRng::from_entropy(),
    };
    let world = Overworld::populate(map, &catalog, &mut rng).context("failed to place trainers")?;
    let session = Session::new_game(world, &catalog).context("failed to create the starter")?;
    tracing::info!(seed = ?config.seed, player = %config.player_key, "starting game");

    let rng: Box<dyn RandomSource> = Box::new(rng);
    let mut game = Game::new(
        catalog,
        session,
        config.gateway(),
        config.player_key.clone(),
        rng,
        TextRenderer::new(std::io::stdout()),
    );
    game.run(BufReader::new(tokio::io::stdin()))
        .await
        .context("terminal input/output failed")?;
    Ok(())
}
