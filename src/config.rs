//! Game configuration, layered from built-in defaults, an optional `dunkemon.toml`
//! and `DUNKEMON_*` environment variables.
//!
//! Nested keys use a double underscore in the environment, for example
//! `DUNKEMON_REMOTE__ENABLED=true` or `DUNKEMON_REMOTE__BASE_URL=https://saves.example`.

use crate::persistence::{LocalSaveStore, PersistenceGateway, RemoteSaveStore};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "dunkemon.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameConfig {
    pub data_dir: PathBuf,
    pub map_path: PathBuf,
    pub save_dir: PathBuf,
    /// Names the save slot locally and on the remote store.
    pub player_key: String,
    /// Fixed seed for reproducible sessions; entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Settings for the optional remote save store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            enabled: false,
            base_url: None,
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GameConfig {
    /// Load with `file` as the config file, or `dunkemon.toml` in the working directory.
    /// A missing file is fine.
    pub fn load(file: Option<&Path>) -> Result<GameConfig, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(false),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .set_default("data_dir", "data")?
            .set_default("map_path", "maps/overworld.txt")?
            .set_default("save_dir", "saves")?
            .set_default("player_key", "player")?
            .add_source(file_source)
            .add_source(
                Environment::with_prefix("DUNKEMON")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let game_config: GameConfig = config.try_deserialize()?;
        tracing::debug!(data_dir = ?game_config.data_dir, remote = game_config.remote.enabled, "configuration loaded");
        Ok(game_config)
    }

    /// The persistence gateway this configuration describes.
    pub fn gateway(&self) -> PersistenceGateway {
        let local = LocalSaveStore::new(&self.save_dir);
        match self.remote.store() {
            Some(remote) => PersistenceGateway::with_remote(local, Box::new(remote)),
            None => PersistenceGateway::local_only(local),
        }
    }
}

impl RemoteConfig {
    /// A client for the remote store, or `None` when disabled or incomplete.
    pub fn store(&self) -> Option<RemoteSaveStore> {
        if !self.enabled {
            return None;
        }
        match (&self.base_url, &self.token) {
            (Some(base_url), Some(token)) if !base_url.is_empty() => Some(RemoteSaveStore::new(
                base_url,
                token.clone(),
                Duration::from_secs(self.timeout_secs),
            )),
            _ => {
                tracing::warn!("remote saves enabled without base_url and token, using local saves only");
                None
            }
        }
    }
}
