// File: src/config.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::services::stream_notifier::NotifierSettings;
use crate::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

/// Runtime configuration. Every field has a default so a partial
/// `config.json` (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub discord_token: Option<String>,
    pub twitch_client_id: Option<String>,
    pub twitch_client_secret: Option<String>,
    pub youtube_api_key: Option<String>,

    pub data_dir: PathBuf,

    pub poll_interval_secs: u64,
    pub startup_delay_secs: u64,
    pub offline_grace_secs: u64,
    pub renotify_cooldown_secs: u64,
    pub api_cooldown_secs: u64,
    pub cache_sweep_interval_secs: u64,
    pub http_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            discord_token: None,
            twitch_client_id: None,
            twitch_client_secret: None,
            youtube_api_key: None,
            data_dir: PathBuf::from("data"),
            poll_interval_secs: 180,
            startup_delay_secs: 10,
            offline_grace_secs: 300,
            renotify_cooldown_secs: 600,
            api_cooldown_secs: 3600,
            cache_sweep_interval_secs: 600,
            http_timeout_secs: 15,
        }
    }
}

impl BotConfig {
    /// Reads `path` if it exists; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => {
                info!("Loaded configuration from {}", path.display());
                Ok(serde_json::from_str(&contents)?)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config file at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Environment overrides. `lookup` is `std::env::var(..).ok()` in production.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("DISCORD_TOKEN") {
            self.discord_token = Some(v);
        }
        if let Some(v) = get("TWITCH_CLIENT_ID") {
            self.twitch_client_id = Some(v);
        }
        if let Some(v) = get("TWITCH_CLIENT_SECRET") {
            self.twitch_client_secret = Some(v);
        }
        if let Some(v) = get("YOUTUBE_API_KEY") {
            self.youtube_api_key = Some(v);
        }
        if let Some(v) = get("LIVECORD_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn streams_path(&self) -> PathBuf {
        self.data_dir.join("streams.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("stream-state.json")
    }

    /// `(client_id, client_secret)` when both are configured.
    pub fn twitch_credentials(&self) -> Result<(&str, &str), Error> {
        match (self.twitch_client_id.as_deref(), self.twitch_client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
            _ => Err(Error::ConfigMissing("TWITCH_CLIENT_ID / TWITCH_CLIENT_SECRET".into())),
        }
    }

    pub fn youtube_key(&self) -> Result<&str, Error> {
        self.youtube_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::ConfigMissing("YOUTUBE_API_KEY".into()))
    }

    pub fn discord_token(&self) -> Result<&str, Error> {
        self.discord_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::ConfigMissing("DISCORD_TOKEN".into()))
    }

    pub fn notifier_settings(&self) -> NotifierSettings {
        NotifierSettings {
            offline_grace: secs(self.offline_grace_secs),
            renotify_cooldown: secs(self.renotify_cooldown_secs),
        }
    }

    pub fn api_cooldown(&self) -> chrono::Duration {
        secs(self.api_cooldown_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs.max(1))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

fn secs(value: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX / 1000))
}
