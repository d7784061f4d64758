//! livecord-server/src/context.rs
//!
//! Builds everything the bot needs from configuration: repositories, the Discord
//! runtime, the platform probers and the notifier service.

use std::sync::Arc;
use tracing::{info, warn};

use livecord_common::models::platform::StreamPlatform;
use livecord_common::traits::api::DiscordApi;
use livecord_core::config::BotConfig;
use livecord_core::http::{DefaultHttpClient, HttpClient};
use livecord_core::platforms::discord::DiscordPlatform;
use livecord_core::platforms::twitch_helix::{ClientCredentials, TwitchHelixClient};
use livecord_core::platforms::youtube::YouTubeClient;
use livecord_core::platforms::PlatformIntegration;
use livecord_core::repositories::json::{JsonLiveStateRepository, JsonStreamRegistry};
use livecord_core::services::stream_notifier::probers::{PresenceProber, TwitchProber, YouTubeProber};
use livecord_core::services::stream_notifier::{NotifierService, Prober};
use livecord_core::Error;

use crate::Args;

/// How much of Discord a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscordMode {
    /// Gateway plus REST; needed for presence and voice detection.
    Gateway,
    /// REST only, for one-shot deliveries.
    RestOnly,
    /// REST when a token is configured, otherwise offline. Removals use it to
    /// revoke live roles without making the token mandatory.
    RestIfConfigured,
    /// No connection; registry commands only.
    Offline,
}

pub struct ServerContext {
    pub config: BotConfig,
    pub registry: Arc<JsonStreamRegistry>,
    pub states: Arc<JsonLiveStateRepository>,
    pub discord: Arc<DiscordPlatform>,
    pub notifier: Arc<NotifierService>,
}

impl ServerContext {
    pub async fn new(args: &Args, mode: DiscordMode) -> Result<Self, Error> {
        let mut config = BotConfig::load(&args.config)?;
        config.apply_env();
        if let Some(dir) = &args.data_dir {
            config.data_dir = dir.clone();
        }
        info!("Using data directory {}", config.data_dir.display());

        let registry = Arc::new(JsonStreamRegistry::open(config.streams_path())?);
        let states = Arc::new(JsonLiveStateRepository::open(config.state_path())?);

        let mut discord = DiscordPlatform::new(config.discord_token.clone().unwrap_or_default());
        match mode {
            DiscordMode::Gateway => {
                config.discord_token()?;
                discord.connect().await?;
            }
            DiscordMode::RestOnly => discord.connect_rest()?,
            DiscordMode::RestIfConfigured => {
                if let Err(e) = discord.connect_rest() {
                    warn!("Discord unavailable ({}); live roles will not be revoked", e);
                }
            }
            DiscordMode::Offline => {}
        }
        let discord = Arc::new(discord);

        let http: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new(config.http_timeout()));
        let discord_api: Arc<dyn DiscordApi> = discord.clone();

        let mut notifier = NotifierService::new(
            registry.clone(),
            states.clone(),
            discord_api.clone(),
            config.notifier_settings(),
        );
        for prober in build_probers(&config, http, discord_api) {
            notifier.register_prober(prober);
        }
        info!("Notifier platforms: {:?}", notifier.platforms());

        Ok(Self {
            config,
            registry,
            states,
            discord,
            notifier: Arc::new(notifier),
        })
    }
}

/// API platforms without credentials are left out; presence platforms are always on.
pub fn build_probers(
    config: &BotConfig,
    http: Arc<dyn HttpClient>,
    discord: Arc<dyn DiscordApi>,
) -> Vec<Arc<dyn Prober>> {
    let mut probers: Vec<Arc<dyn Prober>> = Vec::new();

    match config.twitch_credentials() {
        Ok((client_id, client_secret)) => {
            let tokens = ClientCredentials::new(client_id, client_secret, config.http_timeout());
            let client = TwitchHelixClient::new(http.clone(), Arc::new(tokens), client_id, config.api_cooldown());
            probers.push(Arc::new(TwitchProber::new(Arc::new(client))));
        }
        Err(e) => info!("Twitch notifications disabled: {}", e),
    }

    match config.youtube_key() {
        Ok(key) => {
            let client = YouTubeClient::new(http.clone(), key, config.api_cooldown());
            probers.push(Arc::new(YouTubeProber::new(Arc::new(client))));
        }
        Err(e) => info!("YouTube notifications disabled: {}", e),
    }

    for platform in StreamPlatform::ALL.into_iter().filter(|p| p.is_presence_backed()) {
        probers.push(Arc::new(PresenceProber::new(platform, discord.clone())));
    }
    probers
}
