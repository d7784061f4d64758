use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    MessageSender,
    Shard,
    StreamExt,
};
use twilight_http::client::ClientBuilder;
use twilight_http::error::ErrorType;
use twilight_http::Client as HttpClient;
use twilight_model::channel::message::Embed;
use twilight_model::gateway::payload::incoming::Ready as ReadyPayload;
use twilight_model::gateway::presence::ActivityType;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker, UserMarker};
use twilight_model::id::Id;
use twilight_model::util::Timestamp;
use twilight_util::builder::embed::{
    EmbedAuthorBuilder, EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder, ImageSource,
};

use crate::platforms::{ConnectionStatus, PlatformIntegration};
use crate::Error;
use livecord_common::models::discord::{ActivityKind, DiscordEmbed, PresenceActivity};
use livecord_common::traits::api::DiscordApi;

/// Keeps the gateway cache current. Presence, voice and member data are read
/// from the cache by the notifier; nothing else is dispatched from here.
async fn shard_runner(mut shard: Shard, cache: Arc<InMemoryCache>) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => {
                cache.update(&event);

                match &event {
                    Event::Ready(ready) => {
                        let data: &ReadyPayload = ready.as_ref();
                        info!(
                            "Shard {shard_id} => READY as {} (ID={}), {} guilds",
                            data.user.name,
                            data.user.id,
                            data.guilds.len()
                        );
                    }
                    Event::GuildCreate(guild) => {
                        debug!("Shard {shard_id} => guild {} available", guild.id());
                    }
                    _ => {
                        trace!("Shard {shard_id} => cached event {:?}", event.kind());
                    }
                }
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

/// How long shutdown waits for each shard runner after the close frame.
const SHARD_STOP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DiscordPlatform {
    pub token: String,
    pub connection_status: Mutex<ConnectionStatus>,

    pub shard_tasks: Mutex<Vec<JoinHandle<()>>>,
    pub shard_senders: Vec<MessageSender>,

    pub http: Option<Arc<HttpClient>>,
    pub cache: Option<Arc<InMemoryCache>>,
}

impl DiscordPlatform {
    pub fn new(token: String) -> Self {
        Self {
            token,
            connection_status: Mutex::new(ConnectionStatus::Disconnected),
            shard_tasks: Mutex::new(Vec::new()),
            shard_senders: Vec::new(),
            http: None,
            cache: None,
        }
    }

    fn build_http(&self) -> Arc<HttpClient> {
        Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        )
    }

    /// REST only, no gateway. Cache lookups answer empty; used by one-shot CLI commands.
    pub fn connect_rest(&mut self) -> Result<(), Error> {
        if self.token.trim().is_empty() {
            return Err(Error::ConfigMissing("DISCORD_TOKEN".into()));
        }
        if self.http.is_none() {
            self.http = Some(self.build_http());
        }
        Ok(())
    }

    fn http(&self) -> Result<&Arc<HttpClient>, Error> {
        self.http
            .as_ref()
            .ok_or_else(|| Error::Platform("Discord is not connected".into()))
    }
}

#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if *self.connection_status.get_mut() == ConnectionStatus::Connected {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }
        self.connect_rest()?;
        let http_client = self.http()?.clone();

        let cache = InMemoryCache::builder()
            .resource_types(
                ResourceType::GUILD
                    | ResourceType::CHANNEL
                    | ResourceType::ROLE
                    | ResourceType::MEMBER
                    | ResourceType::USER
                    | ResourceType::PRESENCE
                    | ResourceType::VOICE_STATE,
            )
            .build();
        let cache = Arc::new(cache);
        self.cache = Some(cache.clone());

        // GUILD_PRESENCES and GUILD_MEMBERS are privileged and must be enabled for the app.
        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS
                | Intents::GUILD_MEMBERS
                | Intents::GUILD_PRESENCES
                | Intents::GUILD_VOICE_STATES,
        );

        let shards = gateway::create_recommended(&http_client, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders.push(shard.sender());
            let cache_for_shard = cache.clone();
            let handle = tokio::spawn(async move {
                shard_runner(shard, cache_for_shard).await;
            });
            self.shard_tasks.get_mut().push(handle);
        }

        info!("(DiscordPlatform) Connected with {} shard(s)", self.shard_senders.len());
        *self.connection_status.get_mut() = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), Error> {
        *self.connection_status.lock() = ConnectionStatus::Disconnected;
        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        let tasks = std::mem::take(&mut *self.shard_tasks.lock());
        for task in tasks {
            if tokio::time::timeout(SHARD_STOP_TIMEOUT, task).await.is_err() {
                warn!("(DiscordPlatform) Shard runner did not stop in time");
            }
        }
        info!("(DiscordPlatform) Disconnected");
        Ok(())
    }
}

fn parse_id<T>(raw: &str, what: &str) -> Result<Id<T>, Error> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .and_then(Id::new_checked)
        .ok_or_else(|| Error::Parse(format!("Invalid {what} ID: {raw}")))
}

fn platform_err(context: &str, e: impl std::fmt::Debug) -> Error {
    Error::Platform(format!("{context}: {e:?}"))
}

fn activity_kind(kind: ActivityType) -> ActivityKind {
    match kind {
        ActivityType::Playing => ActivityKind::Playing,
        ActivityType::Streaming => ActivityKind::Streaming,
        ActivityType::Listening => ActivityKind::Listening,
        ActivityType::Watching => ActivityKind::Watching,
        ActivityType::Custom => ActivityKind::Custom,
        ActivityType::Competing => ActivityKind::Competing,
        _ => ActivityKind::Other,
    }
}

fn image_source(url: &str) -> Option<ImageSource> {
    match ImageSource::url(url) {
        Ok(src) => Some(src),
        Err(e) => {
            debug!("Skipping embed image '{}': {}", url, e);
            None
        }
    }
}

/// Convert the platform-neutral embed into twilight's model.
pub fn to_twilight_embed(embed: &DiscordEmbed) -> Embed {
    let mut builder = EmbedBuilder::new();

    if let Some(title) = &embed.title {
        builder = builder.title(title.as_str());
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description.as_str());
    }
    if let Some(url) = &embed.url {
        builder = builder.url(url.as_str());
    }
    if let Some(color) = embed.color {
        builder = builder.color(color);
    }
    if let Some(author) = &embed.author {
        let mut author_builder = EmbedAuthorBuilder::new(author.name.as_str());
        if let Some(url) = &author.url {
            author_builder = author_builder.url(url.as_str());
        }
        if let Some(icon) = author.icon_url.as_deref().and_then(image_source) {
            author_builder = author_builder.icon_url(icon);
        }
        builder = builder.author(author_builder);
    }
    if let Some(thumb) = embed.thumbnail.as_ref().and_then(|t| image_source(&t.url)) {
        builder = builder.thumbnail(thumb);
    }
    if let Some(image) = embed.image.as_deref().and_then(image_source) {
        builder = builder.image(image);
    }
    for field in &embed.fields {
        let mut field_builder = EmbedFieldBuilder::new(field.name.as_str(), field.value.as_str());
        if field.inline {
            field_builder = field_builder.inline();
        }
        builder = builder.field(field_builder);
    }
    if let Some(footer) = &embed.footer {
        builder = builder.footer(EmbedFooterBuilder::new(footer.as_str()));
    }
    if let Some(ts) = embed.timestamp.and_then(|t| Timestamp::from_secs(t.timestamp()).ok()) {
        builder = builder.timestamp(ts);
    }

    builder.build()
}

#[async_trait]
impl DiscordApi for DiscordPlatform {
    async fn send_discord_message(&self, channel_id: &str, text: &str) -> Result<String, Error> {
        let channel_id: Id<ChannelMarker> = parse_id(channel_id, "channel")?;
        let message = self
            .http()?
            .create_message(channel_id)
            .content(text)
            .await
            .map_err(|e| platform_err("Error sending Discord message", e))?
            .model()
            .await
            .map_err(|e| platform_err("Error reading created message", e))?;
        Ok(message.id.to_string())
    }

    async fn send_discord_embed(
        &self,
        channel_id: &str,
        embed: &DiscordEmbed,
        content: Option<&str>,
    ) -> Result<String, Error> {
        let channel_id: Id<ChannelMarker> = parse_id(channel_id, "channel")?;
        let embeds = [to_twilight_embed(embed)];
        let mut request = self.http()?.create_message(channel_id).embeds(&embeds);
        if let Some(text) = content.filter(|t| !t.trim().is_empty()) {
            request = request.content(text);
        }
        let message = request
            .await
            .map_err(|e| platform_err("Error sending Discord embed", e))?
            .model()
            .await
            .map_err(|e| platform_err("Error reading created message", e))?;
        Ok(message.id.to_string())
    }

    async fn add_role_to_discord_user(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), Error> {
        let guild_id: Id<GuildMarker> = parse_id(guild_id, "guild")?;
        let user_id: Id<UserMarker> = parse_id(user_id, "user")?;
        let role_id: Id<RoleMarker> = parse_id(role_id, "role")?;
        self.http()?
            .add_guild_member_role(guild_id, user_id, role_id)
            .await
            .map_err(|e| platform_err("Error adding role", e))?;
        Ok(())
    }

    async fn remove_role_from_discord_user(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), Error> {
        let guild_id: Id<GuildMarker> = parse_id(guild_id, "guild")?;
        let user_id: Id<UserMarker> = parse_id(user_id, "user")?;
        let role_id: Id<RoleMarker> = parse_id(role_id, "role")?;
        self.http()?
            .remove_guild_member_role(guild_id, user_id, role_id)
            .await
            .map_err(|e| platform_err("Error removing role", e))?;
        Ok(())
    }

    async fn member_role_ids(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<Vec<String>>, Error> {
        let guild: Id<GuildMarker> = parse_id(guild_id, "guild")?;
        let user: Id<UserMarker> = parse_id(user_id, "user")?;

        if let Some(cache) = &self.cache {
            if let Some(member) = cache.member(guild, user) {
                return Ok(Some(member.roles().iter().map(|r| r.to_string()).collect()));
            }
        }

        match self.http()?.guild_member(guild, user).await {
            Ok(resp) => {
                let member = resp
                    .model()
                    .await
                    .map_err(|e| platform_err("Error reading guild member", e))?;
                Ok(Some(member.roles.iter().map(|r| r.to_string()).collect()))
            }
            Err(e) => match e.kind() {
                ErrorType::Response { status, .. } if status.get() == 404 => Ok(None),
                _ => Err(platform_err("Error fetching guild member", e)),
            },
        }
    }

    fn member_activities(&self, guild_id: &str, user_id: &str) -> Vec<PresenceActivity> {
        let (Some(cache), Ok(guild), Ok(user)) = (
            self.cache.as_ref(),
            parse_id::<GuildMarker>(guild_id, "guild"),
            parse_id::<UserMarker>(user_id, "user"),
        ) else {
            return Vec::new();
        };
        let Some(presence) = cache.presence(guild, user) else {
            return Vec::new();
        };
        presence
            .activities()
            .iter()
            .map(|a| PresenceActivity {
                kind: activity_kind(a.kind),
                name: a.name.clone(),
                url: a.url.clone(),
                details: a.details.clone(),
                state: a.state.clone(),
                large_image: a.assets.as_ref().and_then(|assets| assets.large_image.clone()),
            })
            .collect()
    }

    fn member_voice_channel(&self, guild_id: &str, user_id: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        let guild = parse_id::<GuildMarker>(guild_id, "guild").ok()?;
        let user = parse_id::<UserMarker>(user_id, "user").ok()?;
        let voice = cache.voice_state(user, guild)?;
        Some(voice.channel_id().to_string())
    }

    fn guild_member_ids(&self, guild_id: &str) -> Vec<String> {
        let (Some(cache), Ok(guild)) = (
            self.cache.as_ref(),
            parse_id::<GuildMarker>(guild_id, "guild"),
        ) else {
            return Vec::new();
        };
        cache
            .guild_members(guild)
            .map(|members| members.iter().map(|id| id.to_string()).collect())
            .unwrap_or_default()
    }

    fn member_display_name(&self, guild_id: &str, user_id: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        let guild = parse_id::<GuildMarker>(guild_id, "guild").ok()?;
        let user = parse_id::<UserMarker>(user_id, "user").ok()?;

        if let Some(nick) = cache.member(guild, user).and_then(|m| m.nick().map(str::to_string)) {
            return Some(nick);
        }
        let cached_user = cache.user(user)?;
        Some(
            cached_user
                .global_name
                .clone()
                .unwrap_or_else(|| cached_user.name.clone()),
        )
    }
}
