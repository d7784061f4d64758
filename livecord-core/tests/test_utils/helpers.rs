// File: livecord-core/tests/test_utils/helpers.rs
//
// Recording fakes shared by the integration tests.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use livecord_common::models::discord::{DiscordEmbed, PresenceActivity};
use livecord_common::models::platform::StreamPlatform;
use livecord_common::models::probe::{ProbeResult, StreamMetadata};
use livecord_common::models::stream::StreamEntry;
use livecord_common::traits::api::DiscordApi;
use livecord_core::repositories::json::{JsonLiveStateRepository, JsonStreamRegistry};
use livecord_core::services::stream_notifier::{NotifierService, NotifierSettings, Prober};
use livecord_core::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub content: String,
    pub embed: Option<DiscordEmbed>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleCall {
    Added { guild: String, user: String, role: String },
    Removed { guild: String, user: String, role: String },
}

/// In-memory Discord: records deliveries and role calls, serves presence from maps.
#[derive(Default)]
pub struct FakeDiscord {
    pub sent: Mutex<Vec<SentMessage>>,
    pub role_calls: Mutex<Vec<RoleCall>>,
    /// `(guild, user)` -> held roles. Members absent here are "not in the guild".
    pub member_roles: Mutex<HashMap<(String, String), BTreeSet<String>>>,
    pub activities: Mutex<HashMap<String, Vec<PresenceActivity>>>,
    pub voice: Mutex<HashMap<String, String>>,
    pub names: Mutex<HashMap<String, String>>,
    pub fail_sends: Mutex<bool>,
    next_id: AtomicU64,
}

impl FakeDiscord {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_member(&self, guild: &str, user: &str, roles: &[&str]) {
        self.member_roles.lock().insert(
            (guild.to_string(), user.to_string()),
            roles.iter().map(|r| r.to_string()).collect(),
        );
    }

    pub fn set_activities(&self, user: &str, activities: Vec<PresenceActivity>) {
        self.activities.lock().insert(user.to_string(), activities);
    }

    pub fn roles_of(&self, guild: &str, user: &str) -> BTreeSet<String> {
        self.member_roles
            .lock()
            .get(&(guild.to_string(), user.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    pub fn role_calls(&self) -> Vec<RoleCall> {
        self.role_calls.lock().clone()
    }

    fn record(&self, channel_id: &str, content: &str, embed: Option<DiscordEmbed>) -> Result<String, Error> {
        if *self.fail_sends.lock() {
            return Err(Error::Platform("send failed".into()));
        }
        self.sent.lock().push(SentMessage {
            channel_id: channel_id.to_string(),
            content: content.to_string(),
            embed,
        });
        Ok(format!("msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

#[async_trait]
impl DiscordApi for FakeDiscord {
    async fn send_discord_message(&self, channel_id: &str, text: &str) -> Result<String, Error> {
        self.record(channel_id, text, None)
    }

    async fn send_discord_embed(
        &self,
        channel_id: &str,
        embed: &DiscordEmbed,
        content: Option<&str>,
    ) -> Result<String, Error> {
        self.record(channel_id, content.unwrap_or_default(), Some(embed.clone()))
    }

    async fn add_role_to_discord_user(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<(), Error> {
        self.role_calls.lock().push(RoleCall::Added {
            guild: guild_id.into(),
            user: user_id.into(),
            role: role_id.into(),
        });
        if let Some(roles) = self
            .member_roles
            .lock()
            .get_mut(&(guild_id.to_string(), user_id.to_string()))
        {
            roles.insert(role_id.to_string());
        }
        Ok(())
    }

    async fn remove_role_from_discord_user(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<(), Error> {
        self.role_calls.lock().push(RoleCall::Removed {
            guild: guild_id.into(),
            user: user_id.into(),
            role: role_id.into(),
        });
        if let Some(roles) = self
            .member_roles
            .lock()
            .get_mut(&(guild_id.to_string(), user_id.to_string()))
        {
            roles.remove(role_id);
        }
        Ok(())
    }

    async fn member_role_ids(&self, guild_id: &str, user_id: &str) -> Result<Option<Vec<String>>, Error> {
        Ok(self
            .member_roles
            .lock()
            .get(&(guild_id.to_string(), user_id.to_string()))
            .map(|roles| roles.iter().cloned().collect()))
    }

    fn member_activities(&self, _guild_id: &str, user_id: &str) -> Vec<PresenceActivity> {
        self.activities.lock().get(user_id).cloned().unwrap_or_default()
    }

    fn member_voice_channel(&self, _guild_id: &str, user_id: &str) -> Option<String> {
        self.voice.lock().get(user_id).cloned()
    }

    fn guild_member_ids(&self, guild_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .member_roles
            .lock()
            .keys()
            .filter(|(g, _)| g == guild_id)
            .map(|(_, u)| u.clone())
            .collect();
        ids.sort();
        ids
    }

    fn member_display_name(&self, _guild_id: &str, user_id: &str) -> Option<String> {
        self.names.lock().get(user_id).cloned()
    }
}

#[derive(Debug, Clone)]
pub enum Reading {
    Live(StreamMetadata),
    Offline,
    Fail,
}

/// Prober whose answer the test sets before each tick.
pub struct ScriptedProber {
    platform: StreamPlatform,
    reading: Mutex<Reading>,
    suspended: Mutex<Option<DateTime<Utc>>>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new(platform: StreamPlatform) -> Arc<Self> {
        Arc::new(Self {
            platform,
            reading: Mutex::new(Reading::Offline),
            suspended: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, reading: Reading) {
        *self.reading.lock() = reading;
    }

    pub fn go_live(&self, title: &str) {
        self.set(Reading::Live(live_metadata("foo", title)));
    }

    pub fn suspend_until(&self, until: Option<DateTime<Utc>>) {
        *self.suspended.lock() = until;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    fn platform(&self) -> StreamPlatform {
        self.platform
    }

    async fn probe(&self, _guild_id: &str, entry: &StreamEntry) -> Result<ProbeResult, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reading.lock().clone() {
            Reading::Live(meta) => Ok(ProbeResult::live(meta)),
            Reading::Offline => Ok(ProbeResult::offline(StreamMetadata {
                name: entry.external_id.clone(),
                ..Default::default()
            })),
            Reading::Fail => Err(Error::Platform("upstream timeout".into())),
        }
    }

    fn suspended_until(&self) -> Option<DateTime<Utc>> {
        *self.suspended.lock()
    }
}

pub fn live_metadata(name: &str, title: &str) -> StreamMetadata {
    StreamMetadata {
        name: name.to_string(),
        title: title.to_string(),
        url: format!("https://twitch.tv/{}", name),
        ..Default::default()
    }
}

/// Registry, state store and notifier over a temp directory.
pub struct Harness {
    pub registry: Arc<JsonStreamRegistry>,
    pub states: Arc<JsonLiveStateRepository>,
    pub discord: Arc<FakeDiscord>,
    pub notifier: NotifierService,
}

impl Harness {
    pub fn new(dir: &Path) -> Result<Self, Error> {
        let registry = Arc::new(JsonStreamRegistry::open(dir.join("streams.json"))?);
        let states = Arc::new(JsonLiveStateRepository::open(dir.join("stream-state.json"))?);
        let discord = FakeDiscord::new();
        let notifier = NotifierService::new(
            registry.clone(),
            states.clone(),
            discord.clone(),
            NotifierSettings::default(),
        );
        Ok(Self {
            registry,
            states,
            discord,
            notifier,
        })
    }
}
