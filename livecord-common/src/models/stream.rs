// File: livecord-common/src/models/stream.rs

use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};

use crate::models::platform::StreamPlatform;

pub const DEFAULT_LIVE_TEMPLATE: &str = "{name} is now live on {platform}! {title} {url}";
pub const DEFAULT_PRESENCE_TEMPLATE: &str = "{name} is live on {platform}: {url}";

/// One tracked streamer inside a guild.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreamEntry {
    pub platform: StreamPlatform,

    /// Twitch login, YouTube channel id or `@handle`, or the Discord user id for
    /// presence platforms.
    #[serde(alias = "id")]
    pub external_id: String,

    #[serde(alias = "channelId")]
    pub discord_channel_id: String,

    #[serde(alias = "message", default = "default_live_template")]
    pub live_message_template: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vod_message_template: Option<String>,

    /// Member who receives the live role; required for presence platforms.
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub bound_discord_user_id: Option<String>,

    #[serde(default)]
    pub live_role_ids: BTreeSet<String>,

    #[serde(default)]
    pub whitelist_role_ids: BTreeSet<String>,
}

fn default_live_template() -> String {
    DEFAULT_LIVE_TEMPLATE.to_string()
}

impl StreamEntry {
    pub fn new(platform: StreamPlatform, external_id: &str, discord_channel_id: &str) -> Self {
        Self {
            platform,
            external_id: external_id.trim().to_string(),
            discord_channel_id: discord_channel_id.trim().to_string(),
            live_message_template: default_live_template(),
            vod_message_template: None,
            bound_discord_user_id: None,
            live_role_ids: BTreeSet::new(),
            whitelist_role_ids: BTreeSet::new(),
        }
    }

    pub fn matches(&self, platform: StreamPlatform, external_id: &str) -> bool {
        self.platform == platform
            && platform.normalize_external_id(&self.external_id)
                == platform.normalize_external_id(external_id)
    }

    /// Canonical id used for state keys.
    pub fn normalized_id(&self) -> String {
        self.platform.normalize_external_id(&self.external_id)
    }

    pub fn normalize(&mut self) {
        self.live_role_ids = normalize_role_ids(&self.live_role_ids);
        self.whitelist_role_ids = normalize_role_ids(&self.whitelist_role_ids);
        self.bound_discord_user_id = self
            .bound_discord_user_id
            .as_deref()
            .map(strip_non_numeric)
            .filter(|s| !s.is_empty());
        if self.live_message_template.trim().is_empty() {
            self.live_message_template = default_live_template();
        }
    }
}

/// Partial update for [`StreamEntry`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreamPatch {
    pub discord_channel_id: Option<String>,
    pub live_message_template: Option<String>,
    /// `Some("")` clears the VOD template.
    pub vod_message_template: Option<String>,
    /// `Some("")` unbinds the member.
    pub bound_discord_user_id: Option<String>,
    pub live_role_ids: Option<Vec<String>>,
    pub whitelist_role_ids: Option<Vec<String>>,
}

impl StreamPatch {
    pub fn is_empty(&self) -> bool {
        self == &StreamPatch::default()
    }

    pub fn apply_to(&self, entry: &mut StreamEntry) {
        if let Some(channel) = &self.discord_channel_id {
            entry.discord_channel_id = channel.trim().to_string();
        }
        if let Some(template) = &self.live_message_template {
            entry.live_message_template = template.clone();
        }
        if let Some(template) = &self.vod_message_template {
            entry.vod_message_template = if template.is_empty() {
                None
            } else {
                Some(template.clone())
            };
        }
        if let Some(user) = &self.bound_discord_user_id {
            entry.bound_discord_user_id = if user.is_empty() {
                None
            } else {
                Some(user.clone())
            };
        }
        if let Some(roles) = &self.live_role_ids {
            entry.live_role_ids = normalize_role_ids(roles);
        }
        if let Some(roles) = &self.whitelist_role_ids {
            entry.whitelist_role_ids = normalize_role_ids(roles);
        }
        entry.normalize();
    }
}

/// Per-guild rule for a presence-detected platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRule {
    pub platform: StreamPlatform,

    #[serde(default, alias = "channelId", skip_serializing_if = "Option::is_none")]
    pub discord_channel_id: Option<String>,

    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,

    #[serde(default)]
    pub live_role_ids: BTreeSet<String>,

    #[serde(default)]
    pub whitelist_role_ids: BTreeSet<String>,
}

impl PresenceRule {
    pub fn new(platform: StreamPlatform) -> Self {
        Self {
            platform,
            discord_channel_id: None,
            message_template: None,
            live_role_ids: BTreeSet::new(),
            whitelist_role_ids: BTreeSet::new(),
        }
    }

    pub fn normalize(&mut self) {
        self.live_role_ids = normalize_role_ids(&self.live_role_ids);
        self.whitelist_role_ids = normalize_role_ids(&self.whitelist_role_ids);
        self.discord_channel_id = self
            .discord_channel_id
            .as_deref()
            .map(strip_non_numeric)
            .filter(|s| !s.is_empty());
    }

    pub fn template(&self) -> &str {
        self.message_template
            .as_deref()
            .unwrap_or(DEFAULT_PRESENCE_TEMPLATE)
    }
}

/// Dedup role ids and strip mention syntax (`<@&123>` becomes `123`).
pub fn normalize_role_ids<I, S>(ids: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .map(|id| strip_non_numeric(id.as_ref()))
        .filter(|id| !id.is_empty())
        .collect()
}

fn strip_non_numeric(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}
