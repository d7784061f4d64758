// File: livecord-common/src/models/live_state.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::platform::StreamPlatform;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LiveStatus {
    Live,
    #[default]
    Offline,
}

/// Last known status of one tracked streamer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LiveState {
    pub status: LiveStatus,
    pub last_transition_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_notified_at: Option<DateTime<Utc>>,

    /// First "offline" reading seen while still Live; start of the grace window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_since: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_url: Option<String>,
}

impl LiveState {
    pub fn offline(now: DateTime<Utc>) -> Self {
        Self {
            status: LiveStatus::Offline,
            last_transition_at: now,
            last_message_id: None,
            last_notified_at: None,
            offline_since: None,
            last_title: None,
            last_url: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.status == LiveStatus::Live
    }
}

/// `(guild, platform, externalId)`; rendered as `guild:platform:id` on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LiveStateKey {
    pub guild_id: String,
    pub platform: StreamPlatform,
    pub external_id: String,
}

impl LiveStateKey {
    pub fn new(guild_id: &str, platform: StreamPlatform, external_id: &str) -> Self {
        Self {
            guild_id: guild_id.to_string(),
            platform,
            external_id: platform.normalize_external_id(external_id),
        }
    }
}

impl fmt::Display for LiveStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.guild_id, self.platform, self.external_id)
    }
}

impl FromStr for LiveStateKey {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(guild), Some(platform), Some(id)) if !guild.is_empty() && !id.is_empty() => {
                Ok(LiveStateKey::new(guild, platform.parse()?, id))
            }
            _ => Err(Error::Parse(format!("Malformed live state key: {}", s))),
        }
    }
}
