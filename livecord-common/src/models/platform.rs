// File: livecord-common/src/models/platform.rs

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Every platform a stream entry can point at.
///
/// `Twitch` and `YouTube` are checked through their public APIs; everything else is
/// detected from the bound member's Discord presence.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum StreamPlatform {
    Twitch,
    YouTube,
    Kick,
    TikTok,
    Rumble,
    Instagram,
    Facebook,
    X,
    Discord,
}

impl StreamPlatform {
    pub const ALL: [StreamPlatform; 9] = [
        StreamPlatform::Twitch,
        StreamPlatform::YouTube,
        StreamPlatform::Kick,
        StreamPlatform::TikTok,
        StreamPlatform::Rumble,
        StreamPlatform::Instagram,
        StreamPlatform::Facebook,
        StreamPlatform::X,
        StreamPlatform::Discord,
    ];

    pub fn is_api_backed(&self) -> bool {
        matches!(self, StreamPlatform::Twitch | StreamPlatform::YouTube)
    }

    pub fn is_presence_backed(&self) -> bool {
        !self.is_api_backed()
    }

    /// Human readable name, used in messages and embeds.
    pub fn display_name(&self) -> &'static str {
        match self {
            StreamPlatform::Twitch => "Twitch",
            StreamPlatform::YouTube => "YouTube",
            StreamPlatform::Kick => "Kick",
            StreamPlatform::TikTok => "TikTok",
            StreamPlatform::Rumble => "Rumble",
            StreamPlatform::Instagram => "Instagram",
            StreamPlatform::Facebook => "Facebook",
            StreamPlatform::X => "X",
            StreamPlatform::Discord => "Discord",
        }
    }

    /// URL fragments that identify this platform inside a presence activity.
    pub fn presence_signatures(&self) -> &'static [&'static str] {
        match self {
            StreamPlatform::Twitch => &["twitch.tv"],
            StreamPlatform::YouTube => &["youtube.com", "youtu.be"],
            StreamPlatform::Kick => &["kick.com"],
            StreamPlatform::TikTok => &["tiktok.com"],
            StreamPlatform::Rumble => &["rumble.com"],
            StreamPlatform::Instagram => &["instagram.com"],
            StreamPlatform::Facebook => &["facebook.com", "fb.gg"],
            StreamPlatform::X => &["x.com", "twitter.com"],
            StreamPlatform::Discord => &[],
        }
    }

    /// Canonical form of an external id for comparisons and state keys.
    ///
    /// Twitch logins and YouTube handles are case-insensitive; YouTube channel ids
    /// (`UC...`) and Discord snowflakes are not touched.
    pub fn normalize_external_id(&self, external_id: &str) -> String {
        let trimmed = external_id.trim();
        match self {
            StreamPlatform::Twitch => trimmed.to_lowercase(),
            StreamPlatform::YouTube if trimmed.starts_with('@') => trimmed.to_lowercase(),
            _ => trimmed.to_string(),
        }
    }
}

impl fmt::Display for StreamPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamPlatform::Twitch => "twitch",
            StreamPlatform::YouTube => "youtube",
            StreamPlatform::Kick => "kick",
            StreamPlatform::TikTok => "tiktok",
            StreamPlatform::Rumble => "rumble",
            StreamPlatform::Instagram => "instagram",
            StreamPlatform::Facebook => "facebook",
            StreamPlatform::X => "x",
            StreamPlatform::Discord => "discord",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for StreamPlatform {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "twitch" => Ok(StreamPlatform::Twitch),
            "youtube" | "yt" => Ok(StreamPlatform::YouTube),
            "kick" => Ok(StreamPlatform::Kick),
            "tiktok" => Ok(StreamPlatform::TikTok),
            "rumble" => Ok(StreamPlatform::Rumble),
            "instagram" => Ok(StreamPlatform::Instagram),
            "facebook" => Ok(StreamPlatform::Facebook),
            "x" | "twitter" => Ok(StreamPlatform::X),
            "discord" => Ok(StreamPlatform::Discord),
            other => Err(Error::InvalidPlatform(other.to_string())),
        }
    }
}
