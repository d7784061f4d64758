use chrono::{DateTime, Utc};

/// Platform-neutral embed; the Discord runtime turns it into a twilight `Embed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscordEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: Option<u32>,
    pub author: Option<DiscordEmbedAuthor>,
    pub thumbnail: Option<DiscordEmbedThumbnail>,
    pub image: Option<String>,
    pub fields: Vec<DiscordEmbedField>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl DiscordEmbed {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordEmbedAuthor {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordEmbedThumbnail {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordEmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

pub struct DiscordColor;

impl DiscordColor {
    pub const TWITCH_PURPLE: u32 = 0x9146FF;
    pub const YOUTUBE_RED: u32 = 0xFF0000;
    pub const KICK_GREEN: u32 = 0x53FC18;
    pub const TIKTOK_BLACK: u32 = 0x010101;
    pub const RUMBLE_GREEN: u32 = 0x85C742;
    pub const INSTAGRAM_PINK: u32 = 0xE1306C;
    pub const FACEBOOK_BLUE: u32 = 0x1877F2;
    pub const X_BLACK: u32 = 0x14171A;
    pub const DISCORD_BLURPLE: u32 = 0x5865F2;
}

/// Kind of a cached presence activity, mirrored from the gateway model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Playing,
    Streaming,
    Listening,
    Watching,
    Custom,
    Competing,
    Other,
}

/// One entry of a member's "currently doing" list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceActivity {
    pub kind: ActivityKind,
    pub name: String,
    pub url: Option<String>,
    pub details: Option<String>,
    pub state: Option<String>,
    pub large_image: Option<String>,
}

impl PresenceActivity {
    pub fn streaming(name: &str, url: &str) -> Self {
        Self {
            kind: ActivityKind::Streaming,
            name: name.to_string(),
            url: Some(url.to_string()),
            details: None,
            state: None,
            large_image: None,
        }
    }
}
