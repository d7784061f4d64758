// File: src/services/stream_notifier/render.rs

use chrono::{DateTime, Utc};

use livecord_common::models::discord::{
    DiscordColor, DiscordEmbed, DiscordEmbedAuthor, DiscordEmbedField, DiscordEmbedThumbnail,
};
use livecord_common::models::platform::StreamPlatform;
use livecord_common::models::probe::StreamMetadata;

/// Per-platform embed styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformStyle {
    pub display_name: &'static str,
    pub color: u32,
    domain: &'static str,
}

impl PlatformStyle {
    pub fn for_platform(platform: StreamPlatform) -> Self {
        let (color, domain) = match platform {
            StreamPlatform::Twitch => (DiscordColor::TWITCH_PURPLE, "twitch.tv"),
            StreamPlatform::YouTube => (DiscordColor::YOUTUBE_RED, "youtube.com"),
            StreamPlatform::Kick => (DiscordColor::KICK_GREEN, "kick.com"),
            StreamPlatform::TikTok => (DiscordColor::TIKTOK_BLACK, "tiktok.com"),
            StreamPlatform::Rumble => (DiscordColor::RUMBLE_GREEN, "rumble.com"),
            StreamPlatform::Instagram => (DiscordColor::INSTAGRAM_PINK, "instagram.com"),
            StreamPlatform::Facebook => (DiscordColor::FACEBOOK_BLUE, "facebook.com"),
            StreamPlatform::X => (DiscordColor::X_BLACK, "x.com"),
            StreamPlatform::Discord => (DiscordColor::DISCORD_BLURPLE, "discord.com"),
        };
        Self {
            display_name: platform.display_name(),
            color,
            domain,
        }
    }

    pub fn icon_url(&self) -> String {
        format!("https://www.google.com/s2/favicons?domain={}&sz=128", self.domain)
    }
}

/// Literal placeholder substitution. Unknown braces are left as-is.
pub fn render_template(template: &str, meta: &StreamMetadata, platform: StreamPlatform) -> String {
    template
        .replace("{name}", &meta.name)
        .replace("{title}", &meta.title)
        .replace("{url}", &meta.url)
        .replace("{platform}", platform.display_name())
}

/// Public profile/channel page for an external id, when the platform has one.
pub fn profile_url(platform: StreamPlatform, external_id: &str) -> Option<String> {
    let id = external_id.trim();
    let handle = id.trim_start_matches('@');
    match platform {
        StreamPlatform::Twitch => Some(format!("https://twitch.tv/{}", id.to_lowercase())),
        StreamPlatform::YouTube if id.starts_with('@') => Some(format!("https://www.youtube.com/{}", id)),
        StreamPlatform::YouTube => Some(format!("https://www.youtube.com/channel/{}", id)),
        StreamPlatform::Kick => Some(format!("https://kick.com/{}", handle)),
        StreamPlatform::TikTok => Some(format!("https://www.tiktok.com/@{}/live", handle)),
        StreamPlatform::Rumble => Some(format!("https://rumble.com/c/{}", handle)),
        StreamPlatform::Instagram => Some(format!("https://www.instagram.com/{}", handle)),
        StreamPlatform::Facebook => Some(format!("https://www.facebook.com/{}", handle)),
        StreamPlatform::X => Some(format!("https://x.com/{}", handle)),
        StreamPlatform::Discord => None,
    }
}

pub fn build_live_embed(
    platform: StreamPlatform,
    meta: &StreamMetadata,
    now: DateTime<Utc>,
) -> DiscordEmbed {
    let style = PlatformStyle::for_platform(platform);
    let url = Some(meta.url.clone()).filter(|u| !u.is_empty());

    let mut embed = DiscordEmbed::new();
    embed.title = Some(format!("{} is live on {}!", meta.name, style.display_name));
    embed.description = Some(meta.title.clone()).filter(|t| !t.is_empty());
    embed.url = url.clone();
    embed.color = Some(style.color);
    embed.author = Some(DiscordEmbedAuthor {
        name: meta.name.clone(),
        url,
        icon_url: meta.avatar_url.clone(),
    });
    embed.thumbnail = Some(DiscordEmbedThumbnail { url: style.icon_url() });
    embed.image = meta
        .thumbnail_url
        .clone()
        .or_else(|| meta.avatar_url.clone())
        .or_else(|| Some(style.icon_url()));

    if let Some(category) = meta.category.as_ref().filter(|c| !c.is_empty()) {
        embed.fields.push(DiscordEmbedField {
            name: "Category".to_string(),
            value: category.clone(),
            inline: true,
        });
    }
    embed.footer = Some(style.display_name.to_string());
    embed.timestamp = Some(now);
    embed
}
