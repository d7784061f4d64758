// File: src/services/stream_notifier/probers/presence.rs

use std::sync::Arc;
use async_trait::async_trait;
use tracing::trace;

use livecord_common::models::discord::{ActivityKind, PresenceActivity};
use livecord_common::models::platform::StreamPlatform;
use livecord_common::models::probe::{ProbeResult, StreamMetadata};
use livecord_common::models::stream::StreamEntry;
use livecord_common::traits::api::DiscordApi;

use crate::services::stream_notifier::prober::Prober;
use crate::services::stream_notifier::render::profile_url;
use crate::Error;

/// Live detection from the gateway cache: no network calls, no cooldown.
///
/// For `discord` the member counts as live while connected to a voice channel;
/// every other platform looks for a matching presence activity.
pub struct PresenceProber {
    platform: StreamPlatform,
    discord: Arc<dyn DiscordApi>,
}

impl PresenceProber {
    pub fn new(platform: StreamPlatform, discord: Arc<dyn DiscordApi>) -> Self {
        Self { platform, discord }
    }

    fn activity_matches(&self, activity: &PresenceActivity) -> bool {
        let url_hit = activity.url.as_deref().is_some_and(|url| {
            let url = url.to_lowercase();
            self.platform
                .presence_signatures()
                .iter()
                .any(|sig| url.contains(sig))
        });
        url_hit || activity.name.eq_ignore_ascii_case(self.platform.display_name())
    }

    /// Streaming activities win over any other match.
    fn find_activity<'a>(&self, activities: &'a [PresenceActivity]) -> Option<&'a PresenceActivity> {
        let mut matching = activities.iter().filter(|a| self.activity_matches(a));
        let first = matching.next()?;
        if first.kind == ActivityKind::Streaming {
            return Some(first);
        }
        Some(
            matching
                .find(|a| a.kind == ActivityKind::Streaming)
                .unwrap_or(first),
        )
    }
}

#[async_trait]
impl Prober for PresenceProber {
    fn platform(&self) -> StreamPlatform {
        self.platform
    }

    async fn probe(&self, guild_id: &str, entry: &StreamEntry) -> Result<ProbeResult, Error> {
        let user_id = entry.bound_discord_user_id.as_deref().ok_or_else(|| {
            Error::ConfigMissing(format!(
                "{}:{} has no bound Discord member",
                entry.platform, entry.external_id
            ))
        })?;

        let name = self
            .discord
            .member_display_name(guild_id, user_id)
            .unwrap_or_else(|| entry.external_id.clone());

        if self.platform == StreamPlatform::Discord {
            return Ok(match self.discord.member_voice_channel(guild_id, user_id) {
                Some(channel) => ProbeResult::live(StreamMetadata {
                    name,
                    title: "In a voice channel".to_string(),
                    url: format!("https://discord.com/channels/{}/{}", guild_id, channel),
                    ..Default::default()
                }),
                None => ProbeResult::offline(StreamMetadata { name, ..Default::default() }),
            });
        }

        let activities = self.discord.member_activities(guild_id, user_id);
        trace!("{} activities cached for member {}", activities.len(), user_id);
        let fallback_url = profile_url(self.platform, &entry.external_id)
            .filter(|_| entry.external_id != user_id)
            .unwrap_or_default();

        let Some(activity) = self.find_activity(&activities) else {
            return Ok(ProbeResult::offline(StreamMetadata {
                name,
                url: fallback_url,
                ..Default::default()
            }));
        };

        let title = activity
            .details
            .clone()
            .or_else(|| activity.state.clone())
            .unwrap_or_else(|| activity.name.clone());

        Ok(ProbeResult::live(StreamMetadata {
            name,
            title,
            url: activity.url.clone().unwrap_or(fallback_url),
            thumbnail_url: activity
                .large_image
                .clone()
                .filter(|img| img.starts_with("http")),
            avatar_url: None,
            category: None,
        }))
    }
}
