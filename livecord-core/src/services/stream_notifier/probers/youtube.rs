// File: src/services/stream_notifier/probers/youtube.rs

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use livecord_common::models::platform::StreamPlatform;
use livecord_common::models::probe::{ProbeResult, StreamMetadata};
use livecord_common::models::stream::StreamEntry;

use crate::cache::{ExpiringCache, Sweep};
use crate::platforms::youtube::{ChannelInfo, LiveVideo, YouTubeClient};
use crate::services::stream_notifier::prober::Prober;
use crate::services::stream_notifier::render::profile_url;
use crate::Error;

const CHANNEL_TTL: Duration = Duration::from_secs(600);
/// `search` is the quota-heavy call.
const LIVE_TTL: Duration = Duration::from_secs(300);

/// Entries hold either a channel id (`UC...`) or an `@handle`.
pub struct YouTubeProber {
    client: Arc<YouTubeClient>,
    channels: Arc<ExpiringCache<String, ChannelInfo>>,
    live: Arc<ExpiringCache<String, Option<LiveVideo>>>,
}

impl YouTubeProber {
    pub fn new(client: Arc<YouTubeClient>) -> Self {
        Self {
            client,
            channels: Arc::new(ExpiringCache::new("youtube-channels", CHANNEL_TTL)),
            live: Arc::new(ExpiringCache::new("youtube-live", LIVE_TTL)),
        }
    }

    async fn channel(&self, external_id: &str) -> Result<ChannelInfo, Error> {
        let key = StreamPlatform::YouTube.normalize_external_id(external_id);
        if let Some(hit) = self.channels.get(&key) {
            return Ok(hit);
        }
        let resolved = if key.starts_with('@') {
            self.client.channel_by_handle(&key).await?
        } else {
            self.client.channel_by_id(&key).await?
        };
        let channel = resolved
            .ok_or_else(|| Error::NotFound(format!("YouTube channel '{}'", external_id)))?;
        debug!("Resolved YouTube '{}' to channel {}", external_id, channel.id);
        self.channels.insert(key, channel.clone());
        Ok(channel)
    }

    async fn live_video(&self, channel_id: &str) -> Result<Option<LiveVideo>, Error> {
        if let Some(hit) = self.live.get(&channel_id.to_string()) {
            return Ok(hit);
        }
        let video = self.client.live_video(channel_id).await?;
        self.live.insert(channel_id.to_string(), video.clone());
        Ok(video)
    }
}

#[async_trait]
impl Prober for YouTubeProber {
    fn platform(&self) -> StreamPlatform {
        StreamPlatform::YouTube
    }

    async fn probe(&self, _guild_id: &str, entry: &StreamEntry) -> Result<ProbeResult, Error> {
        let channel = self.channel(&entry.external_id).await?;
        let channel_url = profile_url(StreamPlatform::YouTube, &channel.id).unwrap_or_default();

        match self.live_video(&channel.id).await? {
            Some(video) => Ok(ProbeResult::live(StreamMetadata {
                name: if video.channel_title.is_empty() {
                    channel.title.clone()
                } else {
                    video.channel_title.clone()
                },
                title: video.title.clone(),
                url: video.watch_url(),
                thumbnail_url: video.thumbnail_url.clone(),
                avatar_url: channel.avatar_url.clone(),
                category: None,
            })),
            None => Ok(ProbeResult::offline(StreamMetadata {
                name: channel.title.clone(),
                url: channel_url,
                avatar_url: channel.avatar_url.clone(),
                ..Default::default()
            })),
        }
    }

    fn suspended_until(&self) -> Option<DateTime<Utc>> {
        self.client.cooldown().suspended_until(Utc::now())
    }

    fn caches(&self) -> Vec<Arc<dyn Sweep>> {
        vec![
            self.channels.clone() as Arc<dyn Sweep>,
            self.live.clone() as Arc<dyn Sweep>,
        ]
    }
}
