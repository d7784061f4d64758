// File: src/platforms/youtube/client.rs

use std::sync::Arc;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::http::HttpClient;
use crate::platforms::cooldown::ApiCooldown;
use crate::Error;

pub const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Default, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelItem {
    pub id: String,
    pub snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    pub title: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    #[serde(default)]
    pub default: Option<Thumbnail>,
    #[serde(default)]
    pub medium: Option<Thumbnail>,
    #[serde(default)]
    pub high: Option<Thumbnail>,
    #[serde(default)]
    pub maxres: Option<Thumbnail>,
}

impl Thumbnails {
    /// Largest available thumbnail.
    pub fn best(&self) -> Option<String> {
        [&self.maxres, &self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url.clone())
            .next()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

/// A resolved channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
    pub avatar_url: Option<String>,
}

/// The broadcast currently live on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveVideo {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: Option<String>,
}

impl LiveVideo {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// YouTube Data API v3 client keyed by a plain API key.
///
/// `search` costs 100 quota units per call, so callers are expected to cache
/// [`YouTubeClient::live_video`] results. Quota exhaustion trips the cooldown.
pub struct YouTubeClient {
    http: Arc<dyn HttpClient>,
    api_key: String,
    cooldown: ApiCooldown,
}

impl YouTubeClient {
    pub fn new(http: Arc<dyn HttpClient>, api_key: &str, cooldown_window: chrono::Duration) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            cooldown: ApiCooldown::new("youtube", cooldown_window),
        }
    }

    pub fn cooldown(&self) -> &ApiCooldown {
        &self.cooldown
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T, Error> {
        self.cooldown.check(Utc::now())?;

        let mut url = format!("{}/{}?key={}", API_BASE, endpoint, urlencoding::encode(&self.api_key));
        for (k, v) in query {
            url.push('&');
            url.push_str(k);
            url.push('=');
            url.push_str(&urlencoding::encode(v));
        }
        debug!("YouTube GET {} {:?}", endpoint, query);

        let resp = self.http.get(url, Vec::new()).await?;
        if resp.is_rate_limited() {
            return Err(self.cooldown.trip(Utc::now()));
        }
        if !resp.is_success() {
            return Err(Error::Platform(format!(
                "YouTube {}: HTTP {} => {}",
                endpoint, resp.status, resp.body
            )));
        }
        resp.json()
            .map_err(|e| Error::Platform(format!("YouTube {} parse error: {}", endpoint, e)))
    }

    /// Resolve an `@handle` to its channel.
    pub async fn channel_by_handle(&self, handle: &str) -> Result<Option<ChannelInfo>, Error> {
        let resp: ChannelListResponse = self
            .get_json("channels", &[("part", "snippet"), ("forHandle", handle)])
            .await?;
        Ok(resp.items.into_iter().next().map(ChannelInfo::from))
    }

    pub async fn channel_by_id(&self, channel_id: &str) -> Result<Option<ChannelInfo>, Error> {
        let resp: ChannelListResponse = self
            .get_json("channels", &[("part", "snippet"), ("id", channel_id)])
            .await?;
        Ok(resp.items.into_iter().next().map(ChannelInfo::from))
    }

    /// `Some` when the channel has a live broadcast right now.
    pub async fn live_video(&self, channel_id: &str) -> Result<Option<LiveVideo>, Error> {
        let resp: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id),
                    ("eventType", "live"),
                    ("type", "video"),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        Ok(resp.items.into_iter().find_map(|item| {
            let video_id = item.id.video_id?;
            Some(LiveVideo {
                video_id,
                title: item.snippet.title,
                channel_title: item.snippet.channel_title,
                thumbnail_url: item.snippet.thumbnails.best(),
            })
        }))
    }
}

impl From<ChannelItem> for ChannelInfo {
    fn from(item: ChannelItem) -> Self {
        ChannelInfo {
            id: item.id,
            title: item.snippet.title,
            avatar_url: item.snippet.thumbnails.best(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockHttpClient};

    #[tokio::test]
    async fn handle_lookup_uses_for_handle() -> Result<(), Error> {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .withf(|url, _| url.contains("/channels?key=k") && url.contains("forHandle=%40someone"))
            .times(1)
            .returning(|_, _| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"items":[{"id":"UC123","snippet":{"title":"Someone","customUrl":"@someone",
                        "thumbnails":{"default":{"url":"https://yt3/d.jpg"},"high":{"url":"https://yt3/h.jpg"}}}}]}"#,
                ))
            });

        let client = YouTubeClient::new(Arc::new(http), "k", chrono::Duration::hours(1));
        let channel = client.channel_by_handle("@someone").await?;
        assert_eq!(
            channel,
            Some(ChannelInfo {
                id: "UC123".into(),
                title: "Someone".into(),
                avatar_url: Some("https://yt3/h.jpg".into()),
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_search_means_offline() -> Result<(), Error> {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .withf(|url, _| url.contains("eventType=live") && url.contains("channelId=UC123"))
            .returning(|_, _| Ok(HttpResponse::new(200, r#"{"items":[]}"#)));

        let client = YouTubeClient::new(Arc::new(http), "k", chrono::Duration::hours(1));
        assert_eq!(client.live_video("UC123").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn quota_exhaustion_blocks_the_next_call() {
        let mut http = MockHttpClient::new();
        http.expect_get().times(1).returning(|_, _| {
            Ok(HttpResponse::new(
                403,
                r#"{"error":{"errors":[{"reason":"quotaExceeded"}]}}"#,
            ))
        });

        let client = YouTubeClient::new(Arc::new(http), "k", chrono::Duration::hours(1));
        assert!(matches!(client.live_video("UC1").await, Err(Error::RateLimited { .. })));
        assert!(matches!(client.live_video("UC1").await, Err(Error::RateLimited { .. })));
    }
}
