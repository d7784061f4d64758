// File: src/services/stream_notifier/probers/twitch.rs

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use livecord_common::models::platform::StreamPlatform;
use livecord_common::models::probe::{ProbeResult, StreamMetadata};
use livecord_common::models::stream::StreamEntry;

use crate::cache::{ExpiringCache, Sweep};
use crate::platforms::twitch_helix::client::TwitchHelixClient;
use crate::platforms::twitch_helix::requests::stream::{fetch_live_stream, fetch_user, StreamData, UserData};
use crate::services::stream_notifier::prober::Prober;
use crate::Error;

const STREAM_TTL: Duration = Duration::from_secs(60);
const USER_TTL: Duration = Duration::from_secs(600);

pub struct TwitchProber {
    client: Arc<TwitchHelixClient>,
    streams: Arc<ExpiringCache<String, Option<StreamData>>>,
    users: Arc<ExpiringCache<String, Option<UserData>>>,
}

impl TwitchProber {
    pub fn new(client: Arc<TwitchHelixClient>) -> Self {
        Self {
            client,
            streams: Arc::new(ExpiringCache::new("twitch-streams", STREAM_TTL)),
            users: Arc::new(ExpiringCache::new("twitch-users", USER_TTL)),
        }
    }

    async fn stream(&self, login: &str) -> Result<Option<StreamData>, Error> {
        if let Some(hit) = self.streams.get(&login.to_string()) {
            debug!("twitch stream cache hit for '{}'", login);
            return Ok(hit);
        }
        let stream = fetch_live_stream(&self.client, login).await?;
        self.streams.insert(login.to_string(), stream.clone());
        Ok(stream)
    }

    async fn user(&self, login: &str) -> Result<Option<UserData>, Error> {
        if let Some(hit) = self.users.get(&login.to_string()) {
            return Ok(hit);
        }
        let user = fetch_user(&self.client, login).await?;
        self.users.insert(login.to_string(), user.clone());
        Ok(user)
    }
}

#[async_trait]
impl Prober for TwitchProber {
    fn platform(&self) -> StreamPlatform {
        StreamPlatform::Twitch
    }

    async fn probe(&self, _guild_id: &str, entry: &StreamEntry) -> Result<ProbeResult, Error> {
        let login = entry.normalized_id();
        let url = format!("https://twitch.tv/{}", login);

        let Some(stream) = self.stream(&login).await? else {
            return Ok(ProbeResult::offline(StreamMetadata {
                name: entry.external_id.clone(),
                url,
                ..Default::default()
            }));
        };

        // Avatar is cosmetic; a failed lookup must not hide a live stream.
        let user = match self.user(&login).await {
            Ok(user) => user,
            Err(e) => {
                debug!("twitch user lookup for '{}' failed: {}", login, e);
                None
            }
        };

        let thumbnail = Some(
            stream
                .thumbnail_url
                .replace("{width}", "1280")
                .replace("{height}", "720"),
        )
        .filter(|t| !t.is_empty());

        Ok(ProbeResult::live(StreamMetadata {
            name: stream.user_name.clone(),
            title: stream.title.clone(),
            url,
            thumbnail_url: thumbnail,
            avatar_url: user
                .map(|u| u.profile_image_url)
                .filter(|a| !a.is_empty()),
            category: Some(stream.game_name.clone()).filter(|g| !g.is_empty()),
        }))
    }

    fn suspended_until(&self) -> Option<DateTime<Utc>> {
        self.client.cooldown().suspended_until(Utc::now())
    }

    fn caches(&self) -> Vec<Arc<dyn Sweep>> {
        vec![
            self.streams.clone() as Arc<dyn Sweep>,
            self.users.clone() as Arc<dyn Sweep>,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockHttpClient};
    use crate::platforms::twitch_helix::auth::{AppAccessToken, MockAppTokenSource};

    const LIVE_STREAM: &str = r#"{"data":[{"id":"1","user_id":"2","user_login":"foo","user_name":"Foo",
        "game_name":"Just Chatting","type":"live","title":"T",
        "thumbnail_url":"https://cdn/foo-{width}x{height}.jpg"}]}"#;

    fn prober(http: MockHttpClient) -> TwitchProber {
        let mut tokens = MockAppTokenSource::new();
        tokens.expect_fetch_app_token().times(1).returning(|| {
            Ok(AppAccessToken {
                access_token: "tok".into(),
                expires_in: Duration::from_secs(3600),
            })
        });
        let client = TwitchHelixClient::new(
            Arc::new(http),
            Arc::new(tokens),
            "cid",
            chrono::Duration::hours(1),
        );
        TwitchProber::new(Arc::new(client))
    }

    #[tokio::test]
    async fn live_stream_fills_metadata() -> Result<(), Error> {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .withf(|url, _| url.contains("/streams?user_login=foo"))
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, LIVE_STREAM)));
        http.expect_get()
            .withf(|url, _| url.contains("/users?login=foo"))
            .times(1)
            .returning(|_, _| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"data":[{"id":"2","login":"foo","display_name":"Foo","profile_image_url":"https://cdn/pfp.png"}]}"#,
                ))
            });

        let entry = StreamEntry::new(StreamPlatform::Twitch, "Foo", "10");
        let result = prober(http).probe("1", &entry).await?;
        assert!(result.live);
        assert_eq!(result.metadata.title, "T");
        assert_eq!(result.metadata.url, "https://twitch.tv/foo");
        assert_eq!(result.metadata.thumbnail_url.as_deref(), Some("https://cdn/foo-1280x720.jpg"));
        assert_eq!(result.metadata.avatar_url.as_deref(), Some("https://cdn/pfp.png"));
        assert_eq!(result.metadata.category.as_deref(), Some("Just Chatting"));
        Ok(())
    }

    #[tokio::test]
    async fn cached_stream_lookup_skips_the_network() -> Result<(), Error> {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .withf(|url, _| url.contains("/streams?"))
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, r#"{"data":[]}"#)));

        let prober = prober(http);
        let entry = StreamEntry::new(StreamPlatform::Twitch, "foo", "10");
        assert!(!prober.probe("1", &entry).await?.live);
        assert!(!prober.probe("2", &entry).await?.live);
        Ok(())
    }

    #[tokio::test]
    async fn forbidden_suspends_the_prober() {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(403, "")));

        let prober = prober(http);
        let entry = StreamEntry::new(StreamPlatform::Twitch, "foo", "10");
        assert!(matches!(prober.probe("1", &entry).await, Err(Error::RateLimited { .. })));
        assert!(prober.suspended_until().is_some());
        // no second network call while suspended
        let other = StreamEntry::new(StreamPlatform::Twitch, "bar", "10");
        assert!(matches!(prober.probe("1", &other).await, Err(Error::RateLimited { .. })));
    }
}
