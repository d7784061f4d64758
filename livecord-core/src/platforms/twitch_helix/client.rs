// File: src/platforms/twitch_helix/client.rs

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::ExpiringCache;
use crate::http::HttpClient;
use crate::platforms::cooldown::ApiCooldown;
use crate::Error;
use super::auth::AppTokenSource;

pub const HELIX_BASE: &str = "https://api.twitch.tv/helix";

const TOKEN_KEY: &str = "app";
/// Refresh the app token this long before Twitch says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Entry point for every Helix call.
///
/// Holds the app access token (fetched lazily, cached until shortly before
/// expiry) and the platform cooldown. A 401 drops the cached token so the next
/// call fetches a fresh one.
pub struct TwitchHelixClient {
    http: Arc<dyn HttpClient>,
    tokens: Arc<dyn AppTokenSource>,
    client_id: String,
    token: ExpiringCache<&'static str, String>,
    cooldown: ApiCooldown,
}

impl TwitchHelixClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        tokens: Arc<dyn AppTokenSource>,
        client_id: &str,
        cooldown_window: chrono::Duration,
    ) -> Self {
        Self {
            http,
            tokens,
            client_id: client_id.to_string(),
            token: ExpiringCache::new("twitch-app-token", Duration::from_secs(3600)),
            cooldown: ApiCooldown::new("twitch", cooldown_window),
        }
    }

    pub fn cooldown(&self) -> &ApiCooldown {
        &self.cooldown
    }

    async fn app_token(&self) -> Result<String, Error> {
        if let Some(token) = self.token.get(&TOKEN_KEY) {
            return Ok(token);
        }
        let fresh = self.tokens.fetch_app_token().await?;
        let ttl = fresh
            .expires_in
            .saturating_sub(TOKEN_EXPIRY_MARGIN)
            .max(Duration::from_secs(1));
        self.token.insert_with_ttl(TOKEN_KEY, fresh.access_token.clone(), ttl);
        Ok(fresh.access_token)
    }

    /// GET `{HELIX_BASE}/{path_and_query}` and decode the body.
    pub async fn get_helix<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, Error> {
        self.cooldown.check(Utc::now())?;
        let token = self.app_token().await?;

        let url = format!("{}/{}", HELIX_BASE, path_and_query.trim_start_matches('/'));
        debug!("Helix GET {}", url);
        let headers = vec![
            ("Client-Id".to_string(), self.client_id.clone()),
            ("Authorization".to_string(), format!("Bearer {}", token)),
        ];
        let resp = self.http.get(url, headers).await?;

        if resp.status == 401 {
            warn!("Helix rejected the app token; it will be refreshed on the next call");
            self.token.remove(&TOKEN_KEY);
            return Err(Error::Auth("Twitch app token rejected".into()));
        }
        if resp.is_rate_limited() {
            return Err(self.cooldown.trip(Utc::now()));
        }
        if !resp.is_success() {
            return Err(Error::Platform(format!(
                "Helix {}: HTTP {} => {}",
                path_and_query, resp.status, resp.body
            )));
        }

        resp.json()
            .map_err(|e| Error::Platform(format!("Helix {} parse error: {}", path_and_query, e)))
    }
}
