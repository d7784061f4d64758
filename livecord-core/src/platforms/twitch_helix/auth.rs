// File: src/platforms/twitch_helix/auth.rs

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use tracing::{debug, error};
use twitch_oauth2::{ClientId, ClientSecret, TwitchToken};

use crate::Error;

/// App access token from the client-credentials grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppAccessToken {
    pub access_token: String,
    pub expires_in: Duration,
}

/// Source of app access tokens for Helix calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppTokenSource: Send + Sync {
    async fn fetch_app_token(&self) -> Result<AppAccessToken, Error>;
}

/// Client-credentials grant against the Twitch id endpoint, via `twitch_oauth2`.
pub struct ClientCredentials {
    http: ReqwestClient,
    client_id: ClientId,
    client_secret: ClientSecret,
}

impl ClientCredentials {
    pub fn new(client_id: &str, client_secret: &str, timeout: Duration) -> Self {
        let http = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default reqwest client: {e}");
                ReqwestClient::new()
            });
        Self {
            http,
            client_id: ClientId::new(client_id.to_string()),
            client_secret: ClientSecret::new(client_secret.to_string()),
        }
    }
}

#[async_trait]
impl AppTokenSource for ClientCredentials {
    async fn fetch_app_token(&self) -> Result<AppAccessToken, Error> {
        let token = twitch_oauth2::AppAccessToken::get_app_access_token(
            &self.http,
            self.client_id.clone(),
            self.client_secret.clone(),
            vec![],
        )
        .await
        .map_err(|e| {
            error!("Twitch token exchange failed: {e}");
            Error::Auth(format!("Twitch token exchange failed: {e}"))
        })?;

        let expires_in = token.expires_in();
        debug!("Obtained Twitch app token (expires_in={}s)", expires_in.as_secs());
        Ok(AppAccessToken {
            access_token: token.access_token.as_str().to_string(),
            expires_in,
        })
    }
}

