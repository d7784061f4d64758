// ========================================================
// File: livecord-core/src/platforms/twitch_helix/requests/stream.rs
// ========================================================
use serde::Deserialize;
use tracing::debug;

use crate::Error;
use crate::platforms::twitch_helix::client::TwitchHelixClient;

/// Response from "Get Streams" endpoint.
#[derive(Debug, Deserialize)]
pub struct StreamsResponse {
    pub data: Vec<StreamData>,
}

/// Single stream data record. Only live streams are ever returned.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamData {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(rename = "type", default)]
    pub type_field: String,
    #[serde(default)]
    pub title: String,
    /// Template with `{width}`/`{height}` placeholders.
    #[serde(default)]
    pub thumbnail_url: String,
}

/// Response from "Get Users" endpoint.
#[derive(Debug, Deserialize)]
pub struct UsersResponse {
    pub data: Vec<UserData>,
}

/// Single user record.
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

/// `Some` when `login` is currently live.
pub async fn fetch_live_stream(
    client: &TwitchHelixClient,
    login: &str,
) -> Result<Option<StreamData>, Error> {
    let path = format!("streams?user_login={}", urlencoding::encode(login));
    let resp: StreamsResponse = client.get_helix(&path).await?;
    let stream = resp
        .data
        .into_iter()
        .find(|s| s.type_field.is_empty() || s.type_field == "live");
    debug!("Twitch '{}' live={}", login, stream.is_some());
    Ok(stream)
}

pub async fn fetch_user(client: &TwitchHelixClient, login: &str) -> Result<Option<UserData>, Error> {
    let path = format!("users?login={}", urlencoding::encode(login));
    let resp: UsersResponse = client.get_helix(&path).await?;
    Ok(resp.data.into_iter().next())
}
