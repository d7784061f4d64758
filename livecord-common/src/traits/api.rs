use async_trait::async_trait;

use crate::error::Error;
use crate::models::discord::{DiscordEmbed, PresenceActivity};

/// Everything the notifier needs from Discord.
///
/// Delivery and role calls go over REST; presence, voice and member listings are
/// answered from the gateway cache and never hit the network.
#[async_trait]
pub trait DiscordApi: Send + Sync {
    /// Returns the id of the created message.
    async fn send_discord_message(&self, channel_id: &str, text: &str) -> Result<String, Error>;

    /// Returns the id of the created message.
    async fn send_discord_embed(
        &self,
        channel_id: &str,
        embed: &DiscordEmbed,
        content: Option<&str>,
    ) -> Result<String, Error>;

    async fn add_role_to_discord_user(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), Error>;

    async fn remove_role_from_discord_user(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), Error>;

    /// `Ok(None)` when the member is not in the guild.
    async fn member_role_ids(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<Vec<String>>, Error>;

    fn member_activities(&self, guild_id: &str, user_id: &str) -> Vec<PresenceActivity>;

    fn member_voice_channel(&self, guild_id: &str, user_id: &str) -> Option<String>;

    fn guild_member_ids(&self, guild_id: &str) -> Vec<String>;

    /// Nickname, then global display name, then username.
    fn member_display_name(&self, guild_id: &str, user_id: &str) -> Option<String>;
}
