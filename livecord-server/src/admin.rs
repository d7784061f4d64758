// Admin CLI handlers. Each one maps to a single registry or notifier operation.

use tracing::info;

use livecord_common::models::stream::{normalize_role_ids, PresenceRule, StreamEntry, StreamPatch};
use livecord_common::traits::repository_traits::StreamRegistryRepository;
use livecord_core::Error;

use crate::context::ServerContext;
use crate::{PresenceCommand, StreamCommand};

pub async fn run_stream_command(ctx: &ServerContext, cmd: StreamCommand) -> Result<(), Error> {
    match cmd {
        StreamCommand::Add {
            guild,
            platform,
            external_id,
            channel,
            message,
            vod_message,
            user,
            live_roles,
            whitelist_roles,
        } => {
            let mut entry = StreamEntry::new(platform, &external_id, &channel);
            if let Some(message) = message {
                entry.live_message_template = message;
            }
            entry.vod_message_template = vod_message.filter(|m| !m.is_empty());
            entry.bound_discord_user_id = user;
            entry.live_role_ids = normalize_role_ids(&live_roles);
            entry.whitelist_role_ids = normalize_role_ids(&whitelist_roles);

            let stored = ctx.registry.add(&guild, entry).await?;
            info!("Added {}:{} to guild {}", stored.platform, stored.external_id, guild);
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
        StreamCommand::Remove { guild, platform, external_id } => {
            let removed = ctx.notifier.remove_entry(&guild, platform, &external_id).await?;
            println!("Removed {} entr{}", removed, if removed == 1 { "y" } else { "ies" });
        }
        StreamCommand::Edit {
            guild,
            platform,
            external_id,
            channel,
            message,
            vod_message,
            user,
            live_roles,
            whitelist_roles,
        } => {
            let patch = StreamPatch {
                discord_channel_id: channel,
                live_message_template: message,
                vod_message_template: vod_message,
                bound_discord_user_id: user,
                live_role_ids: live_roles,
                whitelist_role_ids: whitelist_roles,
            };
            let updated = ctx.registry.update(&guild, platform, &external_id, patch).await?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        StreamCommand::List { guild } => {
            let entries = ctx.registry.list(&guild).await?;
            if entries.is_empty() {
                println!("No streams tracked in guild {}", guild);
            }
            for entry in entries {
                println!(
                    "{:<10} {:<28} -> #{} roles={:?} member={}",
                    entry.platform,
                    entry.external_id,
                    entry.discord_channel_id,
                    entry.live_role_ids,
                    entry.bound_discord_user_id.as_deref().unwrap_or("-"),
                );
            }
        }
        StreamCommand::Test { guild, platform, external_id } => {
            let message_id = ctx
                .notifier
                .send_test_notification(&guild, platform, &external_id)
                .await?;
            println!("Sent test notification (message {})", message_id);
        }
    }
    Ok(())
}

pub async fn run_presence_command(ctx: &ServerContext, cmd: PresenceCommand) -> Result<(), Error> {
    match cmd {
        PresenceCommand::Set {
            guild,
            platform,
            channel,
            message,
            live_roles,
            whitelist_roles,
        } => {
            let mut rule = PresenceRule::new(platform);
            rule.discord_channel_id = channel;
            rule.message_template = message.filter(|m| !m.is_empty());
            rule.live_role_ids = normalize_role_ids(&live_roles);
            rule.whitelist_role_ids = normalize_role_ids(&whitelist_roles);
            ctx.registry.set_presence(&guild, platform, rule).await?;
            println!("Presence rule for {} set in guild {}", platform, guild);
        }
        PresenceCommand::Remove { guild, platform } => {
            let removed = ctx.notifier.remove_presence_rule(&guild, platform).await?;
            println!("Removed {} presence rule(s)", removed);
        }
        PresenceCommand::Show { guild } => {
            let rules = ctx.registry.get_presence(&guild).await?;
            if rules.is_empty() {
                println!("No presence rules in guild {}", guild);
            } else {
                println!("{}", serde_json::to_string_pretty(&rules)?);
            }
        }
    }
    Ok(())
}
