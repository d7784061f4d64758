// tests/registry_tests.rs

use std::fs;

use livecord_common::models::platform::StreamPlatform;
use livecord_common::models::stream::{PresenceRule, StreamEntry, StreamPatch};
use livecord_common::traits::repository_traits::StreamRegistryRepository;
use livecord_core::repositories::json::JsonStreamRegistry;
use livecord_core::Error;

#[tokio::test]
async fn duplicate_add_leaves_list_unchanged() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let registry = JsonStreamRegistry::open(dir.path().join("streams.json"))?;

    registry
        .add("1", StreamEntry::new(StreamPlatform::Twitch, "Foo", "100"))
        .await?;
    let res = registry
        .add("1", StreamEntry::new(StreamPlatform::Twitch, "foo", "200"))
        .await;
    assert!(matches!(res, Err(Error::DuplicateEntry(_))));

    let entries = registry.list("1").await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].discord_channel_id, "100");

    // same id on another guild is a separate entry
    registry
        .add("2", StreamEntry::new(StreamPlatform::Twitch, "foo", "300"))
        .await?;
    assert_eq!(registry.guild_ids().await?, vec!["1".to_string(), "2".to_string()]);
    Ok(())
}

#[tokio::test]
async fn removing_an_unknown_entry_reports_zero() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let registry = JsonStreamRegistry::open(dir.path().join("streams.json"))?;
    registry
        .add("1", StreamEntry::new(StreamPlatform::Twitch, "foo", "100"))
        .await?;

    assert_eq!(registry.remove("1", StreamPlatform::Twitch, "bar").await?, 0);
    assert_eq!(registry.remove("9", StreamPlatform::Twitch, "foo").await?, 0);
    assert_eq!(registry.remove("1", StreamPlatform::YouTube, "foo").await?, 0);
    assert_eq!(registry.list("1").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn update_of_missing_entry_is_not_found() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let registry = JsonStreamRegistry::open(dir.path().join("streams.json"))?;
    let patch = StreamPatch {
        discord_channel_id: Some("5".into()),
        ..Default::default()
    };
    let res = registry.update("1", StreamPlatform::Kick, "nobody", patch).await;
    assert!(matches!(res, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn update_applies_patch_and_normalizes_roles() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let registry = JsonStreamRegistry::open(dir.path().join("streams.json"))?;
    let mut entry = StreamEntry::new(StreamPlatform::YouTube, "@Chan", "100");
    entry.vod_message_template = Some("vod {url}".into());
    registry.add("1", entry).await?;

    let patch = StreamPatch {
        live_message_template: Some("{name} up".into()),
        vod_message_template: Some(String::new()),
        live_role_ids: Some(vec!["<@&7>".into(), "7".into(), "8".into()]),
        ..Default::default()
    };
    let updated = registry.update("1", StreamPlatform::YouTube, "@chan", patch).await?;

    assert_eq!(updated.live_message_template, "{name} up");
    assert_eq!(updated.vod_message_template, None);
    assert_eq!(updated.live_role_ids.iter().collect::<Vec<_>>(), vec!["7", "8"]);
    assert_eq!(
        registry.get("1", StreamPlatform::YouTube, "@CHAN").await?,
        Some(updated)
    );
    Ok(())
}

#[tokio::test]
async fn entries_survive_reopen() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("streams.json");
    {
        let registry = JsonStreamRegistry::open(&path)?;
        let mut entry = StreamEntry::new(StreamPlatform::Kick, "555", "100");
        entry.bound_discord_user_id = Some("<@555>".into());
        registry.add("1", entry).await?;
        let mut rule = PresenceRule::new(StreamPlatform::TikTok);
        rule.discord_channel_id = Some("<#200>".into());
        registry.set_presence("1", StreamPlatform::TikTok, rule).await?;
    }

    let registry = JsonStreamRegistry::open(&path)?;
    let entries = registry.list("1").await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].bound_discord_user_id.as_deref(), Some("555"));

    let presence = registry.get_presence("1").await?;
    let rule = presence.get(&StreamPlatform::TikTok).expect("rule persisted");
    assert_eq!(rule.discord_channel_id.as_deref(), Some("200"));
    Ok(())
}

#[tokio::test]
async fn legacy_documents_load() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("streams.json");
    fs::write(
        &path,
        r#"{
            "guilds": {
                "1": {
                    "streams": [
                        {"platform": "twitch", "id": "Foo", "channelId": "100", "message": "{name} live"},
                        {"platform": "kick", "id": "555", "channelId": "100", "userId": "555", "liveRoleIds": ["9"]}
                    ],
                    "presence": {
                        "tiktok": {"platform": "tiktok", "channelId": "200", "message": "{name} on tiktok"}
                    }
                }
            }
        }"#,
    )?;

    let registry = JsonStreamRegistry::open(&path)?;
    let twitch = registry
        .get("1", StreamPlatform::Twitch, "foo")
        .await?
        .expect("twitch entry");
    assert_eq!(twitch.live_message_template, "{name} live");

    let kick = registry
        .get("1", StreamPlatform::Kick, "555")
        .await?
        .expect("kick entry");
    assert_eq!(kick.bound_discord_user_id.as_deref(), Some("555"));
    assert!(kick.live_role_ids.contains("9"));

    let presence = registry.get_presence("1").await?;
    assert_eq!(
        presence[&StreamPlatform::TikTok].template(),
        "{name} on tiktok"
    );
    Ok(())
}

#[tokio::test]
async fn presence_rules_can_be_replaced_and_removed() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let registry = JsonStreamRegistry::open(dir.path().join("streams.json"))?;

    let mut rule = PresenceRule::new(StreamPlatform::Kick);
    rule.discord_channel_id = Some("200".into());
    registry.set_presence("1", StreamPlatform::Kick, rule.clone()).await?;
    rule.discord_channel_id = Some("201".into());
    registry.set_presence("1", StreamPlatform::Kick, rule).await?;

    let presence = registry.get_presence("1").await?;
    assert_eq!(presence.len(), 1);
    assert_eq!(presence[&StreamPlatform::Kick].discord_channel_id.as_deref(), Some("201"));

    assert_eq!(registry.remove_presence("1", StreamPlatform::Kick).await?, 1);
    assert_eq!(registry.remove_presence("1", StreamPlatform::Kick).await?, 0);
    assert!(registry.get_presence("1").await?.is_empty());
    assert!(registry.guild_ids().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn writers_on_one_file_keep_each_others_entries() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("streams.json");
    let poller = JsonStreamRegistry::open(&path)?;
    let admin = JsonStreamRegistry::open(&path)?;

    admin
        .add("1", StreamEntry::new(StreamPlatform::Twitch, "foo", "100"))
        .await?;
    poller
        .add("1", StreamEntry::new(StreamPlatform::Twitch, "bar", "100"))
        .await?;
    // stale copy until reloaded
    assert_eq!(admin.list("1").await?.len(), 1);

    admin.reload().await?;
    let ids: Vec<String> = admin.list("1").await?.into_iter().map(|e| e.external_id).collect();
    assert_eq!(ids, vec!["foo".to_string(), "bar".to_string()]);
    assert_eq!(JsonStreamRegistry::open(&path)?.list("1").await?.len(), 2);
    Ok(())
}
