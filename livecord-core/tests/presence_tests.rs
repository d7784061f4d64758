// tests/presence_tests.rs

mod test_utils;

use livecord_common::models::discord::{ActivityKind, PresenceActivity};
use livecord_common::models::platform::StreamPlatform;
use livecord_common::models::stream::StreamEntry;
use livecord_core::services::stream_notifier::probers::PresenceProber;
use livecord_core::services::stream_notifier::Prober;
use livecord_core::Error;

use test_utils::helpers::FakeDiscord;

fn bound_entry(platform: StreamPlatform, user: &str) -> StreamEntry {
    let mut entry = StreamEntry::new(platform, user, "100");
    entry.bound_discord_user_id = Some(user.to_string());
    entry
}

fn playing(name: &str, url: Option<&str>) -> PresenceActivity {
    PresenceActivity {
        kind: ActivityKind::Playing,
        name: name.to_string(),
        url: url.map(str::to_string),
        details: None,
        state: None,
        large_image: None,
    }
}

#[tokio::test]
async fn url_signature_marks_member_live() -> Result<(), Error> {
    let discord = FakeDiscord::new();
    let mut activity = PresenceActivity::streaming("Some Game", "https://KICK.com/Streamer");
    activity.details = Some("Ranked grind".into());
    activity.large_image = Some("https://cdn.example/thumb.png".into());
    discord.set_activities("42", vec![activity]);
    discord.names.lock().insert("42".into(), "Streamer".into());

    let prober = PresenceProber::new(StreamPlatform::Kick, discord);
    let result = prober.probe("1", &bound_entry(StreamPlatform::Kick, "42")).await?;

    assert!(result.live);
    assert_eq!(result.metadata.name, "Streamer");
    assert_eq!(result.metadata.title, "Ranked grind");
    assert_eq!(result.metadata.url, "https://KICK.com/Streamer");
    assert_eq!(
        result.metadata.thumbnail_url.as_deref(),
        Some("https://cdn.example/thumb.png")
    );
    Ok(())
}

#[tokio::test]
async fn streaming_activity_is_preferred() -> Result<(), Error> {
    let discord = FakeDiscord::new();
    let mut streaming = PresenceActivity::streaming("Twitch", "https://www.twitch.tv/someone");
    streaming.state = Some("Just Chatting".into());
    discord.set_activities(
        "42",
        vec![playing("Twitch", Some("https://twitch.tv/other")), streaming],
    );

    let prober = PresenceProber::new(StreamPlatform::Twitch, discord);
    let result = prober.probe("1", &bound_entry(StreamPlatform::Twitch, "42")).await?;

    assert!(result.live);
    assert_eq!(result.metadata.url, "https://www.twitch.tv/someone");
    assert_eq!(result.metadata.title, "Just Chatting");
    Ok(())
}

#[tokio::test]
async fn activity_name_matches_case_insensitively() -> Result<(), Error> {
    let discord = FakeDiscord::new();
    let mut activity = playing("tiktok", None);
    activity.large_image = Some("mp:external/abc".into());
    discord.set_activities("42", vec![activity]);

    let prober = PresenceProber::new(StreamPlatform::TikTok, discord);
    let mut entry = bound_entry(StreamPlatform::TikTok, "42");
    entry.external_id = "@creator".into();
    let result = prober.probe("1", &entry).await?;

    assert!(result.live);
    assert_eq!(result.metadata.title, "tiktok");
    assert_eq!(result.metadata.url, "https://www.tiktok.com/@creator/live");
    assert_eq!(result.metadata.thumbnail_url, None);
    Ok(())
}

#[tokio::test]
async fn unrelated_activities_read_as_offline() -> Result<(), Error> {
    let discord = FakeDiscord::new();
    discord.set_activities(
        "42",
        vec![
            playing("Minecraft", None),
            PresenceActivity::streaming("Minecraft", "https://www.youtube.com/watch?v=x"),
        ],
    );

    let prober = PresenceProber::new(StreamPlatform::Kick, discord);
    let result = prober.probe("1", &bound_entry(StreamPlatform::Kick, "42")).await?;
    assert!(!result.live);
    assert_eq!(result.metadata.name, "42");
    Ok(())
}

#[tokio::test]
async fn discord_platform_uses_voice_channel() -> Result<(), Error> {
    let discord = FakeDiscord::new();
    discord.voice.lock().insert("42".into(), "777".into());

    let prober = PresenceProber::new(StreamPlatform::Discord, discord.clone());
    let result = prober.probe("1", &bound_entry(StreamPlatform::Discord, "42")).await?;
    assert!(result.live);
    assert_eq!(result.metadata.url, "https://discord.com/channels/1/777");

    discord.voice.lock().clear();
    let result = prober.probe("1", &bound_entry(StreamPlatform::Discord, "42")).await?;
    assert!(!result.live);
    Ok(())
}

#[tokio::test]
async fn entry_without_bound_member_is_a_config_error() {
    let prober = PresenceProber::new(StreamPlatform::Kick, FakeDiscord::new());
    let entry = StreamEntry::new(StreamPlatform::Kick, "someone", "100");
    let res = prober.probe("1", &entry).await;
    assert!(matches!(res, Err(Error::ConfigMissing(_))));
}
