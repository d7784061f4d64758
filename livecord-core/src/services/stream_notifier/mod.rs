// File: src/services/stream_notifier/mod.rs

pub mod prober;
pub mod probers;
pub mod render;
pub mod transition;

pub use prober::Prober;
pub use transition::{decide, NotifierSettings, Transition};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, info_span, warn, Instrument};

use livecord_common::models::live_state::{LiveState, LiveStateKey, LiveStatus};
use livecord_common::models::platform::StreamPlatform;
use livecord_common::models::probe::{ProbeResult, StreamMetadata};
use livecord_common::models::stream::{PresenceRule, StreamEntry};
use livecord_common::traits::api::DiscordApi;
use livecord_common::traits::repository_traits::{LiveStateRepository, StreamRegistryRepository};

use crate::cache::Sweep;
use crate::Error;
use render::{build_live_embed, profile_url, render_template};

/// What one poll tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub checked: usize,
    pub went_live: usize,
    pub went_offline: usize,
    pub notifications_sent: usize,
    pub errors: usize,
    /// State rows dropped because their entry or presence rule is gone.
    pub pruned: usize,
    pub skipped_platforms: Vec<StreamPlatform>,
}

struct GuildSnapshot {
    guild_id: String,
    entries: Vec<StreamEntry>,
    presence: BTreeMap<StreamPlatform, PresenceRule>,
}

/// Polls every registered prober and turns live/offline edges into Discord
/// notifications and role changes.
pub struct NotifierService {
    registry: Arc<dyn StreamRegistryRepository>,
    states: Arc<dyn LiveStateRepository>,
    discord: Arc<dyn DiscordApi>,
    probers: Vec<(StreamPlatform, Arc<dyn Prober>)>,
    settings: NotifierSettings,
}

impl NotifierService {
    pub fn new(
        registry: Arc<dyn StreamRegistryRepository>,
        states: Arc<dyn LiveStateRepository>,
        discord: Arc<dyn DiscordApi>,
        settings: NotifierSettings,
    ) -> Self {
        Self {
            registry,
            states,
            discord,
            probers: Vec::new(),
            settings,
        }
    }

    /// Replaces any prober already registered for the same platform, keeping its slot.
    pub fn register_prober(&mut self, prober: Arc<dyn Prober>) {
        let platform = prober.platform();
        match self.probers.iter_mut().find(|(p, _)| *p == platform) {
            Some(slot) => slot.1 = prober,
            None => self.probers.push((platform, prober)),
        }
        debug!("Registered {} prober", platform);
    }

    pub fn platforms(&self) -> Vec<StreamPlatform> {
        self.probers.iter().map(|(p, _)| *p).collect()
    }

    pub fn prober_for(&self, platform: StreamPlatform) -> Option<Arc<dyn Prober>> {
        self.probers
            .iter()
            .find(|(p, _)| *p == platform)
            .map(|(_, prober)| prober.clone())
    }

    pub fn settings(&self) -> &NotifierSettings {
        &self.settings
    }

    /// Every cache owned by a registered prober.
    pub fn caches(&self) -> Vec<Arc<dyn Sweep>> {
        self.probers.iter().flat_map(|(_, p)| p.caches()).collect()
    }

    pub async fn run_tick(&self) -> TickReport {
        self.run_tick_at(Utc::now()).await
    }

    pub async fn run_tick_at(&self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        let span = info_span!("poll_tick", at = %now);

        async {
            let guilds = match self.snapshot().await {
                Ok(guilds) => guilds,
                Err(e) => {
                    error!("Could not read the stream registry: {}", e);
                    report.errors += 1;
                    return;
                }
            };

            match self.prune_orphaned_states(&guilds).await {
                Ok(pruned) => report.pruned = pruned,
                Err(e) => {
                    warn!("Could not prune live state: {}", e);
                    report.errors += 1;
                }
            }

            for (platform, prober) in &self.probers {
                if let Some(until) = prober.suspended_until().filter(|u| *u > now) {
                    info!("Skipping {} until {} (rate limited)", platform, until);
                    report.skipped_platforms.push(*platform);
                    continue;
                }

                for guild in &guilds {
                    let explicit: Vec<&StreamEntry> = guild
                        .entries
                        .iter()
                        .filter(|e| e.platform == *platform)
                        .collect();
                    for entry in &explicit {
                        self.check_entry(&guild.guild_id, entry, prober.as_ref(), now, &mut report)
                            .await;
                    }

                    if let Some(rule) = guild.presence.get(platform) {
                        let bound: BTreeSet<&str> = explicit
                            .iter()
                            .filter_map(|e| e.bound_discord_user_id.as_deref())
                            .collect();
                        self.sweep_presence_rule(&guild.guild_id, rule, &bound, prober.as_ref(), now, &mut report)
                            .await;
                    }
                }
            }

            if let Err(e) = self.states.flush().await {
                error!("Failed to persist live state: {}", e);
                report.errors += 1;
            }
        }
        .instrument(span)
        .await;

        debug!("Poll tick finished: {:?}", report);
        report
    }

    async fn snapshot(&self) -> Result<Vec<GuildSnapshot>, Error> {
        if let Err(e) = self.registry.reload().await {
            warn!("Could not reload the stream registry, using the last good copy: {}", e);
        }
        let mut guilds = Vec::new();
        for guild_id in self.registry.guild_ids().await? {
            let entries = self.registry.list(&guild_id).await?;
            let presence = self.registry.get_presence(&guild_id).await?;
            guilds.push(GuildSnapshot { guild_id, entries, presence });
        }
        Ok(guilds)
    }

    async fn prune_orphaned_states(&self, guilds: &[GuildSnapshot]) -> Result<usize, Error> {
        let mut pruned = 0;
        for key in self.states.keys().await? {
            let referenced = guilds
                .iter()
                .find(|g| g.guild_id == key.guild_id)
                .is_some_and(|g| {
                    g.presence.contains_key(&key.platform)
                        || g.entries.iter().any(|e| e.matches(key.platform, &key.external_id))
                });
            if referenced {
                continue;
            }
            debug!("Dropping live state of removed entry {}", key);
            self.states.remove_state(&key).await?;
            pruned += 1;
        }
        Ok(pruned)
    }

    async fn sweep_presence_rule(
        &self,
        guild_id: &str,
        rule: &PresenceRule,
        already_bound: &BTreeSet<&str>,
        prober: &dyn Prober,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) {
        for user_id in self.discord.guild_member_ids(guild_id) {
            if already_bound.contains(user_id.as_str()) {
                continue;
            }
            let key = LiveStateKey::new(guild_id, rule.platform, &user_id);
            if !rule.whitelist_role_ids.is_empty() {
                // Members already Live must still be re-checked so they can go offline.
                let live = matches!(self.states.get_state(&key).await, Ok(Some(s)) if s.is_live());
                if !live && !self.member_has_any_role(guild_id, &user_id, &rule.whitelist_role_ids).await {
                    continue;
                }
            }
            let entry = rule_entry(rule, &user_id);
            self.check_entry(guild_id, &entry, prober, now, report).await;
        }
    }

    async fn member_has_any_role(&self, guild_id: &str, user_id: &str, roles: &BTreeSet<String>) -> bool {
        match self.discord.member_role_ids(guild_id, user_id).await {
            Ok(Some(held)) => held.iter().any(|r| roles.contains(r)),
            Ok(None) => false,
            Err(e) => {
                debug!("Role lookup for {} in {} failed: {}", user_id, guild_id, e);
                false
            }
        }
    }

    async fn check_entry(
        &self,
        guild_id: &str,
        entry: &StreamEntry,
        prober: &dyn Prober,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) {
        let span = info_span!(
            "check",
            guild = %guild_id,
            platform = %entry.platform,
            id = %entry.external_id
        );
        async {
            if entry.platform.is_presence_backed() && entry.bound_discord_user_id.is_none() {
                debug!("No bound member; skipping");
                return;
            }
            report.checked += 1;

            let result = match prober.probe(guild_id, entry).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Probe failed, keeping previous state: {}", e);
                    report.errors += 1;
                    return;
                }
            };

            let key = LiveStateKey::new(guild_id, entry.platform, &entry.external_id);
            if let Err(e) = self.apply_reading(guild_id, entry, &key, result, now, report).await {
                error!("Failed to apply reading: {}", e);
                report.errors += 1;
            }
        }
        .instrument(span)
        .await
    }

    async fn apply_reading(
        &self,
        guild_id: &str,
        entry: &StreamEntry,
        key: &LiveStateKey,
        result: ProbeResult,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) -> Result<(), Error> {
        let prev = self.states.get_state(key).await?;
        let transition = decide(prev.as_ref(), result.live, now, &self.settings);
        let mut next = prev.clone().unwrap_or_else(|| LiveState::offline(now));

        match transition {
            Transition::GoLive { notify } => {
                info!("Went live: {}", result.metadata.title);
                next.status = LiveStatus::Live;
                next.last_transition_at = now;
                next.offline_since = None;
                remember_stream(&mut next, &result.metadata);

                if notify {
                    if let Some(message_id) = self.deliver_live(entry, &result.metadata, now).await {
                        next.last_message_id = Some(message_id);
                        next.last_notified_at = Some(now);
                        report.notifications_sent += 1;
                    }
                } else {
                    info!("Live again inside the re-notify cooldown; not posting");
                }
                self.grant_live_roles(guild_id, entry).await;
                report.went_live += 1;
            }
            Transition::StillLive => {
                next.offline_since = None;
                remember_stream(&mut next, &result.metadata);
            }
            Transition::StartGrace => {
                debug!("Offline reading while live; grace window starts");
                next.offline_since = Some(now);
            }
            Transition::InGrace => return Ok(()),
            Transition::GoOffline => {
                info!("Went offline");
                next.status = LiveStatus::Offline;
                next.last_transition_at = now;
                next.offline_since = None;
                self.revoke_live_roles(guild_id, entry).await;
                self.deliver_vod(entry, &next).await;
                report.went_offline += 1;
            }
            Transition::NoChange => return Ok(()),
        }

        if prev.as_ref() != Some(&next) {
            self.states.put_state(key, next).await?;
        }
        Ok(())
    }

    async fn deliver_live(&self, entry: &StreamEntry, meta: &StreamMetadata, now: DateTime<Utc>) -> Option<String> {
        if entry.discord_channel_id.is_empty() {
            debug!("No announcement channel configured");
            return None;
        }
        let content = render_template(&entry.live_message_template, meta, entry.platform);
        let embed = build_live_embed(entry.platform, meta, now);
        match self
            .discord
            .send_discord_embed(&entry.discord_channel_id, &embed, Some(&content))
            .await
        {
            Ok(message_id) => Some(message_id),
            Err(e) => {
                warn!("Could not post live notification to {}: {}", entry.discord_channel_id, e);
                None
            }
        }
    }

    async fn deliver_vod(&self, entry: &StreamEntry, state: &LiveState) {
        let Some(template) = entry.vod_message_template.as_deref() else {
            return;
        };
        if entry.discord_channel_id.is_empty() {
            return;
        }
        let meta = StreamMetadata {
            name: entry.external_id.clone(),
            title: state.last_title.clone().unwrap_or_default(),
            url: state
                .last_url
                .clone()
                .or_else(|| profile_url(entry.platform, &entry.external_id))
                .unwrap_or_default(),
            ..Default::default()
        };
        let text = render_template(template, &meta, entry.platform);
        if let Err(e) = self.discord.send_discord_message(&entry.discord_channel_id, &text).await {
            warn!("Could not post VOD message to {}: {}", entry.discord_channel_id, e);
        }
    }

    async fn grant_live_roles(&self, guild_id: &str, entry: &StreamEntry) {
        let Some(user_id) = entry.bound_discord_user_id.as_deref() else {
            return;
        };
        if entry.live_role_ids.is_empty() {
            return;
        }
        let held = match self.discord.member_role_ids(guild_id, user_id).await {
            Ok(Some(held)) => held,
            Ok(None) => {
                debug!("Member {} is not in guild {}", user_id, guild_id);
                return;
            }
            Err(e) => {
                warn!("Could not read roles of {}: {}", user_id, e);
                return;
            }
        };
        if !entry.whitelist_role_ids.is_empty()
            && !held.iter().any(|r| entry.whitelist_role_ids.contains(r))
        {
            debug!("Member {} holds no whitelisted role; live role not granted", user_id);
            return;
        }
        for role_id in entry.live_role_ids.iter().filter(|r| !held.contains(r)) {
            match self.discord.add_role_to_discord_user(guild_id, user_id, role_id).await {
                Ok(()) => info!("Added live role {} to {}", role_id, user_id),
                Err(e) => warn!("Failed to add live role {} to {}: {}", role_id, user_id, e),
            }
        }
    }

    async fn revoke_live_roles(&self, guild_id: &str, entry: &StreamEntry) {
        let Some(user_id) = entry.bound_discord_user_id.as_deref() else {
            return;
        };
        if entry.live_role_ids.is_empty() {
            return;
        }
        let held = match self.discord.member_role_ids(guild_id, user_id).await {
            Ok(Some(held)) => held,
            Ok(None) => return,
            Err(e) => {
                warn!("Could not read roles of {}: {}", user_id, e);
                return;
            }
        };
        for role_id in entry.live_role_ids.iter().filter(|r| held.contains(r)) {
            match self.discord.remove_role_from_discord_user(guild_id, user_id, role_id).await {
                Ok(()) => info!("Removed live role {} from {}", role_id, user_id),
                Err(e) => warn!("Failed to remove live role {} from {}: {}", role_id, user_id, e),
            }
        }
    }

    /// Removes a tracked entry. A live member loses the entry's live roles and the
    /// stored state is dropped, so a later re-add starts from Offline.
    pub async fn remove_entry(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
        external_id: &str,
    ) -> Result<usize, Error> {
        let entry = self.registry.get(guild_id, platform, external_id).await?;
        let removed = self.registry.remove(guild_id, platform, external_id).await?;
        let Some(entry) = entry.filter(|_| removed > 0) else {
            return Ok(removed);
        };

        let key = LiveStateKey::new(guild_id, platform, &entry.external_id);
        self.retire_state(guild_id, &entry, &key).await?;
        self.states.flush().await?;
        info!("Removed {}:{} from guild {}", platform, entry.external_id, guild_id);
        Ok(removed)
    }

    /// Removes a presence rule and retires the state of every member it tracked.
    /// Members that also have an explicit entry keep their state.
    pub async fn remove_presence_rule(&self, guild_id: &str, platform: StreamPlatform) -> Result<usize, Error> {
        let rule = self.registry.get_presence(guild_id).await?.remove(&platform);
        let removed = self.registry.remove_presence(guild_id, platform).await?;
        let Some(rule) = rule.filter(|_| removed > 0) else {
            return Ok(removed);
        };

        let explicit: BTreeSet<LiveStateKey> = self
            .registry
            .list(guild_id)
            .await?
            .iter()
            .filter(|e| e.platform == platform)
            .map(|e| LiveStateKey::new(guild_id, platform, &e.external_id))
            .collect();
        for key in self.states.keys().await? {
            if key.guild_id != guild_id || key.platform != platform || explicit.contains(&key) {
                continue;
            }
            let entry = rule_entry(&rule, &key.external_id);
            self.retire_state(guild_id, &entry, &key).await?;
        }
        self.states.flush().await?;
        info!("Removed {} presence rule from guild {}", platform, guild_id);
        Ok(removed)
    }

    async fn retire_state(&self, guild_id: &str, entry: &StreamEntry, key: &LiveStateKey) -> Result<(), Error> {
        if self.states.get_state(key).await?.is_some_and(|s| s.is_live()) {
            self.revoke_live_roles(guild_id, entry).await;
        }
        self.states.remove_state(key).await
    }

    /// Posts a one-off announcement for an existing entry. Live state is not touched.
    pub async fn send_test_notification(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
        external_id: &str,
    ) -> Result<String, Error> {
        let entry = self
            .registry
            .get(guild_id, platform, external_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("{}:{} in guild {}", platform, external_id, guild_id))
            })?;
        if entry.discord_channel_id.is_empty() {
            return Err(Error::ConfigMissing(format!(
                "{}:{} has no announcement channel",
                platform, external_id
            )));
        }

        let probed = match self.prober_for(platform) {
            Some(prober) => match prober.probe(guild_id, &entry).await {
                Ok(result) if result.live => Some(result.metadata),
                Ok(_) => None,
                Err(e) => {
                    debug!("Test probe failed, using placeholder metadata: {}", e);
                    None
                }
            },
            None => None,
        };
        let meta = probed.unwrap_or_else(|| placeholder_metadata(&entry));

        let now = Utc::now();
        let content = render_template(&entry.live_message_template, &meta, platform);
        let embed = build_live_embed(platform, &meta, now);
        let message_id = self
            .discord
            .send_discord_embed(&entry.discord_channel_id, &embed, Some(&content))
            .await?;
        info!("Sent test notification for {}:{} in {}", platform, external_id, guild_id);
        Ok(message_id)
    }
}

fn remember_stream(state: &mut LiveState, meta: &StreamMetadata) {
    if !meta.title.is_empty() {
        state.last_title = Some(meta.title.clone());
    }
    if !meta.url.is_empty() {
        state.last_url = Some(meta.url.clone());
    }
}

fn placeholder_metadata(entry: &StreamEntry) -> StreamMetadata {
    StreamMetadata {
        name: entry.external_id.clone(),
        title: "Test notification".to_string(),
        url: profile_url(entry.platform, &entry.external_id).unwrap_or_default(),
        ..Default::default()
    }
}

/// Synthetic entry for one member matched by a presence rule.
fn rule_entry(rule: &PresenceRule, user_id: &str) -> StreamEntry {
    let mut entry = StreamEntry::new(
        rule.platform,
        user_id,
        rule.discord_channel_id.as_deref().unwrap_or_default(),
    );
    entry.live_message_template = rule.template().to_string();
    entry.bound_discord_user_id = Some(user_id.to_string());
    entry.live_role_ids = rule.live_role_ids.clone();
    entry.whitelist_role_ids = rule.whitelist_role_ids.clone();
    entry
}
