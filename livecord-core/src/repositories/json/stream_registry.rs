// File: src/repositories/json/stream_registry.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use livecord_common::models::platform::StreamPlatform;
use livecord_common::models::stream::{PresenceRule, StreamEntry, StreamPatch};
use livecord_common::traits::repository_traits::StreamRegistryRepository;

use crate::Error;
use super::{read_json_or_default, write_json_atomic};

/// On-disk shape of `streams.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StreamsDocument {
    #[serde(default)]
    guilds: BTreeMap<String, GuildStreams>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GuildStreams {
    #[serde(default)]
    streams: Vec<StreamEntry>,
    #[serde(default)]
    presence: BTreeMap<StreamPlatform, PresenceRule>,
}

impl GuildStreams {
    fn is_empty(&self) -> bool {
        self.streams.is_empty() && self.presence.is_empty()
    }
}

/// Stream registry persisted as a single JSON document.
///
/// All mutations hold the write lock across the whole read-modify-write, so a
/// command and a poll tick can never interleave two writes of the same file.
/// Mutations start from the document on disk, not the in-memory copy, so edits
/// made by another process are kept. The in-memory copy only changes after the
/// new document hit the disk, or on [`reload`].
///
/// [`reload`]: StreamRegistryRepository::reload
pub struct JsonStreamRegistry {
    path: PathBuf,
    supported: BTreeSet<StreamPlatform>,
    doc: RwLock<StreamsDocument>,
}

impl JsonStreamRegistry {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let doc: StreamsDocument = read_json_or_default(&path)?;
        let entries: usize = doc.guilds.values().map(|g| g.streams.len()).sum();
        info!(
            "Loaded stream registry from {} ({} guilds, {} entries)",
            path.display(),
            doc.guilds.len(),
            entries
        );
        Ok(Self {
            path,
            supported: StreamPlatform::ALL.into_iter().collect(),
            doc: RwLock::new(doc),
        })
    }

    /// Restrict which platforms `add` accepts.
    pub fn with_supported_platforms<I>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = StreamPlatform>,
    {
        self.supported = platforms.into_iter().collect();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn mutate<R, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut StreamsDocument) -> Result<(R, bool), Error>,
    {
        let mut guard = self.doc.write().await;
        let mut next: StreamsDocument = read_json_or_default(&self.path)?;
        let (result, changed) = f(&mut next)?;
        if changed {
            next.guilds.retain(|_, g| !g.is_empty());
            write_json_atomic(&self.path, &next)?;
            *guard = next;
        }
        Ok(result)
    }
}

#[async_trait]
impl StreamRegistryRepository for JsonStreamRegistry {
    async fn reload(&self) -> Result<(), Error> {
        let mut guard = self.doc.write().await;
        let fresh: StreamsDocument = read_json_or_default(&self.path)?;
        let entries: usize = fresh.guilds.values().map(|g| g.streams.len()).sum();
        debug!("Reloaded {} ({} guilds, {} entries)", self.path.display(), fresh.guilds.len(), entries);
        *guard = fresh;
        Ok(())
    }

    async fn add(&self, guild_id: &str, mut entry: StreamEntry) -> Result<StreamEntry, Error> {
        if !self.supported.contains(&entry.platform) {
            return Err(Error::InvalidPlatform(entry.platform.to_string()));
        }
        if entry.external_id.trim().is_empty() {
            return Err(Error::Parse("external id must not be empty".into()));
        }
        entry.external_id = entry.external_id.trim().to_string();
        entry.normalize();

        if entry.platform.is_presence_backed() && entry.bound_discord_user_id.is_none() {
            warn!(
                "Entry {}:{} has no bound Discord user; presence checks will skip it",
                entry.platform, entry.external_id
            );
        }

        let stored = entry.clone();
        self.mutate(move |doc| {
            let guild = doc.guilds.entry(guild_id.to_string()).or_default();
            if guild
                .streams
                .iter()
                .any(|e| e.matches(entry.platform, &entry.external_id))
            {
                return Err(Error::DuplicateEntry(format!(
                    "{}:{} already tracked in guild {}",
                    entry.platform, entry.external_id, guild_id
                )));
            }
            debug!("Adding {}:{} to guild {}", entry.platform, entry.external_id, guild_id);
            guild.streams.push(entry);
            Ok(((), true))
        })
        .await?;
        Ok(stored)
    }

    async fn remove(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
        external_id: &str,
    ) -> Result<usize, Error> {
        self.mutate(|doc| {
            let Some(guild) = doc.guilds.get_mut(guild_id) else {
                return Ok((0, false));
            };
            let before = guild.streams.len();
            guild.streams.retain(|e| !e.matches(platform, external_id));
            let removed = before - guild.streams.len();
            Ok((removed, removed > 0))
        })
        .await
    }

    async fn update(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
        external_id: &str,
        patch: StreamPatch,
    ) -> Result<StreamEntry, Error> {
        self.mutate(|doc| {
            let entry = doc
                .guilds
                .get_mut(guild_id)
                .and_then(|g| g.streams.iter_mut().find(|e| e.matches(platform, external_id)))
                .ok_or_else(|| {
                    Error::NotFound(format!("{}:{} in guild {}", platform, external_id, guild_id))
                })?;
            patch.apply_to(entry);
            Ok((entry.clone(), !patch.is_empty()))
        })
        .await
    }

    async fn get(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
        external_id: &str,
    ) -> Result<Option<StreamEntry>, Error> {
        let doc = self.doc.read().await;
        Ok(doc
            .guilds
            .get(guild_id)
            .and_then(|g| g.streams.iter().find(|e| e.matches(platform, external_id)))
            .cloned())
    }

    async fn list(&self, guild_id: &str) -> Result<Vec<StreamEntry>, Error> {
        let doc = self.doc.read().await;
        Ok(doc
            .guilds
            .get(guild_id)
            .map(|g| g.streams.clone())
            .unwrap_or_default())
    }

    async fn guild_ids(&self) -> Result<Vec<String>, Error> {
        let doc = self.doc.read().await;
        Ok(doc.guilds.keys().cloned().collect())
    }

    async fn get_presence(
        &self,
        guild_id: &str,
    ) -> Result<BTreeMap<StreamPlatform, PresenceRule>, Error> {
        let doc = self.doc.read().await;
        Ok(doc
            .guilds
            .get(guild_id)
            .map(|g| g.presence.clone())
            .unwrap_or_default())
    }

    async fn set_presence(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
        mut rule: PresenceRule,
    ) -> Result<(), Error> {
        if platform.is_api_backed() || !self.supported.contains(&platform) {
            return Err(Error::InvalidPlatform(format!(
                "{} cannot be detected from presence",
                platform
            )));
        }
        rule.platform = platform;
        rule.normalize();
        self.mutate(move |doc| {
            doc.guilds
                .entry(guild_id.to_string())
                .or_default()
                .presence
                .insert(platform, rule);
            Ok(((), true))
        })
        .await
    }

    async fn remove_presence(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
    ) -> Result<usize, Error> {
        self.mutate(|doc| {
            let removed = doc
                .guilds
                .get_mut(guild_id)
                .and_then(|g| g.presence.remove(&platform))
                .map_or(0, |_| 1);
            Ok((removed, removed > 0))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (tempfile::TempDir, JsonStreamRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let reg = JsonStreamRegistry::open(dir.path().join("streams.json")).unwrap();
        (dir, reg)
    }

    #[tokio::test]
    async fn add_rejects_unsupported_platform() {
        let (_dir, reg) = registry();
        let reg = reg.with_supported_platforms([StreamPlatform::Twitch]);
        let res = reg
            .add("1", StreamEntry::new(StreamPlatform::YouTube, "@someone", "2"))
            .await;
        assert!(matches!(res, Err(Error::InvalidPlatform(_))));
        assert!(reg.list("1").await.unwrap().is_empty());
        assert!(!reg.path().exists());
    }

    #[tokio::test]
    async fn set_presence_rejects_api_platforms() {
        let (_dir, reg) = registry();
        let res = reg
            .set_presence("1", StreamPlatform::Twitch, PresenceRule::new(StreamPlatform::Twitch))
            .await;
        assert!(matches!(res, Err(Error::InvalidPlatform(_))));
    }

    #[tokio::test]
    async fn empty_guilds_are_dropped_from_the_document() {
        let (_dir, reg) = registry();
        reg.add("1", StreamEntry::new(StreamPlatform::Twitch, "foo", "2")).await.unwrap();
        assert_eq!(reg.guild_ids().await.unwrap(), vec!["1".to_string()]);
        reg.remove("1", StreamPlatform::Twitch, "FOO").await.unwrap();
        assert!(reg.guild_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reload_keeps_old_copy_when_file_is_corrupt() {
        let (_dir, reg) = registry();
        reg.add("1", StreamEntry::new(StreamPlatform::Twitch, "foo", "2")).await.unwrap();
        std::fs::write(reg.path(), "{ not json").unwrap();

        assert!(reg.reload().await.is_err());
        assert_eq!(reg.list("1").await.unwrap().len(), 1);
    }
}
