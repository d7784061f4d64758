use std::collections::BTreeMap;
use async_trait::async_trait;

use crate::error::Error;
use crate::models::live_state::{LiveState, LiveStateKey};
use crate::models::platform::StreamPlatform;
use crate::models::stream::{PresenceRule, StreamEntry, StreamPatch};

/// Per-guild tracked streamers plus presence rules.
#[async_trait]
pub trait StreamRegistryRepository: Send + Sync {
    /// Pick up changes written by another process. Stores without a backing file may no-op.
    async fn reload(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Fails with `DuplicateEntry` or `InvalidPlatform`; returns the stored (normalized) entry.
    async fn add(&self, guild_id: &str, entry: StreamEntry) -> Result<StreamEntry, Error>;

    /// Returns how many entries were removed (0 or 1).
    async fn remove(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
        external_id: &str,
    ) -> Result<usize, Error>;

    async fn update(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
        external_id: &str,
        patch: StreamPatch,
    ) -> Result<StreamEntry, Error>;

    async fn get(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
        external_id: &str,
    ) -> Result<Option<StreamEntry>, Error>;

    async fn list(&self, guild_id: &str) -> Result<Vec<StreamEntry>, Error>;

    async fn guild_ids(&self) -> Result<Vec<String>, Error>;

    async fn get_presence(
        &self,
        guild_id: &str,
    ) -> Result<BTreeMap<StreamPlatform, PresenceRule>, Error>;

    async fn set_presence(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
        rule: PresenceRule,
    ) -> Result<(), Error>;

    async fn remove_presence(
        &self,
        guild_id: &str,
        platform: StreamPlatform,
    ) -> Result<usize, Error>;
}

/// Last-known live status per tracked streamer.
#[async_trait]
pub trait LiveStateRepository: Send + Sync {
    async fn get_state(&self, key: &LiveStateKey) -> Result<Option<LiveState>, Error>;
    async fn put_state(&self, key: &LiveStateKey, state: LiveState) -> Result<(), Error>;
    async fn remove_state(&self, key: &LiveStateKey) -> Result<(), Error>;
    async fn keys(&self) -> Result<Vec<LiveStateKey>, Error>;

    /// Persist pending changes. In-memory implementations may no-op.
    async fn flush(&self) -> Result<(), Error>;
}
