// File: src/services/stream_notifier/prober.rs

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use livecord_common::models::platform::StreamPlatform;
use livecord_common::models::probe::ProbeResult;
use livecord_common::models::stream::StreamEntry;

use crate::cache::Sweep;
use crate::Error;

/// Answers "is this entry live right now" for one platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prober: Send + Sync {
    fn platform(&self) -> StreamPlatform;

    async fn probe(&self, guild_id: &str, entry: &StreamEntry) -> Result<ProbeResult, Error>;

    /// Set while the platform refused us; the poller skips the platform until then.
    fn suspended_until(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Caches the maintenance task should sweep.
    fn caches(&self) -> Vec<Arc<dyn Sweep>> {
        Vec::new()
    }
}
