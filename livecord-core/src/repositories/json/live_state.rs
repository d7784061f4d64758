// File: src/repositories/json/live_state.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use livecord_common::models::live_state::{LiveState, LiveStateKey};
use livecord_common::traits::repository_traits::LiveStateRepository;

use crate::Error;
use super::{read_json_or_default, write_json_atomic};

/// Live state cache backed by `stream-state.json`.
///
/// `put_state`/`remove_state` only touch memory; the poller calls [`flush`] once per
/// tick so a tick with many entries costs a single write.
///
/// [`flush`]: LiveStateRepository::flush
pub struct JsonLiveStateRepository {
    path: PathBuf,
    states: RwLock<BTreeMap<String, LiveState>>,
    dirty: AtomicBool,
}

impl JsonLiveStateRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let states: BTreeMap<String, LiveState> = read_json_or_default(&path)?;
        info!("Loaded {} live states from {}", states.len(), path.display());
        Ok(Self {
            path,
            states: RwLock::new(states),
            dirty: AtomicBool::new(false),
        })
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}

#[async_trait]
impl LiveStateRepository for JsonLiveStateRepository {
    async fn get_state(&self, key: &LiveStateKey) -> Result<Option<LiveState>, Error> {
        Ok(self.states.read().await.get(&key.to_string()).cloned())
    }

    async fn put_state(&self, key: &LiveStateKey, state: LiveState) -> Result<(), Error> {
        let mut states = self.states.write().await;
        let key = key.to_string();
        if states.get(&key) != Some(&state) {
            states.insert(key, state);
            self.dirty.store(true, Ordering::Release);
        }
        Ok(())
    }

    async fn remove_state(&self, key: &LiveStateKey) -> Result<(), Error> {
        let mut states = self.states.write().await;
        if states.remove(&key.to_string()).is_some() {
            self.dirty.store(true, Ordering::Release);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<LiveStateKey>, Error> {
        let states = self.states.read().await;
        Ok(states
            .keys()
            .filter_map(|raw| match raw.parse::<LiveStateKey>() {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!("Ignoring live state row '{}': {}", raw, e);
                    None
                }
            })
            .collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let states = self.states.read().await;
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = write_json_atomic(&self.path, &*states) {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }
        debug!("Flushed {} live states to {}", states.len(), self.path.display());
        Ok(())
    }
}
