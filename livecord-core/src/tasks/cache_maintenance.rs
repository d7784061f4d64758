// livecord-core/src/tasks/cache_maintenance.rs

use std::time::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::cache::Sweep;

/// Sweeps one round and returns how many entries were evicted in total.
pub fn sweep_all(caches: &[Arc<dyn Sweep>]) -> usize {
    caches
        .iter()
        .map(|cache| {
            let evicted = cache.sweep();
            if evicted > 0 {
                debug!("Evicted {} expired entries from '{}'", evicted, cache.name());
            }
            evicted
        })
        .sum()
}

/// Spawns a background task that periodically evicts expired entries from every cache.
pub fn spawn_cache_sweep_task(caches: Vec<Arc<dyn Sweep>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;
            sweep_all(&caches);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ExpiringCache;

    #[tokio::test(start_paused = true)]
    async fn background_sweep_evicts_expired_entries() {
        let cache: Arc<ExpiringCache<String, u32>> =
            Arc::new(ExpiringCache::new("test", Duration::from_secs(5)));
        cache.insert("a".into(), 1);

        let handle = spawn_cache_sweep_task(vec![cache.clone() as Arc<dyn Sweep>], Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(cache.len(), 0);
        handle.abort();
    }
}
