// livecord-core/src/tasks/stream_poll.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::services::stream_notifier::NotifierService;

/// Spawns the poll loop.
///
/// Fixed delay: the next tick starts `period` after the previous one finished,
/// so ticks never overlap no matter how slow the platforms answer. Aborting the
/// handle stops the loop.
pub fn spawn_stream_poll_task(
    service: Arc<NotifierService>,
    initial_delay: Duration,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Stream poller starting in {:?} (every {:?}) for {:?}",
            initial_delay,
            period,
            service.platforms()
        );
        sleep(initial_delay).await;
        loop {
            let report = service.run_tick().await;
            if report.errors > 0 {
                warn!(
                    "Poll tick finished with {} error(s); checked={} live={} offline={}",
                    report.errors, report.checked, report.went_live, report.went_offline
                );
            } else {
                info!(
                    "Poll tick: checked={} live={} offline={}",
                    report.checked, report.went_live, report.went_offline
                );
            }
            sleep(period).await;
        }
    })
}
