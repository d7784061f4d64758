use tracing::{error, info};

use livecord_common::traits::repository_traits::LiveStateRepository;
use livecord_core::platforms::PlatformIntegration;
use livecord_core::tasks::{spawn_cache_sweep_task, spawn_stream_poll_task};
use livecord_core::Error;

use crate::context::ServerContext;

pub async fn run_server(ctx: ServerContext) -> Result<(), Error> {
    let poll_handle = spawn_stream_poll_task(
        ctx.notifier.clone(),
        ctx.config.startup_delay(),
        ctx.config.poll_interval(),
    );
    let sweep_handle = spawn_cache_sweep_task(ctx.notifier.caches(), ctx.config.cache_sweep_interval());

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {:?}", e);
    }
    info!("Ctrl-C detected; shutting down...");

    poll_handle.abort();
    sweep_handle.abort();
    if let Err(e) = ctx.discord.disconnect().await {
        error!("Discord disconnect failed: {}", e);
    }

    if let Err(e) = ctx.states.flush().await {
        error!("Failed to persist live state on shutdown: {}", e);
    }
    info!("Shutdown complete.");
    Ok(())
}
