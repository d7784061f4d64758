// File: src/platforms/mod.rs

use async_trait::async_trait;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

#[async_trait]
pub trait PlatformIntegration {
    async fn connect(&mut self) -> Result<(), Error>;
    /// Callable through a shared reference so shutdown can run while other
    /// components still hold the platform.
    async fn disconnect(&self) -> Result<(), Error>;
}

// Re-export submodules
pub mod cooldown;
pub mod discord;
pub mod twitch_helix;
pub mod youtube;

pub use cooldown::ApiCooldown;
